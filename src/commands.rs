use anyhow::Result;
use teloxide::{prelude::*, utils::command::BotCommands};

use crate::handlers::{describe_from_url, export_history, help, show_history, show_system_info};
use crate::service::DescriptionService;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(
    rename_rule = "lowercase",
    description = "Comandos disponibles:"
)]
pub enum Command {
    #[command(description = "muestra esta ayuda.")]
    Start,
    #[command(description = "muestra esta ayuda.")]
    Help,
    #[command(description = "describe una imagen: /describe <url> <título>.")]
    Describe(String),
    #[command(description = "muestra las últimas descripciones generadas.")]
    History,
    #[command(description = "descarga el historial en CSV.")]
    Export,
    #[command(description = "muestra información del sistema.")]
    Info,
}

impl Command {
    pub async fn dispatch(self, bot: Bot, msg: Message, service: DescriptionService) -> Result<()> {
        match self {
            Command::Start | Command::Help => help(bot, msg).await?,
            Command::Describe(args) => describe_from_url(bot, msg, service, args).await?,
            Command::History => show_history(bot, msg, service).await?,
            Command::Export => export_history(bot, msg, service).await?,
            Command::Info => show_system_info(bot, msg).await?,
        }
        Ok(())
    }
}
