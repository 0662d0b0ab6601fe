use std::future::Future;
use std::net::SocketAddr;

use anyhow::{Context, Result};
use dotenvy::dotenv;
use teloxide::{prelude::*, utils::command::BotCommands};

pub mod ai;
pub mod api;
pub mod commands;
pub mod config;
pub mod corpus;
pub mod handlers;
pub mod messages;
pub mod service;
pub mod store;
mod system_info;
pub mod text_utils;
pub mod utils;

pub use commands::Command;
pub use config::Config;
pub use corpus::{build_example_block, ExampleLimits};
pub use service::{DescriptionService, ServiceSettings};
pub use store::{DescriptionRecord, History, ImageInput};
pub use system_info::get_system_info;

// ──────────────────────────────────────────────────────────────
// Main application setup
// ──────────────────────────────────────────────────────────────

pub async fn run() -> Result<()> {
    // Load .env file if it exists (for local development)
    dotenv().ok();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting description bot...");

    let config = Config::from_env()?;

    let history = History::load(&config.history_path)
        .with_context(|| format!("failed to load {}", config.history_path.display()))?;
    tracing::info!(
        path = %history.path().display(),
        rows = history.len(),
        "History ready"
    );

    let service = DescriptionService::new(history, config.ai.clone(), config.service.clone());

    match (config.telegram_token, config.api_bind) {
        (Some(token), Some(addr)) => {
            let bot = run_bot(Bot::new(token), service.clone());
            run_alongside(bot, addr, service).await?;
        }
        (Some(token), None) => run_bot(Bot::new(token), service).await,
        (None, Some(addr)) => api::serve(addr, service).await?,
        (None, None) => anyhow::bail!("nothing to run: set TELOXIDE_TOKEN and/or API_BIND"),
    }

    Ok(())
}

/// Run `bot` and the web server together. Either one stopping ends both; a
/// web server failure is returned.
pub async fn run_alongside(
    bot: impl Future<Output = ()>,
    addr: SocketAddr,
    service: DescriptionService,
) -> Result<()> {
    tokio::select! {
        _ = bot => {
            tracing::info!("Bot stopped, shutting down web server");
            Ok(())
        }
        served = api::serve(addr, service) => served.context("web server stopped"),
    }
}

async fn run_bot(bot: Bot, service: DescriptionService) {
    if let Err(err) = bot.set_my_commands(Command::bot_commands()).await {
        tracing::warn!(error = %err, "Failed to register bot commands");
    }

    // --- Handler Setup ---
    let handler = Update::filter_message()
        .branch(
            dptree::entry()
                .filter(|msg: Message| handlers::uploaded_image(&msg).is_some())
                .endpoint(handlers::describe_uploaded_photo),
        )
        .branch(dptree::entry().filter_command::<Command>().endpoint(
            |bot: Bot, msg: Message, cmd: Command, service: DescriptionService| async move {
                cmd.dispatch(bot, msg, service).await
            },
        ));

    // --- Dispatcher ---
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![service])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
