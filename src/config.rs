use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};

use crate::ai::config::{env_or, AiConfig};
use crate::corpus::ExampleLimits;
use crate::service::ServiceSettings;

pub const DEFAULT_HISTORY_PATH: &str = "imagenes/nuevas_descripciones.csv";
pub const DEFAULT_UPLOAD_DIR: &str = "imagenes/subidas";

#[derive(Clone, Debug)]
pub struct Config {
    pub history_path: PathBuf,
    pub service: ServiceSettings,
    pub ai: AiConfig,
    /// Telegram bot token; the bot runs only when set.
    pub telegram_token: Option<String>,
    /// Address of the web form and JSON API; served only when set.
    pub api_bind: Option<SocketAddr>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let history_path = env::var("HISTORY_PATH")
            .unwrap_or_else(|_| DEFAULT_HISTORY_PATH.to_string())
            .into();
        let defaults = ExampleLimits::default();
        let service = ServiceSettings {
            limits: ExampleLimits {
                max_examples: env_or("MAX_EXAMPLES", defaults.max_examples)?,
                max_chars: env_or("MAX_EXAMPLE_CHARS", defaults.max_chars)?,
                max_description_chars: env_or(
                    "MAX_DESCRIPTION_CHARS",
                    defaults.max_description_chars,
                )?,
            },
            upload_dir: env::var("UPLOAD_DIR")
                .unwrap_or_else(|_| DEFAULT_UPLOAD_DIR.to_string())
                .into(),
            record_timestamp: env_or("RECORD_TIMESTAMP", true)?,
        };
        let ai = AiConfig::from_env()?;

        let telegram_token = env::var("TELOXIDE_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty());
        let api_bind = match env::var("API_BIND") {
            Ok(raw) => Some(
                raw.trim()
                    .parse()
                    .map_err(|err| anyhow!("invalid value for API_BIND ({raw:?}): {err}"))?,
            ),
            Err(_) => None,
        };

        if telegram_token.is_none() && api_bind.is_none() {
            bail!("nothing to run: set TELOXIDE_TOKEN and/or API_BIND");
        }

        Ok(Self {
            history_path,
            service,
            ai,
            telegram_token,
            api_bind,
        })
    }
}
