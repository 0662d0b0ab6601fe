use std::env;
use std::str::FromStr;

use anyhow::{anyhow, Result};

use crate::ai::common::OPENAI_CHAT_URL;

#[derive(Clone, Debug)]
pub struct AiConfig {
    pub api_key: String,
    pub chat_model: String,
    pub openai_chat_url: Option<String>,
    pub describe_temperature: f32,
    pub translate_temperature: f32,
    pub max_output_tokens: u32,
    pub translate_to_quechua: bool,
    pub attach_image: bool,
}

impl AiConfig {
    /// Read the OpenAI settings. A missing `OPENAI_API_KEY` is fatal.
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| anyhow!("OPENAI_API_KEY is not set"))?;
        Ok(Self {
            api_key,
            chat_model: env::var("OPENAI_CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            openai_chat_url: env::var("OPENAI_CHAT_URL").ok(),
            describe_temperature: env_or("DESCRIBE_TEMPERATURE", 0.2)?,
            translate_temperature: env_or("TRANSLATE_TEMPERATURE", 0.5)?,
            max_output_tokens: env_or("MAX_OUTPUT_TOKENS", 300)?,
            translate_to_quechua: env_or("TRANSLATE_TO_QUECHUA", true)?,
            attach_image: env_or("ATTACH_IMAGE", false)?,
        })
    }

    /// Settings with the defaults and the given key, used by tests and tools.
    pub fn with_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            chat_model: "gpt-4o-mini".to_string(),
            openai_chat_url: None,
            describe_temperature: 0.2,
            translate_temperature: 0.5,
            max_output_tokens: 300,
            translate_to_quechua: true,
            attach_image: false,
        }
    }

    pub fn chat_url(&self) -> &str {
        self.openai_chat_url.as_deref().unwrap_or(OPENAI_CHAT_URL)
    }
}

/// Parse `name` from the environment, or return `default` when unset.
pub fn env_or<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|err| anyhow!("invalid value for {name} ({raw:?}): {err}")),
        Err(_) => Ok(default),
    }
}
