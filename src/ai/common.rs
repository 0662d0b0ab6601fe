use anyhow::{anyhow, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument, trace, warn};

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Sampling settings of one completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampling {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Build a system + user chat request. With `image_url` set, the user turn
/// carries the text and the image as separate content parts.
pub fn build_chat_body(
    model: &str,
    system: &str,
    user: &str,
    sampling: Sampling,
    image_url: Option<&str>,
) -> Value {
    let user_content = match image_url {
        Some(url) => json!([
            { "type": "text", "text": user },
            { "type": "image_url", "image_url": { "url": url } }
        ]),
        None => Value::String(user.to_string()),
    };

    json!({
        "model": model,
        "messages": [
            { "role": "system", "content": system },
            { "role": "user", "content": user_content }
        ],
        "temperature": sampling.temperature,
        "max_tokens": sampling.max_tokens,
    })
}

/// Extract the trimmed text of the first choice from a raw response body.
pub fn parse_chat_content(raw: &str) -> Result<String> {
    let chat: ChatResponse = serde_json::from_str(raw)?;
    let content = chat
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("missing chat choice"))?
        .message
        .content
        .unwrap_or_default();
    let content = content.trim();
    if content.is_empty() {
        return Err(anyhow!("empty chat completion"));
    }
    Ok(content.to_string())
}

#[instrument(level = "trace", skip(api_key, body))]
pub async fn request_completion(api_key: &str, body: &Value, url: &str) -> Result<String> {
    debug!(url, "sending chat completion request");

    let client = reqwest::Client::new();
    let resp = client
        .post(url)
        .bearer_auth(api_key)
        .json(body)
        .send()
        .await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let err_text = resp.text().await.unwrap_or_default();
        warn!(%status, "OpenAI API error");
        return Err(anyhow!("OpenAI API error {status}: {err_text}"));
    }

    let raw = resp.text().await?;
    let snippet: String = raw.chars().take(200).collect();
    debug!(snippet = %snippet, "chat response body");
    trace!(raw = %raw, "chat response");
    parse_chat_content(&raw)
}
