use std::path::Path;

use crate::ai::config::AiConfig;
use crate::service::{DescriptionService, ServiceSettings};
use crate::store::{DescriptionRecord, History};

pub fn sample_record(title: &str, description: &str) -> DescriptionRecord {
    DescriptionRecord {
        image: format!("https://example.com/{}.jpg", title.replace(' ', "_")),
        title: title.to_string(),
        description: description.to_string(),
        description_quechua: None,
        created_at: None,
    }
}

/// Default AI settings pointed at a mock chat endpoint.
pub fn ai_config_for(chat_url: &str) -> AiConfig {
    AiConfig {
        openai_chat_url: Some(chat_url.to_string()),
        ..AiConfig::with_key("test-key")
    }
}

/// A chat completion response whose first choice says `content`.
pub fn chat_completion_body(content: &str) -> String {
    serde_json::json!({
        "choices": [ { "message": { "role": "assistant", "content": content } } ]
    })
    .to_string()
}

/// Service storing its history and uploads under `dir`, without timestamps.
pub fn test_service(dir: &Path, ai: AiConfig) -> DescriptionService {
    let history = History::load(dir.join("historial.csv")).expect("failed to load test history");
    DescriptionService::new(
        history,
        ai,
        ServiceSettings {
            upload_dir: dir.join("subidas"),
            record_timestamp: false,
            ..ServiceSettings::default()
        },
    )
}
