use anyhow::{Context, Result};
use base64::Engine as _;
use tracing::{debug, instrument};

use crate::ai::common::{build_chat_body, request_completion, Sampling};
use crate::ai::config::AiConfig;
use crate::ai::prompts::{DESCRIBE_REQUEST_LINE, DESCRIBE_SYSTEM_PROMPT, TRANSLATE_TO_QUECHUA_PROMPT};
use crate::store::ImageInput;

/// Text produced for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub description: String,
    pub description_quechua: Option<String>,
}

/// User turn of the description request: instructions, examples, then the title.
pub fn build_describe_prompt(system: &str, examples: &str, title: &str) -> String {
    format!("{system}\n\n{examples}\n\n{DESCRIBE_REQUEST_LINE}\nTítulo: {title}")
}

/// User turn of the translation request.
pub fn build_translation_prompt(instructions: &str, description: &str) -> String {
    format!("{instructions}\n\n{description}")
}

/// The image as the model receives it: URLs pass through, uploads become data URLs.
pub fn image_payload(image: &ImageInput) -> String {
    match image {
        ImageInput::Url(url) => url.trim().to_string(),
        ImageInput::Upload { path, bytes } => {
            let mime = mime_guess::from_path(path).first_or(mime_guess::mime::IMAGE_JPEG);
            let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
            format!("data:{};base64,{}", mime.essence_str(), encoded)
        }
    }
}

/// Ask the model for a Spanish description of `image`.
#[instrument(level = "debug", skip(config, image, examples), fields(model = %config.chat_model))]
pub async fn request_description(
    config: &AiConfig,
    image: &ImageInput,
    title: &str,
    examples: &str,
) -> Result<String> {
    let prompt = build_describe_prompt(DESCRIBE_SYSTEM_PROMPT, examples, title);
    let attachment = config.attach_image.then(|| image_payload(image));
    let body = build_chat_body(
        &config.chat_model,
        DESCRIBE_SYSTEM_PROMPT,
        &prompt,
        Sampling {
            temperature: config.describe_temperature,
            max_tokens: config.max_output_tokens,
        },
        attachment.as_deref(),
    );
    debug!(prompt_chars = prompt.chars().count(), "requesting description");
    request_completion(&config.api_key, &body, config.chat_url()).await
}

/// Ask the model to translate `description` to Quechua.
#[instrument(level = "debug", skip(config, description), fields(model = %config.chat_model))]
pub async fn request_translation(config: &AiConfig, description: &str) -> Result<String> {
    let prompt = build_translation_prompt(TRANSLATE_TO_QUECHUA_PROMPT, description);
    let body = build_chat_body(
        &config.chat_model,
        TRANSLATE_TO_QUECHUA_PROMPT,
        &prompt,
        Sampling {
            temperature: config.translate_temperature,
            max_tokens: config.max_output_tokens,
        },
        None,
    );
    request_completion(&config.api_key, &body, config.chat_url()).await
}

/// Describe the image, then translate the description when enabled.
///
/// The two requests run one after the other; a failure of either fails the whole call.
pub async fn describe_image(
    config: &AiConfig,
    image: &ImageInput,
    title: &str,
    examples: &str,
) -> Result<Generated> {
    let description = request_description(config, image, title, examples)
        .await
        .context("description request failed")?;

    let description_quechua = if config.translate_to_quechua {
        let translated = request_translation(config, &description)
            .await
            .context("Quechua translation request failed")?;
        Some(translated)
    } else {
        None
    };

    Ok(Generated {
        description,
        description_quechua,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn describe_prompt_layout() {
        let prompt = build_describe_prompt("SYS", "EX", "Qhapaq Qolla");
        assert_eq!(
            prompt,
            "SYS\n\nEX\n\nGenera una descripción para la siguiente imagen:\nTítulo: Qhapaq Qolla"
        );
    }

    #[test]
    fn describe_prompt_is_deterministic() {
        let a = build_describe_prompt(DESCRIBE_SYSTEM_PROMPT, "ejemplos", "Saqra");
        let b = build_describe_prompt(DESCRIBE_SYSTEM_PROMPT, "ejemplos", "Saqra");
        assert_eq!(a, b);
    }

    #[test]
    fn translation_prompt_layout() {
        assert_eq!(build_translation_prompt("T", "D"), "T\n\nD");
    }

    #[test]
    fn upload_payload_is_data_url() {
        let image = ImageInput::Upload {
            path: PathBuf::from("imagen_cargada_foto.png"),
            bytes: b"img".to_vec(),
        };
        assert_eq!(image_payload(&image), "data:image/png;base64,aW1n");
    }
}
