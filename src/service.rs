use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::ai::config::AiConfig;
use crate::ai::describe::describe_image;
use crate::corpus::{build_example_block, ExampleLimits};
use crate::messages::{IMAGE_REQUIRED, TITLE_REQUIRED};
use crate::store::{DescriptionRecord, History, ImageInput};

/// Prefix of stored uploads, followed by a unique id and the sanitized file name.
pub const UPLOAD_PREFIX: &str = "imagen_cargada_";

/// The model provider failed, as opposed to validation or local storage.
#[derive(Debug)]
pub struct UpstreamError(anyhow::Error);

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for UpstreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

#[derive(Clone, Debug)]
pub struct ServiceSettings {
    pub limits: ExampleLimits,
    pub upload_dir: PathBuf,
    pub record_timestamp: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            limits: ExampleLimits::default(),
            upload_dir: PathBuf::from("imagenes/subidas"),
            record_timestamp: true,
        }
    }
}

/// Generates descriptions and keeps the shared history. Both the bot and the
/// web surface hold a clone.
#[derive(Clone)]
pub struct DescriptionService {
    history: Arc<Mutex<History>>,
    ai: Arc<AiConfig>,
    settings: Arc<ServiceSettings>,
}

impl DescriptionService {
    pub fn new(history: History, ai: AiConfig, settings: ServiceSettings) -> Self {
        Self {
            history: Arc::new(Mutex::new(history)),
            ai: Arc::new(ai),
            settings: Arc::new(settings),
        }
    }

    /// Describe `image`, store the record and return it.
    ///
    /// The history lock is not held while the model is working. Nothing is
    /// stored when a request fails, and a stored upload is removed again.
    #[instrument(level = "debug", skip(self, image), fields(image = %image.reference()))]
    pub async fn generate(&self, image: ImageInput, title: &str) -> Result<DescriptionRecord> {
        let result = self.describe_and_store(&image, title).await;
        if let (Err(_), ImageInput::Upload { path, .. }) = (&result, &image) {
            if let Err(err) = tokio::fs::remove_file(path).await {
                warn!(path = %path.display(), error = %err, "failed to remove unused upload");
            }
        }
        result
    }

    async fn describe_and_store(&self, image: &ImageInput, title: &str) -> Result<DescriptionRecord> {
        let title = title.trim();
        if title.is_empty() {
            bail!(TITLE_REQUIRED);
        }
        let reference = image.reference();
        if reference.is_empty() {
            bail!(IMAGE_REQUIRED);
        }

        let examples = {
            let history = self.history.lock().await;
            build_example_block(history.records(), &self.settings.limits)
        };

        let generated = describe_image(&self.ai, image, title, &examples)
            .await
            .map_err(UpstreamError)?;
        let record = DescriptionRecord {
            image: reference,
            title: title.to_string(),
            description: generated.description,
            description_quechua: generated.description_quechua,
            created_at: self.settings.record_timestamp.then(Utc::now),
        };

        let mut history = self.history.lock().await;
        history.append(record.clone())?;
        info!(rows = history.len(), title = %record.title, "description stored");
        Ok(record)
    }

    /// Write an uploaded image to the upload directory.
    pub async fn store_upload(&self, file_name: &str, bytes: Vec<u8>) -> Result<ImageInput> {
        let dir = &self.settings.upload_dir;
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;

        let path = dir.join(format!(
            "{UPLOAD_PREFIX}{}_{}",
            Uuid::new_v4().simple(),
            sanitize_file_name(file_name)
        ));
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        debug!(path = %path.display(), size = bytes.len(), "upload stored");
        Ok(ImageInput::Upload { path, bytes })
    }

    pub async fn records(&self) -> Vec<DescriptionRecord> {
        self.history.lock().await.records().to_vec()
    }

    pub async fn export_csv(&self) -> Result<Vec<u8>> {
        self.history.lock().await.to_csv_bytes()
    }
}

/// Keep letters, digits, `.`, `-` and `_`; anything else becomes `_`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "imagen".to_string()
    } else {
        cleaned.to_string()
    }
}
