use std::path::PathBuf;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};

/// Column names of the history file, in order.
pub const COLUMNS: [&str; 5] = [
    "imagen",
    "descripcion",
    "generated_description",
    "generated_description_quechua",
    "fecha",
];

/// One row of the description history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptionRecord {
    /// Image URL or local path of an uploaded image.
    #[serde(rename = "imagen")]
    pub image: String,
    /// Short caption supplied by the user.
    #[serde(rename = "descripcion")]
    pub title: String,
    #[serde(rename = "generated_description", default)]
    pub description: String,
    #[serde(rename = "generated_description_quechua", default)]
    pub description_quechua: Option<String>,
    #[serde(rename = "fecha", default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl DescriptionRecord {
    /// True when the row can serve as an in-context example.
    pub fn has_example(&self) -> bool {
        !self.title.trim().is_empty() && !self.description.trim().is_empty()
    }
}

/// RFC 3339, or a naive `YYYY-MM-DD HH:MM:SS[.frac]` taken as UTC.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(|err| de::Error::custom(format!("invalid fecha {raw:?}: {err}")))
}

/// Where the image of a request comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageInput {
    Url(String),
    /// An uploaded file already written to the upload directory.
    Upload { path: PathBuf, bytes: Vec<u8> },
}

impl ImageInput {
    /// The string persisted in the `imagen` column.
    pub fn reference(&self) -> String {
        match self {
            ImageInput::Url(url) => url.trim().to_string(),
            ImageInput::Upload { path, .. } => path.display().to_string(),
        }
    }
}
