use tracing::trace;

use crate::corpus::truncate_graphemes;
use crate::messages::{HISTORY_EMPTY, HISTORY_HEADING, QUECHUA_HEADING, SPANISH_HEADING};
use crate::store::DescriptionRecord;

/// Entries shown by the history listing.
pub const HISTORY_LIMIT: usize = 10;
const HISTORY_SNIPPET: usize = 160;

/// Split `/describe` arguments into an image URL and a title.
///
/// The first whitespace-separated token is the URL, the rest is the title.
/// Returns `None` when either part is missing.
pub fn split_describe_args(args: &str) -> Option<(String, String)> {
    trace!(?args, "Parsing describe arguments");
    let args = args.trim();
    let (url, title) = args.split_once(char::is_whitespace)?;
    let title = title.trim();
    if url.is_empty() || title.is_empty() {
        return None;
    }
    Some((url.to_string(), title.to_string()))
}

/// The reply sent after a successful generation.
pub fn format_generated(record: &DescriptionRecord) -> String {
    let mut text = format!("{SPANISH_HEADING}\n{}", record.description);
    if let Some(quechua) = record.description_quechua.as_deref() {
        text.push_str(&format!("\n\n{QUECHUA_HEADING}\n{quechua}"));
    }
    text
}

/// Plain-text listing of the most recent records, oldest first.
pub fn format_history(records: &[DescriptionRecord], limit: usize) -> String {
    if records.is_empty() {
        return HISTORY_EMPTY.to_string();
    }

    let skip = records.len().saturating_sub(limit);
    let mut text = format!("{HISTORY_HEADING}\n");
    for (idx, record) in records.iter().enumerate().skip(skip) {
        text.push_str(&format!(
            "\n{}. {}\n{}\n",
            idx + 1,
            record.title,
            truncate_graphemes(&record.description, HISTORY_SNIPPET)
        ));
        if let Some(quechua) = record.description_quechua.as_deref() {
            text.push_str(&format!("({})\n", truncate_graphemes(quechua, HISTORY_SNIPPET)));
        }
    }
    text
}
