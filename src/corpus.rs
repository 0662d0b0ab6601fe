//! In-context examples built from earlier descriptions.
//!
//! Every stored row that has both a title and a generated description is
//! rendered as a `Título:`/`Descripción:` pair. The block is bounded so it
//! cannot outgrow the prompt as the history accumulates.

use tracing::trace;
use unicode_segmentation::UnicodeSegmentation;

use crate::store::DescriptionRecord;

pub const EXAMPLES_HEADER: &str = "Ejemplos de descripciones previas:\n\n";
pub const NO_PREVIOUS_DESCRIPTIONS: &str = "No hay descripciones generadas previas.";

/// Bounds applied to the example block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExampleLimits {
    /// Most recent qualifying rows to consider.
    pub max_examples: usize,
    /// Upper bound on the whole block, in characters.
    pub max_chars: usize,
    /// Each description is cut to this many graphemes.
    pub max_description_chars: usize,
}

impl Default for ExampleLimits {
    fn default() -> Self {
        Self {
            max_examples: 20,
            max_chars: 6000,
            max_description_chars: 600,
        }
    }
}

/// Render earlier descriptions as in-context examples.
///
/// Newer rows win when the limits force a choice; the chosen rows keep their
/// table order. Returns [`NO_PREVIOUS_DESCRIPTIONS`] when nothing qualifies.
pub fn build_example_block(records: &[DescriptionRecord], limits: &ExampleLimits) -> String {
    let budget = limits.max_chars.saturating_sub(EXAMPLES_HEADER.chars().count());
    let mut used = 0;
    let mut entries = Vec::new();

    for record in records.iter().rev().filter(|r| r.has_example()) {
        if entries.len() >= limits.max_examples {
            break;
        }
        let entry = format!(
            "Título: {}\nDescripción: {}\n\n",
            record.title,
            truncate_graphemes(&record.description, limits.max_description_chars)
        );
        let len = entry.chars().count();
        if used + len > budget {
            break;
        }
        used += len;
        entries.push(entry);
    }

    if entries.is_empty() {
        return NO_PREVIOUS_DESCRIPTIONS.to_string();
    }

    trace!(examples = entries.len(), chars = used, "example block built");
    let mut block = String::from(EXAMPLES_HEADER);
    for entry in entries.iter().rev() {
        block.push_str(entry);
    }
    block
}

/// Cut `text` to at most `max` grapheme clusters, marking the cut with `…`.
pub fn truncate_graphemes(text: &str, max: usize) -> String {
    let mut graphemes = text.graphemes(true);
    let head: String = graphemes.by_ref().take(max).collect();
    if graphemes.next().is_some() {
        format!("{}…", head.trim_end())
    } else {
        head
    }
}
