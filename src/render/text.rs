//! Plain text rendering for extraction results.

use crate::model::{Entry, ExtractionResult};

/// Convert a result to plain text.
///
/// Text entries are emitted as-is, tables as tab-separated rows. Entries
/// are separated by a blank line and empty entries are skipped.
pub fn to_text(result: &ExtractionResult) -> String {
    result
        .entries
        .iter()
        .map(|entry| match entry {
            Entry::Text { text, .. } => text.trim_end().to_string(),
            Entry::Table { table, .. } => table.plain_text(),
        })
        .filter(|s| !s.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
