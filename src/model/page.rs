//! Page-level types.

use super::{Table, TextBlock};

/// Extraction output for a single page.
///
/// Pages only live for the duration of one conversion.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,

    /// Text lines in reading order
    pub blocks: Vec<TextBlock>,

    /// Tables detected on the page, top to bottom
    pub tables: Vec<Table>,

    /// Why the page could not be read, if it failed
    pub failure: Option<String>,
}

impl Page {
    /// Create a new empty page.
    pub fn new(number: u32) -> Self {
        Self {
            number,
            ..Default::default()
        }
    }

    /// Create a page that could not be read.
    pub fn failed(number: u32, message: impl Into<String>) -> Self {
        Self {
            number,
            failure: Some(message.into()),
            ..Default::default()
        }
    }

    /// Raw text content: block texts, one per line.
    pub fn raw_text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Number of characters replaced by the placeholder on this page.
    pub fn unmapped_count(&self) -> usize {
        self.blocks.iter().map(|b| b.unmapped).sum()
    }

    /// Check if the page carries no text and no tables.
    pub fn is_blank(&self) -> bool {
        self.blocks.iter().all(TextBlock::is_blank) && self.tables.is_empty()
    }

    /// Check if the page failed to extract.
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}
