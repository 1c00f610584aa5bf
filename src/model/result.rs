//! Extraction result types.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::Table;

/// One item of the extraction result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Entry {
    /// Merged text of one page
    Text {
        /// Page number (1-indexed)
        page: u32,
        /// Page text; empty for blank or unreadable pages
        text: String,
    },
    /// A detected table
    Table {
        /// Page number (1-indexed)
        page: u32,
        /// Table grid
        table: Table,
    },
}

impl Entry {
    /// Page this entry comes from.
    pub fn page(&self) -> u32 {
        match self {
            Entry::Text { page, .. } | Entry::Table { page, .. } => *page,
        }
    }

    /// Check if this is a text entry.
    pub fn is_text(&self) -> bool {
        matches!(self, Entry::Text { .. })
    }

    /// Check if this is a table entry.
    pub fn is_table(&self) -> bool {
        matches!(self, Entry::Table { .. })
    }

    /// Text content, if this is a text entry.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Entry::Text { text, .. } => Some(text),
            Entry::Table { .. } => None,
        }
    }

    /// Table, if this is a table entry.
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Entry::Table { table, .. } => Some(table),
            Entry::Text { .. } => None,
        }
    }
}

/// A non-fatal problem found during extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A page could not be read; it contributes empty content.
    PageExtraction {
        /// Page number (1-indexed)
        page: u32,
        /// What went wrong
        message: String,
    },
    /// Characters on a page could not be mapped and were replaced.
    UnmappableCharacters {
        /// Page number (1-indexed)
        page: u32,
        /// Number of replaced characters
        count: usize,
    },
}

impl Warning {
    /// Page the warning refers to.
    pub fn page(&self) -> u32 {
        match self {
            Warning::PageExtraction { page, .. } | Warning::UnmappableCharacters { page, .. } => {
                *page
            }
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::PageExtraction { page, message } => {
                write!(f, "page {}: extraction failed: {}", page, message)
            }
            Warning::UnmappableCharacters { page, count } => {
                write!(f, "page {}: {} unmappable characters replaced", page, count)
            }
        }
    }
}

/// Structured output of one conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Text and table entries in page order
    pub entries: Vec<Entry>,

    /// Accumulated non-fatal problems
    pub warnings: Vec<Warning>,

    /// Number of pages in the source document
    pub page_count: u32,
}

impl ExtractionResult {
    /// Create an empty result for a document with `page_count` pages.
    pub fn new(page_count: u32) -> Self {
        Self {
            page_count,
            ..Default::default()
        }
    }

    /// Append a text entry.
    pub fn push_text(&mut self, page: u32, text: impl Into<String>) {
        self.entries.push(Entry::Text {
            page,
            text: text.into(),
        });
    }

    /// Append a table entry.
    pub fn push_table(&mut self, table: Table) {
        self.entries.push(Entry::Table {
            page: table.page,
            table,
        });
    }

    /// Iterate over text entries as `(page, text)`.
    pub fn texts(&self) -> impl Iterator<Item = (u32, &str)> {
        self.entries.iter().filter_map(|e| match e {
            Entry::Text { page, text } => Some((*page, text.as_str())),
            Entry::Table { .. } => None,
        })
    }

    /// Iterate over tables.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.entries.iter().filter_map(Entry::as_table)
    }

    /// Number of table entries.
    pub fn table_count(&self) -> usize {
        self.tables().count()
    }

    /// Check if the result carries no visible content.
    pub fn is_empty(&self) -> bool {
        self.texts().all(|(_, t)| t.trim().is_empty()) && self.table_count() == 0
    }

    /// Check if any warnings were recorded.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// All text entries joined with blank lines.
    pub fn plain_text(&self) -> String {
        self.texts()
            .map(|(_, t)| t)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
