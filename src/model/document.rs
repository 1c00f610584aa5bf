//! Document-level types.

use super::Page;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The pages extracted during one conversion.
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// Document metadata (title, author, etc.)
    pub metadata: Metadata,

    /// Extracted pages in page order
    pub pages: Vec<Page>,
}

impl Document {
    /// Create a new empty document.
    pub fn new(metadata: Metadata) -> Self {
        Self {
            metadata,
            pages: Vec::new(),
        }
    }

    /// Get the number of extracted pages.
    pub fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Get a page by number (1-indexed).
    pub fn get_page(&self, page_num: u32) -> Option<&Page> {
        self.pages.iter().find(|p| p.number == page_num)
    }

    /// Add a page to the document.
    pub fn add_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    /// Check if the document has any pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Document subject
    pub subject: Option<String>,

    /// Keywords
    pub keywords: Option<String>,

    /// Creator application
    pub creator: Option<String>,

    /// PDF producer
    pub producer: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,

    /// PDF version (e.g., "1.7")
    pub pdf_version: String,

    /// Total number of pages
    pub page_count: u32,

    /// Whether the document is encrypted
    pub encrypted: bool,
}

impl Metadata {
    /// Create new metadata with PDF version.
    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            pdf_version: version.into(),
            ..Default::default()
        }
    }
}

/// Summary of a document's content, produced without building output sheets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PdfInfo {
    /// Document metadata
    pub metadata: Metadata,

    /// Pages with at least one non-blank line of text
    pub pages_with_text: Vec<u32>,

    /// Pages with at least one detected table
    pub pages_with_tables: Vec<u32>,

    /// Total number of detected tables
    pub table_count: usize,

    /// Total number of extracted characters on pages with text, spaces included
    pub total_characters: usize,
}

impl PdfInfo {
    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.metadata.page_count
    }

    /// Check if any page has text.
    pub fn has_text(&self) -> bool {
        !self.pages_with_text.is_empty()
    }

    /// Check if any page has tables.
    pub fn has_tables(&self) -> bool {
        !self.pages_with_tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_pages() {
        let mut doc = Document::new(Metadata::with_version("1.7"));
        assert!(doc.is_empty());

        doc.add_page(Page::new(2));
        doc.add_page(Page::new(5));

        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.get_page(5).map(|p| p.number), Some(5));
        assert!(doc.get_page(1).is_none());
        assert_eq!(doc.metadata.pdf_version, "1.7");
    }

    #[test]
    fn test_pdf_info_flags() {
        let info = PdfInfo {
            pages_with_tables: vec![2],
            ..Default::default()
        };
        assert!(info.has_tables());
        assert!(!info.has_text());
    }
}
