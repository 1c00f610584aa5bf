//! Extraction options shared by the parser components.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What content to extract from the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractMode {
    /// Text entries only
    Text,
    /// Table entries only
    Table,
    /// Each page's text followed by its tables
    #[default]
    Combined,
}

impl ExtractMode {
    /// Whether the text extractor runs in this mode.
    pub fn wants_text(self) -> bool {
        matches!(self, ExtractMode::Text | ExtractMode::Combined)
    }

    /// Whether the table detector runs in this mode.
    pub fn wants_tables(self) -> bool {
        matches!(self, ExtractMode::Table | ExtractMode::Combined)
    }
}

impl fmt::Display for ExtractMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExtractMode::Text => "text",
            ExtractMode::Table => "table",
            ExtractMode::Combined => "combined",
        };
        f.write_str(name)
    }
}

impl FromStr for ExtractMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(ExtractMode::Text),
            "table" | "tables" => Ok(ExtractMode::Table),
            "combined" | "all" => Ok(ExtractMode::Combined),
            other => Err(format!("Unknown extract mode: {}", other)),
        }
    }
}

/// Options for the content merger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    /// Join lines that wrap mid-sentence
    pub merge_wrapped_lines: bool,

    /// Never join lines across a page boundary
    pub split_by_page: bool,

    /// Stop joining once a paragraph holds this many characters
    pub max_paragraph_chars: Option<usize>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            merge_wrapped_lines: false,
            split_by_page: true,
            max_paragraph_chars: Some(100),
        }
    }
}

/// Page selection for extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// All pages
    #[default]
    All,
    /// A range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Specific pages (1-indexed)
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Parse a page selection string (e.g., "2-5", "1,3,7-9").
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();

        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        if let Some((start, end)) = s.split_once('-') {
            if !start.contains(',') && !end.contains(',') {
                let (start, end) = parse_range(start, end)?;
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            if let Some((start, end)) = part.split_once('-') {
                let (start, end) = parse_range(start, end)?;
                pages.extend(start..=end);
            } else {
                pages.push(parse_page(part)?);
            }
        }

        pages.sort_unstable();
        pages.dedup();
        Ok(PageSelection::Pages(pages))
    }
}

impl FromStr for PageSelection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PageSelection::parse(s)
    }
}

fn parse_page(s: &str) -> Result<u32, String> {
    match s.trim().parse::<u32>() {
        Ok(0) => Err("Page numbers start at 1".to_string()),
        Ok(page) => Ok(page),
        Err(_) => Err(format!("Invalid page number: {}", s.trim())),
    }
}

fn parse_range(start: &str, end: &str) -> Result<(u32, u32), String> {
    let start = parse_page(start)?;
    let end = parse_page(end)?;
    if start > end {
        return Err(format!("Invalid page range: {}-{}", start, end));
    }
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_mode_flags() {
        assert!(ExtractMode::Text.wants_text());
        assert!(!ExtractMode::Text.wants_tables());
        assert!(ExtractMode::Table.wants_tables());
        assert!(!ExtractMode::Table.wants_text());
        assert!(ExtractMode::Combined.wants_text());
        assert!(ExtractMode::Combined.wants_tables());
    }

    #[test]
    fn test_extract_mode_from_str() {
        assert_eq!("TEXT".parse::<ExtractMode>(), Ok(ExtractMode::Text));
        assert_eq!("tables".parse::<ExtractMode>(), Ok(ExtractMode::Table));
        assert_eq!("combined".parse::<ExtractMode>(), Ok(ExtractMode::Combined));
        assert!("markdown".parse::<ExtractMode>().is_err());
    }

    #[test]
    fn test_page_selection_parse() {
        assert_eq!(PageSelection::parse("all"), Ok(PageSelection::All));
        assert_eq!(PageSelection::parse("2-4"), Ok(PageSelection::Range(2..=4)));
        assert_eq!(
            PageSelection::parse("5, 1,3-4,3"),
            Ok(PageSelection::Pages(vec![1, 3, 4, 5]))
        );
        assert!(PageSelection::parse("0").is_err());
        assert!(PageSelection::parse("4-2").is_err());
        assert!(PageSelection::parse("x").is_err());
    }

    #[test]
    fn test_page_selection_includes() {
        let selection = PageSelection::Pages(vec![1, 3]);
        assert!(selection.includes(1));
        assert!(!selection.includes(2));
        assert!(PageSelection::Range(2..=3).includes(3));
        assert!(PageSelection::All.includes(99));
    }
}
