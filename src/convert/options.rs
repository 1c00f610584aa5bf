//! Conversion options.

use serde::{Deserialize, Serialize};

use crate::parser::{MergeOptions, PageSelection, DEFAULT_PLACEHOLDER};
use crate::sanitize::SanitizeOptions;

/// How entries are ordered in the result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultLayout {
    /// Each page's text entry followed by that page's tables
    #[default]
    Interleaved,
    /// All text entries, then all tables
    Sectioned,
}

/// Options for one conversion.
#[derive(Debug, Clone)]
pub struct ConvertOptions {
    /// Keep line text verbatim instead of collapsing whitespace
    pub preserve_formatting: bool,

    /// Join lines that wrap mid-sentence
    pub merge_wrapped_lines: bool,

    /// Never merge text across a page boundary
    pub split_by_page: bool,

    /// Drop table rows whose cells are all blank
    pub remove_empty_rows: bool,

    /// Entry ordering
    pub layout: ResultLayout,

    /// Pages to extract
    pub pages: PageSelection,

    /// Replacement for characters that cannot be mapped to Unicode
    pub placeholder: char,

    /// Maximum accepted input size in bytes
    pub max_file_size: Option<usize>,

    /// Password for encrypted documents
    pub password: Option<String>,

    /// Redaction applied to the assembled result
    pub sanitize: Option<SanitizeOptions>,
}

impl ConvertOptions {
    /// Create new conversion options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep or collapse whitespace inside lines.
    pub fn with_preserve_formatting(mut self, preserve: bool) -> Self {
        self.preserve_formatting = preserve;
        self
    }

    /// Enable or disable joining of wrapped lines.
    pub fn with_merge_wrapped_lines(mut self, merge: bool) -> Self {
        self.merge_wrapped_lines = merge;
        self
    }

    /// Enable or disable forced paragraph breaks at page boundaries.
    pub fn with_split_by_page(mut self, split: bool) -> Self {
        self.split_by_page = split;
        self
    }

    /// Enable or disable removal of blank table rows.
    pub fn with_remove_empty_rows(mut self, remove: bool) -> Self {
        self.remove_empty_rows = remove;
        self
    }

    /// Set the entry layout.
    pub fn with_layout(mut self, layout: ResultLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Set the placeholder character.
    pub fn with_placeholder(mut self, placeholder: char) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Set the maximum input size in bytes.
    pub fn with_max_file_size(mut self, bytes: usize) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Set password for encrypted documents.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Enable redaction.
    pub fn with_sanitize(mut self, sanitize: SanitizeOptions) -> Self {
        self.sanitize = Some(sanitize);
        self
    }

    /// Options for the content merger.
    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            merge_wrapped_lines: self.merge_wrapped_lines,
            split_by_page: self.split_by_page,
            ..MergeOptions::default()
        }
    }
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            preserve_formatting: true,
            merge_wrapped_lines: false,
            split_by_page: true,
            remove_empty_rows: true,
            layout: ResultLayout::Interleaved,
            pages: PageSelection::All,
            placeholder: DEFAULT_PLACEHOLDER,
            max_file_size: None,
            password: None,
            sanitize: None,
        }
    }
}
