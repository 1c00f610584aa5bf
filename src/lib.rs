//! # pdfsheet
//!
//! Extraction of text and tables from traditional Chinese PDF documents
//! into spreadsheet-ready data.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfsheet::{convert_file, render, ConvertOptions, ExtractMode};
//!
//! fn main() -> pdfsheet::Result<()> {
//!     let result = convert_file("report.pdf", ExtractMode::Combined, &ConvertOptions::default())?;
//!
//!     let workbook = render::to_workbook(&result, "report.pdf");
//!     workbook.write_csv_dir(std::path::Path::new("out"), "report")?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Text extraction**: reading-order lines with CJK-aware spacing and NFC normalization
//! - **Table detection**: ruled grids and whitespace-aligned columns
//! - **Paragraph merging**: optional joining of wrapped lines, page-aware
//! - **Redaction**: optional masking of e-mails, phone, card and ID numbers
//! - **Output**: spreadsheet sheets as UTF-8 CSV, JSON and plain text

pub mod convert;
pub mod detect;
pub mod error;
pub mod model;
pub mod parser;
pub mod render;
pub mod sanitize;

// Re-export commonly used types
pub use convert::{ConversionState, ConvertOptions, Converter, ResultLayout};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_pdf, PdfFormat};
pub use error::{Error, Result, Unreadable};
pub use model::{
    Entry, ExtractionResult, Metadata, PdfInfo, Rect, Table, TextBlock, Warning,
};
pub use parser::{ExtractMode, MergeOptions, PageSelection};
pub use render::{JsonFormat, Sheet, Workbook};
pub use sanitize::{SanitizeOptions, SanitizeSummary, Sanitizer};

use std::io::Read;
use std::path::Path;

/// Convert PDF bytes into an extraction result.
///
/// # Example
///
/// ```no_run
/// use pdfsheet::{convert, ConvertOptions, ExtractMode};
///
/// let data = std::fs::read("report.pdf").unwrap();
/// let result = convert(data, ExtractMode::Text, &ConvertOptions::default()).unwrap();
/// println!("{}", result.plain_text());
/// ```
pub fn convert(data: Vec<u8>, mode: ExtractMode, options: &ConvertOptions) -> Result<ExtractionResult> {
    Converter::new(options.clone()).convert(data, mode)
}

/// Convert a PDF file.
pub fn convert_file<P: AsRef<Path>>(
    path: P,
    mode: ExtractMode,
    options: &ConvertOptions,
) -> Result<ExtractionResult> {
    let path = path.as_ref();
    detect_format_from_path(path)?;
    let data = std::fs::read(path)?;
    convert(data, mode, options)
}

/// Convert a PDF read from any reader.
pub fn convert_reader<R: Read>(
    mut reader: R,
    mode: ExtractMode,
    options: &ConvertOptions,
) -> Result<ExtractionResult> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    convert(data, mode, options)
}

/// Report metadata and content statistics of PDF bytes.
pub fn inspect(data: Vec<u8>) -> Result<PdfInfo> {
    Converter::default().inspect(data)
}

/// Report metadata and content statistics of a PDF file.
pub fn inspect_file<P: AsRef<Path>>(path: P) -> Result<PdfInfo> {
    let data = std::fs::read(path)?;
    inspect(data)
}

/// Extract the merged text of a PDF file.
///
/// # Example
///
/// ```no_run
/// let text = pdfsheet::extract_text("report.pdf").unwrap();
/// println!("{}", text);
/// ```
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let result = convert_file(path, ExtractMode::Text, &ConvertOptions::default())?;
    Ok(result.plain_text())
}

/// Builder API for one-off conversions.
///
/// # Example
///
/// ```no_run
/// use pdfsheet::{ExtractMode, Pdfsheet, SanitizeOptions};
///
/// let workbook = Pdfsheet::new()
///     .with_mode(ExtractMode::Combined)
///     .merge_wrapped_lines()
///     .with_sanitize(SanitizeOptions::default())
///     .convert_file("report.pdf")?
///     .to_workbook();
/// # Ok::<(), pdfsheet::Error>(())
/// ```
pub struct Pdfsheet {
    mode: ExtractMode,
    options: ConvertOptions,
}

impl Pdfsheet {
    /// Create a new builder in combined mode with default options.
    pub fn new() -> Self {
        Self {
            mode: ExtractMode::Combined,
            options: ConvertOptions::default(),
        }
    }

    /// Set the extraction mode.
    pub fn with_mode(mut self, mode: ExtractMode) -> Self {
        self.mode = mode;
        self
    }

    /// Replace all conversion options.
    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    /// Join lines that wrap mid-sentence.
    pub fn merge_wrapped_lines(mut self) -> Self {
        self.options = self.options.with_merge_wrapped_lines(true);
        self
    }

    /// Collapse whitespace inside lines.
    pub fn compact_whitespace(mut self) -> Self {
        self.options = self.options.with_preserve_formatting(false);
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.options = self.options.with_pages(pages);
        self
    }

    /// Set document password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.options = self.options.with_password(password);
        self
    }

    /// Enable redaction.
    pub fn with_sanitize(mut self, sanitize: SanitizeOptions) -> Self {
        self.options = self.options.with_sanitize(sanitize);
        self
    }

    /// Convert a PDF file.
    pub fn convert_file<P: AsRef<Path>>(self, path: P) -> Result<PdfsheetResult> {
        let path = path.as_ref();
        let source_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let result = convert_file(path, self.mode, &self.options)?;
        Ok(PdfsheetResult {
            result,
            source_name,
        })
    }

    /// Convert PDF bytes.
    pub fn convert_bytes(self, data: Vec<u8>, source_name: impl Into<String>) -> Result<PdfsheetResult> {
        let result = convert(data, self.mode, &self.options)?;
        Ok(PdfsheetResult {
            result,
            source_name: source_name.into(),
        })
    }
}

impl Default for Pdfsheet {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a builder conversion.
pub struct PdfsheetResult {
    /// The extraction result
    pub result: ExtractionResult,
    source_name: String,
}

impl PdfsheetResult {
    /// Arrange the result into sheets.
    pub fn to_workbook(&self) -> Workbook {
        render::to_workbook(&self.result, &self.source_name)
    }

    /// Convert to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.result, format)
    }

    /// Convert to plain text.
    pub fn to_text(&self) -> String {
        render::to_text(&self.result)
    }

    /// Name of the converted file.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }
}
