//! Extraction orchestration.
//!
//! The [`Converter`] drives one conversion through its states, runs the
//! text extractor and table detector over every selected page, merges the
//! text and assembles the [`ExtractionResult`].
//!
//! # Example
//!
//! ```no_run
//! use pdfsheet::convert::{Converter, ConvertOptions};
//! use pdfsheet::ExtractMode;
//!
//! fn main() -> pdfsheet::Result<()> {
//!     let data = std::fs::read("report.pdf")?;
//!     let mut converter = Converter::new(ConvertOptions::default());
//!     let result = converter.convert(data, ExtractMode::Combined)?;
//!     println!("{} tables", result.table_count());
//!     Ok(())
//! }
//! ```

mod options;

pub use options::{ConvertOptions, ResultLayout};

use std::fmt;

use crate::detect::validate_pdf_bytes;
use crate::error::{Error, Result, Unreadable};
use crate::model::{Document, ExtractionResult, Metadata, Page, PdfInfo, Table, Warning};
use crate::parser::{
    merge_paragraphs, ExtractMode, LopdfBackend, PdfBackend, TableDetector, TableDetectorConfig,
    TextExtractor,
};
use crate::sanitize::{SanitizeSummary, Sanitizer};

/// Lifecycle of one conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionState {
    /// Nothing has happened yet
    Init,
    /// Validating and opening the PDF
    Parsing,
    /// Running extraction page by page
    PerPageExtract,
    /// Merging text into paragraphs
    Merging,
    /// Result assembled
    Assembled,
    /// The document could not be converted
    Failed,
}

impl fmt::Display for ConversionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConversionState::Init => "INIT",
            ConversionState::Parsing => "PARSING",
            ConversionState::PerPageExtract => "PER_PAGE_EXTRACT",
            ConversionState::Merging => "MERGING",
            ConversionState::Assembled => "ASSEMBLED",
            ConversionState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Converts PDF documents into extraction results.
#[derive(Debug, Clone)]
pub struct Converter {
    options: ConvertOptions,
    extractor: TextExtractor,
    detector: TableDetector,
    state: ConversionState,
    sanitize_summary: Option<SanitizeSummary>,
}

impl Converter {
    /// Create a converter with the given options.
    pub fn new(options: ConvertOptions) -> Self {
        let extractor = TextExtractor::new().with_placeholder(options.placeholder);
        Self {
            options,
            extractor,
            detector: TableDetector::new(),
            state: ConversionState::Init,
            sanitize_summary: None,
        }
    }

    /// Use a custom table detector configuration.
    pub fn with_detector_config(mut self, config: TableDetectorConfig) -> Self {
        self.detector = TableDetector::with_config(config);
        self
    }

    /// Options this converter runs with.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// State reached by the last conversion.
    pub fn state(&self) -> ConversionState {
        self.state
    }

    /// Redaction counts of the last conversion, if sanitizing was enabled.
    pub fn sanitize_summary(&self) -> Option<SanitizeSummary> {
        self.sanitize_summary
    }

    /// Convert PDF bytes.
    ///
    /// Fails with [`Error::UnreadablePdf`] when the document cannot be
    /// opened. Pages that fail individually are reported as warnings.
    pub fn convert(&mut self, data: Vec<u8>, mode: ExtractMode) -> Result<ExtractionResult> {
        self.start();

        let backend = match self.open(&data) {
            Ok(backend) => backend,
            Err(e) => {
                self.transition(ConversionState::Failed);
                return Err(e);
            }
        };

        self.run(&backend, mode)
    }

    /// Run the conversion pipeline on an already opened backend.
    pub fn convert_backend(
        &mut self,
        backend: &dyn PdfBackend,
        mode: ExtractMode,
    ) -> Result<ExtractionResult> {
        self.start();
        self.run(backend, mode)
    }

    /// Collect document metadata and content statistics.
    ///
    /// Encrypted documents report their metadata without content.
    pub fn inspect(&mut self, data: Vec<u8>) -> Result<PdfInfo> {
        self.start();

        let backend = match self.load(&data) {
            Ok(backend) => backend,
            Err(e) => {
                self.transition(ConversionState::Failed);
                return Err(e);
            }
        };

        let mut info = PdfInfo {
            metadata: backend.metadata(),
            ..Default::default()
        };
        if backend.is_encrypted() {
            self.transition(ConversionState::Assembled);
            return Ok(info);
        }

        let result = self.run(&backend, ExtractMode::Combined)?;

        for (page, text) in result.texts() {
            if !text.trim().is_empty() {
                info.pages_with_text.push(page);
                info.total_characters += text.chars().count();
            }
        }
        for table in result.tables() {
            if info.pages_with_tables.last() != Some(&table.page) {
                info.pages_with_tables.push(table.page);
            }
        }
        info.table_count = result.table_count();

        Ok(info)
    }

    fn start(&mut self) {
        self.state = ConversionState::Init;
        self.sanitize_summary = None;
        self.transition(ConversionState::Parsing);
    }

    fn transition(&mut self, next: ConversionState) {
        log::debug!("Conversion state: {} -> {}", self.state, next);
        self.state = next;
    }

    /// Validate the buffer and parse it with lopdf.
    fn load(&self, data: &[u8]) -> Result<LopdfBackend> {
        let format = validate_pdf_bytes(data, self.options.max_file_size)?;
        log::debug!("Opening PDF {} ({} bytes)", format.version, data.len());
        LopdfBackend::load_with_password(data, self.options.password.as_deref())
    }

    /// Load the document and refuse content that is still encrypted.
    fn open(&self, data: &[u8]) -> Result<LopdfBackend> {
        let backend = self.load(data)?;
        if backend.is_encrypted() {
            return Err(Error::UnreadablePdf(Unreadable::Encrypted));
        }
        Ok(backend)
    }

    fn run(&mut self, backend: &dyn PdfBackend, mode: ExtractMode) -> Result<ExtractionResult> {
        let page_count = backend.page_count();

        self.transition(ConversionState::PerPageExtract);
        let mut document = Document::new(Metadata {
            page_count,
            ..Default::default()
        });
        for number in backend.page_numbers() {
            if !self.options.pages.includes(number) {
                continue;
            }
            document.add_page(self.extract_page(backend, number, mode));
        }

        self.transition(ConversionState::Merging);
        let mut result = self.assemble(&document, mode);

        if let Some(sanitize) = self.options.sanitize {
            let summary = Sanitizer::new(sanitize)?.sanitize_result(&mut result);
            self.sanitize_summary = Some(summary);
        }

        self.transition(ConversionState::Assembled);
        Ok(result)
    }

    /// Extract one page. Failures produce a page with no content.
    fn extract_page(&self, backend: &dyn PdfBackend, number: u32, mode: ExtractMode) -> Page {
        match self.try_extract_page(backend, number, mode) {
            Ok(page) => page,
            Err(e) => {
                let message = failure_message(e);
                log::warn!("Failed to extract page {}: {}", number, message);
                Page::failed(number, message)
            }
        }
    }

    fn try_extract_page(
        &self,
        backend: &dyn PdfBackend,
        number: u32,
        mode: ExtractMode,
    ) -> Result<Page> {
        let handle = backend.page(number)?;
        let spans = handle.text_spans()?;
        let mut page = Page::new(number);

        if mode.wants_tables() {
            let geometry = handle.geometry()?;
            page.tables = self.detector.detect_in(number, &spans, &geometry.rulings);
        }

        if mode.wants_text() {
            page.blocks =
                self.extractor
                    .blocks_from_spans(number, spans, self.options.preserve_formatting);
        }

        Ok(page)
    }

    fn assemble(&self, document: &Document, mode: ExtractMode) -> ExtractionResult {
        let mut result = ExtractionResult::new(document.metadata.page_count);

        for page in &document.pages {
            if let Some(message) = &page.failure {
                result.warnings.push(Warning::PageExtraction {
                    page: page.number,
                    message: message.clone(),
                });
            }
            let unmapped = page.unmapped_count();
            if unmapped > 0 {
                result.warnings.push(Warning::UnmappableCharacters {
                    page: page.number,
                    count: unmapped,
                });
            }
        }

        let texts = if mode.wants_text() {
            self.page_texts(document)
        } else {
            Vec::new()
        };
        let tables: Vec<Vec<Table>> = if mode.wants_tables() {
            document.pages.iter().map(|p| self.page_tables(p)).collect()
        } else {
            Vec::new()
        };

        match self.options.layout {
            ResultLayout::Interleaved => {
                for (i, page) in document.pages.iter().enumerate() {
                    if let Some(text) = texts.get(i) {
                        result.push_text(page.number, text.clone());
                    }
                    for table in tables.get(i).into_iter().flatten() {
                        result.push_table(table.clone());
                    }
                }
            }
            ResultLayout::Sectioned => {
                for (page, text) in document.pages.iter().zip(&texts) {
                    result.push_text(page.number, text.clone());
                }
                for table in tables.into_iter().flatten() {
                    result.push_table(table);
                }
            }
        }

        result
    }

    /// Merged text of every extracted page, in document order.
    fn page_texts(&self, document: &Document) -> Vec<String> {
        let blocks: Vec<_> = document
            .pages
            .iter()
            .flat_map(|p| p.blocks.iter().cloned())
            .collect();
        let paragraphs = merge_paragraphs(&blocks, &self.options.merge_options());

        let separator = if self.options.preserve_formatting {
            "\n"
        } else {
            " "
        };

        document
            .pages
            .iter()
            .map(|page| {
                paragraphs
                    .iter()
                    .filter(|p| p.page == page.number)
                    .map(|p| p.text.as_str())
                    .collect::<Vec<_>>()
                    .join(separator)
            })
            .collect()
    }

    fn page_tables(&self, page: &Page) -> Vec<Table> {
        let mut tables = page.tables.clone();
        if self.options.remove_empty_rows {
            for table in &mut tables {
                let removed = table.remove_empty_rows();
                if removed > 0 {
                    log::debug!("Page {}: removed {} empty table rows", page.number, removed);
                }
            }
            tables.retain(|t| !t.is_empty());
        }
        tables
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConvertOptions::default())
    }
}

fn failure_message(error: Error) -> String {
    match error {
        Error::PageExtract { message, .. } => message,
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{PageGeometry, PdfPage, Ruling, TextSpan};

    struct MemoryPage {
        number: u32,
        spans: Vec<TextSpan>,
        rulings: Vec<Ruling>,
        broken: bool,
    }

    impl PdfPage for MemoryPage {
        fn number(&self) -> u32 {
            self.number
        }

        fn text_spans(&self) -> Result<Vec<TextSpan>> {
            if self.broken {
                return Err(Error::PageExtract {
                    page: self.number,
                    message: "corrupt content stream".to_string(),
                });
            }
            Ok(self.spans.clone())
        }

        fn geometry(&self) -> Result<PageGeometry> {
            Ok(PageGeometry {
                rulings: self.rulings.clone(),
                ..Default::default()
            })
        }
    }

    #[derive(Default)]
    struct MemoryBackend {
        pages: Vec<(Vec<TextSpan>, Vec<Ruling>, bool)>,
    }

    impl MemoryBackend {
        fn with_page(mut self, spans: Vec<TextSpan>) -> Self {
            self.pages.push((spans, Vec::new(), false));
            self
        }

        fn with_ruled_page(mut self, spans: Vec<TextSpan>, rulings: Vec<Ruling>) -> Self {
            self.pages.push((spans, rulings, false));
            self
        }

        fn with_broken_page(mut self) -> Self {
            self.pages.push((Vec::new(), Vec::new(), true));
            self
        }
    }

    impl PdfBackend for MemoryBackend {
        fn page_numbers(&self) -> Vec<u32> {
            (1..=self.pages.len() as u32).collect()
        }

        fn page(&self, number: u32) -> Result<Box<dyn PdfPage + '_>> {
            let (spans, rulings, broken) = self
                .pages
                .get(number as usize - 1)
                .ok_or(Error::PageOutOfRange(number, self.pages.len() as u32))?;
            Ok(Box::new(MemoryPage {
                number,
                spans: spans.clone(),
                rulings: rulings.clone(),
                broken: *broken,
            }))
        }
    }

    fn span(text: &str, x: f32, y: f32) -> TextSpan {
        TextSpan::new(text, x, y, 12.0)
    }

    /// A 2x2 ruled grid spanning x 100..300, y 500..560 with filled cells.
    fn grid_page() -> (Vec<TextSpan>, Vec<Ruling>) {
        let spans = vec![
            span("品名", 110.0, 540.0),
            span("數量", 210.0, 540.0),
            span("蘋果", 110.0, 510.0),
            span("3", 210.0, 510.0),
        ];
        let rulings = vec![
            Ruling::horizontal(560.0, 100.0, 300.0),
            Ruling::horizontal(530.0, 100.0, 300.0),
            Ruling::horizontal(500.0, 100.0, 300.0),
            Ruling::vertical(100.0, 500.0, 560.0),
            Ruling::vertical(200.0, 500.0, 560.0),
            Ruling::vertical(300.0, 500.0, 560.0),
        ];
        (spans, rulings)
    }

    #[test]
    fn test_text_mode_one_entry_per_page() {
        let backend = MemoryBackend::default()
            .with_page(vec![span("第一頁", 72.0, 700.0)])
            .with_page(vec![span("第二頁", 72.0, 700.0)]);
        let mut converter = Converter::default();

        let result = converter
            .convert_backend(&backend, ExtractMode::Text)
            .unwrap();

        let texts: Vec<_> = result.texts().collect();
        assert_eq!(texts, vec![(1, "第一頁"), (2, "第二頁")]);
        assert_eq!(result.page_count, 2);
        assert_eq!(converter.state(), ConversionState::Assembled);
    }

    #[test]
    fn test_failed_page_becomes_warning() {
        let backend = MemoryBackend::default()
            .with_page(vec![span("正常", 72.0, 700.0)])
            .with_broken_page();
        let mut converter = Converter::default();

        let result = converter
            .convert_backend(&backend, ExtractMode::Combined)
            .unwrap();

        assert_eq!(result.texts().collect::<Vec<_>>(), vec![(1, "正常"), (2, "")]);
        assert_eq!(
            result.warnings,
            vec![Warning::PageExtraction {
                page: 2,
                message: "corrupt content stream".to_string()
            }]
        );
    }

    #[test]
    fn test_unmappable_characters_warning() {
        let backend = MemoryBackend::default().with_page(vec![span("a\u{E000}b\u{FFFD}", 72.0, 700.0)]);
        let mut converter = Converter::new(ConvertOptions::new().with_placeholder('?'));

        let result = converter
            .convert_backend(&backend, ExtractMode::Text)
            .unwrap();

        assert_eq!(result.texts().next(), Some((1, "a?b?")));
        assert_eq!(
            result.warnings,
            vec![Warning::UnmappableCharacters { page: 1, count: 2 }]
        );
    }

    #[test]
    fn test_table_mode_has_no_text_entries() {
        let (spans, rulings) = grid_page();
        let backend = MemoryBackend::default().with_ruled_page(spans, rulings);
        let mut converter = Converter::default();

        let result = converter
            .convert_backend(&backend, ExtractMode::Table)
            .unwrap();

        assert_eq!(result.texts().count(), 0);
        assert_eq!(result.table_count(), 1);
        let table = result.tables().next().unwrap();
        assert_eq!(
            table.rows,
            vec![vec!["品名", "數量"], vec!["蘋果", "3"]]
        );
    }

    #[test]
    fn test_sectioned_layout_puts_tables_last() {
        let (spans, rulings) = grid_page();
        let backend = MemoryBackend::default()
            .with_ruled_page(spans, rulings)
            .with_page(vec![span("結尾", 72.0, 700.0)]);
        let options = ConvertOptions::new().with_layout(ResultLayout::Sectioned);
        let mut converter = Converter::new(options);

        let result = converter
            .convert_backend(&backend, ExtractMode::Combined)
            .unwrap();

        let kinds: Vec<_> = result
            .entries
            .iter()
            .map(|e| (e.page(), e.is_table()))
            .collect();
        assert_eq!(kinds, vec![(1, false), (2, false), (1, true)]);
    }

    #[test]
    fn test_page_selection() {
        let backend = MemoryBackend::default()
            .with_page(vec![span("一", 72.0, 700.0)])
            .with_page(vec![span("二", 72.0, 700.0)])
            .with_page(vec![span("三", 72.0, 700.0)]);
        let options = ConvertOptions::new().with_pages(crate::parser::PageSelection::Pages(vec![2]));
        let mut converter = Converter::new(options);

        let result = converter
            .convert_backend(&backend, ExtractMode::Text)
            .unwrap();

        assert_eq!(result.texts().collect::<Vec<_>>(), vec![(2, "二")]);
        assert_eq!(result.page_count, 3);
    }

    #[test]
    fn test_joined_paragraphs_without_preserve() {
        let backend = MemoryBackend::default().with_page(vec![
            span("第一段。", 72.0, 700.0),
            span("第二段。", 72.0, 600.0),
        ]);
        let options = ConvertOptions::new().with_preserve_formatting(false);
        let mut converter = Converter::new(options);

        let result = converter
            .convert_backend(&backend, ExtractMode::Text)
            .unwrap();

        assert_eq!(result.texts().next(), Some((1, "第一段。 第二段。")));
    }

    #[test]
    fn test_sanitize_summary_recorded() {
        let backend = MemoryBackend::default().with_page(vec![span("mail a@b.org", 72.0, 700.0)]);
        let options =
            ConvertOptions::new().with_sanitize(crate::sanitize::SanitizeOptions::default());
        let mut converter = Converter::new(options);

        let result = converter
            .convert_backend(&backend, ExtractMode::Text)
            .unwrap();

        assert_eq!(result.texts().next(), Some((1, "mail [EMAIL_REDACTED]")));
        assert_eq!(converter.sanitize_summary().map(|s| s.emails), Some(1));
    }

    #[test]
    fn test_invalid_bytes_fail() {
        let mut converter = Converter::default();
        let err = converter
            .convert(b"not a pdf".to_vec(), ExtractMode::Text)
            .unwrap_err();

        assert!(err.is_unreadable_pdf());
        assert_eq!(converter.state(), ConversionState::Failed);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ConversionState::PerPageExtract.to_string(), "PER_PAGE_EXTRACT");
    }
}
