//! PDF parsing module.
//!
//! The backend decodes page content into positioned spans and rulings.
//! The extractor, table detector and merger work on those.

mod backend;
mod content;
mod layout;
mod merger;
mod options;
mod table_detector;

pub use backend::{
    decode_text_simple, estimate_width, LopdfBackend, Orientation, PageGeometry, PdfBackend,
    PdfPage, Ruling, TextSpan,
};
pub use layout::{Column, TextExtractor, TextLine, DEFAULT_PLACEHOLDER};
pub use merger::{merge, merge_paragraphs, Paragraph};
pub use options::{ExtractMode, MergeOptions, PageSelection};
pub use table_detector::{
    resolve_overlaps, Candidate, TableDetector, TableDetectorConfig, TableRowData, TableSource,
};
