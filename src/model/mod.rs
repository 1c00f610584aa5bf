//! Data model shared by extraction and rendering.
//!
//! Pages and text blocks are transient and exist only during one
//! conversion. [`ExtractionResult`] is what callers get back.

mod block;
mod document;
mod page;
mod result;
mod table;

pub use block::TextBlock;
pub use document::{Document, Metadata, PdfInfo};
pub use page::Page;
pub use result::{Entry, ExtractionResult, Warning};
pub use table::{Rect, Table};
