//! Error types for the pdfsheet library.

use std::io;
use thiserror::Error;

/// Result type alias for pdfsheet operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting a PDF.
///
/// Only document-level failures are errors. Problems confined to a single
/// page or glyph are reported as [`Warning`](crate::model::Warning)s on the
/// extraction result instead.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading the input file or writing output.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input cannot be opened as a PDF at all.
    #[error("Unreadable PDF: {0}")]
    UnreadablePdf(Unreadable),

    /// The input exceeds the configured size limit.
    #[error("File too large: {size} bytes (maximum {limit} bytes)")]
    FileTooLarge {
        /// Size of the input in bytes
        size: usize,
        /// Configured limit in bytes
        limit: usize,
    },

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// A single page could not be read.
    #[error("Page {page}: {message}")]
    PageExtract {
        /// 1-based page number
        page: u32,
        /// What went wrong
        message: String,
    },

    /// Error while rendering output (CSV, JSON).
    #[error("Rendering error: {0}")]
    Render(String),

    /// A redaction pattern failed to compile.
    #[error("Invalid redaction pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

/// Why a PDF could not be opened.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Unreadable {
    /// The data does not start with a PDF header.
    #[error("not a PDF file")]
    UnknownFormat,

    /// The header carries a malformed version.
    #[error("unsupported PDF version {0}")]
    UnsupportedVersion(String),

    /// The `%%EOF` trailer marker is missing.
    #[error("missing end-of-file marker")]
    MissingEof,

    /// The document is encrypted and no usable credentials were supplied.
    #[error("document is encrypted")]
    Encrypted,

    /// The document structure could not be parsed.
    #[error("{0}")]
    Parse(String),
}

impl Error {
    /// Check whether this error means the PDF itself could not be opened.
    pub fn is_unreadable_pdf(&self) -> bool {
        matches!(self, Error::UnreadablePdf(_))
    }
}

impl From<Unreadable> for Error {
    fn from(reason: Unreadable) -> Self {
        Error::UnreadablePdf(reason)
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::UnreadablePdf(Unreadable::Encrypted),
            _ => Error::UnreadablePdf(Unreadable::Parse(err.to_string())),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Render(err.to_string())
    }
}
