//! PDF format detection and upfront validation.

use crate::error::{Error, Result, Unreadable};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// PDF format information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFormat {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
}

impl std::fmt::Display for PdfFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

/// PDF magic bytes: %PDF-
const PDF_MAGIC: &[u8] = b"%PDF-";
const PDF_MAGIC_LEN: usize = 5;
const VERSION_LEN: usize = 3; // e.g., "1.7"
const EOF_MARKER: &[u8] = b"%%EOF";

/// Detect PDF format from a file path.
///
/// Only the first 16 bytes are read.
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<PdfFormat> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut header = [0u8; 16];
    let read = reader.read(&mut header)?;
    detect_format_from_bytes(&header[..read])
}

/// Detect PDF format from bytes.
///
/// # Returns
/// * `Ok(PdfFormat)` if the data starts with a valid PDF header
/// * `Err(Error::UnreadablePdf(Unreadable::UnknownFormat))` otherwise
pub fn detect_format_from_bytes(data: &[u8]) -> Result<PdfFormat> {
    if data.len() < PDF_MAGIC_LEN + VERSION_LEN || !data.starts_with(PDF_MAGIC) {
        return Err(Unreadable::UnknownFormat.into());
    }

    // Extract version string (e.g., "1.7" from "%PDF-1.7")
    let version_bytes = &data[PDF_MAGIC_LEN..PDF_MAGIC_LEN + VERSION_LEN];
    let version = String::from_utf8_lossy(version_bytes).to_string();

    if !is_valid_version(&version) {
        return Err(Unreadable::UnsupportedVersion(version).into());
    }

    Ok(PdfFormat { version })
}

/// Validate a complete PDF buffer before handing it to the parser.
///
/// Checks the optional size limit, the header and the presence of an
/// end-of-file marker.
pub fn validate_pdf_bytes(data: &[u8], max_size: Option<usize>) -> Result<PdfFormat> {
    if let Some(limit) = max_size {
        if data.len() > limit {
            return Err(Error::FileTooLarge {
                size: data.len(),
                limit,
            });
        }
    }

    let format = detect_format_from_bytes(data)?;

    if !contains_eof_marker(data) {
        return Err(Unreadable::MissingEof.into());
    }

    Ok(format)
}

fn contains_eof_marker(data: &[u8]) -> bool {
    data.windows(EOF_MARKER.len()).any(|w| w == EOF_MARKER)
}

/// Check if a version string is valid.
fn is_valid_version(version: &str) -> bool {
    if version.len() != 3 {
        return false;
    }

    let chars: Vec<char> = version.chars().collect();
    chars[0].is_ascii_digit() && chars[1] == '.' && chars[2].is_ascii_digit()
}

/// Check if a file is a PDF.
pub fn is_pdf<P: AsRef<Path>>(path: P) -> bool {
    detect_format_from_path(path).is_ok()
}

/// Check if bytes start with a PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}
