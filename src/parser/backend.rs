//! PDF backend abstraction layer.
//!
//! Extraction only ever asks a page for two things: its positioned text runs
//! and its ruling geometry. The [`PdfPage`] and [`PdfBackend`] traits expose
//! exactly that, keeping the concrete PDF library (lopdf) out of the layout
//! and table logic.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result, Unreadable};
use crate::model::{Metadata, Rect};

use super::content::{self, FontResolver, PageContent};
use super::layout::is_spaceless_script_char;

/// US Letter, used when a page carries no usable media box.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

/// Two endpoints closer than this are considered aligned on an axis.
const AXIS_TOLERANCE: f32 = 1.0;

/// Segments shorter than this are ignored.
const MIN_RULING_LENGTH: f32 = 2.0;

/// One decoded text-showing operation with its position on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    /// The text content
    pub text: String,
    /// X position (left edge)
    pub x: f32,
    /// Y position (baseline)
    pub y: f32,
    /// Estimated width of the text
    pub width: f32,
    /// Effective font size in points
    pub font_size: f32,
    /// Font name (e.g., "Helvetica", "MingLiU")
    pub font_name: String,
}

impl TextSpan {
    /// Create a new span, estimating its width from the text and font size.
    pub fn new(text: impl Into<String>, x: f32, y: f32, font_size: f32) -> Self {
        let text = text.into();
        let width = estimate_width(&text, font_size);
        Self {
            text,
            x,
            y,
            width,
            font_size,
            font_name: String::new(),
        }
    }

    /// Set the font name and return self.
    pub fn with_font(mut self, font_name: impl Into<String>) -> Self {
        self.font_name = font_name.into();
        self
    }

    /// Right edge of the span.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Horizontal center of the span.
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Get the bottom Y coordinate (approximate, based on font size).
    pub fn bottom(&self) -> f32 {
        self.y - self.font_size * 0.2
    }

    /// Get the top Y coordinate (approximate, based on font size).
    pub fn top(&self) -> f32 {
        self.y + self.font_size * 0.8
    }

    /// Vertical center of the glyph box.
    pub fn center_y(&self) -> f32 {
        (self.bottom() + self.top()) / 2.0
    }
}

/// Estimate the advance width of a string.
///
/// Ideographs and fullwidth forms take a full em, everything else half.
pub fn estimate_width(text: &str, font_size: f32) -> f32 {
    text.chars()
        .map(|c| if is_wide_char(c) { 1.0 } else { 0.5 })
        .sum::<f32>()
        * font_size
}

fn is_wide_char(c: char) -> bool {
    is_spaceless_script_char(c)
        || ('\u{FF00}'..='\u{FFEF}').contains(&c)
        || ('\u{AC00}'..='\u{D7AF}').contains(&c)
}

/// Orientation of a ruling line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Orientation {
    /// Parallel to the x axis
    Horizontal,
    /// Parallel to the y axis
    Vertical,
}

/// A horizontal or vertical line segment painted on the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ruling {
    /// Which axis the line runs along
    pub orientation: Orientation,
    /// Y for horizontal rulings, x for vertical ones
    pub position: f32,
    /// Lower end along the running axis
    pub start: f32,
    /// Upper end along the running axis
    pub end: f32,
}

impl Ruling {
    /// Create a horizontal ruling at `y` spanning `x1..x2`.
    pub fn horizontal(y: f32, x1: f32, x2: f32) -> Self {
        Self {
            orientation: Orientation::Horizontal,
            position: y,
            start: x1.min(x2),
            end: x1.max(x2),
        }
    }

    /// Create a vertical ruling at `x` spanning `y1..y2`.
    pub fn vertical(x: f32, y1: f32, y2: f32) -> Self {
        Self {
            orientation: Orientation::Vertical,
            position: x,
            start: y1.min(y2),
            end: y1.max(y2),
        }
    }

    /// Build a ruling from a segment, or `None` if it is diagonal or too short.
    pub fn from_segment(x1: f32, y1: f32, x2: f32, y2: f32) -> Option<Self> {
        let dx = (x2 - x1).abs();
        let dy = (y2 - y1).abs();

        if dy <= AXIS_TOLERANCE && dx >= MIN_RULING_LENGTH {
            Some(Self::horizontal((y1 + y2) / 2.0, x1, x2))
        } else if dx <= AXIS_TOLERANCE && dy >= MIN_RULING_LENGTH {
            Some(Self::vertical((x1 + x2) / 2.0, y1, y2))
        } else {
            None
        }
    }

    /// Check if this ruling is horizontal.
    pub fn is_horizontal(&self) -> bool {
        self.orientation == Orientation::Horizontal
    }

    /// Length along the running axis.
    pub fn length(&self) -> f32 {
        self.end - self.start
    }

    /// Check whether this ruling crosses or touches a perpendicular one.
    pub fn intersects(&self, other: &Ruling, tolerance: f32) -> bool {
        if self.orientation == other.orientation {
            return false;
        }
        other.position >= self.start - tolerance
            && other.position <= self.end + tolerance
            && self.position >= other.start - tolerance
            && self.position <= other.end + tolerance
    }
}

/// Geometry of one page: its media box and the rulings drawn on it.
#[derive(Debug, Clone, PartialEq)]
pub struct PageGeometry {
    /// Page boundaries
    pub media_box: Rect,
    /// Horizontal and vertical line segments
    pub rulings: Vec<Ruling>,
}

impl Default for PageGeometry {
    fn default() -> Self {
        let [l, b, r, t] = DEFAULT_MEDIA_BOX;
        Self {
            media_box: Rect::new(l, b, r, t),
            rulings: Vec::new(),
        }
    }
}

/// One page of an opened document.
pub trait PdfPage {
    /// 1-based page number.
    fn number(&self) -> u32;

    /// Decoded, positioned text runs in content-stream order.
    fn text_spans(&self) -> Result<Vec<TextSpan>>;

    /// Media box and ruling lines.
    fn geometry(&self) -> Result<PageGeometry>;
}

/// Abstract interface for PDF document access.
pub trait PdfBackend {
    /// All page numbers in ascending order.
    fn page_numbers(&self) -> Vec<u32>;

    /// Open a single page.
    fn page(&self, number: u32) -> Result<Box<dyn PdfPage + '_>>;

    /// Number of pages in the document.
    fn page_count(&self) -> u32 {
        self.page_numbers().len() as u32
    }
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if let Some(text) = decode_utf16_be(bytes) {
        return text;
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

/// Decode a BOM-marked UTF-16BE string; `None` if there is no BOM.
fn decode_utf16_be(bytes: &[u8]) -> Option<String> {
    if bytes.len() < 2 || bytes[0] != 0xFE || bytes[1] != 0xFF {
        return None;
    }
    let utf16: Vec<u16> = bytes[2..]
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    Some(String::from_utf16_lossy(&utf16))
}

// ---------------------------------------------------------------------------
// LopdfBackend: concrete implementation backed by lopdf
// ---------------------------------------------------------------------------

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        // Nothing is read from disk here, so I/O errors mean truncated data.
        let doc = LopdfDocument::load_mem(data).map_err(|e| match Error::from(e) {
            Error::Io(io) => Unreadable::Parse(io.to_string()).into(),
            other => other,
        })?;
        Ok(Self { doc })
    }

    /// Load, logging when a password is supplied for an encrypted document.
    ///
    /// lopdf decrypts documents with an empty user password on load; other
    /// passwords cannot be applied.
    pub fn load_with_password(data: &[u8], password: Option<&str>) -> Result<Self> {
        let backend = Self::load_bytes(data)?;
        if password.is_some() && backend.is_encrypted() {
            log::warn!("Password was provided but lopdf 0.34 doesn't support decryption");
        }
        Ok(backend)
    }

    /// Check if the document is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    /// Read the Info dictionary.
    pub fn metadata(&self) -> Metadata {
        let mut metadata = Metadata::with_version(self.version());
        metadata.encrypted = self.is_encrypted();
        metadata.page_count = self.page_count();

        let info_dict = self
            .doc
            .trailer
            .get(b"Info")
            .and_then(Object::as_reference)
            .and_then(|r| self.doc.get_dictionary(r));

        if let Ok(info) = info_dict {
            metadata.title = get_string_from_dict(info, b"Title");
            metadata.author = get_string_from_dict(info, b"Author");
            metadata.subject = get_string_from_dict(info, b"Subject");
            metadata.keywords = get_string_from_dict(info, b"Keywords");
            metadata.creator = get_string_from_dict(info, b"Creator");
            metadata.producer = get_string_from_dict(info, b"Producer");
            metadata.created =
                get_string_from_dict(info, b"CreationDate").and_then(|s| parse_pdf_date(&s));
            metadata.modified =
                get_string_from_dict(info, b"ModDate").and_then(|s| parse_pdf_date(&s));
        }

        metadata
    }
}

impl PdfBackend for LopdfBackend {
    fn page_numbers(&self) -> Vec<u32> {
        self.doc.get_pages().keys().copied().collect()
    }

    fn page(&self, number: u32) -> Result<Box<dyn PdfPage + '_>> {
        let pages = self.doc.get_pages();
        let id = pages
            .get(&number)
            .copied()
            .ok_or(Error::PageOutOfRange(number, pages.len() as u32))?;
        Ok(Box::new(LopdfPage {
            doc: &self.doc,
            id,
            number,
        }))
    }
}

/// A page of a [`LopdfBackend`] document.
struct LopdfPage<'a> {
    doc: &'a LopdfDocument,
    id: ObjectId,
    number: u32,
}

impl LopdfPage<'_> {
    fn page_error(&self, message: impl std::fmt::Display) -> Error {
        Error::PageExtract {
            page: self.number,
            message: message.to_string(),
        }
    }

    /// Concatenated, decompressed content streams of the page.
    fn content_bytes(&self) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(self.id)
            .map_err(|e| self.page_error(e))?;

        let contents = match page_dict.get(b"Contents") {
            Ok(contents) => contents,
            // A page without content is blank, not broken.
            Err(_) => return Ok(Vec::new()),
        };

        match contents {
            Object::Reference(r) => match self.doc.get_object(*r) {
                Ok(Object::Stream(s)) => self.stream_bytes(s),
                _ => Err(self.page_error("invalid content stream")),
            },
            Object::Array(arr) => {
                let mut content = Vec::new();
                for obj in arr {
                    if let Ok(r) = obj.as_reference() {
                        if let Ok(Object::Stream(s)) = self.doc.get_object(r) {
                            let data = self.stream_bytes(s)?;
                            content.extend_from_slice(&data);
                            content.push(b' ');
                        }
                    }
                }
                Ok(content)
            }
            _ => Err(self.page_error("invalid content stream")),
        }
    }

    /// Decoded bytes of one content stream. Streams without a /Filter are
    /// stored raw.
    fn stream_bytes(&self, stream: &lopdf::Stream) -> Result<Vec<u8>> {
        if stream.dict.has(b"Filter") {
            stream.decompressed_content().map_err(|e| self.page_error(e))
        } else {
            Ok(stream.content.clone())
        }
    }

    fn interpret(&self) -> Result<PageContent> {
        let data = self.content_bytes()?;
        if data.is_empty() {
            return Ok(PageContent::default());
        }

        let operations = lopdf::content::Content::decode(&data)
            .map_err(|e| self.page_error(e))?
            .operations;

        let fonts = LopdfFonts {
            doc: self.doc,
            fonts: self.doc.get_page_fonts(self.id).unwrap_or_default(),
        };

        Ok(content::interpret(&operations, &fonts))
    }

    /// Media box, inherited from ancestor page tree nodes when absent.
    fn media_box(&self) -> Rect {
        let mut node = self.doc.get_dictionary(self.id).ok();
        while let Some(dict) = node {
            if let Ok(array) = dict.get(b"MediaBox").and_then(Object::as_array) {
                let values: Vec<f32> = array.iter().filter_map(|o| o.as_float().ok()).collect();
                if values.len() == 4 {
                    return Rect::new(values[0], values[1], values[2], values[3]);
                }
            }
            node = dict
                .get(b"Parent")
                .and_then(Object::as_reference)
                .and_then(|r| self.doc.get_dictionary(r))
                .ok();
        }
        let [l, b, r, t] = DEFAULT_MEDIA_BOX;
        Rect::new(l, b, r, t)
    }
}

impl PdfPage for LopdfPage<'_> {
    fn number(&self) -> u32 {
        self.number
    }

    fn text_spans(&self) -> Result<Vec<TextSpan>> {
        Ok(self.interpret()?.spans)
    }

    fn geometry(&self) -> Result<PageGeometry> {
        Ok(PageGeometry {
            media_box: self.media_box(),
            rulings: self.interpret()?.rulings,
        })
    }
}

/// Font resources of one page.
struct LopdfFonts<'a> {
    doc: &'a LopdfDocument,
    fonts: BTreeMap<Vec<u8>, &'a Dictionary>,
}

impl FontResolver for LopdfFonts<'_> {
    fn base_font(&self, resource: &[u8]) -> String {
        self.fonts
            .get(resource)
            .and_then(|f| f.get(b"BaseFont").ok())
            .and_then(|o| o.as_name().ok())
            .map(|n| String::from_utf8_lossy(n).to_string())
            .unwrap_or_else(|| String::from_utf8_lossy(resource).to_string())
    }

    fn decode(&self, resource: &[u8], bytes: &[u8]) -> String {
        if let Some(text) = decode_utf16_be(bytes) {
            return text;
        }
        if let Some(font_dict) = self.fonts.get(resource) {
            if let Ok(enc) = font_dict.get_font_encoding(self.doc) {
                if let Ok(text) = LopdfDocument::decode_text(&enc, bytes) {
                    return text;
                }
            }
        }
        decode_text_simple(bytes)
    }
}

/// Helper to get a string from a PDF dictionary.
fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(decode_text_simple(bytes)),
        Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

/// Parse a PDF date string (D:YYYYMMDDHHmmSSOHH'mm').
fn parse_pdf_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let s = s.strip_prefix("D:").unwrap_or(s);

    if s.len() < 4 {
        return None;
    }

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let field = |range: std::ops::Range<usize>, default: u32| -> u32 {
        s.get(range).and_then(|v| v.parse().ok()).unwrap_or(default)
    };

    chrono::NaiveDate::from_ymd_opt(year, field(4..6, 1), field(6..8, 1))
        .and_then(|date| date.and_hms_opt(field(8..10, 0), field(10..12, 0), field(12..14, 0)))
        .map(|dt| chrono::DateTime::from_naive_utc_and_offset(dt, chrono::Utc))
}
