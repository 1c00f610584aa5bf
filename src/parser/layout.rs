//! Text extraction with layout analysis.
//!
//! Turns the positioned spans of a page into ordered text lines: spans are
//! grouped into visual lines, two-column pages are read column by column,
//! and the resulting text is normalized.

use unicode_normalization::UnicodeNormalization;

use crate::error::Result;
use crate::model::TextBlock;

use super::backend::{PdfPage, TextSpan};

/// Default replacement for characters that cannot be mapped.
pub const DEFAULT_PLACEHOLDER: char = '\u{FFFD}';

/// Largest page dimension PDF allows, in points. Wider text extents come
/// from off-page spans and are not split into columns.
const MAX_PAGE_EXTENT: f32 = 14_400.0;

/// A text line composed of multiple spans on the same baseline.
#[derive(Debug, Clone)]
pub struct TextLine {
    /// The spans in this line, sorted by X position
    pub spans: Vec<TextSpan>,
    /// Y position (baseline)
    pub y: f32,
    /// Leftmost X position
    pub x: f32,
    /// Dominant font size in this line
    pub font_size: f32,
}

impl TextLine {
    /// Create a new text line from spans.
    pub fn from_spans(mut spans: Vec<TextSpan>) -> Self {
        if spans.is_empty() {
            return Self {
                spans: vec![],
                y: 0.0,
                x: 0.0,
                font_size: 0.0,
            };
        }

        spans.sort_by(|a, b| a.x.total_cmp(&b.x));

        // Dominant font size, weighted by text length
        let total_chars: usize = spans.iter().map(|s| s.text.chars().count()).sum();
        let weighted_size: f32 = spans
            .iter()
            .map(|s| s.font_size * s.text.chars().count() as f32)
            .sum();
        let font_size = if total_chars > 0 {
            weighted_size / total_chars as f32
        } else {
            spans[0].font_size
        };

        let y = spans.iter().map(|s| s.y).sum::<f32>() / spans.len() as f32;
        let x = spans[0].x;

        Self {
            spans,
            y,
            x,
            font_size,
        }
    }

    /// Get the combined text of all spans with appropriate spacing.
    ///
    /// Inserts spaces between spans based on their X coordinate gaps.
    /// No space is inserted between two CJK characters.
    pub fn text(&self) -> String {
        let mut result = String::new();

        for (i, span) in self.spans.iter().enumerate() {
            if i == 0 {
                result.push_str(&span.text);
                continue;
            }

            let prev_span = &self.spans[i - 1];
            let gap = span.x - prev_span.right();

            let char_count = span.text.chars().count();
            let avg_char_width = if char_count > 0 && span.width > 0.0 {
                span.width / char_count as f32
            } else {
                span.font_size * 0.5
            };

            let prev_last = prev_span.text.chars().last();
            let curr_first = span.text.chars().next();

            let both_cjk = prev_last.map(is_spaceless_script_char).unwrap_or(false)
                && curr_first.map(is_spaceless_script_char).unwrap_or(false);

            let prev_ends_with_space =
                prev_span.text.ends_with(' ') || prev_span.text.ends_with('\u{00A0}');
            let curr_starts_with_space =
                span.text.starts_with(' ') || span.text.starts_with('\u{00A0}');

            if gap > avg_char_width * 0.2
                && !both_cjk
                && !prev_ends_with_space
                && !curr_starts_with_space
            {
                result.push(' ');
            }

            result.push_str(&span.text);
        }

        result
    }
}

/// A detected column in the page layout.
#[derive(Debug, Clone)]
pub struct Column {
    /// Left boundary X coordinate
    pub left: f32,
    /// Right boundary X coordinate
    pub right: f32,
    /// Column index (0 = leftmost)
    pub index: usize,
}

impl Column {
    /// Check if an X coordinate falls within this column.
    pub fn contains(&self, x: f32) -> bool {
        x >= self.left && x <= self.right
    }

    /// Check if a span belongs to this column (left edge or center inside).
    pub fn contains_span(&self, span: &TextSpan) -> bool {
        self.contains(span.x) || self.contains(span.center_x())
    }
}

/// Extracts ordered, normalized text lines from a page.
#[derive(Debug, Clone)]
pub struct TextExtractor {
    placeholder: char,
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor {
    /// Create an extractor using U+FFFD as placeholder.
    pub fn new() -> Self {
        Self {
            placeholder: DEFAULT_PLACEHOLDER,
        }
    }

    /// Set the placeholder used for unmappable characters.
    pub fn with_placeholder(mut self, placeholder: char) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Extract the text lines of a page in reading order.
    ///
    /// With `preserve_formatting`, each line keeps its internal spacing;
    /// otherwise whitespace runs collapse to a single space. Blank lines
    /// are dropped, so a page without text yields no blocks.
    pub fn extract_text(
        &self,
        page: &dyn PdfPage,
        preserve_formatting: bool,
    ) -> Result<Vec<TextBlock>> {
        let spans = page.text_spans()?;
        Ok(self.blocks_from_spans(page.number(), spans, preserve_formatting))
    }

    /// Build text blocks from already extracted spans.
    pub fn blocks_from_spans(
        &self,
        page: u32,
        spans: Vec<TextSpan>,
        preserve_formatting: bool,
    ) -> Vec<TextBlock> {
        let lines = group_spans_into_lines(spans);
        log::debug!("Page {}: {} lines", page, lines.len());

        lines
            .into_iter()
            .filter_map(|line| {
                let (text, unmapped) = self.normalize(&line.text(), preserve_formatting);
                if text.trim().is_empty() {
                    return None;
                }
                Some(TextBlock {
                    page,
                    text,
                    x: line.x,
                    y: line.y,
                    font_size: line.font_size,
                    unmapped,
                })
            })
            .collect()
    }

    /// NFC-normalize text and replace unmappable characters.
    ///
    /// Returns the normalized text and the number of replacements.
    pub fn normalize(&self, text: &str, preserve_formatting: bool) -> (String, usize) {
        let mut unmapped = 0;
        let replaced: String = text
            .nfc()
            .map(|c| {
                if is_unmappable(c) {
                    unmapped += 1;
                    self.placeholder
                } else {
                    c
                }
            })
            .collect();

        let text = if preserve_formatting {
            replaced.trim_end().to_string()
        } else {
            collapse_whitespace(&replaced)
        };

        (text, unmapped)
    }
}

/// Collapse every whitespace run to a single space and trim.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Append `next` to `buf`, separated by a space unless both sides are CJK.
pub(crate) fn push_joined(buf: &mut String, next: &str) {
    let next = next.trim();
    if next.is_empty() {
        return;
    }
    let both_cjk = buf.chars().last().map(is_spaceless_script_char).unwrap_or(false)
        && next.chars().next().map(is_spaceless_script_char).unwrap_or(false);
    if !buf.is_empty() && !both_cjk && !buf.ends_with(char::is_whitespace) {
        buf.push(' ');
    }
    buf.push_str(next);
}

/// Check if a character cannot be represented faithfully.
fn is_unmappable(c: char) -> bool {
    let code = c as u32;
    c == '\u{FFFD}'
        || (c.is_control() && c != '\t')
        || (0xE000..=0xF8FF).contains(&code)
        || (0xF0000..=0xFFFFD).contains(&code)
        || (0x100000..=0x10FFFD).contains(&code)
}

/// Group spans into lines, reading a two-column layout column by column.
fn group_spans_into_lines(spans: Vec<TextSpan>) -> Vec<TextLine> {
    if spans.is_empty() {
        return vec![];
    }

    let columns = detect_columns(&spans);
    log::debug!("Detected {} columns", columns.len());

    if columns.len() <= 1 {
        return group_spans_into_lines_single_column(spans);
    }

    let mut column_spans: Vec<Vec<TextSpan>> = vec![Vec::new(); columns.len()];
    for span in spans {
        let col_idx = columns
            .iter()
            .position(|c| c.contains_span(&span))
            .unwrap_or(0);
        column_spans[col_idx].push(span);
    }

    // Left column first, then right column, each top to bottom.
    column_spans
        .into_iter()
        .flat_map(group_spans_into_lines_single_column)
        .collect()
}

/// Detect columns in a page based on vertical gap (gutter) detection.
///
/// Returns one column for ordinary pages and two when a clear gutter
/// separates well-populated halves.
fn detect_columns(spans: &[TextSpan]) -> Vec<Column> {
    let min_x = spans.iter().map(|s| s.x).fold(f32::MAX, f32::min);
    let max_x = spans.iter().map(|s| s.right()).fold(f32::MIN, f32::max);
    let page_width = max_x - min_x;

    let single = || {
        vec![Column {
            left: min_x - 10.0,
            right: max_x + 10.0,
            index: 0,
        }]
    };

    if page_width < 250.0 || !page_width.is_finite() || page_width > MAX_PAGE_EXTENT {
        return single();
    }

    // Count span coverage in 3pt vertical slices
    let slice_width = 3.0;
    let num_slices = ((page_width / slice_width) as usize) + 1;
    let mut slice_occupancy = vec![0usize; num_slices];

    for span in spans {
        let start_slice = ((span.x - min_x) / slice_width) as usize;
        let end_slice = ((span.right() - min_x) / slice_width) as usize;
        for slot in slice_occupancy
            .iter_mut()
            .take(end_slice.min(num_slices - 1) + 1)
            .skip(start_slice)
        {
            *slot += 1;
        }
    }

    // Largest empty run in the middle 70% of the page, preferring the center
    let search_start = num_slices * 15 / 100;
    let search_end = num_slices * 85 / 100;
    let page_center = num_slices / 2;

    let mut best: Option<(usize, usize)> = None;
    let mut best_center_dist = f32::MAX;
    let mut run_start = 0;
    let mut run_len = 0;

    let mut consider = |start: usize, len: usize, best: &mut Option<(usize, usize)>| {
        let width = len as f32 * slice_width;
        if width < 10.0 {
            return;
        }
        let center_dist = ((start + len / 2) as f32 - page_center as f32).abs();
        let best_width = best.map(|(_, l)| l as f32 * slice_width).unwrap_or(0.0);
        if width > best_width * 1.5 || (width >= best_width * 0.7 && center_dist < best_center_dist)
        {
            *best = Some((start, len));
            best_center_dist = center_dist;
        }
    };

    for (i, &occupancy) in slice_occupancy
        .iter()
        .enumerate()
        .take(search_end)
        .skip(search_start)
    {
        if occupancy == 0 {
            if run_len == 0 {
                run_start = i;
            }
            run_len += 1;
        } else {
            if run_len > 0 {
                consider(run_start, run_len, &mut best);
            }
            run_len = 0;
        }
    }
    if run_len > 0 {
        consider(run_start, run_len, &mut best);
    }

    let Some((gap_start, gap_len)) = best else {
        return single();
    };

    if (gap_len as f32 * slice_width) < 12.0 {
        log::debug!("Gap too small (< 12pt), treating as single column");
        return single();
    }

    let gutter = min_x + (gap_start as f32 + gap_len as f32 / 2.0) * slice_width;
    if gutter - min_x < 80.0 || max_x - gutter < 80.0 {
        log::debug!("Column too narrow, treating as single column");
        return single();
    }

    let left_spans = spans.iter().filter(|s| s.center_x() < gutter).count();
    let right_spans = spans.len() - left_spans;
    let min_spans = (spans.len() / 10).max(2);
    if left_spans < min_spans || right_spans < min_spans {
        log::debug!("Spans too imbalanced, treating as single column");
        return single();
    }

    // Lines that bridge the gutter would be split in half; keep them whole.
    let bridging = spans
        .iter()
        .filter(|s| s.x < gutter && s.right() > gutter)
        .count();
    if bridging > 0 {
        return single();
    }

    vec![
        Column {
            left: min_x - 10.0,
            right: gutter,
            index: 0,
        },
        Column {
            left: gutter,
            right: max_x + 10.0,
            index: 1,
        },
    ]
}

/// Y-based line grouping for a single column, top to bottom.
fn group_spans_into_lines_single_column(mut spans: Vec<TextSpan>) -> Vec<TextLine> {
    spans.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut lines: Vec<TextLine> = Vec::new();
    let mut current: Vec<TextSpan> = Vec::new();
    let mut current_y: Option<f32> = None;

    for span in spans {
        let y_tolerance = span.font_size * 0.3;
        match current_y {
            Some(y) if (span.y - y).abs() <= y_tolerance => current.push(span),
            _ => {
                if !current.is_empty() {
                    lines.push(TextLine::from_spans(std::mem::take(&mut current)));
                }
                current_y = Some(span.y);
                current.push(span);
            }
        }
    }

    if !current.is_empty() {
        lines.push(TextLine::from_spans(current));
    }

    lines
}

/// Check if character is from a script that doesn't use word spaces.
///
/// Chinese and Japanese don't use spaces between words, Korean does.
pub(crate) fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and extensions
    (0x4E00..=0x9FFF).contains(&code)
        || (0x3400..=0x4DBF).contains(&code)
        || (0x20000..=0x2EBEF).contains(&code)
        // CJK Compatibility Ideographs
        || (0xF900..=0xFAFF).contains(&code)
        // Hiragana, Katakana
        || (0x3040..=0x30FF).contains(&code)
        // Bopomofo
        || (0x3100..=0x312F).contains(&code)
        // CJK Symbols and Punctuation
        || (0x3000..=0x303F).contains(&code)
        // Fullwidth punctuation used in running Chinese text
        || matches!(c, '，' | '。' | '！' | '？' | '；' | '：' | '（' | '）' | '「' | '」')
}
