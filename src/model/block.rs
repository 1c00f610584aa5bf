//! Text block type.

use serde::{Deserialize, Serialize};

/// One visually distinct line of text with its position on a page.
///
/// Blocks are the unit the merger works on; they are discarded once
/// paragraphs have been assembled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Page the block was found on (1-indexed)
    pub page: u32,

    /// Text content, normalized
    pub text: String,

    /// Left edge
    pub x: f32,

    /// Baseline position (PDF coordinates, larger is higher on the page)
    pub y: f32,

    /// Dominant font size in points
    pub font_size: f32,

    /// Number of characters replaced by the placeholder
    pub unmapped: usize,
}

impl TextBlock {
    /// Create a block with default geometry.
    pub fn new(page: u32, text: impl Into<String>) -> Self {
        Self {
            page,
            text: text.into(),
            x: 0.0,
            y: 0.0,
            font_size: 12.0,
            unmapped: 0,
        }
    }

    /// Set the position and return self.
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Set the font size and return self.
    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    /// Check if the block has no visible text.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
