//! Table types.

use serde::{Deserialize, Serialize};

/// An axis-aligned rectangle in PDF user space (origin bottom-left).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub left: f32,
    /// Bottom edge
    pub bottom: f32,
    /// Right edge
    pub right: f32,
    /// Top edge
    pub top: f32,
}

impl Rect {
    /// Create a rectangle from its edges, normalizing swapped coordinates.
    pub fn new(left: f32, bottom: f32, right: f32, top: f32) -> Self {
        Self {
            left: left.min(right),
            bottom: bottom.min(top),
            right: left.max(right),
            top: bottom.max(top),
        }
    }

    /// Width of the rectangle.
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Height of the rectangle.
    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    /// Check if a point lies inside the rectangle (edges included).
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left && x <= self.right && y >= self.bottom && y <= self.top
    }

    /// Check if two rectangles share a region of positive area.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left < other.right
            && other.left < self.right
            && self.bottom < other.top
            && other.bottom < self.top
    }
}

/// A rectangular grid of cell strings detected on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Page the table was found on (1-indexed)
    pub page: u32,

    /// Rows of cell text; empty cells are empty strings
    pub rows: Vec<Vec<String>>,

    /// Number of header rows (0 = no header)
    pub header_rows: u8,

    /// Region of the page the table covers
    pub bbox: Option<Rect>,
}

impl Table {
    /// Create a new empty table.
    pub fn new(page: u32) -> Self {
        Self {
            page,
            rows: Vec::new(),
            header_rows: 0,
            bbox: None,
        }
    }

    /// Create a table from rows, padding short rows so the grid is rectangular.
    ///
    /// The first row is treated as a header when there is more than one row.
    pub fn from_rows(page: u32, rows: Vec<Vec<String>>) -> Self {
        let mut table = Self {
            page,
            header_rows: if rows.len() > 1 { 1 } else { 0 },
            rows,
            bbox: None,
        };
        table.pad_rows();
        table
    }

    /// Set the bounding box and return self.
    pub fn with_bbox(mut self, bbox: Rect) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns (widest row).
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(|r| r.len()).max().unwrap_or(0)
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Total number of cells in the grid.
    pub fn cell_count(&self) -> usize {
        self.row_count() * self.column_count()
    }

    /// Number of cells holding non-blank text.
    pub fn filled_cell_count(&self) -> usize {
        self.rows
            .iter()
            .flatten()
            .filter(|c| !c.trim().is_empty())
            .count()
    }

    /// Fraction of non-empty cells, in `0.0..=1.0`.
    pub fn fill_ratio(&self) -> f32 {
        let cells = self.cell_count();
        if cells == 0 {
            return 0.0;
        }
        self.filled_cell_count() as f32 / cells as f32
    }

    /// Pad every row with empty strings up to the widest row.
    pub fn pad_rows(&mut self) {
        let width = self.column_count();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
    }

    /// Check that every row has the same number of cells.
    pub fn is_rectangular(&self) -> bool {
        let width = self.column_count();
        self.rows.iter().all(|r| r.len() == width)
    }

    /// Remove rows whose cells are all blank.
    ///
    /// Returns the number of rows removed.
    pub fn remove_empty_rows(&mut self) -> usize {
        let before = self.rows.len();
        let mut removed_headers = 0u8;
        let header_rows = self.header_rows as usize;
        let mut index = 0usize;
        self.rows.retain(|row| {
            let keep = row.iter().any(|c| !c.trim().is_empty());
            if !keep && index < header_rows {
                removed_headers += 1;
            }
            index += 1;
            keep
        });
        self.header_rows -= removed_headers;
        if self.rows.len() <= 1 {
            self.header_rows = 0;
        }
        before - self.rows.len()
    }

    /// Get header rows.
    pub fn header(&self) -> &[Vec<String>] {
        &self.rows[..(self.header_rows as usize).min(self.rows.len())]
    }

    /// Get body rows (non-header).
    pub fn body(&self) -> &[Vec<String>] {
        &self.rows[(self.header_rows as usize).min(self.rows.len())..]
    }

    /// Get plain text representation (tab-separated cells, one row per line).
    pub fn plain_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
