//! Spreadsheet-shaped view of an extraction result.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{ExtractionResult, Table};

use super::csv::write_csv_file;

/// Name of the sheet holding all extracted text.
pub const TEXT_SHEET: &str = "Extracted Text";

/// Name of the sheet produced when nothing was extracted.
pub const SUMMARY_SHEET: &str = "Summary";

/// Spreadsheet applications reject longer sheet names.
const MAX_SHEET_NAME: usize = 31;

/// A named grid of cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    /// Sheet name, already valid for spreadsheet applications
    pub name: String,
    /// Rows of cells; rows may differ in length
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    /// Create an empty sheet with a sanitized name.
    pub fn new(name: &str) -> Self {
        Self {
            name: sheet_name(name),
            rows: Vec::new(),
        }
    }

    /// Append a single-cell row.
    pub fn push_line(&mut self, text: impl Into<String>) {
        self.rows.push(vec![text.into()]);
    }

    /// Append an empty row.
    pub fn push_blank(&mut self) {
        self.rows.push(Vec::new());
    }

    /// Widest row length.
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

/// An ordered collection of sheets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workbook {
    /// Sheets in display order
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    /// Look up a sheet by name.
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Names of all sheets in order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Write every sheet as `{stem}_{sheet}.csv` into `dir`.
    ///
    /// Returns the written paths in sheet order.
    pub fn write_csv_dir(&self, dir: &Path, stem: &str) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(self.sheets.len());
        for sheet in &self.sheets {
            let file_name = format!("{}_{}.csv", stem, sheet.name.replace(' ', "_"));
            let path = dir.join(file_name);
            write_csv_file(sheet, &path)?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Strip characters spreadsheet applications forbid and truncate.
pub fn sheet_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '\\' | '/' | '*' | '?' | ':' | '[' | ']'))
        .take(MAX_SHEET_NAME)
        .collect()
}

/// Arrange a result into sheets.
///
/// Text goes to one sheet with a `Page N:` row before each page's lines.
/// Every table gets its own sheet. A result without content yields a
/// single summary sheet.
pub fn to_workbook(result: &ExtractionResult, source_name: &str) -> Workbook {
    let mut workbook = Workbook::default();

    if result.is_empty() {
        workbook
            .sheets
            .push(summary_sheet(source_name, "No data extracted"));
        return workbook;
    }

    if result.texts().any(|(_, t)| !t.trim().is_empty()) {
        workbook.sheets.push(text_sheet(result, source_name));
    }

    for (i, table) in result.tables().enumerate() {
        workbook
            .sheets
            .push(table_sheet(i + 1, table, source_name));
    }

    workbook
}

fn text_sheet(result: &ExtractionResult, source_name: &str) -> Sheet {
    let mut sheet = Sheet::new(TEXT_SHEET);
    sheet.push_line(format!("Text Extracted from: {}", source_name));
    sheet.push_blank();

    for (page, text) in result.texts() {
        sheet.push_line(format!("Page {}:", page));
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            sheet.push_line(line);
        }
        sheet.push_blank();
    }

    sheet
}

fn table_sheet(index: usize, table: &Table, source_name: &str) -> Sheet {
    let mut sheet = Sheet::new(&format!("Table_{}_Page_{}", index, table.page));
    sheet.push_line(format!("Table {} from: {}", index, source_name));
    sheet.push_line(format!("Source: Page {}", table.page));
    sheet.push_blank();
    sheet.rows.extend(table.rows.iter().cloned());
    sheet
}

fn summary_sheet(source_name: &str, status: &str) -> Sheet {
    let mut sheet = Sheet::new(SUMMARY_SHEET);
    sheet.push_line("PDF to Spreadsheet Conversion Summary");
    sheet.push_blank();
    sheet.push_line(format!("Original File: {}", source_name));
    sheet.push_line(format!("Status: {}", status));
    sheet
}
