//! Rendering of extraction results into output formats.
//!
//! Nothing in the extraction pipeline depends on this module.

mod csv;
mod json;
mod sheet;
mod text;

pub use self::csv::{to_csv, write_csv, write_csv_file, UTF8_BOM};
pub use json::{to_json, to_json_value, JsonFormat};
pub use sheet::{sheet_name, to_workbook, Sheet, Workbook, SUMMARY_SHEET, TEXT_SHEET};
pub use text::to_text;
