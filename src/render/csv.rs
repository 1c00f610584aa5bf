//! CSV output for sheets.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Error, Result};

use super::sheet::Sheet;

/// UTF-8 byte-order mark, so spreadsheet applications detect the encoding.
pub const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Write a sheet as BOM-prefixed UTF-8 CSV.
pub fn write_csv<W: Write>(sheet: &Sheet, mut writer: W) -> Result<()> {
    writer.write_all(UTF8_BOM)?;

    let mut csv_writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(writer);
    for row in &sheet.rows {
        if row.is_empty() {
            csv_writer.write_record([""])?;
        } else {
            csv_writer.write_record(row)?;
        }
    }
    csv_writer.flush()?;
    Ok(())
}

/// Render a sheet to CSV bytes.
pub fn to_csv(sheet: &Sheet) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_csv(sheet, &mut buffer)?;
    Ok(buffer)
}

/// Write a sheet to a CSV file.
pub fn write_csv_file(sheet: &Sheet, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_csv(sheet, &mut writer)?;
    writer
        .flush()
        .map_err(|e| Error::Render(format!("Failed to write {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_has_bom_and_quotes() {
        let mut sheet = Sheet::new("Table_1_Page_1");
        sheet.rows.push(vec!["名稱".to_string(), "說明".to_string()]);
        sheet.rows.push(vec!["甲".to_string(), "含,逗號".to_string()]);
        sheet.push_blank();
        sheet.push_line("備註");

        let bytes = to_csv(&sheet).unwrap();

        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        assert_eq!(text, "名稱,說明\n甲,\"含,逗號\"\n\"\"\n備註\n");
    }
}
