//! Integration tests for end-to-end conversion.

mod common;

use std::io::Cursor;

use chrono::{Datelike, Timelike};
use common::{text_pdf, PageBuilder, PdfBuilder};
use pdfsheet::parser::{resolve_overlaps, Candidate, TableSource};
use pdfsheet::render::{self, UTF8_BOM};
use pdfsheet::{
    convert, convert_file, convert_reader, inspect, ConversionState, ConvertOptions, Converter,
    Entry, Error, ExtractMode, PageSelection, Rect, ResultLayout, SanitizeOptions, Table,
    Unreadable, Warning,
};

const PARAGRAPH: &str = "本季銷售報告如下表所示各項商品數量與金額均已核對完畢並經主管確認無誤";

const GRID_XS: [f32; 5] = [70.0, 170.0, 270.0, 370.0, 470.0];
const GRID_YS: [f32; 4] = [600.0, 570.0, 540.0, 510.0];

/// A ruled 3x4 table with text in every cell.
fn table_page(page: PageBuilder) -> PageBuilder {
    let rows: [[&str; 4]; 3] = [
        ["品名", "數量", "單價", "金額"],
        ["蘋果", "3", "25", "75"],
        ["香蕉", "2", "10", "20"],
    ];
    let mut page = page.grid(&GRID_XS, &GRID_YS);
    for (r, row) in rows.iter().enumerate() {
        let y = 580.0 - 30.0 * r as f32;
        for (c, cell) in row.iter().enumerate() {
            page = page.text(80.0 + 100.0 * c as f32, y, cell);
        }
    }
    page
}

/// Page 1 has text only; page 2 has a paragraph above a 3x4 table.
fn report_pdf() -> Vec<u8> {
    PdfBuilder::new()
        .page(
            PageBuilder::new()
                .text(72.0, 720.0, "第一頁：年度摘要")
                .text(72.0, 700.0, "Summary of the year"),
        )
        .page(table_page(PageBuilder::new().text(72.0, 720.0, PARAGRAPH)))
        .build()
}

fn expected_rows() -> Vec<Vec<String>> {
    [
        ["品名", "數量", "單價", "金額"],
        ["蘋果", "3", "25", "75"],
        ["香蕉", "2", "10", "20"],
    ]
    .iter()
    .map(|row| row.iter().map(|c| c.to_string()).collect())
    .collect()
}

// ==================== Text mode ====================

#[test]
fn test_single_page_text_mode() {
    let data = text_pdf(&[&["第一行文字", "Second line"]]);
    let options = ConvertOptions::default();

    let result = convert(data.clone(), ExtractMode::Text, &options).unwrap();

    assert_eq!(result.entries.len(), 1);
    assert_eq!(
        result.entries[0],
        Entry::Text {
            page: 1,
            text: "第一行文字\nSecond line".to_string()
        }
    );
    assert!(result.warnings.is_empty());

    let again = convert(data, ExtractMode::Text, &options).unwrap();
    assert_eq!(result, again);
}

#[test]
fn test_compact_whitespace_joins_with_space() {
    let data = text_pdf(&[&["Total:   120", "第二行"]]);
    let options = ConvertOptions::new().with_preserve_formatting(false);

    let result = convert(data, ExtractMode::Text, &options).unwrap();

    assert_eq!(result.texts().next(), Some((1, "Total: 120 第二行")));
}

#[test]
fn test_merge_wrapped_lines() {
    let data = text_pdf(&[&["本公司成立於民國", "八十年，專營進出口。", "新段落"]]);
    let options = ConvertOptions::new().with_merge_wrapped_lines(true);

    let result = convert(data, ExtractMode::Text, &options).unwrap();

    assert_eq!(
        result.texts().next(),
        Some((1, "本公司成立於民國八十年，專營進出口。\n新段落"))
    );
}

#[test]
fn test_split_by_page_keeps_pages_apart() {
    let data = text_pdf(&[&["跨頁的句子前半"], &["後半部分。"]]);
    let options = ConvertOptions::new().with_merge_wrapped_lines(true);

    let result = convert(data, ExtractMode::Text, &options).unwrap();

    let texts: Vec<_> = result.texts().collect();
    assert_eq!(texts, vec![(1, "跨頁的句子前半"), (2, "後半部分。")]);
}

#[test]
fn test_merge_across_pages_when_not_split() {
    let data = text_pdf(&[&["跨頁的句子前半"], &["後半部分。"]]);
    let options = ConvertOptions::new()
        .with_merge_wrapped_lines(true)
        .with_split_by_page(false);

    let result = convert(data, ExtractMode::Text, &options).unwrap();

    let texts: Vec<_> = result.texts().collect();
    assert_eq!(texts, vec![(1, "跨頁的句子前半後半部分。"), (2, "")]);
}

#[test]
fn test_blank_pages_have_empty_entries() {
    let data = PdfBuilder::new()
        .page(PageBuilder::new())
        .page(PageBuilder::new().text(72.0, 720.0, "內容"))
        .page(PageBuilder::new())
        .build();

    let result = convert(data, ExtractMode::Combined, &ConvertOptions::default()).unwrap();

    let texts: Vec<_> = result.texts().collect();
    assert_eq!(texts, vec![(1, ""), (2, "內容"), (3, "")]);
    assert_eq!(result.table_count(), 0);
    assert!(result.warnings.is_empty());
}

#[test]
fn test_unmappable_characters_are_replaced() {
    let data = text_pdf(&[&["代號\u{E000}A"]]);
    let options = ConvertOptions::new().with_placeholder('□');

    let result = convert(data, ExtractMode::Text, &options).unwrap();

    assert_eq!(result.texts().next(), Some((1, "代號□A")));
    assert_eq!(
        result.warnings,
        vec![Warning::UnmappableCharacters { page: 1, count: 1 }]
    );
}

#[test]
fn test_broken_page_is_a_warning() {
    let data = PdfBuilder::new()
        .page(PageBuilder::new().text(72.0, 720.0, "正常頁面"))
        .page(PageBuilder::new().broken())
        .build();

    let result = convert(data, ExtractMode::Combined, &ConvertOptions::default()).unwrap();

    let texts: Vec<_> = result.texts().collect();
    assert_eq!(texts, vec![(1, "正常頁面"), (2, "")]);
    assert_eq!(result.warnings.len(), 1);
    assert!(matches!(
        result.warnings[0],
        Warning::PageExtraction { page: 2, .. }
    ));
}

// ==================== Tables ====================

#[test]
fn test_combined_mode_interleaves_page_tables() {
    let result = convert(report_pdf(), ExtractMode::Combined, &ConvertOptions::default()).unwrap();

    assert_eq!(result.page_count, 2);
    assert_eq!(result.entries.len(), 3);

    match &result.entries[0] {
        Entry::Text { page, text } => {
            assert_eq!(*page, 1);
            assert_eq!(text, "第一頁：年度摘要\nSummary of the year");
        }
        other => panic!("expected page 1 text, got {:?}", other),
    }
    match &result.entries[1] {
        Entry::Text { page, text } => {
            assert_eq!(*page, 2);
            assert_eq!(text.lines().next(), Some(PARAGRAPH));
        }
        other => panic!("expected page 2 text, got {:?}", other),
    }
    match &result.entries[2] {
        Entry::Table { page, table } => {
            assert_eq!(*page, 2);
            assert_eq!(table.row_count(), 3);
            assert_eq!(table.column_count(), 4);
            assert_eq!(table.rows, expected_rows());
            assert_eq!(table.header_rows, 1);
        }
        other => panic!("expected page 2 table, got {:?}", other),
    }
}

#[test]
fn test_detected_tables_are_rectangular() {
    let result = convert(report_pdf(), ExtractMode::Table, &ConvertOptions::default()).unwrap();

    assert!(result.table_count() > 0);
    for table in result.tables() {
        assert!(table.row_count() >= 1);
        assert!(table.is_rectangular());
    }
}

#[test]
fn test_table_mode_has_only_tables() {
    let result = convert(report_pdf(), ExtractMode::Table, &ConvertOptions::default()).unwrap();

    assert!(result.entries.iter().all(Entry::is_table));
    assert_eq!(result.table_count(), 1);
}

#[test]
fn test_whitespace_aligned_table_without_rulings() {
    let mut page = PageBuilder::new();
    let rows = [["項目", "金額", "備註"], ["租金", "12000", "每月"], ["水電", "1500", "含稅"]];
    for (r, row) in rows.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            page = page.text(72.0 + 120.0 * c as f32, 680.0 - 20.0 * r as f32, cell);
        }
    }
    let data = PdfBuilder::new().page(page).build();

    let result = convert(data, ExtractMode::Table, &ConvertOptions::default()).unwrap();

    assert_eq!(result.table_count(), 1);
    let table = result.tables().next().unwrap();
    assert_eq!(table.rows[0], vec!["項目", "金額", "備註"]);
    assert_eq!(table.rows[2], vec!["水電", "1500", "含稅"]);
}

#[test]
fn test_numbered_list_is_not_a_table() {
    let data = PdfBuilder::new()
        .page(
            PageBuilder::new()
                .text(72.0, 700.0, "一、")
                .text(100.0, 700.0, "營業收入增加")
                .text(72.0, 680.0, "二、")
                .text(100.0, 680.0, "營業成本下降")
                .text(72.0, 660.0, "三、")
                .text(100.0, 660.0, "淨利成長"),
        )
        .build();

    let result = convert(data, ExtractMode::Table, &ConvertOptions::default()).unwrap();

    assert_eq!(result.table_count(), 0);
}

#[test]
fn test_overlapping_candidates_keep_higher_fill() {
    fn candidate(filled: usize, bbox: Rect) -> Candidate {
        let rows = (0..2)
            .map(|r| {
                (0..5)
                    .map(|c| {
                        if r * 5 + c < filled {
                            "值".to_string()
                        } else {
                            String::new()
                        }
                    })
                    .collect()
            })
            .collect();
        Candidate::new(TableSource::Stream, Table::from_rows(1, rows), bbox)
    }

    let dense = candidate(9, Rect::new(100.0, 500.0, 400.0, 600.0));
    let sparse = candidate(4, Rect::new(150.0, 450.0, 450.0, 550.0));
    assert!((dense.fill_ratio() - 0.9).abs() < 1e-6);
    assert!((sparse.fill_ratio() - 0.4).abs() < 1e-6);

    let kept = resolve_overlaps(vec![sparse, dense]);

    assert_eq!(kept.len(), 1);
    assert!((kept[0].fill_ratio() - 0.9).abs() < 1e-6);
}

// ==================== Layout and options ====================

#[test]
fn test_sectioned_layout() {
    let data = PdfBuilder::new()
        .page(table_page(PageBuilder::new().text(72.0, 720.0, PARAGRAPH)))
        .page(PageBuilder::new().text(72.0, 720.0, "附註說明"))
        .build();

    let interleaved = convert(data.clone(), ExtractMode::Combined, &ConvertOptions::default())
        .unwrap();
    let kinds: Vec<_> = interleaved
        .entries
        .iter()
        .map(|e| (e.page(), e.is_table()))
        .collect();
    assert_eq!(kinds, vec![(1, false), (1, true), (2, false)]);

    let options = ConvertOptions::new().with_layout(ResultLayout::Sectioned);
    let sectioned = convert(data, ExtractMode::Combined, &options).unwrap();
    let kinds: Vec<_> = sectioned
        .entries
        .iter()
        .map(|e| (e.page(), e.is_table()))
        .collect();
    assert_eq!(kinds, vec![(1, false), (2, false), (1, true)]);
}

#[test]
fn test_page_selection() {
    let data = text_pdf(&[&["甲"], &["乙"], &["丙"]]);
    let options = ConvertOptions::new().with_pages(PageSelection::parse("2-3").unwrap());

    let result = convert(data, ExtractMode::Text, &options).unwrap();

    let texts: Vec<_> = result.texts().collect();
    assert_eq!(texts, vec![(2, "乙"), (3, "丙")]);
    assert_eq!(result.page_count, 3);
}

#[test]
fn test_sanitize_option() {
    let data = text_pdf(&[&["Contact: help@example.com", "Phone 555-123-4567"]]);
    let options = ConvertOptions::new().with_sanitize(SanitizeOptions::default());
    let mut converter = Converter::new(options);

    let result = converter.convert(data, ExtractMode::Text).unwrap();

    assert_eq!(
        result.texts().next(),
        Some((1, "Contact: [EMAIL_REDACTED]\nPhone [PHONE_REDACTED]"))
    );
    let summary = converter.sanitize_summary().unwrap();
    assert_eq!(summary.emails, 1);
    assert_eq!(summary.phones, 1);
}

// ==================== Failures ====================

#[test]
fn test_non_pdf_bytes_are_unreadable() {
    let mut converter = Converter::default();

    let result = converter.convert(b"PK\x03\x04 not a pdf".to_vec(), ExtractMode::Combined);

    assert!(matches!(
        result,
        Err(Error::UnreadablePdf(Unreadable::UnknownFormat))
    ));
    assert_eq!(converter.state(), ConversionState::Failed);
}

#[test]
fn test_truncated_pdf_is_unreadable() {
    let mut data = report_pdf();
    data.truncate(data.len() / 2);

    let result = convert(data, ExtractMode::Text, &ConvertOptions::default());

    assert!(result.unwrap_err().is_unreadable_pdf());
}

#[test]
fn test_file_too_large() {
    let data = report_pdf();
    let options = ConvertOptions::new().with_max_file_size(data.len() - 1);

    let result = convert(data, ExtractMode::Text, &options);

    assert!(matches!(result, Err(Error::FileTooLarge { .. })));
}

#[test]
fn test_converter_reaches_assembled() {
    let mut converter = Converter::default();
    converter
        .convert(report_pdf(), ExtractMode::Combined)
        .unwrap();
    assert_eq!(converter.state(), ConversionState::Assembled);
}

// ==================== Input sources ====================

#[test]
fn test_convert_file_and_reader() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.pdf");
    std::fs::write(&path, report_pdf()).unwrap();

    let options = ConvertOptions::default();
    let from_file = convert_file(&path, ExtractMode::Combined, &options).unwrap();
    let from_reader =
        convert_reader(Cursor::new(report_pdf()), ExtractMode::Combined, &options).unwrap();

    assert_eq!(from_file, from_reader);
    assert_eq!(from_file.table_count(), 1);
}

#[test]
fn test_convert_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = convert_file(
        dir.path().join("missing.pdf"),
        ExtractMode::Text,
        &ConvertOptions::default(),
    );
    assert!(matches!(result, Err(Error::Io(_))));
}

// ==================== Inspection ====================

#[test]
fn test_inspect() {
    let data = PdfBuilder::new()
        .title("季度報告")
        .author("Finance Team")
        .creation_date("D:20240115103000")
        .page(PageBuilder::new().text(72.0, 720.0, "摘要"))
        .page(table_page(PageBuilder::new()))
        .page(PageBuilder::new())
        .build();

    let info = inspect(data).unwrap();

    assert_eq!(info.page_count(), 3);
    assert_eq!(info.metadata.pdf_version, "1.5");
    assert!(!info.metadata.encrypted);
    assert_eq!(info.metadata.title.as_deref(), Some("季度報告"));
    assert_eq!(info.metadata.author.as_deref(), Some("Finance Team"));
    let created = info.metadata.created.unwrap();
    assert_eq!((created.year(), created.month(), created.day()), (2024, 1, 15));
    assert_eq!((created.hour(), created.minute()), (10, 30));

    assert_eq!(info.pages_with_text, vec![1, 2]);
    assert_eq!(info.pages_with_tables, vec![2]);
    assert_eq!(info.table_count, 1);
    assert!(info.total_characters >= 2);
}

#[test]
fn test_inspect_counts_every_character() {
    let data = PdfBuilder::new()
        .page(PageBuilder::new().text(72.0, 720.0, "Net profit"))
        .page(PageBuilder::new())
        .build();

    let info = inspect(data).unwrap();

    assert_eq!(info.pages_with_text, vec![1]);
    assert_eq!(info.total_characters, "Net profit".chars().count());
}

// ==================== Rendering ====================

#[test]
fn test_workbook_csv_output() {
    let result = convert(report_pdf(), ExtractMode::Combined, &ConvertOptions::default()).unwrap();
    let workbook = render::to_workbook(&result, "report.pdf");

    assert_eq!(
        workbook.sheet_names(),
        vec!["Extracted Text", "Table_1_Page_2"]
    );

    let dir = tempfile::tempdir().unwrap();
    let written = workbook.write_csv_dir(dir.path(), "report").unwrap();

    assert_eq!(written.len(), 2);
    assert!(written[0].ends_with("report_Extracted_Text.csv"));
    let table_csv = std::fs::read(&written[1]).unwrap();
    assert!(table_csv.starts_with(UTF8_BOM));
    let text = String::from_utf8(table_csv[UTF8_BOM.len()..].to_vec()).unwrap();
    assert!(text.contains("品名,數量,單價,金額\n"));
    assert!(text.contains("香蕉,2,10,20\n"));
}

#[test]
fn test_json_output() {
    let result = convert(report_pdf(), ExtractMode::Combined, &ConvertOptions::default()).unwrap();

    let json = render::to_json(&result, render::JsonFormat::Compact).unwrap();

    assert!(json.contains("\"type\":\"table\""));
    assert!(json.contains("金額"));
}
