//! Builders for small in-memory PDF documents.

#![allow(dead_code)]

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};

/// One drawing instruction on a test page.
enum Item {
    Text { x: f32, y: f32, size: f32, text: String },
    Line { x1: f32, y1: f32, x2: f32, y2: f32 },
}

/// Content of one page.
#[derive(Default)]
pub struct PageBuilder {
    items: Vec<Item>,
    broken: bool,
}

impl PageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `text` at baseline `(x, y)` in 12pt.
    pub fn text(self, x: f32, y: f32, text: &str) -> Self {
        self.sized_text(x, y, 12.0, text)
    }

    pub fn sized_text(mut self, x: f32, y: f32, size: f32, text: &str) -> Self {
        self.items.push(Item::Text {
            x,
            y,
            size,
            text: text.to_string(),
        });
        self
    }

    /// Stroke a line segment.
    pub fn line(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.items.push(Item::Line { x1, y1, x2, y2 });
        self
    }

    /// Stroke a ruled grid with the given column and row boundaries.
    pub fn grid(mut self, xs: &[f32], ys: &[f32]) -> Self {
        let (left, right) = (xs[0], xs[xs.len() - 1]);
        let (top, bottom) = (ys[0], ys[ys.len() - 1]);
        for &y in ys {
            self = self.line(left, y, right, y);
        }
        for &x in xs {
            self = self.line(x, top, x, bottom);
        }
        self
    }

    /// Give the page a `Contents` entry that is not a stream.
    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    fn operations(&self) -> Vec<Operation> {
        let mut ops = Vec::new();
        for item in &self.items {
            match item {
                Item::Text { x, y, size, text } => {
                    ops.push(Operation::new("BT", vec![]));
                    ops.push(Operation::new("Tf", vec!["F1".into(), (*size).into()]));
                    ops.push(Operation::new("Td", vec![(*x).into(), (*y).into()]));
                    ops.push(Operation::new("Tj", vec![pdf_string(text)]));
                    ops.push(Operation::new("ET", vec![]));
                }
                Item::Line { x1, y1, x2, y2 } => {
                    ops.push(Operation::new("m", vec![(*x1).into(), (*y1).into()]));
                    ops.push(Operation::new("l", vec![(*x2).into(), (*y2).into()]));
                    ops.push(Operation::new("S", vec![]));
                }
            }
        }
        ops
    }
}

/// ASCII as a literal string, anything else as BOM-prefixed UTF-16BE.
fn pdf_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::String(text.as_bytes().to_vec(), StringFormat::Literal);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// A whole document.
#[derive(Default)]
pub struct PdfBuilder {
    pages: Vec<PageBuilder>,
    title: Option<String>,
    author: Option<String>,
    creation_date: Option<String>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: PageBuilder) -> Self {
        self.pages.push(page);
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn author(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }

    pub fn creation_date(mut self, date: &str) -> Self {
        self.creation_date = Some(date.to_string());
        self
    }

    /// Serialize the document.
    pub fn build(self) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for page in &self.pages {
            let page_id = add_page(&mut doc, page, pages_id, resources_id);
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut info = lopdf::Dictionary::new();
        if let Some(title) = &self.title {
            info.set("Title", info_string(title));
        }
        if let Some(author) = &self.author {
            info.set("Author", info_string(author));
        }
        if let Some(date) = &self.creation_date {
            info.set("CreationDate", Object::string_literal(date.as_str()));
        }
        if !info.is_empty() {
            let info_id = doc.add_object(info);
            doc.trailer.set("Info", info_id);
        }

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }
}

fn add_page(
    doc: &mut Document,
    page: &PageBuilder,
    pages_id: ObjectId,
    resources_id: ObjectId,
) -> ObjectId {
    if page.broken {
        return doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => resources_id,
            "Contents" => 42,
        });
    }

    let content = Content {
        operations: page.operations(),
    };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Resources" => resources_id,
        "Contents" => content_id,
    })
}

/// Info-dictionary strings: ASCII literal, otherwise UTF-16BE with BOM.
fn info_string(text: &str) -> Object {
    pdf_string(text)
}

/// Build a PDF whose pages contain the given lines at x=72, 20pt apart.
pub fn text_pdf(pages: &[&[&str]]) -> Vec<u8> {
    let mut builder = PdfBuilder::new();
    for lines in pages {
        let mut page = PageBuilder::new();
        for (i, line) in lines.iter().enumerate() {
            page = page.text(72.0, 720.0 - 20.0 * i as f32, line);
        }
        builder = builder.page(page);
    }
    builder.build()
}
