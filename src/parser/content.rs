//! Content stream interpretation.
//!
//! Walks the operators of a page's content stream, tracking the graphics
//! and text state, and records positioned text runs and axis-aligned path
//! segments.

use lopdf::content::Operation;
use lopdf::Object;

use super::backend::{estimate_width, Ruling, TextSpan};
use super::layout::is_spaceless_script_char;

/// TJ adjustments larger than this (thousandths of an em) read as a word gap.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Rectangles thinner than this are drawn lines, not boxes.
const THIN_RECT: f32 = 2.0;

/// Resolves page font resources.
pub(crate) trait FontResolver {
    /// Human-readable font name for a resource key.
    fn base_font(&self, resource: &[u8]) -> String;

    /// Decode a string operand shown with the given font resource.
    fn decode(&self, resource: &[u8], bytes: &[u8]) -> String;
}

/// Everything extracted from one content stream.
#[derive(Debug, Clone, Default)]
pub(crate) struct PageContent {
    pub spans: Vec<TextSpan>,
    pub rulings: Vec<Ruling>,
}

/// Affine transformation matrix `[a b c d e f]`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn from_operands(operands: &[Object]) -> Option<Self> {
        if operands.len() < 6 {
            return None;
        }
        let n: Vec<f32> = operands[..6].iter().filter_map(get_number).collect();
        if n.len() < 6 {
            return None;
        }
        Some(Matrix {
            a: n[0],
            b: n[1],
            c: n[2],
            d: n[3],
            e: n[4],
            f: n[5],
        })
    }

    fn translation(tx: f32, ty: f32) -> Self {
        Matrix {
            e: tx,
            f: ty,
            ..Self::IDENTITY
        }
    }

    /// `self × other`: apply `self` first, then `other`.
    fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Length of the transformed unit vertical vector.
    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }

    /// Length of the transformed unit horizontal vector.
    fn horizontal_scale(&self) -> f32 {
        (self.a * self.a + self.b * self.b).sqrt()
    }
}

/// Text state inside a BT/ET block.
#[derive(Debug, Clone)]
struct TextState {
    font_resource: Vec<u8>,
    font_name: String,
    font_size: f32,
    leading: f32,
    matrix: Matrix,
    line_matrix: Matrix,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font_resource: Vec::new(),
            font_name: String::new(),
            font_size: 12.0,
            leading: 0.0,
            matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
        }
    }
}

impl TextState {
    fn move_line(&mut self, tx: f32, ty: f32) {
        self.line_matrix = Matrix::translation(tx, ty).then(&self.line_matrix);
        self.matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        // Without TL, fall back to single spacing at the current size.
        let leading = if self.leading != 0.0 {
            self.leading
        } else {
            self.font_size
        };
        self.move_line(0.0, -leading);
    }

    fn advance(&mut self, tx: f32) {
        self.matrix = Matrix::translation(tx, 0.0).then(&self.matrix);
    }
}

/// Path under construction, in device space.
#[derive(Debug, Default)]
struct PathBuilder {
    segments: Vec<(f32, f32, f32, f32)>,
    current: Option<(f32, f32)>,
    subpath_start: Option<(f32, f32)>,
}

impl PathBuilder {
    fn move_to(&mut self, p: (f32, f32)) {
        self.current = Some(p);
        self.subpath_start = Some(p);
    }

    fn line_to(&mut self, p: (f32, f32)) {
        if let Some((x, y)) = self.current {
            self.segments.push((x, y, p.0, p.1));
        }
        self.current = Some(p);
    }

    fn close(&mut self) {
        if let (Some(current), Some(start)) = (self.current, self.subpath_start) {
            if current != start {
                self.segments.push((current.0, current.1, start.0, start.1));
            }
            self.current = Some(start);
        }
    }

    fn take_rulings(&mut self) -> Vec<Ruling> {
        self.current = None;
        self.subpath_start = None;
        std::mem::take(&mut self.segments)
            .into_iter()
            .filter_map(|(x1, y1, x2, y2)| Ruling::from_segment(x1, y1, x2, y2))
            .collect()
    }

    fn clear(&mut self) {
        self.segments.clear();
        self.current = None;
        self.subpath_start = None;
    }
}

/// Interpret a decoded content stream.
pub(crate) fn interpret(operations: &[Operation], fonts: &dyn FontResolver) -> PageContent {
    let mut out = PageContent::default();
    let mut ctm = Matrix::IDENTITY;
    let mut ctm_stack: Vec<Matrix> = Vec::new();
    let mut text = TextState::default();
    let mut path = PathBuilder::default();
    let mut in_text_block = false;

    for op in operations {
        let operands = &op.operands;
        match op.operator.as_str() {
            "q" => ctm_stack.push(ctm),
            "Q" => {
                if let Some(saved) = ctm_stack.pop() {
                    ctm = saved;
                } else {
                    log::debug!("Unbalanced Q operator");
                }
            }
            "cm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    ctm = m.then(&ctm);
                }
            }
            "BT" => {
                in_text_block = true;
                text.matrix = Matrix::IDENTITY;
                text.line_matrix = Matrix::IDENTITY;
            }
            "ET" => in_text_block = false,
            "Tf" => {
                if operands.len() >= 2 {
                    if let Object::Name(name) = &operands[0] {
                        text.font_name = fonts.base_font(name);
                        text.font_resource = name.clone();
                    }
                    text.font_size = get_number(&operands[1]).unwrap_or(12.0);
                }
            }
            "TL" => {
                if let Some(leading) = operands.first().and_then(get_number) {
                    text.leading = leading;
                }
            }
            "Td" | "TD" => {
                if operands.len() >= 2 {
                    let tx = get_number(&operands[0]).unwrap_or(0.0);
                    let ty = get_number(&operands[1]).unwrap_or(0.0);
                    if op.operator == "TD" {
                        text.leading = -ty;
                    }
                    text.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    text.matrix = m;
                    text.line_matrix = m;
                }
            }
            "T*" => text.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    let decoded = fonts.decode(&text.font_resource, bytes);
                    show_text(&mut out, &mut text, &ctm, decoded, 0.0, in_text_block);
                }
            }
            "'" | "\"" => {
                text.next_line();
                let idx = if op.operator == "\"" { 2 } else { 0 };
                if let Some(Object::String(bytes, _)) = operands.get(idx) {
                    let decoded = fonts.decode(&text.font_resource, bytes);
                    show_text(&mut out, &mut text, &ctm, decoded, 0.0, in_text_block);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    let (decoded, adjustment) = decode_tj_array(items, fonts, &text.font_resource);
                    show_text(&mut out, &mut text, &ctm, decoded, adjustment, in_text_block);
                }
            }
            "m" => {
                if let Some((x, y)) = point(operands, 0) {
                    path.move_to(ctm.apply(x, y));
                }
            }
            "l" => {
                if let Some((x, y)) = point(operands, 0) {
                    path.line_to(ctm.apply(x, y));
                }
            }
            "c" => {
                if let Some((x, y)) = point(operands, 4) {
                    path.current = Some(ctm.apply(x, y));
                }
            }
            "v" | "y" => {
                if let Some((x, y)) = point(operands, 2) {
                    path.current = Some(ctm.apply(x, y));
                }
            }
            "h" => path.close(),
            "re" => {
                let n: Vec<f32> = operands.iter().filter_map(get_number).collect();
                if n.len() >= 4 {
                    add_rectangle(&mut path, &ctm, n[0], n[1], n[2], n[3]);
                }
            }
            "S" | "f" | "F" | "f*" | "B" | "B*" => out.rulings.extend(path.take_rulings()),
            "s" | "b" | "b*" => {
                path.close();
                out.rulings.extend(path.take_rulings());
            }
            "n" => path.clear(),
            _ => {}
        }
    }

    out
}

/// Append a rectangle to the path; hairline rectangles become a single line.
fn add_rectangle(path: &mut PathBuilder, ctm: &Matrix, x: f32, y: f32, w: f32, h: f32) {
    if w.abs() <= THIN_RECT && h.abs() > THIN_RECT {
        let cx = x + w / 2.0;
        path.move_to(ctm.apply(cx, y));
        path.line_to(ctm.apply(cx, y + h));
    } else if h.abs() <= THIN_RECT && w.abs() > THIN_RECT {
        let cy = y + h / 2.0;
        path.move_to(ctm.apply(x, cy));
        path.line_to(ctm.apply(x + w, cy));
    } else {
        path.move_to(ctm.apply(x, y));
        path.line_to(ctm.apply(x + w, y));
        path.line_to(ctm.apply(x + w, y + h));
        path.line_to(ctm.apply(x, y + h));
        path.close();
    }
}

/// Decode a TJ array, returning the text and the total positioning
/// adjustment in text space units (negative adjustments move right).
fn decode_tj_array(items: &[Object], fonts: &dyn FontResolver, font: &[u8]) -> (String, f32) {
    let mut combined = String::new();
    let mut adjustment = 0.0;

    for item in items {
        match item {
            Object::String(bytes, _) => combined.push_str(&fonts.decode(font, bytes)),
            Object::Integer(_) | Object::Real(_) => {
                let n = get_number(item).unwrap_or(0.0);
                adjustment += -n;
                let ends_with_space = combined.ends_with(' ') || combined.ends_with('\u{00A0}');
                if -n > TJ_SPACE_THRESHOLD && !ends_with_space {
                    // CJK text does not use word spaces.
                    if let Some(c) = combined.chars().last() {
                        if !is_spaceless_script_char(c) {
                            combined.push(' ');
                        }
                    }
                }
            }
            _ => {}
        }
    }

    (combined, adjustment)
}

fn show_text(
    out: &mut PageContent,
    text: &mut TextState,
    ctm: &Matrix,
    decoded: String,
    adjustment: f32,
    in_text_block: bool,
) {
    let advance = estimate_width(&decoded, text.font_size) + adjustment / 1000.0 * text.font_size;

    if in_text_block && !decoded.trim().is_empty() {
        let rendering = text.matrix.then(ctm);
        let (x, y) = rendering.apply(0.0, 0.0);
        let font_size = text.font_size * rendering.vertical_scale();
        let mut span = TextSpan::new(decoded, x, y, font_size).with_font(text.font_name.clone());
        span.width = advance.max(0.0) * rendering.horizontal_scale();
        out.spans.push(span);
    }

    text.advance(advance);
}

fn point(operands: &[Object], offset: usize) -> Option<(f32, f32)> {
    let x = get_number(operands.get(offset)?)?;
    let y = get_number(operands.get(offset + 1)?)?;
    Some((x, y))
}

/// Helper to extract number from PDF object.
fn get_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}
