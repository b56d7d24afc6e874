//! Content stream interpretation: positions, sizes and text of show operators

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId};
use std::collections::HashMap;

use super::fonts::{FontInfo, Glyph};
use super::geometry::Matrix;
use super::number;
use crate::error::Result;

/// TJ displacement (in em) that reads as a word break
const TJ_SPACE_THRESHOLD: f32 = 0.2;

/// Text produced by one show operator, in PDF user space
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TextRun {
    /// Index of the operator in the decoded page content
    pub op_index: usize,
    pub x: f32,
    pub baseline: f32,
    pub width: f32,
    /// Effective rendered size
    pub font_size: f32,
    pub text: String,
    /// TJ number that advances the text matrix exactly like the original operator
    pub advance_adjustment: f32,
}

/// Decoded page content with the text runs found in it
#[derive(Debug, Clone)]
pub(crate) struct PageContent {
    pub operations: Vec<Operation>,
    pub runs: Vec<TextRun>,
}

#[derive(Debug, Clone)]
struct TextState {
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scale: f32,
    leading: f32,
    rise: f32,
    font: Option<Vec<u8>>,
    font_size: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
            font: None,
            font_size: 0.0,
        }
    }
}

/// Font resources of a page keyed by resource name
pub(crate) fn page_fonts(doc: &Document, page_id: ObjectId) -> HashMap<Vec<u8>, FontInfo> {
    match doc.get_page_fonts(page_id) {
        Ok(fonts) => fonts
            .into_iter()
            .map(|(name, dict)| (name, FontInfo::from_dict(doc, dict)))
            .collect(),
        Err(e) => {
            tracing::warn!("Could not collect fonts of page {:?}: {}", page_id, e);
            HashMap::new()
        }
    }
}

/// Decode a page's content streams and collect its text runs
pub(crate) fn interpret_page(doc: &Document, page_id: ObjectId) -> Result<PageContent> {
    let data = doc.get_page_content(page_id)?;
    let content = Content::decode(&data)?;
    let fonts = page_fonts(doc, page_id);
    let runs = Interpreter::new(&fonts).run(&content.operations);

    Ok(PageContent {
        operations: content.operations,
        runs,
    })
}

struct Interpreter<'a> {
    fonts: &'a HashMap<Vec<u8>, FontInfo>,
    fallback: FontInfo,
    ctm: Matrix,
    state: TextState,
    stack: Vec<(Matrix, TextState)>,
    tm: Matrix,
    tlm: Matrix,
}

impl<'a> Interpreter<'a> {
    fn new(fonts: &'a HashMap<Vec<u8>, FontInfo>) -> Self {
        Self {
            fonts,
            fallback: FontInfo::default(),
            ctm: Matrix::IDENTITY,
            state: TextState::default(),
            stack: Vec::new(),
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
        }
    }

    fn run(mut self, operations: &[Operation]) -> Vec<TextRun> {
        let mut runs = Vec::new();

        for (index, op) in operations.iter().enumerate() {
            let operands = &op.operands;
            let num = |i: usize| operands.get(i).and_then(number);

            match op.operator.as_str() {
                "q" => self.stack.push((self.ctm, self.state.clone())),
                "Q" => {
                    if let Some((ctm, state)) = self.stack.pop() {
                        self.ctm = ctm;
                        self.state = state;
                    }
                }
                "cm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        self.ctm = m.multiply(&self.ctm);
                    }
                }
                "BT" => {
                    self.tm = Matrix::IDENTITY;
                    self.tlm = Matrix::IDENTITY;
                }
                "Tf" => {
                    self.state.font = operands.first().and_then(|o| o.as_name().ok()).map(<[u8]>::to_vec);
                    if let Some(size) = num(1) {
                        self.state.font_size = size;
                    }
                }
                "Tc" => self.state.char_spacing = num(0).unwrap_or(0.0),
                "Tw" => self.state.word_spacing = num(0).unwrap_or(0.0),
                "Tz" => self.state.horizontal_scale = num(0).unwrap_or(100.0) / 100.0,
                "TL" => self.state.leading = num(0).unwrap_or(0.0),
                "Ts" => self.state.rise = num(0).unwrap_or(0.0),
                "Td" => {
                    if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                        self.move_line(tx, ty);
                    }
                }
                "TD" => {
                    if let (Some(tx), Some(ty)) = (num(0), num(1)) {
                        self.state.leading = -ty;
                        self.move_line(tx, ty);
                    }
                }
                "Tm" => {
                    if let Some(m) = Matrix::from_operands(operands) {
                        self.tm = m;
                        self.tlm = m;
                    }
                }
                "T*" => self.next_line(),
                "Tj" => {
                    if let Some(s @ Object::String(..)) = operands.first() {
                        runs.extend(self.show(index, std::slice::from_ref(s)));
                    }
                }
                "'" => {
                    self.next_line();
                    if let Some(s @ Object::String(..)) = operands.first() {
                        runs.extend(self.show(index, std::slice::from_ref(s)));
                    }
                }
                "\"" => {
                    self.state.word_spacing = num(0).unwrap_or(self.state.word_spacing);
                    self.state.char_spacing = num(1).unwrap_or(self.state.char_spacing);
                    self.next_line();
                    if let Some(s @ Object::String(..)) = operands.get(2) {
                        runs.extend(self.show(index, std::slice::from_ref(s)));
                    }
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = operands.first() {
                        runs.extend(self.show(index, items));
                    }
                }
                _ => {}
            }
        }

        runs
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.tlm = Matrix::translate(tx, ty).multiply(&self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.state.leading);
    }

    fn font(&self) -> &FontInfo {
        self.state
            .font
            .as_ref()
            .and_then(|name| self.fonts.get(name))
            .unwrap_or(&self.fallback)
    }

    /// Advance through strings and TJ adjustments, returning one run
    fn show(&mut self, op_index: usize, items: &[Object]) -> Option<TextRun> {
        let size = self.state.font_size;
        let scale = self.state.horizontal_scale;
        let start_tm = self.tm;

        let mut text = String::new();
        let mut advance = 0.0f32;

        for item in items {
            match item {
                Object::String(bytes, _) => {
                    let glyphs: Vec<Glyph> = self.font().decode(bytes);
                    for glyph in glyphs {
                        let mut tx = glyph.width / 1000.0 * size + self.state.char_spacing;
                        if glyph.is_space {
                            tx += self.state.word_spacing;
                        }
                        advance += tx * scale;
                        text.push_str(&glyph.text);
                    }
                }
                other => {
                    if let Some(n) = number(other) {
                        advance -= n / 1000.0 * size * scale;
                        if -n / 1000.0 > TJ_SPACE_THRESHOLD && !text.is_empty() && !text.ends_with(' ') {
                            text.push(' ');
                        }
                    }
                }
            }
        }

        self.tm = Matrix::translate(advance, 0.0).multiply(&self.tm);

        let rise = self.state.rise;
        let start = start_tm.multiply(&self.ctm);
        let end = self.tm.multiply(&self.ctm);
        let (x0, y0) = start.apply(0.0, rise);
        let (x1, _) = end.apply(0.0, rise);

        let advance_adjustment = if size.abs() > f32::EPSILON && scale.abs() > f32::EPSILON {
            -(advance * 1000.0 / (size * scale))
        } else {
            0.0
        };

        let font_size = (size * start.vertical_scale()).abs();
        if text.trim().is_empty() || font_size <= f32::EPSILON {
            return None;
        }

        Some(TextRun {
            op_index,
            x: x0.min(x1),
            baseline: y0,
            width: (x1 - x0).abs(),
            font_size,
            text,
            advance_adjustment,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn runs_for(content: &[u8]) -> Vec<TextRun> {
        let fonts = HashMap::new();
        let content = Content::decode(content).unwrap();
        Interpreter::new(&fonts).run(&content.operations)
    }

    #[test]
    fn test_positions_follow_text_matrix() {
        let runs = runs_for(b"BT /F1 10 Tf 72 700 Td (Hello) Tj 0 -14 Td (World) Tj ET");
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "Hello");
        assert_eq!((runs[0].x, runs[0].baseline), (72.0, 700.0));
        assert_eq!(runs[0].font_size, 10.0);
        // Five glyphs at the 500 fallback width
        assert!((runs[0].width - 25.0).abs() < 1e-3);
        assert_eq!(runs[1].baseline, 686.0);
        assert_eq!(runs[1].op_index, 5);
    }

    #[test]
    fn test_ctm_scales_font_size() {
        let runs = runs_for(b"q 2 0 0 2 10 10 cm BT /F1 6 Tf 5 5 Td (Hi) Tj ET Q BT /F1 6 Tf (After) Tj ET");
        assert_eq!(runs[0].font_size, 12.0);
        assert_eq!((runs[0].x, runs[0].baseline), (20.0, 20.0));
        assert_eq!(runs[1].font_size, 6.0);
        assert_eq!(runs[1].x, 0.0);
    }

    #[test]
    fn test_tj_array_spacing_and_adjustment() {
        let runs = runs_for(b"BT /F1 10 Tf 14 TL [(Two) -300 (words) 50 (!)] TJ T* (Next) Tj ET");
        assert_eq!(runs[0].text, "Two words!");
        let expected_advance = (9.0 * 500.0 / 1000.0 * 10.0) + 3.0 - 0.5;
        assert!((runs[0].width - expected_advance).abs() < 1e-3);
        assert!((runs[0].advance_adjustment + expected_advance * 100.0).abs() < 1e-2);
        assert_eq!(runs[1].baseline, -14.0);
        assert_eq!(runs[1].x, 0.0);
    }

    #[test]
    fn test_quote_operators_and_blank_runs() {
        let runs = runs_for(b"BT /F1 10 Tf 12 TL 0 100 Td (   ) Tj (Line) ' 2 1 (Wide) \" ET");
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "Line");
        assert_eq!(runs[0].baseline, 88.0);
        assert_eq!(runs[1].baseline, 76.0);
        // 4 glyphs * (5 + 1 char spacing)
        assert!((runs[1].width - 24.0).abs() < 1e-3);
    }
}
