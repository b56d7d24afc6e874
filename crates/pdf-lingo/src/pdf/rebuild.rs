//! Redact original text blocks and draw replacement text in their place

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::content::interpret_page;
use super::fonts::{standard_font, win_ansi_encode};
use super::geometry::BoundingBox;
use super::layout::run_bbox;
use super::{dict_get, inherited, media_box, real};
use crate::error::{Error, Result};

/// Resource name of the font used for replacement text
const REPLACEMENT_FONT: &str = "FLingoHelv";
/// Slack around a block when deciding whether a run belongs to it
const REDACT_MARGIN: f32 = 1.0;
const LINE_SPACING: f32 = 1.2;

/// New text for the area of one original block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplacementBlock {
    pub bbox: BoundingBox,
    pub text: String,
}

/// Replacements for one page (1-based page number)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageReplacement {
    pub page_number: u32,
    pub blocks: Vec<ReplacementBlock>,
}

/// Font size for text placed in `bbox`
pub fn font_size_for(bbox: &BoundingBox) -> f32 {
    (bbox.height() * 0.7).clamp(8.0, 14.0)
}

/// Rewrite `data` with each page's blocks redacted and replaced
pub fn rebuild_with_translation(data: &[u8], pages: &[PageReplacement]) -> Result<Vec<u8>> {
    let mut doc = Document::load_mem(data)?;
    let page_ids = doc.get_pages();
    let font_id = doc.add_object(standard_font("Helvetica"));

    for page in pages.iter().filter(|p| !p.blocks.is_empty()) {
        let Some(&page_id) = page_ids.get(&page.page_number) else {
            tracing::warn!("Page {} not in document, skipping", page.page_number);
            continue;
        };
        rebuild_page(&mut doc, page_id, &page.blocks, font_id)?;
        tracing::debug!(
            "Rebuilt page {} with {} replacement blocks",
            page.page_number,
            page.blocks.len()
        );
    }

    doc.compress();
    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|e| Error::pdf(format!("Failed to save PDF: {}", e)))?;
    Ok(output)
}

fn rebuild_page(
    doc: &mut Document,
    page_id: ObjectId,
    blocks: &[ReplacementBlock],
    font_id: ObjectId,
) -> Result<()> {
    let content = interpret_page(doc, page_id)?;
    let (llx, ury, resources) = {
        let page = doc.get_dictionary(page_id)?;
        let [llx, _, _, ury] = media_box(doc, page);
        (llx, ury, page_resources(doc, page, font_id))
    };

    let redacted: HashMap<usize, f32> = content
        .runs
        .iter()
        .filter(|run| {
            let (cx, cy) = run_bbox(run, llx, ury).center();
            blocks.iter().any(|b| b.bbox.contains(cx, cy, REDACT_MARGIN))
        })
        .map(|run| (run.op_index, run.advance_adjustment))
        .collect();

    let mut operations = Vec::with_capacity(content.operations.len() + blocks.len() * 8 + 2);
    operations.push(Operation::new("q", vec![]));
    for (index, op) in content.operations.into_iter().enumerate() {
        match redacted.get(&index) {
            Some(&adjustment) => operations.extend(redact(op, adjustment)),
            None => operations.push(op),
        }
    }
    operations.push(Operation::new("Q", vec![]));
    operations.extend(overlay(blocks, llx, ury));

    let bytes = Content { operations }.encode()?;
    let content_id = doc.add_object(Stream::new(Dictionary::new(), bytes));

    let page = doc.get_object_mut(page_id)?.as_dict_mut()?;
    page.set("Contents", Object::Reference(content_id));
    page.set("Resources", Object::Dictionary(resources));
    Ok(())
}

/// Inline copy of the page resources with the replacement font added
fn page_resources(doc: &Document, page: &Dictionary, font_id: ObjectId) -> Dictionary {
    let mut resources = inherited(doc, page, b"Resources")
        .and_then(|r| r.as_dict().ok())
        .cloned()
        .unwrap_or_default();
    let mut fonts = dict_get(doc, &resources, b"Font")
        .and_then(|f| f.as_dict().ok())
        .cloned()
        .unwrap_or_default();
    fonts.set(REPLACEMENT_FONT, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));
    resources
}

/// Show operator turned into an equivalent pure advance
fn redact(op: Operation, adjustment: f32) -> Vec<Operation> {
    let advance = Operation::new("TJ", vec![Object::Array(vec![real(adjustment)])]);
    match op.operator.as_str() {
        "'" => vec![Operation::new("T*", vec![]), advance],
        "\"" => {
            let mut operands = op.operands.into_iter();
            let word_spacing = operands.next().unwrap_or(Object::Integer(0));
            let char_spacing = operands.next().unwrap_or(Object::Integer(0));
            vec![
                Operation::new("Tw", vec![word_spacing]),
                Operation::new("Tc", vec![char_spacing]),
                Operation::new("T*", vec![]),
                advance,
            ]
        }
        _ => vec![advance],
    }
}

/// White boxes over the blocks, then the replacement text
fn overlay(blocks: &[ReplacementBlock], llx: f32, ury: f32) -> Vec<Operation> {
    let mut ops = vec![Operation::new("q", vec![]), Operation::new("g", vec![real(1.0)])];

    for block in blocks {
        let b = &block.bbox;
        ops.push(Operation::new(
            "re",
            vec![real(llx + b.x0), real(ury - b.y1), real(b.width()), real(b.height())],
        ));
        ops.push(Operation::new("f", vec![]));
    }

    ops.push(Operation::new("g", vec![real(0.0)]));
    for block in blocks.iter().filter(|b| !b.text.trim().is_empty()) {
        let font_size = font_size_for(&block.bbox);
        let first_baseline = block.bbox.y0 + font_size * 0.8;

        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![Object::Name(REPLACEMENT_FONT.as_bytes().to_vec()), real(font_size)],
        ));
        for (i, line) in block.text.lines().enumerate() {
            let baseline = first_baseline + i as f32 * LINE_SPACING * font_size;
            ops.push(Operation::new(
                "Tm",
                vec![
                    real(1.0),
                    real(0.0),
                    real(0.0),
                    real(1.0),
                    real(llx + block.bbox.x0),
                    real(ury - baseline),
                ],
            ));
            ops.push(Operation::new(
                "Tj",
                vec![Object::String(win_ansi_encode(line), StringFormat::Hexadecimal)],
            ));
        }
        ops.push(Operation::new("ET", vec![]));
    }

    ops.push(Operation::new("Q", vec![]));
    ops
}
