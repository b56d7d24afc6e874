//! PDF reading, layout recovery and rewriting on top of lopdf
//!
//! Coordinates handed out by this module use a top-left origin with y growing
//! downward; conversion from PDF user space happens against the page's
//! MediaBox.

mod content;
mod fonts;
mod geometry;
mod layout;
mod rebuild;
mod text;
mod writer;

pub use fonts::{helvetica_width, win_ansi_encode};
pub use geometry::{BoundingBox, Matrix};
pub use layout::{extract_text_blocks, PageBlocks, TextBlock};
pub use rebuild::{font_size_for, rebuild_with_translation, PageReplacement, ReplacementBlock};
pub use text::{extract_plain_text, validate_pdf};
pub use writer::{wrap_text, PageLayout, TextPdfWriter};

use lopdf::{Dictionary, Document, Object};

/// Numeric operand or entry (integer or real)
pub(crate) fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Real-number object
pub(crate) fn real(value: f32) -> Object {
    Object::Real(value.into())
}

/// Follow an indirect reference (one level)
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Dictionary entry resolved through references
pub(crate) fn dict_get<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().map(|obj| resolve(doc, obj))
}

/// Page attribute looked up through the page tree (Resources, MediaBox)
pub(crate) fn inherited<'a>(doc: &'a Document, page: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    let mut current = page;
    for _ in 0..32 {
        if let Some(value) = dict_get(doc, current, key) {
            return Some(value);
        }
        current = dict_get(doc, current, b"Parent")?.as_dict().ok()?;
    }
    None
}

/// Stream payload, decompressed when a filter is present
pub(crate) fn stream_bytes(obj: &Object) -> Option<Vec<u8>> {
    let stream = obj.as_stream().ok()?;
    Some(
        stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone()),
    )
}

/// `[llx, lly, urx, ury]`, US Letter when absent or malformed
pub(crate) fn media_box(doc: &Document, page: &Dictionary) -> [f32; 4] {
    const LETTER: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

    let values: Option<Vec<f32>> = inherited(doc, page, b"MediaBox")
        .and_then(|obj| obj.as_array().ok())
        .map(|arr| arr.iter().filter_map(|o| number(resolve(doc, o))).collect());

    match values {
        Some(v) if v.len() == 4 && v[2] > v[0] && v[3] > v[1] => [v[0], v[1], v[2], v[3]],
        _ => LETTER,
    }
}
