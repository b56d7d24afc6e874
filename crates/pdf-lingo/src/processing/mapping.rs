//! Per-page mapping between extracted blocks and translated lines

use crate::pdf::{ReplacementBlock, TextBlock};

/// Reading order: top to bottom, then left to right
pub fn order_blocks(mut blocks: Vec<TextBlock>) -> Vec<TextBlock> {
    blocks.sort_by(|a, b| {
        a.bbox
            .y0
            .total_cmp(&b.bbox.y0)
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });
    blocks
}

/// Text sent to the model for one page: every block followed by a newline
pub fn page_prompt_text(blocks: &[TextBlock]) -> String {
    blocks.iter().fold(String::new(), |mut text, block| {
        text.push_str(&block.text);
        text.push('\n');
        text
    })
}

/// Zip non-empty translated lines onto the blocks in order
///
/// Blocks beyond the number of lines keep their original text, as do all
/// blocks when there is no translation.
pub fn assign_translated_lines(blocks: &[TextBlock], translated: Option<&str>) -> Vec<ReplacementBlock> {
    let lines: Vec<&str> = translated
        .map(|t| t.lines().map(str::trim).filter(|l| !l.is_empty()).collect())
        .unwrap_or_default();

    blocks
        .iter()
        .enumerate()
        .map(|(i, block)| ReplacementBlock {
            bbox: block.bbox,
            text: lines
                .get(i)
                .map(|line| line.to_string())
                .unwrap_or_else(|| block.text.clone()),
        })
        .collect()
}
