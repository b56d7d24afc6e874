//! Grouping of text runs into lines and blocks with page-space bounding boxes

use lopdf::{Document, ObjectId};
use serde::{Deserialize, Serialize};

use super::content::{interpret_page, TextRun};
use super::geometry::BoundingBox;
use super::media_box;
use crate::error::Result;

/// Baselines closer than this (in em) share a row
const SAME_ROW: f32 = 0.4;
/// Horizontal gap (in em) that splits a row into columns
const COLUMN_GAP: f32 = 2.5;
/// Horizontal gap (in em) rendered as a space
const WORD_GAP: f32 = 0.15;
/// Allowed vertical gap range (in em) between lines of one block
const BLOCK_GAP: (f32, f32) = (-0.3, 0.8);
/// Maximum font size ratio inside a block
const BLOCK_SIZE_RATIO: f32 = 1.35;

/// A paragraph-like group of lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub block_no: usize,
    pub bbox: BoundingBox,
    /// Lines joined with `\n`
    pub text: String,
}

/// Text blocks of one page in reading order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageBlocks {
    /// 1-based
    pub page_number: u32,
    pub blocks: Vec<TextBlock>,
}

#[derive(Debug, Clone)]
struct Placed {
    bbox: BoundingBox,
    baseline: f32,
    font_size: f32,
    text: String,
}

#[derive(Debug, Clone)]
struct Line {
    bbox: BoundingBox,
    font_size: f32,
    text: String,
}

/// Blocks for every page of a PDF
pub fn extract_text_blocks(data: &[u8]) -> Result<Vec<PageBlocks>> {
    let doc = Document::load_mem(data)?;
    document_blocks(&doc)
}

pub(crate) fn document_blocks(doc: &Document) -> Result<Vec<PageBlocks>> {
    doc.get_pages()
        .into_iter()
        .map(|(page_number, page_id)| page_blocks(doc, page_number, page_id))
        .collect()
}

/// Blocks of a single page; undecodable content yields an empty page
pub(crate) fn page_blocks(doc: &Document, page_number: u32, page_id: ObjectId) -> Result<PageBlocks> {
    let page = doc.get_dictionary(page_id)?;
    let [llx, _, _, ury] = media_box(doc, page);

    let runs = match interpret_page(doc, page_id) {
        Ok(content) => content.runs,
        Err(e) => {
            tracing::warn!("Skipping text on page {}: {}", page_number, e);
            Vec::new()
        }
    };

    Ok(PageBlocks {
        page_number,
        blocks: group_blocks(&runs, llx, ury),
    })
}

/// Top-left-origin box of a run on a page with the given MediaBox corner
pub(crate) fn run_bbox(run: &TextRun, llx: f32, ury: f32) -> BoundingBox {
    let x0 = run.x - llx;
    BoundingBox::new(
        x0,
        ury - (run.baseline + 0.8 * run.font_size),
        x0 + run.width,
        ury - (run.baseline - 0.2 * run.font_size),
    )
}

fn group_blocks(runs: &[TextRun], llx: f32, ury: f32) -> Vec<TextBlock> {
    let mut placed: Vec<Placed> = runs
        .iter()
        .map(|run| Placed {
            bbox: run_bbox(run, llx, ury),
            baseline: ury - run.baseline,
            font_size: run.font_size,
            text: run.text.clone(),
        })
        .collect();
    placed.sort_by(|a, b| {
        a.baseline
            .total_cmp(&b.baseline)
            .then(a.bbox.x0.total_cmp(&b.bbox.x0))
    });

    let mut lines = Vec::new();
    for row in rows(placed) {
        lines.extend(split_row(row));
    }
    lines.sort_by(|a, b| a.bbox.y0.total_cmp(&b.bbox.y0).then(a.bbox.x0.total_cmp(&b.bbox.x0)));

    let mut blocks: Vec<Vec<Line>> = Vec::new();
    for line in lines {
        let target = blocks.iter_mut().rev().find(|block| {
            block
                .last()
                .is_some_and(|last| continues_block(last, &line))
        });
        match target {
            Some(block) => block.push(line),
            None => blocks.push(vec![line]),
        }
    }

    blocks
        .into_iter()
        .filter_map(|lines| {
            let bbox = lines
                .iter()
                .skip(1)
                .fold(lines.first()?.bbox, |acc, l| acc.union(&l.bbox));
            let text = lines
                .iter()
                .map(|l| l.text.trim())
                .collect::<Vec<_>>()
                .join("\n");
            Some((bbox, text))
        })
        .filter(|(_, text)| !text.trim().is_empty())
        .enumerate()
        .map(|(block_no, (bbox, text))| TextBlock { block_no, bbox, text })
        .collect()
}

fn rows(placed: Vec<Placed>) -> Vec<Vec<Placed>> {
    let mut rows: Vec<Vec<Placed>> = Vec::new();
    for item in placed {
        let joins = rows.last().and_then(|row| row.first()).is_some_and(|first| {
            let size = first.font_size.max(item.font_size);
            (item.baseline - first.baseline).abs() <= SAME_ROW * size
        });
        match rows.last_mut() {
            Some(row) if joins => row.push(item),
            _ => rows.push(vec![item]),
        }
    }
    rows
}

fn split_row(mut row: Vec<Placed>) -> Vec<Line> {
    row.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));

    let mut lines: Vec<Line> = Vec::new();
    for item in row {
        if let Some(line) = lines.last_mut() {
            let size = line.font_size.max(item.font_size);
            let gap = item.bbox.x0 - line.bbox.x1;
            if gap <= COLUMN_GAP * size {
                if gap > WORD_GAP * size && !line.text.ends_with(' ') && !item.text.starts_with(' ') {
                    line.text.push(' ');
                }
                line.text.push_str(&item.text);
                line.bbox = line.bbox.union(&item.bbox);
                line.font_size = size;
                continue;
            }
        }
        lines.push(Line {
            bbox: item.bbox,
            font_size: item.font_size,
            text: item.text,
        });
    }
    lines
}

fn continues_block(last: &Line, next: &Line) -> bool {
    let size = last.font_size.max(next.font_size);
    let gap = next.bbox.y0 - last.bbox.y1;
    let ratio = last.font_size.max(next.font_size) / last.font_size.min(next.font_size).max(f32::EPSILON);

    gap >= BLOCK_GAP.0 * size
        && gap <= BLOCK_GAP.1 * size
        && last.bbox.horizontal_overlap(&next.bbox) > 0.0
        && ratio <= BLOCK_SIZE_RATIO
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::{pdf_with_font, pdf_with_pages};
    use lopdf::{Dictionary, Object};

    fn blocks_of(content: &[u8]) -> Vec<TextBlock> {
        let pages = extract_text_blocks(&pdf_with_pages(&[content])).unwrap();
        assert_eq!(pages.len(), 1);
        pages.into_iter().next().unwrap().blocks
    }

    #[test]
    fn test_paragraph_and_heading_blocks() {
        let blocks = blocks_of(
            b"BT /F1 20 Tf 72 720 Td (Invoice) Tj ET
              BT /F1 10 Tf 72 680 Td (First line of) Tj 0 -12 Td (the body text.) Tj ET",
        );

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "Invoice");
        assert_eq!(blocks[0].block_no, 0);
        assert_eq!(blocks[1].text, "First line of\nthe body text.");

        let heading = blocks[0].bbox;
        assert!((heading.x0 - 72.0).abs() < 1e-3);
        assert!((heading.y0 - (792.0 - 736.0)).abs() < 1e-3);
        assert!((heading.y1 - (792.0 - 716.0)).abs() < 1e-3);
        assert!(blocks[1].bbox.y0 > heading.y1);
    }

    #[test]
    fn test_columns_and_word_gaps() {
        let blocks = blocks_of(
            b"BT /F1 10 Tf 72 700 Td (Name:) Tj 32 0 Td (Alice) Tj ET
              BT /F1 10 Tf 400 700 Td (Total) Tj ET",
        );

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "Name: Alice");
        assert_eq!(blocks[1].text, "Total");
        assert!(blocks[1].bbox.x0 > blocks[0].bbox.x1);
    }

    #[test]
    fn test_distant_lines_split_blocks() {
        let blocks = blocks_of(b"BT /F1 10 Tf 72 700 Td (Top) Tj 0 -60 Td (Bottom) Tj ET");
        let texts: Vec<&str> = blocks.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(texts, vec!["Top", "Bottom"]);
    }

    #[test]
    fn test_rejects_non_pdf() {
        assert!(extract_text_blocks(b"plain text").is_err());
    }

    #[test]
    fn test_empty_page() {
        assert!(blocks_of(b"0 0 m 100 100 l S").is_empty());
    }

    #[test]
    fn test_cid_font_widths_at_code_limit() {
        for w in [
            vec![
                Object::Integer(4_294_967_295),
                Object::Array(vec![Object::Integer(500), Object::Integer(600)]),
            ],
            vec![
                Object::Integer(4_294_967_040),
                Object::Integer(4_294_967_295),
                Object::Integer(500),
            ],
        ] {
            let cid_font = Dictionary::from_iter([
                ("Type", Object::Name(b"Font".to_vec())),
                ("Subtype", Object::Name(b"CIDFontType0".to_vec())),
                ("BaseFont", Object::Name(b"KozMinPro-Regular".to_vec())),
                ("W", Object::Array(w)),
            ]);
            let font = Dictionary::from_iter([
                ("Type", Object::Name(b"Font".to_vec())),
                ("Subtype", Object::Name(b"Type0".to_vec())),
                ("BaseFont", Object::Name(b"KozMinPro-Regular".to_vec())),
                ("Encoding", Object::Name(b"UniJIS-UCS2-H".to_vec())),
                ("DescendantFonts", Object::Array(vec![Object::Dictionary(cid_font)])),
            ]);

            let pdf = pdf_with_font(font, &[b"BT /F1 12 Tf 72 700 Td <00480069> Tj ET"]);
            let pages = extract_text_blocks(&pdf).unwrap();
            assert_eq!(pages[0].blocks.len(), 1);
            assert_eq!(pages[0].blocks[0].text, "Hi");
        }
    }
}
