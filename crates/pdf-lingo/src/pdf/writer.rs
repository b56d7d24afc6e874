//! Plain text to paginated PDF

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat};

use super::fonts::{helvetica_width, standard_font, win_ansi_encode};
use super::real;
use crate::error::{Error, Result};

const TITLE_SIZE: f32 = 18.0;

/// Page size and margin in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
}

impl PageLayout {
    pub fn a4(margin: f32) -> Self {
        Self {
            width: 595.28,
            height: 841.89,
            margin,
        }
    }

    pub fn letter(margin: f32) -> Self {
        Self {
            width: 612.0,
            height: 792.0,
            margin,
        }
    }

    fn text_width(&self) -> f32 {
        (self.width - 2.0 * self.margin).max(1.0)
    }
}

/// Greedy word wrap by Helvetica metrics; over-long words are broken
pub fn wrap_text(text: &str, font_size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if helvetica_width(&candidate, font_size) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        for ch in word.chars() {
            current.push(ch);
            if helvetica_width(&current, font_size) > max_width && current.chars().count() > 1 {
                current.pop();
                lines.push(std::mem::take(&mut current));
                current.push(ch);
            }
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[derive(Debug, Clone)]
struct PlacedLine {
    text: String,
    x: f32,
    baseline: f32,
    bold: bool,
    font_size: f32,
}

/// Renders text as a simple Helvetica document
#[derive(Debug, Clone)]
pub struct TextPdfWriter {
    layout: PageLayout,
    title: Option<String>,
    font_size: f32,
    leading: f32,
    paragraph_spacing: f32,
}

impl TextPdfWriter {
    pub fn new(layout: PageLayout) -> Self {
        Self {
            layout,
            title: None,
            font_size: 10.0,
            leading: 12.0,
            paragraph_spacing: 7.2,
        }
    }

    /// Centered bold heading on the first page
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self.leading = font_size * 1.2;
        self
    }

    /// Paragraphs are separated by blank lines; single newlines are hard breaks
    pub fn render(&self, text: &str) -> Result<Vec<u8>> {
        let pages = self.paginate(text);
        self.assemble(&pages)
    }

    fn paginate(&self, text: &str) -> Vec<Vec<PlacedLine>> {
        let layout = &self.layout;
        let bottom = layout.height - layout.margin;
        let mut pages: Vec<Vec<PlacedLine>> = vec![Vec::new()];
        let mut cursor = layout.margin;

        if let Some(title) = &self.title {
            let width = helvetica_width(title, TITLE_SIZE);
            pages[0].push(PlacedLine {
                text: title.clone(),
                x: ((layout.width - width) / 2.0).max(layout.margin),
                baseline: cursor + TITLE_SIZE,
                bold: true,
                font_size: TITLE_SIZE,
            });
            cursor += TITLE_SIZE * 2.0;
        }

        let normalized = text.replace("\r\n", "\n");
        for paragraph in normalized.split("\n\n").filter(|p| !p.trim().is_empty()) {
            for hard_line in paragraph.trim_matches('\n').split('\n') {
                let wrapped = wrap_text(hard_line, self.font_size, layout.text_width());
                let wrapped = if wrapped.is_empty() { vec![String::new()] } else { wrapped };

                for line in wrapped {
                    if cursor + self.leading > bottom && pages.last().is_some_and(|p| !p.is_empty()) {
                        pages.push(Vec::new());
                        cursor = layout.margin;
                    }
                    if let Some(page) = pages.last_mut() {
                        page.push(PlacedLine {
                            text: line,
                            x: layout.margin,
                            baseline: cursor + self.font_size,
                            bold: false,
                            font_size: self.font_size,
                        });
                    }
                    cursor += self.leading;
                }
            }
            cursor += self.paragraph_spacing;
        }

        pages
    }

    fn assemble(&self, pages: &[Vec<PlacedLine>]) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(standard_font("Helvetica"));
        let bold_id = doc.add_object(standard_font("Helvetica-Bold"));
        let resources_id = doc.add_object(Dictionary::from_iter([(
            "Font",
            Object::Dictionary(Dictionary::from_iter([
                ("F1", Object::Reference(regular_id)),
                ("F2", Object::Reference(bold_id)),
            ])),
        )]));

        let mut kids = Vec::with_capacity(pages.len());
        for lines in pages {
            let mut operations = Vec::new();
            for line in lines.iter().filter(|l| !l.text.is_empty()) {
                let font = if line.bold { "F2" } else { "F1" };
                operations.push(Operation::new("BT", vec![]));
                operations.push(Operation::new(
                    "Tf",
                    vec![Object::Name(font.as_bytes().to_vec()), real(line.font_size)],
                ));
                operations.push(Operation::new(
                    "Td",
                    vec![real(line.x), real(self.layout.height - line.baseline)],
                ));
                operations.push(Operation::new(
                    "Tj",
                    vec![Object::String(win_ansi_encode(&line.text), StringFormat::Literal)],
                ));
                operations.push(Operation::new("ET", vec![]));
            }

            let bytes = Content { operations }.encode()?;
            let content_id = doc.add_object(Stream::new(Dictionary::new(), bytes));
            let page_id = doc.add_object(Dictionary::from_iter([
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                ("Contents", Object::Reference(content_id)),
                ("Resources", Object::Reference(resources_id)),
                (
                    "MediaBox",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        real(self.layout.width),
                        real(self.layout.height),
                    ]),
                ),
            ]));
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter([
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Kids", Object::Array(kids)),
                ("Count", Object::Integer(count)),
            ])),
        );
        let catalog_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        let info_id = doc.add_object(Dictionary::from_iter([(
            "Producer",
            Object::string_literal("pdf-lingo"),
        )]));
        doc.trailer.set("Root", Object::Reference(catalog_id));
        doc.trailer.set("Info", Object::Reference(info_id));

        doc.compress();
        let mut output = Vec::new();
        doc.save_to(&mut output)
            .map_err(|e| Error::pdf(format!("Failed to save PDF: {}", e)))?;
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::layout::extract_text_blocks;
    use crate::pdf::media_box;

    #[test]
    fn test_wrap_text_respects_width() {
        let text = "The quick brown fox jumps over the lazy dog again and again";
        let lines = wrap_text(text, 10.0, 100.0);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| helvetica_width(l, 10.0) <= 100.0));
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_breaks_long_words() {
        let lines = wrap_text("Donaudampfschifffahrtsgesellschaft", 10.0, 50.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), "Donaudampfschifffahrtsgesellschaft");
        assert!(wrap_text("   ", 10.0, 50.0).is_empty());
    }

    #[test]
    fn test_render_round_trip() {
        let pdf = TextPdfWriter::new(PageLayout::letter(72.0))
            .with_title("Generated Document")
            .render("First paragraph.\n\nSecond paragraph\nwith a hard break.")
            .unwrap();

        let pages = extract_text_blocks(&pdf).unwrap();
        assert_eq!(pages.len(), 1);

        let doc = Document::load_mem(&pdf).unwrap();
        let page_id = doc.get_pages()[&1];
        let page = doc.get_dictionary(page_id).unwrap();
        assert_eq!(media_box(&doc, page), [0.0, 0.0, 612.0, 792.0]);

        let texts: Vec<&str> = pages[0].blocks.iter().map(|b| b.text.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Generated Document",
                "First paragraph.",
                "Second paragraph\nwith a hard break."
            ]
        );
    }

    #[test]
    fn test_long_text_paginates() {
        let text = vec!["A paragraph long enough to matter."; 120].join("\n\n");
        let pdf = TextPdfWriter::new(PageLayout::a4(50.0)).render(&text).unwrap();
        let pages = extract_text_blocks(&pdf).unwrap();
        assert!(pages.len() > 1);
        assert!(pages.iter().all(|p| !p.blocks.is_empty()));
    }

    #[test]
    fn test_empty_text_gives_one_page() {
        let pdf = TextPdfWriter::new(PageLayout::a4(50.0)).render("").unwrap();
        let pages = extract_text_blocks(&pdf).unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].blocks.is_empty());
    }
}
