//! Font decoding: ToUnicode CMaps, CID encodings, WinAnsi, glyph widths

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Encoding, Object};
use std::collections::HashMap;
use std::sync::OnceLock;

use super::{dict_get, number, resolve, stream_bytes};

/// Helvetica advance widths for ' '..='~' (1/1000 em)
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Default advance for glyphs without width information
const FALLBACK_WIDTH: f32 = 500.0;

/// One-byte code to UTF-16 table as lopdf exposes it
type CodeTable = [Option<u16>; 256];

static WIN_ANSI: OnceLock<CodeTable> = OnceLock::new();

/// Table of a named simple-font encoding (WinAnsi, MacRoman, Standard, PDFDoc)
fn named_table(doc: &Document, encoding: &[u8]) -> Option<CodeTable> {
    let font = Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Encoding", Object::Name(encoding.to_vec())),
    ]);
    match font.get_font_encoding(doc) {
        Ok(Encoding::OneByteEncoding(table)) => Some(*table),
        _ => None,
    }
}

fn win_ansi_table() -> &'static CodeTable {
    WIN_ANSI.get_or_init(|| named_table(&Document::new(), b"WinAnsiEncoding").unwrap_or([None; 256]))
}

/// Encode text for a WinAnsi simple font; unmappable characters become `?`
pub fn win_ansi_encode(text: &str) -> Vec<u8> {
    let encoding = Encoding::OneByteEncoding(win_ansi_table());
    let mut buf = [0u8; 4];
    text.chars()
        .map(|c| {
            let c = if c == '\t' { ' ' } else { c };
            match Document::encode_text(&encoding, c.encode_utf8(&mut buf)).as_slice() {
                [byte] => *byte,
                _ => b'?',
            }
        })
        .collect()
}

/// Rendered width of `text` in Helvetica at `font_size`
pub fn helvetica_width(text: &str, font_size: f32) -> f32 {
    let units: u32 = text
        .chars()
        .map(|c| match c {
            ' '..='~' => HELVETICA_WIDTHS[(c as usize) - 32] as u32,
            _ => 556,
        })
        .sum();
    units as f32 / 1000.0 * font_size
}

/// Non-embedded Type1 font dictionary in WinAnsiEncoding
///
/// Regular Helvetica carries its metrics so extraction measures it exactly.
pub(crate) fn standard_font(base_font: &str) -> Dictionary {
    let mut font = Dictionary::from_iter([
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(base_font.as_bytes().to_vec())),
        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
    ]);
    if base_font == "Helvetica" {
        font.set("FirstChar", Object::Integer(32));
        font.set("LastChar", Object::Integer(126));
        font.set(
            "Widths",
            Object::Array(
                HELVETICA_WIDTHS
                    .iter()
                    .map(|&w| Object::Integer(w as i64))
                    .collect(),
            ),
        );
    }
    font
}

/// One decoded character code
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub text: String,
    /// Advance in 1/1000 text-space units
    pub width: f32,
    /// Single-byte code 32, which receives word spacing
    pub is_space: bool,
}


/// Ranges kept per CMap or `/W` array
const MAX_RANGES: usize = 4096;

/// Destination of a `bfrange` entry
#[derive(Debug, Clone)]
enum RangeTarget {
    /// `<lo> <hi> <dst>`: the last UTF-16 unit of `dst` advances with the code
    Increment(Vec<u16>),
    /// `<lo> <hi> [<d0> <d1> ...]`
    List(Vec<String>),
}

#[derive(Debug, Clone)]
struct CodeRange {
    lo: u32,
    hi: u32,
    target: RangeTarget,
}

/// Character-code to Unicode mapping from a ToUnicode stream
///
/// Ranges are resolved on lookup rather than expanded.
#[derive(Debug, Clone, Default)]
pub struct CMap {
    chars: HashMap<u32, String>,
    ranges: Vec<CodeRange>,
    code_len: Option<usize>,
}

fn string_bytes(obj: &Object) -> Option<&[u8]> {
    match obj {
        Object::String(bytes, _) => Some(bytes),
        _ => None,
    }
}

fn bytes_to_code(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks(2)
        .map(|pair| match pair {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [single] => *single as u16,
            _ => 0,
        })
        .collect()
}

fn utf16_string(bytes: &[u8]) -> String {
    String::from_utf16_lossy(&utf16_units(bytes))
}

impl CMap {
    /// Parse the `codespacerange`, `bfchar` and `bfrange` sections of a ToUnicode CMap
    ///
    /// lopdf's content parser tokenizes the PostScript body; each section's
    /// entries arrive as the operands of its `end...` operator.
    pub fn parse(data: &[u8]) -> Self {
        let mut cmap = CMap::default();
        let content = match Content::decode(data) {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!("Unreadable ToUnicode CMap: {}", e);
                return cmap;
            }
        };

        for op in &content.operations {
            match op.operator.as_str() {
                "endcodespacerange" => {
                    if let Some(lo) = op.operands.first().and_then(string_bytes) {
                        cmap.code_len = Some(lo.len().clamp(1, 4));
                    }
                }
                "endbfchar" => {
                    for pair in op.operands.chunks_exact(2) {
                        if let (Some(src), Some(dst)) = (string_bytes(&pair[0]), string_bytes(&pair[1])) {
                            cmap.note_code_len(src);
                            cmap.chars.insert(bytes_to_code(src), utf16_string(dst));
                        }
                    }
                }
                "endbfrange" => {
                    for entry in op.operands.chunks_exact(3) {
                        let (Some(lo), Some(hi)) = (string_bytes(&entry[0]), string_bytes(&entry[1])) else {
                            continue;
                        };
                        cmap.note_code_len(lo);
                        let (lo, hi) = (bytes_to_code(lo), bytes_to_code(hi));
                        if hi < lo {
                            continue;
                        }

                        let target = match &entry[2] {
                            Object::String(dst, _) if !dst.is_empty() => RangeTarget::Increment(utf16_units(dst)),
                            Object::Array(list) => RangeTarget::List(
                                list.iter()
                                    .take(((hi - lo) as usize).saturating_add(1))
                                    .map(|o| string_bytes(o).map(utf16_string).unwrap_or_default())
                                    .collect(),
                            ),
                            _ => continue,
                        };
                        cmap.push_range(CodeRange { lo, hi, target });
                    }
                }
                _ => {}
            }
        }

        cmap
    }

    fn note_code_len(&mut self, src: &[u8]) {
        self.code_len.get_or_insert(src.len().clamp(1, 4));
    }

    fn push_range(&mut self, range: CodeRange) {
        if self.ranges.len() < MAX_RANGES {
            self.ranges.push(range);
        } else {
            tracing::debug!("Ignoring bfrange {:#x}-{:#x} past the range limit", range.lo, range.hi);
        }
    }

    pub fn get(&self, code: u32) -> Option<String> {
        if let Some(text) = self.chars.get(&code) {
            return Some(text.clone());
        }

        let range = self.ranges.iter().rev().find(|r| r.lo <= code && code <= r.hi)?;
        let offset = code - range.lo;
        match &range.target {
            RangeTarget::Increment(units) => {
                let mut units = units.clone();
                if let Some(last) = units.last_mut() {
                    *last = last.wrapping_add(offset as u16);
                }
                Some(String::from_utf16_lossy(&units))
            }
            RangeTarget::List(list) => list.get(offset as usize).cloned(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty() && self.ranges.is_empty()
    }
}

/// CID advances from a descendant font's `/W`
#[derive(Debug, Clone, Default)]
struct CidWidths {
    single: HashMap<u32, f32>,
    ranges: Vec<(u32, u32, f32)>,
}

impl CidWidths {
    fn get(&self, code: u32) -> Option<f32> {
        self.single.get(&code).copied().or_else(|| {
            self.ranges
                .iter()
                .rev()
                .find(|(lo, hi, _)| *lo <= code && code <= *hi)
                .map(|(_, _, width)| *width)
        })
    }
}

/// Everything needed to turn string operands into text and advances
#[derive(Debug, Clone)]
pub struct FontInfo {
    /// Bytes per character code
    code_len: usize,
    to_unicode: Option<CMap>,
    /// CID codes are UCS-2/UTF-16 (e.g. `UniJIS-UCS2-H`)
    utf16_codes: bool,
    /// Simple-font encoding, WinAnsi unless the font names another
    one_byte: CodeTable,
    first_char: u32,
    widths: Vec<f32>,
    cid_widths: CidWidths,
    default_width: f32,
}

impl Default for FontInfo {
    fn default() -> Self {
        Self {
            code_len: 1,
            to_unicode: None,
            utf16_codes: false,
            one_byte: *win_ansi_table(),
            first_char: 0,
            widths: Vec::new(),
            cid_widths: CidWidths::default(),
            default_width: FALLBACK_WIDTH,
        }
    }
}

/// Base table of a simple font: `/Encoding` name or `/BaseEncoding` of an encoding dictionary
fn simple_encoding_table(doc: &Document, dict: &Dictionary) -> Option<CodeTable> {
    let name = match dict_get(doc, dict, b"Encoding")? {
        Object::Name(name) => name.as_slice(),
        Object::Dictionary(encoding) => dict_get(doc, encoding, b"BaseEncoding")?.as_name().ok()?,
        _ => return None,
    };
    named_table(doc, name)
}

impl FontInfo {
    /// Build from a font dictionary
    pub fn from_dict(doc: &Document, dict: &Dictionary) -> Self {
        let subtype = dict_get(doc, dict, b"Subtype")
            .and_then(|o| o.as_name().ok())
            .unwrap_or(&[]);

        let mut info = FontInfo::default();

        if let Some(stream) = dict_get(doc, dict, b"ToUnicode") {
            if let Some(data) = stream_bytes(stream) {
                let cmap = CMap::parse(&data);
                if !cmap.is_empty() {
                    info.to_unicode = Some(cmap);
                }
            }
        }

        if subtype == b"Type0" {
            info.code_len = 2;
            info.default_width = 1000.0;

            if let Some(encoding) = dict_get(doc, dict, b"Encoding").and_then(|o| o.as_name().ok()) {
                let encoding = String::from_utf8_lossy(encoding);
                info.utf16_codes = encoding.contains("UCS2") || encoding.contains("UTF16");
            }

            let descendant = dict_get(doc, dict, b"DescendantFonts")
                .and_then(|o| o.as_array().ok())
                .and_then(|arr| arr.first())
                .map(|o| resolve(doc, o))
                .and_then(|o| o.as_dict().ok());

            if let Some(cid_font) = descendant {
                if let Some(dw) = dict_get(doc, cid_font, b"DW").and_then(number) {
                    info.default_width = dw;
                }
                if let Some(w) = dict_get(doc, cid_font, b"W").and_then(|o| o.as_array().ok()) {
                    info.cid_widths = parse_cid_widths(doc, w);
                }
            }
        } else {
            if let Some(table) = simple_encoding_table(doc, dict) {
                info.one_byte = table;
            }
            info.first_char = dict_get(doc, dict, b"FirstChar")
                .and_then(number)
                .map(|v| v.max(0.0) as u32)
                .unwrap_or(0);
            info.widths = dict_get(doc, dict, b"Widths")
                .and_then(|o| o.as_array().ok())
                .map(|arr| {
                    arr.iter()
                        .map(|o| number(resolve(doc, o)).unwrap_or(0.0))
                        .collect()
                })
                .unwrap_or_default();
        }

        if info.code_len == 2 {
            if let Some(len) = info.to_unicode.as_ref().and_then(|c| c.code_len) {
                info.code_len = len;
            }
        }

        info
    }

    fn width_of(&self, code: u32) -> f32 {
        if self.code_len > 1 {
            return self.cid_widths.get(code).unwrap_or(self.default_width);
        }
        code.checked_sub(self.first_char)
            .and_then(|idx| self.widths.get(idx as usize))
            .copied()
            .filter(|w| *w > 0.0)
            .unwrap_or(self.default_width)
    }

    fn text_of(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.as_ref().and_then(|c| c.get(code)) {
            return text;
        }
        if self.code_len == 1 {
            let encoding = Encoding::OneByteEncoding(&self.one_byte);
            return Document::decode_text(&encoding, &[code as u8]).unwrap_or_default();
        }
        if self.utf16_codes {
            if let Some(c) = char::from_u32(code) {
                return c.to_string();
            }
        }
        '\u{FFFD}'.to_string()
    }

    /// Split a string operand into glyphs
    pub fn decode(&self, bytes: &[u8]) -> Vec<Glyph> {
        bytes
            .chunks(self.code_len)
            .map(|chunk| {
                let code = bytes_to_code(chunk);
                Glyph {
                    text: self.text_of(code),
                    width: self.width_of(code),
                    is_space: self.code_len == 1 && code == 32,
                }
            })
            .collect()
    }
}

/// `/W` array: `c [w1 w2 ...]` or `c_first c_last w`
fn parse_cid_widths(doc: &Document, w: &[Object]) -> CidWidths {
    let mut widths = CidWidths::default();
    let mut i = 0;

    while i < w.len() {
        let first = match number(resolve(doc, &w[i])) {
            Some(v) => v as u32,
            None => break,
        };
        match w.get(i + 1).map(|o| resolve(doc, o)) {
            Some(Object::Array(list)) => {
                for (offset, obj) in list.iter().enumerate() {
                    let Some(code) = u32::try_from(offset).ok().and_then(|o| first.checked_add(o)) else {
                        break;
                    };
                    if let Some(width) = number(resolve(doc, obj)) {
                        widths.single.insert(code, width);
                    }
                }
                i += 2;
            }
            Some(obj) => {
                let last = number(obj).map(|v| v as u32).unwrap_or(first);
                let width = w.get(i + 2).and_then(|o| number(resolve(doc, o)));
                if let Some(width) = width {
                    if last >= first && widths.ranges.len() < MAX_RANGES {
                        widths.ranges.push((first, last, width));
                    }
                }
                i += 3;
            }
            None => break,
        }
    }

    widths
}
