//! Turn text typed on stdin into a titled Letter-size PDF
//!
//! Input ends at a line containing only `DONE` (or at end of input).
//! Run with: cargo run -p pdf-lingo --bin pdf-lingo-make-pdf -- [output.pdf]

use std::io::{self, BufRead, Write};

use anyhow::Context;
use pdf_lingo::pdf::{PageLayout, TextPdfWriter};

const DEFAULT_OUTPUT: &str = "generated_document.pdf";
const TITLE: &str = "Generated Document";
const MARGIN: f32 = 72.0;

fn main() -> anyhow::Result<()> {
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_OUTPUT.to_string());

    println!("Enter the document text. Type DONE on its own line to finish.");
    io::stdout().flush()?;

    let mut lines = Vec::new();
    for line in io::stdin().lock().lines() {
        let line = line.context("Failed to read stdin")?;
        if line.trim() == "DONE" {
            break;
        }
        lines.push(line);
    }

    let text = lines.join("\n");
    let bytes = TextPdfWriter::new(PageLayout::letter(MARGIN))
        .with_title(TITLE)
        .render(&text)?;

    std::fs::write(&output, &bytes).with_context(|| format!("Failed to write {}", output))?;
    println!("PDF created: {} ({} bytes)", output, bytes.len());

    Ok(())
}
