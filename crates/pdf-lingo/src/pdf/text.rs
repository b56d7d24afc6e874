//! Whole-document plain text

use lopdf::Document;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use super::layout::document_blocks;
use crate::error::{Error, Result};

const EXTRACT_TIMEOUT: Duration = Duration::from_secs(60);

/// Timed-out pdf-extract threads keep running detached; cap how many exist at once
static EXTRACT_THREADS: ExtractSlots = ExtractSlots::new(4);

struct ExtractSlots {
    running: AtomicUsize,
    limit: usize,
}

impl ExtractSlots {
    const fn new(limit: usize) -> Self {
        Self {
            running: AtomicUsize::new(0),
            limit,
        }
    }

    fn acquire(&'static self) -> Option<ExtractSlot> {
        if self.running.fetch_add(1, Ordering::SeqCst) >= self.limit {
            self.running.fetch_sub(1, Ordering::SeqCst);
            return None;
        }
        Some(ExtractSlot(self))
    }
}

/// Released when the extraction thread finishes, including by panic
struct ExtractSlot(&'static ExtractSlots);

impl Drop for ExtractSlot {
    fn drop(&mut self) {
        self.0.running.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Check that `data` parses as a PDF, returning its page count
pub fn validate_pdf(filename: &str, data: &[u8]) -> Result<usize> {
    let doc = Document::load_mem(data).map_err(|e| Error::file_parse(filename, e.to_string()))?;
    let pages = doc.get_pages().len();
    if pages == 0 {
        return Err(Error::file_parse(filename, "PDF has no pages"));
    }
    Ok(pages)
}

/// Extract the text of every page
///
/// pdf-extract runs on its own thread with a time limit since some fonts make
/// it hang. A thread that times out cannot be stopped and is left detached.
/// The block extractor is used on error, timeout or panic, and whenever the
/// cap on extraction threads is reached.
pub fn extract_plain_text(data: &[u8]) -> Result<String> {
    let Some(slot) = EXTRACT_THREADS.acquire() else {
        tracing::warn!("Too many pdf-extract threads still running, using block extractor");
        return fallback_text(data);
    };

    let data_vec = data.to_vec();
    let (tx, rx) = mpsc::channel();

    let handle = thread::spawn(move || {
        let _slot = slot;
        let result = pdf_extract::extract_text_from_mem(&data_vec);
        let _ = tx.send(result.map_err(|e| e.to_string()));
    });

    match rx.recv_timeout(EXTRACT_TIMEOUT) {
        Ok(Ok(text)) => {
            let _ = handle.join();
            Ok(clean_text(&text))
        }
        Ok(Err(e)) => {
            let _ = handle.join();
            tracing::warn!("pdf-extract failed: {}, using block extractor", e);
            fallback_text(data)
        }
        Err(mpsc::RecvTimeoutError::Timeout) => {
            tracing::error!("pdf-extract timed out after {:?}, using block extractor", EXTRACT_TIMEOUT);
            fallback_text(data)
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            tracing::error!("pdf-extract thread panicked, using block extractor");
            fallback_text(data)
        }
    }
}

fn fallback_text(data: &[u8]) -> Result<String> {
    let doc = Document::load_mem(data)?;
    let pages = document_blocks(&doc)?;

    let text = pages
        .iter()
        .map(|page| {
            page.blocks
                .iter()
                .map(|b| b.text.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    Ok(clean_text(&text))
}

/// Drop NUL characters and trailing whitespace, collapse runs of blank lines
fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;

    for line in text.replace('\0', "").lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }

    out.trim().to_string()
}
