//! pdf-lingo: PDF translation service backed by Gemini
//!
//! Upload a PDF and get back the detected source language plus any of:
//! a structured JSON extraction with a full translation, a translated PDF
//! that keeps the original page layout, and a summary as text or PDF.

pub mod config;
pub mod error;
pub mod generation;
pub mod pdf;
pub mod processing;
pub mod providers;
pub mod server;
pub mod storage;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use processing::DocumentProcessor;
pub use providers::{GeminiClient, LlmProvider};
pub use server::Server;
pub use storage::OutputStore;
pub use types::{
    LanguageCatalog, OutputFile, OutputKind, ProcessRequest, ProcessResponse, SummaryFormat,
    UploadedPdf,
};
