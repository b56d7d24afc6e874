//! Core types for the translation service

pub mod language;
pub mod query;
pub mod response;

pub use language::{Language, LanguageCatalog};
pub use query::{
    CustomInstructions, OutputKind, ProcessRequest, SummaryFormat, UploadedPdf,
    DEFAULT_TARGET_LANGUAGE,
};
pub use response::{LanguageDetection, OutputFile, ProcessResponse};
