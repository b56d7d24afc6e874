//! Processing request types

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Target language used when the form does not name one
pub const DEFAULT_TARGET_LANGUAGE: &str = "en";

/// Output the caller can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// Structured JSON extraction with full translation
    Json,
    /// Layout-preserving translated PDF
    Pdf,
    /// Summary text
    Summary,
}

impl OutputKind {
    /// Parse a form checkbox value
    pub fn from_form_value(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pdf" => Some(Self::Pdf),
            "summary" => Some(Self::Summary),
            _ => None,
        }
    }

    /// Label shown next to the generated file
    pub fn label(&self) -> &'static str {
        match self {
            Self::Json => "JSON Output",
            Self::Pdf => "Translated PDF",
            Self::Summary => "Summary",
        }
    }
}

/// File format for the summary output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryFormat {
    Txt,
    Pdf,
}

impl SummaryFormat {
    /// Parse a form value; unknown values produce no summary file
    pub fn from_form_value(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "txt" => Some(Self::Txt),
            "pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Pdf => "pdf",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Txt => "Summary (TXT)",
            Self::Pdf => "Summary (PDF)",
        }
    }
}

/// Per-output prompt overrides
///
/// Templates may contain `{text}` and `{target_language}` placeholders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomInstructions {
    pub json: Option<String>,
    pub pdf: Option<String>,
    pub summary: Option<String>,
}

impl CustomInstructions {
    /// Blank instructions count as absent
    pub fn normalize(value: String) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// Options selected on the upload form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRequest {
    /// Language to translate/summarize into
    pub target_language: String,
    /// Requested outputs, in form order without duplicates
    pub outputs: Vec<OutputKind>,
    /// Prompt overrides
    pub custom: CustomInstructions,
    /// Summary file format (None = no summary file)
    pub summary_format: Option<SummaryFormat>,
}

impl Default for ProcessRequest {
    fn default() -> Self {
        Self {
            target_language: DEFAULT_TARGET_LANGUAGE.to_string(),
            outputs: Vec::new(),
            custom: CustomInstructions::default(),
            summary_format: Some(SummaryFormat::Txt),
        }
    }
}

impl ProcessRequest {
    /// Whether an output was selected
    pub fn wants(&self, kind: OutputKind) -> bool {
        self.outputs.contains(&kind)
    }

    /// Add an output unless already present
    pub fn select(&mut self, kind: OutputKind) {
        if !self.wants(kind) {
            self.outputs.push(kind);
        }
    }
}

/// An uploaded PDF held in memory
#[derive(Debug, Clone)]
pub struct UploadedPdf {
    /// Sanitized filename
    pub filename: String,
    /// Raw bytes
    pub data: Bytes,
}

impl UploadedPdf {
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }

    /// Filename without extension, used to name outputs
    pub fn stem(&self) -> &str {
        Path::new(&self.filename)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_kind_parsing() {
        assert_eq!(OutputKind::from_form_value("json"), Some(OutputKind::Json));
        assert_eq!(OutputKind::from_form_value(" PDF "), Some(OutputKind::Pdf));
        assert_eq!(OutputKind::from_form_value("summary"), Some(OutputKind::Summary));
        assert_eq!(OutputKind::from_form_value("docx"), None);
    }

    #[test]
    fn test_summary_format_parsing() {
        assert_eq!(SummaryFormat::from_form_value("txt"), Some(SummaryFormat::Txt));
        assert_eq!(SummaryFormat::from_form_value("pdf"), Some(SummaryFormat::Pdf));
        assert_eq!(SummaryFormat::from_form_value("md"), None);
    }

    #[test]
    fn test_select_dedups() {
        let mut request = ProcessRequest::default();
        request.select(OutputKind::Pdf);
        request.select(OutputKind::Json);
        request.select(OutputKind::Pdf);
        assert_eq!(request.outputs, vec![OutputKind::Pdf, OutputKind::Json]);
        assert!(request.wants(OutputKind::Json));
        assert!(!request.wants(OutputKind::Summary));
    }

    #[test]
    fn test_stem() {
        assert_eq!(UploadedPdf::new("invoice_2024.pdf", Vec::new()).stem(), "invoice_2024");
        assert_eq!(UploadedPdf::new("archive.tar.pdf", Vec::new()).stem(), "archive.tar");
    }

    #[test]
    fn test_blank_instructions_are_absent() {
        assert_eq!(CustomInstructions::normalize("   \n".to_string()), None);
        assert_eq!(
            CustomInstructions::normalize(" Translate {text} ".to_string()).as_deref(),
            Some("Translate {text}")
        );
    }
}
