//! Response types for processed documents

use serde::{Deserialize, Serialize};

/// Result of language detection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageDetection {
    /// e.g. "Japanese (ja)"
    pub detected_language: Option<String>,
    /// 0.0-1.0 as reported by the model
    pub confidence: Option<f64>,
}

/// A generated file, or the reason it could not be generated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputFile {
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OutputFile {
    pub fn ready(label: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            filename: Some(filename.into()),
            error: None,
        }
    }

    pub fn failed(label: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            filename: None,
            error: Some(error.into()),
        }
    }
}

/// Everything the result page shows
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessResponse {
    pub detected_language: Option<String>,
    pub confidence: Option<f64>,
    /// Summary text (or the failure message) when a summary was requested
    pub summary: Option<String>,
    pub files: Vec<OutputFile>,
    pub processing_time_ms: u64,
}

impl ProcessResponse {
    /// Language for display
    pub fn language_display(&self) -> &str {
        self.detected_language.as_deref().unwrap_or("Unknown")
    }

    /// Confidence for display
    pub fn confidence_display(&self) -> String {
        match self.confidence {
            Some(c) => format!("{}", c),
            None => "N/A".to_string(),
        }
    }
}
