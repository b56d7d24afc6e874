//! Request pipeline: extract, detect, then build each requested output

use std::sync::Arc;
use std::time::Instant;
use tokio::task::spawn_blocking;

use crate::error::{Error, Result};
use crate::generation::{detection_from_value, extract_json_object, parse_language_detection, PromptBuilder};
use crate::pdf::{
    extract_plain_text, extract_text_blocks, rebuild_with_translation, validate_pdf, PageLayout,
    PageReplacement, TextPdfWriter,
};
use crate::providers::LlmProvider;
use crate::storage::OutputStore;
use crate::types::{
    LanguageDetection, OutputFile, OutputKind, ProcessRequest, ProcessResponse, SummaryFormat,
    UploadedPdf,
};

use super::mapping::{assign_translated_lines, order_blocks, page_prompt_text};

const API_CALL_FAILED: &str = "API call failed";
const PROCESSING_FAILED: &str = "Processing failed";
const REBUILD_FAILED: &str = "PDF rebuild failed";
const SUMMARY_FAILED: &str = "Summary generation failed";

/// Margin of generated summary PDFs (A4)
const SUMMARY_MARGIN: f32 = 50.0;

/// Turns one uploaded PDF into the requested outputs
pub struct DocumentProcessor {
    llm: Arc<dyn LlmProvider>,
    store: OutputStore,
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    spawn_blocking(f)
        .await
        .map_err(|e| Error::internal(format!("Blocking task failed: {}", e)))?
}

impl DocumentProcessor {
    pub fn new(llm: Arc<dyn LlmProvider>, store: OutputStore) -> Self {
        Self { llm, store }
    }

    pub fn store(&self) -> &OutputStore {
        &self.store
    }

    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.llm
    }

    /// Run the whole pipeline for one upload
    ///
    /// Only an unreadable upload is an error; failures of individual outputs
    /// are reported in the returned file list.
    pub async fn process(&self, upload: &UploadedPdf, request: &ProcessRequest) -> Result<ProcessResponse> {
        let started = Instant::now();
        tracing::info!(
            "Processing {} ({} bytes) into {}, outputs {:?}",
            upload.filename,
            upload.data.len(),
            request.target_language,
            request.outputs
        );

        let filename = upload.filename.clone();
        let data = upload.data.clone();
        let text = blocking(move || {
            let pages = validate_pdf(&filename, &data)?;
            tracing::debug!("{} has {} pages", filename, pages);
            extract_plain_text(&data)
        })
        .await?;

        let detection = self.detect_language(&text).await;
        let mut response = ProcessResponse {
            detected_language: detection.detected_language,
            confidence: detection.confidence,
            ..ProcessResponse::default()
        };

        if request.wants(OutputKind::Json) {
            let file = self.json_output(&text, upload, request, &mut response).await;
            response.files.push(file);
        }

        if request.wants(OutputKind::Pdf) {
            let file = self.pdf_output(upload, request).await;
            response.files.push(file);
        }

        if request.wants(OutputKind::Summary) {
            self.summary_output(&text, upload, request, &mut response).await;
        }

        response.processing_time_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            "Processed {} in {}ms: {} files",
            upload.filename,
            response.processing_time_ms,
            response.files.len()
        );
        Ok(response)
    }

    /// Model reply, or None when the call failed or returned nothing
    async fn call(&self, prompt: &str) -> Option<String> {
        match self.llm.generate(prompt).await {
            Ok(reply) if !reply.trim().is_empty() => Some(reply),
            Ok(_) => {
                tracing::warn!("{} returned an empty reply", self.llm.name());
                None
            }
            Err(e) => {
                tracing::error!("{} API error: {}", self.llm.name(), e);
                None
            }
        }
    }

    async fn detect_language(&self, text: &str) -> LanguageDetection {
        if text.trim().is_empty() {
            return LanguageDetection::default();
        }

        let prompt = PromptBuilder::build_detect_language_prompt(text);
        let Some(reply) = self.call(&prompt).await else {
            return LanguageDetection::default();
        };

        match parse_language_detection(&reply) {
            Ok(detection) => detection,
            Err(e) => {
                tracing::error!("Language detection parse error: {}", e);
                LanguageDetection::default()
            }
        }
    }

    async fn json_output(
        &self,
        text: &str,
        upload: &UploadedPdf,
        request: &ProcessRequest,
        response: &mut ProcessResponse,
    ) -> OutputFile {
        let label = OutputKind::Json.label();
        let prompt = PromptBuilder::custom_or(
            request.custom.json.as_deref(),
            text,
            &request.target_language,
            PromptBuilder::build_json_prompt,
        );

        let Some(reply) = self.call(&prompt).await else {
            return OutputFile::failed(label, API_CALL_FAILED);
        };

        let value = match extract_json_object(&reply) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("JSON processing error: {}", e);
                return OutputFile::failed(label, PROCESSING_FAILED);
            }
        };

        if let Some(metadata) = value.get("metadata") {
            let from_metadata = detection_from_value(metadata);
            if from_metadata.detected_language.is_some() {
                response.detected_language = from_metadata.detected_language;
            }
            if from_metadata.confidence.is_some() {
                response.confidence = from_metadata.confidence;
            }
        }

        let name = format!("{}_output.json", upload.stem());
        let saved = match serde_json::to_vec_pretty(&value) {
            Ok(bytes) => self.store.save(&name, &bytes).await,
            Err(e) => Err(e.into()),
        };

        match saved {
            Ok(()) => OutputFile::ready(label, name),
            Err(e) => {
                tracing::error!("JSON processing error: {}", e);
                OutputFile::failed(label, PROCESSING_FAILED)
            }
        }
    }

    async fn pdf_output(&self, upload: &UploadedPdf, request: &ProcessRequest) -> OutputFile {
        let label = OutputKind::Pdf.label();
        match self.translated_pdf(upload, request).await {
            Ok(name) => OutputFile::ready(label, name),
            Err(e) => {
                tracing::error!("PDF rebuild error: {}", e);
                OutputFile::failed(label, REBUILD_FAILED)
            }
        }
    }

    async fn translated_pdf(&self, upload: &UploadedPdf, request: &ProcessRequest) -> Result<String> {
        let data = upload.data.clone();
        let pages = blocking(move || extract_text_blocks(&data)).await?;

        let mut replacements = Vec::with_capacity(pages.len());
        for page in pages {
            let blocks = order_blocks(page.blocks);
            if blocks.is_empty() {
                continue;
            }

            let page_text = page_prompt_text(&blocks);
            let prompt = PromptBuilder::custom_or(
                request.custom.pdf.as_deref(),
                &page_text,
                &request.target_language,
                PromptBuilder::build_translate_prompt,
            );
            let translated = self.call(&prompt).await;
            if translated.is_none() {
                tracing::warn!("Page {} keeps its original text", page.page_number);
            }

            replacements.push(PageReplacement {
                page_number: page.page_number,
                blocks: assign_translated_lines(&blocks, translated.as_deref()),
            });
        }

        let data = upload.data.clone();
        let rebuilt = blocking(move || rebuild_with_translation(&data, &replacements)).await?;

        let name = format!("{}_translated.pdf", upload.stem());
        self.store.save(&name, &rebuilt).await?;
        Ok(name)
    }

    async fn summary_output(
        &self,
        text: &str,
        upload: &UploadedPdf,
        request: &ProcessRequest,
        response: &mut ProcessResponse,
    ) {
        let prompt = PromptBuilder::custom_or(
            request.custom.summary.as_deref(),
            text,
            &request.target_language,
            PromptBuilder::build_summary_prompt,
        );

        let Some(summary) = self.call(&prompt).await else {
            response.summary = Some(SUMMARY_FAILED.to_string());
            return;
        };
        response.summary = Some(summary.clone());

        let Some(format) = request.summary_format else {
            tracing::debug!("No summary file format selected");
            return;
        };

        let name = format!("{}_summary.{}", upload.stem(), format.extension());
        let saved = match format {
            SummaryFormat::Txt => self.store.save(&name, summary.as_bytes()).await,
            SummaryFormat::Pdf => {
                let rendered = blocking(move || {
                    TextPdfWriter::new(PageLayout::a4(SUMMARY_MARGIN)).render(&summary)
                })
                .await;
                match rendered {
                    Ok(bytes) => self.store.save(&name, &bytes).await,
                    Err(e) => Err(e),
                }
            }
        };

        response.files.push(match saved {
            Ok(()) => OutputFile::ready(format.label(), name),
            Err(e) => {
                tracing::error!("Summary file error: {}", e);
                OutputFile::failed(format.label(), PROCESSING_FAILED)
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::pdf_with_pages;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Answers by prompt kind and records every prompt
    struct ScriptedLlm {
        detect: Option<&'static str>,
        json: Option<&'static str>,
        translate: Option<&'static str>,
        summary: Option<&'static str>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn new() -> Self {
            Self {
                detect: Some(r#"{"detected_language": "German (de)", "confidence": 0.97}"#),
                json: None,
                translate: None,
                summary: None,
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedLlm {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            let reply = if prompt.contains("detect its original language") {
                self.detect
            } else if prompt.contains("exact JSON format") {
                self.json
            } else if prompt.contains("professional document translator") {
                self.translate
            } else if prompt.contains("professional summarizer") {
                self.summary
            } else {
                Some("custom reply")
            };
            reply
                .map(str::to_string)
                .ok_or_else(|| Error::LlmStatus {
                    status: 500,
                    message: "scripted failure".to_string(),
                })
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted-1"
        }
    }

    fn sample_pdf() -> Vec<u8> {
        pdf_with_pages(&[
            b"BT /F1 12 Tf 72 700 Td (Rechnung) Tj ET BT /F1 12 Tf 72 600 Td (Betrag 100 EUR) Tj ET",
            b"",
        ])
    }

    fn processor(llm: ScriptedLlm) -> (DocumentProcessor, Arc<ScriptedLlm>, TempDir) {
        let dir = TempDir::new().unwrap();
        let llm = Arc::new(llm);
        let store = OutputStore::new(dir.path()).unwrap();
        (DocumentProcessor::new(llm.clone(), store), llm, dir)
    }

    fn request(outputs: &[OutputKind]) -> ProcessRequest {
        let mut request = ProcessRequest {
            target_language: "English".to_string(),
            ..ProcessRequest::default()
        };
        for kind in outputs {
            request.select(*kind);
        }
        request
    }

    #[tokio::test]
    async fn test_no_outputs_still_detects_language() {
        let (processor, llm, _dir) = processor(ScriptedLlm::new());
        let upload = UploadedPdf::new("rechnung.pdf", sample_pdf());

        let response = processor.process(&upload, &request(&[])).await.unwrap();

        assert!(response.files.is_empty());
        assert!(response.summary.is_none());
        assert_eq!(response.detected_language.as_deref(), Some("German (de)"));
        assert_eq!(response.confidence, Some(0.97));
        assert_eq!(llm.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_upload_is_rejected() {
        let (processor, llm, _dir) = processor(ScriptedLlm::new());
        let upload = UploadedPdf::new("fake.pdf", b"not a pdf".to_vec());

        let err = processor.process(&upload, &request(&[OutputKind::Json])).await.unwrap_err();
        assert!(matches!(err, Error::FileParse { .. }));
        assert!(llm.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_json_output_overrides_detection() {
        let mut llm = ScriptedLlm::new();
        llm.json = Some(
            "Here you go:\n```json\n{\"doc_type\": \"invoice\", \"metadata\": {\"detected_language\": \"de\", \"confidence\": \"0.99\"}, \"entities\": {\"Amount\": \"100 EUR\"}, \"full_translated_text\": \"Invoice\"}\n```",
        );
        let (processor, _llm, dir) = processor(llm);
        let upload = UploadedPdf::new("rechnung.pdf", sample_pdf());

        let response = processor.process(&upload, &request(&[OutputKind::Json])).await.unwrap();

        assert_eq!(response.files, vec![OutputFile::ready("JSON Output", "rechnung_output.json")]);
        assert_eq!(response.detected_language.as_deref(), Some("de"));
        assert_eq!(response.confidence, Some(0.99));

        let saved = std::fs::read_to_string(dir.path().join("rechnung_output.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&saved).unwrap();
        assert_eq!(value["entities"]["Amount"], "100 EUR");
        assert!(saved.contains("\n  \"doc_type\""));
    }

    #[tokio::test]
    async fn test_json_failures() {
        let (processor, _llm, _dir) = processor(ScriptedLlm::new());
        let upload = UploadedPdf::new("a.pdf", sample_pdf());
        let response = processor.process(&upload, &request(&[OutputKind::Json])).await.unwrap();
        assert_eq!(response.files, vec![OutputFile::failed("JSON Output", "API call failed")]);

        let mut llm = ScriptedLlm::new();
        llm.json = Some("I could not produce JSON for this one.");
        let (processor, _llm, _dir) = self::processor(llm);
        let response = processor.process(&upload, &request(&[OutputKind::Json])).await.unwrap();
        assert_eq!(response.files, vec![OutputFile::failed("JSON Output", "Processing failed")]);
        assert_eq!(response.detected_language.as_deref(), Some("German (de)"));
    }

    #[tokio::test]
    async fn test_translated_pdf() {
        let mut llm = ScriptedLlm::new();
        llm.translate = Some("Invoice\nAmount 100 EUR");
        let (processor, llm, dir) = processor(llm);
        let upload = UploadedPdf::new("rechnung.pdf", sample_pdf());

        let response = processor.process(&upload, &request(&[OutputKind::Pdf])).await.unwrap();
        assert_eq!(response.files, vec![OutputFile::ready("Translated PDF", "rechnung_translated.pdf")]);

        // The empty second page is never sent
        let translate_prompts: Vec<String> = llm
            .prompts()
            .into_iter()
            .filter(|p| p.contains("professional document translator"))
            .collect();
        assert_eq!(translate_prompts.len(), 1);
        assert!(translate_prompts[0].contains("Rechnung\nBetrag 100 EUR\n"));

        let rebuilt = std::fs::read(dir.path().join("rechnung_translated.pdf")).unwrap();
        let texts: Vec<String> = extract_text_blocks(&rebuilt)
            .unwrap()
            .into_iter()
            .flat_map(|p| p.blocks)
            .map(|b| b.text)
            .collect();
        assert_eq!(texts, vec!["Invoice", "Amount 100 EUR"]);
    }

    #[tokio::test]
    async fn test_translated_pdf_keeps_original_text_when_api_fails() {
        let (processor, _llm, dir) = processor(ScriptedLlm::new());
        let upload = UploadedPdf::new("rechnung.pdf", sample_pdf());

        let response = processor.process(&upload, &request(&[OutputKind::Pdf])).await.unwrap();
        assert_eq!(response.files[0].filename.as_deref(), Some("rechnung_translated.pdf"));

        let rebuilt = std::fs::read(dir.path().join("rechnung_translated.pdf")).unwrap();
        let texts: Vec<String> = extract_text_blocks(&rebuilt)
            .unwrap()
            .into_iter()
            .flat_map(|p| p.blocks)
            .map(|b| b.text)
            .collect();
        assert_eq!(texts, vec!["Rechnung", "Betrag 100 EUR"]);
    }

    #[tokio::test]
    async fn test_summary_formats() {
        let mut llm = ScriptedLlm::new();
        llm.summary = Some("An invoice over 100 EUR.");
        let (processor, _llm, dir) = processor(llm);
        let upload = UploadedPdf::new("rechnung.pdf", sample_pdf());

        let response = processor.process(&upload, &request(&[OutputKind::Summary])).await.unwrap();
        assert_eq!(response.summary.as_deref(), Some("An invoice over 100 EUR."));
        assert_eq!(response.files, vec![OutputFile::ready("Summary (TXT)", "rechnung_summary.txt")]);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("rechnung_summary.txt")).unwrap(),
            "An invoice over 100 EUR."
        );

        let mut pdf_request = request(&[OutputKind::Summary]);
        pdf_request.summary_format = Some(SummaryFormat::Pdf);
        let response = processor.process(&upload, &pdf_request).await.unwrap();
        assert_eq!(response.files, vec![OutputFile::ready("Summary (PDF)", "rechnung_summary.pdf")]);
        let pdf = std::fs::read(dir.path().join("rechnung_summary.pdf")).unwrap();
        let pages = extract_text_blocks(&pdf).unwrap();
        assert_eq!(pages[0].blocks[0].text, "An invoice over 100 EUR.");

        let mut no_file = request(&[OutputKind::Summary]);
        no_file.summary_format = None;
        let response = processor.process(&upload, &no_file).await.unwrap();
        assert!(response.files.is_empty());
        assert!(response.summary.is_some());
    }

    #[tokio::test]
    async fn test_summary_failure_and_custom_prompt() {
        let (processor, llm, _dir) = processor(ScriptedLlm::new());
        let upload = UploadedPdf::new("rechnung.pdf", sample_pdf());

        let response = processor.process(&upload, &request(&[OutputKind::Summary])).await.unwrap();
        assert_eq!(response.summary.as_deref(), Some("Summary generation failed"));
        assert!(response.files.is_empty());

        let mut custom = request(&[OutputKind::Summary]);
        custom.custom.summary = Some("Three bullet points in {target_language}: {text}".to_string());
        let response = processor.process(&upload, &custom).await.unwrap();
        assert_eq!(response.summary.as_deref(), Some("custom reply"));
        assert!(llm
            .prompts()
            .iter()
            .any(|p| p.starts_with("Three bullet points in English: ") && p.contains("Rechnung")));
    }
}
