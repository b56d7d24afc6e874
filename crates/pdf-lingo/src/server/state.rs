//! Application state for the translation server

use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::Result;
use crate::processing::DocumentProcessor;
use crate::providers::{GeminiClient, LlmProvider};
use crate::storage::OutputStore;
use crate::types::LanguageCatalog;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    processor: DocumentProcessor,
    languages: LanguageCatalog,
}

impl AppState {
    /// Create state backed by Gemini
    pub fn new(config: AppConfig) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        let llm = Arc::new(GeminiClient::new(&config.llm, api_key)?);
        tracing::info!("Gemini client initialized (model {})", config.llm.model);
        Self::with_provider(config, llm)
    }

    /// Create state around any LLM provider
    pub fn with_provider(config: AppConfig, llm: Arc<dyn LlmProvider>) -> Result<Self> {
        let store = OutputStore::new(&config.storage.output_dir)?;
        let languages = LanguageCatalog::load_or_default(&config.storage.languages_path);
        tracing::info!(
            "Loaded {} target languages, writing outputs to {}",
            languages.len(),
            store.root().display()
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                processor: DocumentProcessor::new(llm, store),
                languages,
            }),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn processor(&self) -> &DocumentProcessor {
        &self.inner.processor
    }

    pub fn store(&self) -> &OutputStore {
        self.inner.processor.store()
    }

    pub fn languages(&self) -> &LanguageCatalog {
        &self.inner.languages
    }
}
