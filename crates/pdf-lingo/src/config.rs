//! Configuration for the translation service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "PDF_LINGO_CONFIG";

/// Config file looked up in the working directory
const LOCAL_CONFIG_FILE: &str = "pdf-lingo.toml";

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Gemini/LLM configuration
    pub llm: LlmConfig,
    /// Output and catalog locations
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Load configuration: file (if any), then environment overrides
    ///
    /// File lookup order: `$PDF_LINGO_CONFIG`, `./pdf-lingo.toml`,
    /// `<config dir>/pdf-lingo/config.toml`. Missing files fall back to defaults.
    pub fn load() -> Result<Self> {
        let mut config = match Self::locate_file() {
            Some(path) => {
                tracing::info!("Loading configuration from {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Parse TOML text; unspecified fields keep their defaults
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    fn locate_file() -> Option<PathBuf> {
        if let Ok(explicit) = std::env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(explicit));
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }

        dirs::config_dir()
            .map(|dir| dir.join("pdf-lingo").join("config.toml"))
            .filter(|path| path.exists())
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.trim().is_empty() {
                self.llm.api_key = Some(key);
            }
        }
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            self.llm.model = model;
        }
        if let Ok(host) = std::env::var("PDF_LINGO_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PDF_LINGO_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!("Ignoring invalid PDF_LINGO_PORT '{}'", port),
            }
        }
        if let Ok(dir) = std::env::var("PDF_LINGO_OUTPUT_DIR") {
            self.storage.output_dir = PathBuf::from(dir);
        }
        if let Ok(path) = std::env::var("PDF_LINGO_LANGUAGES") {
            self.storage.languages_path = PathBuf::from(path);
        }
    }

    /// The API key, or a configuration error if none was provided
    pub fn require_api_key(&self) -> Result<&str> {
        self.llm
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "GEMINI_API_KEY not found in environment variables or config file".to_string(),
                )
            })
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

/// Gemini configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key (usually taken from GEMINI_API_KEY)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// API base URL
    pub base_url: String,
    /// Generation model name
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Nucleus sampling
    pub top_p: f32,
    /// Top-k sampling
    pub top_k: u32,
    /// Output token cap
    pub max_output_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries for failed requests
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.0-flash-lite".to_string(),
            temperature: 0.3,  // Less creative, more factual
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,  // Long documents
            timeout_secs: 180,
            max_retries: 2,
        }
    }
}

/// Output directory and language catalog locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Flat directory for generated files
    pub output_dir: PathBuf,
    /// languages.json used to populate the target-language list
    pub languages_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
            languages_path: PathBuf::from("languages.json"),
        }
    }
}
