//! Target-language catalog shown on the upload form

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};

/// A selectable target language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    /// ISO 639-1 code
    pub code: String,
    /// Display name, also sent to the model as the target language
    pub name: String,
}

/// Accepted shapes of languages.json
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    List(Vec<Language>),
    Map(BTreeMap<String, String>),
}

/// Ordered list of target languages
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct LanguageCatalog {
    languages: Vec<Language>,
}

impl LanguageCatalog {
    /// Parse `[{"code","name"}]` or `{"code": "name"}`
    pub fn from_json(raw: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(raw)?;
        let languages = match file {
            CatalogFile::List(list) => list,
            CatalogFile::Map(map) => map
                .into_iter()
                .map(|(code, name)| Language { code, name })
                .collect(),
        };

        if languages.is_empty() {
            return Err(Error::Config("languages catalog is empty".to_string()));
        }

        Ok(Self { languages })
    }

    /// Load from disk, falling back to the built-in list
    pub fn load_or_default(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(raw) => match Self::from_json(&raw) {
                Ok(catalog) => {
                    tracing::info!("Loaded {} languages from {}", catalog.len(), path.display());
                    catalog
                }
                Err(e) => {
                    tracing::warn!("Invalid {}: {}, using built-in languages", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!("{} not found, using built-in languages", path.display());
                Self::default()
            }
        }
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

impl Default for LanguageCatalog {
    fn default() -> Self {
        let builtin = [
            ("en", "English"),
            ("ja", "Japanese"),
            ("zh", "Chinese"),
            ("ko", "Korean"),
            ("fr", "French"),
            ("de", "German"),
            ("es", "Spanish"),
            ("pt", "Portuguese"),
            ("it", "Italian"),
            ("ru", "Russian"),
            ("ar", "Arabic"),
            ("hi", "Hindi"),
            ("vi", "Vietnamese"),
            ("th", "Thai"),
            ("id", "Indonesian"),
        ];

        Self {
            languages: builtin
                .iter()
                .map(|(code, name)| Language {
                    code: code.to_string(),
                    name: name.to_string(),
                })
                .collect(),
        }
    }
}
