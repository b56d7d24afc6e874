//! Flat directory of generated files

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Reduce an uploaded filename to a safe single path component
///
/// Keeps the last component, turns whitespace into `_`, drops characters
/// outside `[A-Za-z0-9_.-]` and strips leading/trailing `.` and `_`.
/// Returns `None` when nothing is left.
pub fn secure_filename(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next().unwrap_or(name);

    let cleaned: String = last
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '_');

    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Directory where outputs are written and served from
#[derive(Debug, Clone)]
pub struct OutputStore {
    root: PathBuf,
}

impl OutputStore {
    /// Open the directory, creating it if needed
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        tracing::debug!("Output directory: {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `name` inside the directory; names that could escape it are rejected
    fn path_for(&self, name: &str) -> Result<PathBuf> {
        let invalid = name.is_empty()
            || name.contains(['/', '\\', '\0'])
            || name == "."
            || name.contains("..");
        if invalid {
            return Err(Error::NotFound(name.to_string()));
        }
        Ok(self.root.join(name))
    }

    /// Write (or overwrite) a file
    pub async fn save(&self, name: &str, data: &[u8]) -> Result<()> {
        let path = self.path_for(name)?;
        tokio::fs::write(&path, data).await?;
        tracing::info!("Saved {} ({} bytes)", path.display(), data.len());
        Ok(())
    }

    /// Read a file previously saved
    pub async fn load(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path_for(name)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::NotFound(name.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_secure_filename() {
        assert_eq!(secure_filename("My Invoice 2024.pdf").as_deref(), Some("My_Invoice_2024.pdf"));
        assert_eq!(secure_filename("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(secure_filename("C:\\Users\\x\\scan.pdf").as_deref(), Some("scan.pdf"));
        assert_eq!(secure_filename(".hidden.pdf").as_deref(), Some("hidden.pdf"));
        assert_eq!(secure_filename("請求書.pdf").as_deref(), Some("pdf"));
        assert_eq!(secure_filename("../..").as_deref(), None);
        assert_eq!(secure_filename("").as_deref(), None);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = OutputStore::new(dir.path().join("outputs")).unwrap();
        assert!(store.root().is_dir());

        store.save("a_output.json", b"{}").await.unwrap();
        assert_eq!(store.load("a_output.json").await.unwrap(), b"{}");
    }

    #[tokio::test]
    async fn test_missing_and_escaping_names() {
        let dir = TempDir::new().unwrap();
        let store = OutputStore::new(dir.path()).unwrap();

        assert!(matches!(store.load("nope.pdf").await, Err(Error::NotFound(_))));
        assert!(matches!(store.load("../secret").await, Err(Error::NotFound(_))));
        assert!(matches!(store.load("..").await, Err(Error::NotFound(_))));
        assert!(store.save("sub/x.txt", b"x").await.is_err());
    }
}
