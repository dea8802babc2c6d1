//! Local JSON copy of every ingested source document, keyed by id.

use crate::corpus::SourceDocument;
use crate::error::Result;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Documents persisted alongside the vector index.
#[derive(Debug)]
pub struct DocumentStore {
    path: PathBuf,
    documents: BTreeMap<String, SourceDocument>,
}

impl DocumentStore {
    /// An empty store that will be written to `path`. The existing file is not read.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            documents: BTreeMap::new(),
        }
    }

    /// Load the store at `path`; a missing file gives an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let documents = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            BTreeMap::new()
        };
        debug!("Loaded {} documents from {}", documents.len(), path.display());
        Ok(Self { path, documents })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Add documents, replacing any with the same id.
    pub fn add_documents(&mut self, docs: &[SourceDocument]) {
        for doc in docs {
            self.documents.insert(doc.id.clone(), doc.clone());
        }
    }

    pub fn clear(&mut self) {
        self.documents.clear();
    }

    /// Write the store to disk as pretty JSON.
    pub fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&self.documents)?)?;
        info!("Persisted {} documents to {}", self.documents.len(), self.path.display());
        Ok(())
    }

    /// Empty the store and delete its file. Returns whether a file was removed.
    pub fn remove(&mut self) -> Result<bool> {
        self.documents.clear();
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HowieError;
    use serde_json::json;

    fn doc(id: &str, text: &str) -> SourceDocument {
        SourceDocument::new(id, text, json!({ "source": "video_summary" }))
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::load(dir.path().join("docstore.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_persist_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache").join("docstore.json");

        let mut store = DocumentStore::new(&path);
        store.add_documents(&[doc("a", "first"), doc("b", "second")]);
        store.add_documents(&[doc("a", "replaced")]);
        store.persist().unwrap();

        let reloaded = DocumentStore::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["a"]["text"], "replaced");
    }

    #[test]
    fn test_malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docstore.json");
        std::fs::write(&path, "[]").unwrap();
        assert!(matches!(DocumentStore::load(&path).unwrap_err(), HowieError::Parse(_)));
    }

    #[test]
    fn test_remove_does_not_read_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docstore.json");
        std::fs::write(&path, "{ truncated").unwrap();

        let mut store = DocumentStore::new(&path);
        assert!(store.is_empty());
        assert!(store.remove().unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = DocumentStore::new(dir.path().join("docstore.json"));
        assert!(!store.remove().unwrap());

        store.add_documents(&[doc("a", "x")]);
        store.persist().unwrap();
        assert!(store.remove().unwrap());
        assert!(store.is_empty());
        assert!(!store.path().exists());
    }
}
