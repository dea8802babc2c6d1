//! Ingestion manifest: the fingerprints of the corpus as it was last ingested.
//!
//! The manifest is the only state that decides whether ingestion runs. It is absent
//! until the first successful ingestion and is replaced wholesale after every
//! successful ingestion.

use crate::error::Result;
use crate::fingerprint::FingerprintMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Persisted fingerprint map.
#[derive(Debug, Clone)]
pub struct IngestionManifest {
    path: PathBuf,
}

impl IngestionManifest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the last saved map, or `None` if nothing was ever saved.
    pub fn load(&self) -> Result<Option<FingerprintMap>> {
        if !self.path.exists() {
            info!("Manifest file not found at {}", self.path.display());
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let map: FingerprintMap = serde_json::from_str(&content)?;
        Ok(Some(map))
    }

    /// Replace the persisted manifest with `map`.
    ///
    /// Written to a sibling temp file and renamed into place, so readers see either the
    /// old manifest or the new one.
    pub fn save(&self, map: &FingerprintMap) -> Result<()> {
        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        let content = serde_json::to_string_pretty(map)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!("Saved manifest with {} entries to {}", map.len(), self.path.display());
        Ok(())
    }

    /// Delete the manifest. Returns whether a file was removed.
    pub fn remove(&self) -> Result<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Whole-corpus staleness check: ingest when there is no previous manifest or when
/// any entry was added, removed or changed.
pub fn needs_ingestion(previous: Option<&FingerprintMap>, fresh: &FingerprintMap) -> bool {
    match previous {
        None => true,
        Some(previous) => previous != fresh,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HowieError;

    fn sample() -> FingerprintMap {
        let mut map = FingerprintMap::new();
        map.insert("video.mp4".to_string(), "abc123".to_string());
        map.insert("manual.pdf".to_string(), "def456".to_string());
        map
    }

    #[test]
    fn test_load_missing_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = IngestionManifest::new(dir.path().join("ingestion_manifest.json"));
        assert!(manifest.load().unwrap().is_none());
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = IngestionManifest::new(dir.path().join("cache").join("m.json"));
        manifest.save(&sample()).unwrap();
        assert_eq!(manifest.load().unwrap(), Some(sample()));
    }

    #[test]
    fn test_saved_file_is_two_space_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = IngestionManifest::new(dir.path().join("m.json"));
        manifest.save(&sample()).unwrap();

        let text = std::fs::read_to_string(manifest.path()).unwrap();
        assert_eq!(
            text,
            "{\n  \"manual.pdf\": \"def456\",\n  \"video.mp4\": \"abc123\"\n}"
        );
    }

    #[test]
    fn test_save_fully_replaces_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = IngestionManifest::new(dir.path().join("m.json"));
        manifest.save(&sample()).unwrap();

        let mut smaller = FingerprintMap::new();
        smaller.insert("manual.pdf".to_string(), "ghi789".to_string());
        manifest.save(&smaller).unwrap();

        assert_eq!(manifest.load().unwrap(), Some(smaller));
    }

    #[test]
    fn test_malformed_manifest_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = IngestionManifest::new(&path).load().unwrap_err();
        assert!(matches!(err, HowieError::Parse(_)));

        std::fs::write(&path, "[\"a\", \"b\"]").unwrap();
        let err = IngestionManifest::new(&path).load().unwrap_err();
        assert!(matches!(err, HowieError::Parse(_)));
    }

    #[test]
    fn test_remove() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = IngestionManifest::new(dir.path().join("m.json"));
        assert!(!manifest.remove().unwrap());
        manifest.save(&sample()).unwrap();
        assert!(manifest.remove().unwrap());
        assert!(manifest.load().unwrap().is_none());
    }

    #[test]
    fn test_staleness_gate() {
        let saved = sample();
        assert!(needs_ingestion(None, &saved));
        assert!(!needs_ingestion(Some(&saved), &saved.clone()));

        let mut changed = saved.clone();
        changed.insert("manual.pdf".to_string(), "ghi789".to_string());
        assert!(needs_ingestion(Some(&saved), &changed));

        let mut added = saved.clone();
        added.insert("extra.txt".to_string(), "000".to_string());
        assert!(needs_ingestion(Some(&saved), &added));

        let mut removed = saved.clone();
        removed.remove("video.mp4");
        assert!(needs_ingestion(Some(&saved), &removed));
    }
}
