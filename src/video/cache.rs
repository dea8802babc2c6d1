//! Durable memoization of the video analysis, keyed by the video's file name.
//!
//! Entries are never invalidated automatically; deleting the file (or `ingest --reset`)
//! is the only way to force a fresh analysis. This fits a fixed, tiny corpus and is not
//! a general-purpose cache.

use super::VideoAnalysis;
use crate::error::Result;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::info;

/// Cache of video analyses on disk.
#[derive(Debug, Clone)]
pub struct SummaryCache {
    cache_dir: PathBuf,
}

impl SummaryCache {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    /// Where the entry for `video` lives: `<cache_dir>/<file name>.summary.json`.
    pub fn entry_path(&self, video: &Path) -> PathBuf {
        let name = video
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        self.cache_dir.join(format!("{}.summary.json", name))
    }

    /// Return the cached analysis for `video`, or run `compute` and cache its result.
    ///
    /// `compute` yields the raw model output; it is validated before anything is
    /// written, so malformed output never reaches the cache.
    pub async fn get_or_compute<F, Fut>(&self, video: &Path, compute: F) -> Result<VideoAnalysis>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>>,
    {
        let path = self.entry_path(video);

        if path.exists() {
            info!("Found cached summary at '{}'", path.display());
            let content = std::fs::read_to_string(&path)?;
            let analysis: VideoAnalysis = serde_json::from_str(&content)?;
            return Ok(analysis);
        }

        info!("No cached summary for '{}', analyzing video", video.display());
        let raw = compute().await?;
        let analysis = VideoAnalysis::from_model_output(&raw)?;

        std::fs::create_dir_all(&self.cache_dir)?;
        std::fs::write(&path, serde_json::to_string_pretty(&analysis)?)?;
        info!("Saved new summary to cache at '{}'", path.display());

        Ok(analysis)
    }

    /// Delete the entry for `video`. Returns whether a file was removed.
    pub fn remove(&self, video: &Path) -> Result<bool> {
        match std::fs::remove_file(self.entry_path(video)) {
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
    use std::sync::atomic::{AtomicUsize, Ordering};

    const OUTPUT: &str = r#"{"summary": "A pour-over demo.", "actions": [{"action": "Grind 20g of beans", "timestamp": 8.0}]}"#;

    #[test]
    fn test_entry_path_uses_base_name() {
        let cache = SummaryCache::new("/tmp/howie-cache");
        assert_eq!(
            cache.entry_path(Path::new("data/media/steves-pour-over-method.mp4")),
            PathBuf::from("/tmp/howie-cache/steves-pour-over-method.mp4.summary.json")
        );
    }

    #[tokio::test]
    async fn test_compute_runs_at_most_once() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SummaryCache::new(dir.path().join("cache"));
        let calls = AtomicUsize::new(0);
        let video = Path::new("video.mp4");

        let first = cache
            .get_or_compute(video, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(OUTPUT.to_string())
            })
            .await
            .unwrap();
        let second = cache
            .get_or_compute(video, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(OUTPUT.to_string())
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, second);
        assert_eq!(first.actions[0].action, "Grind 20g of beans");
    }

    #[tokio::test]
    async fn test_cache_file_matches_schema() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SummaryCache::new(dir.path());
        let video = Path::new("clip.mp4");
        cache
            .get_or_compute(video, || async { Ok(OUTPUT.to_string()) })
            .await
            .unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(cache.entry_path(video)).unwrap())
                .unwrap();
        let keys: Vec<&String> = written.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 2);
        assert!(written["summary"].is_string());
        assert_eq!(written["actions"][0]["timestamp"], 8.0);
    }

    #[tokio::test]
    async fn test_invalid_output_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SummaryCache::new(dir.path());
        let video = Path::new("clip.mp4");

        let err = cache
            .get_or_compute(video, || async { Ok("{\"summary\": 3}".to_string()) })
            .await
            .unwrap_err();
        assert!(matches!(err, HowieError::SchemaValidation(_)));
        assert!(!cache.entry_path(video).exists());
    }

    #[tokio::test]
    async fn test_compute_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SummaryCache::new(dir.path());

        let err = cache
            .get_or_compute(Path::new("clip.mp4"), || async {
                Err(HowieError::ServiceUnavailable("model offline".to_string()))
            })
            .await
            .unwrap_err();
        assert!(err.is_service_unavailable());
    }

    #[tokio::test]
    async fn test_remove_forces_recompute() {
        let dir = tempfile::tempdir().unwrap();
        let cache = SummaryCache::new(dir.path());
        let video = Path::new("clip.mp4");
        cache
            .get_or_compute(video, || async { Ok(OUTPUT.to_string()) })
            .await
            .unwrap();

        assert!(cache.remove(video).unwrap());
        assert!(!cache.remove(video).unwrap());

        let calls = AtomicUsize::new(0);
        cache
            .get_or_compute(video, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(OUTPUT.to_string())
            })
            .await
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
