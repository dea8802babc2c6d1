//! Ingestion pipeline for Howie.
//!
//! Coordinates fingerprinting, the staleness check, video analysis, manual chunking,
//! embedding and indexing.

use crate::chunking::SentenceSplitter;
use crate::config::{Prompts, Settings};
use crate::corpus::{pdf_documents, video_documents, SourceDocument};
use crate::docstore::DocumentStore;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{HowieError, Result};
use crate::fingerprint::fingerprint_sources;
use crate::manifest::{needs_ingestion, IngestionManifest};
use crate::reader::reader_for;
use crate::vector_store::{open_vector_store, IndexedNode, VectorStore};
use crate::video::{OpenAIVideoAnalyzer, SummaryCache, VideoAnalyzer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// What `ensure_corpus_ingested` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The manifest matched the sources; nothing was touched.
    Skipped,
    /// The corpus was rebuilt from scratch.
    Ingested { documents: usize },
}

/// The main orchestrator for the Howie ingestion pipeline.
pub struct Orchestrator {
    settings: Settings,
    analyzer: Arc<dyn VideoAnalyzer>,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
    splitter: SentenceSplitter,
    manifest: IngestionManifest,
    summary_cache: SummaryCache,
    docstore: DocumentStore,
}

impl Orchestrator {
    /// Create an orchestrator backed by OpenAI and the configured index.
    pub fn new(settings: Settings, prompts: Prompts) -> Result<Self> {
        let analyzer = Arc::new(OpenAIVideoAnalyzer::new(&settings, prompts)?);

        let embedder = Arc::new(
            OpenAIEmbedder::with_config(
                &settings.llm.embedding_model_name,
                settings.llm.embedding_dimensions as usize,
                Duration::from_secs(settings.llm.request_timeout_seconds),
            )?
            .with_batch_size(settings.vector_store.insert_batch_size),
        );

        let vector_store = open_vector_store(&settings)?;

        Self::with_components(settings, analyzer, embedder, vector_store)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        analyzer: Arc<dyn VideoAnalyzer>,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        let splitter = SentenceSplitter::new(
            settings.rag_tuning.chunk_size,
            settings.rag_tuning.chunk_overlap,
        )?;
        let manifest = IngestionManifest::new(settings.manifest_path());
        let summary_cache = SummaryCache::new(settings.cache_dir());
        let docstore = DocumentStore::new(settings.docstore_path());

        Ok(Self {
            settings,
            analyzer,
            embedder,
            vector_store,
            splitter,
            manifest,
            summary_cache,
            docstore,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Ingest the corpus unless the manifest shows it is already current.
    ///
    /// The manifest is written last, so a failed run leaves the previous one in place
    /// and the next run tries again.
    #[instrument(skip(self))]
    pub async fn ensure_corpus_ingested(&mut self) -> Result<IngestOutcome> {
        let fresh = fingerprint_sources(&self.settings.tracked_sources())?;

        let previous = self.manifest.load()?;
        if previous.is_some() {
            info!("Manifest file found, checking for changes");
        }

        if !needs_ingestion(previous.as_ref(), &fresh) {
            info!("Data is up to date, skipping ingestion");
            return Ok(IngestOutcome::Skipped);
        }

        info!("Changes detected or first run, ingesting corpus");
        let documents = self.parse_documents().await?;
        let indexed = self.index_documents(&documents).await?;

        self.docstore.clear();
        self.docstore.add_documents(&documents);
        self.docstore.persist()?;

        self.manifest.save(&fresh)?;
        info!("Ingestion complete, manifest updated with {} sources", fresh.len());

        Ok(IngestOutcome::Ingested { documents: indexed })
    }

    /// Build the source documents for the video and the manual.
    #[instrument(skip(self))]
    pub async fn parse_documents(&self) -> Result<Vec<SourceDocument>> {
        let video = self.settings.video_path();
        let analysis = self
            .summary_cache
            .get_or_compute(&video, || self.analyzer.analyze(&video))
            .await?;
        let mut documents = video_documents(&self.settings.data_sources.video_src_path, &analysis);
        info!(
            "Video analysis has {} key actions",
            analysis.actions.len()
        );

        let pdf = self.settings.pdf_path();
        let text = reader_for(&pdf).read_text(&pdf)?;
        let pdf_docs = pdf_documents(&self.settings.data_sources.pdf_src_path, &text, &self.splitter);
        if pdf_docs.is_empty() {
            warn!("No text extracted from {}", pdf.display());
        }
        info!("Split manual into {} chunks", pdf_docs.len());
        documents.extend(pdf_docs);

        Ok(documents)
    }

    /// Replace the index contents with `documents`, embedding them batch by batch.
    #[instrument(skip_all, fields(count = documents.len()))]
    pub async fn index_documents(&self, documents: &[SourceDocument]) -> Result<usize> {
        let cleared = self.vector_store.clear().await?;
        if cleared > 0 {
            info!("Removed {} stale nodes from the index", cleared);
        }

        let mut indexed = 0;
        for batch in documents.chunks(self.settings.vector_store.insert_batch_size) {
            let texts: Vec<String> = batch.iter().map(|d| d.text.clone()).collect();
            let embeddings = self.embedder.embed_batch(&texts).await?;
            if embeddings.len() != batch.len() {
                return Err(HowieError::ServiceUnavailable(format!(
                    "embedder returned {} vectors for {} documents",
                    embeddings.len(),
                    batch.len()
                )));
            }
            let expected = self.embedder.dimensions();
            if let Some(bad) = embeddings.iter().find(|e| e.len() != expected) {
                return Err(HowieError::ServiceUnavailable(format!(
                    "embedder returned a {}-dimensional vector, expected {}",
                    bad.len(),
                    expected
                )));
            }

            let nodes: Vec<IndexedNode> = batch
                .iter()
                .cloned()
                .zip(embeddings)
                .map(|(doc, embedding)| IndexedNode::new(doc, embedding))
                .collect();
            indexed += self.vector_store.upsert_batch(&nodes).await?;
        }

        info!("Indexed {} documents", indexed);
        Ok(indexed)
    }

    /// Drop all local state and empty the index, forcing a full ingestion next time.
    #[instrument(skip(self))]
    pub async fn reset(&mut self) -> Result<()> {
        match self.docstore.remove() {
            Ok(true) => info!("Deleted docstore at {}", self.docstore.path().display()),
            Ok(false) => {}
            Err(e) => warn!("Failed to delete docstore: {}", e),
        }

        let video = self.settings.video_path();
        match self.summary_cache.remove(&video) {
            Ok(true) => info!(
                "Deleted video summary cache at {}",
                self.summary_cache.entry_path(&video).display()
            ),
            Ok(false) => {}
            Err(e) => warn!("Failed to delete video summary cache: {}", e),
        }

        match self.manifest.remove() {
            Ok(true) => info!("Deleted manifest at {}", self.manifest.path().display()),
            Ok(false) => {}
            Err(e) => warn!("Failed to delete manifest: {}", e),
        }

        let removed = self.vector_store.clear().await?;
        info!("Reset vector index ({} nodes removed)", removed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::{MemoryVectorStore, SqliteVectorStore};
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    const ANALYSIS: &str = r#"{"summary": "Steve's pour-over method.", "actions": [
        {"action": "Rinse the filter", "timestamp": 4.0},
        {"action": "Pour in slow circles", "timestamp": 73.5}
    ]}"#;

    struct FakeAnalyzer {
        calls: AtomicUsize,
        output: Mutex<String>,
    }

    impl FakeAnalyzer {
        fn new(output: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                output: Mutex::new(output.to_string()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl VideoAnalyzer for FakeAnalyzer {
        async fn analyze(&self, _video: &Path) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.output.lock().unwrap().clone())
        }
    }

    #[derive(Default)]
    struct FakeEmbedder {
        offline: AtomicBool,
        wrong_width: AtomicBool,
    }

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(self.embed_batch(&[text.to_string()]).await?.remove(0))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if self.offline.load(Ordering::SeqCst) {
                return Err(HowieError::ServiceUnavailable("embeddings offline".to_string()));
            }
            if self.wrong_width.load(Ordering::SeqCst) {
                return Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0, 0.0]).collect());
            }
            Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
        }

        fn dimensions(&self) -> usize {
            2
        }
    }

    struct Fixture {
        dir: TempDir,
        settings: Settings,
        analyzer: Arc<FakeAnalyzer>,
        embedder: Arc<FakeEmbedder>,
        store: Arc<MemoryVectorStore>,
    }

    impl Fixture {
        fn new(analysis: &str) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let video = dir.path().join("pour-over.mp4");
            let manual = dir.path().join("manual.txt");
            std::fs::write(&video, b"not really a video").unwrap();
            std::fs::write(
                &manual,
                "Fill the reservoir with cold water. Place the carafe on the plate. \
                 Press the brew button once.",
            )
            .unwrap();

            let mut settings = Settings::default();
            settings.general.cache_dir = dir.path().join("cache").display().to_string();
            settings.data_sources.video_src_path = video.display().to_string();
            settings.data_sources.pdf_src_path = manual.display().to_string();
            settings.vector_store.insert_batch_size = 2;
            settings.rag_tuning.chunk_size = 8;
            settings.rag_tuning.chunk_overlap = 2;

            Self {
                dir,
                settings,
                analyzer: FakeAnalyzer::new(analysis),
                embedder: Arc::new(FakeEmbedder::default()),
                store: Arc::new(MemoryVectorStore::new()),
            }
        }

        fn orchestrator(&self) -> Orchestrator {
            self.orchestrator_with(self.store.clone())
        }

        fn orchestrator_with(&self, store: Arc<dyn VectorStore>) -> Orchestrator {
            Orchestrator::with_components(
                self.settings.clone(),
                self.analyzer.clone(),
                self.embedder.clone(),
                store,
            )
            .unwrap()
        }

        fn manifest(&self) -> IngestionManifest {
            IngestionManifest::new(self.settings.manifest_path())
        }

        fn cache_entry(&self) -> std::path::PathBuf {
            SummaryCache::new(self.settings.cache_dir()).entry_path(&self.settings.video_path())
        }
    }

    #[tokio::test]
    async fn test_fresh_environment_ingests() {
        let fx = Fixture::new(ANALYSIS);
        let mut orchestrator = fx.orchestrator();

        let outcome = orchestrator.ensure_corpus_ingested().await.unwrap();

        // summary + 2 actions + 3 manual chunks
        assert_eq!(outcome, IngestOutcome::Ingested { documents: 6 });
        assert_eq!(fx.store.count().await.unwrap(), 6);
        assert_eq!(fx.analyzer.calls(), 1);

        let saved = fx.manifest().load().unwrap().unwrap();
        assert_eq!(saved, fingerprint_sources(&fx.settings.tracked_sources()).unwrap());
        assert!(fx.cache_entry().exists());
        assert_eq!(DocumentStore::load(fx.settings.docstore_path()).unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_unchanged_sources_skip_and_leave_manifest_untouched() {
        let fx = Fixture::new(ANALYSIS);
        fx.orchestrator().ensure_corpus_ingested().await.unwrap();

        // Rewrite the manifest in compact form; a skipped run must not reformat it.
        let saved = fx.manifest().load().unwrap().unwrap();
        let compact = serde_json::to_string(&saved).unwrap();
        std::fs::write(fx.settings.manifest_path(), &compact).unwrap();

        let outcome = fx.orchestrator().ensure_corpus_ingested().await.unwrap();

        assert_eq!(outcome, IngestOutcome::Skipped);
        assert_eq!(
            std::fs::read_to_string(fx.settings.manifest_path()).unwrap(),
            compact
        );
        assert_eq!(fx.analyzer.calls(), 1);
    }

    #[tokio::test]
    async fn test_edited_source_triggers_full_reingestion() {
        let fx = Fixture::new(ANALYSIS);
        let mut orchestrator = fx.orchestrator();
        orchestrator.ensure_corpus_ingested().await.unwrap();
        let before = fx.manifest().load().unwrap().unwrap();

        std::fs::write(fx.settings.pdf_path(), "Descale every month.").unwrap();
        let outcome = orchestrator.ensure_corpus_ingested().await.unwrap();

        assert_eq!(outcome, IngestOutcome::Ingested { documents: 4 });
        assert_eq!(fx.store.count().await.unwrap(), 4);

        let after = fx.manifest().load().unwrap().unwrap();
        let pdf_key = fx.settings.pdf_path().display().to_string();
        let video_key = fx.settings.video_path().display().to_string();
        assert_ne!(before[&pdf_key], after[&pdf_key]);
        assert_eq!(before[&video_key], after[&video_key]);

        // The video analysis comes from the cache the second time.
        assert_eq!(fx.analyzer.calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_analysis_writes_nothing() {
        let fx = Fixture::new(r#"{"summary": "missing actions"}"#);

        let err = fx.orchestrator().ensure_corpus_ingested().await.unwrap_err();

        assert!(matches!(err, HowieError::SchemaValidation(_)));
        assert!(!fx.settings.manifest_path().exists());
        assert!(!fx.cache_entry().exists());
        assert_eq!(fx.store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_embedding_failure_keeps_previous_manifest() {
        let fx = Fixture::new(ANALYSIS);
        let mut orchestrator = fx.orchestrator();
        orchestrator.ensure_corpus_ingested().await.unwrap();
        let before = fx.manifest().load().unwrap();

        std::fs::write(fx.settings.pdf_path(), "Changed manual.").unwrap();
        fx.embedder.offline.store(true, Ordering::SeqCst);

        let err = orchestrator.ensure_corpus_ingested().await.unwrap_err();
        assert!(err.is_service_unavailable());
        assert_eq!(fx.manifest().load().unwrap(), before);
    }

    #[tokio::test]
    async fn test_missing_source_is_io_error() {
        let fx = Fixture::new(ANALYSIS);
        std::fs::remove_file(fx.settings.video_path()).unwrap();

        let err = fx.orchestrator().ensure_corpus_ingested().await.unwrap_err();

        assert!(matches!(err, HowieError::Io(_)));
        assert!(!fx.settings.manifest_path().exists());
        assert_eq!(fx.analyzer.calls(), 0);
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let fx = Fixture::new(ANALYSIS);
        let mut orchestrator = fx.orchestrator();
        orchestrator.ensure_corpus_ingested().await.unwrap();

        orchestrator.reset().await.unwrap();

        assert!(!fx.settings.manifest_path().exists());
        assert!(!fx.settings.docstore_path().exists());
        assert!(!fx.cache_entry().exists());
        assert_eq!(fx.store.count().await.unwrap(), 0);
        assert!(fx.dir.path().join("manual.txt").exists());

        // Reset on an already empty state is fine, and the next run re-analyzes.
        orchestrator.reset().await.unwrap();
        let outcome = orchestrator.ensure_corpus_ingested().await.unwrap();
        assert!(matches!(outcome, IngestOutcome::Ingested { .. }));
        assert_eq!(fx.analyzer.calls(), 2);
    }

    #[tokio::test]
    async fn test_embedding_width_mismatch_keeps_previous_manifest() {
        let fx = Fixture::new(ANALYSIS);
        let mut orchestrator = fx.orchestrator();
        orchestrator.ensure_corpus_ingested().await.unwrap();
        let before = fx.manifest().load().unwrap();

        std::fs::write(fx.settings.pdf_path(), "Changed manual.").unwrap();
        fx.embedder.wrong_width.store(true, Ordering::SeqCst);

        let err = orchestrator.ensure_corpus_ingested().await.unwrap_err();
        assert!(err.to_string().contains("expected 2"));
        assert_eq!(fx.manifest().load().unwrap(), before);
    }

    #[tokio::test]
    async fn test_corrupt_docstore_does_not_block_reset_or_ingest() {
        let fx = Fixture::new(ANALYSIS);
        std::fs::create_dir_all(fx.settings.cache_dir()).unwrap();
        std::fs::write(fx.settings.docstore_path(), "{ truncated").unwrap();

        fx.orchestrator().reset().await.unwrap();
        assert!(!fx.settings.docstore_path().exists());

        std::fs::write(fx.settings.docstore_path(), "{ truncated").unwrap();
        let outcome = fx.orchestrator().ensure_corpus_ingested().await.unwrap();
        assert_eq!(outcome, IngestOutcome::Ingested { documents: 6 });
        assert_eq!(DocumentStore::load(fx.settings.docstore_path()).unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_reset_continues_past_undeletable_cache_entry() {
        let fx = Fixture::new(ANALYSIS);
        let mut orchestrator = fx.orchestrator();
        orchestrator.ensure_corpus_ingested().await.unwrap();

        // A non-empty directory where the summary file should be cannot be removed as a file.
        let entry = fx.cache_entry();
        std::fs::remove_file(&entry).unwrap();
        std::fs::create_dir_all(entry.join("stuck")).unwrap();

        orchestrator.reset().await.unwrap();

        assert!(entry.exists());
        assert!(!fx.settings.manifest_path().exists());
        assert!(!fx.settings.docstore_path().exists());
        assert_eq!(fx.store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reopened_index_skips_with_documents_intact() {
        let fx = Fixture::new(ANALYSIS);
        let db = fx.dir.path().join("index.db");

        let first: Arc<dyn VectorStore> = Arc::new(SqliteVectorStore::new(&db).unwrap());
        let outcome = fx.orchestrator_with(first).ensure_corpus_ingested().await.unwrap();
        assert_eq!(outcome, IngestOutcome::Ingested { documents: 6 });

        // A second process opens the same index file.
        let second: Arc<dyn VectorStore> = Arc::new(SqliteVectorStore::new(&db).unwrap());
        let outcome = fx
            .orchestrator_with(second.clone())
            .ensure_corpus_ingested()
            .await
            .unwrap();
        assert_eq!(outcome, IngestOutcome::Skipped);
        assert_eq!(second.count().await.unwrap(), 6);
    }
}
