//! Configuration settings for Howie.

use crate::error::{HowieError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// File name of the ingestion manifest inside the cache directory.
pub const MANIFEST_FILE_NAME: &str = "ingestion_manifest.json";
/// File name of the local document store inside the cache directory.
pub const DOCSTORE_FILE_NAME: &str = "docstore.json";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub data_sources: DataSourceSettings,
    pub llm: LlmSettings,
    pub rag_tuning: RagTuningSettings,
    pub video_analysis: VideoAnalysisSettings,
    pub vector_store: VectorStoreSettings,
    pub prompts: PromptSettings,
    pub server: ServerSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for the manifest, docstore and video summary cache.
    pub cache_dir: String,
    /// Log level used when no `-v` flag is given (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            cache_dir: ".cache".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// The tracked corpus: one video and one manual.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSourceSettings {
    /// Local path of the video.
    pub video_src_path: String,
    /// Local path of the PDF manual.
    pub pdf_src_path: String,
}

impl Default for DataSourceSettings {
    fn default() -> Self {
        Self {
            video_src_path: "data/steves-pour-over-method.mp4".to_string(),
            pdf_src_path: "data/manual.pdf".to_string(),
        }
    }
}

/// Language model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Chat model used for answers and video analysis.
    pub model_name: String,
    /// Embedding model.
    pub embedding_model_name: String,
    /// Embedding dimensions.
    pub embedding_dimensions: u32,
    /// Sampling temperature for answers.
    pub temperature: f32,
    /// Timeout for a single API request.
    pub request_timeout_seconds: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model_name: "gpt-4o-mini".to_string(),
            embedding_model_name: "text-embedding-3-small".to_string(),
            embedding_dimensions: 1536,
            temperature: 0.7,
            request_timeout_seconds: crate::openai::DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Retrieval tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagTuningSettings {
    /// Target chunk size in words.
    pub chunk_size: usize,
    /// Words shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of nodes retrieved per query.
    pub top_k_retrieval: usize,
}

impl Default for RagTuningSettings {
    fn default() -> Self {
        Self {
            chunk_size: 256,
            chunk_overlap: 20,
            top_k_retrieval: 3,
        }
    }
}

/// Video analysis settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoAnalysisSettings {
    /// Speech-to-text model for the video's audio track.
    pub transcription_model: String,
    /// Length of the audio segments sent to the transcription API.
    pub segment_seconds: u32,
    /// Sampling temperature for the structured summary.
    pub temperature: f32,
}

impl Default for VideoAnalysisSettings {
    fn default() -> Self {
        Self {
            transcription_model: "whisper-1".to_string(),
            segment_seconds: 600,
            temperature: 0.2,
        }
    }
}

/// Vector index backend.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorStoreProvider {
    /// SQLite file on disk (default).
    #[default]
    Sqlite,
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Vector store provider. Only `sqlite` is accepted.
    pub provider: VectorStoreProvider,
    /// Path to SQLite database (for sqlite provider).
    pub sqlite_path: String,
    /// Number of nodes written per upsert call.
    pub insert_batch_size: usize,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: VectorStoreProvider::Sqlite,
            sqlite_path: ".cache/vectors.db".to_string(),
            insert_batch_size: 100,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptSettings {
    /// TOML file overriding the built-in prompts.
    pub prompts_path: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: HashMap<String, String>,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Origins allowed to call the API from a browser.
    pub cors_origins: Vec<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// An explicit path must exist; a missing default file yields the defaults.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => {
                if !p.exists() {
                    return Err(HowieError::Config(format!(
                        "Configuration file not found: {}",
                        p.display()
                    )));
                }
                p.to_path_buf()
            }
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            settings.validate()?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let tuning = &self.rag_tuning;
        if tuning.chunk_size == 0 {
            return Err(HowieError::Config("rag_tuning.chunk_size must be positive".to_string()));
        }
        if tuning.chunk_overlap >= tuning.chunk_size {
            return Err(HowieError::Config(format!(
                "rag_tuning.chunk_overlap ({}) must be smaller than chunk_size ({})",
                tuning.chunk_overlap, tuning.chunk_size
            )));
        }
        if tuning.top_k_retrieval == 0 {
            return Err(HowieError::Config(
                "rag_tuning.top_k_retrieval must be positive".to_string(),
            ));
        }
        if self.vector_store.insert_batch_size == 0 {
            return Err(HowieError::Config(
                "vector_store.insert_batch_size must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the default configuration file path.
    ///
    /// `config/config.toml` in the working directory wins over the per-user file.
    pub fn default_config_path() -> PathBuf {
        let local = PathBuf::from("config").join("config.toml");
        if local.exists() {
            return local;
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("howie")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded cache directory path.
    pub fn cache_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.cache_dir)
    }

    /// Path of the ingestion manifest.
    pub fn manifest_path(&self) -> PathBuf {
        self.cache_dir().join(MANIFEST_FILE_NAME)
    }

    /// Path of the local document store.
    pub fn docstore_path(&self) -> PathBuf {
        self.cache_dir().join(DOCSTORE_FILE_NAME)
    }

    /// Get the expanded SQLite database path.
    pub fn sqlite_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.sqlite_path)
    }

    /// Get the expanded video path.
    pub fn video_path(&self) -> PathBuf {
        Self::expand_path(&self.data_sources.video_src_path)
    }

    /// Get the expanded manual path.
    pub fn pdf_path(&self) -> PathBuf {
        Self::expand_path(&self.data_sources.pdf_src_path)
    }

    /// Every file whose content decides whether the corpus must be re-ingested.
    pub fn tracked_sources(&self) -> Vec<PathBuf> {
        vec![self.video_path(), self.pdf_path()]
    }
}
