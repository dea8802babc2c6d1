//! Configuration module for Howie.
//!
//! Handles loading application settings and prompt templates. Both are plain values
//! built once at startup and handed to the components that need them.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts, VideoAnalysisPrompts};
pub use settings::{
    DataSourceSettings, GeneralSettings, LlmSettings, PromptSettings, RagTuningSettings,
    ServerSettings, Settings, VectorStoreProvider, VectorStoreSettings, VideoAnalysisSettings,
    DOCSTORE_FILE_NAME, MANIFEST_FILE_NAME,
};
