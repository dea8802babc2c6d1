//! Pre-flight checks before expensive operations.
//!
//! Validates that required configuration is available before starting operations
//! that would otherwise fail midway. ffmpeg and ffprobe are checked later, by the
//! video analyzer, and only when the video summary is not already cached.

use crate::error::{HowieError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Ingestion embeds documents, so it needs the API key.
    Ingest,
    /// Answering questions only needs the API key.
    Ask,
    /// Resetting only touches local files and the index.
    Reset,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Ingest | Operation::Ask => check_api_key(),
        Operation::Reset => Ok(()),
    }
}

/// Check if OpenAI API key is configured.
fn check_api_key() -> Result<()> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => Ok(()),
        Ok(_) => Err(HowieError::Config(
            "OPENAI_API_KEY is empty. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
        Err(_) => Err(HowieError::Config(
            "OPENAI_API_KEY not set. Set it with: export OPENAI_API_KEY='sk-...'".to_string(),
        )),
    }
}
