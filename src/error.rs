//! Error types for Howie.

use thiserror::Error;

/// Library-level error type for Howie operations.
#[derive(Error, Debug)]
pub enum HowieError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Model output failed schema validation: {0}")]
    SchemaValidation(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("Audio extraction failed: {0}")]
    AudioExtraction(String),

    #[error("Transcription failed: {0}")]
    Transcription(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl HowieError {
    /// Whether this error means an external dependency could not serve the request.
    pub fn is_service_unavailable(&self) -> bool {
        matches!(self, HowieError::ServiceUnavailable(_))
    }

    /// Re-tag a failure of an external dependency as `ServiceUnavailable`.
    pub fn into_service_unavailable(self, service: &str) -> Self {
        match self {
            HowieError::ServiceUnavailable(_) => self,
            other => HowieError::ServiceUnavailable(format!("{}: {}", service, other)),
        }
    }
}

/// Result type alias for Howie operations.
pub type Result<T> = std::result::Result<T, HowieError>;
