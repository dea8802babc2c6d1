//! RAG (Retrieval-Augmented Generation) for question answering with sources.
//!
//! Answers questions from the indexed video analysis and manual chunks.

pub mod context;
mod llm;
mod response;

pub use context::ContextBuilder;
pub use llm::{ChatModel, OpenAIChatModel};
pub use response::{QueryResponse, RagEngine, RagResponse, NO_CONTEXT_ANSWER};

use crate::corpus::{source_label, SourceDocument};
use crate::transcription::format_timestamp;
use crate::vector_store::SearchResult;
use serde_json::{Map, Value};

/// A retrieved document prepared for prompting and citation.
#[derive(Debug, Clone)]
pub struct ContextChunk {
    pub id: String,
    pub text: String,
    /// The document's metadata, returned to clients as the source.
    pub metadata: Map<String, Value>,
    /// Similarity score.
    pub score: f32,
    /// Citation label (file name or source kind).
    pub label: String,
    /// Formatted video timestamp (e.g., "02:34"), for video actions.
    pub timestamp: Option<String>,
}

impl ContextChunk {
    pub fn from_document(document: SourceDocument, score: f32) -> Self {
        let label = source_label(&document.metadata);
        let timestamp = document
            .metadata
            .get("timestamp")
            .and_then(Value::as_f64)
            .map(format_timestamp);

        Self {
            id: document.id,
            text: document.text,
            metadata: document.metadata,
            score,
            label,
            timestamp,
        }
    }
}

impl From<SearchResult> for ContextChunk {
    fn from(result: SearchResult) -> Self {
        Self::from_document(result.node.document, result.score)
    }
}
