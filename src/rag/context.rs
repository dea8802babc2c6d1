//! Context building for RAG responses.

use super::ContextChunk;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::VectorStore;
use std::sync::Arc;

/// Retrieves the nodes most relevant to a query.
pub struct ContextBuilder {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    max_chunks: usize,
}

impl ContextBuilder {
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            vector_store,
            embedder,
            max_chunks: 3,
        }
    }

    /// Set the maximum number of context chunks.
    pub fn with_max_chunks(mut self, max_chunks: usize) -> Self {
        self.max_chunks = max_chunks;
        self
    }

    /// Build context for a query. Failures of either backend are reported as
    /// `ServiceUnavailable`.
    pub async fn build(&self, query: &str) -> Result<Vec<ContextChunk>> {
        let query_embedding = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| e.into_service_unavailable("embedding"))?;

        let results = self
            .vector_store
            .search(&query_embedding, self.max_chunks)
            .await
            .map_err(|e| e.into_service_unavailable("vector index"))?;

        Ok(results.into_iter().map(ContextChunk::from).collect())
    }
}

/// Format context chunks for inclusion in a prompt.
pub fn format_context_for_prompt(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let heading = match &chunk.timestamp {
                Some(ts) => format!("{} @ {}", chunk.label, ts),
                None => chunk.label.clone(),
            };
            format!("---\n[{}] {}\n{}\n---", i + 1, heading, chunk.text)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}
