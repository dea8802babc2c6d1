//! Vector index abstraction for Howie.
//!
//! Provides a trait-based interface over the index. SQLite is the only backend
//! users can configure; an in-memory store backs the tests.

#[cfg(test)]
mod memory;
mod sqlite;

#[cfg(test)]
pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::config::{Settings, VectorStoreProvider};
use crate::corpus::SourceDocument;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A source document with its embedding, as stored in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedNode {
    pub document: SourceDocument,
    pub embedding: Vec<f32>,
    /// When this node was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl IndexedNode {
    pub fn new(document: SourceDocument, embedding: Vec<f32>) -> Self {
        Self {
            document,
            embedding,
            indexed_at: Utc::now(),
        }
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched node.
    pub node: IndexedNode,
    /// Similarity score (higher is better).
    pub score: f32,
}

/// Trait for vector index implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Insert nodes, replacing any node with the same document id.
    async fn upsert_batch(&self, nodes: &[IndexedNode]) -> Result<usize>;

    /// The `limit` nodes most similar to the query, best first.
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>>;

    /// Remove every node. Returns how many were removed.
    async fn clear(&self) -> Result<usize>;

    /// Number of indexed nodes.
    async fn count(&self) -> Result<usize>;
}

/// Open the index backend selected in the configuration.
pub fn open_vector_store(settings: &Settings) -> Result<Arc<dyn VectorStore>> {
    match settings.vector_store.provider {
        VectorStoreProvider::Sqlite => Ok(Arc::new(SqliteVectorStore::new(&settings.sqlite_path())?)),
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Score every node against the query and keep the best `limit`.
///
/// Ties are broken by document id so results are stable across backends.
pub(crate) fn rank(
    nodes: impl IntoIterator<Item = IndexedNode>,
    query_embedding: &[f32],
    limit: usize,
) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = nodes
        .into_iter()
        .map(|node| {
            let score = cosine_similarity(query_embedding, &node.embedding);
            SearchResult { node, score }
        })
        .collect();

    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.node.document.id.cmp(&b.node.document.id))
    });
    results.truncate(limit);
    results
}

#[cfg(test)]
pub(crate) fn test_node(id: &str, text: &str, embedding: Vec<f32>) -> IndexedNode {
    IndexedNode::new(
        SourceDocument::new(id, text, serde_json::json!({ "source": "video_action" })),
        embedding,
    )
}
