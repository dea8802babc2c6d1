//! In-memory vector store implementation.
//!
//! Useful for testing and for a throwaway index during development.

use super::{rank, IndexedNode, SearchResult, VectorStore};
use crate::error::{HowieError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// In-memory vector store.
pub struct MemoryVectorStore {
    nodes: RwLock<HashMap<String, IndexedNode>>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, IndexedNode>>> {
        self.nodes
            .read()
            .map_err(|e| HowieError::ServiceUnavailable(format!("Failed to acquire lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, IndexedNode>>> {
        self.nodes
            .write()
            .map_err(|e| HowieError::ServiceUnavailable(format!("Failed to acquire lock: {}", e)))
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_batch(&self, nodes: &[IndexedNode]) -> Result<usize> {
        let mut store = self.write()?;
        for node in nodes {
            store.insert(node.document.id.clone(), node.clone());
        }
        Ok(nodes.len())
    }

    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let nodes = self.read()?;
        Ok(rank(nodes.values().cloned(), query_embedding, limit))
    }

    async fn clear(&self) -> Result<usize> {
        let mut nodes = self.write()?;
        let removed = nodes.len();
        nodes.clear();
        Ok(removed)
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::test_node;

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();

        store
            .upsert_batch(&[
                test_node("n1", "Rinse the filter", vec![1.0, 0.0, 0.0]),
                test_node("n2", "Descale the kettle", vec![0.0, 1.0, 0.0]),
            ])
            .await
            .unwrap();
        assert_eq!(store.count().await.unwrap(), 2);

        let results = store.search(&[1.0, 0.0, 0.0], 10).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].node.document.text, "Rinse the filter");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_upsert_replaces_same_id_and_clear() {
        let store = MemoryVectorStore::new();
        store
            .upsert_batch(&[test_node("n1", "old", vec![1.0, 0.0])])
            .await
            .unwrap();
        store
            .upsert_batch(&[test_node("n1", "new", vec![1.0, 0.0])])
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 1);
        let results = store.search(&[1.0, 0.0], 1).await.unwrap();
        assert_eq!(results[0].node.document.text, "new");

        assert_eq!(store.clear().await.unwrap(), 1);
        assert!(store.search(&[1.0, 0.0], 3).await.unwrap().is_empty());
    }
}
