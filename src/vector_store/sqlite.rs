//! SQLite-based vector store implementation.
//!
//! Embeddings are stored as little-endian f32 blobs and scored in Rust; the corpus is
//! a single video and a single manual, so a full scan per query is fine.

use super::{rank, IndexedNode, SearchResult, VectorStore};
use crate::corpus::SourceDocument;
use crate::error::{HowieError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS nodes (
        id TEXT PRIMARY KEY,
        text TEXT NOT NULL,
        metadata TEXT NOT NULL,
        embedding BLOB NOT NULL,
        indexed_at TEXT NOT NULL
    );
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (or create) the index at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store.
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| HowieError::ServiceUnavailable(format!("Failed to acquire lock: {}", e)))
    }

    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect()
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, nodes), fields(count = nodes.len()))]
    async fn upsert_batch(&self, nodes: &[IndexedNode]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for node in nodes {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO nodes (id, text, metadata, embedding, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    node.document.id,
                    node.document.text,
                    serde_json::to_string(&node.document.metadata)?,
                    Self::embedding_to_bytes(&node.embedding),
                    node.indexed_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        debug!("Batch upserted {} nodes", nodes.len());
        Ok(nodes.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT id, text, metadata, embedding, indexed_at FROM nodes")?;
        let rows = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let text: String = row.get(1)?;
            let metadata: String = row.get(2)?;
            let embedding: Vec<u8> = row.get(3)?;
            let indexed_at: String = row.get(4)?;
            Ok((id, text, metadata, embedding, indexed_at))
        })?;

        let mut nodes = Vec::new();
        for row in rows {
            let (id, text, metadata, embedding, indexed_at) = row?;
            nodes.push(IndexedNode {
                document: SourceDocument {
                    id,
                    text,
                    metadata: serde_json::from_str(&metadata)?,
                },
                embedding: Self::bytes_to_embedding(&embedding),
                indexed_at: DateTime::parse_from_rfc3339(&indexed_at)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now()),
            });
        }

        let results = rank(nodes, query_embedding, limit);
        debug!("Found {} matching nodes", results.len());
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<usize> {
        let conn = self.lock()?;
        let deleted = conn.execute("DELETE FROM nodes", [])?;
        info!("Cleared {} nodes from the index", deleted);
        Ok(deleted)
    }

    async fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
