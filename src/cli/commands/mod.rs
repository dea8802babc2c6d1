//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod doctor;
mod ingest;
mod serve;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use ingest::run_ingest;
pub use serve::run_serve;

use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::embedding::OpenAIEmbedder;
use crate::error::Result;
use crate::rag::RagEngine;
use crate::vector_store::{open_vector_store, VectorStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Build a query engine over the configured index.
///
/// Querying never ingests; run `howie ingest` first.
fn build_engine(
    settings: &Settings,
    prompts: Prompts,
    model: Option<String>,
    top_k: Option<usize>,
) -> Result<(RagEngine, Arc<dyn VectorStore>)> {
    let vector_store = open_vector_store(settings)?;

    let embedder = Arc::new(OpenAIEmbedder::with_config(
        &settings.llm.embedding_model_name,
        settings.llm.embedding_dimensions as usize,
        Duration::from_secs(settings.llm.request_timeout_seconds),
    )?);

    let mut llm = settings.llm.clone();
    if let Some(model) = model {
        llm.model_name = model;
    }

    let top_k = top_k.unwrap_or(settings.rag_tuning.top_k_retrieval);
    let engine = RagEngine::new(vector_store.clone(), embedder, &llm, top_k)?.with_prompts(prompts);

    Ok((engine, vector_store))
}

/// Point the user at `howie ingest` when there is nothing to retrieve from.
async fn warn_if_index_empty(vector_store: &dyn VectorStore) {
    match vector_store.count().await {
        Ok(0) => Output::warning("The index is empty. Run 'howie ingest' first."),
        Ok(_) => {}
        Err(e) => warn!("Could not count indexed nodes: {}", e),
    }
}
