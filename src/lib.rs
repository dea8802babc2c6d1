//! Howie - a RAG assistant over one video and one manual
//!
//! Howie ingests a single instructional video and its PDF manual into a vector
//! index and answers questions grounded in both.
//!
//! # Overview
//!
//! - The video is transcribed and condensed into a structured summary with
//!   timestamped key actions (cached on disk).
//! - The manual is split into overlapping sentence-aware chunks.
//! - Everything is embedded and indexed; re-ingestion only happens when the
//!   content of either source changes.
//! - Questions are answered from the top-k retrieved documents, with sources.
//!
//! # Architecture
//!
//! - `config` - Settings and prompts
//! - `fingerprint` / `manifest` - Change detection between runs
//! - `audio` / `transcription` / `video` - Video analysis
//! - `reader` / `chunking` / `corpus` - Source documents
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector index abstraction
//! - `docstore` - Local copy of the indexed documents
//! - `orchestrator` - Ingestion pipeline
//! - `rag` - Question answering
//!
//! # Example
//!
//! ```rust,no_run
//! use howie::config::{Prompts, Settings};
//! use howie::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let mut orchestrator = Orchestrator::new(settings, Prompts::default())?;
//!
//!     let outcome = orchestrator.ensure_corpus_ingested().await?;
//!     println!("{:?}", outcome);
//!
//!     Ok(())
//! }
//! ```

pub mod audio;
pub mod chunking;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod docstore;
pub mod embedding;
pub mod error;
pub mod fingerprint;
pub mod manifest;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod reader;
pub mod transcription;
pub mod vector_store;
pub mod video;

pub use error::{HowieError, Result};
