//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use crate::orchestrator::{IngestOutcome, Orchestrator};
use anyhow::Result;
use tracing::error;

/// Run the ingest command, or wipe all ingestion state when `reset` is set.
pub async fn run_ingest(reset: bool, settings: Settings, prompts: Prompts) -> Result<()> {
    let operation = if reset { Operation::Reset } else { Operation::Ingest };
    if let Err(e) = preflight::check(operation) {
        Output::error(&format!("{}", e));
        Output::info("Run 'howie doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    std::fs::create_dir_all(settings.cache_dir())?;
    let mut orchestrator = Orchestrator::new(settings, prompts)?;

    if reset {
        let spinner = Output::spinner("Resetting index and local state...");
        let result = orchestrator.reset().await;
        spinner.finish_and_clear();
        result?;
        Output::success("Reset complete. The next ingest rebuilds everything.");
        return Ok(());
    }

    Output::kv("Video", &orchestrator.settings().data_sources.video_src_path);
    Output::kv("Manual", &orchestrator.settings().data_sources.pdf_src_path);

    let spinner = Output::spinner("Checking sources...");
    let result = orchestrator.ensure_corpus_ingested().await;
    spinner.finish_and_clear();

    match result {
        Ok(IngestOutcome::Skipped) => {
            Output::success("Sources unchanged since the last ingestion. Nothing to do.");
        }
        Ok(IngestOutcome::Ingested { documents }) => {
            Output::success(&format!("Ingested {} documents.", documents));
        }
        Err(e) => {
            error!("Ingestion failed: {}", e);
            Output::error(&format!("Ingestion failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
