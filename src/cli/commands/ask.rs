//! Ask command implementation.

use super::{build_engine, warn_if_index_empty};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use anyhow::Result;

/// Run the ask command.
pub async fn run_ask(
    question: &str,
    model: Option<String>,
    top_k: Option<usize>,
    settings: Settings,
    prompts: Prompts,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        Output::info("Run 'howie doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let (engine, vector_store) = build_engine(&settings, prompts, model, top_k)?;
    warn_if_index_empty(vector_store.as_ref()).await;

    let spinner = Output::spinner("Searching the video and manual...");

    match engine.answer(question).await {
        Ok(response) => {
            spinner.finish_and_clear();

            println!("\n{}\n", response.answer);

            if !response.sources.is_empty() {
                Output::header("Sources");
                for source in &response.sources {
                    Output::source(source);
                }
            }
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
