//! Interactive chat command.

use super::{build_engine, warn_if_index_empty};
use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{Prompts, Settings};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// Run the interactive chat command.
pub async fn run_chat(model: Option<String>, settings: Settings, prompts: Prompts) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Ask) {
        Output::error(&format!("{}", e));
        Output::info("Run 'howie doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let (mut engine, vector_store) = build_engine(&settings, prompts, model, None)?;
    warn_if_index_empty(vector_store.as_ref()).await;

    println!("\n{}", style("Howie Chat").bold().cyan());
    println!(
        "{}\n",
        style("Ask about the video or the manual, or 'exit' to quit. Use 'clear' to reset conversation.").dim()
    );

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("You:").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            // EOF
            println!();
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            Output::info("Goodbye!");
            break;
        }

        if input.eq_ignore_ascii_case("clear") {
            engine.clear_history();
            Output::info("Conversation history cleared.");
            continue;
        }

        let spinner = Output::spinner("Thinking...");
        let result = engine.chat(input).await;
        spinner.finish_and_clear();

        match result {
            Ok(response) => {
                println!("\n{} {}\n", style("Howie:").cyan().bold(), response.answer);
                for source in &response.sources {
                    let location = match &source.timestamp {
                        Some(ts) => format!("{} @ {}", source.label, ts),
                        None => source.label.clone(),
                    };
                    println!("  {}", style(location).dim());
                }
                if !response.sources.is_empty() {
                    println!();
                }
            }
            Err(e) => {
                Output::error(&format!("Error: {}", e));
            }
        }
    }

    Ok(())
}
