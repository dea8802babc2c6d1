//! Howie CLI entry point.

use anyhow::Result;
use clap::Parser;
use howie::cli::{commands, Cli, Commands};
use howie::config::{Prompts, Settings};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.as_deref().map(Settings::expand_path);
    let settings = Settings::load_from(config_path.as_deref())?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("howie={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match &cli.command {
        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Ingest { reset } => {
            let prompts = load_prompts(&settings)?;
            commands::run_ingest(*reset, settings, prompts).await?;
        }

        Commands::Ask {
            question,
            model,
            top_k,
        } => {
            let prompts = load_prompts(&settings)?;
            commands::run_ask(question, model.clone(), *top_k, settings, prompts).await?;
        }

        Commands::Chat { model } => {
            let prompts = load_prompts(&settings)?;
            commands::run_chat(model.clone(), settings, prompts).await?;
        }

        Commands::Serve { host, port } => {
            let prompts = load_prompts(&settings)?;
            commands::run_serve(host.clone(), *port, settings, prompts).await?;
        }

        Commands::Config { action } => {
            commands::run_config(action, &settings, cli.config.as_deref())?;
        }
    }

    Ok(())
}

/// Built-in prompts, overridden by the configured prompts file and variables.
fn load_prompts(settings: &Settings) -> howie::Result<Prompts> {
    Prompts::load(
        settings.prompts.prompts_path.as_deref(),
        Some(&settings.prompts.variables),
    )
}
