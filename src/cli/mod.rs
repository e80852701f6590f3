//! CLI module for docqa.
//!
//! Provides command-line interface parsing and command dispatch.

pub mod args;
pub mod commands;
mod progress;

pub use args::{Cli, Commands};

use anyhow::{Result, anyhow};

use crate::config::Settings;

/// Settings from `--config`, or from the workspace `.docqa/settings.toml`.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let settings = match &cli.config {
        Some(path) => Settings::load_from(path).map_err(|e| {
            anyhow!("Failed to load configuration from {}: {e}", path.display())
        })?,
        None => Settings::load().map_err(|e| anyhow!("Failed to load configuration: {e}"))?,
    };
    Ok(settings)
}

/// Run the parsed command.
pub async fn run(cli: Cli) -> Result<()> {
    if let Commands::Init { force } = cli.command {
        return commands::init::run_init(force);
    }

    let settings = load_settings(&cli)?;
    crate::logging::init_with_config(&settings.logging);

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Config => commands::init::run_config(&settings),
        Commands::Ingest {
            collection,
            files,
            no_progress,
        } => commands::ingest::run_ingest(&settings, &collection, &files, !no_progress).await,
        Commands::Add {
            collection,
            files,
            no_progress,
        } => commands::ingest::run_add(&settings, &collection, &files, !no_progress).await,
        Commands::Ask {
            collection,
            question,
            k,
            search_type,
            show_context,
        } => {
            commands::query::run_ask(
                &settings,
                &collection,
                &question,
                k,
                search_type.as_deref(),
                show_context,
            )
            .await
        }
        Commands::Search {
            collection,
            query,
            k,
            json,
        } => commands::query::run_search(&settings, &collection, &query, k, json).await,
        Commands::Collections { json } => commands::collections::run_list(&settings, json),
        Commands::Stats { collection, json } => {
            commands::collections::run_stats(&settings, &collection, json)
        }
        Commands::Delete { collection } => commands::collections::run_delete(&settings, &collection),
    }
}
