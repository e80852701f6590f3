//! Init and Config commands.

use anyhow::{Result, anyhow};
use console::style;

use crate::config::Settings;

/// Create `.docqa/settings.toml` in the current directory.
pub fn run_init(force: bool) -> Result<()> {
    let path = Settings::init_config_file(force).map_err(|e| anyhow!("{e}"))?;

    println!("Created configuration file at: {}", style(path.display()).green());
    println!("Edit this file to customize your settings.");
    if Settings::default().openai.resolved_api_key().is_none() {
        println!(
            "\n{} set OPENAI_API_KEY or openai.api_key before ingesting documents.",
            style("Note:").yellow().bold()
        );
    }
    Ok(())
}

/// Print the effective settings as TOML.
pub fn run_config(settings: &Settings) -> Result<()> {
    println!("{}", style("Current Configuration:").cyan().bold());
    println!("{}", "=".repeat(50));
    println!("{}", render_masked(settings)?);
    Ok(())
}

/// Settings as TOML with the API key masked.
fn render_masked(settings: &Settings) -> Result<String> {
    let mut shown = settings.clone();
    if let Some(key) = shown.openai.api_key.as_mut() {
        *key = mask(key);
    }
    Ok(toml::to_string_pretty(&shown)?)
}

fn mask(key: &str) -> String {
    let visible: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    if key.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("****{visible}")
    }
}
