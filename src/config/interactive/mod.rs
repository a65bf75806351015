#[cfg(test)]
mod tests;

use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};

use super::{Config, ConfigError};
use crate::catalog::DuplicateTitlePolicy;
use crate::recommend::RecommenderConfig;
use crate::recommend::display::DisplayConfig;
use crate::vectorize::VectorizerConfig;

#[inline]
pub fn run_interactive_config(base_dir: &Path) -> Result<()> {
    eprintln!("{}", style("🎬 CineVerse Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config(base_dir)?;

    eprintln!("{}", style("Index Settings").bold().yellow());
    eprintln!("These settings apply the next time you run 'cineverse build'.");
    eprintln!();

    configure_index(&mut config)?;

    eprintln!();
    eprintln!("{}", style("Recommendation Settings").bold().yellow());
    eprintln!();

    configure_recommendations(&mut config)?;

    eprintln!();
    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("✓ Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config(base_dir: &Path) -> Result<()> {
    let config = Config::load(base_dir).context("Failed to load configuration")?;

    eprintln!("{}", style("📋 Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Catalog:").bold().yellow());
    eprintln!(
        "  Poster Marker: {} -> {}",
        style(&config.catalog.poster_size_marker).cyan(),
        style(&config.catalog.poster_suffix).cyan()
    );
    eprintln!(
        "  Duplicate Titles: {}",
        style(config.catalog.duplicate_titles).cyan()
    );

    eprintln!("{}", style("Vectorizer:").bold().yellow());
    eprintln!(
        "  Max Features: {}",
        style(config.vectorizer.max_features).cyan()
    );
    eprintln!(
        "  Remove Stop Words: {}",
        style(config.vectorizer.remove_stop_words).cyan()
    );

    eprintln!("{}", style("Recommender:").bold().yellow());
    eprintln!("  Top K: {}", style(config.recommender.top_k).cyan());

    eprintln!("{}", style("Display:").bold().yellow());
    eprintln!(
        "  Score Multiplier: {}",
        style(config.display.score_multiplier).cyan()
    );
    eprintln!(
        "  Score Ceiling: {}%",
        style(config.display.score_ceiling).cyan()
    );
    eprintln!(
        "  Highlight Threshold: {}%",
        style(config.display.highlight_threshold).cyan()
    );
    eprintln!("  Search URL: {}", style(&config.display.search_url).cyan());

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );
    eprintln!("Models: {}", style(config.models_dir().display()).dim());

    Ok(())
}

fn load_existing_config(base_dir: &Path) -> Result<Config> {
    Config::load(base_dir).map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("Existing configuration is invalid. Using defaults.").yellow()
            );
            Ok(Config::with_base_dir(base_dir))
        },
        |config| Ok(config),
    )
}

#[allow(
    clippy::trivially_copy_pass_by_ref,
    reason = "dialoguer validators take the input by reference"
)]
fn validate_max_features(input: &usize) -> Result<(), ConfigError> {
    VectorizerConfig::default().set_max_features(*input)
}

#[allow(
    clippy::trivially_copy_pass_by_ref,
    reason = "dialoguer validators take the input by reference"
)]
fn validate_top_k(input: &usize) -> Result<(), ConfigError> {
    RecommenderConfig::default().set_top_k(*input)
}

#[allow(
    clippy::trivially_copy_pass_by_ref,
    reason = "dialoguer validators take the input by reference"
)]
fn validate_score_multiplier(input: &f64) -> Result<(), ConfigError> {
    DisplayConfig::default().set_score_multiplier(*input)
}

#[allow(
    clippy::trivially_copy_pass_by_ref,
    reason = "dialoguer validators take the input by reference"
)]
fn validate_score_ceiling(input: &u8) -> Result<(), ConfigError> {
    DisplayConfig::default().set_score_ceiling(*input)
}

fn configure_index(config: &mut Config) -> Result<()> {
    let max_features: usize = Input::new()
        .with_prompt("Vocabulary size (max features)")
        .default(config.vectorizer.max_features)
        .validate_with(validate_max_features)
        .interact_text()?;

    let remove_stop_words = Confirm::new()
        .with_prompt("Remove English stop words?")
        .default(config.vectorizer.remove_stop_words)
        .interact()?;

    let policies = [DuplicateTitlePolicy::Reject, DuplicateTitlePolicy::KeepFirst];
    let default_index = policies
        .iter()
        .position(|&p| p == config.catalog.duplicate_titles)
        .unwrap_or(0);
    let policy_index = Select::new()
        .with_prompt("Duplicate titles in the catalog")
        .default(default_index)
        .items(&policies)
        .interact()?;

    config.vectorizer.set_max_features(max_features)?;
    config.vectorizer.remove_stop_words = remove_stop_words;
    config.catalog.duplicate_titles = policies[policy_index];

    Ok(())
}

fn configure_recommendations(config: &mut Config) -> Result<()> {
    let top_k: usize = Input::new()
        .with_prompt("Number of recommendations")
        .default(config.recommender.top_k)
        .validate_with(validate_top_k)
        .interact_text()?;

    let score_multiplier: f64 = Input::new()
        .with_prompt("Displayed match multiplier")
        .default(config.display.score_multiplier)
        .validate_with(validate_score_multiplier)
        .interact_text()?;

    let score_ceiling: u8 = Input::new()
        .with_prompt("Displayed match ceiling (%)")
        .default(config.display.score_ceiling)
        .validate_with(validate_score_ceiling)
        .interact_text()?;

    config.recommender.set_top_k(top_k)?;
    config.display.set_score_multiplier(score_multiplier)?;
    config.display.set_score_ceiling(score_ceiling)?;

    Ok(())
}
