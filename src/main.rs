use cineverse::Result;
use cineverse::commands::{build_index, list_movies, recommend, serve_mcp, show_status};
use cineverse::config::{get_config_dir, run_interactive_config, show_config};
use cineverse::recommend::RecommenderConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cineverse")]
#[command(about = "Content-based movie recommender with an MCP server")]
#[command(version)]
struct Cli {
    /// Data directory holding config.toml and the built models
    /// (defaults to $CINEVERSE_HOME, then ~/.cineverse)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure index and recommendation settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Build the similarity index from a movie catalog CSV
    Build {
        /// Path to the catalog CSV file
        catalog: PathBuf,
    },
    /// List catalog titles
    List {
        /// Only show titles containing this text (case-insensitive)
        #[arg(long)]
        query: Option<String>,
    },
    /// Recommend movies similar to a title
    Recommend {
        /// Exact catalog title
        title: String,
        /// Number of recommendations (defaults to the configured top_k)
        #[arg(long, value_parser = parse_limit)]
        limit: Option<usize>,
    },
    /// Start MCP server on stdio
    Serve,
    /// Show the state of the built index
    Status,
}

fn parse_limit(value: &str) -> std::result::Result<usize, String> {
    let limit: usize = value.parse().map_err(|e: std::num::ParseIntError| e.to_string())?;
    RecommenderConfig::default()
        .set_top_k(limit)
        .map_err(|e| e.to_string())?;
    Ok(limit)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => get_config_dir()?,
    };

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&data_dir)?;
            } else {
                run_interactive_config(&data_dir)?;
            }
        }
        Commands::Build { catalog } => {
            build_index(&data_dir, &catalog)?;
        }
        Commands::List { query } => {
            list_movies(&data_dir, query.as_deref())?;
        }
        Commands::Recommend { title, limit } => {
            recommend(&data_dir, &title, limit)?;
        }
        Commands::Serve => {
            serve_mcp(&data_dir).await?;
        }
        Commands::Status => {
            show_status(&data_dir)?;
        }
    }

    Ok(())
}
