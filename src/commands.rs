use anyhow::{Context, Result};
use console::style;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info};

use crate::catalog::MovieRecord;
use crate::config::Config;
use crate::index::{ArtifactStore, BuildManifest, IndexBuilder};
use crate::mcp::tools::{matching_titles, movie_server};
use crate::recommend::Recommender;
use crate::recommend::display::DisplayConfig;

/// Build the similarity index from a catalog file
#[inline]
pub fn build_index(data_dir: &Path, catalog_path: &Path) -> Result<BuildManifest> {
    let config = Config::load(data_dir).context("Failed to load configuration")?;
    info!("Building index from {}", catalog_path.display());

    let manifest = IndexBuilder::new(&config)
        .build(catalog_path)
        .with_context(|| format!("Failed to build index from {}", catalog_path.display()))?;

    println!(
        "{}",
        style(format!(
            "✓ Indexed {} movies over {} terms",
            manifest.movie_count, manifest.vocabulary_size
        ))
        .green()
    );
    println!(
        "Artifacts written to {}",
        style(config.models_dir().display()).cyan()
    );

    Ok(manifest)
}

fn load_recommender(config: &Config) -> Result<Recommender> {
    Recommender::load(config).context("Failed to load the movie index")
}

/// List catalog titles, optionally filtered by a case-insensitive substring
#[inline]
pub fn list_movies(data_dir: &Path, query: Option<&str>) -> Result<()> {
    let config = Config::load(data_dir).context("Failed to load configuration")?;
    let recommender = load_recommender(&config)?;

    let query = query.map(str::to_lowercase);
    let titles = matching_titles(recommender.catalog().titles(), query.as_deref());

    if titles.is_empty() {
        println!("No movies match.");
        return Ok(());
    }

    println!("Movies ({} total):", titles.len());
    for title in titles {
        println!("  🎬 {}", title);
    }

    Ok(())
}

/// Print the selected movie and its most similar movies
#[inline]
pub fn recommend(data_dir: &Path, title: &str, limit: Option<usize>) -> Result<()> {
    let config = Config::load(data_dir).context("Failed to load configuration")?;
    let recommender = load_recommender(&config)?;

    let movie = recommender.movie(title)?;
    let recommendations = match limit {
        Some(limit) => recommender.recommend_with_limit(title, limit)?,
        None => recommender.recommend(title)?,
    };

    print_movie_card(movie, &config.display);
    println!();
    println!("{}", style("Movies you might also like").bold().yellow());

    for (rank, recommendation) in recommendations.iter().enumerate() {
        let percent = config.display.match_percent(recommendation.score);
        let badge = format!("{percent}% match");
        let badge = if config.display.is_highlighted(percent) {
            style(badge).green()
        } else {
            style(badge).yellow()
        };

        println!(
            "{:>2}. {} {}",
            rank + 1,
            style(&recommendation.movie.title).bold(),
            badge
        );
        if let Some(rating) = recommendation.movie.rating {
            println!("    ⭐ {:.1}  {}", rating, recommendation.movie.genre);
        }
        if let Ok(link) = config.display.search_link(&recommendation.movie.title) {
            println!("    {}", style(link).dim());
        }
    }

    Ok(())
}

fn print_movie_card(movie: &MovieRecord, display: &DisplayConfig) {
    println!("{}", style(&movie.title).bold().cyan());
    if let Some(rating) = movie.rating {
        println!("  Rating: ⭐ {:.1}", rating);
    }
    println!("  Genre: {}", movie.genre);
    println!("  Director: {}", movie.director);
    println!("  Starring: {}", movie.star);
    if !movie.poster_path.is_empty() {
        println!("  Poster: {}", style(&movie.poster_path).dim());
    }
    if !movie.overview.is_empty() {
        println!("  {}", movie.overview);
    }
    if let Ok(link) = display.search_link(&movie.title) {
        println!("  {}", style(link).dim());
    }
}

/// Serve the recommender over MCP on stdio
#[inline]
pub async fn serve_mcp(data_dir: &Path) -> Result<()> {
    let config = Config::load(data_dir).context("Failed to load configuration")?;
    let recommender = Arc::new(load_recommender(&config)?);

    // stdout carries protocol messages only
    eprintln!("🌐 Initializing MCP server...");
    let server = Arc::new(movie_server(&recommender, config.display.clone()).await);
    eprintln!(
        "✅ MCP server initialized with {} movies and tools: {}",
        recommender.catalog().len(),
        server.tool_names().await.join(", ")
    );
    eprintln!("Press Ctrl+C to stop the server");

    tokio::select! {
        result = Arc::clone(&server).serve_stdio() => {
            if let Err(e) = result {
                error!("MCP server error: {}", e);
                return Err(e);
            }
            info!("MCP server stopped normally");
        }
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\n📴 Received interrupt signal, shutting down...");
        }
    }

    Ok(())
}

/// Report artifact presence, sizes and build details
#[inline]
pub fn show_status(data_dir: &Path) -> Result<()> {
    let config = Config::load(data_dir).context("Failed to load configuration")?;
    let store = ArtifactStore::new(config.models_dir());

    println!("{}", style("📊 CineVerse Status").bold().cyan());
    println!();
    println!("Data directory: {}", style(config.get_base_dir().display()).cyan());
    println!("Models: {}", style(store.dir().display()).cyan());
    println!();

    for path in [
        store.movies_path(),
        store.similarity_path(),
        store.manifest_path(),
    ] {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match std::fs::metadata(&path) {
            Ok(metadata) => println!(
                "   ✅ {} ({:.2} MB)",
                name,
                metadata.len() as f64 / (1024.0 * 1024.0)
            ),
            Err(_) => println!("   ❌ {} missing", name),
        }
    }

    println!();
    match store.load_manifest() {
        Ok(manifest) => {
            println!("🔍 Last build:");
            println!("   🎬 Movies: {}", manifest.movie_count);
            println!("   📖 Vocabulary: {} terms", manifest.vocabulary_size);
            println!("   📄 Source: {}", manifest.source);
            println!(
                "   🕒 Built at: {}",
                manifest.built_at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
        Err(e) => {
            println!("   ⚠️  {}", e);
        }
    }

    if !store.exists() {
        println!();
        println!("💡 Next Steps:");
        println!("   • Use 'cineverse build <catalog.csv>' to build the index");
    }

    Ok(())
}
