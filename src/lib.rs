use thiserror::Error;

pub type Result<T> = std::result::Result<T, CineError>;

#[derive(Error, Debug)]
pub enum CineError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] catalog::CatalogError),

    #[error("Vectorizer error: {0}")]
    Vectorize(#[from] vectorize::VectorizeError),

    #[error("Artifact error: {0}")]
    Artifact(#[from] index::ArtifactError),

    #[error("Recommendation error: {0}")]
    Recommend(#[from] recommend::RecommendError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod catalog;
pub mod commands;
pub mod config;
pub mod index;
pub mod mcp;
pub mod recommend;
pub mod similarity;
pub mod vectorize;
