// Index module
// Offline build: catalog -> tags -> count vectors -> similarity matrix -> artifacts

#[cfg(test)]
mod tests;

pub mod store;

use std::path::Path;
use std::time::Instant;

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::similarity::SimilarityMatrix;
use crate::vectorize::{CountVectorizer, VectorizeError, VectorizerConfig, Vocabulary};
pub use store::{ArtifactError, ArtifactStore};

/// Informational record of a build, stored next to the artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildManifest {
    pub movie_count: usize,
    pub vocabulary_size: usize,
    pub source: String,
    pub built_at: DateTime<Utc>,
}

/// In-memory result of vectorizing a catalog
#[derive(Debug, Clone)]
pub struct BuiltIndex {
    pub catalog: Catalog,
    pub vocabulary: Vocabulary,
    pub matrix: SimilarityMatrix,
}

/// Vectorize the catalog's tags and compute the full similarity matrix.
///
/// Row i of the matrix belongs to catalog position i.
#[inline]
pub fn build_index(
    catalog: Catalog,
    config: &VectorizerConfig,
    progress: &ProgressBar,
) -> Result<BuiltIndex, VectorizeError> {
    let vectorizer = CountVectorizer::new(config)?;
    let (vocabulary, vectors) = vectorizer.fit_transform(&catalog.tags())?;
    info!(
        "Vectorized {} movies over {} terms",
        vectors.len(),
        vocabulary.len()
    );

    let matrix = SimilarityMatrix::compute_with_progress(&vectors, progress);

    Ok(BuiltIndex {
        catalog,
        vocabulary,
        matrix,
    })
}

/// Runs a full build from a catalog file into the configured models directory
#[derive(Debug)]
pub struct IndexBuilder<'a> {
    config: &'a Config,
    show_progress: bool,
}

impl<'a> IndexBuilder<'a> {
    #[inline]
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            show_progress: console::user_attended_stderr(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Read, vectorize and persist. Nothing is replaced unless every step succeeds.
    #[inline]
    pub fn build<P: AsRef<Path>>(&self, catalog_path: P) -> crate::Result<BuildManifest> {
        let catalog_path = catalog_path.as_ref();
        let started = Instant::now();

        let catalog = Catalog::read_csv(catalog_path, &self.config.catalog)?;
        info!("Catalog has {} movies", catalog.len());

        let bar = self.progress_bar();
        let built = build_index(catalog, &self.config.vectorizer, &bar)?;
        bar.finish_and_clear();

        let manifest = BuildManifest {
            movie_count: built.catalog.len(),
            vocabulary_size: built.vocabulary.len(),
            source: catalog_path.display().to_string(),
            built_at: Utc::now(),
        };

        let store = ArtifactStore::new(self.config.models_dir());
        store.save(&built.catalog, &built.matrix, &manifest)?;

        info!(
            "Index built in {:.2?}: {} movies, {} terms, saved to {}",
            started.elapsed(),
            manifest.movie_count,
            manifest.vocabulary_size,
            store.dir().display()
        );

        Ok(manifest)
    }

    fn progress_bar(&self) -> ProgressBar {
        if self.show_progress {
            ProgressBar::new(0).with_style(
                ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} Scoring movies")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            )
        } else {
            ProgressBar::hidden()
        }
    }
}
