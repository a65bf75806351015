// Recommend module
// Online top-k lookup over a loaded similarity matrix

#[cfg(test)]
mod tests;

pub mod display;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::{Catalog, MovieRecord};
use crate::config::{Config, ConfigError};
use crate::index::{ArtifactError, ArtifactStore};
use crate::similarity::SimilarityMatrix;

const MAX_TOP_K: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    /// Number of similar movies returned per lookup
    pub top_k: usize,
}

impl Default for RecommenderConfig {
    #[inline]
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

impl RecommenderConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_k == 0 || self.top_k > MAX_TOP_K {
            return Err(ConfigError::InvalidTopK(self.top_k));
        }
        Ok(())
    }

    #[inline]
    pub fn set_top_k(&mut self, top_k: usize) -> Result<(), ConfigError> {
        if top_k == 0 || top_k > MAX_TOP_K {
            return Err(ConfigError::InvalidTopK(top_k));
        }
        self.top_k = top_k;
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecommendError {
    #[error("Movie not found: '{0}'")]
    NotFound(String),
}

/// A similar movie and its raw cosine score
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Recommendation<'a> {
    pub movie: &'a MovieRecord,
    pub score: f32,
}

/// Indices of the `k` highest scores in `row`, never including `exclude`.
///
/// Equal scores keep their catalog order.
#[inline]
pub fn top_k_indices(row: &[f32], exclude: usize, k: usize) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = row
        .iter()
        .copied()
        .enumerate()
        .filter(|&(index, _)| index != exclude)
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(k);
    scored
}

/// Immutable lookup context: the catalog and its aligned similarity matrix
#[derive(Debug, Clone)]
pub struct Recommender {
    catalog: Catalog,
    matrix: SimilarityMatrix,
    top_k: usize,
}

impl Recommender {
    /// Load the built artifacts from the configured models directory
    #[inline]
    pub fn load(config: &Config) -> Result<Self, ArtifactError> {
        let store = ArtifactStore::new(config.models_dir());
        let (catalog, matrix) = store.load()?;
        info!(
            "Loaded recommender with {} movies from {}",
            catalog.len(),
            store.dir().display()
        );
        Self::from_parts(catalog, matrix, config.recommender.top_k)
    }

    #[inline]
    pub fn from_parts(
        catalog: Catalog,
        matrix: SimilarityMatrix,
        top_k: usize,
    ) -> Result<Self, ArtifactError> {
        if catalog.len() != matrix.size() {
            return Err(ArtifactError::Misaligned(format!(
                "{} movies but a {}x{} matrix",
                catalog.len(),
                matrix.size(),
                matrix.size()
            )));
        }
        Ok(Self {
            catalog,
            matrix,
            top_k,
        })
    }

    #[inline]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[inline]
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    #[inline]
    pub fn movie(&self, title: &str) -> Result<&MovieRecord, RecommendError> {
        self.catalog
            .position(title)
            .and_then(|index| self.catalog.get(index))
            .ok_or_else(|| RecommendError::NotFound(title.to_string()))
    }

    /// The configured number of movies most similar to `title`
    #[inline]
    pub fn recommend(&self, title: &str) -> Result<Vec<Recommendation<'_>>, RecommendError> {
        self.recommend_with_limit(title, self.top_k)
    }

    #[inline]
    pub fn recommend_with_limit(
        &self,
        title: &str,
        limit: usize,
    ) -> Result<Vec<Recommendation<'_>>, RecommendError> {
        let not_found = || RecommendError::NotFound(title.to_string());
        let index = self.catalog.position(title).ok_or_else(not_found)?;
        let row = self.matrix.row(index).ok_or_else(not_found)?;

        let recommendations = top_k_indices(row, index, limit)
            .into_iter()
            .filter_map(|(other, score)| {
                self.catalog
                    .get(other)
                    .map(|movie| Recommendation { movie, score })
            })
            .collect::<Vec<_>>();

        debug!(
            "Found {} recommendations for '{}'",
            recommendations.len(),
            title
        );
        Ok(recommendations)
    }
}
