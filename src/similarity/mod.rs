// Similarity module
// Pairwise cosine similarity between count vectors


use indicatif::ProgressBar;
use tracing::debug;

use crate::vectorize::CountVector;

/// Cosine of the angle between two count vectors.
///
/// A zero vector has similarity 0 with every vector, itself included.
#[inline]
pub fn cosine(a: &CountVector, b: &CountVector) -> f64 {
    if a.is_zero() || b.is_zero() {
        return 0.0;
    }
    (a.dot(b) / (a.norm() * b.norm())).clamp(0.0, 1.0)
}

/// Dense, symmetric N×N similarity table stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    scores: Vec<f32>,
}

impl SimilarityMatrix {
    /// Compute every pairwise similarity without progress reporting
    #[inline]
    pub fn compute(vectors: &[CountVector]) -> Self {
        Self::compute_with_progress(vectors, &ProgressBar::hidden())
    }

    /// Compute the upper triangle and mirror it, advancing `progress` once per row
    #[inline]
    pub fn compute_with_progress(vectors: &[CountVector], progress: &ProgressBar) -> Self {
        let size = vectors.len();
        let mut scores = vec![0.0_f32; size * size];
        progress.set_length(size as u64);

        for (i, left) in vectors.iter().enumerate() {
            if !left.is_zero() {
                scores[i * size + i] = 1.0;
            }
            for (j, right) in vectors.iter().enumerate().skip(i + 1) {
                let score = cosine(left, right) as f32;
                scores[i * size + j] = score;
                scores[j * size + i] = score;
            }
            progress.inc(1);
        }

        debug!("Computed {}x{} similarity matrix", size, size);
        Self { size, scores }
    }

    /// Rebuild a matrix from row-major scores, `None` unless there are size² of them
    #[inline]
    pub fn from_scores(size: usize, scores: Vec<f32>) -> Option<Self> {
        (size.checked_mul(size) == Some(scores.len())).then_some(Self { size, scores })
    }

    /// Number of rows (and columns)
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        (index < self.size).then(|| {
            let start = index * self.size;
            &self.scores[start..start + self.size]
        })
    }

    #[inline]
    pub fn get(&self, row: usize, column: usize) -> Option<f32> {
        if row < self.size && column < self.size {
            self.scores.get(row * self.size + column).copied()
        } else {
            None
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.scores
    }
}
