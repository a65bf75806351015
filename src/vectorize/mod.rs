// Vectorize module
// Bag-of-words count vectors over a bounded, frequency-ranked vocabulary


pub mod stop_words;

use std::collections::HashMap;

use fancy_regex::Regex;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::ConfigError;
pub use stop_words::{ENGLISH_STOP_WORDS, is_stop_word};

/// Word tokens of at least two word characters
const TOKEN_PATTERN: &str = r"\b\w\w+\b";

const MAX_FEATURES_LIMIT: usize = 100_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    /// Upper bound on the vocabulary size
    pub max_features: usize,
    pub remove_stop_words: bool,
}

impl Default for VectorizerConfig {
    #[inline]
    fn default() -> Self {
        Self {
            max_features: 5000,
            remove_stop_words: true,
        }
    }
}

impl VectorizerConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_features == 0 || self.max_features > MAX_FEATURES_LIMIT {
            return Err(ConfigError::InvalidMaxFeatures(self.max_features));
        }
        Ok(())
    }

    #[inline]
    pub fn set_max_features(&mut self, max_features: usize) -> Result<(), ConfigError> {
        if max_features == 0 || max_features > MAX_FEATURES_LIMIT {
            return Err(ConfigError::InvalidMaxFeatures(max_features));
        }
        self.max_features = max_features;
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum VectorizeError {
    #[error("Token pattern error: {0}")]
    Pattern(#[from] fancy_regex::Error),
    #[error("Vocabulary does not fit in a u32 index: {0} terms")]
    VocabularyTooLarge(usize),
}

/// Splits lowercased text into word tokens, optionally dropping stop words
#[derive(Debug, Clone)]
pub struct Tokenizer {
    pattern: Regex,
    remove_stop_words: bool,
}

impl Tokenizer {
    #[inline]
    pub fn new(remove_stop_words: bool) -> Result<Self, VectorizeError> {
        Ok(Self {
            pattern: Regex::new(TOKEN_PATTERN)?,
            remove_stop_words,
        })
    }

    #[inline]
    pub fn tokenize(&self, text: &str) -> Result<Vec<String>, VectorizeError> {
        let lowered = text.to_lowercase();
        let mut tokens = Vec::new();
        for found in self.pattern.find_iter(&lowered) {
            let token = found?.as_str();
            if self.remove_stop_words && is_stop_word(token) {
                continue;
            }
            tokens.push(token.to_string());
        }
        Ok(tokens)
    }
}

/// Retained terms, with column indices assigned in alphabetical order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    terms: Vec<String>,
    index: HashMap<String, u32>,
}

impl Vocabulary {
    fn from_sorted_terms(terms: Vec<String>) -> Result<Self, VectorizeError> {
        let mut index = HashMap::with_capacity(terms.len());
        for (position, term) in terms.iter().enumerate() {
            let column =
                u32::try_from(position).map_err(|_| VectorizeError::VocabularyTooLarge(terms.len()))?;
            index.insert(term.clone(), column);
        }
        Ok(Self { terms, index })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    #[inline]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    #[inline]
    pub fn column(&self, term: &str) -> Option<u32> {
        self.index.get(term).copied()
    }
}

/// Sparse term counts for one document, sorted by column
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountVector {
    entries: Vec<(u32, u32)>,
    norm: f64,
}

impl CountVector {
    #[inline]
    pub fn from_entries(mut entries: Vec<(u32, u32)>) -> Self {
        entries.retain(|&(_, count)| count > 0);
        entries.sort_unstable_by_key(|&(column, _)| column);
        let norm = entries
            .iter()
            .map(|&(_, count)| f64::from(count) * f64::from(count))
            .sum::<f64>()
            .sqrt();
        Self { entries, norm }
    }

    #[inline]
    pub fn entries(&self) -> &[(u32, u32)] {
        &self.entries
    }

    /// Euclidean length
    #[inline]
    pub fn norm(&self) -> f64 {
        self.norm
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn dot(&self, other: &Self) -> f64 {
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while let (Some(&(left, a)), Some(&(right, b))) = (self.entries.get(i), other.entries.get(j)) {
            match left.cmp(&right) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    sum += f64::from(a) * f64::from(b);
                    i += 1;
                    j += 1;
                }
            }
        }
        sum
    }
}

/// Learns a vocabulary from a corpus and turns documents into count vectors
#[derive(Debug, Clone)]
pub struct CountVectorizer {
    tokenizer: Tokenizer,
    max_features: usize,
}

impl CountVectorizer {
    #[inline]
    pub fn new(config: &VectorizerConfig) -> Result<Self, VectorizeError> {
        Ok(Self {
            tokenizer: Tokenizer::new(config.remove_stop_words)?,
            max_features: config.max_features,
        })
    }

    /// Keep the `max_features` terms with the highest corpus-wide counts.
    ///
    /// Ties at the cut-off go to the alphabetically smaller term.
    #[inline]
    pub fn fit<S: AsRef<str>>(&self, documents: &[S]) -> Result<Vocabulary, VectorizeError> {
        let mut totals: HashMap<String, u64> = HashMap::new();
        for document in documents {
            for token in self.tokenizer.tokenize(document.as_ref())? {
                *totals.entry(token).or_insert(0) += 1;
            }
        }
        let distinct = totals.len();

        let terms = totals
            .into_iter()
            .sorted_by(|(a_term, a_count), (b_term, b_count)| {
                b_count.cmp(a_count).then_with(|| a_term.cmp(b_term))
            })
            .take(self.max_features)
            .map(|(term, _)| term)
            .sorted()
            .collect::<Vec<_>>();

        debug!(
            "Vocabulary keeps {} of {} distinct terms",
            terms.len(),
            distinct
        );

        Vocabulary::from_sorted_terms(terms)
    }

    /// Count in-vocabulary tokens of one document; other tokens are dropped
    #[inline]
    pub fn transform(
        &self,
        vocabulary: &Vocabulary,
        document: &str,
    ) -> Result<CountVector, VectorizeError> {
        let mut counts: HashMap<u32, u32> = HashMap::new();
        for token in self.tokenizer.tokenize(document)? {
            if let Some(column) = vocabulary.column(&token) {
                *counts.entry(column).or_insert(0) += 1;
            }
        }
        Ok(CountVector::from_entries(counts.into_iter().collect()))
    }

    #[inline]
    pub fn fit_transform<S: AsRef<str>>(
        &self,
        documents: &[S],
    ) -> Result<(Vocabulary, Vec<CountVector>), VectorizeError> {
        let vocabulary = self.fit(documents)?;
        let vectors = documents
            .iter()
            .map(|document| self.transform(&vocabulary, document.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((vocabulary, vectors))
    }
}
