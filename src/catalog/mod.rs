// Catalog module
// Reads the raw movie table and turns it into validated, tagged records


pub mod normalize;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::fs::File;
use std::io::Seek;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, AsArray, RecordBatch, StringArray};
use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ConfigError;
pub use normalize::{build_tags, normalize_poster_url};

/// Rows sampled when discovering the CSV header
const MAX_INFER_RECORDS: usize = 16;

/// A single movie, enriched with its derived tag text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub title: String,
    pub poster_path: String,
    pub overview: String,
    pub rating: Option<f64>,
    pub genre: String,
    pub director: String,
    pub star: String,
    /// Lowercased overview, genre, director and lead star
    pub tags: String,
}

/// A catalog row as it comes out of the input file, before validation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMovie {
    pub title: Option<String>,
    pub poster_path: Option<String>,
    pub overview: Option<String>,
    pub rating: Option<String>,
    pub genre: Option<String>,
    pub director: Option<String>,
    pub star: Option<String>,
}

/// What to do when two catalog rows share a title
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateTitlePolicy {
    #[default]
    Reject,
    KeepFirst,
}

impl fmt::Display for DuplicateTitlePolicy {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reject => f.write_str("reject"),
            Self::KeepFirst => f.write_str("keep_first"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Token marking a sized thumbnail in a poster URL
    pub poster_size_marker: String,
    /// Replacement appended after the marker is cut off
    pub poster_suffix: String,
    pub duplicate_titles: DuplicateTitlePolicy,
}

impl Default for CatalogConfig {
    #[inline]
    fn default() -> Self {
        Self {
            poster_size_marker: "._V1_".to_string(),
            poster_suffix: "._V1_UX500_.jpg".to_string(),
            duplicate_titles: DuplicateTitlePolicy::Reject,
        }
    }
}

impl CatalogConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poster_size_marker.is_empty() {
            return Err(ConfigError::EmptyPosterMarker);
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to open catalog {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Catalog is missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("Catalog column '{0}' could not be read as text")]
    UnreadableColumn(String),
    #[error("Catalog contains no movies")]
    Empty,
    #[error("Movie at row {row} has an empty title")]
    EmptyTitle { row: usize },
    #[error("Duplicate title '{title}' at rows {first} and {duplicate}")]
    DuplicateTitle {
        title: String,
        first: usize,
        duplicate: usize,
    },
    #[error("Invalid rating '{value}' at row {row}")]
    InvalidRating { row: usize, value: String },
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Ordered, title-unique movie catalog. A movie's position is its row in the
/// similarity matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    movies: Vec<MovieRecord>,
    title_index: HashMap<String, usize>,
}

impl Catalog {
    /// Read a CSV catalog with a header row
    #[inline]
    pub fn read_csv<P: AsRef<Path>>(path: P, config: &CatalogConfig) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        info!("Loading catalog from {}", path.display());

        let raw = read_raw_csv(path)?;
        debug!("Read {} raw catalog rows", raw.len());

        Self::from_raw(raw, config)
    }

    /// Validate raw rows and derive normalized posters and tags
    #[inline]
    pub fn from_raw(raw: Vec<RawMovie>, config: &CatalogConfig) -> Result<Self, CatalogError> {
        let mut movies = Vec::with_capacity(raw.len());
        let mut first_seen: HashMap<String, usize> = HashMap::with_capacity(raw.len());

        for (row, movie) in raw.into_iter().enumerate() {
            let title = movie.title.unwrap_or_default();
            if title.trim().is_empty() {
                return Err(CatalogError::EmptyTitle { row });
            }

            match first_seen.entry(title.clone()) {
                Entry::Occupied(entry) => match config.duplicate_titles {
                    DuplicateTitlePolicy::Reject => {
                        return Err(CatalogError::DuplicateTitle {
                            title,
                            first: *entry.get(),
                            duplicate: row,
                        });
                    }
                    DuplicateTitlePolicy::KeepFirst => {
                        warn!(
                            "Dropping duplicate title '{}' at row {} (first seen at row {})",
                            title,
                            row,
                            entry.get()
                        );
                        continue;
                    }
                },
                Entry::Vacant(entry) => {
                    entry.insert(row);
                }
            }

            let rating = parse_rating(movie.rating.as_deref(), row)?;
            let overview = movie.overview.unwrap_or_default();
            let genre = movie.genre.unwrap_or_default();
            let director = movie.director.unwrap_or_default();
            let star = movie.star.unwrap_or_default();
            let tags = build_tags(&overview, &genre, &director, &star);
            let poster_path = normalize_poster_url(
                movie.poster_path.as_deref().unwrap_or_default(),
                &config.poster_size_marker,
                &config.poster_suffix,
            );

            movies.push(MovieRecord {
                title,
                poster_path,
                overview,
                rating,
                genre,
                director,
                star,
                tags,
            });
        }

        Self::from_movies(movies)
    }

    /// Build a catalog from already-enriched records, e.g. a persisted artifact
    #[inline]
    pub fn from_movies(movies: Vec<MovieRecord>) -> Result<Self, CatalogError> {
        if movies.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut title_index = HashMap::with_capacity(movies.len());
        for (row, movie) in movies.iter().enumerate() {
            if movie.title.trim().is_empty() {
                return Err(CatalogError::EmptyTitle { row });
            }
            if let Some(first) = title_index.insert(movie.title.clone(), row) {
                return Err(CatalogError::DuplicateTitle {
                    title: movie.title.clone(),
                    first,
                    duplicate: row,
                });
            }
        }

        Ok(Self {
            movies,
            title_index,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.movies.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    #[inline]
    pub fn movies(&self) -> &[MovieRecord] {
        &self.movies
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&MovieRecord> {
        self.movies.get(index)
    }

    /// Row of the movie with exactly this title
    #[inline]
    pub fn position(&self, title: &str) -> Option<usize> {
        self.title_index.get(title).copied()
    }

    #[inline]
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.movies.iter().map(|m| m.title.as_str())
    }

    /// Tag text of every movie, in catalog order
    #[inline]
    pub fn tags(&self) -> Vec<&str> {
        self.movies.iter().map(|m| m.tags.as_str()).collect()
    }
}

fn parse_rating(value: Option<&str>, row: usize) -> Result<Option<f64>, CatalogError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    value
        .parse::<f64>()
        .ok()
        .filter(|r| r.is_finite())
        .map(Some)
        .ok_or_else(|| CatalogError::InvalidRating {
            row,
            value: value.to_string(),
        })
}

/// Input column name and the header spellings accepted for it
const COLUMN_ALIASES: [(&str, &[&str]); 7] = [
    ("title", &["title", "Series_Title"]),
    ("poster_path", &["poster_path", "Poster_Link", "poster_url"]),
    ("overview", &["overview", "Overview"]),
    ("rating", &["rating", "IMDB_Rating"]),
    ("genre", &["genre", "Genre"]),
    ("director", &["director", "Director"]),
    ("star", &["star", "Star1", "lead_star"]),
];

/// Positions of the catalog columns within the input schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnLayout {
    title: usize,
    poster_path: usize,
    overview: usize,
    rating: usize,
    genre: usize,
    director: usize,
    star: usize,
}

impl ColumnLayout {
    fn resolve(schema: &Schema) -> Result<Self, CatalogError> {
        let mut found = [0usize; COLUMN_ALIASES.len()];
        for (slot, (name, aliases)) in found.iter_mut().zip(COLUMN_ALIASES.iter()) {
            *slot = schema
                .fields()
                .iter()
                .position(|field| {
                    aliases
                        .iter()
                        .any(|alias| field.name().trim().eq_ignore_ascii_case(alias))
                })
                .ok_or(CatalogError::MissingColumn(*name))?;
        }

        let [title, poster_path, overview, rating, genre, director, star] = found;
        Ok(Self {
            title,
            poster_path,
            overview,
            rating,
            genre,
            director,
            star,
        })
    }

    fn extract(&self, batch: &RecordBatch, out: &mut Vec<RawMovie>) -> Result<(), CatalogError> {
        let title = text_column(batch, self.title)?;
        let poster_path = text_column(batch, self.poster_path)?;
        let overview = text_column(batch, self.overview)?;
        let rating = text_column(batch, self.rating)?;
        let genre = text_column(batch, self.genre)?;
        let director = text_column(batch, self.director)?;
        let star = text_column(batch, self.star)?;

        out.reserve(batch.num_rows());
        for row in 0..batch.num_rows() {
            out.push(RawMovie {
                title: cell(title, row),
                poster_path: cell(poster_path, row),
                overview: cell(overview, row),
                rating: cell(rating, row),
                genre: cell(genre, row),
                director: cell(director, row),
                star: cell(star, row),
            });
        }

        Ok(())
    }
}

fn text_column(batch: &RecordBatch, index: usize) -> Result<&StringArray, CatalogError> {
    batch
        .column(index)
        .as_string_opt::<i32>()
        .ok_or_else(|| CatalogError::UnreadableColumn(batch.schema().field(index).name().clone()))
}

fn cell(array: &StringArray, row: usize) -> Option<String> {
    (!array.is_null(row)).then(|| array.value(row).to_string())
}

fn read_raw_csv(path: &Path) -> Result<Vec<RawMovie>, CatalogError> {
    let mut file = File::open(path).map_err(|source| CatalogError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let format = Format::default().with_header(true);
    let (inferred, _) = format.infer_schema(&mut file, Some(MAX_INFER_RECORDS))?;
    file.rewind()?;

    // Read everything as text so a stray value never fails type inference
    let schema = Arc::new(Schema::new(
        inferred
            .fields()
            .iter()
            .map(|field| Field::new(field.name(), DataType::Utf8, true))
            .collect::<Vec<_>>(),
    ));
    let layout = ColumnLayout::resolve(&schema)?;

    let reader = ReaderBuilder::new(schema)
        .with_format(format)
        .build(file)?;

    let mut raw = Vec::new();
    for batch in reader {
        layout.extract(&batch?, &mut raw)?;
    }

    Ok(raw)
}
