
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, AsArray, FixedSizeListArray, Float32Array, Float64Array, RecordBatch,
    StringArray,
};
use arrow::datatypes::{DataType, Field, Float32Type, Float64Type, Schema, SchemaRef};
use arrow::error::ArrowError;
use arrow::ipc::reader::FileReader;
use arrow::ipc::writer::FileWriter;
use thiserror::Error;
use tracing::{debug, info};

use super::BuildManifest;
use crate::catalog::{Catalog, MovieRecord};
use crate::similarity::SimilarityMatrix;

pub const MOVIES_FILE: &str = "movies.arrow";
pub const SIMILARITY_FILE: &str = "similarity.arrow";
pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Artifact not found: {} (run 'cineverse build <catalog.csv>' first)", path.display())]
    Missing { path: PathBuf },
    #[error(
        "Artifact {} is corrupt: {reason} (run 'cineverse build <catalog.csv>' to rebuild the index)",
        path.display()
    )]
    Corrupt { path: PathBuf, reason: String },
    #[error(
        "Catalog and similarity matrix do not match: {0} (run 'cineverse build <catalog.csv>' to rebuild the index)"
    )]
    Misaligned(String),
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reads and writes the built artifacts inside one directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    #[inline]
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    #[inline]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[inline]
    pub fn movies_path(&self) -> PathBuf {
        self.dir.join(MOVIES_FILE)
    }

    #[inline]
    pub fn similarity_path(&self) -> PathBuf {
        self.dir.join(SIMILARITY_FILE)
    }

    #[inline]
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// Whether both the catalog and matrix files are present
    #[inline]
    pub fn exists(&self) -> bool {
        self.movies_path().is_file() && self.similarity_path().is_file()
    }

    /// Write every artifact to a temporary sibling, then move them all into place
    #[inline]
    pub fn save(
        &self,
        catalog: &Catalog,
        matrix: &SimilarityMatrix,
        manifest: &BuildManifest,
    ) -> Result<(), ArtifactError> {
        if catalog.len() != matrix.size() {
            return Err(ArtifactError::Misaligned(format!(
                "{} movies but a {}x{} matrix",
                catalog.len(),
                matrix.size(),
                matrix.size()
            )));
        }

        fs::create_dir_all(&self.dir)?;

        let movies_tmp = temp_path(&self.movies_path());
        let similarity_tmp = temp_path(&self.similarity_path());
        let manifest_tmp = temp_path(&self.manifest_path());

        let written = write_movies_and_matrix(catalog, matrix, &movies_tmp, &similarity_tmp)
            .and_then(|()| {
                fs::write(&manifest_tmp, serde_json::to_vec_pretty(manifest)?)?;
                Ok(())
            });

        if let Err(e) = written {
            for tmp in [&movies_tmp, &similarity_tmp, &manifest_tmp] {
                let _ = fs::remove_file(tmp);
            }
            return Err(e);
        }

        fs::rename(&movies_tmp, self.movies_path())?;
        fs::rename(&similarity_tmp, self.similarity_path())?;
        fs::rename(&manifest_tmp, self.manifest_path())?;

        info!("Saved index artifacts to {}", self.dir.display());
        Ok(())
    }

    /// Load the catalog and matrix, checking that they describe the same movies in the same order
    #[inline]
    pub fn load(&self) -> Result<(Catalog, SimilarityMatrix), ArtifactError> {
        let movies_path = self.movies_path();
        let similarity_path = self.similarity_path();

        let movies = read_movies(&movies_path)?;
        let catalog = Catalog::from_movies(movies).map_err(|e| ArtifactError::Corrupt {
            path: movies_path.clone(),
            reason: e.to_string(),
        })?;

        let (titles, matrix) = read_similarity(&similarity_path)?;
        check_alignment(&catalog, &titles, &matrix)?;

        debug!(
            "Loaded {} movies and a {}x{} matrix from {}",
            catalog.len(),
            matrix.size(),
            matrix.size(),
            self.dir.display()
        );
        Ok((catalog, matrix))
    }

    #[inline]
    pub fn load_manifest(&self) -> Result<BuildManifest, ArtifactError> {
        let path = self.manifest_path();
        let content = fs::read(&path).map_err(|e| not_found_or(e, &path))?;
        Ok(serde_json::from_slice(&content)?)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn not_found_or(error: std::io::Error, path: &Path) -> ArtifactError {
    if error.kind() == std::io::ErrorKind::NotFound {
        ArtifactError::Missing {
            path: path.to_path_buf(),
        }
    } else {
        ArtifactError::Io(error)
    }
}

fn corrupt(path: &Path, reason: impl Into<String>) -> ArtifactError {
    ArtifactError::Corrupt {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

fn check_alignment(
    catalog: &Catalog,
    titles: &[String],
    matrix: &SimilarityMatrix,
) -> Result<(), ArtifactError> {
    if catalog.len() != matrix.size() || titles.len() != matrix.size() {
        return Err(ArtifactError::Misaligned(format!(
            "{} movies but a {}x{} matrix",
            catalog.len(),
            matrix.size(),
            matrix.size()
        )));
    }

    if let Some((row, (expected, found))) = catalog
        .titles()
        .zip(titles)
        .enumerate()
        .find(|(_, (expected, found))| *expected != found.as_str())
    {
        return Err(ArtifactError::Misaligned(format!(
            "row {row} is '{expected}' in the catalog but '{found}' in the matrix"
        )));
    }

    Ok(())
}

fn movies_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("title", DataType::Utf8, false),
        Field::new("poster_path", DataType::Utf8, false),
        Field::new("overview", DataType::Utf8, false),
        Field::new("rating", DataType::Float64, true),
        Field::new("genre", DataType::Utf8, false),
        Field::new("director", DataType::Utf8, false),
        Field::new("star", DataType::Utf8, false),
        Field::new("tags", DataType::Utf8, false),
    ]))
}

fn similarity_schema(size: i32) -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("title", DataType::Utf8, false),
        Field::new(
            "scores",
            DataType::FixedSizeList(
                Arc::new(Field::new("item", DataType::Float32, false)),
                size,
            ),
            false,
        ),
    ]))
}

fn movies_batch(catalog: &Catalog) -> Result<RecordBatch, ArtifactError> {
    let movies = catalog.movies();
    let text = |field: fn(&MovieRecord) -> &str| -> ArrayRef {
        Arc::new(StringArray::from_iter_values(movies.iter().map(field)))
    };
    let rating: Float64Array = movies.iter().map(|m| m.rating).collect();

    let arrays: Vec<ArrayRef> = vec![
        text(|m| m.title.as_str()),
        text(|m| m.poster_path.as_str()),
        text(|m| m.overview.as_str()),
        Arc::new(rating),
        text(|m| m.genre.as_str()),
        text(|m| m.director.as_str()),
        text(|m| m.star.as_str()),
        text(|m| m.tags.as_str()),
    ];

    Ok(RecordBatch::try_new(movies_schema(), arrays)?)
}

fn similarity_batch(
    catalog: &Catalog,
    matrix: &SimilarityMatrix,
) -> Result<RecordBatch, ArtifactError> {
    let size = i32::try_from(matrix.size()).map_err(|_| {
        ArrowError::InvalidArgumentError(format!("{} movies exceed the list size limit", matrix.size()))
    })?;

    let values = Float32Array::from(matrix.as_slice().to_vec());
    let field = Arc::new(Field::new("item", DataType::Float32, false));
    let scores = FixedSizeListArray::try_new(field, size, Arc::new(values), None)?;

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from_iter_values(catalog.titles())),
        Arc::new(scores),
    ];

    Ok(RecordBatch::try_new(similarity_schema(size), arrays)?)
}

fn write_movies_and_matrix(
    catalog: &Catalog,
    matrix: &SimilarityMatrix,
    movies_path: &Path,
    similarity_path: &Path,
) -> Result<(), ArtifactError> {
    write_batch(movies_path, &movies_batch(catalog)?)?;
    write_batch(similarity_path, &similarity_batch(catalog, matrix)?)
}

fn write_batch(path: &Path, batch: &RecordBatch) -> Result<(), ArtifactError> {
    let file = BufWriter::new(File::create(path)?);
    let mut writer = FileWriter::try_new(file, &batch.schema())?;
    writer.write(batch)?;
    writer.into_inner()?.flush()?;
    Ok(())
}

fn read_batches(path: &Path) -> Result<Vec<RecordBatch>, ArtifactError> {
    let file = File::open(path).map_err(|e| not_found_or(e, path))?;
    let reader = FileReader::try_new(file, None).map_err(|e| corrupt(path, e.to_string()))?;
    reader
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| corrupt(path, e.to_string()))
}

fn string_column<'b>(
    batch: &'b RecordBatch,
    name: &str,
    path: &Path,
) -> Result<&'b StringArray, ArtifactError> {
    batch
        .column_by_name(name)
        .and_then(|column| column.as_string_opt::<i32>())
        .ok_or_else(|| corrupt(path, format!("missing or invalid '{name}' column")))
}

fn read_movies(path: &Path) -> Result<Vec<MovieRecord>, ArtifactError> {
    let mut movies = Vec::new();

    for batch in read_batches(path)? {
        let title = string_column(&batch, "title", path)?;
        let poster_path = string_column(&batch, "poster_path", path)?;
        let overview = string_column(&batch, "overview", path)?;
        let genre = string_column(&batch, "genre", path)?;
        let director = string_column(&batch, "director", path)?;
        let star = string_column(&batch, "star", path)?;
        let tags = string_column(&batch, "tags", path)?;
        let rating = batch
            .column_by_name("rating")
            .and_then(|column| column.as_primitive_opt::<Float64Type>())
            .ok_or_else(|| corrupt(path, "missing or invalid 'rating' column"))?;

        for row in 0..batch.num_rows() {
            movies.push(MovieRecord {
                title: title.value(row).to_string(),
                poster_path: poster_path.value(row).to_string(),
                overview: overview.value(row).to_string(),
                rating: (!rating.is_null(row)).then(|| rating.value(row)),
                genre: genre.value(row).to_string(),
                director: director.value(row).to_string(),
                star: star.value(row).to_string(),
                tags: tags.value(row).to_string(),
            });
        }
    }

    Ok(movies)
}

fn read_similarity(path: &Path) -> Result<(Vec<String>, SimilarityMatrix), ArtifactError> {
    let mut titles = Vec::new();
    let mut scores = Vec::new();

    for batch in read_batches(path)? {
        let title = string_column(&batch, "title", path)?;
        let rows = batch
            .column_by_name("scores")
            .and_then(|column| column.as_fixed_size_list_opt())
            .ok_or_else(|| corrupt(path, "missing or invalid 'scores' column"))?;

        for row in 0..batch.num_rows() {
            if rows.is_null(row) {
                return Err(corrupt(path, format!("row {row} has no scores")));
            }
            let values = rows.value(row);
            let values = values
                .as_primitive_opt::<Float32Type>()
                .ok_or_else(|| corrupt(path, "scores are not 32-bit floats"))?;
            titles.push(title.value(row).to_string());
            scores.extend_from_slice(values.values());
        }
    }

    let size = titles.len();
    let matrix = SimilarityMatrix::from_scores(size, scores)
        .ok_or_else(|| corrupt(path, format!("scores do not form a {size}x{size} matrix")))?;

    Ok((titles, matrix))
}
