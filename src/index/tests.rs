use super::*;
use crate::catalog::{CatalogConfig, RawMovie};
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/movies.csv")
}

fn catalog(rows: &[(&str, &str)]) -> Catalog {
    let raw = rows
        .iter()
        .map(|(title, overview)| RawMovie {
            title: Some((*title).to_string()),
            overview: Some((*overview).to_string()),
            ..RawMovie::default()
        })
        .collect();
    Catalog::from_raw(raw, &CatalogConfig::default()).expect("valid catalog")
}

#[test]
fn identical_tags_score_one_and_disjoint_tags_zero() {
    let built = build_index(
        catalog(&[
            ("A", "space pirates galaxy"),
            ("B", "space pirates galaxy"),
            ("C", "cooking romance paris"),
        ]),
        &VectorizerConfig::default(),
        &ProgressBar::hidden(),
    )
    .expect("builds");

    let ab = built.matrix.get(0, 1).expect("in bounds");
    let ac = built.matrix.get(0, 2).expect("in bounds");
    assert!((ab - 1.0).abs() < 1e-6);
    assert!(ac.abs() < 1e-6);
    assert_eq!(built.vocabulary.len(), 6);
}

#[test]
fn stop_word_only_movie_has_zero_row() {
    let built = build_index(
        catalog(&[("A", "the of and"), ("B", "robot uprising")]),
        &VectorizerConfig::default(),
        &ProgressBar::hidden(),
    )
    .expect("builds");

    assert_eq!(built.matrix.row(0), Some(&[0.0_f32, 0.0][..]));
    assert_eq!(built.matrix.get(1, 1), Some(1.0));
}

#[test]
fn vocabulary_respects_max_features() {
    let config = VectorizerConfig {
        max_features: 2,
        remove_stop_words: true,
    };
    let built = build_index(
        catalog(&[("A", "alpha alpha beta"), ("B", "alpha gamma delta")]),
        &config,
        &ProgressBar::hidden(),
    )
    .expect("builds");

    assert_eq!(built.vocabulary.terms(), ["alpha", "beta"]);
}

#[test]
fn builder_persists_artifacts() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let config = Config::with_base_dir(temp_dir.path());

    let manifest = IndexBuilder::new(&config)
        .with_progress(false)
        .build(fixture_path())
        .expect("builds");
    assert_eq!(manifest.movie_count, 9);
    assert!(manifest.vocabulary_size > 0);

    let store = ArtifactStore::new(config.models_dir());
    assert!(store.exists());
    assert_eq!(store.load_manifest().expect("manifest loads"), manifest);

    let (catalog, matrix) = store.load().expect("artifacts load");
    assert_eq!(catalog.len(), 9);
    assert_eq!(matrix.size(), 9);
}

#[test]
fn builder_fails_on_missing_catalog() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let config = Config::with_base_dir(temp_dir.path());

    let result = IndexBuilder::new(&config)
        .with_progress(false)
        .build(temp_dir.path().join("missing.csv"));
    assert!(matches!(result, Err(crate::CineError::Catalog(_))));
    assert!(!ArtifactStore::new(config.models_dir()).exists());
}
