#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// End-to-end tests: catalog file -> built artifacts -> recommendations

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use cineverse::config::Config;
use cineverse::index::{ArtifactStore, IndexBuilder};
use cineverse::recommend::{RecommendError, Recommender};
use tempfile::TempDir;

fn fixture_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/movies.csv")
}

/// Build the fixture catalog into a fresh data directory
fn build_fixture() -> (TempDir, Config) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config = Config::with_base_dir(temp_dir.path());
    IndexBuilder::new(&config)
        .with_progress(false)
        .build(fixture_path())
        .expect("fixture builds");
    (temp_dir, config)
}

fn write_catalog(dir: &Path, rows: &[(&str, &str)]) -> PathBuf {
    let mut csv = String::from("title,poster_path,overview,rating,genre,director,star\n");
    for (title, overview) in rows {
        writeln!(csv, "{title},,{overview},,,,").expect("writes row");
    }
    let path = dir.join("catalog.csv");
    fs::write(&path, csv).expect("writes catalog");
    path
}

#[test]
fn recommend_returns_five_others() {
    let (_temp_dir, config) = build_fixture();
    let recommender = Recommender::load(&config).expect("loads");

    for title in recommender.catalog().titles() {
        let results = recommender.recommend(title).expect("title is in catalog");
        assert_eq!(results.len(), 5, "five results for {title}");
        assert!(results.iter().all(|r| r.movie.title != title));
        assert!(results.iter().all(|r| (0.0..=1.0).contains(&r.score)));
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }
}

#[test]
fn related_crime_films_rank_together() {
    let (_temp_dir, config) = build_fixture();
    let recommender = Recommender::load(&config).expect("loads");

    let results = recommender.recommend("The Godfather").expect("found");
    let titles: Vec<&str> = results.iter().map(|r| r.movie.title.as_str()).collect();
    assert_eq!(titles[0], "The Godfather: Part II");
}

#[test]
fn matrix_is_symmetric_with_unit_diagonal() {
    let (_temp_dir, config) = build_fixture();
    let (catalog, matrix) = ArtifactStore::new(config.models_dir())
        .load()
        .expect("loads");

    assert_eq!(matrix.size(), catalog.len());
    for i in 0..matrix.size() {
        assert_eq!(matrix.get(i, i), Some(1.0));
        for j in 0..matrix.size() {
            assert_eq!(matrix.get(i, j), matrix.get(j, i));
        }
    }
}

#[test]
fn rebuild_produces_identical_artifacts() {
    let (_temp_dir, config) = build_fixture();
    let store = ArtifactStore::new(config.models_dir());
    let movies = fs::read(store.movies_path()).expect("reads movies");
    let similarity = fs::read(store.similarity_path()).expect("reads matrix");
    let first = Recommender::load(&config).expect("loads");
    let first_results: Vec<(String, f32)> = first
        .recommend("Inception")
        .expect("found")
        .iter()
        .map(|r| (r.movie.title.clone(), r.score))
        .collect();

    IndexBuilder::new(&config)
        .with_progress(false)
        .build(fixture_path())
        .expect("rebuilds");

    assert_eq!(fs::read(store.movies_path()).expect("reads movies"), movies);
    assert_eq!(
        fs::read(store.similarity_path()).expect("reads matrix"),
        similarity
    );

    let second = Recommender::load(&config).expect("loads");
    let second_results: Vec<(String, f32)> = second
        .recommend("Inception")
        .expect("found")
        .iter()
        .map(|r| (r.movie.title.clone(), r.score))
        .collect();
    assert_eq!(first_results, second_results);
}

#[test]
fn identical_and_disjoint_movies() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let catalog = write_catalog(
        temp_dir.path(),
        &[
            ("A", "dragon knight castle"),
            ("B", "dragon knight castle"),
            ("C", "submarine ocean captain"),
        ],
    );
    let config = Config::with_base_dir(temp_dir.path());
    IndexBuilder::new(&config)
        .with_progress(false)
        .build(&catalog)
        .expect("builds");

    let recommender = Recommender::load(&config).expect("loads");
    let results = recommender.recommend("A").expect("found");

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].movie.title, "B");
    assert!((results[0].score - 1.0).abs() < 1e-6);
    assert_eq!(results[1].movie.title, "C");
    assert!(results[1].score.abs() < 1e-6);
}

#[test]
fn stop_word_only_movie_scores_zero() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let catalog = write_catalog(
        temp_dir.path(),
        &[("Empty", "the and of"), ("Full", "lunar colony"), ("Other", "lunar base")],
    );
    let config = Config::with_base_dir(temp_dir.path());
    IndexBuilder::new(&config)
        .with_progress(false)
        .build(&catalog)
        .expect("builds");

    let (_, matrix) = ArtifactStore::new(config.models_dir())
        .load()
        .expect("loads");
    let row = matrix.row(0).expect("has row");
    assert!(row.iter().all(|score| *score == 0.0));

    let recommender = Recommender::load(&config).expect("loads");
    let results = recommender.recommend("Empty").expect("found");
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.score == 0.0 && !r.score.is_nan()));
}

#[test]
fn unknown_title_is_recoverable() {
    let (_temp_dir, config) = build_fixture();
    let recommender = Recommender::load(&config).expect("loads");

    assert_eq!(
        recommender.recommend("Not A Movie").expect_err("unknown title"),
        RecommendError::NotFound("Not A Movie".to_string())
    );
    assert!(recommender.recommend("Inception").is_ok());
}

#[test]
fn duplicate_titles_fail_the_build() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let catalog = write_catalog(
        temp_dir.path(),
        &[("Drishyam", "a family hides"), ("Drishyam", "a remake")],
    );
    let config = Config::with_base_dir(temp_dir.path());

    let result = IndexBuilder::new(&config)
        .with_progress(false)
        .build(&catalog);
    assert!(result.is_err());
    assert!(!ArtifactStore::new(config.models_dir()).exists());
}

#[test]
fn failed_rebuild_keeps_previous_artifacts() {
    let (temp_dir, config) = build_fixture();
    let broken = temp_dir.path().join("broken.csv");
    fs::write(&broken, "title,overview\nHeat,A heist\n").expect("writes catalog");

    assert!(
        IndexBuilder::new(&config)
            .with_progress(false)
            .build(&broken)
            .is_err()
    );

    let recommender = Recommender::load(&config).expect("previous index still loads");
    assert_eq!(recommender.catalog().len(), 9);
}
