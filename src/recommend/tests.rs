use super::*;
use tempfile::TempDir;

fn movie(title: &str) -> MovieRecord {
    MovieRecord {
        title: title.to_string(),
        poster_path: String::new(),
        overview: String::new(),
        rating: None,
        genre: String::new(),
        director: String::new(),
        star: String::new(),
        tags: String::new(),
    }
}

fn recommender(titles: &[&str], scores: Vec<f32>, top_k: usize) -> Recommender {
    let catalog =
        Catalog::from_movies(titles.iter().map(|t| movie(t)).collect()).expect("valid catalog");
    let matrix = SimilarityMatrix::from_scores(titles.len(), scores).expect("square matrix");
    Recommender::from_parts(catalog, matrix, top_k).expect("aligned")
}

fn seven_movies() -> Recommender {
    let titles = ["A", "B", "C", "D", "E", "F", "G"];
    let first_row = [1.0, 0.9, 0.1, 0.5, 0.5, 0.0, 0.7];
    let mut scores = vec![0.0_f32; 49];
    for i in 0..7 {
        scores[i * 7 + i] = 1.0;
    }
    for (j, score) in first_row.iter().enumerate().skip(1) {
        scores[j] = *score;
        scores[j * 7] = *score;
    }
    recommender(&titles, scores, 5)
}

fn titles<'a>(recommendations: &'a [Recommendation<'_>]) -> Vec<&'a str> {
    recommendations
        .iter()
        .map(|r| r.movie.title.as_str())
        .collect()
}

#[test]
fn default_config() {
    let config = RecommenderConfig::default();
    assert_eq!(config.top_k, 5);
    assert!(config.validate().is_ok());
}

#[test]
fn set_top_k_bounds() {
    let mut config = RecommenderConfig::default();
    assert!(config.set_top_k(0).is_err());
    assert!(config.set_top_k(51).is_err());
    config.set_top_k(10).expect("valid");
    assert_eq!(config.top_k, 10);
}

#[test]
fn top_k_excludes_query_and_keeps_catalog_order_on_ties() {
    let row = [0.5, 1.0, 0.5, 0.9, 0.5];
    let top = top_k_indices(&row, 1, 3);
    assert_eq!(top, vec![(3, 0.9), (0, 0.5), (2, 0.5)]);
}

#[test]
fn top_k_excludes_query_even_when_not_highest() {
    // Query row whose own score is zero (a zero vector)
    let row = [0.0, 0.0, 0.0];
    let top = top_k_indices(&row, 0, 5);
    assert_eq!(top, vec![(1, 0.0), (2, 0.0)]);
}

#[test]
fn recommend_returns_top_five_without_query() {
    let recommender = seven_movies();
    let results = recommender.recommend("A").expect("found");

    assert_eq!(titles(&results), vec!["B", "G", "D", "E", "C"]);
    assert!((results[0].score - 0.9).abs() < f32::EPSILON);
}

#[test]
fn recommend_is_deterministic() {
    let recommender = seven_movies();
    let first = recommender.recommend("A").expect("found");
    let second = recommender.recommend("A").expect("found");
    assert_eq!(first, second);
}

#[test]
fn recommend_with_limit() {
    let recommender = seven_movies();
    let results = recommender.recommend_with_limit("A", 2).expect("found");
    assert_eq!(titles(&results), vec!["B", "G"]);
}

#[test]
fn small_catalog_returns_all_other_movies() {
    let recommender = recommender(&["A", "B", "C"], vec![1.0, 0.2, 0.3, 0.2, 1.0, 0.0, 0.3, 0.0, 1.0], 5);
    let results = recommender.recommend("A").expect("found");
    assert_eq!(titles(&results), vec!["C", "B"]);
}

#[test]
fn unknown_title_is_not_found() {
    let recommender = seven_movies();
    assert_eq!(
        recommender.recommend("Z").expect_err("unknown"),
        RecommendError::NotFound("Z".to_string())
    );
    assert!(recommender.movie("a").is_err());
    assert_eq!(recommender.movie("A").expect("found").title, "A");
}

#[test]
fn from_parts_rejects_misaligned_matrix() {
    let catalog = Catalog::from_movies(vec![movie("A"), movie("B")]).expect("valid catalog");
    let matrix = SimilarityMatrix::from_scores(1, vec![1.0]).expect("square matrix");
    assert!(matches!(
        Recommender::from_parts(catalog, matrix, 5),
        Err(ArtifactError::Misaligned(_))
    ));
}

#[test]
fn load_without_artifacts_fails() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let config = Config::with_base_dir(temp_dir.path());
    assert!(matches!(
        Recommender::load(&config),
        Err(ArtifactError::Missing { .. })
    ));
}

#[test]
fn recommendation_serializes_movie_and_score() {
    let recommender = seven_movies();
    let results = recommender.recommend_with_limit("A", 1).expect("found");
    let json = serde_json::to_value(results[0]).expect("serializes");
    assert_eq!(json["movie"]["title"], "B");
    assert!(json["score"].as_f64().is_some());
}
