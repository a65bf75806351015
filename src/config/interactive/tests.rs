use super::load_existing_config as load_existing_config_impl;
use super::{validate_max_features, validate_score_ceiling, validate_score_multiplier, validate_top_k};
use tempfile::TempDir;

#[test]
fn load_existing_config() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    let config = load_existing_config_impl(temp_dir.path()).expect("config loaded successfully");
    assert_eq!(config.get_base_dir(), temp_dir.path());
    assert!(config.vectorizer.max_features > 0);
    assert!(config.recommender.top_k > 0);
}

#[test]
fn load_existing_config_falls_back_on_invalid_file() {
    let temp_dir = TempDir::new().expect("should create TempDir successfully");
    std::fs::write(
        temp_dir.path().join("config.toml"),
        "[vectorizer]\nmax_features = 0\n",
    )
    .expect("should write config");

    let config = load_existing_config_impl(temp_dir.path()).expect("falls back to defaults");
    assert_eq!(config.vectorizer.max_features, 5000);
}

#[test]
fn prompt_validators_share_config_bounds() {
    assert!(validate_max_features(&0).is_err());
    assert!(validate_max_features(&100_001).is_err());
    assert!(validate_max_features(&100_000).is_ok());

    assert!(validate_top_k(&0).is_err());
    assert!(validate_top_k(&51).is_err());
    assert!(validate_top_k(&50).is_ok());

    assert!(validate_score_multiplier(&0.0).is_err());
    assert!(validate_score_multiplier(&1.5).is_ok());

    assert!(validate_score_ceiling(&0).is_err());
    assert!(validate_score_ceiling(&101).is_err());
    assert!(validate_score_ceiling(&100).is_ok());
}
