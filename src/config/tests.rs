use super::*;
use serial_test::serial;
use std::fs;
use tempfile::TempDir;

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn partial_config_with_defaults() {
        let partial_toml = r#"
            [recommender]
            top_k = 10
        "#;

        let config: Config = toml::from_str(partial_toml).expect("should parse toml correctly");
        assert_eq!(config.recommender.top_k, 10);
        assert_eq!(config.vectorizer.max_features, 5000);
        assert_eq!(config.display.score_ceiling, 100);
    }

    #[test]
    fn complete_valid_config() {
        let valid_toml = r#"
            [catalog]
            poster_size_marker = "._V1_"
            poster_suffix = "._V1_UX800_.jpg"
            duplicate_titles = "keep_first"

            [vectorizer]
            max_features = 2000
            remove_stop_words = false

            [recommender]
            top_k = 3

            [display]
            score_multiplier = 1.4
            score_ceiling = 99
            highlight_threshold = 60
            search_url = "https://duckduckgo.com/"
        "#;

        let config: Config = toml::from_str(valid_toml).expect("should parse toml successfully");
        assert_eq!(config.catalog.poster_suffix, "._V1_UX800_.jpg");
        assert_eq!(config.vectorizer.max_features, 2000);
        assert!(!config.vectorizer.remove_stop_words);
        assert_eq!(config.recommender.top_k, 3);
        assert_eq!(config.display.score_ceiling, 99);
        assert_eq!(config.display.highlight_threshold, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_toml_handling() {
        let invalid_toml = r#"
            [recommender
            top_k = "five"
        "#;

        let result: Result<Config, toml::de::Error> = toml::from_str(invalid_toml);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_duplicate_policy_is_rejected() {
        let toml_content = r#"
            [catalog]
            duplicate_titles = "keep_last"
        "#;

        let result: Result<Config, toml::de::Error> = toml::from_str(toml_content);
        assert!(result.is_err());
    }

    #[test]
    fn config_file_persistence() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");
        let config_path = temp_dir.path().join("config.toml");

        let mut original_config = Config::default();
        original_config.vectorizer.max_features = 1234;

        let toml_content = toml::to_string_pretty(&original_config)
            .expect("config should convert to toml string successfully");
        fs::write(&config_path, toml_content).expect("should write to config_path successfully");

        let content =
            fs::read_to_string(&config_path).expect("should read from config_path successfully");
        let loaded_config: Config = toml::from_str(&content).expect("should parse toml correctly");

        assert_eq!(original_config, loaded_config);
    }

    #[test]
    #[serial]
    fn home_env_var_overrides_data_dir() {
        let temp_dir = TempDir::new().expect("should create TempDir successfully");
        // SAFETY: serialized with the other tests touching this variable
        unsafe { std::env::set_var(HOME_ENV_VAR, temp_dir.path()) };

        let dir = get_config_dir().expect("should resolve data dir");
        assert_eq!(dir, temp_dir.path());

        // SAFETY: see above
        unsafe { std::env::remove_var(HOME_ENV_VAR) };
    }

    #[test]
    fn error_display_messages() {
        let errors = vec![
            ConfigError::InvalidMaxFeatures(0),
            ConfigError::InvalidTopK(0),
            ConfigError::InvalidScoreMultiplier(-1.0),
            ConfigError::InvalidScoreCeiling(0),
            ConfigError::InvalidSearchUrl("invalid-url".to_string()),
            ConfigError::EmptyPosterMarker,
        ];

        for error in errors {
            let message = format!("{error}");
            assert!(message.len() > 10);
        }
    }
}
