//! Presentation of raw similarity scores. Nothing in the lookup path depends
//! on these numbers.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Factor applied to the raw score before it is shown as a percentage
    pub score_multiplier: f64,
    /// Highest percentage ever shown
    pub score_ceiling: u8,
    /// Percentages above this are highlighted
    pub highlight_threshold: u8,
    /// Web search endpoint used for per-title links
    pub search_url: String,
}

impl Default for DisplayConfig {
    #[inline]
    fn default() -> Self {
        Self {
            score_multiplier: 1.0,
            score_ceiling: 100,
            highlight_threshold: 70,
            search_url: "https://www.google.com/search".to_string(),
        }
    }
}

impl DisplayConfig {
    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_multiplier(self.score_multiplier)?;
        check_ceiling(self.score_ceiling)?;
        if self.highlight_threshold > 100 {
            return Err(ConfigError::InvalidHighlightThreshold(
                self.highlight_threshold,
            ));
        }
        parse_search_url(&self.search_url)?;
        Ok(())
    }

    #[inline]
    pub fn set_score_multiplier(&mut self, multiplier: f64) -> Result<(), ConfigError> {
        check_multiplier(multiplier)?;
        self.score_multiplier = multiplier;
        Ok(())
    }

    #[inline]
    pub fn set_score_ceiling(&mut self, ceiling: u8) -> Result<(), ConfigError> {
        check_ceiling(ceiling)?;
        self.score_ceiling = ceiling;
        Ok(())
    }

    /// `min(floor(score * 100 * multiplier), ceiling)`, never below zero
    #[inline]
    pub fn match_percent(&self, score: f32) -> u8 {
        let scaled = (f64::from(score) * 100.0 * self.score_multiplier).floor();
        if scaled.is_nan() || scaled <= 0.0 {
            return 0;
        }
        let ceiling = self.score_ceiling.min(100);
        if scaled >= f64::from(ceiling) {
            ceiling
        } else {
            // In 0..ceiling, so the cast is exact
            scaled as u8
        }
    }

    #[inline]
    pub fn is_highlighted(&self, percent: u8) -> bool {
        percent > self.highlight_threshold
    }

    /// Search link for a title, e.g. `...?q=Heat+movie`
    #[inline]
    pub fn search_link(&self, title: &str) -> Result<Url, ConfigError> {
        let base = parse_search_url(&self.search_url)?;
        Url::parse_with_params(base.as_str(), [("q", format!("{title} movie"))])
            .map_err(|_| ConfigError::InvalidSearchUrl(self.search_url.clone()))
    }
}

fn check_multiplier(multiplier: f64) -> Result<(), ConfigError> {
    if !(multiplier > 0.0 && multiplier <= 10.0) {
        return Err(ConfigError::InvalidScoreMultiplier(multiplier));
    }
    Ok(())
}

fn check_ceiling(ceiling: u8) -> Result<(), ConfigError> {
    if ceiling == 0 || ceiling > 100 {
        return Err(ConfigError::InvalidScoreCeiling(ceiling));
    }
    Ok(())
}

fn parse_search_url(raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
        .ok_or_else(|| ConfigError::InvalidSearchUrl(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_transform_is_plain_percentage() {
        let display = DisplayConfig::default();
        assert_eq!(display.match_percent(0.0), 0);
        assert_eq!(display.match_percent(0.456), 45);
        assert_eq!(display.match_percent(1.0), 100);
    }

    #[test]
    fn multiplier_and_ceiling_apply() {
        let display = DisplayConfig {
            score_multiplier: 2.0,
            score_ceiling: 95,
            ..DisplayConfig::default()
        };
        assert_eq!(display.match_percent(0.3), 60);
        assert_eq!(display.match_percent(0.6), 95);
    }

    #[test]
    fn highlight_is_strictly_above_threshold() {
        let display = DisplayConfig::default();
        assert!(!display.is_highlighted(70));
        assert!(display.is_highlighted(71));
    }

    #[test]
    fn search_link_encodes_title() {
        let display = DisplayConfig::default();
        let link = display.search_link("Amélie & Co").expect("valid link");
        assert_eq!(
            link.as_str(),
            "https://www.google.com/search?q=Am%C3%A9lie+%26+Co+movie"
        );
    }

    #[test]
    fn setters_reject_out_of_range_values() {
        let mut display = DisplayConfig::default();
        assert!(display.set_score_multiplier(0.0).is_err());
        assert!(display.set_score_multiplier(f64::NAN).is_err());
        assert!(display.set_score_ceiling(101).is_err());
        display.set_score_multiplier(1.5).expect("valid multiplier");
        display.set_score_ceiling(90).expect("valid ceiling");
        assert_eq!(display.score_ceiling, 90);
    }

    #[test]
    fn validate_rejects_bad_urls() {
        let mut display = DisplayConfig::default();
        display.search_url = "not a url".to_string();
        assert!(display.validate().is_err());

        display.search_url = "https://duckduckgo.com/".to_string();
        assert!(display.validate().is_ok());
    }
}
