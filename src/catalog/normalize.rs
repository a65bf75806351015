/// Rewrite a sized thumbnail URL to the canonical poster size.
///
/// When `marker` occurs in `url`, everything from its first occurrence on is
/// replaced by `suffix`. URLs without the marker are returned unchanged.
#[inline]
pub fn normalize_poster_url(url: &str, marker: &str, suffix: &str) -> String {
    if marker.is_empty() {
        return url.to_string();
    }

    url.split_once(marker)
        .map_or_else(|| url.to_string(), |(head, _)| format!("{head}{suffix}"))
}

/// Text fed to the vectorizer for one movie
#[inline]
pub fn build_tags(overview: &str, genre: &str, director: &str, star: &str) -> String {
    [overview, genre, director, star].join(" ").to_lowercase()
}
