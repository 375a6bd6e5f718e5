//! Subtitle URL extraction

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

static ABSOLUTE_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)https?://[^\s"'<>,;()\\]+"#).expect("absolute url regex should compile")
});

/// Collects absolute `.vtt` / `.srt` URLs from a page
///
/// Subtitles are optional, so an empty set is a normal result.
pub fn extract_subtitle_urls(html: &str) -> BTreeSet<String> {
    ABSOLUTE_URL_REGEX
        .find_iter(html)
        .map(|m| m.as_str())
        .filter(|url| is_subtitle_url(url))
        .map(str::to_string)
        .collect()
}

fn is_subtitle_url(url: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or(url).to_ascii_lowercase();
    path.ends_with(".vtt") || path.ends_with(".srt")
}
