//! Stream descriptor extraction
//!
//! The final page configures its player with one or more `file: '...'`
//! assignments. A single value can carry several alternatives joined by
//! ` or `, some of them with a `{vN}` host placeholder.

use std::sync::LazyLock;

use regex::Regex;

use crate::url::normalize_protocol_relative;

const MANIFEST_EXTENSION: &str = ".m3u8";

static FILE_DESCRIPTOR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bfile\s*:\s*(?:'([^']*)'|"([^"]*)")"#).expect("file descriptor regex should compile")
});
static ALTERNATIVE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+or\s+").expect("alternative separator regex should compile"));

/// Extracts every `file:` descriptor value in document order
///
/// Both single- and double-quoted values are recognized. Values are returned
/// raw, before splitting on the alternative separator.
pub fn extract_file_descriptors(html: &str) -> Vec<String> {
    FILE_DESCRIPTOR_REGEX
        .captures_iter(html)
        .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Splits a descriptor value into its alternatives and keeps HLS manifests
///
/// # Example
/// ```
/// use vidsrc_core::parser::split_alternatives;
/// let urls = split_alternatives("https://a.example/x.m3u8 or https://a.example/y.mp4");
/// assert_eq!(urls, vec!["https://a.example/x.m3u8".to_string()]);
/// ```
pub fn split_alternatives(descriptor: &str) -> Vec<String> {
    ALTERNATIVE_SEPARATOR
        .split(descriptor)
        .map(str::trim)
        .filter(|piece| is_manifest_url(piece))
        .map(normalize_protocol_relative)
        .collect()
}

/// Flattens all descriptors on a page into candidate manifest URLs
///
/// Order is descriptor order, then alternative order within a descriptor.
pub fn extract_stream_candidates(html: &str) -> Vec<String> {
    extract_file_descriptors(html)
        .iter()
        .flat_map(|descriptor| split_alternatives(descriptor))
        .collect()
}

/// True if the URL path (query and fragment ignored) ends in `.m3u8`
fn is_manifest_url(piece: &str) -> bool {
    if piece.is_empty() || piece.contains(char::is_whitespace) {
        return false;
    }
    let path = piece.split(['?', '#']).next().unwrap_or(piece);
    path.to_ascii_lowercase().ends_with(MANIFEST_EXTENSION)
}
