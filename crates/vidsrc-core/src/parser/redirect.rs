//! Hop extraction for the embed redirect chain
//!
//! The entry page embeds the relay page in a frame; the relay page names the
//! final page in a script assignment.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

static RELAY_PATH_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bsrc:\s*'([^']+)'").expect("relay path regex should compile"));
static FRAME_MARKUP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<i?frame\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#)
        .expect("frame markup regex should compile")
});

/// Finds the first frame reference (`<iframe src="...">` / `<frame src="...">`)
///
/// Parses the document first, then falls back to a raw regex scan for frames
/// the HTML parser cannot see (broken markup, frames written from scripts).
///
/// # Returns
/// The raw `src` value with HTML entities decoded, or `None` if absent
pub fn extract_frame_src(html: &str) -> Option<String> {
    if let Some(src) = extract_frame_from_document(html) {
        return Some(src);
    }
    extract_frame_from_markup(html)
}

/// Finds the relay page's `src: '...'` assignment naming the final page path
///
/// Only the single-quoted form is recognized.
pub fn extract_relay_path(html: &str) -> Option<String> {
    RELAY_PATH_REGEX
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .find(|path| !path.is_empty())
        .map(str::to_string)
}

fn extract_frame_from_document(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("iframe[src], frame[src]").ok()?;

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("src"))
        .map(str::trim)
        .find(|src| !src.is_empty())
        .map(decode_html_entities)
}

fn extract_frame_from_markup(html: &str) -> Option<String> {
    FRAME_MARKUP_REGEX
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| decode_html_entities(m.as_str().trim()))
}

/// Decodes common HTML entities in URLs
pub(crate) fn decode_html_entities(url: &str) -> String {
    url.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}
