//! URL helper functions for the embed chain
//!
//! Provides functions for building entry URLs and turning extracted hop
//! references into absolute URLs.

use url::Url;

use crate::types::{MediaKind, StreamRequest};

/// Default embed provider origin
pub const DEFAULT_PROVIDER: &str = "https://vidsrc.xyz";

/// Builds the entry embed URL for a request
///
/// Season and episode are interpolated verbatim.
///
/// # Example
/// ```
/// use vidsrc_core::StreamRequest;
/// use vidsrc_core::url::build_entry_url;
/// let url = build_entry_url("https://vidsrc.xyz", &StreamRequest::episode("1396", 1, 2));
/// assert_eq!(url, "https://vidsrc.xyz/embed/tv?tmdb=1396&season=1&episode=2");
/// ```
pub fn build_entry_url(provider: &str, request: &StreamRequest) -> String {
    let provider = provider.trim_end_matches('/');
    let id = urlencoding::encode(&request.content_id);
    match request.kind {
        MediaKind::Movie => format!("{}/embed/movie?tmdb={}", provider, id),
        MediaKind::Series { season, episode } => format!(
            "{}/embed/tv?tmdb={}&season={}&episode={}",
            provider, id, season, episode
        ),
    }
}

/// Rewrites a protocol-relative reference (`//host/path`) to `https://host/path`
///
/// # Example
/// ```
/// use vidsrc_core::url::normalize_protocol_relative;
/// assert_eq!(
///     normalize_protocol_relative("//cloudnestra.com/rcp/abc"),
///     "https://cloudnestra.com/rcp/abc"
/// );
/// ```
pub fn normalize_protocol_relative(reference: &str) -> String {
    match reference.strip_prefix("//") {
        Some(rest) => format!("https://{}", rest),
        None => reference.to_string(),
    }
}

/// Resolves an extracted reference against the page it was found on
///
/// Protocol-relative references become `https:`; relative ones are joined
/// onto `base`. Returns `None` if either side cannot be parsed.
pub fn absolutize(base: &str, reference: &str) -> Option<String> {
    let reference = normalize_protocol_relative(reference.trim());
    if let Ok(url) = Url::parse(&reference) {
        return Some(url.to_string());
    }
    let base = Url::parse(base).ok()?;
    base.join(&reference).ok().map(|u| u.to_string())
}

/// Joins a path onto the origin of `page_url`, discarding the page's own path
///
/// # Example
/// ```
/// use vidsrc_core::url::join_origin;
/// let url = join_origin("https://cloudnestra.com/rcp/abc", "/prorcp/xyz");
/// assert_eq!(url.as_deref(), Some("https://cloudnestra.com/prorcp/xyz"));
/// ```
pub fn join_origin(page_url: &str, path: &str) -> Option<String> {
    let page = Url::parse(page_url).ok()?;
    let origin = page.origin();
    if !origin.is_tuple() {
        return None;
    }
    let origin = Url::parse(&origin.ascii_serialization()).ok()?;
    let path = path.trim();
    let joined = if path.starts_with('/') {
        origin.join(path)
    } else {
        origin.join(&format!("/{}", path))
    };
    joined.ok().map(|u| u.to_string())
}

/// Origin of a URL followed by a slash, the form used as a Referer header
///
/// # Example
/// ```
/// use vidsrc_core::url::referer_origin;
/// assert_eq!(
///     referer_origin("https://cloudnestra.com/prorcp/xyz").as_deref(),
///     Some("https://cloudnestra.com/")
/// );
/// ```
pub fn referer_origin(page_url: &str) -> Option<String> {
    let origin = Url::parse(page_url).ok()?.origin();
    if !origin.is_tuple() {
        return None;
    }
    Some(format!("{}/", origin.ascii_serialization()))
}
