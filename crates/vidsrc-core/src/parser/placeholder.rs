//! Host placeholder resolution
//!
//! Candidate URLs may name their host as `{v1}`, `{v2}`, ... optionally behind
//! a sub-host label (`tmstr5.{v1}`). The placeholder is replaced with a base
//! domain chosen from the discovered servers.

use std::sync::LazyLock;

use regex::Regex;

use super::servers::{DiscoveredServer, ServerFamilies};

static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{v\d+\}").expect("placeholder regex should compile"));
static LABELED_PLACEHOLDER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:([A-Za-z0-9-]+)\.)?\{v\d+\}").expect("labeled placeholder regex should compile")
});

/// True if the candidate carries at least one `{vN}` token
pub fn has_placeholder(candidate: &str) -> bool {
    PLACEHOLDER_REGEX.is_match(candidate)
}

/// Picks the base domain to substitute for placeholders
///
/// Tries each preferred family in order against the discovered hosts, then
/// the first discovered host, then the configured default domain.
pub fn select_base_domain(servers: &[DiscoveredServer], families: &ServerFamilies) -> String {
    let preferred = families.preference.iter().find_map(|family| {
        let family = family.to_ascii_lowercase();
        servers
            .iter()
            .find(|server| server.host.to_ascii_lowercase().contains(&family))
    });

    match preferred.or_else(|| servers.first()) {
        Some(server) => strip_host_label(&server.host),
        None => families.default_domain.clone(),
    }
}

/// Removes a leading `letters[digits].` label: `tmstr1.example.com` → `example.com`
///
/// A host without such a label, or one that would be left without a dot, is
/// returned unchanged.
pub fn strip_host_label(host: &str) -> String {
    let Some((label, rest)) = host.split_once('.') else {
        return host.to_string();
    };
    let letters = label.trim_end_matches(|c: char| c.is_ascii_digit());
    let is_prefix_label = !letters.is_empty() && letters.chars().all(|c| c.is_ascii_alphabetic());
    if is_prefix_label && rest.contains('.') {
        rest.to_string()
    } else {
        host.to_string()
    }
}

/// Resolves every placeholder in a candidate URL
///
/// `label.{vN}` becomes `label.<base>`; a bare `{vN}` becomes `<base>`.
/// Candidates without placeholders are returned unchanged.
///
/// # Example
/// ```
/// use vidsrc_core::parser::{resolve_placeholders, DiscoveredServer, ServerFamilies};
/// let servers = vec![DiscoveredServer {
///     host: "tmstr2.cloudnestra.com".to_string(),
///     family: "cloudnestra.com".to_string(),
/// }];
/// let url = resolve_placeholders("https://tmstr5.{v1}/pl/a.m3u8", &servers, &ServerFamilies::default());
/// assert_eq!(url, "https://tmstr5.cloudnestra.com/pl/a.m3u8");
/// ```
pub fn resolve_placeholders(
    candidate: &str,
    servers: &[DiscoveredServer],
    families: &ServerFamilies,
) -> String {
    if !has_placeholder(candidate) {
        return candidate.to_string();
    }

    let base = select_base_domain(servers, families);

    LABELED_PLACEHOLDER_REGEX
        .replace_all(candidate, |caps: &regex::Captures<'_>| match caps.get(1) {
            Some(label) => format!("{}.{}", label.as_str(), base),
            None => base.clone(),
        })
        .into_owned()
}
