//! Delivery host discovery on the final page
//!
//! The final page mentions the CDN hosts the player may stream from, mixed
//! in with unrelated script and asset hosts. Only hosts under a known CDN
//! family suffix are kept.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Domain suffixes recognized as the provider's CDN families
pub const KNOWN_FAMILIES: &[&str] = &[
    "cloudnestra.com",
    "shadowlandschronicles.com",
    "neonhorizonworkshops.com",
    "orchidpixelgardens.com",
];

/// Family substrings tried, in order, when resolving host placeholders
pub const PREFERRED_FAMILIES: &[&str] = &["shadowlandschronicles", "cloudnestra", "neonhorizonworkshops"];

/// Domain substituted when no host was discovered at all
pub const DEFAULT_DOMAIN: &str = "cloudnestra.com";

/// CDN family knowledge used by discovery and placeholder resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerFamilies {
    /// Accepted domain suffixes
    pub known: Vec<String>,
    /// Substrings tried in priority order against discovered hosts
    pub preference: Vec<String>,
    /// Fallback domain when discovery found nothing
    pub default_domain: String,
}

impl Default for ServerFamilies {
    fn default() -> Self {
        Self {
            known: KNOWN_FAMILIES.iter().map(|s| s.to_string()).collect(),
            preference: PREFERRED_FAMILIES.iter().map(|s| s.to_string()).collect(),
            default_domain: DEFAULT_DOMAIN.to_string(),
        }
    }
}

/// A candidate delivery host and the family suffix it matched
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DiscoveredServer {
    /// Lowercased hostname, e.g. "tmstr2.cloudnestra.com"
    pub host: String,
    /// Matched family suffix, e.g. "cloudnestra.com"
    pub family: String,
}

/// Scans a page for hosts of the form `<letters><digits?>.<known suffix>`
///
/// # Returns
/// Deduplicated hosts in first-seen order. Empty if the family list is empty
/// or nothing matches.
pub fn discover_servers(html: &str, families: &ServerFamilies) -> Vec<DiscoveredServer> {
    let suffixes: Vec<String> = families
        .known
        .iter()
        .map(|s| s.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    if suffixes.is_empty() {
        return Vec::new();
    }

    let alternation = suffixes
        .iter()
        .map(|s| regex::escape(s))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(r"(?i)\b([a-z]{{2,12}}[0-9]*)\.({})\b", alternation);
    let Ok(re) = Regex::new(&pattern) else {
        return Vec::new();
    };

    let mut servers: Vec<DiscoveredServer> = Vec::new();
    for caps in re.captures_iter(html) {
        let (Some(whole), Some(suffix)) = (caps.get(0), caps.get(2)) else {
            continue;
        };
        // "tmstr2.cloudnestra.com.evil.net" is a different host
        if continues_hostname(&html[whole.end()..]) {
            continue;
        }
        let host = whole.as_str().to_ascii_lowercase();
        if servers.iter().any(|s| s.host == host) {
            continue;
        }
        servers.push(DiscoveredServer {
            host,
            family: suffix.as_str().to_ascii_lowercase(),
        });
    }

    servers
}

/// True if the text right after a match extends it into a longer hostname
///
/// A `.` or `-` only continues the host when a host character follows, so a
/// sentence-ending period does not.
fn continues_hostname(rest: &str) -> bool {
    let mut chars = rest.chars();
    matches!(chars.next(), Some('.' | '-'))
        && chars.next().is_some_and(|c| c.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn families(known: &[&str]) -> ServerFamilies {
        ServerFamilies {
            known: known.iter().map(|s| s.to_string()).collect(),
            ..ServerFamilies::default()
        }
    }

    #[test]
    fn test_discover_servers_first_seen_order() {
        let html = r#"
        <script src="https://cdnjs.cloudflare.com/ajax/libs/jquery/3.6.0/jquery.min.js"></script>
        <link rel="preconnect" href="https://tmstr3.shadowlandschronicles.com">
        <script>
            var hosts = ["tmstr2.cloudnestra.com", "tmstr3.shadowlandschronicles.com", "app2.cloudnestra.com"];
        </script>
        "#;

        let servers = discover_servers(html, &ServerFamilies::default());
        let hosts: Vec<&str> = servers.iter().map(|s| s.host.as_str()).collect();
        assert_eq!(
            hosts,
            vec![
                "tmstr3.shadowlandschronicles.com",
                "tmstr2.cloudnestra.com",
                "app2.cloudnestra.com"
            ]
        );
        assert_eq!(servers[0].family, "shadowlandschronicles.com");
        assert_eq!(servers[1].family, "cloudnestra.com");
    }

    #[test]
    fn test_discover_servers_excludes_unknown_suffixes() {
        let html = r#"
            https://cdn1.jsdelivr.net/npm/hls.js
            https://tmstr4.unknowncdn.com/pl/x.m3u8
            https://static2.cloudflareinsights.com/beacon.min.js
        "#;
        assert!(discover_servers(html, &ServerFamilies::default()).is_empty());
    }

    #[test]
    fn test_discover_servers_lowercases_and_dedupes() {
        let html = "TMSTR1.CloudNestra.com tmstr1.cloudnestra.com";
        let servers = discover_servers(html, &ServerFamilies::default());
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].host, "tmstr1.cloudnestra.com");
    }

    #[test]
    fn test_discover_servers_rejects_suffix_continuation() {
        let html = "tmstr1.cloudnestra.com.attacker.net tmstr1.cloudnestra.community";
        assert!(discover_servers(html, &ServerFamilies::default()).is_empty());
    }

    #[test]
    fn test_discover_servers_accepts_sentence_period() {
        let html = "Streams from tmstr1.cloudnestra.com. Backup: tmstr2.cloudnestra.com-";
        let servers = discover_servers(html, &ServerFamilies::default());
        let hosts: Vec<&str> = servers.iter().map(|s| s.host.as_str()).collect();
        assert_eq!(hosts, vec!["tmstr1.cloudnestra.com", "tmstr2.cloudnestra.com"]);
    }

    #[test]
    fn test_continues_hostname() {
        assert!(continues_hostname(".attacker.net/x"));
        assert!(continues_hostname("-edge.example"));
        assert!(!continues_hostname(". Backup"));
        assert!(!continues_hostname(".\n"));
        assert!(!continues_hostname("/pl/x.m3u8"));
        assert!(!continues_hostname(""));
    }

    #[test]
    fn test_discover_servers_ignores_bare_family_domain() {
        let html = r#"<iframe src="//cloudnestra.com/rcp/abc"></iframe>"#;
        assert!(discover_servers(html, &ServerFamilies::default()).is_empty());
    }

    #[test]
    fn test_discover_servers_custom_family() {
        let html = "file: 'https://tmstr2.familya.com/x.m3u8'";
        let servers = discover_servers(html, &families(&["familyA.com"]));
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].host, "tmstr2.familya.com");
        assert_eq!(servers[0].family, "familya.com");
    }

    #[test]
    fn test_discover_servers_empty_family_list() {
        let html = "tmstr2.cloudnestra.com";
        assert!(discover_servers(html, &families(&[])).is_empty());
    }

    proptest! {
        #[test]
        fn prop_discovery_never_returns_unknown_suffix(
            prefix in "[a-z]{2,8}[0-9]{0,2}",
            domain in "[a-z]{3,10}\\.(net|org|io|com)",
        ) {
            let html = format!("<script src=\"https://{}.{}/x.js\"></script>", prefix, domain);
            let families = ServerFamilies::default();
            for server in discover_servers(&html, &families) {
                prop_assert!(families.known.iter().any(|known| server.host.ends_with(known.as_str())));
                prop_assert!(families.known.contains(&server.family));
            }
        }
    }
}
