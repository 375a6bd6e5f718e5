//! HTTP client for the embed provider
//!
//! Sends GET requests with a fixed browser identity and an optional referer,
//! following redirects by hand so the caller always learns the effective URL.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, LOCATION, REFERER};
use tracing::debug;

use crate::error::FetchError;
use crate::types::PageFetch;
use crate::url::{DEFAULT_PROVIDER, absolutize};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
const ACCEPT_HTML: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE_EN: &str = "en-US,en;q=0.9";

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Embed provider origin (default: "https://vidsrc.xyz")
    pub provider_base: String,
    /// Per-request timeout in seconds (default: 8)
    pub timeout_secs: u64,
    /// Maximum redirects followed per request (default: 5)
    pub max_redirects: usize,
    /// User-Agent header value
    pub user_agent: String,
    /// Accept-Language header value (default: "en-US,en;q=0.9")
    pub accept_language: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            provider_base: DEFAULT_PROVIDER.to_string(),
            timeout_secs: 8,
            max_redirects: 5,
            user_agent: USER_AGENT.to_string(),
            accept_language: ACCEPT_LANGUAGE_EN.to_string(),
        }
    }
}

/// Source of page bodies for the navigator
///
/// Implemented by [`VidsrcClient`]; tests substitute canned pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET `url`, presenting `referer` when given
    async fn fetch(&self, url: &str, referer: Option<&str>) -> Result<PageFetch, FetchError>;
}

/// reqwest-backed fetch client
///
/// Handles all HTTP communication with the provider:
/// - Browser-like User-Agent, Accept and Accept-Language on every request
/// - Optional Referer per request
/// - Manual redirect following that records the final URL
/// - No retries and no caching
#[derive(Debug, Clone)]
pub struct VidsrcClient {
    client: reqwest::Client,
    max_redirects: usize,
}

impl VidsrcClient {
    /// Create a new client with default configuration
    pub fn new() -> Result<Self, FetchError> {
        Self::with_config(&ClientConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: &ClientConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::none())
            .default_headers({
                let mut headers = HeaderMap::new();
                headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
                let language = HeaderValue::from_str(&config.accept_language)
                    .map_err(|_| FetchError::InvalidHeader(config.accept_language.clone()))?;
                headers.insert(ACCEPT_LANGUAGE, language);
                headers
            })
            .build()
            .map_err(FetchError::Http)?;

        Ok(Self {
            client,
            max_redirects: config.max_redirects,
        })
    }

    /// Perform a single GET, following redirects by hand
    ///
    /// The referer is re-sent on every redirected request.
    async fn do_fetch(&self, url: &str, referer: Option<&str>) -> Result<PageFetch, FetchError> {
        let mut current_url = url.to_string();

        for _ in 0..=self.max_redirects {
            let mut request = self.client.get(&current_url);
            if let Some(referer) = referer {
                request = request.header(REFERER, referer);
            }
            let response = request.send().await.map_err(FetchError::Http)?;
            let status = response.status();

            if status.is_redirection() {
                let Some(location) = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                else {
                    return Err(FetchError::Status {
                        status: status.as_u16(),
                        url: current_url,
                    });
                };
                let next = absolutize(&current_url, location)
                    .ok_or_else(|| FetchError::InvalidUrl(location.to_string()))?;
                debug!(from = %current_url, to = %next, "following redirect");
                current_url = next;
                continue;
            }

            if !status.is_success() {
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    url: current_url,
                });
            }

            let body = response.text().await.map_err(FetchError::Http)?;
            return Ok(PageFetch {
                url: current_url,
                requested_url: url.to_string(),
                referer_used: referer.map(str::to_string),
                body,
            });
        }

        Err(FetchError::TooManyRedirects(url.to_string()))
    }
}

#[async_trait]
impl PageFetcher for VidsrcClient {
    async fn fetch(&self, url: &str, referer: Option<&str>) -> Result<PageFetch, FetchError> {
        self.do_fetch(url, referer).await
    }
}
