//! Main resolver API
//!
//! Combines the fetch client, the redirect-chain navigator and the page
//! scanners into one call per request.

use std::time::Duration;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::client::{ClientConfig, PageFetcher, VidsrcClient};
use crate::error::{PipelineError, Result, Stage};
use crate::navigator::{FinalPage, Navigator};
use crate::parser::{
    ServerFamilies, discover_servers, extract_stream_candidates, extract_subtitle_urls,
    resolve_placeholders,
};
use crate::types::{MediaType, ResolvedStream, StreamRequest};
use crate::url::referer_origin;

/// Configuration for the resolver
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// HTTP client settings
    pub client: ClientConfig,
    /// CDN family knowledge for discovery and placeholder resolution
    pub families: ServerFamilies,
    /// Wall-clock budget for a whole chain in seconds (default: 24)
    pub overall_timeout_secs: u64,
    /// Maximum runs in flight for batch resolution (default: 8)
    pub max_concurrency: usize,
    /// Fetch candidate manifests and promote the first valid playlist
    /// (default: false)
    pub verify_manifest: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        let client = ClientConfig::default();
        Self {
            overall_timeout_secs: client.timeout_secs * 3,
            client,
            families: ServerFamilies::default(),
            max_concurrency: 8,
            verify_manifest: false,
        }
    }
}

impl ResolverConfig {
    pub fn overall_timeout(&self) -> Duration {
        Duration::from_secs(self.overall_timeout_secs)
    }
}

/// Resolves content ids into playable streams
///
/// Holds no per-run state: one resolver can serve any number of concurrent
/// resolutions.
pub struct VidsrcResolver<F: PageFetcher = VidsrcClient> {
    fetcher: F,
    config: ResolverConfig,
}

impl VidsrcResolver<VidsrcClient> {
    /// Create a new resolver with default configuration
    ///
    /// # Errors
    /// Returns `Client` if HTTP client initialization fails
    pub fn new() -> Result<Self> {
        Self::with_config(ResolverConfig::default())
    }

    /// Create a new resolver with custom configuration
    ///
    /// # Errors
    /// Returns `Client` if HTTP client initialization fails
    pub fn with_config(config: ResolverConfig) -> Result<Self> {
        let client = VidsrcClient::with_config(&config.client).map_err(PipelineError::Client)?;
        Ok(Self::with_fetcher(client, config))
    }
}

impl<F: PageFetcher> VidsrcResolver<F> {
    /// Create a resolver over any page source
    pub fn with_fetcher(fetcher: F, config: ResolverConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Resolve a stream from the loose inbound parameters
    ///
    /// # Arguments
    /// * `content_id` - Catalog id (e.g. "550")
    /// * `media_type` - Movie or series
    /// * `season` / `episode` - Required for series, forbidden for movies
    ///
    /// # Errors
    /// - `InvalidRequest` if the parameters are inconsistent
    /// - anything [`VidsrcResolver::resolve`] returns
    ///
    /// # Example
    /// ```no_run
    /// # async fn example() -> vidsrc_core::Result<()> {
    /// use vidsrc_core::{MediaType, VidsrcResolver};
    /// let resolver = VidsrcResolver::new()?;
    /// let stream = resolver.resolve_stream("1396", MediaType::Series, Some(1), Some(1)).await?;
    /// println!("{} (referer {})", stream.stream_url, stream.referer);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn resolve_stream(
        &self,
        content_id: &str,
        media_type: MediaType,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> Result<ResolvedStream> {
        let request = StreamRequest::new(content_id, media_type, season, episode)?;
        self.resolve(&request).await
    }

    /// Resolve one request within the configured time budget
    ///
    /// # Errors
    /// - `Fetch { stage }` for network failures or non-success statuses
    /// - `MissingRedirectTarget { stage }` if the provider markup changed
    /// - `EmptyResult` if the final page has no stream candidate
    /// - `Timeout` if the whole chain exceeded its budget
    pub async fn resolve(&self, request: &StreamRequest) -> Result<ResolvedStream> {
        let budget = self.config.overall_timeout();
        let result = match tokio::time::timeout(budget, self.run(request)).await {
            Ok(result) => result,
            Err(_) => Err(PipelineError::Timeout(budget)),
        };

        match &result {
            Ok(stream) => info!(
                content_id = %request.content_id,
                subtitles = stream.subtitles.len(),
                fallbacks = stream.fallback_urls.len(),
                "resolved stream"
            ),
            Err(e) => warn!(
                content_id = %request.content_id,
                stage = ?e.stage(),
                error = %e,
                "resolution failed"
            ),
        }
        result
    }

    /// Resolve many requests with at most `max_concurrency` in flight
    ///
    /// Results are returned in request order.
    pub async fn resolve_all(&self, requests: &[StreamRequest]) -> Vec<Result<ResolvedStream>> {
        let limit = self.config.max_concurrency.max(1);
        stream::iter(requests)
            .map(|request| self.resolve(request))
            .buffered(limit)
            .collect()
            .await
    }

    async fn run(&self, request: &StreamRequest) -> Result<ResolvedStream> {
        let navigator = Navigator::new(&self.fetcher, &self.config.client.provider_base);
        let page = navigator.run(request).await?;
        let stream = self.assemble(&page)?;
        if self.config.verify_manifest {
            return Ok(self.verify_manifest(stream).await);
        }
        Ok(stream)
    }

    /// Fetches candidates in order with the stream referer and promotes the
    /// first one serving an `#EXTM3U` playlist
    ///
    /// Without a valid playlist the first candidate that answered with a
    /// success status is promoted, else the order is left as it was. Manifest
    /// failures never fail the run.
    async fn verify_manifest(&self, stream: ResolvedStream) -> ResolvedStream {
        let ResolvedStream {
            stream_url,
            referer,
            subtitles,
            fallback_urls,
            ..
        } = stream;
        let mut candidates = Vec::with_capacity(fallback_urls.len() + 1);
        candidates.push(stream_url);
        candidates.extend(fallback_urls);

        let mut verified = None;
        let mut reachable = None;
        for (index, url) in candidates.iter().enumerate() {
            match self.fetcher.fetch(url, Some(&referer)).await {
                Ok(page) if is_playlist(&page.body) => {
                    debug!(candidate = index, bytes = page.body.len(), "manifest verified");
                    verified = Some((index, page.body));
                    break;
                }
                Ok(_) => {
                    debug!(candidate = index, "manifest body is not a playlist");
                    reachable.get_or_insert(index);
                }
                Err(e) => debug!(candidate = index, error = %e, "manifest fetch failed"),
            }
        }

        let (chosen, hls_content) = match verified {
            Some((index, body)) => (index, Some(body)),
            None => (reachable.unwrap_or(0), None),
        };
        let stream_url = candidates.remove(chosen);

        ResolvedStream {
            stream_url,
            referer,
            subtitles,
            fallback_urls: candidates,
            hls_content,
        }
    }

    /// Scans the final page and builds the result
    fn assemble(&self, page: &FinalPage) -> Result<ResolvedStream> {
        let families = &self.config.families;
        let servers = discover_servers(&page.body, families);
        let candidates = extract_stream_candidates(&page.body);
        debug!(
            servers = servers.len(),
            candidates = candidates.len(),
            "scanned final page"
        );

        let mut resolved: Vec<String> = Vec::new();
        for candidate in &candidates {
            let url = resolve_placeholders(candidate, &servers, families);
            if !url.is_empty() && !resolved.contains(&url) {
                resolved.push(url);
            }
        }

        let mut resolved = resolved.into_iter();
        let stream_url = resolved.next().ok_or(PipelineError::EmptyResult)?;
        let referer = referer_origin(&page.url).ok_or_else(|| PipelineError::InvalidUrl {
            stage: Stage::Final,
            url: page.url.clone(),
        })?;

        Ok(ResolvedStream {
            stream_url,
            referer,
            subtitles: extract_subtitle_urls(&page.body),
            fallback_urls: resolved.collect(),
            hls_content: None,
        })
    }
}

/// True if a manifest body is an HLS playlist
fn is_playlist(body: &str) -> bool {
    body.trim_start_matches('\u{feff}')
        .trim_start()
        .starts_with("#EXTM3U")
}
