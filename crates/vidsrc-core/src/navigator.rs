//! Redirect-chain navigation
//!
//! Walks entry → relay → final as an explicit state machine. Each transition
//! fetches one page and extracts the next hop; any failure ends the walk with
//! an error naming the stage it happened at.

use tracing::debug;

use crate::client::PageFetcher;
use crate::error::{PipelineError, Result, Stage};
use crate::parser::{extract_frame_src, extract_relay_path};
use crate::types::{PageFetch, StreamRequest};
use crate::url::{absolutize, build_entry_url, join_origin};

/// Position in the redirect chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigatorState {
    AtEntry { url: String },
    AtRelay { url: String, referer: String },
    AtFinal { url: String, referer: String },
}

impl NavigatorState {
    pub fn stage(&self) -> Stage {
        match self {
            NavigatorState::AtEntry { .. } => Stage::Entry,
            NavigatorState::AtRelay { .. } => Stage::Relay,
            NavigatorState::AtFinal { .. } => Stage::Final,
        }
    }
}

/// The fetched final page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalPage {
    /// Effective URL of the final page
    pub url: String,
    /// Referer presented when fetching it (the relay page URL)
    pub referer_used: String,
    pub body: String,
}

/// Drives the three-hop chain against a [`PageFetcher`]
pub struct Navigator<'a, F: PageFetcher> {
    fetcher: &'a F,
    provider_base: &'a str,
}

impl<'a, F: PageFetcher> Navigator<'a, F> {
    pub fn new(fetcher: &'a F, provider_base: &'a str) -> Self {
        Self {
            fetcher,
            provider_base,
        }
    }

    /// Initial state for a request
    pub fn start(&self, request: &StreamRequest) -> NavigatorState {
        NavigatorState::AtEntry {
            url: build_entry_url(self.provider_base, request),
        }
    }

    /// Runs the chain to completion
    ///
    /// # Errors
    /// - `Fetch { stage }` if a hop cannot be fetched
    /// - `MissingRedirectTarget { stage }` if a page lacks the next-hop marker
    /// - `InvalidUrl { stage }` if the extracted reference is not a usable URL
    pub async fn run(&self, request: &StreamRequest) -> Result<FinalPage> {
        let mut state = self.start(request);
        loop {
            state = match self.step(state).await? {
                Step::Next(next) => next,
                Step::Done(page) => return Ok(page),
            };
        }
    }

    /// Performs one transition
    pub async fn step(&self, state: NavigatorState) -> Result<Step> {
        let stage = state.stage();
        match state {
            NavigatorState::AtEntry { url } => {
                let page = self.fetch(stage, &url, None).await?;
                let frame = extract_frame_src(&page.body)
                    .ok_or(PipelineError::MissingRedirectTarget { stage })?;
                let relay_url = absolutize(&page.url, &frame)
                    .ok_or_else(|| PipelineError::InvalidUrl { stage, url: frame })?;
                debug!(%stage, "found frame reference");
                Ok(Step::Next(NavigatorState::AtRelay {
                    url: relay_url,
                    referer: page.url,
                }))
            }
            NavigatorState::AtRelay { url, referer } => {
                let page = self.fetch(stage, &url, Some(&referer)).await?;
                let path = extract_relay_path(&page.body)
                    .ok_or(PipelineError::MissingRedirectTarget { stage })?;
                let final_url = join_origin(&page.url, &path)
                    .ok_or_else(|| PipelineError::InvalidUrl { stage, url: path })?;
                debug!(%stage, "found final page path");
                Ok(Step::Next(NavigatorState::AtFinal {
                    url: final_url,
                    referer: page.url,
                }))
            }
            NavigatorState::AtFinal { url, referer } => {
                let page = self.fetch(stage, &url, Some(&referer)).await?;
                Ok(Step::Done(FinalPage {
                    url: page.url,
                    referer_used: referer,
                    body: page.body,
                }))
            }
        }
    }

    async fn fetch(&self, stage: Stage, url: &str, referer: Option<&str>) -> Result<PageFetch> {
        debug!(%stage, has_referer = referer.is_some(), "fetching hop");
        self.fetcher
            .fetch(url, referer)
            .await
            .map_err(|source| PipelineError::Fetch { stage, source })
    }
}

/// Outcome of a single transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Next(NavigatorState),
    Done(FinalPage),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned bodies by URL and records every request
    #[derive(Default)]
    struct FakeFetcher {
        pages: HashMap<String, String>,
        calls: Mutex<Vec<(String, Option<String>)>>,
    }

    impl FakeFetcher {
        fn with_page(mut self, url: &str, body: &str) -> Self {
            self.pages.insert(url.to_string(), body.to_string());
            self
        }

        fn calls(&self) -> Vec<(String, Option<String>)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str, referer: Option<&str>) -> std::result::Result<PageFetch, FetchError> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), referer.map(str::to_string)));
            match self.pages.get(url) {
                Some(body) => Ok(PageFetch {
                    url: url.to_string(),
                    requested_url: url.to_string(),
                    referer_used: referer.map(str::to_string),
                    body: body.clone(),
                }),
                None => Err(FetchError::Status {
                    status: 404,
                    url: url.to_string(),
                }),
            }
        }
    }

    const ENTRY: &str = "https://vidsrc.xyz/embed/movie?tmdb=550";
    const RELAY: &str = "https://cloudnestra.com/rcp/NTUw";
    const FINAL: &str = "https://cloudnestra.com/prorcp/ZmluYWw";

    fn full_chain() -> FakeFetcher {
        FakeFetcher::default()
            .with_page(ENTRY, r#"<iframe id="player_iframe" src="//cloudnestra.com/rcp/NTUw"></iframe>"#)
            .with_page(RELAY, r#"<script>$('<iframe>', { src: '/prorcp/ZmluYWw' });</script>"#)
            .with_page(FINAL, "file: 'https://tmstr2.cloudnestra.com/pl/x.m3u8'")
    }

    #[tokio::test]
    async fn test_run_walks_three_hops_with_referers() {
        let fetcher = full_chain();
        let navigator = Navigator::new(&fetcher, "https://vidsrc.xyz");

        let page = navigator.run(&StreamRequest::movie("550")).await.unwrap();

        assert_eq!(page.url, FINAL);
        assert_eq!(page.referer_used, RELAY);
        assert!(page.body.contains("m3u8"));
        assert_eq!(
            fetcher.calls(),
            vec![
                (ENTRY.to_string(), None),
                (RELAY.to_string(), Some(ENTRY.to_string())),
                (FINAL.to_string(), Some(RELAY.to_string())),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_frame_stops_before_relay() {
        let fetcher = FakeFetcher::default().with_page(ENTRY, "<html><body>blocked</body></html>");
        let navigator = Navigator::new(&fetcher, "https://vidsrc.xyz");

        let result = navigator.run(&StreamRequest::movie("550")).await;

        assert!(matches!(
            result,
            Err(PipelineError::MissingRedirectTarget {
                stage: Stage::Entry
            })
        ));
        assert_eq!(fetcher.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_relay_path() {
        let fetcher = FakeFetcher::default()
            .with_page(ENTRY, r#"<iframe src="//cloudnestra.com/rcp/NTUw"></iframe>"#)
            .with_page(RELAY, "<html>turnstile challenge</html>");
        let navigator = Navigator::new(&fetcher, "https://vidsrc.xyz");

        let result = navigator.run(&StreamRequest::movie("550")).await;

        assert!(matches!(
            result,
            Err(PipelineError::MissingRedirectTarget {
                stage: Stage::Relay
            })
        ));
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_fetch_failure_carries_stage() {
        let fetcher = FakeFetcher::default()
            .with_page(ENTRY, r#"<iframe src="//cloudnestra.com/rcp/NTUw"></iframe>"#)
            .with_page(RELAY, "src: '/prorcp/ZmluYWw'");
        let navigator = Navigator::new(&fetcher, "https://vidsrc.xyz");

        let result = navigator.run(&StreamRequest::movie("550")).await;

        match result {
            Err(PipelineError::Fetch {
                stage: Stage::Final,
                source: FetchError::Status { status: 404, .. },
            }) => {}
            other => panic!("Expected Fetch error at final stage, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_series_entry_url() {
        let fetcher = FakeFetcher::default();
        let navigator = Navigator::new(&fetcher, "https://vidsrc.xyz");

        let state = navigator.start(&StreamRequest::episode("1396", 0, 4));

        assert_eq!(
            state,
            NavigatorState::AtEntry {
                url: "https://vidsrc.xyz/embed/tv?tmdb=1396&season=0&episode=4".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_step_entry_to_relay() {
        let fetcher = full_chain();
        let navigator = Navigator::new(&fetcher, "https://vidsrc.xyz");

        let step = navigator
            .step(NavigatorState::AtEntry {
                url: ENTRY.to_string(),
            })
            .await
            .unwrap();

        assert_eq!(
            step,
            Step::Next(NavigatorState::AtRelay {
                url: RELAY.to_string(),
                referer: ENTRY.to_string()
            })
        );
    }
}
