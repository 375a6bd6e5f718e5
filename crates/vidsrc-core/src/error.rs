//! Error types for the vidsrc resolver
//!
//! Two layers: [`FetchError`] describes a single failed HTTP round-trip,
//! [`PipelineError`] attributes a failure to the pipeline stage it came from.
//! Both serialize to their display string for Tauri command compatibility.

use std::fmt;
use std::time::Duration;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// One hop of the embed redirect chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Embed page addressed directly from the content id
    Entry,
    /// Intermediate page referenced by the entry page's frame
    Relay,
    /// Page carrying stream descriptors, hosts and subtitles
    Final,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Entry => "entry",
            Stage::Relay => "relay",
            Stage::Final => "final",
        };
        f.write_str(name)
    }
}

/// Failure of a single HTTP fetch
#[derive(Error, Debug)]
pub enum FetchError {
    /// Network, connect or timeout failure
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Unexpected HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    /// Redirect chain exceeded the configured limit
    #[error("Too many redirects starting at {0}")]
    TooManyRedirects(String),

    /// URL could not be parsed or a Location header was unusable
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Configured header value is not a valid HTTP header
    #[error("Invalid header value: {0}")]
    InvalidHeader(String),
}

impl FetchError {
    /// True when the underlying transport gave up because of its timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Http(e) if e.is_timeout())
    }
}

/// Error type for all resolver operations
#[derive(Error, Debug)]
pub enum PipelineError {
    /// A hop could not be fetched
    #[error("Fetch failed at {stage} stage: {source}")]
    Fetch {
        stage: Stage,
        #[source]
        source: FetchError,
    },

    /// The page was fetched but the marker pointing at the next hop is gone
    #[error("Redirect target not found at {stage} stage")]
    MissingRedirectTarget { stage: Stage },

    /// The final page yielded no usable stream candidate
    #[error("No stream candidates found on final page")]
    EmptyResult,

    /// The whole chain exceeded its wall-clock budget
    #[error("Resolution exceeded time budget of {0:?}")]
    Timeout(Duration),

    /// Caller supplied an inconsistent request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// An extracted hop URL could not be turned into an absolute URL
    #[error("Invalid URL at {stage} stage: {url}")]
    InvalidUrl { stage: Stage, url: String },

    /// HTTP client could not be constructed
    #[error("Client initialization failed: {0}")]
    Client(#[source] FetchError),

    /// A pooled run was aborted before it finished
    #[error("Resolution was cancelled")]
    Cancelled,
}

impl PipelineError {
    /// Stage the failure originated from, when it belongs to one
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Fetch { stage, .. }
            | PipelineError::MissingRedirectTarget { stage }
            | PipelineError::InvalidUrl { stage, .. } => Some(*stage),
            PipelineError::EmptyResult => Some(Stage::Final),
            _ => None,
        }
    }
}

impl Serialize for PipelineError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl Serialize for FetchError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result type alias for resolver operations
pub type Result<T> = std::result::Result<T, PipelineError>;
