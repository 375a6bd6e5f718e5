//! Vidsrc Resolver Core Library
//!
//! Resolves a catalog id into a directly playable HLS stream URL plus subtitle
//! tracks by walking the provider's embed chain.
//!
//! # Overview
//!
//! A resolution is one pipeline run:
//! - Fetch the entry embed page, follow its frame to the relay page, follow the
//!   relay's script assignment to the final page
//! - Discover candidate CDN hosts on the final page
//! - Extract `file:` stream descriptors and resolve their `{vN}` host placeholders
//! - Collect subtitle URLs
//!
//! # Example
//!
//! ```no_run
//! use vidsrc_core::{MediaType, Result, VidsrcResolver};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let resolver = VidsrcResolver::new()?;
//!
//!     let stream = resolver.resolve_stream("550", MediaType::Movie, None, None).await?;
//!     println!("{}", stream.stream_url);
//!     println!("Referer: {}", stream.referer);
//!     for subtitle in &stream.subtitles {
//!         println!("Subtitle: {}", subtitle);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Stream URLs
//!
//! Resolved URLs are bound to the provider session that produced them and
//! expire. Re-run the pipeline rather than caching them.

mod client;
mod error;
pub mod navigator;
pub mod parser;
mod pool;
mod resolver;
mod types;
pub mod url;

// Re-export client types
pub use client::{ClientConfig, PageFetcher, VidsrcClient};

// Re-export error types
pub use error::{FetchError, PipelineError, Result, Stage};

// Re-export parser functions
pub use parser::{
    DiscoveredServer, ServerFamilies, discover_servers, extract_frame_src, extract_relay_path,
    extract_stream_candidates, extract_subtitle_urls, resolve_placeholders,
};

// Re-export the resolver API
pub use pool::{PoolHandle, ResolverPool};
pub use resolver::{ResolverConfig, VidsrcResolver};

// Re-export data types
pub use types::{
    MediaKind, MediaType, PageFetch, ResolvedStream, StreamRequest, SubtitleFormat, SubtitleTrack,
};
