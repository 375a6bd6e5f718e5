//! `vidsrc` CLI - Resolve a catalog id to a playable HLS stream
//!
//! Prints one JSON object on stdout and exits non-zero when resolution fails.
//! Logs go to stderr and honour `RUST_LOG`.

use anyhow::Result;
use clap::Parser;
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use vidsrc_core::url::DEFAULT_PROVIDER;
use vidsrc_core::{
    ClientConfig, MediaType, ResolvedStream, ResolverConfig, SubtitleFormat, VidsrcResolver,
};

#[derive(Parser, Debug)]
#[command(name = "vidsrc")]
#[command(about = "Resolve vidsrc embeds to HLS stream URLs")]
#[command(version)]
struct Cli {
    /// Catalog (TMDB) id, e.g. 550
    content_id: String,

    /// movie, series or tv
    media_type: MediaType,

    /// Season number (series only)
    season: Option<u32>,

    /// Episode number (series only)
    episode: Option<u32>,

    /// Embed provider origin
    #[arg(long, default_value = DEFAULT_PROVIDER)]
    provider: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value = "8")]
    timeout: u64,

    /// Overall time budget in seconds (defaults to three request timeouts)
    #[arg(long)]
    budget: Option<u64>,

    /// Fetch candidate manifests and prefer one serving a valid playlist
    #[arg(long)]
    verify_manifest: bool,

    /// Log pipeline progress to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            client: ClientConfig {
                provider_base: self.provider.clone(),
                timeout_secs: self.timeout,
                ..ClientConfig::default()
            },
            overall_timeout_secs: self.budget.unwrap_or(self.timeout.saturating_mul(3)),
            verify_manifest: self.verify_manifest,
            ..ResolverConfig::default()
        }
    }
}

#[derive(Serialize, Debug, PartialEq)]
struct SubtitleEntry {
    url: String,
    lang: String,
    format: SubtitleFormat,
}

/// JSON document printed on stdout
#[derive(Serialize, Debug, PartialEq)]
struct Output {
    success: bool,
    hls_url: Option<String>,
    subtitles: Vec<SubtitleEntry>,
    referer: Option<String>,
    fallback_urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hls_content: Option<String>,
    error: Option<String>,
}

impl Output {
    fn from_result(result: Result<ResolvedStream>) -> Self {
        match result {
            Ok(stream) => Self {
                success: true,
                subtitles: stream
                    .subtitle_tracks()
                    .into_iter()
                    .map(|track| SubtitleEntry {
                        url: track.url,
                        lang: track.language,
                        format: track.format,
                    })
                    .collect(),
                hls_url: Some(stream.stream_url),
                referer: Some(stream.referer),
                fallback_urls: stream.fallback_urls,
                hls_content: stream.hls_content,
                error: None,
            },
            Err(e) => Self {
                success: false,
                hls_url: None,
                subtitles: Vec::new(),
                referer: None,
                fallback_urls: Vec::new(),
                hls_content: None,
                error: Some(e.to_string()),
            },
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "vidsrc_core=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn resolve(cli: &Cli) -> Result<ResolvedStream> {
    let resolver = VidsrcResolver::with_config(cli.resolver_config())?;
    debug!(content_id = %cli.content_id, media_type = ?cli.media_type, "resolving");
    let stream = resolver
        .resolve_stream(&cli.content_id, cli.media_type, cli.season, cli.episode)
        .await?;
    Ok(stream)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = Output::from_result(resolve(&cli).await);
    println!("{}", serde_json::to_string_pretty(&output)?);

    if !output.success {
        std::process::exit(1);
    }
    Ok(())
}
