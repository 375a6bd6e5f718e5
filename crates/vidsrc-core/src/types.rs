//! Core data types for the vidsrc resolver
//!
//! Contains the request, intermediate and result structures used throughout the library.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

// "/en.vtt", ".eng.srt"
static SUBTITLE_LANGUAGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[/.]([a-z]{2,3})\.(?:vtt|srt)$").expect("subtitle language regex should compile")
});

/// Catalog media type as supplied by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    #[serde(alias = "tv")]
    Series,
}

impl std::str::FromStr for MediaType {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "movie" => Ok(MediaType::Movie),
            "series" | "tv" => Ok(MediaType::Series),
            other => Err(PipelineError::InvalidRequest(format!(
                "Unknown media type: {}",
                other
            ))),
        }
    }
}

/// What to resolve for a content id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MediaKind {
    Movie,
    Series { season: u32, episode: u32 },
}

/// A single resolution request
///
/// Season and episode only exist for series, which the [`MediaKind`] enum
/// enforces. Values are used literally, including zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRequest {
    /// Catalog (TMDB) identifier, e.g. "550"
    pub content_id: String,

    /// Movie, or series with its episode coordinates
    pub kind: MediaKind,
}

impl StreamRequest {
    /// Builds a request from the loose inbound shape
    ///
    /// # Errors
    /// Returns `InvalidRequest` if the content id is blank, a movie carries
    /// season/episode, or a series lacks either of them.
    pub fn new(
        content_id: &str,
        media_type: MediaType,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> Result<Self> {
        let content_id = content_id.trim();
        if content_id.is_empty() {
            return Err(PipelineError::InvalidRequest(
                "Content id cannot be empty".to_string(),
            ));
        }

        let kind = match (media_type, season, episode) {
            (MediaType::Movie, None, None) => MediaKind::Movie,
            (MediaType::Movie, _, _) => {
                return Err(PipelineError::InvalidRequest(
                    "Movies cannot have season or episode".to_string(),
                ));
            }
            (MediaType::Series, Some(season), Some(episode)) => {
                MediaKind::Series { season, episode }
            }
            (MediaType::Series, _, _) => {
                return Err(PipelineError::InvalidRequest(
                    "Series require both season and episode".to_string(),
                ));
            }
        };

        Ok(Self {
            content_id: content_id.to_string(),
            kind,
        })
    }

    /// Shorthand for a movie request
    pub fn movie(content_id: impl Into<String>) -> Self {
        Self {
            content_id: content_id.into(),
            kind: MediaKind::Movie,
        }
    }

    /// Shorthand for a series episode request
    pub fn episode(content_id: impl Into<String>, season: u32, episode: u32) -> Self {
        Self {
            content_id: content_id.into(),
            kind: MediaKind::Series { season, episode },
        }
    }

    pub fn media_type(&self) -> MediaType {
        match self.kind {
            MediaKind::Movie => MediaType::Movie,
            MediaKind::Series { .. } => MediaType::Series,
        }
    }
}

/// Outcome of one successful GET
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFetch {
    /// Effective URL after any followed redirects
    pub url: String,

    /// URL originally requested
    pub requested_url: String,

    /// Referer header sent with the request
    pub referer_used: Option<String>,

    pub body: String,
}

/// Terminal success value of the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedStream {
    /// Absolute HLS manifest URL
    pub stream_url: String,

    /// Referer the player must present when fetching the stream
    ///
    /// The final page's origin serialized with a trailing slash
    /// (`https://host/`), the form browsers send under an origin-only policy.
    pub referer: String,

    /// Subtitle file URLs found on the final page
    pub subtitles: BTreeSet<String>,

    /// Remaining resolved candidates in page order, excluding `stream_url`
    #[serde(default)]
    pub fallback_urls: Vec<String>,

    /// Manifest body of `stream_url`, present only when manifest verification
    /// is enabled and a candidate served a valid `#EXTM3U` playlist
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hls_content: Option<String>,
}

impl ResolvedStream {
    /// Subtitle URLs with language and format inferred from the file name
    pub fn subtitle_tracks(&self) -> Vec<SubtitleTrack> {
        self.subtitles
            .iter()
            .filter_map(|url| SubtitleTrack::from_url(url))
            .collect()
    }
}

/// Subtitle file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtitleFormat {
    Vtt,
    Srt,
}

/// A subtitle URL with metadata inferred from its file name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtitleTrack {
    pub url: String,

    /// 2-3 letter language token (e.g. "en", "eng"), or "unknown"
    pub language: String,

    pub format: SubtitleFormat,
}

impl SubtitleTrack {
    /// Infers language and format from a subtitle URL
    ///
    /// Returns `None` if the URL does not end in `.vtt` or `.srt`.
    pub fn from_url(url: &str) -> Option<Self> {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        let lower = path.to_ascii_lowercase();
        let format = if lower.ends_with(".vtt") {
            SubtitleFormat::Vtt
        } else if lower.ends_with(".srt") {
            SubtitleFormat::Srt
        } else {
            return None;
        };

        let language = SUBTITLE_LANGUAGE_REGEX
            .captures(path)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_ascii_lowercase())
            .unwrap_or_else(|| "unknown".to_string());

        Some(Self {
            url: url.to_string(),
            language,
            format,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_request_movie() {
        let request = StreamRequest::new("550", MediaType::Movie, None, None).unwrap();
        assert_eq!(request, StreamRequest::movie("550"));
        assert_eq!(request.media_type(), MediaType::Movie);
    }

    #[test]
    fn test_stream_request_series_keeps_zero() {
        let request = StreamRequest::new("1396", MediaType::Series, Some(0), Some(0)).unwrap();
        assert_eq!(
            request.kind,
            MediaKind::Series {
                season: 0,
                episode: 0
            }
        );
    }

    #[test]
    fn test_stream_request_trims_content_id() {
        let request = StreamRequest::new("  550 ", MediaType::Movie, None, None).unwrap();
        assert_eq!(request.content_id, "550");
    }

    #[test]
    fn test_stream_request_empty_id() {
        let result = StreamRequest::new("   ", MediaType::Movie, None, None);
        match result {
            Err(PipelineError::InvalidRequest(msg)) => assert!(msg.contains("empty")),
            _ => panic!("Expected InvalidRequest error"),
        }
    }

    #[test]
    fn test_stream_request_movie_with_season() {
        let result = StreamRequest::new("550", MediaType::Movie, Some(1), None);
        assert!(matches!(result, Err(PipelineError::InvalidRequest(_))));
    }

    #[test]
    fn test_stream_request_series_missing_episode() {
        let result = StreamRequest::new("1396", MediaType::Series, Some(1), None);
        assert!(matches!(result, Err(PipelineError::InvalidRequest(_))));
    }

    #[test]
    fn test_media_type_from_str() {
        assert_eq!("movie".parse::<MediaType>().unwrap(), MediaType::Movie);
        assert_eq!("TV".parse::<MediaType>().unwrap(), MediaType::Series);
        assert_eq!("series".parse::<MediaType>().unwrap(), MediaType::Series);
        assert!("anime".parse::<MediaType>().is_err());
    }

    #[test]
    fn test_media_type_deserialize_tv_alias() {
        let media_type: MediaType = serde_json::from_str("\"tv\"").unwrap();
        assert_eq!(media_type, MediaType::Series);
    }

    #[test]
    fn test_resolved_stream_serialization() {
        let stream = ResolvedStream {
            stream_url: "https://tmstr5.cloudnestra.com/pl/abc/master.m3u8".to_string(),
            referer: "https://cloudnestra.com/".to_string(),
            subtitles: BTreeSet::from(["https://subs.example.org/en.vtt".to_string()]),
            fallback_urls: vec!["https://tmstr5.cloudnestra.com/pl/abc/alt.m3u8".to_string()],
            hls_content: None,
        };

        let json = serde_json::to_string(&stream).expect("Serialization should succeed");
        assert!(!json.contains("hls_content"));
        let deserialized: ResolvedStream =
            serde_json::from_str(&json).expect("Deserialization should succeed");

        assert_eq!(stream, deserialized);
    }

    #[test]
    fn test_subtitle_track_from_url() {
        let track = SubtitleTrack::from_url("https://subs.example.org/550/eng.srt").unwrap();
        assert_eq!(track.language, "eng");
        assert_eq!(track.format, SubtitleFormat::Srt);

        let track = SubtitleTrack::from_url("https://subs.example.org/movie.en.vtt?x=1").unwrap();
        assert_eq!(track.language, "en");
        assert_eq!(track.format, SubtitleFormat::Vtt);
    }

    #[test]
    fn test_subtitle_track_unknown_language() {
        let track = SubtitleTrack::from_url("https://subs.example.org/track_1.vtt").unwrap();
        assert_eq!(track.language, "unknown");
    }

    #[test]
    fn test_subtitle_track_rejects_other_extensions() {
        assert!(SubtitleTrack::from_url("https://example.org/a.m3u8").is_none());
    }

    #[test]
    fn test_subtitle_tracks_sorted_by_url() {
        let stream = ResolvedStream {
            stream_url: "https://a/b.m3u8".to_string(),
            referer: "https://a/".to_string(),
            subtitles: BTreeSet::from([
                "https://s/z/fr.vtt".to_string(),
                "https://s/a/de.srt".to_string(),
            ]),
            fallback_urls: Vec::new(),
            hls_content: None,
        };
        let tracks = stream.subtitle_tracks();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].language, "de");
        assert_eq!(tracks[1].language, "fr");
    }
}
