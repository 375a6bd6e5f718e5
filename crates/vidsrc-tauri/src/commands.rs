//! Tauri commands for the vidsrc resolver

use tauri::State;
use vidsrc_core::{MediaType, PageFetcher, ResolvedStream, SubtitleTrack, VidsrcResolver};

use crate::ResolverState;

/// Resolve a playable stream
///
/// # Arguments
/// * `state` - Managed ResolverState from Tauri
/// * `content_id` - Catalog id (e.g. "550")
/// * `media_type` - `"movie"` or `"series"` (`"tv"` is accepted)
/// * `season` / `episode` - Required for series
///
/// # Returns
/// Stream URL, playback referer, subtitle URLs and fallback URLs
///
/// # Errors
/// Returns error message as String if resolution fails
#[tauri::command]
pub async fn resolve_stream(
    state: State<'_, ResolverState>,
    content_id: String,
    media_type: MediaType,
    season: Option<u32>,
    episode: Option<u32>,
) -> Result<ResolvedStream, String> {
    resolve_with(&state.resolver, &content_id, media_type, season, episode).await
}

/// Resolve a stream and return only its subtitle tracks
///
/// # Errors
/// Returns error message as String if resolution fails
#[tauri::command]
pub async fn subtitle_tracks(
    state: State<'_, ResolverState>,
    content_id: String,
    media_type: MediaType,
    season: Option<u32>,
    episode: Option<u32>,
) -> Result<Vec<SubtitleTrack>, String> {
    let stream = resolve_with(&state.resolver, &content_id, media_type, season, episode).await?;
    Ok(stream.subtitle_tracks())
}

async fn resolve_with<F: PageFetcher>(
    resolver: &VidsrcResolver<F>,
    content_id: &str,
    media_type: MediaType,
    season: Option<u32>,
    episode: Option<u32>,
) -> Result<ResolvedStream, String> {
    resolver
        .resolve_stream(content_id, media_type, season, episode)
        .await
        .map_err(|e| e.to_string())
}
