//! Vidsrc Tauri Integration
//!
//! Provides a Tauri plugin exposing the stream resolver to the frontend.
//!
//! # Usage
//!
//! Register the plugin in your Tauri application:
//!
//! ```ignore
//! fn main() {
//!     tauri::Builder::default()
//!         .plugin(vidsrc_tauri::init())
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```
//!
//! Then invoke commands from the frontend:
//!
//! ```javascript
//! import { invoke } from '@tauri-apps/api/core';
//!
//! // Resolve a movie
//! const stream = await invoke('plugin:vidsrc|resolve_stream', {
//!   contentId: '550',
//!   mediaType: 'movie'
//! });
//!
//! // Subtitle tracks for an episode
//! const tracks = await invoke('plugin:vidsrc|subtitle_tracks', {
//!   contentId: '1396',
//!   mediaType: 'series',
//!   season: 1,
//!   episode: 1
//! });
//! ```

use std::sync::Arc;

use tauri::{
    Manager, Runtime,
    plugin::{Builder, TauriPlugin},
};
use vidsrc_core::{ResolverConfig, VidsrcResolver};

mod commands;

/// Shared resolver handed to every command
///
/// The resolver keeps no per-run state, so commands share it without locking.
pub struct ResolverState {
    pub(crate) resolver: Arc<VidsrcResolver>,
}

impl ResolverState {
    /// Create a new ResolverState with default configuration
    ///
    /// # Errors
    /// Returns error string if the HTTP client cannot be built
    pub fn new() -> Result<Self, String> {
        Self::with_config(ResolverConfig::default())
    }

    /// Create a new ResolverState with custom configuration
    ///
    /// # Errors
    /// Returns error string if the HTTP client cannot be built
    pub fn with_config(config: ResolverConfig) -> Result<Self, String> {
        let resolver = VidsrcResolver::with_config(config).map_err(|e| e.to_string())?;
        Ok(Self {
            resolver: Arc::new(resolver),
        })
    }
}

/// Initialize the vidsrc plugin
///
/// # Returns
/// A configured TauriPlugin ready to be registered with the Tauri application
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new("vidsrc")
        .invoke_handler(tauri::generate_handler![
            commands::resolve_stream,
            commands::subtitle_tracks
        ])
        .setup(|app, _api| {
            let state = ResolverState::new().map_err(Box::<dyn std::error::Error>::from)?;
            tracing::debug!("vidsrc plugin state registered");
            app.manage(state);
            Ok(())
        })
        .build()
}

// Re-export types for convenience
pub use vidsrc_core::{MediaType, ResolvedStream as Stream, SubtitleTrack};
