//! Markup scanners for provider pages
//!
//! Each scanner is a plain function over the page text, so a change in the
//! provider's markup touches one function.

pub mod placeholder;
pub mod redirect;
pub mod servers;
pub mod stream;
pub mod subtitles;

pub use placeholder::{resolve_placeholders, select_base_domain};
pub use redirect::{extract_frame_src, extract_relay_path};
pub use servers::{DiscoveredServer, ServerFamilies, discover_servers};
pub use stream::{extract_stream_candidates, split_alternatives};
pub use subtitles::extract_subtitle_urls;
