//! Media reference resolution.
//!
//! # Responsibility
//! - Turn a video URL into an embeddable provider URL or a direct playable
//!   URL.
//! - Apply the empty/placeholder guard for image URLs.
//!
//! # Invariants
//! - Resolution never rejects input; unparseable URLs pass through.
//! - `resolve_video_url(resolve_video_url(u)) == resolve_video_url(u)`.

mod video;

pub use video::{resolve_video, resolve_video_url, ResolvedVideo, VideoProvider};

use crate::model::media::is_missing_media;

/// Resolves an image URL for rendering.
///
/// Images are always directly renderable, so this is the identity apart
/// from returning `None` for blank or placeholder URLs.
pub fn resolve_image(url: &str) -> Option<&str> {
    if is_missing_media(url) {
        None
    } else {
        Some(url.trim())
    }
}
