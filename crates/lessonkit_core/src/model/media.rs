//! Media metadata produced by the upload collaborator.
//!
//! # Invariants
//! - `MediaMetadata` is treated as an immutable value once returned.
//! - The placeholder sentinel marks "not yet uploaded" and is never valid
//!   media content.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Content value written into new image/video blocks before any upload.
///
/// Kept on the wire for compatibility with stored lessons. Prefer
/// [`crate::ContentBlock::media_url`] over comparing against this directly.
pub const PLACEHOLDER_MEDIA_URL: &str = "https://via.placeholder.com/400x300";

/// Returns whether `url` is the placeholder sentinel.
pub fn is_placeholder_url(url: &str) -> bool {
    url.trim() == PLACEHOLDER_MEDIA_URL
}

/// Returns whether `url` carries no usable media (blank or placeholder).
pub fn is_missing_media(url: &str) -> bool {
    url.trim().is_empty() || is_placeholder_url(url)
}

/// Resource category reported by the upload provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
    /// Providers report generic files as `raw`.
    #[serde(alias = "raw")]
    Document,
}

impl MediaKind {
    /// Stable string id used by upload requests.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Document => "document",
        }
    }

    /// Parses a provider resource type; `raw` maps to [`Self::Document`].
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "document" | "raw" => Some(Self::Document),
            _ => None,
        }
    }
}

/// Upload result metadata.
///
/// The provider's `resource_type` string and any keys without a typed field
/// are kept as received, so stored metadata survives a load and save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// Public URL of the uploaded resource.
    pub url: String,
    /// Upload provider identifier, e.g. `cloudinary`.
    pub provider: String,
    /// Resource type as the provider spells it; see [`Self::kind`].
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Seconds, for video resources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Number>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_id: Option<String>,
    /// Provider-specific keys such as `secure_url` or `asset_id`.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MediaMetadata {
    /// Creates metadata with only the required fields set.
    pub fn new(url: impl Into<String>, provider: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            url: url.into(),
            provider: provider.into(),
            resource_type: kind.as_str().to_string(),
            width: None,
            height: None,
            duration: None,
            thumbnail_url: None,
            bytes: None,
            original_filename: None,
            format: None,
            public_id: None,
            extra: Map::new(),
        }
    }

    /// Typed view of `resource_type`; `None` for types this build does not
    /// know.
    pub fn kind(&self) -> Option<MediaKind> {
        MediaKind::parse(&self.resource_type)
    }

    pub fn duration_secs(&self) -> Option<f64> {
        self.duration.as_ref().and_then(Number::as_f64)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        is_missing_media, is_placeholder_url, MediaKind, MediaMetadata, PLACEHOLDER_MEDIA_URL,
    };

    #[test]
    fn placeholder_detection_ignores_surrounding_whitespace() {
        assert!(is_placeholder_url(PLACEHOLDER_MEDIA_URL));
        assert!(is_placeholder_url(&format!("  {PLACEHOLDER_MEDIA_URL}\n")));
        assert!(!is_placeholder_url("https://cdn.example.com/a.png"));
    }

    #[test]
    fn blank_urls_count_as_missing_media() {
        assert!(is_missing_media(""));
        assert!(is_missing_media("   "));
        assert!(!is_missing_media("https://cdn.example.com/a.png"));
    }

    #[test]
    fn raw_resource_type_maps_to_document() {
        let kind: MediaKind = serde_json::from_str("\"raw\"").unwrap();
        assert_eq!(kind, MediaKind::Document);
        assert_eq!(kind.as_str(), "document");
        assert_eq!(MediaKind::parse(" RAW "), Some(MediaKind::Document));
        assert_eq!(MediaKind::parse("sticker"), None);
    }

    #[test]
    fn provider_keys_and_spelling_survive_reserialization() {
        let raw = serde_json::json!({
            "url": "https://res.example.com/f.pdf",
            "provider": "cloudinary",
            "resource_type": "raw",
            "duration": 3,
            "secure_url": "https://res.example.com/f.pdf",
            "asset_id": "abc"
        });
        let metadata: MediaMetadata = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(metadata.kind(), Some(MediaKind::Document));
        assert_eq!(metadata.duration_secs(), Some(3.0));
        assert_eq!(metadata.extra.get("asset_id"), Some(&serde_json::json!("abc")));
        assert_eq!(serde_json::to_value(&metadata).unwrap(), raw);
    }
}
