//! Video URL resolution for external providers.
//!
//! Known providers:
//! - YouTube: `youtube.com/watch?v=`, `youtu.be/<id>`, `/shorts/<id>`,
//!   `/live/<id>`, `/embed/<id>` (already embed form), nocookie host.
//! - Vimeo: `vimeo.com/<id>`, `vimeo.com/channels/<name>/<id>`,
//!   `player.vimeo.com/video/<id>` (already embed form).

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{Display, Formatter};
use url::Url;

const YOUTUBE_EMBED_BASE: &str = "https://www.youtube.com/embed/";
const VIMEO_EMBED_BASE: &str = "https://player.vimeo.com/video/";

static VIDEO_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("valid video id regex"));
static VIMEO_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{1,20}$").expect("valid vimeo id regex"));
static TIMESTAMP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:(\d+)h)?(?:(\d+)m)?(?:(\d+)s?)?$").expect("valid timestamp regex")
});

/// External video hosts with an embed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoProvider {
    YouTube,
    Vimeo,
}

impl VideoProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::YouTube => "youtube",
            Self::Vimeo => "vimeo",
        }
    }
}

impl Display for VideoProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renderable form of a video URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedVideo {
    /// Provider page that must be shown through its embed player.
    Embed { provider: VideoProvider, url: String },
    /// Media resource playable by a native video element.
    Direct { url: String },
}

impl ResolvedVideo {
    pub fn url(&self) -> &str {
        match self {
            Self::Embed { url, .. } | Self::Direct { url } => url.as_str(),
        }
    }

    pub fn provider(&self) -> Option<VideoProvider> {
        match self {
            Self::Embed { provider, .. } => Some(*provider),
            Self::Direct { .. } => None,
        }
    }
}

/// Resolves `url` into its embeddable or direct form.
///
/// Watch and short-link URLs are rewritten to the provider's embed URL;
/// embed URLs are left as-is; everything else (including malformed input)
/// is returned unchanged as a direct URL.
pub fn resolve_video(url: &str) -> ResolvedVideo {
    let trimmed = url.trim();
    let detected = parse_lenient(trimmed).and_then(|parsed| {
        youtube_embed(&parsed, trimmed)
            .map(|embed| (VideoProvider::YouTube, embed))
            .or_else(|| vimeo_embed(&parsed, trimmed).map(|embed| (VideoProvider::Vimeo, embed)))
    });

    match detected {
        Some((provider, embed)) => {
            debug!(
                "event=video_resolve module=media status=embed provider={} rewritten={}",
                provider,
                embed != trimmed
            );
            ResolvedVideo::Embed {
                provider,
                url: embed,
            }
        }
        None => ResolvedVideo::Direct {
            url: url.to_string(),
        },
    }
}

/// String form of [`resolve_video`].
pub fn resolve_video_url(url: &str) -> String {
    match resolve_video(url) {
        ResolvedVideo::Embed { url, .. } | ResolvedVideo::Direct { url } => url,
    }
}

fn parse_lenient(value: &str) -> Option<Url> {
    match Url::parse(value) {
        Ok(parsed) => Some(parsed),
        // Authors often paste `youtu.be/...` without a scheme.
        Err(url::ParseError::RelativeUrlWithoutBase) if !value.is_empty() => {
            Url::parse(&format!("https://{value}")).ok()
        }
        Err(_) => None,
    }
}

fn normalized_host(parsed: &Url) -> Option<String> {
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?.to_ascii_lowercase();
    let host = host
        .strip_prefix("www.")
        .or_else(|| host.strip_prefix("m."))
        .unwrap_or(&host)
        .to_string();
    Some(host)
}

fn path_segments(parsed: &Url) -> Vec<&str> {
    parsed
        .path_segments()
        .map(|segments| segments.filter(|segment| !segment.is_empty()).collect())
        .unwrap_or_default()
}

fn youtube_embed(parsed: &Url, original: &str) -> Option<String> {
    let host = normalized_host(parsed)?;
    let segments = path_segments(parsed);
    let video_id = match host.as_str() {
        "youtu.be" => segments.first().map(|id| id.to_string()),
        "youtube.com" | "youtube-nocookie.com" => match segments.as_slice() {
            ["watch"] => query_value(parsed, "v"),
            ["embed", id] if is_valid_video_id(id) => return Some(original.to_string()),
            ["shorts", id] | ["live", id] | ["v", id] => Some(id.to_string()),
            _ => None,
        },
        _ => None,
    }?;

    if !is_valid_video_id(&video_id) {
        return None;
    }

    let start = query_value(parsed, "t")
        .or_else(|| query_value(parsed, "start"))
        .and_then(|value| parse_timestamp(&value));
    Some(match start {
        Some(seconds) => format!("{YOUTUBE_EMBED_BASE}{video_id}?start={seconds}"),
        None => format!("{YOUTUBE_EMBED_BASE}{video_id}"),
    })
}

fn vimeo_embed(parsed: &Url, original: &str) -> Option<String> {
    let host = normalized_host(parsed)?;
    let segments = path_segments(parsed);
    match host.as_str() {
        "player.vimeo.com" => match segments.as_slice() {
            ["video", id] if VIMEO_ID_RE.is_match(id) => Some(original.to_string()),
            _ => None,
        },
        "vimeo.com" => segments
            .iter()
            .rev()
            .find(|segment| VIMEO_ID_RE.is_match(segment))
            .map(|id| format!("{VIMEO_EMBED_BASE}{id}")),
        _ => None,
    }
}

fn query_value(parsed: &Url, key: &str) -> Option<String> {
    parsed
        .query_pairs()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn is_valid_video_id(value: &str) -> bool {
    VIDEO_ID_RE.is_match(value)
}

/// Parses `90`, `90s`, `1m30s` or `1h2m3s` into whole seconds.
///
/// Zero and unparseable values yield `None`.
fn parse_timestamp(value: &str) -> Option<u64> {
    let captures = TIMESTAMP_RE.captures(value.trim())?;
    let part = |index: usize| -> Option<u64> {
        captures
            .get(index)
            .map_or(Some(0), |matched| matched.as_str().parse::<u64>().ok())
    };
    let seconds = part(1)?
        .checked_mul(3600)?
        .checked_add(part(2)?.checked_mul(60)?)?
        .checked_add(part(3)?)?;
    (seconds > 0).then_some(seconds)
}

#[cfg(test)]
mod tests {
    use super::{parse_timestamp, parse_lenient};

    #[test]
    fn timestamps_parse_in_all_supported_shapes() {
        assert_eq!(parse_timestamp("5"), Some(5));
        assert_eq!(parse_timestamp("90s"), Some(90));
        assert_eq!(parse_timestamp("1m30s"), Some(90));
        assert_eq!(parse_timestamp("1h2m3s"), Some(3723));
    }

    #[test]
    fn zero_and_garbage_timestamps_are_ignored() {
        assert_eq!(parse_timestamp("0"), None);
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("soon"), None);
    }

    #[test]
    fn schemeless_urls_are_parsed_as_https() {
        let parsed = parse_lenient("youtu.be/abc").expect("schemeless url should parse");
        assert_eq!(parsed.scheme(), "https");
        assert_eq!(parsed.host_str(), Some("youtu.be"));
    }
}
