//! Content block domain model.
//!
//! # Responsibility
//! - Define the canonical `ContentBlock` record and its wire shape.
//! - Define one attribute struct per block type with explicit defaults.
//! - Provide construction helpers that always yield a valid block.
//!
//! # Invariants
//! - `id` is assigned at creation and never changes.
//! - The attribute variant fixes the block type; no API swaps variants.
//! - Reading stored JSON never fails on unknown types or attribute values.
//!
//! # Wire shape
//! `{"id", "type", "content", "attributes", "position"}`, matching what the
//! persistence collaborator stores in a lesson's `content_blocks` array.

use crate::model::media::{is_missing_media, MediaMetadata, PLACEHOLDER_MEDIA_URL};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Heading level assigned to new or level-less headings.
pub const DEFAULT_HEADING_LEVEL: u8 = 2;
/// Highest heading level accepted by the model.
pub const MAX_HEADING_LEVEL: u8 = 6;
/// Language label assigned to new or language-less code blocks.
pub const DEFAULT_CODE_LANGUAGE: &str = "plaintext";

const ATTR_LEVEL: &str = "level";
const ATTR_ALT: &str = "alt";
const ATTR_CAPTION: &str = "caption";
const ATTR_LANGUAGE: &str = "language";
const ATTR_MEDIA_METADATA: &str = "media_metadata";

static HTML_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

/// Open key/value bag used on the wire and for partial attribute updates.
pub type AttributeMap = Map<String, Value>;

/// Opaque block identifier, unique within a lesson.
///
/// Stored ids are accepted as-is; fresh ids are random UUID strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    /// Generates a fresh, never-reused id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for BlockId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BlockId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for BlockId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Block types authors can create.
///
/// Stored blocks with any other type load as unsupported blocks, see
/// [`BlockAttributes::Unsupported`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockType {
    /// Sanitized rich-text HTML fragment.
    Text,
    /// Plain heading text with a level.
    Heading,
    /// Image referenced by URL.
    Image,
    /// Video referenced by URL (uploaded or external provider).
    Video,
    /// Raw source code with a language label.
    Code,
}

impl BlockType {
    /// All creatable block types in palette order.
    pub const ALL: [BlockType; 5] = [
        BlockType::Text,
        BlockType::Heading,
        BlockType::Image,
        BlockType::Video,
        BlockType::Code,
    ];

    /// Stable wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Heading => "heading",
            Self::Image => "image",
            Self::Video => "video",
            Self::Code => "code",
        }
    }

    /// Parses a wire name; unknown names return `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "text" => Some(Self::Text),
            "heading" => Some(Self::Heading),
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            "code" => Some(Self::Code),
            _ => None,
        }
    }

    /// Whether blocks of this type carry a media URL as content.
    pub fn is_media(self) -> bool {
        matches!(self, Self::Image | Self::Video)
    }
}

impl Display for BlockType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextAttributes {
    /// Keys with no typed meaning, preserved for round-trip.
    pub extra: AttributeMap,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadingAttributes {
    /// `1..=6`; anything else reads as [`DEFAULT_HEADING_LEVEL`]. A stored
    /// spelling such as `"h4"` or `9` is kept in `extra` and written back
    /// while `level` still matches it.
    pub level: u8,
    pub extra: AttributeMap,
}

impl Default for HeadingAttributes {
    fn default() -> Self {
        Self {
            level: DEFAULT_HEADING_LEVEL,
            extra: AttributeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageAttributes {
    pub alt: Option<String>,
    pub caption: Option<String>,
    pub media_metadata: Option<MediaMetadata>,
    pub extra: AttributeMap,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoAttributes {
    pub caption: Option<String>,
    pub media_metadata: Option<MediaMetadata>,
    pub extra: AttributeMap,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodeAttributes {
    /// Highlighting language label, never blank.
    pub language: String,
    pub extra: AttributeMap,
}

impl Default for CodeAttributes {
    fn default() -> Self {
        Self {
            language: DEFAULT_CODE_LANGUAGE.to_string(),
            extra: AttributeMap::new(),
        }
    }
}

/// Type-specific attributes; the variant is the block's type.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockAttributes {
    Text(TextAttributes),
    Heading(HeadingAttributes),
    Image(ImageAttributes),
    Video(VideoAttributes),
    Code(CodeAttributes),
    /// Stored block of a type this build does not know.
    Unsupported {
        type_name: String,
        raw: AttributeMap,
    },
}

impl BlockAttributes {
    /// Returns the default attributes for a newly created block.
    pub fn defaults_for(kind: BlockType) -> Self {
        match kind {
            BlockType::Text => Self::Text(TextAttributes::default()),
            BlockType::Heading => Self::Heading(HeadingAttributes::default()),
            BlockType::Image => Self::Image(ImageAttributes::default()),
            BlockType::Video => Self::Video(VideoAttributes::default()),
            BlockType::Code => Self::Code(CodeAttributes::default()),
        }
    }

    /// Returns the block type, or `None` for unsupported blocks.
    pub fn block_type(&self) -> Option<BlockType> {
        match self {
            Self::Text(_) => Some(BlockType::Text),
            Self::Heading(_) => Some(BlockType::Heading),
            Self::Image(_) => Some(BlockType::Image),
            Self::Video(_) => Some(BlockType::Video),
            Self::Code(_) => Some(BlockType::Code),
            Self::Unsupported { .. } => None,
        }
    }

    /// Returns the wire type name, including unknown stored names.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Unsupported { type_name, .. } => type_name.as_str(),
            other => other
                .block_type()
                .map(BlockType::as_str)
                .unwrap_or_default(),
        }
    }

    /// Builds typed attributes from a wire type name and attribute bag.
    ///
    /// Total: values of the wrong shape fall back to the per-type default.
    pub fn from_map(type_name: &str, mut map: AttributeMap) -> Self {
        match BlockType::parse(type_name) {
            Some(BlockType::Text) => Self::Text(TextAttributes { extra: map }),
            Some(BlockType::Heading) => {
                let level = take_heading_level(&mut map);
                Self::Heading(HeadingAttributes { level, extra: map })
            }
            Some(BlockType::Image) => {
                let alt = take_string(&mut map, ATTR_ALT);
                let caption = take_string(&mut map, ATTR_CAPTION);
                let media_metadata = take_media_metadata(&mut map);
                Self::Image(ImageAttributes {
                    alt,
                    caption,
                    media_metadata,
                    extra: map,
                })
            }
            Some(BlockType::Video) => {
                let caption = take_string(&mut map, ATTR_CAPTION);
                let media_metadata = take_media_metadata(&mut map);
                Self::Video(VideoAttributes {
                    caption,
                    media_metadata,
                    extra: map,
                })
            }
            Some(BlockType::Code) => {
                let language = take_string(&mut map, ATTR_LANGUAGE)
                    .map(|value| value.trim().to_string())
                    .filter(|value| !value.is_empty())
                    .unwrap_or_else(|| DEFAULT_CODE_LANGUAGE.to_string());
                Self::Code(CodeAttributes {
                    language,
                    extra: map,
                })
            }
            None => Self::Unsupported {
                type_name: type_name.to_string(),
                raw: map,
            },
        }
    }

    /// Flattens typed attributes back into the wire bag.
    pub fn to_map(&self) -> AttributeMap {
        let (mut map, extra) = match self {
            Self::Text(attrs) => (AttributeMap::new(), &attrs.extra),
            Self::Heading(attrs) => {
                let stored = attrs
                    .extra
                    .get(ATTR_LEVEL)
                    .filter(|raw| heading_level_from_value(raw) == attrs.level)
                    .cloned();
                let mut map = AttributeMap::new();
                map.insert(
                    ATTR_LEVEL.to_string(),
                    stored.unwrap_or_else(|| Value::from(attrs.level)),
                );
                (map, &attrs.extra)
            }
            Self::Image(attrs) => {
                let mut map = AttributeMap::new();
                put_string(&mut map, ATTR_ALT, attrs.alt.as_deref());
                put_string(&mut map, ATTR_CAPTION, attrs.caption.as_deref());
                put_media_metadata(&mut map, attrs.media_metadata.as_ref());
                (map, &attrs.extra)
            }
            Self::Video(attrs) => {
                let mut map = AttributeMap::new();
                put_string(&mut map, ATTR_CAPTION, attrs.caption.as_deref());
                put_media_metadata(&mut map, attrs.media_metadata.as_ref());
                (map, &attrs.extra)
            }
            Self::Code(attrs) => {
                let mut map = AttributeMap::new();
                map.insert(
                    ATTR_LANGUAGE.to_string(),
                    Value::String(attrs.language.clone()),
                );
                (map, &attrs.extra)
            }
            Self::Unsupported { raw, .. } => return raw.clone(),
        };
        for (key, value) in extra {
            map.entry(key.clone()).or_insert_with(|| value.clone());
        }
        map
    }

    /// Shallow-merges `patch` over the current bag, keeping the variant.
    pub fn merged(&self, patch: &AttributeMap) -> Self {
        let mut map = self.to_map();
        for (key, value) in patch {
            map.insert(key.clone(), value.clone());
        }
        Self::from_map(self.type_name(), map)
    }
}

/// One unit of lesson content.
///
/// Fields are private so that only the mutation engine can move or edit a
/// block; the type is fixed by the attribute variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WireBlock", into = "WireBlock")]
pub struct ContentBlock {
    id: BlockId,
    content: String,
    attributes: BlockAttributes,
    position: usize,
}

impl ContentBlock {
    /// Creates a block of `kind` with a fresh id and per-type defaults.
    ///
    /// # Defaults
    /// - text/code/heading: empty content.
    /// - image/video: the placeholder sentinel as content.
    /// - heading level 2, code language `plaintext`.
    pub fn new(kind: BlockType, position: usize) -> Self {
        Self::with_id(BlockId::generate(), kind, position)
    }

    /// Creates a default block with a caller-provided id.
    pub fn with_id(id: BlockId, kind: BlockType, position: usize) -> Self {
        let content = if kind.is_media() {
            PLACEHOLDER_MEDIA_URL.to_string()
        } else {
            String::new()
        };
        Self {
            id,
            content,
            attributes: BlockAttributes::defaults_for(kind),
            position,
        }
    }

    /// Builds a block from already-stored parts, e.g. an import path.
    ///
    /// Unknown `type_name` values produce an unsupported block.
    pub fn from_parts(
        id: impl Into<BlockId>,
        type_name: &str,
        content: impl Into<String>,
        attributes: AttributeMap,
        position: usize,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            attributes: BlockAttributes::from_map(type_name, attributes),
            position,
        }
    }

    pub fn id(&self) -> &BlockId {
        &self.id
    }

    /// Block type, or `None` for unsupported stored types.
    pub fn block_type(&self) -> Option<BlockType> {
        self.attributes.block_type()
    }

    /// Wire type name, including unknown stored names.
    pub fn type_name(&self) -> &str {
        self.attributes.type_name()
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn attributes(&self) -> &BlockAttributes {
        &self.attributes
    }

    /// Zero-based render order inside the owning lesson.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Media URL for image/video blocks that have real media.
    ///
    /// Returns `None` for non-media blocks, blank content and the
    /// placeholder sentinel.
    pub fn media_url(&self) -> Option<&str> {
        match self.block_type() {
            Some(kind) if kind.is_media() && !is_missing_media(&self.content) => {
                Some(self.content.trim())
            }
            _ => None,
        }
    }

    /// Whether the block holds enough content to be worth publishing.
    ///
    /// Unsupported blocks are reported complete; their content cannot be
    /// judged by this build.
    pub fn is_complete(&self) -> bool {
        match self.block_type() {
            Some(BlockType::Text) => !HTML_TAG_RE
                .replace_all(&self.content, "")
                .replace("&nbsp;", " ")
                .trim()
                .is_empty(),
            Some(BlockType::Heading) | Some(BlockType::Code) => !self.content.trim().is_empty(),
            Some(BlockType::Image) | Some(BlockType::Video) => self.media_url().is_some(),
            None => true,
        }
    }

    pub(crate) fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    pub(crate) fn set_content(&mut self, content: String) {
        self.content = content;
    }

    pub(crate) fn merge_attributes(&mut self, patch: &AttributeMap) {
        self.attributes = self.attributes.merged(patch);
    }

    pub(crate) fn replace_id(&mut self, id: BlockId) {
        self.id = id;
    }
}

/// Lenient stored representation; every field may be missing or mistyped.
#[derive(Serialize, Deserialize)]
struct WireBlock {
    #[serde(default)]
    id: Option<Value>,
    #[serde(rename = "type", default)]
    kind: Option<Value>,
    #[serde(default)]
    content: Option<Value>,
    #[serde(default)]
    attributes: Option<Value>,
    #[serde(default)]
    position: Option<Value>,
}

impl From<WireBlock> for ContentBlock {
    fn from(wire: WireBlock) -> Self {
        let id = match wire.id {
            Some(Value::String(value)) if !value.trim().is_empty() => BlockId(value),
            Some(Value::Number(value)) => BlockId(value.to_string()),
            _ => BlockId::generate(),
        };
        let type_name = match wire.kind {
            Some(Value::String(value)) => value,
            _ => String::new(),
        };
        let content = match wire.content {
            Some(Value::String(value)) => value,
            None | Some(Value::Null) => String::new(),
            Some(other) => other.to_string(),
        };
        let attributes = match wire.attributes {
            Some(Value::Object(map)) => map,
            _ => AttributeMap::new(),
        };
        // Missing or unreadable positions sort last; `reindex` renumbers them.
        let position = wire
            .position
            .as_ref()
            .and_then(position_from_value)
            .unwrap_or(usize::MAX);

        Self {
            id,
            content,
            attributes: BlockAttributes::from_map(&type_name, attributes),
            position,
        }
    }
}

impl From<ContentBlock> for WireBlock {
    fn from(block: ContentBlock) -> Self {
        let attributes = block.attributes.to_map();
        Self {
            id: Some(Value::String(block.id.0)),
            kind: Some(Value::String(block.attributes.type_name().to_string())),
            content: Some(Value::String(block.content)),
            attributes: Some(Value::Object(attributes)),
            position: Some(Value::from(block.position as u64)),
        }
    }
}

fn position_from_value(value: &Value) -> Option<usize> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64))
            .map(|raw| raw.max(0) as usize),
        Value::String(text) => text.trim().parse::<i64>().ok().map(|raw| raw.max(0) as usize),
        _ => None,
    }
}

fn take_string(map: &mut AttributeMap, key: &str) -> Option<String> {
    match map.remove(key)? {
        Value::String(value) => Some(value),
        Value::Number(value) => Some(value.to_string()),
        Value::Bool(value) => Some(value.to_string()),
        _ => None,
    }
}

/// Reads the heading level; the stored value stays in `map` unless it is
/// already the canonical number, so saving writes back what was loaded.
fn take_heading_level(map: &mut AttributeMap) -> u8 {
    let Some(raw) = map.get(ATTR_LEVEL) else {
        return DEFAULT_HEADING_LEVEL;
    };
    let level = heading_level_from_value(raw);
    let canonical = *raw == Value::from(level);
    if canonical {
        map.remove(ATTR_LEVEL);
    }
    level
}

fn heading_level_from_value(value: &Value) -> u8 {
    let parsed = match value {
        Value::Number(value) => value.as_u64(),
        Value::String(value) => {
            let trimmed = value.trim();
            trimmed
                .strip_prefix(['h', 'H'])
                .unwrap_or(trimmed)
                .parse::<u64>()
                .ok()
        }
        _ => None,
    };
    match parsed {
        Some(level) if (1..=MAX_HEADING_LEVEL as u64).contains(&level) => level as u8,
        _ => DEFAULT_HEADING_LEVEL,
    }
}

fn take_media_metadata(map: &mut AttributeMap) -> Option<MediaMetadata> {
    let value = map.remove(ATTR_MEDIA_METADATA)?;
    if value.is_null() {
        return None;
    }
    let typed = serde_json::from_value::<MediaMetadata>(value.clone())
        .ok()
        .filter(|metadata| serde_json::to_value(metadata).ok().as_ref() == Some(&value));
    if typed.is_none() {
        // Payloads the typed view cannot reproduce stay raw so saving keeps them.
        map.insert(ATTR_MEDIA_METADATA.to_string(), value);
    }
    typed
}

fn put_string(map: &mut AttributeMap, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        map.insert(key.to_string(), Value::String(value.to_string()));
    }
}

fn put_media_metadata(map: &mut AttributeMap, metadata: Option<&MediaMetadata>) {
    if let Some(value) = metadata.and_then(|metadata| serde_json::to_value(metadata).ok()) {
        map.insert(ATTR_MEDIA_METADATA.to_string(), value);
    }
}
