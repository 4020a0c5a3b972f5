//! Lesson record (the slice of it the content core needs).
//!
//! # Invariants
//! - `content_blocks` is never absent; stored `null` loads as empty.
//! - Deserialized block lists are normalized (unique ids, contiguous
//!   positions) before any caller sees them.

use crate::engine::normalize_loaded;
use crate::model::block::{BlockId, ContentBlock};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Stable lesson identifier assigned by the persistence collaborator.
pub type LessonId = Uuid;

/// Lesson with its ordered content blocks.
///
/// Scalar fields are opaque pass-through values for the content core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: LessonId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Estimated duration in minutes.
    #[serde(default)]
    pub estimated_duration: Option<u32>,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default, deserialize_with = "deserialize_content_blocks")]
    pub content_blocks: Vec<ContentBlock>,
}

impl Lesson {
    /// Creates an empty lesson with a generated id.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title)
    }

    /// Creates an empty lesson with a caller-provided id.
    pub fn with_id(id: LessonId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            estimated_duration: None,
            is_published: false,
            content_blocks: Vec::new(),
        }
    }

    /// Returns ids of blocks still missing content, in position order.
    pub fn incomplete_blocks(&self) -> Vec<&BlockId> {
        let mut blocks = self.content_blocks.iter().collect::<Vec<_>>();
        blocks.sort_by_key(|block| block.position());
        blocks
            .into_iter()
            .filter(|block| !block.is_complete())
            .map(ContentBlock::id)
            .collect()
    }

    /// Whether every block carries real content.
    pub fn is_content_complete(&self) -> bool {
        self.content_blocks.iter().all(ContentBlock::is_complete)
    }
}

fn deserialize_content_blocks<'de, D>(deserializer: D) -> Result<Vec<ContentBlock>, D::Error>
where
    D: Deserializer<'de>,
{
    let blocks = Option::<Vec<ContentBlock>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(normalize_loaded(blocks))
}
