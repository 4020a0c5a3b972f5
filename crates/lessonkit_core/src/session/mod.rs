//! Lesson editor session.
//!
//! # Responsibility
//! - Own the working copy of one lesson while it is being edited.
//! - Route every block edit through the pure engine operations and commit
//!   the result as a whole-sequence replacement.
//! - Bridge the media upload collaborator into block content and attributes.
//! - Track transient UI state and inline notices outside the lesson record.
//!
//! # Invariants
//! - The committed block list is always well-formed.
//! - The change callback fires once per committed change and never for a
//!   no-op edit.
//! - A failed or cancelled upload leaves the target block unchanged.
//!
//! # See also
//! - `crate::engine` for the pure block operations.

mod notice;
mod ui_state;
mod upload;

pub use notice::{Notice, NoticeBoard, NoticeId, DEFAULT_NOTICE_TTL};
pub use ui_state::EditorUiState;
pub use upload::{MediaUploader, UploadError, UploadService, UploadStatus};

use crate::config::EditorConfig;
use crate::engine;
use crate::model::block::{AttributeMap, BlockId, BlockType, ContentBlock};
use crate::model::lesson::Lesson;
use crate::model::media::{MediaKind, MediaMetadata};
use crate::render::{HtmlSanitizer, RenderedSlot, Renderer};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Callback receiving the lesson after each committed change.
pub type LessonChanged = Box<dyn FnMut(&Lesson)>;

/// What happened to an upload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Block content and metadata were updated.
    Applied,
    /// The user aborted the upload; nothing changed.
    Cancelled,
    /// The upload failed; a notice was raised and nothing changed.
    Failed(UploadError),
    /// Unknown block, non-media block, or no uploader configured.
    Ignored,
}

/// Editing state for one lesson.
pub struct EditorSession {
    lesson: Lesson,
    ui: EditorUiState,
    notices: NoticeBoard,
    uploader: Option<Arc<dyn MediaUploader>>,
    on_change: Option<LessonChanged>,
}

impl EditorSession {
    /// Opens a session over `lesson`, repairing its block list if needed.
    pub fn new(mut lesson: Lesson) -> Self {
        let blocks = std::mem::take(&mut lesson.content_blocks);
        lesson.content_blocks = engine::normalize_loaded(blocks);
        info!(
            "event=editor_session_open module=session status=ok lesson_id={} block_count={}",
            lesson.id,
            lesson.content_blocks.len()
        );
        Self {
            lesson,
            ui: EditorUiState::default(),
            notices: NoticeBoard::default(),
            uploader: None,
            on_change: None,
        }
    }

    /// Applies the editor section of the core config.
    pub fn with_config(self, config: &EditorConfig) -> Self {
        self.with_notice_ttl(config.notice_ttl())
    }

    pub fn with_notice_ttl(mut self, ttl: Duration) -> Self {
        self.notices = NoticeBoard::new(ttl);
        self
    }

    pub fn with_uploader(mut self, uploader: Arc<dyn MediaUploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    /// Registers the callback invoked after each committed change.
    pub fn on_lesson_changed<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&Lesson) + 'static,
    {
        self.on_change = Some(Box::new(callback));
        self
    }

    pub fn lesson(&self) -> &Lesson {
        &self.lesson
    }

    pub fn blocks(&self) -> &[ContentBlock] {
        &self.lesson.content_blocks
    }

    pub fn into_lesson(self) -> Lesson {
        self.lesson
    }

    pub fn ui(&self) -> &EditorUiState {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut EditorUiState {
        &mut self.ui
    }

    /// Appends a default block of `kind`; the new block is expanded and
    /// focused.
    pub fn add_block(&mut self, kind: BlockType) -> BlockId {
        let next = engine::append(self.blocks(), kind);
        let id = next
            .last()
            .map(|block| block.id().clone())
            .unwrap_or_else(BlockId::generate);
        self.commit("append", next);
        self.ui.set_expanded(&id, true);
        self.ui.focus(&id);
        id
    }

    /// Inserts a default block of `kind` at index `at` (clamped).
    pub fn insert_block(&mut self, kind: BlockType, at: usize) -> BlockId {
        let at = at.min(self.blocks().len());
        let next = engine::insert(self.blocks(), kind, at);
        let id = next
            .get(at)
            .map(|block| block.id().clone())
            .unwrap_or_else(BlockId::generate);
        self.commit("insert", next);
        self.ui.set_expanded(&id, true);
        self.ui.focus(&id);
        id
    }

    /// Removes block `id`; returns whether anything changed.
    pub fn remove_block(&mut self, id: &BlockId) -> bool {
        let next = engine::remove(self.blocks(), id);
        self.commit("remove", next)
    }

    /// Replaces the whole block list, e.g. after a host-side reload.
    ///
    /// The list is repaired like a freshly loaded one, and UI state for
    /// blocks that no longer exist is dropped.
    pub fn replace_blocks(&mut self, blocks: Vec<ContentBlock>) -> bool {
        let next = engine::normalize_loaded(blocks);
        self.commit("replace", next)
    }

    pub fn move_block_up(&mut self, id: &BlockId) -> bool {
        let next = engine::move_up(self.blocks(), id);
        self.commit("move_up", next)
    }

    pub fn move_block_down(&mut self, id: &BlockId) -> bool {
        let next = engine::move_down(self.blocks(), id);
        self.commit("move_down", next)
    }

    pub fn move_block_to(&mut self, id: &BlockId, target: usize) -> bool {
        let next = engine::move_to(self.blocks(), id, target);
        self.commit("move_to", next)
    }

    /// Drops the block being dragged at index `target`.
    ///
    /// Returns false when no drag is in progress.
    pub fn finish_drag(&mut self, target: usize) -> bool {
        match self.ui.end_drag() {
            Some(id) => self.move_block_to(&id, target),
            None => false,
        }
    }

    pub fn update_block_content(&mut self, id: &BlockId, content: impl Into<String>) -> bool {
        let next = engine::update_content(self.blocks(), id, content);
        self.commit("update_content", next)
    }

    pub fn update_block_attributes(&mut self, id: &BlockId, patch: &AttributeMap) -> bool {
        let next = engine::update_attributes(self.blocks(), id, patch);
        self.commit("update_attributes", next)
    }

    /// Current status reported by the upload collaborator.
    pub fn upload_status(&self) -> UploadStatus {
        self.uploader
            .as_ref()
            .map(|uploader| uploader.status())
            .unwrap_or_default()
    }

    /// Runs the upload collaborator for media block `id` and applies the
    /// result.
    pub fn upload_media(&mut self, id: &BlockId) -> UploadOutcome {
        let Some(kind) = self.upload_kind(id) else {
            return UploadOutcome::Ignored;
        };
        let Some(uploader) = self.uploader.clone() else {
            warn!(
                "event=media_upload module=session status=skipped reason=no_uploader block_id={}",
                id
            );
            return UploadOutcome::Ignored;
        };
        let result = uploader.upload_media(kind);
        self.apply_upload_result(id, result)
    }

    /// Applies an upload result to block `id`.
    ///
    /// Success writes the media URL into content and merges the metadata
    /// under `media_metadata`. `Ok(None)` is a cancellation. Errors raise a
    /// notice.
    pub fn apply_upload_result(
        &mut self,
        id: &BlockId,
        result: Result<Option<MediaMetadata>, UploadError>,
    ) -> UploadOutcome {
        self.apply_upload_result_at(id, result, Instant::now())
    }

    /// Same as [`Self::apply_upload_result`] with an explicit clock.
    pub fn apply_upload_result_at(
        &mut self,
        id: &BlockId,
        result: Result<Option<MediaMetadata>, UploadError>,
        now: Instant,
    ) -> UploadOutcome {
        if self.upload_kind(id).is_none() {
            return UploadOutcome::Ignored;
        }

        let metadata = match result {
            Ok(Some(metadata)) => metadata,
            Ok(None) => {
                debug!(
                    "event=media_upload module=session status=cancelled block_id={}",
                    id
                );
                return UploadOutcome::Cancelled;
            }
            Err(err) => return self.fail_upload(id, err, now),
        };

        if metadata.url.trim().is_empty() {
            let err = UploadError::Failed("no media URL returned".to_string());
            return self.fail_upload(id, err, now);
        }
        let metadata_value = match serde_json::to_value(&metadata) {
            Ok(value) => value,
            Err(err) => {
                let err = UploadError::Failed(format!("invalid media metadata: {err}"));
                return self.fail_upload(id, err, now);
            }
        };

        let mut patch = AttributeMap::new();
        patch.insert("media_metadata".to_string(), metadata_value);
        let next = engine::update_content(self.blocks(), id, metadata.url.clone());
        let next = engine::update_attributes(&next, id, &patch);
        self.commit("media_upload", next);
        info!(
            "event=media_upload module=session status=ok block_id={} provider={} kind={}",
            id,
            metadata.provider,
            metadata.resource_type.as_str()
        );
        UploadOutcome::Applied
    }

    /// Notices visible now.
    pub fn notices(&self) -> Vec<&Notice> {
        self.notices.active(Instant::now())
    }

    pub fn notices_at(&self, now: Instant) -> Vec<&Notice> {
        self.notices.active(now)
    }

    pub fn dismiss_notice(&mut self, id: NoticeId) -> bool {
        self.notices.dismiss(id)
    }

    pub fn prune_notices(&mut self, now: Instant) -> usize {
        self.notices.prune(now)
    }

    /// Renders the working copy, in position order.
    pub fn render<S: HtmlSanitizer>(&self, renderer: &Renderer<S>) -> Vec<RenderedSlot> {
        renderer.render_blocks(self.blocks())
    }

    fn upload_kind(&self, id: &BlockId) -> Option<MediaKind> {
        match engine::find(self.blocks(), id)?.block_type()? {
            BlockType::Image => Some(MediaKind::Image),
            BlockType::Video => Some(MediaKind::Video),
            _ => None,
        }
    }

    fn fail_upload(&mut self, id: &BlockId, err: UploadError, now: Instant) -> UploadOutcome {
        warn!(
            "event=media_upload module=session status=error block_id={} error={}",
            id, err
        );
        self.notices.raise(err.to_string(), Some(id.clone()), now);
        UploadOutcome::Failed(err)
    }

    fn commit(&mut self, action: &str, next: Vec<ContentBlock>) -> bool {
        if next == self.lesson.content_blocks {
            return false;
        }
        debug_assert!(engine::is_well_formed(&next));
        self.lesson.content_blocks = next;
        self.ui.retain_known(&self.lesson.content_blocks);
        debug!(
            "event=block_mutation module=session status=ok action={} lesson_id={} block_count={}",
            action,
            self.lesson.id,
            self.lesson.content_blocks.len()
        );
        if let Some(callback) = self.on_change.as_mut() {
            callback(&self.lesson);
        }
        true
    }
}
