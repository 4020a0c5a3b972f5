//! Lesson use-case service.
//!
//! # Responsibility
//! - Provide lesson lifecycle entry points (create, open, save, publish).
//! - Delegate storage to a `LessonRepository`.
//!
//! # Invariants
//! - A lesson is only published when every block carries real content.
//! - Saves always write the whole lesson.

use crate::config::EditorConfig;
use crate::model::block::BlockId;
use crate::model::lesson::{Lesson, LessonId};
use crate::repo::lesson_repo::{LessonListQuery, LessonRepository, RepoError, RepoResult};
use crate::service::autosave::AutosaveDebouncer;
use crate::session::EditorSession;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

#[derive(Debug)]
pub enum LessonServiceError {
    Repo(RepoError),
    NotFound(LessonId),
    /// Publishing was refused because these blocks still lack content.
    IncompleteContent(Vec<BlockId>),
}

impl Display for LessonServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "lesson not found: {id}"),
            Self::IncompleteContent(ids) => {
                write!(f, "lesson has {} block(s) without content", ids.len())
            }
        }
    }
}

impl Error for LessonServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::NotFound(_) | Self::IncompleteContent(_) => None,
        }
    }
}

impl From<RepoError> for LessonServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub type LessonServiceResult<T> = Result<T, LessonServiceError>;

pub struct LessonService<R: LessonRepository> {
    repo: R,
    editor: EditorConfig,
}

impl<R: LessonRepository> LessonService<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            editor: EditorConfig::default(),
        }
    }

    /// Sessions and debouncers created by this service use `editor`.
    pub fn with_editor_config(mut self, editor: EditorConfig) -> Self {
        self.editor = editor;
        self
    }

    /// A debouncer for saves of one open session.
    pub fn autosave_debouncer(&self) -> AutosaveDebouncer {
        AutosaveDebouncer::from_config(&self.editor)
    }

    /// Creates an empty draft lesson and returns its id.
    pub fn create_lesson(&self, title: impl Into<String>) -> LessonServiceResult<LessonId> {
        let lesson = Lesson::new(title);
        let id = self.repo.create_lesson(&lesson)?;
        info!(
            "event=lesson_create module=service status=ok lesson_id={}",
            id
        );
        Ok(id)
    }

    pub fn get_lesson(&self, id: LessonId) -> RepoResult<Option<Lesson>> {
        self.repo.get_lesson(id)
    }

    pub fn list_lessons(&self, query: &LessonListQuery) -> RepoResult<Vec<Lesson>> {
        self.repo.list_lessons(query)
    }

    pub fn delete_lesson(&self, id: LessonId) -> LessonServiceResult<()> {
        self.repo.delete_lesson(id)?;
        info!(
            "event=lesson_delete module=service status=ok lesson_id={}",
            id
        );
        Ok(())
    }

    /// Loads a lesson into a fresh editor session.
    pub fn open_session(&self, id: LessonId) -> LessonServiceResult<EditorSession> {
        let lesson = self
            .repo
            .get_lesson(id)?
            .ok_or(LessonServiceError::NotFound(id))?;
        Ok(EditorSession::new(lesson).with_config(&self.editor))
    }

    /// Writes the whole lesson.
    pub fn save_lesson(&self, lesson: &Lesson) -> LessonServiceResult<()> {
        if let Err(err) = self.repo.save_lesson(lesson) {
            warn!(
                "event=lesson_save module=service status=error lesson_id={} error={}",
                lesson.id, err
            );
            return Err(err.into());
        }
        info!(
            "event=lesson_save module=service status=ok lesson_id={} block_count={}",
            lesson.id,
            lesson.content_blocks.len()
        );
        Ok(())
    }

    /// Saves `lesson` when the debounce window has elapsed.
    ///
    /// Returns whether a save ran. A failed save keeps the lesson dirty so
    /// the next tick retries.
    pub fn save_if_due(
        &self,
        debouncer: &mut AutosaveDebouncer,
        lesson: &Lesson,
        now: Instant,
    ) -> LessonServiceResult<bool> {
        if !debouncer.take_due(now) {
            return Ok(false);
        }
        if let Err(err) = self.save_lesson(lesson) {
            debouncer.mark_dirty(now);
            return Err(err);
        }
        Ok(true)
    }

    /// Marks a lesson published after checking every block has content.
    pub fn publish_lesson(&self, id: LessonId) -> LessonServiceResult<()> {
        let mut lesson = self
            .repo
            .get_lesson(id)?
            .ok_or(LessonServiceError::NotFound(id))?;
        let missing = lesson
            .incomplete_blocks()
            .into_iter()
            .cloned()
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            warn!(
                "event=lesson_publish module=service status=rejected lesson_id={} incomplete_blocks={}",
                id,
                missing.len()
            );
            return Err(LessonServiceError::IncompleteContent(missing));
        }
        lesson.is_published = true;
        self.save_lesson(&lesson)
    }

    pub fn unpublish_lesson(&self, id: LessonId) -> LessonServiceResult<()> {
        let mut lesson = self
            .repo
            .get_lesson(id)?
            .ok_or(LessonServiceError::NotFound(id))?;
        lesson.is_published = false;
        self.save_lesson(&lesson)
    }
}
