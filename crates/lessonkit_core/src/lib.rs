//! Core content logic for LessonKit lessons.
//! This crate is the single source of truth for block invariants.

pub mod config;
pub mod db;
pub mod engine;
pub mod logging;
pub mod media;
pub mod model;
pub mod render;
pub mod repo;
pub mod service;
pub mod session;

pub use config::{
    ConfigError, CoreConfig, EditorConfig, LoggingConfig, RenderConfig, StoreConfig,
};
pub use db::{open_db, open_db_in_memory, open_store, DbError, DbResult, StoreTarget};
pub use logging::{
    default_log_level, init_logging, init_logging_from_config, logging_status, LoggingError,
};
pub use media::{resolve_image, resolve_video, resolve_video_url, ResolvedVideo, VideoProvider};
pub use model::block::{
    AttributeMap, BlockAttributes, BlockId, BlockType, CodeAttributes, ContentBlock,
    HeadingAttributes, ImageAttributes, TextAttributes, VideoAttributes,
};
pub use model::lesson::{Lesson, LessonId};
pub use model::media::{MediaKind, MediaMetadata, PLACEHOLDER_MEDIA_URL};
pub use render::{
    AllowlistSanitizer, BlockOutput, HeadingStyle, HtmlSanitizer, RenderContext, RenderOptions,
    RenderedSlot, Renderer,
};
pub use repo::lesson_repo::{
    LessonListQuery, LessonRepository, RepoError, RepoResult, SqliteLessonRepository,
};
pub use service::autosave::AutosaveDebouncer;
pub use service::lesson_service::{LessonService, LessonServiceError, LessonServiceResult};
pub use session::{
    EditorSession, EditorUiState, MediaUploader, Notice, NoticeBoard, UploadError,
    UploadOutcome, UploadService, UploadStatus,
};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
