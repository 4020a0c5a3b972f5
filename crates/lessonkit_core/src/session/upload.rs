//! Media upload collaborator seam.
//!
//! # Responsibility
//! - Define the interface the editor uses to obtain uploaded media.
//! - Provide an init-once upload service wrapper so the third-party client
//!   is created lazily, once, and shared by every session that holds it.
//!
//! # Invariants
//! - `UploadService` runs its initializer at most once successfully.
//! - A failed initialization is reported and retried on the next request.

use crate::model::media::{MediaKind, MediaMetadata};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Upload collaborator failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadError {
    /// The upload client could not be initialized.
    Unavailable(String),
    /// The upload was attempted and failed.
    Failed(String),
}

impl Display for UploadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(message) => write!(f, "upload service unavailable: {message}"),
            Self::Failed(message) => write!(f, "upload failed: {message}"),
        }
    }
}

impl Error for UploadError {}

/// Progress snapshot exposed by the upload collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadStatus {
    pub is_uploading: bool,
    /// Percentage in `0..=100`.
    pub progress: u8,
    pub error: Option<String>,
}

/// External media upload collaborator.
pub trait MediaUploader {
    /// Runs one user-initiated upload.
    ///
    /// `Ok(None)` means the user closed or aborted the upload widget.
    fn upload_media(&self, kind: MediaKind) -> Result<Option<MediaMetadata>, UploadError>;

    /// Current progress; collaborators without progress reporting keep the
    /// default idle status.
    fn status(&self) -> UploadStatus {
        UploadStatus::default()
    }
}

type BoxedUploader = Box<dyn MediaUploader + Send + Sync>;
type UploaderInit = Box<dyn Fn() -> Result<BoxedUploader, UploadError> + Send + Sync>;

/// Lazily initialized upload client shared across editor sessions.
pub struct UploadService {
    init: UploaderInit,
    uploader: OnceCell<BoxedUploader>,
}

impl UploadService {
    /// Creates a service that builds its client on first use.
    pub fn new<F, U>(init: F) -> Self
    where
        F: Fn() -> Result<U, UploadError> + Send + Sync + 'static,
        U: MediaUploader + Send + Sync + 'static,
    {
        Self {
            init: Box::new(move || init().map(|uploader| Box::new(uploader) as BoxedUploader)),
            uploader: OnceCell::new(),
        }
    }

    /// Whether the underlying client has been created.
    pub fn is_initialized(&self) -> bool {
        self.uploader.get().is_some()
    }

    fn uploader(&self) -> Result<&(dyn MediaUploader + Send + Sync), UploadError> {
        self.uploader
            .get_or_try_init(|| {
                let created = (self.init)();
                match &created {
                    Ok(_) => info!("event=upload_service_init module=session status=ok"),
                    Err(err) => error!(
                        "event=upload_service_init module=session status=error error={}",
                        err
                    ),
                }
                created
            })
            .map(|uploader| uploader.as_ref())
    }
}

impl MediaUploader for UploadService {
    fn upload_media(&self, kind: MediaKind) -> Result<Option<MediaMetadata>, UploadError> {
        self.uploader()?.upload_media(kind)
    }

    fn status(&self) -> UploadStatus {
        self.uploader
            .get()
            .map(|uploader| uploader.status())
            .unwrap_or_default()
    }
}
