use lessonkit_core::{
    BlockAttributes, BlockType, ContentBlock, EditorConfig, EditorSession, Lesson, MediaKind,
    MediaMetadata, MediaUploader, Renderer, UploadError, UploadOutcome, UploadService,
    PLACEHOLDER_MEDIA_URL,
};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct FixedUploader(Result<Option<MediaMetadata>, UploadError>);

impl MediaUploader for FixedUploader {
    fn upload_media(&self, _kind: MediaKind) -> Result<Option<MediaMetadata>, UploadError> {
        self.0.clone()
    }
}

fn recording_session() -> (EditorSession, Rc<RefCell<Vec<usize>>>) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let session = EditorSession::new(Lesson::new("Intro"))
        .on_lesson_changed(move |lesson| sink.borrow_mut().push(lesson.content_blocks.len()));
    (session, seen)
}

#[test]
fn each_structural_edit_reports_the_whole_lesson_once() {
    let (mut session, seen) = recording_session();

    let text = session.add_block(BlockType::Text);
    let code = session.add_block(BlockType::Code);
    assert!(session.move_block_down(&text));
    assert!(session.remove_block(&code));

    assert_eq!(*seen.borrow(), vec![1, 2, 2, 1]);
    assert_eq!(session.blocks()[0].id(), &text);
    assert_eq!(session.blocks()[0].position(), 0);
}

#[test]
fn noop_edits_are_not_reported() {
    let (mut session, seen) = recording_session();
    let only = session.add_block(BlockType::Heading);

    assert!(!session.move_block_up(&only));
    assert!(!session.move_block_down(&only));
    assert!(!session.remove_block(&"missing".into()));
    assert!(!session.update_block_content(&only, ""));

    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn new_blocks_are_expanded_and_focused_and_removal_forgets_them() {
    let mut session = EditorSession::new(Lesson::new("Intro"));
    let id = session.add_block(BlockType::Text);

    assert!(session.ui().is_expanded(&id));
    assert_eq!(session.ui().focused(), Some(&id));

    session.remove_block(&id);
    assert!(!session.ui().is_expanded(&id));
    assert_eq!(session.ui().focused(), None);
}

#[test]
fn replacing_blocks_repairs_them_and_drops_stale_ui_state() {
    let (mut session, seen) = recording_session();
    let old = session.add_block(BlockType::Text);
    let reloaded: Vec<ContentBlock> = serde_json::from_value(json!([
        {"id": "b", "type": "code", "content": "x", "attributes": {}, "position": 4},
        {"id": "a", "type": "text", "content": "y", "attributes": {}, "position": 1}
    ]))
    .unwrap();

    assert!(session.replace_blocks(reloaded));

    assert_eq!(seen.borrow().len(), 2);
    assert_eq!(session.blocks()[0].id().as_str(), "a");
    assert_eq!(session.blocks()[1].position(), 1);
    assert!(!session.ui().is_expanded(&old));
    assert_eq!(session.ui().focused(), None);
}

#[test]
fn drag_and_drop_moves_the_dragged_block() {
    let mut session = EditorSession::new(Lesson::new("Intro"));
    let first = session.add_block(BlockType::Text);
    session.add_block(BlockType::Image);
    let last = session.add_block(BlockType::Code);

    session.ui_mut().begin_drag(&last);
    assert!(session.finish_drag(0));

    assert_eq!(session.blocks()[0].id(), &last);
    assert_eq!(session.blocks()[1].id(), &first);
    assert_eq!(session.ui().dragging(), None);
    assert!(!session.finish_drag(2));
}

#[test]
fn successful_upload_writes_url_and_metadata() {
    let metadata = MediaMetadata::new(
        "https://cdn.example.com/cat.png",
        "cloudinary",
        MediaKind::Image,
    );
    let mut session = EditorSession::new(Lesson::new("Intro"))
        .with_uploader(Arc::new(FixedUploader(Ok(Some(metadata.clone())))));
    let id = session.add_block(BlockType::Image);
    session.update_block_attributes(&id, json!({"alt": "cat"}).as_object().unwrap());

    assert_eq!(session.upload_media(&id), UploadOutcome::Applied);

    let block = &session.blocks()[0];
    assert_eq!(block.content(), "https://cdn.example.com/cat.png");
    let BlockAttributes::Image(attrs) = block.attributes() else {
        panic!("expected image attributes");
    };
    assert_eq!(attrs.alt.as_deref(), Some("cat"));
    assert_eq!(attrs.media_metadata.as_ref(), Some(&metadata));
}

#[test]
fn cancelled_upload_changes_nothing() {
    let (session, seen) = recording_session();
    let mut session = session.with_uploader(Arc::new(FixedUploader(Ok(None))));
    let id = session.add_block(BlockType::Video);

    assert_eq!(session.upload_media(&id), UploadOutcome::Cancelled);
    assert_eq!(session.blocks()[0].content(), PLACEHOLDER_MEDIA_URL);
    assert_eq!(seen.borrow().len(), 1);
    assert!(session.notices().is_empty());
}

#[test]
fn failed_upload_raises_a_dismissible_expiring_notice() {
    let mut session = EditorSession::new(Lesson::new("Intro"))
        .with_notice_ttl(Duration::from_secs(5))
        .with_uploader(Arc::new(FixedUploader(Err(UploadError::Failed(
            "network down".to_string(),
        )))));
    let id = session.add_block(BlockType::Image);
    let before = session.blocks().to_vec();

    let outcome = session.upload_media(&id);

    assert!(matches!(outcome, UploadOutcome::Failed(UploadError::Failed(_))));
    assert_eq!(session.blocks(), before.as_slice());
    let notices = session.notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].message.contains("network down"));
    assert_eq!(notices[0].block_id.as_ref(), Some(&id));

    let later = notices[0].raised_at + Duration::from_secs(6);
    assert!(session.notices_at(later).is_empty());

    let notice_id = notices[0].id;
    assert!(session.dismiss_notice(notice_id));
    assert!(session.notices().is_empty());
}

#[test]
fn configured_notice_ttl_controls_expiry() {
    let config = EditorConfig {
        notice_ttl_ms: 200,
        ..EditorConfig::default()
    };
    let mut session = EditorSession::new(Lesson::new("Intro")).with_config(&config);
    let id = session.add_block(BlockType::Video);
    let now = Instant::now();

    session.apply_upload_result_at(&id, Err(UploadError::Failed("timeout".into())), now);

    assert_eq!(session.notices_at(now + Duration::from_millis(199)).len(), 1);
    assert!(session.notices_at(now + Duration::from_millis(200)).is_empty());
}

#[test]
fn upload_without_uploader_is_ignored() {
    let mut session = EditorSession::new(Lesson::new("Intro"));
    let id = session.add_block(BlockType::Image);
    assert_eq!(session.upload_media(&id), UploadOutcome::Ignored);
}

#[test]
fn shared_upload_service_initializes_once_for_many_sessions() {
    let service = Arc::new(UploadService::new(|| {
        Ok(FixedUploaderSend(MediaMetadata::new(
            "https://cdn.example.com/clip.mp4",
            "cdn",
            MediaKind::Video,
        )))
    }));

    for _ in 0..2 {
        let mut session = EditorSession::new(Lesson::new("Intro")).with_uploader(service.clone());
        let id = session.add_block(BlockType::Video);
        assert_eq!(session.upload_media(&id), UploadOutcome::Applied);
        assert_eq!(
            session.blocks()[0].media_url(),
            Some("https://cdn.example.com/clip.mp4")
        );
    }
    assert!(service.is_initialized());
}

struct FixedUploaderSend(MediaMetadata);

impl MediaUploader for FixedUploaderSend {
    fn upload_media(&self, _kind: MediaKind) -> Result<Option<MediaMetadata>, UploadError> {
        Ok(Some(self.0.clone()))
    }
}

#[test]
fn session_renders_its_working_copy() {
    let mut session = EditorSession::new(Lesson::new("Intro"));
    let id = session.add_block(BlockType::Heading);
    session.update_block_content(&id, "Welcome");
    let stamp = Instant::now();

    let slots = session.render(&Renderer::default());

    assert_eq!(slots.len(), 1);
    assert!(slots[0].output.to_html().contains("Welcome"));
    assert!(session.notices_at(stamp).is_empty());
}
