use lessonkit_core::{resolve_image, resolve_video, resolve_video_url, ResolvedVideo, VideoProvider};

#[test]
fn short_link_with_timestamp_becomes_embed_url() {
    let resolved = resolve_video_url("https://youtu.be/ABC123?t=5");

    assert!(resolved.contains("ABC123"));
    assert!(!resolved.contains("youtu.be/ABC123"));
    assert_eq!(resolved, "https://www.youtube.com/embed/ABC123?start=5");
}

#[test]
fn youtube_url_shapes_share_one_embed_form() {
    let expected = "https://www.youtube.com/embed/dQw4w9WgXcQ";
    for url in [
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        "https://m.youtube.com/watch?v=dQw4w9WgXcQ&feature=share",
        "https://youtube.com/shorts/dQw4w9WgXcQ",
        "https://www.youtube.com/live/dQw4w9WgXcQ",
        "https://www.youtube-nocookie.com/v/dQw4w9WgXcQ",
        "youtu.be/dQw4w9WgXcQ",
    ] {
        assert_eq!(resolve_video_url(url), expected, "input: {url}");
    }
}

#[test]
fn vimeo_links_become_player_urls() {
    assert_eq!(
        resolve_video_url("https://vimeo.com/76979871"),
        "https://player.vimeo.com/video/76979871"
    );
    assert_eq!(
        resolve_video_url("https://vimeo.com/channels/staffpicks/76979871"),
        "https://player.vimeo.com/video/76979871"
    );
    assert_eq!(
        resolve_video("https://vimeo.com/76979871").provider(),
        Some(VideoProvider::Vimeo)
    );
}

#[test]
fn resolution_is_idempotent() {
    for url in [
        "https://youtu.be/ABC123?t=1m30s",
        "https://www.youtube.com/watch?v=ABC123",
        "https://vimeo.com/76979871",
        "https://cdn.example.com/lesson.mp4",
        "not a url at all",
        "",
    ] {
        let once = resolve_video_url(url);
        assert_eq!(resolve_video_url(&once), once, "input: {url}");
    }
}

#[test]
fn direct_and_malformed_urls_pass_through() {
    assert_eq!(
        resolve_video("https://cdn.example.com/lesson.mp4"),
        ResolvedVideo::Direct {
            url: "https://cdn.example.com/lesson.mp4".to_string()
        }
    );
    assert_eq!(resolve_video_url("::::"), "::::");
    assert_eq!(
        resolve_video_url("https://www.youtube.com/watch?v="),
        "https://www.youtube.com/watch?v="
    );
}

#[test]
fn image_resolution_skips_missing_media() {
    assert_eq!(resolve_image("https://via.placeholder.com/400x300"), None);
    assert_eq!(resolve_image("   "), None);
    assert_eq!(
        resolve_image("https://cdn.example.com/a.png"),
        Some("https://cdn.example.com/a.png")
    );
}
