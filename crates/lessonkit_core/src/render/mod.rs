//! Content sanitization and rendering.
//!
//! # Responsibility
//! - Map each block, by type, to safe typed output.
//! - Order output by block position, independent of storage order.
//! - Isolate a failure in one block to that block's slot.
//!
//! # Invariants
//! - Text content always passes through the configured `HtmlSanitizer`.
//! - Empty or placeholder media renders as nothing, never as broken media.
//! - Unsupported blocks render a visible placeholder and are never dropped.
//! - Rendering reads its input and never mutates it.

mod highlight;
mod output;
mod sanitize;

pub use highlight::{highlight, is_plain_language, normalize_language};
pub use output::{BlockOutput, HeadingStyle, RenderedSlot};
pub use sanitize::{AllowlistSanitizer, HtmlSanitizer};

use crate::media::{resolve_image, resolve_video};
use crate::model::block::{BlockAttributes, ContentBlock};
use crate::model::lesson::Lesson;
use log::{error, warn};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Host layout the output is produced for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderContext {
    /// Learner-facing lesson view: bare block markup.
    #[default]
    Published,
    /// Authoring preview: each block wrapped in a slot carrying its id.
    Editor,
}

/// Renderer behavior switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub context: RenderContext,
    /// Emit class-annotated highlighting for code blocks.
    pub highlight_code: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            context: RenderContext::Published,
            highlight_code: true,
        }
    }
}

/// Block renderer parameterized by sanitizer and presentation context.
pub struct Renderer<S = AllowlistSanitizer> {
    sanitizer: S,
    options: RenderOptions,
}

impl Default for Renderer<AllowlistSanitizer> {
    fn default() -> Self {
        Self::new(AllowlistSanitizer::default(), RenderOptions::default())
    }
}

impl<S: HtmlSanitizer> Renderer<S> {
    pub fn new(sanitizer: S, options: RenderOptions) -> Self {
        Self { sanitizer, options }
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    /// Renders one block.
    pub fn render_block(&self, block: &ContentBlock) -> BlockOutput {
        match block.attributes() {
            BlockAttributes::Text(_) => BlockOutput::Text {
                html: self.sanitizer.sanitize(block.content()),
            },
            BlockAttributes::Heading(attrs) => BlockOutput::Heading {
                style: HeadingStyle::from_level(attrs.level),
                text: block.content().trim().to_string(),
            },
            BlockAttributes::Image(attrs) => match resolve_image(block.content()) {
                Some(src) => BlockOutput::Image {
                    src: src.to_string(),
                    alt: non_blank(attrs.alt.as_deref()),
                    caption: non_blank(attrs.caption.as_deref()),
                },
                None => BlockOutput::Empty,
            },
            BlockAttributes::Video(attrs) => match block.media_url() {
                Some(url) => BlockOutput::Video {
                    source: resolve_video(url),
                    caption: non_blank(attrs.caption.as_deref()),
                },
                None => BlockOutput::Empty,
            },
            BlockAttributes::Code(attrs) => {
                let language = normalize_language(&attrs.language);
                let highlighted = if self.options.highlight_code {
                    match highlight(block.content(), &language) {
                        Ok(html) => Some(html),
                        Err(err) => {
                            warn!(
                                "event=code_highlight module=render status=error language={} error={}",
                                language, err
                            );
                            None
                        }
                    }
                } else {
                    None
                };
                BlockOutput::Code {
                    language,
                    source: block.content().to_string(),
                    highlighted,
                }
            }
            BlockAttributes::Unsupported { type_name, .. } => BlockOutput::Unsupported {
                type_name: type_name.clone(),
            },
        }
    }

    /// Renders `blocks` in ascending position order.
    ///
    /// Array order only breaks ties between equal positions. A panic while
    /// rendering one block yields [`BlockOutput::Failed`] for that slot.
    pub fn render_blocks(&self, blocks: &[ContentBlock]) -> Vec<RenderedSlot> {
        let mut ordered = blocks.iter().collect::<Vec<_>>();
        ordered.sort_by_key(|block| block.position());

        ordered
            .into_iter()
            .map(|block| {
                let output = catch_unwind(AssertUnwindSafe(|| self.render_block(block)))
                    .unwrap_or_else(|_| {
                        error!(
                            "event=block_render module=render status=error block_type={} position={}",
                            block.type_name(),
                            block.position()
                        );
                        BlockOutput::Failed
                    });
                RenderedSlot {
                    block_id: block.id().clone(),
                    type_name: block.type_name().to_string(),
                    position: block.position(),
                    output,
                }
            })
            .collect()
    }

    /// Renders `blocks` to one HTML string for the configured context.
    ///
    /// An empty block list renders as an empty string.
    pub fn render_html(&self, blocks: &[ContentBlock]) -> String {
        self.render_blocks(blocks)
            .iter()
            .map(|slot| slot.to_html(self.options.context))
            .collect()
    }

    /// Renders a lesson's blocks to HTML.
    pub fn render_lesson(&self, lesson: &Lesson) -> String {
        self.render_html(&lesson.content_blocks)
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
