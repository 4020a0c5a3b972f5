//! Typed render output and its HTML form.

use crate::media::ResolvedVideo;
use crate::model::block::BlockId;
use crate::render::RenderContext;
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;

const VIDEO_EMBED_ALLOW: &str =
    "accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture";

/// Visual heading style; only three levels are styled distinctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingStyle {
    Title,
    Section,
    Subsection,
}

impl HeadingStyle {
    /// Maps a stored level to a style; anything but 1 and 3 is `Section`.
    pub fn from_level(level: u8) -> Self {
        match level {
            1 => Self::Title,
            3 => Self::Subsection,
            _ => Self::Section,
        }
    }

    /// HTML heading level emitted for this style.
    pub fn level(self) -> u8 {
        match self {
            Self::Title => 1,
            Self::Section => 2,
            Self::Subsection => 3,
        }
    }
}

/// Rendered form of one block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockOutput {
    /// Block exists but has nothing to show yet (media not uploaded).
    Empty,
    /// Sanitized HTML fragment.
    Text { html: String },
    Heading { style: HeadingStyle, text: String },
    Image {
        src: String,
        alt: Option<String>,
        caption: Option<String>,
    },
    Video {
        source: ResolvedVideo,
        caption: Option<String>,
    },
    Code {
        /// Normalized language label.
        language: String,
        source: String,
        /// Escaped, class-annotated markup when highlighting ran.
        highlighted: Option<String>,
    },
    Unsupported { type_name: String },
    /// Rendering this block failed; the rest of the lesson is unaffected.
    Failed,
}

impl BlockOutput {
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// HTML for this block alone; `Empty` yields an empty string.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        match self {
            Self::Empty => {}
            Self::Text { html } => {
                let _ = write!(out, "<div class=\"lesson-text\">{html}</div>");
            }
            Self::Heading { style, text } => {
                let level = style.level();
                let _ = write!(
                    out,
                    "<h{level} class=\"lesson-heading lesson-heading-{level}\">{}</h{level}>",
                    encode_text(text)
                );
            }
            Self::Image { src, alt, caption } => {
                let _ = write!(
                    out,
                    "<figure class=\"lesson-image\"><img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
                    encode_double_quoted_attribute(src),
                    encode_double_quoted_attribute(alt.as_deref().unwrap_or_default())
                );
                write_caption(&mut out, caption.as_deref());
                out.push_str("</figure>");
            }
            Self::Video { source, caption } => {
                out.push_str("<figure class=\"lesson-video\">");
                match source {
                    ResolvedVideo::Embed { provider, url } => {
                        let _ = write!(
                            out,
                            "<iframe src=\"{}\" title=\"{}\" data-provider=\"{}\" allow=\"{}\" allowfullscreen loading=\"lazy\"></iframe>",
                            encode_double_quoted_attribute(url),
                            encode_double_quoted_attribute(
                                caption.as_deref().unwrap_or("Embedded video")
                            ),
                            provider,
                            VIDEO_EMBED_ALLOW
                        );
                    }
                    ResolvedVideo::Direct { url } => {
                        let _ = write!(
                            out,
                            "<video src=\"{}\" controls preload=\"metadata\"></video>",
                            encode_double_quoted_attribute(url)
                        );
                    }
                }
                write_caption(&mut out, caption.as_deref());
                out.push_str("</figure>");
            }
            Self::Code {
                language,
                source,
                highlighted,
            } => {
                let language_attr = encode_double_quoted_attribute(language);
                let body = match highlighted {
                    Some(html) => html.clone(),
                    None => encode_text(source).into_owned(),
                };
                let _ = write!(
                    out,
                    "<pre class=\"lesson-code\" data-language=\"{language_attr}\"><code class=\"language-{language_attr}\">{body}</code></pre>"
                );
            }
            Self::Unsupported { type_name } => {
                let label = if type_name.trim().is_empty() {
                    "unknown"
                } else {
                    type_name.as_str()
                };
                let _ = write!(
                    out,
                    "<div class=\"lesson-unsupported\" role=\"note\">Unsupported block type: <code>{}</code></div>",
                    encode_text(label)
                );
            }
            Self::Failed => {
                out.push_str(
                    "<div class=\"lesson-block-error\" role=\"alert\">This block could not be displayed.</div>",
                );
            }
        }
        out
    }
}

/// One rendered block with the identity of its source block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSlot {
    pub block_id: BlockId,
    pub type_name: String,
    pub position: usize,
    pub output: BlockOutput,
}

impl RenderedSlot {
    /// HTML for this slot in `context`.
    ///
    /// Editor slots always emit their wrapper, even around empty output, so
    /// authors can still select and delete the block.
    pub fn to_html(&self, context: RenderContext) -> String {
        let inner = self.output.to_html();
        match context {
            RenderContext::Published => inner,
            RenderContext::Editor => format!(
                "<div class=\"lesson-block\" data-block-id=\"{}\" data-block-type=\"{}\" data-position=\"{}\">{inner}</div>",
                encode_double_quoted_attribute(self.block_id.as_str()),
                encode_double_quoted_attribute(&self.type_name),
                self.position
            ),
        }
    }
}

fn write_caption(out: &mut String, caption: Option<&str>) {
    if let Some(caption) = caption {
        let _ = write!(out, "<figcaption>{}</figcaption>", encode_text(caption));
    }
}
