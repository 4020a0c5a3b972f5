//! HTML sanitization for text-block content.
//!
//! # Invariants
//! - Output never contains script-executing markup: `script`/`style`/embed
//!   elements are dropped with their content, event-handler attributes are
//!   never emitted, and link URLs with unsafe schemes are removed.
//! - Unknown elements are unwrapped (children kept), never rejected.
//! - `sanitize(sanitize(x)) == sanitize(x)`.

use html_escape::{encode_double_quoted_attribute, encode_text};
use scraper::{ElementRef, Html, Node};
use std::collections::HashSet;

/// Sanitizer collaborator used for every text block.
///
/// Implementations must be idempotent and must not fail; unknown markup is
/// stripped rather than reported.
pub trait HtmlSanitizer {
    fn sanitize(&self, html: &str) -> String;
}

impl<F> HtmlSanitizer for F
where
    F: Fn(&str) -> String,
{
    fn sanitize(&self, html: &str) -> String {
        self(html)
    }
}

const DEFAULT_ALLOWED_TAGS: &[&str] = &[
    "a",
    "b",
    "blockquote",
    "br",
    "caption",
    "code",
    "del",
    "div",
    "em",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "hr",
    "i",
    "li",
    "mark",
    "ol",
    "p",
    "pre",
    "s",
    "span",
    "strong",
    "sub",
    "sup",
    "table",
    "tbody",
    "td",
    "tfoot",
    "th",
    "thead",
    "tr",
    "u",
    "ul",
];

/// Elements removed together with everything inside them.
const DROPPED_WITH_CONTENT: &[&str] = &[
    "embed", "frame", "frameset", "iframe", "math", "noscript", "object", "script", "select",
    "style", "svg", "template", "textarea", "title",
];

const VOID_TAGS: &[&str] = &["br", "col", "hr"];

/// Elements the parser only accepts inside a table. A disallowed one is
/// dropped with its content; unwrapping it would leave children that a
/// second parse moves elsewhere.
const TABLE_PARTS: &[&str] = &[
    "caption", "col", "colgroup", "tbody", "td", "tfoot", "th", "thead", "tr",
];

const GLOBAL_ATTRIBUTES: &[&str] = &["class"];

const TAG_ATTRIBUTES: &[(&str, &[&str])] = &[
    ("a", &["href", "title", "target"]),
    ("ol", &["start"]),
    ("td", &["colspan", "rowspan"]),
    ("th", &["colspan", "rowspan"]),
];

const SAFE_URL_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

const LINK_REL_FOR_BLANK_TARGET: &str = "noopener noreferrer";

/// Nesting depth past which subtrees are flattened to escaped text.
const MAX_DEPTH: usize = 128;

/// Allowlist-based sanitizer backed by an HTML5 parser.
#[derive(Debug, Clone)]
pub struct AllowlistSanitizer {
    allowed_tags: HashSet<String>,
}

impl Default for AllowlistSanitizer {
    fn default() -> Self {
        Self {
            allowed_tags: DEFAULT_ALLOWED_TAGS
                .iter()
                .map(|tag| tag.to_string())
                .collect(),
        }
    }
}

impl AllowlistSanitizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Additionally allows `tag` (attribute rules stay as configured).
    ///
    /// Tags that always carry executable content cannot be allowed.
    pub fn allow_tag(mut self, tag: &str) -> Self {
        let tag = tag.trim().to_ascii_lowercase();
        if !tag.is_empty() && !DROPPED_WITH_CONTENT.contains(&tag.as_str()) {
            self.allowed_tags.insert(tag);
        }
        self
    }

    /// Removes `tag` from the allowlist; its children are still kept.
    pub fn deny_tag(mut self, tag: &str) -> Self {
        self.allowed_tags.remove(&tag.trim().to_ascii_lowercase());
        self
    }

    fn write_children(
        &self,
        parent: ElementRef<'_>,
        out: &mut String,
        depth: usize,
        flatten_table: bool,
    ) {
        for child in parent.children() {
            match child.value() {
                Node::Text(text) => out.push_str(&encode_text(&**text)),
                Node::Element(_) => {
                    if let Some(element) = ElementRef::wrap(child) {
                        self.write_element(element, out, depth + 1, flatten_table);
                    }
                }
                _ => {}
            }
        }
    }

    /// `flatten_table` is set below an unwrapped `table`; its parts are
    /// unwrapped too since no table remains to hold them.
    fn write_element(
        &self,
        element: ElementRef<'_>,
        out: &mut String,
        depth: usize,
        flatten_table: bool,
    ) {
        let name = element.value().name();
        if DROPPED_WITH_CONTENT.contains(&name) {
            return;
        }
        if depth > MAX_DEPTH {
            for text in element.text() {
                out.push_str(&encode_text(text));
            }
            return;
        }
        let is_table_part = TABLE_PARTS.contains(&name);
        if flatten_table && is_table_part {
            self.write_children(element, out, depth, true);
            return;
        }
        if !self.allowed_tags.contains(name) {
            if is_table_part {
                return;
            }
            self.write_children(element, out, depth, flatten_table || name == "table");
            return;
        }

        out.push('<');
        out.push_str(name);
        for (attr, value) in allowed_attributes(element) {
            out.push(' ');
            out.push_str(&attr);
            out.push_str("=\"");
            out.push_str(&encode_double_quoted_attribute(&value));
            out.push('"');
        }
        out.push('>');

        if VOID_TAGS.contains(&name) {
            return;
        }
        if name == "pre" && starts_with_newline(element) {
            // The parser eats one newline right after `<pre>`.
            out.push('\n');
        }
        self.write_children(element, out, depth, false);
        out.push_str("</");
        out.push_str(name);
        out.push('>');
    }
}

impl HtmlSanitizer for AllowlistSanitizer {
    fn sanitize(&self, html: &str) -> String {
        if html.trim().is_empty() {
            return String::new();
        }
        let fragment = Html::parse_fragment(html);
        let mut out = String::with_capacity(html.len());
        self.write_children(fragment.root_element(), &mut out, 0, false);
        out
    }
}

fn starts_with_newline(element: ElementRef<'_>) -> bool {
    element
        .first_child()
        .and_then(|child| child.value().as_text().map(|text| text.starts_with('\n')))
        .unwrap_or(false)
}

/// Returns sorted `(name, value)` pairs allowed on `element`.
fn allowed_attributes(element: ElementRef<'_>) -> Vec<(String, String)> {
    let name = element.value().name();
    let per_tag = TAG_ATTRIBUTES
        .iter()
        .find(|(tag, _)| *tag == name)
        .map(|(_, attributes)| *attributes)
        .unwrap_or(&[]);

    let mut attributes = element
        .value()
        .attrs()
        .filter(|(attr, _)| GLOBAL_ATTRIBUTES.contains(attr) || per_tag.contains(attr))
        .filter(|(attr, value)| *attr != "href" || is_safe_url(value))
        .filter(|(attr, value)| *attr != "start" || value.trim().parse::<i64>().is_ok())
        .map(|(attr, value)| (attr.to_string(), value.to_string()))
        .collect::<Vec<_>>();

    if name == "a" {
        let opens_new_tab = attributes
            .iter()
            .any(|(attr, value)| attr == "target" && value.trim() == "_blank");
        if opens_new_tab {
            attributes.push(("rel".to_string(), LINK_REL_FOR_BLANK_TARGET.to_string()));
        }
    }

    attributes.sort();
    attributes
}

/// Accepts relative URLs, fragments and allowlisted schemes.
fn is_safe_url(value: &str) -> bool {
    let compact = value
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();
    let scheme_end = compact.find(':');
    let path_start = compact.find(['/', '?', '#']);
    match (scheme_end, path_start) {
        (Some(colon), Some(path)) if path < colon => true,
        (Some(colon), _) => SAFE_URL_SCHEMES.contains(&&compact[..colon]),
        (None, _) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::{is_safe_url, AllowlistSanitizer, HtmlSanitizer};

    fn sanitize(html: &str) -> String {
        AllowlistSanitizer::default().sanitize(html)
    }

    #[test]
    fn script_elements_are_removed_with_content() {
        let output = sanitize("<p>hi</p><script>alert('x')</script>");
        assert_eq!(output, "<p>hi</p>");
    }

    #[test]
    fn event_handlers_and_unknown_attributes_are_stripped() {
        let output = sanitize(r#"<p onclick="steal()" style="color:red">x</p>"#);
        assert_eq!(output, "<p>x</p>");
    }

    #[test]
    fn unknown_tags_are_unwrapped_not_dropped() {
        let output = sanitize("<custom-widget><b>bold</b></custom-widget>");
        assert_eq!(output, "<b>bold</b>");
    }

    #[test]
    fn javascript_links_lose_their_href() {
        let output = sanitize(r#"<a href=" JaVaScRiPt:alert(1)">x</a>"#);
        assert_eq!(output, "<a>x</a>");
    }

    #[test]
    fn blank_target_links_get_noopener() {
        let output = sanitize(r#"<a href="https://example.com" target="_blank">x</a>"#);
        assert_eq!(
            output,
            r#"<a href="https://example.com" rel="noopener noreferrer" target="_blank">x</a>"#
        );
    }

    #[test]
    fn escaped_text_stays_escaped() {
        let output = sanitize("<p>&lt;script&gt;</p>");
        assert_eq!(output, "<p>&lt;script&gt;</p>");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let inputs = [
            "<p>a &amp; b</p><img src=x onerror=alert(1)>",
            r#"<a target="_blank" href="/x" rel="evil">y</a>"#,
            "<ul><li>one<li>two</ul><style>p{}</style>",
            "<pre>\n\nx</pre>",
            "<pre>\nlet x = 1;\n</pre>",
            "<table><caption>c</caption><colgroup><col></colgroup><tr><td>x</td></tr></table>",
            "<table><tr><td>x</td><td>y</td></tr></table>",
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once, "input: {input}");
        }
    }

    #[test]
    fn leading_pre_newlines_survive_repeated_passes() {
        let once = sanitize("<pre>\n\nx</pre>");
        assert_eq!(once, "<pre>\n\nx</pre>");
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn table_parts_stay_inside_the_table() {
        let once = sanitize("<table><caption>c</caption><tr><td>x</td></tr></table>");
        assert!(once.starts_with("<table><caption>c</caption>"));
        assert_eq!(sanitize(&once), once);
    }

    #[test]
    fn denied_table_is_flattened_and_stable() {
        let sanitizer = AllowlistSanitizer::new().deny_tag("table");
        let once = sanitizer.sanitize("<table><tr><td><b>x</b></td></tr></table>");
        assert_eq!(once, "<b>x</b>");
        assert_eq!(sanitizer.sanitize(&once), once);
    }

    #[test]
    fn denied_table_cells_are_dropped_with_content() {
        let sanitizer = AllowlistSanitizer::new().deny_tag("td");
        let once = sanitizer.sanitize("<table><tr><td>x</td></tr></table>");
        assert!(!once.contains('x'));
        assert_eq!(sanitizer.sanitize(&once), once);
    }

    #[test]
    fn denied_tags_are_unwrapped() {
        let sanitizer = AllowlistSanitizer::new().deny_tag("span");
        assert_eq!(sanitizer.sanitize("<span>x</span>"), "x");
    }

    #[test]
    fn executable_tags_cannot_be_allowed() {
        let sanitizer = AllowlistSanitizer::new().allow_tag("script");
        assert_eq!(sanitizer.sanitize("<script>x</script>"), "");
    }

    #[test]
    fn url_scheme_check_accepts_relative_and_safe_schemes() {
        assert!(is_safe_url("/lessons/1"));
        assert!(is_safe_url("#anchor"));
        assert!(is_safe_url("mailto:coach@example.com"));
        assert!(is_safe_url("./a:b"));
        assert!(!is_safe_url("data:text/html;base64,AAAA"));
        assert!(!is_safe_url("vbscript:msgbox"));
    }
}
