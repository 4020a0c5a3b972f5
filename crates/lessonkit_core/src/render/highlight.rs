//! Syntax highlighting metadata for code blocks.

use crate::model::block::DEFAULT_CODE_LANGUAGE;
use once_cell::sync::Lazy;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};

static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);

/// Normalizes an author-entered language label.
///
/// Lowercases, trims and maps common aliases; blank labels become
/// [`DEFAULT_CODE_LANGUAGE`].
pub fn normalize_language(label: &str) -> String {
    let lowered = label.trim().to_ascii_lowercase();
    let canonical = match lowered.as_str() {
        "" | "text" | "plain" | "txt" | "plaintext" | "plain text" => DEFAULT_CODE_LANGUAGE,
        "js" | "node" => "javascript",
        "ts" => "typescript",
        "py" | "python3" => "python",
        "rs" => "rust",
        "sh" | "shell" | "zsh" => "bash",
        "c++" | "cc" => "cpp",
        "c#" | "cs" => "csharp",
        "yml" => "yaml",
        "md" => "markdown",
        "htm" => "html",
        other => other,
    };
    canonical.to_string()
}

/// Whether `language` is the generic no-highlighting mode.
pub fn is_plain_language(language: &str) -> bool {
    normalize_language(language) == DEFAULT_CODE_LANGUAGE
}

fn find_syntax(language: &str) -> &'static SyntaxReference {
    let syntax_set: &'static SyntaxSet = &SYNTAX_SET;
    if is_plain_language(language) {
        return syntax_set.find_syntax_plain_text();
    }
    let normalized = normalize_language(language);
    // Default syntaxes register C# under its file extension only.
    let token = if normalized == "csharp" { "cs" } else { normalized.as_str() };
    syntax_set
        .find_syntax_by_token(token)
        .unwrap_or_else(|| syntax_set.find_syntax_plain_text())
}

/// Highlights `source` as class-annotated HTML.
///
/// Unknown languages fall back to plain text. The output is escaped and
/// safe to embed inside `<code>`.
pub fn highlight(source: &str, language: &str) -> Result<String, syntect::Error> {
    let syntax = find_syntax(language);
    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAX_SET, ClassStyle::Spaced);
    for line in source.lines() {
        generator.parse_html_for_line_which_includes_newline(&format!("{line}\n"))?;
    }
    Ok(generator.finalize())
}
