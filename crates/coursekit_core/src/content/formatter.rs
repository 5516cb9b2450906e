//! Line-at-a-time formatter for topic content.
//!
//! # Responsibility
//! - Map each input line to exactly one HTML fragment, in input order.
//! - Derive the plain-text projection that highlight offsets refer to.
//!
//! # Invariants
//! - No nested-block awareness: a quote line never contains a list.
//! - Consecutive list items are not merged into an enclosing list tag.
//! - Text is emitted verbatim; no escaping happens here.

use once_cell::sync::Lazy;
use regex::Regex;

static BOLD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid bold regex"));
static ITALIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*(.+?)\*").expect("valid italic regex"));

/// Fragment emitted for blank input lines.
pub const LINE_BREAK: &str = "<br>";

/// Block shape recognized from a line prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// `## ` prefix.
    Heading,
    /// `### ` prefix.
    Subheading,
    /// `> ` prefix.
    Quote,
    /// `- ` prefix.
    ListItem,
    /// Blank or whitespace-only line.
    Break,
    /// Anything else.
    Paragraph,
}

impl BlockKind {
    fn tag(self) -> Option<&'static str> {
        match self {
            Self::Heading => Some("h2"),
            Self::Subheading => Some("h3"),
            Self::Quote => Some("blockquote"),
            Self::ListItem => Some("li"),
            Self::Paragraph => Some("p"),
            Self::Break => None,
        }
    }
}

/// Splits one line into its block kind and the text after the prefix.
pub fn classify_line(line: &str) -> (BlockKind, &str) {
    if line.trim().is_empty() {
        return (BlockKind::Break, "");
    }
    if let Some(rest) = line.strip_prefix("### ") {
        return (BlockKind::Subheading, rest);
    }
    if let Some(rest) = line.strip_prefix("## ") {
        return (BlockKind::Heading, rest);
    }
    if let Some(rest) = line.strip_prefix("> ") {
        return (BlockKind::Quote, rest);
    }
    if let Some(rest) = line.strip_prefix("- ") {
        return (BlockKind::ListItem, rest);
    }
    (BlockKind::Paragraph, line)
}

/// Replaces `**bold**` and `*italic*` markers with inline tags.
pub fn apply_inline_markers(text: &str) -> String {
    let bold = BOLD_RE.replace_all(text, "<strong>$1</strong>");
    ITALIC_RE.replace_all(&bold, "<em>$1</em>").into_owned()
}

/// Formats content into one fragment per input line.
pub fn format_fragments(content: &str) -> Vec<String> {
    content.lines().map(format_line).collect()
}

/// Formats content into an HTML string, fragments separated by `\n`.
pub fn format_content(content: &str) -> String {
    format_fragments(content).join("\n")
}

fn format_line(line: &str) -> String {
    let (kind, text) = classify_line(line);
    match kind.tag() {
        Some(tag) => format!("<{tag}>{}</{tag}>", apply_inline_markers(text)),
        None => LINE_BREAK.to_string(),
    }
}

/// Derives the plain text used for highlight offsets.
///
/// Prefixes and inline markers are removed, blank lines dropped and the
/// remaining lines joined by a single space.
pub fn to_plain_text(content: &str) -> String {
    content
        .lines()
        .filter_map(|line| {
            let (kind, text) = classify_line(line);
            if kind == BlockKind::Break {
                return None;
            }
            let without_bold = BOLD_RE.replace_all(text, "$1");
            Some(ITALIC_RE.replace_all(&without_bold, "$1").into_owned())
        })
        .collect::<Vec<_>>()
        .join(" ")
}
