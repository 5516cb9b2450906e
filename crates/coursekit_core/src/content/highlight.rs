//! Highlight placement over formatted HTML.
//!
//! # Responsibility
//! - Wrap the literal text of each stored highlight in a marker span.
//! - Report which highlights could not be placed.
//!
//! # Invariants
//! - Matching is by literal text, first occurrence only.
//! - Only text outside tag markup and outside existing highlight spans is
//!   searched, so tags are never split and no text is wrapped twice.
//! - A highlight whose text is missing or split by markup is skipped.

use crate::content::formatter::{format_content, to_plain_text};
use crate::model::highlight::{Highlight, HighlightId, HighlightRange};
use log::debug;

/// Class carried by every highlight wrapper.
pub const HIGHLIGHT_CLASS: &str = "content-highlight";
/// Extra class carried by wrappers whose highlight has a note.
pub const HIGHLIGHT_NOTE_CLASS: &str = "has-note";
const HIGHLIGHT_ID_ATTR: &str = "data-highlight-id";

/// Result of placing highlights onto one HTML document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HighlightedHtml {
    pub html: String,
    /// Highlights wrapped, in processing order.
    pub applied: Vec<HighlightId>,
    /// Highlights whose text could not be located.
    pub skipped: Vec<HighlightId>,
}

/// Applies `highlights` to `html`.
///
/// `plain_text` is the text the highlight offsets were captured against.
/// Highlights are processed by `position_start` descending.
pub fn apply_highlights(html: &str, plain_text: &str, highlights: &[Highlight]) -> HighlightedHtml {
    let mut ordered: Vec<&Highlight> = highlights.iter().collect();
    ordered.sort_by(|left, right| right.position_start.cmp(&left.position_start));

    let mut result = HighlightedHtml {
        html: html.to_string(),
        ..HighlightedHtml::default()
    };

    for highlight in ordered {
        let placed = slice_chars(plain_text, highlight.range())
            .filter(|needle| !needle.trim().is_empty())
            .and_then(|needle| {
                find_unwrapped_text(&result.html, needle).map(|index| (index, needle))
            });

        match placed {
            Some((index, needle)) => {
                let wrapped = wrap_highlight(highlight, needle);
                result
                    .html
                    .replace_range(index..index + needle.len(), &wrapped);
                result.applied.push(highlight.id);
            }
            None => result.skipped.push(highlight.id),
        }
    }

    if !result.skipped.is_empty() {
        debug!(
            "event=highlight_apply module=content status=skip applied={} skipped={}",
            result.applied.len(),
            result.skipped.len()
        );
    }
    result
}

/// Formats raw topic content and applies highlights against its plain text.
pub fn render_with_highlights(content: &str, highlights: &[Highlight]) -> HighlightedHtml {
    let html = format_content(content);
    let plain_text = to_plain_text(content);
    apply_highlights(&html, &plain_text, highlights)
}

/// Returns the substring covered by a character range, if in bounds.
pub fn slice_chars(text: &str, range: HighlightRange) -> Option<&str> {
    if range.is_empty() {
        return None;
    }
    let start = char_to_byte_index(text, range.start)?;
    let end = char_to_byte_index(text, range.end)?;
    text.get(start..end)
}

fn char_to_byte_index(text: &str, char_index: usize) -> Option<usize> {
    if char_index == text.chars().count() {
        return Some(text.len());
    }
    text.char_indices().nth(char_index).map(|(index, _)| index)
}

/// Byte index of the first occurrence of `needle` inside a text run that is
/// not already wrapped by a highlight.
fn find_unwrapped_text(html: &str, needle: &str) -> Option<usize> {
    let mut cursor = 0;
    // One entry per open span; `true` marks a highlight wrapper.
    let mut open_spans: Vec<bool> = Vec::new();

    while cursor < html.len() {
        let rest = &html[cursor..];
        if starts_tag(rest) {
            let tag_end = rest.find('>').map_or(html.len(), |offset| cursor + offset + 1);
            let tag = html[cursor..tag_end].to_ascii_lowercase();
            if tag.starts_with("<span") {
                open_spans.push(tag.contains(HIGHLIGHT_ID_ATTR));
            } else if tag.starts_with("</span") {
                open_spans.pop();
            }
            cursor = tag_end;
            continue;
        }

        let run_end = next_tag_start(html, cursor);
        if !open_spans.iter().any(|is_highlight| *is_highlight) {
            if let Some(offset) = html[cursor..run_end].find(needle) {
                return Some(cursor + offset);
            }
        }
        cursor = run_end;
    }
    None
}

/// A literal `<` in text (`a < b`) is not markup; tags start with
/// `<name`, `</` or `<!`.
fn starts_tag(text: &str) -> bool {
    let mut chars = text.chars();
    chars.next() == Some('<')
        && chars
            .next()
            .is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '/' || ch == '!')
}

fn next_tag_start(html: &str, from: usize) -> usize {
    html[from..]
        .match_indices('<')
        .map(|(offset, _)| from + offset)
        .find(|index| starts_tag(&html[*index..]))
        .unwrap_or(html.len())
}

fn wrap_highlight(highlight: &Highlight, text: &str) -> String {
    let note = highlight.visible_note();
    let class = if note.is_some() {
        format!("{HIGHLIGHT_CLASS} {HIGHLIGHT_NOTE_CLASS}")
    } else {
        HIGHLIGHT_CLASS.to_string()
    };
    let escaped_note = note.map(escape_attribute).unwrap_or_default();
    let title = note
        .map(|_| format!(" title=\"{escaped_note}\""))
        .unwrap_or_default();

    format!(
        "<span class=\"{class}\" {HIGHLIGHT_ID_ATTR}=\"{}\" data-note=\"{escaped_note}\"{title}>{text}</span>",
        highlight.id
    )
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}
