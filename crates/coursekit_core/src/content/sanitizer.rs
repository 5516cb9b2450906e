//! HTML fragment sanitizer and tag-balance validator.
//!
//! # Responsibility
//! - Strip control characters and unsafe attributes from HTML fragments.
//! - Collapse runs of line breaks and close tags left open.
//! - Report balance problems without mutating input.
//!
//! # Invariants
//! - `sanitize` never fails and is idempotent.
//! - Tag names compare case-insensitively.
//! - Void elements and self-closing tags are exempt from balance tracking.
//! - Attribute quoting is handled best-effort only.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fmt::{Display, Formatter};

static TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9-]*)([^>]*)>").expect("valid tag regex")
});
static STYLE_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\s+style\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#).expect("valid style regex")
});
static EVENT_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\s+on[a-z]+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#).expect("valid event regex")
});
static SCRIPT_URL_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\s+[a-z][a-z0-9-]*\s*=\s*(?:"\s*javascript:[^"]*"|'\s*javascript:[^']*'|javascript:[^\s>]*)"#,
    )
    .expect("valid script url regex")
});
static BREAK_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:<br\s*/?>\s*){2,}").expect("valid break run regex"));

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Kind of balance problem found by [`validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceErrorKind {
    /// Closing tag with no open tag of the same name.
    UnmatchedClosingTag,
    /// Tag still open at end of input.
    UnclosedTag,
}

/// One balance problem, tag name lowercased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceError {
    pub kind: BalanceErrorKind,
    pub tag: String,
}

impl Display for BalanceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            BalanceErrorKind::UnmatchedClosingTag => {
                write!(f, "closing tag without matching open: </{}>", self.tag)
            }
            BalanceErrorKind::UnclosedTag => write!(f, "unclosed tag: <{}>", self.tag),
        }
    }
}

/// Structured result of [`validate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<BalanceError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Human-readable messages in scan order.
    pub fn messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// Cleans an HTML fragment for display or save.
pub fn sanitize(html: &str) -> String {
    let without_controls = escape_dangling_tag_start(&strip_control_chars(html));
    let without_attrs = TAG_RE.replace_all(&without_controls, |caps: &Captures<'_>| {
        let attrs = strip_unsafe_attributes(&caps[3]);
        format!("<{}{}{}>", &caps[1], &caps[2], attrs)
    });
    let mut output = BREAK_RUN_RE
        .replace_all(&without_attrs, "<br>")
        .into_owned();

    let scan = scan_balance(&output);
    for tag in scan.open.iter().rev() {
        output.push_str("</");
        output.push_str(tag);
        output.push('>');
    }
    output
}

/// Reports unmatched closing tags and unclosed tags without mutation.
pub fn validate(html: &str) -> ValidationReport {
    let scan = scan_balance(html);
    let mut errors = scan
        .unmatched_closing
        .into_iter()
        .map(|tag| BalanceError {
            kind: BalanceErrorKind::UnmatchedClosingTag,
            tag,
        })
        .collect::<Vec<_>>();
    errors.extend(scan.open.into_iter().map(|tag| BalanceError {
        kind: BalanceErrorKind::UnclosedTag,
        tag,
    }));
    ValidationReport { errors }
}

struct BalanceScan {
    /// Tags still open at end of input, outermost first.
    open: Vec<String>,
    unmatched_closing: Vec<String>,
}

fn scan_balance(html: &str) -> BalanceScan {
    let mut open: Vec<String> = Vec::new();
    let mut unmatched_closing = Vec::new();

    for caps in TAG_RE.captures_iter(html) {
        let name = caps[2].to_ascii_lowercase();
        let is_closing = !caps[1].is_empty();
        let self_closing = caps[3].trim_end().ends_with('/');
        if VOID_ELEMENTS.contains(&name.as_str()) || (self_closing && !is_closing) {
            continue;
        }

        if !is_closing {
            open.push(name);
            continue;
        }
        match open.iter().rposition(|candidate| *candidate == name) {
            Some(index) => {
                open.remove(index);
            }
            None => unmatched_closing.push(name),
        }
    }

    BalanceScan {
        open,
        unmatched_closing,
    }
}

fn strip_unsafe_attributes(attrs: &str) -> String {
    let mut current = attrs.to_string();
    // Removing one attribute can splice its neighbours into a new match.
    loop {
        let without_style = STYLE_ATTR_RE.replace_all(&current, "");
        let without_events = EVENT_ATTR_RE.replace_all(&without_style, "");
        let mut next = SCRIPT_URL_ATTR_RE
            .replace_all(&without_events, "")
            .into_owned();
        // Keep leftover text from gluing onto the tag name.
        if next.starts_with(|ch: char| ch.is_ascii_alphanumeric() || ch == '-') {
            next.insert(0, ' ');
        }
        if next == current {
            return next;
        }
        current = next;
    }
}

/// Escapes every `<` after the last `>`.
///
/// An unterminated tag at the end of input would otherwise swallow the
/// closing tags appended by [`sanitize`].
fn escape_dangling_tag_start(text: &str) -> String {
    let tail_start = text.rfind('>').map_or(0, |index| index + 1);
    let (head, tail) = text.split_at(tail_start);
    if !tail.contains('<') {
        return text.to_string();
    }
    format!("{head}{}", tail.replace('<', "&lt;"))
}

fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|ch| matches!(ch, '\t' | '\n' | '\r') || !ch.is_control())
        .collect()
}
