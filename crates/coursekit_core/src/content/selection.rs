//! Resolution of a user text selection to a plain-text range.
//!
//! # Responsibility
//! - Turn the selected string into a `[start, end)` character range.
//! - Reject selections that overlap an existing highlight.
//!
//! # Invariants
//! - The start offset is the first occurrence of the selected text, which
//!   can resolve short repeated selections to an earlier position.
//! - Rejected or unresolved selections never start the creation flow.

use crate::model::highlight::{find_overlapping, Highlight, HighlightId, HighlightRange};
use serde::{Deserialize, Serialize};

/// Accepted selection handed to the caller for note prompt and persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionCapture {
    pub selected_text: String,
    pub start: usize,
    pub end: usize,
}

impl SelectionCapture {
    pub fn range(&self) -> HighlightRange {
        HighlightRange::new(self.start, self.end)
    }
}

/// Outcome of one selection-changed signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    /// Empty or whitespace-only selection; nothing to do.
    Ignored,
    /// Selected text does not occur in the plain content.
    NotFound,
    /// Resolved range intersects an existing highlight.
    Overlap { existing: HighlightId },
    Accepted(SelectionCapture),
}

impl SelectionOutcome {
    /// Whether the caller should clear the browser selection.
    pub fn should_clear_selection(&self) -> bool {
        matches!(self, Self::NotFound | Self::Overlap { .. })
    }

    pub fn accepted(&self) -> Option<&SelectionCapture> {
        match self {
            Self::Accepted(capture) => Some(capture),
            _ => None,
        }
    }
}

/// Resolves `selected` against `plain_text` and the existing highlights.
pub fn capture_selection(
    selected: &str,
    plain_text: &str,
    existing: &[Highlight],
) -> SelectionOutcome {
    let selected = selected.trim();
    if selected.is_empty() {
        return SelectionOutcome::Ignored;
    }

    let Some(start) = char_offset_of(plain_text, selected) else {
        return SelectionOutcome::NotFound;
    };
    let end = start + selected.chars().count();
    let range = HighlightRange::new(start, end);

    if let Some(conflict) = find_overlapping(existing, &range) {
        return SelectionOutcome::Overlap {
            existing: conflict.id,
        };
    }

    SelectionOutcome::Accepted(SelectionCapture {
        selected_text: selected.to_string(),
        start,
        end,
    })
}

/// Character offset of the first occurrence of `needle` in `haystack`.
pub fn char_offset_of(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .find(needle)
        .map(|byte_index| haystack[..byte_index].chars().count())
}
