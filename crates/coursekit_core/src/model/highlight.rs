//! Highlight annotation model.
//!
//! # Responsibility
//! - Represent one user annotation over a literal text span of a topic.
//! - Provide the half-open range arithmetic used by overlap checks.
//!
//! # Invariants
//! - `position_start < position_end` for every persisted highlight.
//! - Ranges of highlights owned by one (user, topic) pair never overlap.
//! - Offsets are not re-validated when topic content changes.

use crate::model::topic::TopicId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable highlight identifier.
pub type HighlightId = Uuid;

/// Half-open character range `[start, end)` into plain topic text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HighlightRange {
    pub start: usize,
    pub end: usize,
}

impl HighlightRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Half-open overlap test. Adjacent ranges (`a.end == b.start`) do not
    /// overlap.
    pub fn overlaps(&self, other: &HighlightRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Persisted highlight record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlight {
    pub id: HighlightId,
    pub topic_id: TopicId,
    /// Literal substring captured at creation time.
    pub highlighted_text: String,
    pub position_start: usize,
    pub position_end: usize,
    pub note: Option<String>,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
}

impl Highlight {
    pub fn range(&self) -> HighlightRange {
        HighlightRange::new(self.position_start, self.position_end)
    }

    /// Returns the note when it carries visible text.
    pub fn visible_note(&self) -> Option<&str> {
        self.note
            .as_deref()
            .map(str::trim)
            .filter(|note| !note.is_empty())
    }
}

/// Returns the first highlight whose range overlaps `range`.
pub fn find_overlapping<'a>(
    highlights: &'a [Highlight],
    range: &HighlightRange,
) -> Option<&'a Highlight> {
    highlights
        .iter()
        .find(|existing| existing.range().overlaps(range))
}

#[cfg(test)]
mod tests {
    use super::HighlightRange;

    #[test]
    fn overlapping_ranges_are_detected() {
        let a = HighlightRange::new(5, 10);
        let b = HighlightRange::new(8, 12);
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
    }

    #[test]
    fn contained_range_overlaps() {
        assert!(HighlightRange::new(0, 20).overlaps(&HighlightRange::new(4, 6)));
    }

    #[test]
    fn adjacent_ranges_do_not_overlap() {
        let a = HighlightRange::new(0, 5);
        let b = HighlightRange::new(5, 9);
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
    }

    #[test]
    fn reversed_range_is_empty() {
        assert_eq!(HighlightRange::new(5, 10).len(), 5);
        assert!(HighlightRange::new(7, 7).is_empty());
        assert_eq!(HighlightRange::new(9, 3).len(), 0);
    }

    #[test]
    fn disjoint_ranges_do_not_overlap() {
        assert!(!HighlightRange::new(0, 3).overlaps(&HighlightRange::new(10, 12)));
    }
}
