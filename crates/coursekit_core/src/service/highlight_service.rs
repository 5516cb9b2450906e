//! Highlight capture, persistence and rendering use cases.
//!
//! # Responsibility
//! - Resolve selections against a topic's plain text and stored highlights.
//! - Persist accepted selections as highlights with optional notes.
//! - Render a topic's content with its highlights applied.
//!
//! # Invariants
//! - Creation re-checks overlap against persisted highlights, so a stale
//!   capture cannot bypass the overlap rule.
//! - Blank notes are stored as `None`.

use crate::content::formatter::to_plain_text;
use crate::content::highlight::{render_with_highlights, HighlightedHtml};
use crate::content::selection::{self, SelectionCapture, SelectionOutcome};
use crate::model::highlight::{find_overlapping, Highlight, HighlightId};
use crate::model::now_epoch_ms;
use crate::model::topic::{Topic, TopicId};
use crate::repo::highlight_repo::HighlightRepository;
use crate::repo::RepoError;
use log::{debug, info};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type HighlightServiceResult<T> = Result<T, HighlightServiceError>;

/// Errors from highlight service operations.
#[derive(Debug)]
pub enum HighlightServiceError {
    /// Capture range is empty or reversed.
    InvalidRange { start: usize, end: usize },
    /// Range intersects a stored highlight.
    Overlap { existing: HighlightId },
    /// Target highlight does not exist for this user.
    HighlightNotFound(HighlightId),
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for HighlightServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRange { start, end } => {
                write!(f, "invalid highlight range [{start}, {end})")
            }
            Self::Overlap { existing } => {
                write!(f, "highlight overlaps existing highlight {existing}")
            }
            Self::HighlightNotFound(id) => write!(f, "highlight not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HighlightServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for HighlightServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::HighlightNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Highlight service facade scoped to one repository.
pub struct HighlightService<R: HighlightRepository> {
    repo: R,
}

impl<R: HighlightRepository> HighlightService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Resolves a selection on `topic` against the user's stored highlights.
    pub fn capture_selection(
        &self,
        user_id: &str,
        topic: &Topic,
        selected: &str,
    ) -> HighlightServiceResult<SelectionOutcome> {
        let existing = self.repo.list_for_topic(user_id, topic.id)?;
        let plain_text = to_plain_text(&topic.content);
        let outcome = selection::capture_selection(selected, &plain_text, &existing);
        match &outcome {
            SelectionOutcome::Overlap { .. } => {
                debug!("event=selection_capture module=highlight status=skip reason=overlap");
            }
            SelectionOutcome::NotFound => {
                debug!("event=selection_capture module=highlight status=skip reason=not_found");
            }
            _ => {}
        }
        Ok(outcome)
    }

    /// Persists an accepted capture as a new highlight.
    pub fn create_highlight(
        &self,
        user_id: &str,
        topic_id: TopicId,
        capture: &SelectionCapture,
        note: Option<String>,
    ) -> HighlightServiceResult<Highlight> {
        let range = capture.range();
        if range.is_empty() {
            return Err(HighlightServiceError::InvalidRange {
                start: capture.start,
                end: capture.end,
            });
        }

        let existing = self.repo.list_for_topic(user_id, topic_id)?;
        if let Some(conflict) = find_overlapping(&existing, &range) {
            return Err(HighlightServiceError::Overlap {
                existing: conflict.id,
            });
        }

        let highlight = Highlight {
            id: Uuid::new_v4(),
            topic_id,
            highlighted_text: capture.selected_text.clone(),
            position_start: range.start,
            position_end: range.end,
            note: normalize_note(note),
            created_at: now_epoch_ms(),
        };
        self.repo.create_highlight(user_id, &highlight)?;
        info!(
            "event=highlight_create module=highlight status=ok highlight_id={} topic_id={} has_note={}",
            highlight.id,
            topic_id,
            highlight.note.is_some()
        );
        Ok(highlight)
    }

    /// Replaces the note of one highlight. Blank notes clear it.
    pub fn update_note(
        &self,
        user_id: &str,
        highlight_id: HighlightId,
        note: Option<String>,
    ) -> HighlightServiceResult<()> {
        let note = normalize_note(note);
        self.repo
            .update_note(user_id, highlight_id, note.as_deref())
            .map_err(Into::into)
    }

    pub fn delete_highlight(
        &self,
        user_id: &str,
        highlight_id: HighlightId,
    ) -> HighlightServiceResult<()> {
        self.repo
            .delete_highlight(user_id, highlight_id)
            .map_err(Into::into)
    }

    pub fn list_highlights(
        &self,
        user_id: &str,
        topic_id: TopicId,
    ) -> HighlightServiceResult<Vec<Highlight>> {
        self.repo
            .list_for_topic(user_id, topic_id)
            .map_err(Into::into)
    }

    /// Formats `topic` and applies the user's highlights to it.
    pub fn render_topic(
        &self,
        user_id: &str,
        topic: &Topic,
    ) -> HighlightServiceResult<HighlightedHtml> {
        let highlights = self.repo.list_for_topic(user_id, topic.id)?;
        Ok(render_with_highlights(&topic.content, &highlights))
    }
}

fn normalize_note(note: Option<String>) -> Option<String> {
    note.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
