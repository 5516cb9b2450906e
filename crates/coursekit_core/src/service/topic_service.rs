//! Topic tree use-case service.
//!
//! # Responsibility
//! - Validate hierarchy invariants above the repository layer.
//! - Rebuild the per-user topic tree with completion flags.
//! - Provide create, edit, reparent, reorder and completion operations.
//!
//! # Invariants
//! - Parent topic must exist when provided.
//! - Move operations must not create parent-child cycles.
//! - Reparenting updates the moved topic's level only.

use crate::hierarchy::{apply_level_change, build_tree};
use crate::model::topic::{Topic, TopicId};
use crate::repo::topic_repo::TopicRepository;
use crate::repo::RepoError;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type TopicServiceResult<T> = Result<T, TopicServiceError>;

/// Errors from topic service operations.
#[derive(Debug)]
pub enum TopicServiceError {
    /// Title is blank after trim.
    InvalidTitle,
    /// Target topic does not exist.
    TopicNotFound(TopicId),
    /// Parent topic does not exist.
    ParentNotFound(TopicId),
    /// Move operation would create a cycle.
    CycleDetected {
        topic_id: TopicId,
        parent_id: TopicId,
    },
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for TopicServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "topic title must not be blank"),
            Self::TopicNotFound(id) => write!(f, "topic not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent topic not found: {id}"),
            Self::CycleDetected {
                topic_id,
                parent_id,
            } => write!(
                f,
                "move would create cycle: topic {topic_id} under parent {parent_id}"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for TopicServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for TopicServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::TopicNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Topic tree service facade.
pub struct TopicService<R: TopicRepository> {
    repo: R,
}

impl<R: TopicRepository> TopicService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one topic appended under optional parent.
    pub fn create_topic(
        &self,
        parent_id: Option<TopicId>,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> TopicServiceResult<Topic> {
        let title = normalize_title(title.into())?;
        let content: String = content.into();
        if let Some(parent_id) = parent_id {
            self.ensure_parent_exists(parent_id)?;
        }
        self.repo
            .create_topic(parent_id, title.as_str(), content.as_str())
            .map_err(Into::into)
    }

    /// Replaces title and content of one topic.
    pub fn update_topic(
        &self,
        topic_id: TopicId,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> TopicServiceResult<()> {
        let title = normalize_title(title.into())?;
        let content: String = content.into();
        self.repo
            .update_topic(topic_id, title.as_str(), content.as_str())
            .map_err(Into::into)
    }

    /// Rebuilds the full tree with completion flags for one user.
    pub fn load_tree(&self, user_id: &str) -> TopicServiceResult<Vec<Topic>> {
        let completed = self.repo.completed_topic_ids(user_id)?;
        let rows = self
            .repo
            .list_topics()?
            .into_iter()
            .map(|mut topic| {
                topic.completed = completed.contains(&topic.id);
                topic
            })
            .collect();
        Ok(build_tree(rows))
    }

    /// Flips completion of one topic for one user and returns the new state.
    pub fn toggle_completion(&self, user_id: &str, topic_id: TopicId) -> TopicServiceResult<bool> {
        self.ensure_topic_exists(topic_id)?;
        let completed = !self.repo.completed_topic_ids(user_id)?.contains(&topic_id);
        self.repo.set_completed(user_id, topic_id, completed)?;
        Ok(completed)
    }

    /// Moves one topic under optional parent and returns its new level.
    ///
    /// Descendants keep their stored levels.
    pub fn move_to_parent(
        &self,
        topic_id: TopicId,
        new_parent_id: Option<TopicId>,
    ) -> TopicServiceResult<u32> {
        self.ensure_topic_exists(topic_id)?;

        let new_level = match new_parent_id {
            Some(parent_id) => {
                if parent_id == topic_id {
                    return Err(TopicServiceError::CycleDetected {
                        topic_id,
                        parent_id,
                    });
                }
                let parent = self.ensure_parent_exists(parent_id)?;
                if self.would_create_cycle(topic_id, parent_id)? {
                    return Err(TopicServiceError::CycleDetected {
                        topic_id,
                        parent_id,
                    });
                }
                parent.level + 1
            }
            None => 0,
        };

        self.repo.move_to_parent(topic_id, new_parent_id, new_level)?;
        Ok(new_level)
    }

    /// Persists a move and returns `tree` with the moved topic's level
    /// updated in place of a full reload.
    pub fn move_in_tree(
        &self,
        tree: &[Topic],
        topic_id: TopicId,
        new_parent_id: Option<TopicId>,
    ) -> TopicServiceResult<Vec<Topic>> {
        let new_level = self.move_to_parent(topic_id, new_parent_id)?;
        Ok(apply_level_change(tree, topic_id, new_level))
    }

    /// Persists a drag reorder of the children of `parent_id`.
    pub fn reorder(
        &self,
        parent_id: Option<TopicId>,
        ordered_ids: &[TopicId],
    ) -> TopicServiceResult<()> {
        if let Some(parent_id) = parent_id {
            self.ensure_parent_exists(parent_id)?;
        }
        self.repo
            .reorder_children(parent_id, ordered_ids)
            .map_err(Into::into)
    }

    fn ensure_topic_exists(&self, topic_id: TopicId) -> TopicServiceResult<Topic> {
        self.repo
            .get_topic(topic_id)?
            .ok_or(TopicServiceError::TopicNotFound(topic_id))
    }

    fn ensure_parent_exists(&self, parent_id: TopicId) -> TopicServiceResult<Topic> {
        self.repo
            .get_topic(parent_id)?
            .ok_or(TopicServiceError::ParentNotFound(parent_id))
    }

    fn would_create_cycle(
        &self,
        topic_id: TopicId,
        candidate_parent_id: TopicId,
    ) -> TopicServiceResult<bool> {
        let mut visited = HashSet::new();
        let mut cursor = Some(candidate_parent_id);
        while let Some(current) = cursor {
            if current == topic_id || !visited.insert(current) {
                return Ok(true);
            }
            let topic = self
                .repo
                .get_topic(current)?
                .ok_or(TopicServiceError::ParentNotFound(current))?;
            cursor = topic.parent_id;
        }
        Ok(false)
    }
}

fn normalize_title(value: String) -> TopicServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TopicServiceError::InvalidTitle);
    }
    Ok(trimmed.to_string())
}
