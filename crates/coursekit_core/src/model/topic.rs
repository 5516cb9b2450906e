//! Topic tree node model.
//!
//! # Responsibility
//! - Represent one node of the course content tree.
//! - Describe shallow patches applied by hierarchy edits.
//!
//! # Invariants
//! - A child's `level` is its parent's `level + 1` when created.
//! - `order` is unique among siblings.
//! - `completed` is user-scoped and never persisted on the topic row itself.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable topic identifier.
pub type TopicId = Uuid;

/// Course content node with ordered children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: TopicId,
    /// `None` for root-level topics.
    pub parent_id: Option<TopicId>,
    pub title: String,
    /// Plain text with light line-prefix/inline markup.
    pub content: String,
    /// Sibling sort key.
    pub order: i64,
    /// Depth in the tree, root = 0.
    pub level: u32,
    pub completed: bool,
    #[serde(default)]
    pub children: Vec<Topic>,
}

impl Topic {
    /// Creates a root-level topic with a generated id.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title, content)
    }

    /// Creates a root-level topic with a caller-provided id.
    pub fn with_id(id: TopicId, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id,
            parent_id: None,
            title: title.into(),
            content: content.into(),
            order: 0,
            level: 0,
            completed: false,
            children: Vec::new(),
        }
    }

    /// Appends `child` under this topic, assigning parent, level and order.
    pub fn push_child(&mut self, mut child: Topic) {
        child.parent_id = Some(self.id);
        child.order = self.children.len() as i64;
        child.relevel(self.level + 1);
        self.children.push(child);
    }

    /// Sets `level` on this topic and keeps every descendant one level
    /// below its parent.
    fn relevel(&mut self, level: u32) {
        self.level = level;
        for child in &mut self.children {
            child.relevel(level + 1);
        }
    }

    /// Builder-style variant of [`Topic::push_child`].
    pub fn with_child(mut self, child: Topic) -> Self {
        self.push_child(child);
        self
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

/// Shallow field patch merged into a topic by
/// [`crate::hierarchy::update_topic_in_hierarchy`].
///
/// `None` leaves the field untouched. Children are never patched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicPatch {
    pub title: Option<String>,
    pub content: Option<String>,
    pub order: Option<i64>,
    pub level: Option<u32>,
    pub completed: Option<bool>,
    pub parent_id: Option<Option<TopicId>>,
}

impl TopicPatch {
    pub fn completed(value: bool) -> Self {
        Self {
            completed: Some(value),
            ..Self::default()
        }
    }

    pub fn level(value: u32) -> Self {
        Self {
            level: Some(value),
            ..Self::default()
        }
    }

    /// Merges set fields into `topic`.
    pub fn apply_to(&self, topic: &mut Topic) {
        if let Some(title) = &self.title {
            topic.title = title.clone();
        }
        if let Some(content) = &self.content {
            topic.content = content.clone();
        }
        if let Some(order) = self.order {
            topic.order = order;
        }
        if let Some(level) = self.level {
            topic.level = level;
        }
        if let Some(completed) = self.completed {
            topic.completed = completed;
        }
        if let Some(parent_id) = self.parent_id {
            topic.parent_id = parent_id;
        }
    }
}
