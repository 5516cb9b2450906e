//! Bookmark model.
//!
//! The stored `topic_title` is a snapshot taken when the bookmark was created
//! and may drift from the live topic title.

use crate::model::topic::TopicId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable bookmark identifier.
pub type BookmarkId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: BookmarkId,
    pub topic_id: TopicId,
    pub topic_title: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
}
