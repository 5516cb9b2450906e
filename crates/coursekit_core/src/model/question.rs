//! Quiz question model.
//!
//! # Invariants
//! - `correct_option` indexes into `options`.
//! - `order` sorts questions within one topic.

use crate::model::topic::TopicId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable question identifier.
pub type QuestionId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// Multiple-choice question attached to one topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: QuestionId,
    pub topic_id: TopicId,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_option: usize,
    pub explanation: Option<String>,
    pub difficulty: Difficulty,
    pub order: i64,
}

impl Question {
    pub fn new(
        topic_id: TopicId,
        prompt: impl Into<String>,
        options: Vec<String>,
        correct_option: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic_id,
            prompt: prompt.into(),
            options,
            correct_option,
            explanation: None,
            difficulty: Difficulty::Medium,
            order: 0,
        }
    }

    pub fn is_correct(&self, selected_option: usize) -> bool {
        selected_option == self.correct_option
    }
}
