//! Question filtering and quiz scoring.
//!
//! # Invariants
//! - Filtered questions are returned sorted by `order`, ties by input order.
//! - Unanswered questions count as incorrect.

use crate::model::question::{Difficulty, Question, QuestionId};
use crate::model::topic::TopicId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Filter applied by [`filter_questions`]; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionFilter {
    pub topic_id: Option<TopicId>,
    pub difficulty: Option<Difficulty>,
    /// Case-insensitive substring of prompt or any option.
    pub text: Option<String>,
}

pub fn filter_questions(questions: &[Question], filter: &QuestionFilter) -> Vec<Question> {
    let needle = filter
        .text
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_lowercase);

    let mut matched: Vec<Question> = questions
        .iter()
        .filter(|question| filter.topic_id.map_or(true, |id| question.topic_id == id))
        .filter(|question| {
            filter
                .difficulty
                .map_or(true, |difficulty| question.difficulty == difficulty)
        })
        .filter(|question| match &needle {
            None => true,
            Some(needle) => {
                question.prompt.to_lowercase().contains(needle)
                    || question
                        .options
                        .iter()
                        .any(|option| option.to_lowercase().contains(needle))
            }
        })
        .cloned()
        .collect();
    matched.sort_by_key(|question| question.order);
    matched
}

/// Per-question scoring outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOutcome {
    pub question_id: QuestionId,
    pub selected_option: Option<usize>,
    pub correct_option: usize,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
    pub correct: usize,
    pub total: usize,
    /// `correct / total * 100`, zero for an empty quiz.
    pub percent: f64,
    pub outcomes: Vec<QuestionOutcome>,
}

/// Scores `answers` (question id -> selected option index) against
/// `questions`.
pub fn score_quiz(questions: &[Question], answers: &HashMap<QuestionId, usize>) -> QuizResult {
    let outcomes: Vec<QuestionOutcome> = questions
        .iter()
        .map(|question| {
            let selected_option = answers.get(&question.id).copied();
            QuestionOutcome {
                question_id: question.id,
                selected_option,
                correct_option: question.correct_option,
                is_correct: selected_option.is_some_and(|selected| question.is_correct(selected)),
            }
        })
        .collect();

    let total = outcomes.len();
    let correct = outcomes.iter().filter(|outcome| outcome.is_correct).count();
    let percent = if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64 * 100.0
    };
    QuizResult {
        correct,
        total,
        percent,
        outcomes,
    }
}

#[cfg(test)]
mod tests {
    use super::{filter_questions, score_quiz, QuestionFilter};
    use crate::model::question::{Difficulty, Question};
    use std::collections::HashMap;
    use uuid::Uuid;

    fn question(topic: Uuid, prompt: &str, order: i64, difficulty: Difficulty) -> Question {
        let mut question = Question::new(
            topic,
            prompt,
            vec!["Borrow".to_string(), "Move".to_string()],
            1,
        );
        question.order = order;
        question.difficulty = difficulty;
        question
    }

    #[test]
    fn filter_combines_criteria_and_sorts_by_order() {
        let topic = Uuid::new_v4();
        let other = Uuid::new_v4();
        let questions = vec![
            question(topic, "What is ownership?", 2, Difficulty::Easy),
            question(topic, "Lifetimes", 1, Difficulty::Easy),
            question(topic, "Traits", 0, Difficulty::Hard),
            question(other, "Ownership again", 0, Difficulty::Easy),
        ];

        let filter = QuestionFilter {
            topic_id: Some(topic),
            difficulty: Some(Difficulty::Easy),
            text: None,
        };
        let prompts: Vec<String> = filter_questions(&questions, &filter)
            .into_iter()
            .map(|q| q.prompt)
            .collect();
        assert_eq!(prompts, vec!["Lifetimes", "What is ownership?"]);

        let by_text = QuestionFilter {
            text: Some("  OWNERSHIP ".to_string()),
            ..QuestionFilter::default()
        };
        assert_eq!(filter_questions(&questions, &by_text).len(), 2);
    }

    #[test]
    fn unanswered_questions_are_incorrect() {
        let topic = Uuid::new_v4();
        let first = question(topic, "a", 0, Difficulty::Easy);
        let second = question(topic, "b", 1, Difficulty::Easy);
        let answers = HashMap::from([(first.id, 1)]);

        let result = score_quiz(&[first, second], &answers);
        assert_eq!(result.correct, 1);
        assert_eq!(result.total, 2);
        assert_eq!(result.percent, 50.0);
        assert_eq!(result.outcomes[1].selected_option, None);
    }

    #[test]
    fn empty_quiz_scores_zero() {
        let result = score_quiz(&[], &HashMap::new());
        assert_eq!(result.percent, 0.0);
    }
}
