use coursekit_core::hierarchy::flatten;
use coursekit_core::offload::{
    execute, run_inline, NoOffloader, OffloadOutput, OffloadTask, ThreadOffloader,
};
use coursekit_core::quiz::{filter_questions, score_quiz, QuestionFilter};
use coursekit_core::{Difficulty, Question, Topic};
use std::collections::HashMap;

fn course() -> Vec<Topic> {
    let mut first = Topic::new("A", "").with_child(Topic::new("A1", ""));
    first.order = 1;
    let mut second = Topic::new("B", "");
    second.order = 0;
    second.completed = true;
    vec![first, second]
}

fn questions(topic: &Topic) -> Vec<Question> {
    let mut hard = Question::new(
        topic.id,
        "Which borrow is unique?",
        vec!["&".into(), "&mut".into()],
        1,
    );
    hard.difficulty = Difficulty::Hard;
    hard.order = 2;
    let mut easy = Question::new(
        topic.id,
        "Is Rust compiled?",
        vec!["yes".into(), "no".into()],
        0,
    );
    easy.difficulty = Difficulty::Easy;
    easy.order = 1;
    vec![hard, easy]
}

#[test]
fn offloaded_and_inline_results_match() {
    let topics = course();
    let tasks = vec![
        OffloadTask::ProcessTopics(topics.clone()),
        OffloadTask::SortHierarchy(topics.clone()),
        OffloadTask::FilterQuestions {
            questions: questions(&topics[0]),
            filter: QuestionFilter {
                text: Some("RUST".to_string()),
                ..QuestionFilter::default()
            },
        },
    ];

    for task in tasks {
        let reference = run_inline(task.clone());
        assert_eq!(execute(Some(&ThreadOffloader), task.clone()), reference);
        assert_eq!(execute(Some(&NoOffloader), task.clone()), reference);
        assert_eq!(execute(None, task), reference);
    }
}

#[test]
fn sorted_hierarchy_follows_sibling_order() {
    match run_inline(OffloadTask::SortHierarchy(course())) {
        OffloadOutput::SortedHierarchy(sorted) => {
            let titles: Vec<&str> = flatten(&sorted)
                .into_iter()
                .map(|topic| topic.title.as_str())
                .collect();
            assert_eq!(titles, vec!["B", "A", "A1"]);
        }
        other => panic!("unexpected output: {other:?}"),
    }
}

#[test]
fn quiz_counts_unanswered_as_incorrect() {
    let topics = course();
    let all = questions(&topics[0]);
    let ordered = filter_questions(&all, &QuestionFilter::default());
    assert_eq!(ordered[0].prompt, "Is Rust compiled?");

    let mut answers = HashMap::new();
    answers.insert(ordered[0].id, 0);
    let result = score_quiz(&ordered, &answers);
    assert_eq!((result.correct, result.total), (1, 2));
    assert!((result.percent - 50.0).abs() < f64::EPSILON);
    assert_eq!(result.outcomes[1].selected_option, None);
}
