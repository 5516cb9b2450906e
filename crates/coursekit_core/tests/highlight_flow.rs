use coursekit_core::db::open_db_in_memory;
use coursekit_core::repo::highlight_repo::SqliteHighlightRepository;
use coursekit_core::repo::topic_repo::SqliteTopicRepository;
use coursekit_core::service::highlight_service::HighlightServiceError;
use coursekit_core::{HighlightService, SelectionCapture, SelectionOutcome, Topic, TopicService};
use rusqlite::Connection;
use uuid::Uuid;

const USER: &str = "student-1";
const CONTENT: &str = "## Intro\nHello **world** and more words";

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

fn create_topic(conn: &Connection) -> Topic {
    let topics = TopicService::new(SqliteTopicRepository::try_new(conn).unwrap());
    topics.create_topic(None, "Intro", CONTENT).unwrap()
}

fn capture(text: &str, start: usize, end: usize) -> SelectionCapture {
    SelectionCapture {
        selected_text: text.to_string(),
        start,
        end,
    }
}

#[test]
fn captured_selection_is_persisted_and_rendered() {
    let conn = setup();
    let topic = create_topic(&conn);
    let service = HighlightService::new(SqliteHighlightRepository::try_new(&conn).unwrap());

    let outcome = service.capture_selection(USER, &topic, "  Hello ").unwrap();
    let accepted = outcome.accepted().expect("selection accepted").clone();
    assert_eq!((accepted.start, accepted.end), (6, 11));

    let created = service
        .create_highlight(USER, topic.id, &accepted, Some("greeting".to_string()))
        .unwrap();
    assert_eq!(created.highlighted_text, "Hello");

    let stored = service.list_highlights(USER, topic.id).unwrap();
    assert_eq!(stored, vec![created.clone()]);

    let rendered = service.render_topic(USER, &topic).unwrap();
    assert_eq!(rendered.applied, vec![created.id]);
    assert_eq!(rendered.html.matches("data-highlight-id").count(), 1);
    assert!(rendered.html.contains("title=\"greeting\""));
}

#[test]
fn overlapping_creation_is_rejected() {
    let conn = setup();
    let topic = create_topic(&conn);
    let service = HighlightService::new(SqliteHighlightRepository::try_new(&conn).unwrap());

    let first = service
        .create_highlight(USER, topic.id, &capture("o Hel", 4, 9), None)
        .unwrap();

    let err = service
        .create_highlight(USER, topic.id, &capture("llo ", 8, 12), None)
        .unwrap_err();
    match err {
        HighlightServiceError::Overlap { existing } => assert_eq!(existing, first.id),
        other => panic!("unexpected error: {other}"),
    }

    service
        .create_highlight(USER, topic.id, &capture("lo", 9, 11), None)
        .unwrap();
    assert_eq!(service.list_highlights(USER, topic.id).unwrap().len(), 2);
}

#[test]
fn five_to_ten_then_eight_to_twelve_is_rejected() {
    let conn = setup();
    let topic = create_topic(&conn);
    let service = HighlightService::new(SqliteHighlightRepository::try_new(&conn).unwrap());

    service
        .create_highlight(USER, topic.id, &capture(" Hell", 5, 10), None)
        .unwrap();
    let err = service
        .create_highlight(USER, topic.id, &capture("llo ", 8, 12), None)
        .unwrap_err();
    assert!(matches!(err, HighlightServiceError::Overlap { .. }));
}

#[test]
fn capture_reports_overlap_and_not_found() {
    let conn = setup();
    let topic = create_topic(&conn);
    let service = HighlightService::new(SqliteHighlightRepository::try_new(&conn).unwrap());
    service
        .create_highlight(USER, topic.id, &capture("Hello", 6, 11), None)
        .unwrap();

    let overlap = service.capture_selection(USER, &topic, "Hello wor").unwrap();
    assert!(matches!(overlap, SelectionOutcome::Overlap { .. }));

    let missing = service.capture_selection(USER, &topic, "absent").unwrap();
    assert_eq!(missing, SelectionOutcome::NotFound);

    let blank = service.capture_selection(USER, &topic, "   ").unwrap();
    assert_eq!(blank, SelectionOutcome::Ignored);

    let other_user = service.capture_selection("student-2", &topic, "Hello").unwrap();
    assert!(other_user.accepted().is_some());
}

#[test]
fn empty_range_is_invalid() {
    let conn = setup();
    let topic = create_topic(&conn);
    let service = HighlightService::new(SqliteHighlightRepository::try_new(&conn).unwrap());

    let err = service
        .create_highlight(USER, topic.id, &capture("", 3, 3), None)
        .unwrap_err();
    assert!(matches!(
        err,
        HighlightServiceError::InvalidRange { start: 3, end: 3 }
    ));
}

#[test]
fn note_edit_and_delete_are_user_scoped() {
    let conn = setup();
    let topic = create_topic(&conn);
    let service = HighlightService::new(SqliteHighlightRepository::try_new(&conn).unwrap());
    let created = service
        .create_highlight(USER, topic.id, &capture("world", 12, 17), Some("  ".to_string()))
        .unwrap();
    assert_eq!(created.note, None);

    service
        .update_note(USER, created.id, Some("remember".to_string()))
        .unwrap();
    let stored = service.list_highlights(USER, topic.id).unwrap();
    assert_eq!(stored[0].note.as_deref(), Some("remember"));

    let err = service
        .update_note("student-2", created.id, None)
        .unwrap_err();
    assert!(matches!(err, HighlightServiceError::HighlightNotFound(id) if id == created.id));

    service.delete_highlight(USER, created.id).unwrap();
    assert!(service.list_highlights(USER, topic.id).unwrap().is_empty());
    let err = service.delete_highlight(USER, created.id).unwrap_err();
    assert!(matches!(err, HighlightServiceError::HighlightNotFound(_)));

    let err = service
        .delete_highlight(USER, Uuid::new_v4())
        .unwrap_err();
    assert!(matches!(err, HighlightServiceError::HighlightNotFound(_)));
}
