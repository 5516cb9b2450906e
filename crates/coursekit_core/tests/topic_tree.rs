use coursekit_core::db::open_db_in_memory;
use coursekit_core::hierarchy::{find_topic, flatten, neighbors, progress};
use coursekit_core::repo::topic_repo::{SqliteTopicRepository, TopicRepository};
use coursekit_core::service::topic_service::TopicServiceError;
use coursekit_core::{Topic, TopicService};
use rusqlite::Connection;
use uuid::Uuid;

const USER: &str = "student-1";

fn setup() -> Connection {
    open_db_in_memory().unwrap()
}

struct Course {
    root: Topic,
    a: Topic,
    a1: Topic,
    b: Topic,
}

fn seed(service: &TopicService<SqliteTopicRepository<'_>>) -> Course {
    let root = service.create_topic(None, "R", "## R").unwrap();
    let a = service.create_topic(Some(root.id), "A", "").unwrap();
    let a1 = service.create_topic(Some(a.id), "A1", "").unwrap();
    let b = service.create_topic(Some(root.id), "B", "").unwrap();
    Course { root, a, a1, b }
}

fn titles(tree: &[Topic]) -> Vec<String> {
    flatten(tree)
        .into_iter()
        .map(|topic| topic.title.clone())
        .collect()
}

#[test]
fn created_topics_get_levels_and_appended_orders() {
    let conn = setup();
    let service = TopicService::new(SqliteTopicRepository::try_new(&conn).unwrap());
    let course = seed(&service);

    assert_eq!(course.root.level, 0);
    assert_eq!(course.a.level, 1);
    assert_eq!(course.a1.level, 2);
    assert_eq!(course.a.order, 0);
    assert_eq!(course.b.order, 1);
    assert_eq!(course.a1.parent_id, Some(course.a.id));
}

#[test]
fn load_tree_flattens_parent_first() {
    let conn = setup();
    let service = TopicService::new(SqliteTopicRepository::try_new(&conn).unwrap());
    let course = seed(&service);

    let tree = service.load_tree(USER).unwrap();
    assert_eq!(titles(&tree), vec!["R", "A", "A1", "B"]);

    let around = neighbors(&tree, course.a1.id).unwrap();
    assert_eq!(around.previous.map(|topic| topic.id), Some(course.a.id));
    assert_eq!(around.next.map(|topic| topic.id), Some(course.b.id));
}

#[test]
fn completion_is_user_scoped_and_drives_progress() {
    let conn = setup();
    let service = TopicService::new(SqliteTopicRepository::try_new(&conn).unwrap());
    let course = seed(&service);

    assert!(service.toggle_completion(USER, course.a1.id).unwrap());
    let tree = service.load_tree(USER).unwrap();
    let summary = progress(&tree);
    assert_eq!((summary.completed, summary.total), (1, 4));
    assert!((summary.percent - 25.0).abs() < f64::EPSILON);

    let other = service.load_tree("student-2").unwrap();
    assert_eq!(progress(&other).completed, 0);

    assert!(!service.toggle_completion(USER, course.a1.id).unwrap());
    assert_eq!(progress(&service.load_tree(USER).unwrap()).completed, 0);
}

#[test]
fn reparent_updates_moved_topic_level_only() {
    let conn = setup();
    let repo = SqliteTopicRepository::try_new(&conn).unwrap();
    let service = TopicService::new(SqliteTopicRepository::try_new(&conn).unwrap());
    let course = seed(&service);

    let new_level = service.move_to_parent(course.a.id, None).unwrap();
    assert_eq!(new_level, 0);

    let moved = repo.get_topic(course.a.id).unwrap().unwrap();
    assert_eq!(moved.parent_id, None);
    assert_eq!(moved.level, 0);
    assert_eq!(moved.order, 1);

    let child = repo.get_topic(course.a1.id).unwrap().unwrap();
    assert_eq!(child.parent_id, Some(course.a.id));
    assert_eq!(child.level, 2);

    let tree = service.load_tree(USER).unwrap();
    assert_eq!(titles(&tree), vec!["R", "B", "A", "A1"]);
}

#[test]
fn move_in_tree_patches_level_without_reloading() {
    let conn = setup();
    let service = TopicService::new(SqliteTopicRepository::try_new(&conn).unwrap());
    let course = seed(&service);
    let tree = service.load_tree(USER).unwrap();

    let patched = service
        .move_in_tree(&tree, course.b.id, Some(course.a1.id))
        .unwrap();
    assert_eq!(find_topic(&patched, course.b.id).unwrap().level, 3);
    assert_eq!(find_topic(&tree, course.b.id).unwrap().level, 1);
}

#[test]
fn move_rejects_self_parent_and_cycles() {
    let conn = setup();
    let service = TopicService::new(SqliteTopicRepository::try_new(&conn).unwrap());
    let course = seed(&service);

    let self_err = service
        .move_to_parent(course.a.id, Some(course.a.id))
        .unwrap_err();
    assert!(matches!(self_err, TopicServiceError::CycleDetected { .. }));

    let cycle_err = service
        .move_to_parent(course.root.id, Some(course.a1.id))
        .unwrap_err();
    match cycle_err {
        TopicServiceError::CycleDetected {
            topic_id,
            parent_id,
        } => {
            assert_eq!(topic_id, course.root.id);
            assert_eq!(parent_id, course.a1.id);
        }
        other => panic!("unexpected error: {other}"),
    }

    let missing = Uuid::new_v4();
    let parent_err = service
        .move_to_parent(course.b.id, Some(missing))
        .unwrap_err();
    assert!(matches!(parent_err, TopicServiceError::ParentNotFound(id) if id == missing));
}

#[test]
fn reorder_rewrites_sibling_order() {
    let conn = setup();
    let service = TopicService::new(SqliteTopicRepository::try_new(&conn).unwrap());
    let course = seed(&service);

    service
        .reorder(Some(course.root.id), &[course.b.id, course.a.id])
        .unwrap();
    let tree = service.load_tree(USER).unwrap();
    assert_eq!(titles(&tree), vec!["R", "B", "A", "A1"]);
    assert_eq!(find_topic(&tree, course.b.id).unwrap().order, 0);
    assert_eq!(find_topic(&tree, course.a.id).unwrap().order, 1);
}

#[test]
fn reorder_ignores_repeated_ids() {
    let conn = setup();
    let service = TopicService::new(SqliteTopicRepository::try_new(&conn).unwrap());
    let course = seed(&service);

    service
        .reorder(Some(course.root.id), &[course.b.id, course.b.id, course.a.id])
        .unwrap();
    let tree = service.load_tree(USER).unwrap();
    assert_eq!(titles(&tree), vec!["R", "B", "A", "A1"]);
    assert_eq!(find_topic(&tree, course.b.id).unwrap().order, 0);
    assert_eq!(find_topic(&tree, course.a.id).unwrap().order, 1);
}

#[test]
fn create_and_update_validate_input() {
    let conn = setup();
    let service = TopicService::new(SqliteTopicRepository::try_new(&conn).unwrap());

    assert!(matches!(
        service.create_topic(None, "   ", "").unwrap_err(),
        TopicServiceError::InvalidTitle
    ));
    let missing = Uuid::new_v4();
    assert!(matches!(
        service.create_topic(Some(missing), "Child", "").unwrap_err(),
        TopicServiceError::ParentNotFound(id) if id == missing
    ));
    assert!(matches!(
        service.update_topic(missing, "Title", "").unwrap_err(),
        TopicServiceError::TopicNotFound(id) if id == missing
    ));

    let topic = service.create_topic(None, "  Intro ", "old").unwrap();
    assert_eq!(topic.title, "Intro");
    service.update_topic(topic.id, "Intro v2", "new").unwrap();
    let tree = service.load_tree(USER).unwrap();
    assert_eq!(tree[0].title, "Intro v2");
    assert_eq!(tree[0].content, "new");
}
