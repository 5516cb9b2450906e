//! Topic tree repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist topic rows (parent link, sibling order, level) and per-user
//!   completion.
//! - Keep ordering and reparent SQL inside the repository boundary.
//!
//! # Invariants
//! - Sibling listing is deterministic: `sort_order ASC, uuid ASC`.
//! - New topics are appended after their last sibling.
//! - Reparenting writes the moved row only; descendant levels are untouched.

use crate::model::topic::{Topic, TopicId};
use crate::repo::{ensure_connection_ready, parse_bool, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use std::collections::HashSet;
use uuid::Uuid;

const TOPIC_COLUMNS: &[&str] = &[
    "uuid",
    "parent_uuid",
    "title",
    "content",
    "sort_order",
    "level",
];
const PROGRESS_COLUMNS: &[&str] = &["user_id", "topic_uuid", "completed"];

const TOPIC_SELECT_SQL: &str = "SELECT
    uuid,
    parent_uuid,
    title,
    content,
    sort_order,
    level
FROM topics";

/// Repository interface for topic rows and completion state.
pub trait TopicRepository {
    /// Creates one topic appended under optional parent.
    fn create_topic(
        &self,
        parent_id: Option<TopicId>,
        title: &str,
        content: &str,
    ) -> RepoResult<Topic>;
    /// Loads one topic row (no children, `completed=false`).
    fn get_topic(&self, id: TopicId) -> RepoResult<Option<Topic>>;
    /// Lists every topic row, flat.
    fn list_topics(&self) -> RepoResult<Vec<Topic>>;
    /// Replaces title and content.
    fn update_topic(&self, id: TopicId, title: &str, content: &str) -> RepoResult<()>;
    /// Moves one topic under a new parent with the given level.
    fn move_to_parent(
        &self,
        id: TopicId,
        new_parent_id: Option<TopicId>,
        new_level: u32,
    ) -> RepoResult<()>;
    /// Rewrites sibling order under one parent.
    fn reorder_children(
        &self,
        parent_id: Option<TopicId>,
        ordered_ids: &[TopicId],
    ) -> RepoResult<()>;
    /// Stores completion of one topic for one user.
    fn set_completed(&self, user_id: &str, id: TopicId, completed: bool) -> RepoResult<()>;
    /// Topics completed by one user.
    fn completed_topic_ids(&self, user_id: &str) -> RepoResult<HashSet<TopicId>>;
}

/// SQLite-backed topic repository.
pub struct SqliteTopicRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTopicRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[
                ("topics", TOPIC_COLUMNS),
                ("topic_progress", PROGRESS_COLUMNS),
            ],
        )?;
        Ok(Self { conn })
    }
}

impl TopicRepository for SqliteTopicRepository<'_> {
    fn create_topic(
        &self,
        parent_id: Option<TopicId>,
        title: &str,
        content: &str,
    ) -> RepoResult<Topic> {
        let level = match parent_id {
            Some(parent_id) => {
                let parent = self
                    .get_topic(parent_id)?
                    .ok_or(RepoError::NotFound(parent_id))?;
                parent.level + 1
            }
            None => 0,
        };

        let id = Uuid::new_v4();
        let sort_order = next_sort_order(self.conn, parent_id)?;
        self.conn.execute(
            "INSERT INTO topics (uuid, parent_uuid, title, content, sort_order, level)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                id.to_string(),
                parent_id.map(|value| value.to_string()),
                title,
                content,
                sort_order,
                i64::from(level),
            ],
        )?;
        self.get_topic(id)?.ok_or(RepoError::NotFound(id))
    }

    fn get_topic(&self, id: TopicId) -> RepoResult<Option<Topic>> {
        let row = self
            .conn
            .query_row(
                &format!("{TOPIC_SELECT_SQL} WHERE uuid = ?1;"),
                [id.to_string()],
                |row| Ok(parse_topic_row(row)),
            )
            .optional()?;
        row.transpose()
    }

    fn list_topics(&self) -> RepoResult<Vec<Topic>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TOPIC_SELECT_SQL} ORDER BY level ASC, sort_order ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut topics = Vec::new();
        while let Some(row) = rows.next()? {
            topics.push(parse_topic_row(row)?);
        }
        Ok(topics)
    }

    fn update_topic(&self, id: TopicId, title: &str, content: &str) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE topics
             SET title = ?2,
                 content = ?3,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![id.to_string(), title, content],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn move_to_parent(
        &self,
        id: TopicId,
        new_parent_id: Option<TopicId>,
        new_level: u32,
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let sort_order = next_sort_order(&tx, new_parent_id)?;
        let changed = tx.execute(
            "UPDATE topics
             SET parent_uuid = ?2,
                 level = ?3,
                 sort_order = ?4,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                id.to_string(),
                new_parent_id.map(|value| value.to_string()),
                i64::from(new_level),
                sort_order,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        tx.commit()?;
        Ok(())
    }

    fn reorder_children(
        &self,
        parent_id: Option<TopicId>,
        ordered_ids: &[TopicId],
    ) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let current = list_child_ids(&tx, parent_id)?;

        let mut listed: HashSet<TopicId> = HashSet::new();
        let mut sequence: Vec<TopicId> = ordered_ids
            .iter()
            .copied()
            .filter(|id| current.contains(id) && listed.insert(*id))
            .collect();
        sequence.extend(current.into_iter().filter(|id| !listed.contains(id)));

        for (index, id) in sequence.into_iter().enumerate() {
            tx.execute(
                "UPDATE topics
                 SET sort_order = ?2,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE uuid = ?1;",
                params![id.to_string(), index as i64],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn set_completed(&self, user_id: &str, id: TopicId, completed: bool) -> RepoResult<()> {
        if self.get_topic(id)?.is_none() {
            return Err(RepoError::NotFound(id));
        }
        self.conn.execute(
            "INSERT INTO topic_progress (user_id, topic_uuid, completed)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id, topic_uuid) DO UPDATE SET
                completed = excluded.completed,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![user_id, id.to_string(), i64::from(completed)],
        )?;
        Ok(())
    }

    fn completed_topic_ids(&self, user_id: &str) -> RepoResult<HashSet<TopicId>> {
        let mut stmt = self.conn.prepare(
            "SELECT topic_uuid, completed
             FROM topic_progress
             WHERE user_id = ?1;",
        )?;
        let mut rows = stmt.query([user_id])?;
        let mut ids = HashSet::new();
        while let Some(row) = rows.next()? {
            let completed = parse_bool(row.get("completed")?, "topic_progress.completed")?;
            if completed {
                let value: String = row.get("topic_uuid")?;
                ids.insert(parse_uuid(&value, "topic_progress.topic_uuid")?);
            }
        }
        Ok(ids)
    }
}

fn next_sort_order(conn: &Connection, parent_id: Option<TopicId>) -> RepoResult<i64> {
    let next = match parent_id {
        Some(parent_id) => conn.query_row(
            "SELECT COALESCE(MAX(sort_order), -1) + 1
             FROM topics
             WHERE parent_uuid = ?1;",
            [parent_id.to_string()],
            |row| row.get(0),
        )?,
        None => conn.query_row(
            "SELECT COALESCE(MAX(sort_order), -1) + 1
             FROM topics
             WHERE parent_uuid IS NULL;",
            [],
            |row| row.get(0),
        )?,
    };
    Ok(next)
}

fn list_child_ids(conn: &Connection, parent_id: Option<TopicId>) -> RepoResult<Vec<TopicId>> {
    let (sql, bind) = match parent_id {
        Some(parent_id) => (
            "SELECT uuid FROM topics WHERE parent_uuid = ?1 ORDER BY sort_order ASC, uuid ASC;",
            Some(parent_id.to_string()),
        ),
        None => (
            "SELECT uuid FROM topics WHERE parent_uuid IS NULL ORDER BY sort_order ASC, uuid ASC;",
            None,
        ),
    };
    let mut stmt = conn.prepare(sql)?;
    let mut rows = match bind {
        Some(value) => stmt.query([value])?,
        None => stmt.query([])?,
    };
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "topics.uuid")?);
    }
    Ok(ids)
}

fn parse_topic_row(row: &Row<'_>) -> RepoResult<Topic> {
    let id_text: String = row.get("uuid")?;
    let parent_id = row
        .get::<_, Option<String>>("parent_uuid")?
        .map(|value| parse_uuid(&value, "topics.parent_uuid"))
        .transpose()?;
    let level_value: i64 = row.get("level")?;
    let level = u32::try_from(level_value).map_err(|_| {
        RepoError::InvalidData(format!("invalid level `{level_value}` in topics.level"))
    })?;

    Ok(Topic {
        id: parse_uuid(&id_text, "topics.uuid")?,
        parent_id,
        title: row.get("title")?,
        content: row.get("content")?,
        order: row.get("sort_order")?,
        level,
        completed: false,
        children: Vec::new(),
    })
}
