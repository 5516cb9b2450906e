//! Bookmark repository contracts and SQLite implementation.
//!
//! # Invariants
//! - At most one bookmark per `(user_id, topic_uuid)`.
//! - Listing is newest first; ties fall back to insertion order, newest first.

use crate::model::bookmark::Bookmark;
use crate::model::now_epoch_ms;
use crate::model::topic::TopicId;
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

const BOOKMARK_SELECT_SQL: &str = "SELECT
    uuid,
    topic_uuid,
    topic_title,
    created_at
FROM bookmarks";

/// Repository interface for bookmarks.
pub trait BookmarkRepository {
    /// Adds a bookmark, returning the existing one when already present.
    fn add_bookmark(&self, user_id: &str, topic_id: TopicId, topic_title: &str)
        -> RepoResult<Bookmark>;
    fn find_bookmark(&self, user_id: &str, topic_id: TopicId) -> RepoResult<Option<Bookmark>>;
    /// Returns whether a row was removed.
    fn remove_bookmark(&self, user_id: &str, topic_id: TopicId) -> RepoResult<bool>;
    fn list_bookmarks(&self, user_id: &str) -> RepoResult<Vec<Bookmark>>;
}

/// SQLite-backed bookmark repository.
pub struct SqliteBookmarkRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteBookmarkRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[(
                "bookmarks",
                &["uuid", "user_id", "topic_uuid", "topic_title", "created_at"],
            )],
        )?;
        Ok(Self { conn })
    }
}

impl BookmarkRepository for SqliteBookmarkRepository<'_> {
    fn add_bookmark(
        &self,
        user_id: &str,
        topic_id: TopicId,
        topic_title: &str,
    ) -> RepoResult<Bookmark> {
        self.conn.execute(
            "INSERT OR IGNORE INTO bookmarks (uuid, user_id, topic_uuid, topic_title, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                Uuid::new_v4().to_string(),
                user_id,
                topic_id.to_string(),
                topic_title,
                now_epoch_ms(),
            ],
        )?;
        self.find_bookmark(user_id, topic_id)?
            .ok_or(RepoError::NotFound(topic_id))
    }

    fn find_bookmark(&self, user_id: &str, topic_id: TopicId) -> RepoResult<Option<Bookmark>> {
        let row = self
            .conn
            .query_row(
                &format!("{BOOKMARK_SELECT_SQL} WHERE user_id = ?1 AND topic_uuid = ?2;"),
                params![user_id, topic_id.to_string()],
                |row| Ok(parse_bookmark_row(row)),
            )
            .optional()?;
        row.transpose()
    }

    fn remove_bookmark(&self, user_id: &str, topic_id: TopicId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM bookmarks WHERE user_id = ?1 AND topic_uuid = ?2;",
            params![user_id, topic_id.to_string()],
        )?;
        Ok(changed > 0)
    }

    fn list_bookmarks(&self, user_id: &str) -> RepoResult<Vec<Bookmark>> {
        let mut stmt = self.conn.prepare(&format!(
            "{BOOKMARK_SELECT_SQL}
             WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC;"
        ))?;
        let mut rows = stmt.query([user_id])?;
        let mut bookmarks = Vec::new();
        while let Some(row) = rows.next()? {
            bookmarks.push(parse_bookmark_row(row)?);
        }
        Ok(bookmarks)
    }
}

fn parse_bookmark_row(row: &Row<'_>) -> RepoResult<Bookmark> {
    let id: String = row.get("uuid")?;
    let topic_id: String = row.get("topic_uuid")?;
    Ok(Bookmark {
        id: parse_uuid(&id, "bookmarks.uuid")?,
        topic_id: parse_uuid(&topic_id, "bookmarks.topic_uuid")?,
        topic_title: row.get("topic_title")?,
        created_at: row.get("created_at")?,
    })
}
