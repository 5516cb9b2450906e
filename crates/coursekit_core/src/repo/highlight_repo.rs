//! Highlight repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist per-user highlight annotations keyed by topic.
//!
//! # Invariants
//! - Every query is scoped by `user_id`; callers never see another user's rows.
//! - Listing order is `position_start ASC, uuid ASC`.
//! - Overlap rejection lives in the service layer; the table only enforces
//!   `position_end > position_start`.

use crate::model::highlight::{Highlight, HighlightId};
use crate::model::topic::TopicId;
use crate::repo::{ensure_connection_ready, parse_offset, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

const HIGHLIGHT_SELECT_SQL: &str = "SELECT
    uuid,
    topic_uuid,
    highlighted_text,
    position_start,
    position_end,
    note,
    created_at
FROM highlights";

/// Repository interface for highlight persistence.
pub trait HighlightRepository {
    fn create_highlight(&self, user_id: &str, highlight: &Highlight) -> RepoResult<()>;
    fn get_highlight(&self, user_id: &str, id: HighlightId) -> RepoResult<Option<Highlight>>;
    /// Lists highlights of one topic, ascending by start offset.
    fn list_for_topic(&self, user_id: &str, topic_id: TopicId) -> RepoResult<Vec<Highlight>>;
    fn update_note(&self, user_id: &str, id: HighlightId, note: Option<&str>) -> RepoResult<()>;
    fn delete_highlight(&self, user_id: &str, id: HighlightId) -> RepoResult<()>;
}

/// SQLite-backed highlight repository.
pub struct SqliteHighlightRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHighlightRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(
            conn,
            &[(
                "highlights",
                &[
                    "uuid",
                    "user_id",
                    "topic_uuid",
                    "highlighted_text",
                    "position_start",
                    "position_end",
                    "note",
                    "created_at",
                ],
            )],
        )?;
        Ok(Self { conn })
    }
}

impl HighlightRepository for SqliteHighlightRepository<'_> {
    fn create_highlight(&self, user_id: &str, highlight: &Highlight) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO highlights (
                uuid,
                user_id,
                topic_uuid,
                highlighted_text,
                position_start,
                position_end,
                note,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                highlight.id.to_string(),
                user_id,
                highlight.topic_id.to_string(),
                highlight.highlighted_text,
                highlight.position_start as i64,
                highlight.position_end as i64,
                highlight.note,
                highlight.created_at,
            ],
        )?;
        Ok(())
    }

    fn get_highlight(&self, user_id: &str, id: HighlightId) -> RepoResult<Option<Highlight>> {
        let row = self
            .conn
            .query_row(
                &format!("{HIGHLIGHT_SELECT_SQL} WHERE uuid = ?1 AND user_id = ?2;"),
                params![id.to_string(), user_id],
                |row| Ok(parse_highlight_row(row)),
            )
            .optional()?;
        row.transpose()
    }

    fn list_for_topic(&self, user_id: &str, topic_id: TopicId) -> RepoResult<Vec<Highlight>> {
        let mut stmt = self.conn.prepare(&format!(
            "{HIGHLIGHT_SELECT_SQL}
             WHERE user_id = ?1 AND topic_uuid = ?2
             ORDER BY position_start ASC, uuid ASC;"
        ))?;
        let mut rows = stmt.query(params![user_id, topic_id.to_string()])?;
        let mut highlights = Vec::new();
        while let Some(row) = rows.next()? {
            highlights.push(parse_highlight_row(row)?);
        }
        Ok(highlights)
    }

    fn update_note(&self, user_id: &str, id: HighlightId, note: Option<&str>) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE highlights SET note = ?3 WHERE uuid = ?1 AND user_id = ?2;",
            params![id.to_string(), user_id, note],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn delete_highlight(&self, user_id: &str, id: HighlightId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "DELETE FROM highlights WHERE uuid = ?1 AND user_id = ?2;",
            params![id.to_string(), user_id],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_highlight_row(row: &Row<'_>) -> RepoResult<Highlight> {
    let id: String = row.get("uuid")?;
    let topic_id: String = row.get("topic_uuid")?;
    Ok(Highlight {
        id: parse_uuid(&id, "highlights.uuid")?,
        topic_id: parse_uuid(&topic_id, "highlights.topic_uuid")?,
        highlighted_text: row.get("highlighted_text")?,
        position_start: parse_offset(row.get("position_start")?, "highlights.position_start")?,
        position_end: parse_offset(row.get("position_end")?, "highlights.position_end")?,
        note: row.get("note")?,
        created_at: row.get("created_at")?,
    })
}
