//! Durable backing stores for [`super::LruCache`].
//!
//! # Responsibility
//! - Mirror cache entries to a per-cache namespace so they survive reloads.
//! - Keep SQL details behind the `CacheStore` contract.
//!
//! # Invariants
//! - One namespace per logical cache name: `coursekit-cache-<name>`.
//! - Stored `data` is the JSON encoding of the cached value.

use crate::db::{open_db, open_db_in_memory, table_exists, DbError};
use rusqlite::{params, Connection};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

const NAMESPACE_PREFIX: &str = "coursekit-cache-";

pub type CacheStoreResult<T> = Result<T, CacheStoreError>;

/// Errors from durable cache stores.
#[derive(Debug)]
pub enum CacheStoreError {
    Db(DbError),
    /// Value could not be encoded to or decoded from JSON.
    Codec(serde_json::Error),
    /// `cache_entries` table is missing on the connection.
    MissingTable,
}

impl Display for CacheStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Codec(err) => write!(f, "cache value codec failed: {err}"),
            Self::MissingTable => write!(f, "cache store requires table `cache_entries`"),
        }
    }
}

impl Error for CacheStoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Codec(err) => Some(err),
            Self::MissingTable => None,
        }
    }
}

impl From<DbError> for CacheStoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for CacheStoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for CacheStoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Codec(value)
    }
}

/// One persisted cache record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCacheEntry {
    pub key: String,
    /// JSON-encoded value.
    pub data: String,
    /// Epoch ms creation timestamp.
    pub timestamp: i64,
    pub access_count: u64,
    /// Epoch ms of the latest read or write.
    pub last_accessed: i64,
}

/// Durable key-value mirror for one cache instance.
pub trait CacheStore {
    /// Namespace all records of this store live under.
    fn namespace(&self) -> &str;
    /// Loads every record in the namespace.
    fn load_all(&self) -> CacheStoreResult<Vec<StoredCacheEntry>>;
    /// Inserts or replaces one record.
    fn put(&self, entry: &StoredCacheEntry) -> CacheStoreResult<()>;
    /// Updates access metadata of one record.
    fn touch(&self, key: &str, access_count: u64, last_accessed: i64) -> CacheStoreResult<()>;
    /// Removes one record; missing keys are not an error.
    fn delete(&self, key: &str) -> CacheStoreResult<()>;
    /// Removes every record in the namespace.
    fn clear(&self) -> CacheStoreResult<()>;
}

/// Derives the store namespace for a logical cache name.
pub fn namespace_for(cache_name: &str) -> String {
    format!("{NAMESPACE_PREFIX}{}", cache_name.trim())
}

/// SQLite-backed cache store owning its connection.
pub struct SqliteCacheStore {
    conn: Connection,
    namespace: String,
}

impl SqliteCacheStore {
    /// Opens (and migrates) a database file for cache `cache_name`.
    pub fn open(path: impl AsRef<Path>, cache_name: &str) -> CacheStoreResult<Self> {
        Self::with_connection(open_db(path)?, cache_name)
    }

    /// Opens a throwaway in-memory store.
    pub fn open_in_memory(cache_name: &str) -> CacheStoreResult<Self> {
        Self::with_connection(open_db_in_memory()?, cache_name)
    }

    /// Wraps an already migrated connection.
    pub fn with_connection(conn: Connection, cache_name: &str) -> CacheStoreResult<Self> {
        if !table_exists(&conn, "cache_entries")? {
            return Err(CacheStoreError::MissingTable);
        }
        Ok(Self {
            conn,
            namespace: namespace_for(cache_name),
        })
    }
}

impl CacheStore for SqliteCacheStore {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn load_all(&self) -> CacheStoreResult<Vec<StoredCacheEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT key, data, timestamp, access_count, last_accessed
             FROM cache_entries
             WHERE namespace = ?1
             ORDER BY last_accessed ASC, key ASC;",
        )?;
        let mut rows = stmt.query([self.namespace.as_str()])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            let access_count: i64 = row.get("access_count")?;
            entries.push(StoredCacheEntry {
                key: row.get("key")?,
                data: row.get("data")?,
                timestamp: row.get("timestamp")?,
                access_count: access_count.max(0) as u64,
                last_accessed: row.get("last_accessed")?,
            });
        }
        Ok(entries)
    }

    fn put(&self, entry: &StoredCacheEntry) -> CacheStoreResult<()> {
        self.conn.execute(
            "INSERT INTO cache_entries (namespace, key, data, timestamp, access_count, last_accessed)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(namespace, key) DO UPDATE SET
                data = excluded.data,
                timestamp = excluded.timestamp,
                access_count = excluded.access_count,
                last_accessed = excluded.last_accessed;",
            params![
                self.namespace.as_str(),
                entry.key.as_str(),
                entry.data.as_str(),
                entry.timestamp,
                entry.access_count as i64,
                entry.last_accessed,
            ],
        )?;
        Ok(())
    }

    fn touch(&self, key: &str, access_count: u64, last_accessed: i64) -> CacheStoreResult<()> {
        self.conn.execute(
            "UPDATE cache_entries
             SET access_count = ?3,
                 last_accessed = ?4
             WHERE namespace = ?1
               AND key = ?2;",
            params![self.namespace.as_str(), key, access_count as i64, last_accessed],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> CacheStoreResult<()> {
        self.conn.execute(
            "DELETE FROM cache_entries WHERE namespace = ?1 AND key = ?2;",
            params![self.namespace.as_str(), key],
        )?;
        Ok(())
    }

    fn clear(&self) -> CacheStoreResult<()> {
        self.conn.execute(
            "DELETE FROM cache_entries WHERE namespace = ?1;",
            [self.namespace.as_str()],
        )?;
        Ok(())
    }
}
