//! Explicitly constructed core context.
//!
//! # Responsibility
//! - Build logging, the migrated database and named caches from one
//!   [`CoreConfig`].
//! - Hand out repository-backed services borrowing its connection.
//!
//! # Invariants
//! - One context owns one connection for its whole lifetime.
//! - Cache persistence failures degrade to memory-only caches.

use crate::cache::store::SqliteCacheStore;
use crate::cache::LruCache;
use crate::config::{ConfigError, CoreConfig};
use crate::db::{open_db, open_db_in_memory, DbError};
use crate::logging::{init_logging, LoggingError};
use crate::repo::bookmark_repo::SqliteBookmarkRepository;
use crate::repo::highlight_repo::SqliteHighlightRepository;
use crate::repo::topic_repo::SqliteTopicRepository;
use crate::repo::RepoError;
use crate::service::bookmark_service::BookmarkService;
use crate::service::highlight_service::HighlightService;
use crate::service::topic_service::TopicService;
use log::{info, warn};
use rusqlite::Connection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ContextResult<T> = Result<T, ContextError>;

/// Context bootstrap failure.
#[derive(Debug)]
pub enum ContextError {
    Config(ConfigError),
    Logging(LoggingError),
    Db(DbError),
    Repo(RepoError),
}

impl Display for ContextError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ContextError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ConfigError> for ContextError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<LoggingError> for ContextError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<DbError> for ContextError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for ContextError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Process-level service object built once from configuration.
pub struct CoreContext {
    config: CoreConfig,
    conn: Connection,
}

impl CoreContext {
    /// Validates `config`, starts logging when `log_dir` is set and opens
    /// the database.
    pub fn open(config: CoreConfig) -> ContextResult<Self> {
        config.validate()?;
        if let Some(log_dir) = &config.log_dir {
            init_logging(config.log_level()?, &log_dir.to_string_lossy())?;
        }

        let conn = match &config.database_path {
            Some(path) => open_db(path)?,
            None => open_db_in_memory()?,
        };
        info!(
            "event=context_open module=context status=ok persistent_db={} cache_persist={}",
            config.database_path.is_some(),
            config.cache.persist
        );
        Ok(Self { config, conn })
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn topic_service(&self) -> ContextResult<TopicService<SqliteTopicRepository<'_>>> {
        Ok(TopicService::new(SqliteTopicRepository::try_new(&self.conn)?))
    }

    pub fn highlight_service(
        &self,
    ) -> ContextResult<HighlightService<SqliteHighlightRepository<'_>>> {
        Ok(HighlightService::new(SqliteHighlightRepository::try_new(
            &self.conn,
        )?))
    }

    pub fn bookmark_service(&self) -> ContextResult<BookmarkService<SqliteBookmarkRepository<'_>>> {
        Ok(BookmarkService::new(SqliteBookmarkRepository::try_new(
            &self.conn,
        )?))
    }

    /// Builds cache `name` with configured bounds.
    ///
    /// With `cache.persist` and a database file, the cache mirrors into that
    /// file and is restored from it. A store that cannot be opened leaves the
    /// cache memory-only.
    pub fn new_cache<V>(&self, name: &str) -> LruCache<V>
    where
        V: Serialize + DeserializeOwned,
    {
        let cache = LruCache::new(name, self.config.cache.options());
        if !self.config.cache.persist {
            return cache;
        }
        let Some(path) = &self.config.database_path else {
            return cache;
        };

        match SqliteCacheStore::open(path, name) {
            Ok(store) => {
                let mut cache = cache.with_store(Box::new(store));
                cache.restore();
                cache
            }
            Err(err) => {
                warn!(
                    "event=cache_store_open module=context status=error cache={} error={}",
                    name, err
                );
                cache
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CoreContext;
    use crate::config::CoreConfig;

    #[test]
    fn default_config_opens_in_memory_context() {
        let context = CoreContext::open(CoreConfig::default()).expect("context opens");
        let topics = context.topic_service().expect("topic service");
        let root = topics
            .create_topic(None, "Intro", "## Intro")
            .expect("topic created");
        let tree = topics.load_tree("user-1").expect("tree loads");
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].id, root.id);
    }

    #[test]
    fn memory_context_builds_memory_only_cache() {
        let context = CoreContext::open(CoreConfig::default()).expect("context opens");
        let mut cache = context.new_cache::<String>("topics");
        cache.set("a", "value".to_string());
        assert_eq!(cache.get("a").map(String::as_str), Some("value"));
        assert_eq!(cache.options().max_size, 100);
    }
}
