//! Core content engine for coursekit.
//!
//! Formatting, highlight placement, selection capture, topic hierarchy,
//! caching and sanitizing live here, together with the SQLite persistence
//! that backs topics, highlights and bookmarks.

pub mod cache;
pub mod config;
pub mod content;
pub mod context;
pub mod db;
pub mod hierarchy;
pub mod logging;
pub mod model;
pub mod offload;
pub mod quiz;
pub mod repo;
pub mod service;

pub use cache::store::{CacheStore, CacheStoreError, SqliteCacheStore};
pub use cache::{CacheOptions, Clock, LruCache, ManualClock, SystemClock};
pub use config::{CacheConfig, ConfigError, CoreConfig};
pub use content::formatter::{format_content, to_plain_text};
pub use content::highlight::{apply_highlights, render_with_highlights, HighlightedHtml};
pub use content::sanitizer::{sanitize, validate, ValidationReport};
pub use content::selection::{capture_selection, SelectionCapture, SelectionOutcome};
pub use context::{ContextError, CoreContext};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::bookmark::Bookmark;
pub use model::highlight::{Highlight, HighlightId, HighlightRange};
pub use model::question::{Difficulty, Question};
pub use model::topic::{Topic, TopicId, TopicPatch};
pub use repo::{RepoError, RepoResult};
pub use service::bookmark_service::BookmarkService;
pub use service::highlight_service::HighlightService;
pub use service::topic_service::TopicService;

/// Minimal health-check API for smoke probes.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
