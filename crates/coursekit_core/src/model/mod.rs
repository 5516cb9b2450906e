//! Domain model for course content and per-user annotations.
//!
//! # Responsibility
//! - Define canonical data structures shared by content rendering, hierarchy
//!   utilities and persistence.
//!
//! # Invariants
//! - Every record is identified by a stable uuid.
//! - Highlight offsets are character positions into a topic's plain text.

pub mod bookmark;
pub mod highlight;
pub mod question;
pub mod topic;

/// Opaque user identifier issued by the external auth provider.
pub type UserId = String;

/// Current wall-clock time as Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
