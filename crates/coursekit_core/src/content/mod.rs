//! Topic content pipeline: light markup -> HTML -> highlighted HTML.
//!
//! # Responsibility
//! - Format line-prefixed topic text into HTML fragments.
//! - Overlay stored highlights onto formatted HTML.
//! - Resolve user selections back to plain-text offsets.
//! - Sanitize and validate HTML fragments before display or save.
//!
//! # Invariants
//! - Formatter output is the exact shape highlight matching depends on.
//! - Sanitizer is never applied implicitly to formatter output.

pub mod formatter;
pub mod highlight;
pub mod sanitizer;
pub mod selection;
