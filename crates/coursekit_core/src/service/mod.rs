//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep rendering and UI layers decoupled from storage details.

pub mod bookmark_service;
pub mod highlight_service;
pub mod topic_service;
