//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate entity store calls into use-case level APIs.
//! - Keep presentation callers decoupled from locking and indexing details.

pub mod assignment_resolver;
pub mod notification_service;
pub mod task_service;
