//! Domain core for the task dashboard.
//! This crate is the single source of truth for task lifecycle rules,
//! user reference resolution and notification counts.

pub mod clock;
pub mod config;
pub mod logging;
pub mod model;
pub mod repo;
pub mod seed;
pub mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CoreConfig;
pub use logging::{default_log_level, init_from_config, init_logging, logging_status};
pub use model::notification::{Notification, NotificationKind};
pub use model::task::{Comment, Task, TaskPatch, TaskPriority, TaskStatus};
pub use model::user::{User, UserRole};
pub use model::{EntityKind, ValidationError};
pub use repo::entity_store::{
    EntityStore, InMemoryEntityStore, StoreError, StoreResult, TaskListQuery,
};
pub use seed::{demo_seed, load_seed, load_seed_file, SeedData, SeedError, SeedSummary};
pub use service::assignment_resolver::{AssignmentResolver, CommentView, TaskView};
pub use service::notification_service::{NotificationService, TaskEvent};
pub use service::task_service::{NewTask, TaskService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
