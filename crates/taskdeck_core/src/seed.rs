//! Seed/import of the entity store.
//!
//! # Responsibility
//! - Parse JSON seed snapshots (users, tasks with comments, notifications).
//! - Load them into a store in dependency order.
//! - Provide the built-in demo dashboard dataset.
//!
//! # Invariants
//! - Users load before tasks, tasks before notifications, so every reference
//!   is checked against records already present.
//! - Loading stops at the first rejected record; earlier records stay loaded.

use crate::model::notification::{Notification, NotificationKind};
use crate::model::task::{Comment, Task, TaskPriority, TaskStatus};
use crate::model::user::{User, UserRole};
use crate::model::EntityKind;
use crate::repo::entity_store::{EntityStore, StoreError};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;
const HOUR_MS: i64 = 60 * 60 * 1000;

/// Snapshot shape accepted by the seed loader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedData {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
}

impl SeedData {
    pub fn from_json_str(source: &str) -> Result<Self, SeedError> {
        serde_json::from_str(source).map_err(SeedError::Parse)
    }
}

/// Counts of records loaded by one seed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub tasks: usize,
    pub comments: usize,
    pub notifications: usize,
}

#[derive(Debug)]
pub enum SeedError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(serde_json::Error),
    /// One record was rejected by the store.
    Record {
        kind: EntityKind,
        id: String,
        source: StoreError,
    },
}

impl Display for SeedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read seed file `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid seed JSON: {err}"),
            Self::Record { kind, id, source } => {
                write!(f, "seed {kind} `{id}` rejected: {source}")
            }
        }
    }
}

impl Error for SeedError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Record { source, .. } => Some(source),
        }
    }
}

/// Loads `seed` into `store`.
pub fn load_seed<S: EntityStore + ?Sized>(store: &S, seed: &SeedData) -> Result<SeedSummary, SeedError> {
    let mut summary = SeedSummary::default();

    for user in &seed.users {
        store
            .put_user(user.clone())
            .map_err(|source| reject(EntityKind::User, &user.id, source))?;
        summary.users += 1;
    }
    for task in &seed.tasks {
        store
            .put_task(task.clone())
            .map_err(|source| reject(EntityKind::Task, &task.id, source))?;
        summary.tasks += 1;
        summary.comments += task.comments.len();
    }
    for notification in &seed.notifications {
        store
            .put_notification(notification.clone())
            .map_err(|source| reject(EntityKind::Notification, &notification.id, source))?;
        summary.notifications += 1;
    }

    info!(
        "event=seed_load module=seed status=ok users={} tasks={} comments={} notifications={}",
        summary.users, summary.tasks, summary.comments, summary.notifications
    );
    Ok(summary)
}

/// Reads a JSON seed file and loads it into `store`.
pub fn load_seed_file<S: EntityStore + ?Sized>(
    store: &S,
    path: impl AsRef<Path>,
) -> Result<SeedSummary, SeedError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let seed = SeedData::from_json_str(&source)?;
    load_seed(store, &seed)
}

fn reject(kind: EntityKind, id: &str, source: StoreError) -> SeedError {
    error!(
        "event=seed_load module=seed status=error kind={} id={} error={}",
        kind, id, source
    );
    SeedError::Record {
        kind,
        id: id.to_string(),
        source,
    }
}

/// Built-in dashboard dataset anchored at `now_ms`.
pub fn demo_seed(now_ms: i64) -> SeedData {
    let mut john = User::new("user-1", "John Doe", "john@example.com", UserRole::Admin);
    john.avatar = Some("/avatars/john.png".to_string());
    let jane = User::new("user-2", "Jane Smith", "jane@example.com", UserRole::Manager);
    let mike = User::new("user-3", "Mike Johnson", "mike@example.com", UserRole::User);

    let mut homepage = Task::new("task-1", "Redesign homepage", "user-1", now_ms - 10 * DAY_MS);
    homepage.description = "Refresh the landing page layout and hero section.".to_string();
    homepage.status = TaskStatus::InProgress;
    homepage.priority = TaskPriority::High;
    homepage.due_date = Some(now_ms + 5 * DAY_MS);
    homepage.assignee_ids = vec!["user-2".to_string(), "user-3".to_string()];
    homepage.labels = vec!["design".to_string(), "frontend".to_string()];
    homepage.comments = vec![
        demo_comment("comment-1", "task-1", "user-2", "Mockups are in the shared folder.", now_ms - 8 * DAY_MS),
        demo_comment("comment-2", "task-1", "user-1", "Looks great, go ahead.", now_ms - 7 * DAY_MS),
    ];
    homepage.updated_at = now_ms - 7 * DAY_MS;

    let mut auth = Task::new("task-2", "Fix login redirect", "user-2", now_ms - 6 * DAY_MS);
    auth.description = "Users land on a blank page after signing in.".to_string();
    auth.priority = TaskPriority::Urgent;
    auth.due_date = Some(now_ms + DAY_MS);
    auth.assignee_ids = vec!["user-1".to_string()];
    auth.labels = vec!["bug".to_string()];
    auth.updated_at = now_ms - 6 * DAY_MS;

    let mut docs = Task::new("task-3", "Write API documentation", "user-1", now_ms - 20 * DAY_MS);
    docs.status = TaskStatus::Done;
    docs.priority = TaskPriority::Low;
    docs.due_date = Some(now_ms - 2 * DAY_MS);
    docs.assignee_ids = vec!["user-3".to_string()];
    docs.labels = vec!["docs".to_string()];
    docs.updated_at = now_ms - 3 * DAY_MS;

    let mut backlog = Task::new("task-4", "Evaluate charting library", "user-3", now_ms - 2 * DAY_MS);
    backlog.status = TaskStatus::Backlog;
    backlog.updated_at = now_ms - 2 * DAY_MS;

    let notifications = vec![
        demo_notification(
            "notification-1",
            "user-1",
            "task-2",
            NotificationKind::TaskAssigned,
            "You were assigned to \"Fix login redirect\"",
            false,
            now_ms - 6 * DAY_MS,
        ),
        demo_notification(
            "notification-2",
            "user-1",
            "task-1",
            NotificationKind::CommentAdded,
            "New comment on \"Redesign homepage\"",
            false,
            now_ms - 8 * DAY_MS,
        ),
        demo_notification(
            "notification-3",
            "user-1",
            "task-3",
            NotificationKind::TaskCompleted,
            "\"Write API documentation\" was marked as done",
            true,
            now_ms - 3 * DAY_MS + HOUR_MS,
        ),
        demo_notification(
            "notification-4",
            "user-2",
            "task-1",
            NotificationKind::CommentAdded,
            "New comment on \"Redesign homepage\"",
            false,
            now_ms - 7 * DAY_MS,
        ),
    ];

    SeedData {
        users: vec![john, jane, mike],
        tasks: vec![homepage, auth, docs, backlog],
        notifications,
    }
}

fn demo_comment(id: &str, task_id: &str, author_id: &str, content: &str, created_at: i64) -> Comment {
    Comment {
        id: id.to_string(),
        task_id: task_id.to_string(),
        author_id: author_id.to_string(),
        content: content.to_string(),
        created_at,
    }
}

fn demo_notification(
    id: &str,
    user_id: &str,
    task_id: &str,
    kind: NotificationKind,
    message: &str,
    read: bool,
    created_at: i64,
) -> Notification {
    Notification {
        id: id.to_string(),
        target_user_id: user_id.to_string(),
        task_id: Some(task_id.to_string()),
        kind,
        message: message.to_string(),
        read,
        created_at,
    }
}
