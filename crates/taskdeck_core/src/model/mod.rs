//! Domain model for the task dashboard core.
//!
//! # Responsibility
//! - Define canonical records for users, tasks, comments and notifications.
//! - Own the entity-level invariants and the mutation methods enforcing them.
//!
//! # Invariants
//! - Every record is identified by a stable, non-blank string id.
//! - Timestamps are Unix epoch milliseconds stamped by a `Clock`.
//! - `Task::updated_at >= Task::created_at` at all times.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod notification;
pub mod task;
pub mod user;

/// Stable user identifier (`user-1`, ...).
pub type UserId = String;
/// Stable task identifier.
pub type TaskId = String;
/// Stable comment identifier.
pub type CommentId = String;
/// Stable notification identifier.
pub type NotificationId = String;

/// Entity family used in not-found diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Task,
    Comment,
    Notification,
}

impl EntityKind {
    /// Stable lowercase name used in messages and log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Task => "task",
            Self::Comment => "comment",
            Self::Notification => "notification",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Malformed input rejected before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// An id field is empty or whitespace-only.
    BlankId(&'static str),
    /// Task title is empty or whitespace-only.
    BlankTitle,
    /// Comment content is empty or whitespace-only.
    BlankCommentContent,
    /// User display name is empty or whitespace-only.
    BlankUserName,
    /// Email does not look like `local@domain.tld`.
    InvalidEmail(String),
    /// A label is empty or whitespace-only.
    BlankLabel,
    /// The same user id appears twice in an assignee list.
    DuplicateAssignee(UserId),
    /// `updated_at` earlier than `created_at`.
    UpdatedBeforeCreated { created_at: i64, updated_at: i64 },
    /// Comment stored under a task it does not belong to.
    CommentTaskMismatch {
        comment_id: CommentId,
        task_id: TaskId,
    },
    /// Referenced user (creator, assignee, author, recipient) does not exist.
    UnknownUser(UserId),
    /// Attempt to change a field that is fixed at creation.
    ImmutableField(&'static str),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankId(field) => write!(f, "{field} must not be blank"),
            Self::BlankTitle => write!(f, "task title must not be blank"),
            Self::BlankCommentContent => write!(f, "comment content must not be blank"),
            Self::BlankUserName => write!(f, "user name must not be blank"),
            Self::InvalidEmail(value) => write!(f, "invalid email address: `{value}`"),
            Self::BlankLabel => write!(f, "task labels must not be blank"),
            Self::DuplicateAssignee(id) => write!(f, "assignee listed more than once: {id}"),
            Self::UpdatedBeforeCreated {
                created_at,
                updated_at,
            } => write!(
                f,
                "updated_at ({updated_at}) must not be earlier than created_at ({created_at})"
            ),
            Self::CommentTaskMismatch {
                comment_id,
                task_id,
            } => write!(f, "comment {comment_id} does not belong to task {task_id}"),
            Self::UnknownUser(id) => write!(f, "referenced user does not exist: {id}"),
            Self::ImmutableField(field) => write!(f, "{field} cannot be changed after creation"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn ensure_id(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankId(field));
    }
    Ok(())
}

/// Builds a fresh core-generated id such as `comment-<uuid>`.
pub(crate) fn generate_id(kind: EntityKind) -> String {
    format!("{}-{}", kind.as_str(), uuid::Uuid::new_v4())
}
