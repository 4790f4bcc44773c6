//! Notification domain model.

use crate::model::{ensure_id, generate_id, EntityKind, NotificationId, TaskId, UserId, ValidationError};
use serde::{Deserialize, Serialize};

/// Domain event family a notification was emitted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    CommentAdded,
    TaskCompleted,
    TaskAssigned,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CommentAdded => "comment_added",
            Self::TaskCompleted => "task_completed",
            Self::TaskAssigned => "task_assigned",
        }
    }
}

/// Per-user signal with read/unread state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "userId")]
    pub target_user_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    pub kind: NotificationKind,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub read: bool,
    pub created_at: i64,
}

impl Notification {
    /// Creates an unread notification with a generated id.
    pub fn new(
        target_user_id: impl Into<UserId>,
        task_id: Option<TaskId>,
        kind: NotificationKind,
        message: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: generate_id(EntityKind::Notification),
            target_user_id: target_user_id.into(),
            task_id,
            kind,
            message: message.into(),
            read: false,
            created_at,
        }
    }

    /// Flips the read flag. Returns `true` when the state changed.
    pub fn mark_read(&mut self) -> bool {
        let changed = !self.read;
        self.read = true;
        changed
    }

    pub fn is_unread_for(&self, user_id: &str) -> bool {
        !self.read && self.target_user_id == user_id
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_id(&self.id, "notification id")?;
        ensure_id(&self.target_user_id, "notification target user id")?;
        if let Some(task_id) = &self.task_id {
            ensure_id(task_id, "notification task id")?;
        }
        Ok(())
    }
}
