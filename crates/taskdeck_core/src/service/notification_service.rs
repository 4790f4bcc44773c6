//! Notification aggregation use-cases.
//!
//! # Responsibility
//! - Derive per-user unread counts for the header badge.
//! - Turn task events into per-recipient notifications.
//! - Apply read transitions.
//!
//! # Invariants
//! - The actor who caused an event never receives a notification for it.
//! - Emission is best-effort: a failed recipient is logged and skipped, and
//!   emission never reports failure to the triggering operation.
//! - `mark_read` is idempotent.

use crate::clock::Clock;
use crate::model::notification::{Notification, NotificationKind};
use crate::model::task::TaskStatus;
use crate::model::{CommentId, EntityKind, TaskId, UserId};
use crate::repo::entity_store::{EntityStore, StoreError, StoreResult};
use log::{debug, info, warn};
use std::sync::Arc;

/// Domain event that may fan out into notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    CommentAdded {
        task_id: TaskId,
        actor_id: UserId,
        comment_id: CommentId,
    },
    StatusChanged {
        task_id: TaskId,
        actor_id: UserId,
        from: TaskStatus,
        to: TaskStatus,
    },
    /// `assignee_ids` are only the users newly attached to the task.
    TaskAssigned {
        task_id: TaskId,
        actor_id: UserId,
        assignee_ids: Vec<UserId>,
    },
}

impl TaskEvent {
    pub fn task_id(&self) -> &str {
        match self {
            Self::CommentAdded { task_id, .. }
            | Self::StatusChanged { task_id, .. }
            | Self::TaskAssigned { task_id, .. } => task_id,
        }
    }

    pub fn actor_id(&self) -> &str {
        match self {
            Self::CommentAdded { actor_id, .. }
            | Self::StatusChanged { actor_id, .. }
            | Self::TaskAssigned { actor_id, .. } => actor_id,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::CommentAdded { .. } => "comment_added",
            Self::StatusChanged { .. } => "status_changed",
            Self::TaskAssigned { .. } => "task_assigned",
        }
    }
}

/// Notification facade over an entity store.
pub struct NotificationService<R: EntityStore> {
    store: R,
    clock: Arc<dyn Clock>,
}

impl<R: EntityStore> NotificationService<R> {
    pub fn new(store: R, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Number of unread notifications targeting `user_id`.
    pub fn compute_unread_count(&self, user_id: &str) -> usize {
        self.store.unread_count(user_id)
    }

    /// Notifications for one user in creation order.
    pub fn list_for_user(&self, user_id: &str, unread_only: bool) -> Vec<Notification> {
        self.store.list_notifications(user_id, unread_only)
    }

    /// Marks one notification read. Already-read notifications succeed
    /// without change.
    pub fn mark_read(&self, notification_id: &str) -> StoreResult<Notification> {
        let changed = self.store.mark_notification_read(notification_id)?;
        debug!(
            "event=notification_mark_read module=notifications status=ok notification_id={} changed={}",
            notification_id, changed
        );
        self.store
            .get_notification(notification_id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Notification, notification_id))
    }

    /// Marks every unread notification of `user_id` read and returns how many
    /// flipped.
    pub fn mark_all_read(&self, user_id: &str) -> usize {
        let mut flipped = 0;
        for notification in self.store.list_notifications(user_id, true) {
            match self.store.mark_notification_read(&notification.id) {
                Ok(true) => flipped += 1,
                Ok(false) => {}
                Err(err) => warn!(
                    "event=notification_mark_read module=notifications status=error notification_id={} error={}",
                    notification.id, err
                ),
            }
        }
        info!(
            "event=notification_mark_all_read module=notifications status=ok user_id={} flipped={}",
            user_id, flipped
        );
        flipped
    }

    /// Creates unread notifications for every user affected by `event`,
    /// excluding the actor, and returns the ones actually stored.
    pub fn emit(&self, event: &TaskEvent) -> Vec<Notification> {
        let Some(task) = self.store.get_task(event.task_id()) else {
            warn!(
                "event=notification_emit module=notifications status=skipped trigger={} task_id={} reason=task_missing",
                event.name(),
                event.task_id()
            );
            return Vec::new();
        };

        let (kind, recipients, message) = match event {
            TaskEvent::CommentAdded { .. } => (
                NotificationKind::CommentAdded,
                task.stakeholders(),
                format!("New comment on \"{}\"", task.title),
            ),
            TaskEvent::StatusChanged { from, to, .. } => {
                if *to != TaskStatus::Done || *from == TaskStatus::Done {
                    return Vec::new();
                }
                (
                    NotificationKind::TaskCompleted,
                    task.stakeholders(),
                    format!("\"{}\" was marked as done", task.title),
                )
            }
            TaskEvent::TaskAssigned { assignee_ids, .. } => (
                NotificationKind::TaskAssigned,
                assignee_ids.clone(),
                format!("You were assigned to \"{}\"", task.title),
            ),
        };

        let now = self.clock.now_ms();
        let mut created = Vec::new();
        for recipient in recipients
            .into_iter()
            .filter(|recipient| recipient != event.actor_id())
        {
            let notification = Notification::new(
                recipient,
                Some(task.id.clone()),
                kind,
                message.clone(),
                now,
            );
            match self.store.put_notification(notification.clone()) {
                Ok(()) => created.push(notification),
                Err(err) => warn!(
                    "event=notification_emit module=notifications status=skipped trigger={} task_id={} user_id={} error={}",
                    event.name(),
                    task.id,
                    notification.target_user_id,
                    err
                ),
            }
        }

        info!(
            "event=notification_emit module=notifications status=ok trigger={} task_id={} created={}",
            event.name(),
            task.id,
            created.len()
        );
        created
    }
}
