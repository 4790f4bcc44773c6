//! Task lifecycle use-cases.
//!
//! # Responsibility
//! - Validate and apply status changes, edits, comments and deletions.
//! - Stamp `updated_at` from the injected clock while holding the store's
//!   write lock.
//! - Fire notification events after a mutation has been committed.
//!
//! # Invariants
//! - Every operation fully applies or fully fails; a rejected call leaves
//!   the task (including `updated_at`) untouched.
//! - The status graph is open: any state may move to any other state.
//! - Notification emission never turns a committed mutation into an error.

use crate::clock::Clock;
use crate::model::task::{Comment, Task, TaskPatch, TaskPriority, TaskStatus};
use crate::model::{generate_id, EntityKind, UserId, ValidationError};
use crate::repo::entity_store::{EntityStore, StoreError, StoreResult};
use crate::service::notification_service::{NotificationService, TaskEvent};
use log::{debug, info, warn};
use std::sync::Arc;

/// Request model for creating a task on behalf of an actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    /// Defaults to `todo`.
    pub status: Option<TaskStatus>,
    pub priority: TaskPriority,
    pub due_date: Option<i64>,
    pub assignee_ids: Vec<UserId>,
    pub labels: Vec<String>,
}

impl NewTask {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            status: None,
            priority: TaskPriority::Medium,
            due_date: None,
            assignee_ids: Vec::new(),
            labels: Vec::new(),
        }
    }
}

/// Lifecycle manager over a shared entity store.
pub struct TaskService<R: EntityStore + Clone> {
    store: R,
    clock: Arc<dyn Clock>,
    notifications: NotificationService<R>,
}

impl<R: EntityStore + Clone> TaskService<R> {
    pub fn new(store: R, clock: Arc<dyn Clock>) -> Self {
        let notifications = NotificationService::new(store.clone(), Arc::clone(&clock));
        Self {
            store,
            clock,
            notifications,
        }
    }

    /// Notification facade sharing this service's store and clock.
    pub fn notifications(&self) -> &NotificationService<R> {
        &self.notifications
    }

    /// Looks one task up, mapping absence to `NotFound`.
    pub fn get_task(&self, task_id: &str) -> StoreResult<Task> {
        self.store
            .get_task(task_id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Task, task_id))
    }

    /// Creates a task owned by `actor_id` and notifies initial assignees.
    pub fn create_task(&self, actor_id: &str, request: NewTask) -> StoreResult<Task> {
        let now = self.clock.now_ms();
        let mut task = Task::new(
            generate_id(EntityKind::Task),
            request.title,
            actor_id,
            now,
        );
        task.description = request.description;
        task.status = request.status.unwrap_or(TaskStatus::Todo);
        task.priority = request.priority;
        task.due_date = request.due_date;
        task.assignee_ids = request.assignee_ids;
        task.labels = request.labels;

        if let Err(err) = self.store.put_task(task.clone()) {
            warn!(
                "event=task_create module=lifecycle status=error actor_id={} error={}",
                actor_id, err
            );
            return Err(err);
        }
        info!(
            "event=task_create module=lifecycle status=ok task_id={} actor_id={} assignees={}",
            task.id,
            actor_id,
            task.assignee_ids.len()
        );

        if !task.assignee_ids.is_empty() {
            self.notifications.emit(&TaskEvent::TaskAssigned {
                task_id: task.id.clone(),
                actor_id: actor_id.to_string(),
                assignee_ids: task.assignee_ids.clone(),
            });
        }
        Ok(task)
    }

    /// Moves a task to `new_status`. Any transition is accepted.
    pub fn change_status(
        &self,
        actor_id: &str,
        task_id: &str,
        new_status: TaskStatus,
    ) -> StoreResult<Task> {
        let mut previous = new_status;
        let task = self
            .store
            .update_task(task_id, &mut |task: &mut Task| {
                previous = task.set_status(new_status, self.clock.now_ms());
                Ok(())
            })
            .inspect_err(|err| {
                warn!(
                    "event=task_status_change module=lifecycle status=error task_id={} error={}",
                    task_id, err
                )
            })?;

        info!(
            "event=task_status_change module=lifecycle status=ok task_id={} actor_id={} from={} to={}",
            task_id, actor_id, previous, new_status
        );
        self.notifications.emit(&TaskEvent::StatusChanged {
            task_id: task.id.clone(),
            actor_id: actor_id.to_string(),
            from: previous,
            to: new_status,
        });
        Ok(task)
    }

    /// Appends a comment by `author_id` and notifies the task's stakeholders.
    ///
    /// Blank content fails with `Validation` before any lookup; a missing
    /// task or author fails with `NotFound`.
    pub fn add_comment(
        &self,
        author_id: &str,
        task_id: &str,
        content: &str,
    ) -> StoreResult<Comment> {
        if content.trim().is_empty() {
            return Err(ValidationError::BlankCommentContent.into());
        }
        if self.store.get_task(task_id).is_none() {
            return Err(StoreError::not_found(EntityKind::Task, task_id));
        }
        if self.store.get_user(author_id).is_none() {
            return Err(StoreError::not_found(EntityKind::User, author_id));
        }

        // Stamped under the store lock so thread order and timestamp order agree.
        let mut comment = Comment::new(task_id, author_id, content, 0);
        let task = self
            .store
            .update_task(task_id, &mut |task: &mut Task| {
                comment.created_at = self.clock.now_ms();
                task.push_comment(comment.clone())
            })
            .inspect_err(|err| {
                warn!(
                    "event=comment_add module=lifecycle status=error task_id={} error={}",
                    task_id, err
                )
            })?;

        info!(
            "event=comment_add module=lifecycle status=ok task_id={} comment_id={} author_id={} comments={}",
            task_id,
            comment.id,
            author_id,
            task.comments.len()
        );
        self.notifications.emit(&TaskEvent::CommentAdded {
            task_id: task_id.to_string(),
            actor_id: author_id.to_string(),
            comment_id: comment.id.clone(),
        });
        Ok(comment)
    }

    /// Removes a task and its comments. A second call fails with `NotFound`.
    pub fn delete_task(&self, task_id: &str) -> StoreResult<Task> {
        let removed = self.store.remove_task(task_id).inspect_err(|err| {
            warn!(
                "event=task_delete module=lifecycle status=error task_id={} error={}",
                task_id, err
            )
        })?;
        info!(
            "event=task_delete module=lifecycle status=ok task_id={} comments={}",
            task_id,
            removed.comments.len()
        );
        Ok(removed)
    }

    /// Applies a partial update. Assignee ids must resolve to existing users.
    /// An empty patch leaves the task untouched.
    pub fn edit_task(&self, actor_id: &str, task_id: &str, patch: &TaskPatch) -> StoreResult<Task> {
        if patch.is_empty() {
            debug!(
                "event=task_edit module=lifecycle status=skipped task_id={} reason=empty_patch",
                task_id
            );
            return self
                .store
                .get_task(task_id)
                .ok_or_else(|| StoreError::not_found(EntityKind::Task, task_id));
        }
        let mut added = Vec::new();
        let task = self
            .store
            .update_task(task_id, &mut |task: &mut Task| {
                added = task.apply_patch(patch, self.clock.now_ms());
                Ok(())
            })
            .inspect_err(|err| {
                warn!(
                    "event=task_edit module=lifecycle status=error task_id={} error={}",
                    task_id, err
                )
            })?;

        info!(
            "event=task_edit module=lifecycle status=ok task_id={} actor_id={} new_assignees={}",
            task_id,
            actor_id,
            added.len()
        );
        if !added.is_empty() {
            self.notifications.emit(&TaskEvent::TaskAssigned {
                task_id: task.id.clone(),
                actor_id: actor_id.to_string(),
                assignee_ids: added,
            });
        }
        Ok(task)
    }
}
