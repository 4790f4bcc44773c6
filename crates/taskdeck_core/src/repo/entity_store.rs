//! Entity store contracts and the in-memory implementation.
//!
//! # Responsibility
//! - Hold the authoritative users, tasks (with comments) and notifications.
//! - Enforce referential validity on every write.
//!
//! # Invariants
//! - Write paths validate the entity and its user references before any
//!   mutation; a failed write leaves the store untouched.
//! - All writers are serialized behind one lock; readers never observe a
//!   half-applied operation.
//! - Task listing follows insertion order; upserts keep the original slot.
//! - `unread_by_user` always equals the number of unread notifications per
//!   target user.

use crate::model::notification::Notification;
use crate::model::task::{Comment, Task, TaskPriority, TaskStatus};
use crate::model::user::User;
use crate::model::{EntityKind, NotificationId, TaskId, UserId, ValidationError};
use log::debug;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

pub type StoreResult<T> = Result<T, StoreError>;

/// Store and use-case error taxonomy surfaced to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Referenced id does not exist.
    NotFound { kind: EntityKind, id: String },
    /// Input rejected; nothing was applied.
    Validation(ValidationError),
}

impl StoreError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, id } => write!(f, "{kind} not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound { .. } => None,
            Self::Validation(err) => Some(err),
        }
    }
}

impl From<ValidationError> for StoreError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Field filter for task listings. Empty query matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListQuery {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee_id: Option<UserId>,
    pub creator_id: Option<UserId>,
    pub label: Option<String>,
}

impl TaskListQuery {
    pub fn matches(&self, task: &Task) -> bool {
        self.status.map_or(true, |status| task.status == status)
            && self.priority.map_or(true, |priority| task.priority == priority)
            && self
                .assignee_id
                .as_deref()
                .map_or(true, |id| task.is_assigned_to(id))
            && self
                .creator_id
                .as_deref()
                .map_or(true, |id| task.creator_id == id)
            && self
                .label
                .as_deref()
                .map_or(true, |label| task.labels.iter().any(|value| value == label))
    }
}

/// Mutation applied to a working copy of one task inside `update_task`.
pub type TaskMutator<'a> = dyn FnMut(&mut Task) -> Result<(), ValidationError> + 'a;

/// Storage contract shared by the lifecycle, resolver and notification
/// services. Implementations must be safe to share across threads.
pub trait EntityStore: Send + Sync {
    fn put_user(&self, user: User) -> StoreResult<()>;
    fn get_user(&self, id: &str) -> Option<User>;
    fn list_users(&self) -> Vec<User>;

    fn get_task(&self, id: &str) -> Option<Task>;
    fn list_tasks(&self, query: &TaskListQuery) -> Vec<Task>;
    fn list_tasks_matching(&self, predicate: &dyn Fn(&Task) -> bool) -> Vec<Task>;
    /// Upsert by id. Creator and assignees must resolve to existing users.
    fn put_task(&self, task: Task) -> StoreResult<()>;
    /// Runs `mutator` on a copy of the task and commits it only when the
    /// mutator and the re-validation both succeed.
    fn update_task(&self, id: &str, mutator: &mut TaskMutator<'_>) -> StoreResult<Task>;
    /// Removes the task together with its comments.
    fn remove_task(&self, id: &str) -> StoreResult<Task>;
    fn append_comment(&self, task_id: &str, comment: Comment) -> StoreResult<Task>;

    fn put_notification(&self, notification: Notification) -> StoreResult<()>;
    fn get_notification(&self, id: &str) -> Option<Notification>;
    fn list_notifications(&self, user_id: &str, unread_only: bool) -> Vec<Notification>;
    /// Returns `true` when the flag flipped, `false` when already read.
    fn mark_notification_read(&self, id: &str) -> StoreResult<bool>;
    fn unread_count(&self, user_id: &str) -> usize;
}

impl<S: EntityStore + ?Sized> EntityStore for Arc<S> {
    fn put_user(&self, user: User) -> StoreResult<()> {
        (**self).put_user(user)
    }

    fn get_user(&self, id: &str) -> Option<User> {
        (**self).get_user(id)
    }

    fn list_users(&self) -> Vec<User> {
        (**self).list_users()
    }

    fn get_task(&self, id: &str) -> Option<Task> {
        (**self).get_task(id)
    }

    fn list_tasks(&self, query: &TaskListQuery) -> Vec<Task> {
        (**self).list_tasks(query)
    }

    fn list_tasks_matching(&self, predicate: &dyn Fn(&Task) -> bool) -> Vec<Task> {
        (**self).list_tasks_matching(predicate)
    }

    fn put_task(&self, task: Task) -> StoreResult<()> {
        (**self).put_task(task)
    }

    fn update_task(&self, id: &str, mutator: &mut TaskMutator<'_>) -> StoreResult<Task> {
        (**self).update_task(id, mutator)
    }

    fn remove_task(&self, id: &str) -> StoreResult<Task> {
        (**self).remove_task(id)
    }

    fn append_comment(&self, task_id: &str, comment: Comment) -> StoreResult<Task> {
        (**self).append_comment(task_id, comment)
    }

    fn put_notification(&self, notification: Notification) -> StoreResult<()> {
        (**self).put_notification(notification)
    }

    fn get_notification(&self, id: &str) -> Option<Notification> {
        (**self).get_notification(id)
    }

    fn list_notifications(&self, user_id: &str, unread_only: bool) -> Vec<Notification> {
        (**self).list_notifications(user_id, unread_only)
    }

    fn mark_notification_read(&self, id: &str) -> StoreResult<bool> {
        (**self).mark_notification_read(id)
    }

    fn unread_count(&self, user_id: &str) -> usize {
        (**self).unread_count(user_id)
    }
}

#[derive(Debug, Default)]
struct StoreState {
    users: HashMap<UserId, User>,
    user_order: Vec<UserId>,
    tasks: HashMap<TaskId, Task>,
    task_order: Vec<TaskId>,
    notifications: Vec<Notification>,
    notification_slots: HashMap<NotificationId, usize>,
    unread_by_user: HashMap<UserId, usize>,
}

impl StoreState {
    fn ensure_user(&self, id: &str) -> Result<(), ValidationError> {
        if self.users.contains_key(id) {
            Ok(())
        } else {
            Err(ValidationError::UnknownUser(id.to_string()))
        }
    }

    fn check_task_refs(&self, task: &Task) -> Result<(), ValidationError> {
        self.ensure_user(&task.creator_id)?;
        for assignee in &task.assignee_ids {
            self.ensure_user(assignee)?;
        }
        Ok(())
    }

    fn adjust_unread(&mut self, user_id: &str, delta: isize) {
        let counter = self.unread_by_user.entry(user_id.to_string()).or_insert(0);
        *counter = counter.saturating_add_signed(delta);
        if *counter == 0 {
            self.unread_by_user.remove(user_id);
        }
    }
}

fn check_immutable(existing: &Task, candidate: &Task) -> Result<(), ValidationError> {
    if existing.id != candidate.id {
        return Err(ValidationError::ImmutableField("task id"));
    }
    if existing.creator_id != candidate.creator_id {
        return Err(ValidationError::ImmutableField("task creator"));
    }
    if existing.created_at != candidate.created_at {
        return Err(ValidationError::ImmutableField("task created_at"));
    }
    // Comment threads are append-only.
    if !candidate.comments.starts_with(&existing.comments) {
        return Err(ValidationError::ImmutableField("task comments"));
    }
    Ok(())
}

/// Process-local store guarded by a single `RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    state: RwLock<StoreState>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience for sharing one store between services.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    // Every write validates before mutating, so a poisoned lock still guards
    // consistent state and can be recovered.
    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EntityStore for InMemoryEntityStore {
    fn put_user(&self, user: User) -> StoreResult<()> {
        user.validate()?;
        let mut state = self.write();
        if !state.users.contains_key(&user.id) {
            state.user_order.push(user.id.clone());
        }
        debug!("event=user_put module=store status=ok user_id={}", user.id);
        state.users.insert(user.id.clone(), user);
        Ok(())
    }

    fn get_user(&self, id: &str) -> Option<User> {
        self.read().users.get(id).cloned()
    }

    fn list_users(&self) -> Vec<User> {
        let state = self.read();
        state
            .user_order
            .iter()
            .filter_map(|id| state.users.get(id).cloned())
            .collect()
    }

    fn get_task(&self, id: &str) -> Option<Task> {
        self.read().tasks.get(id).cloned()
    }

    fn list_tasks(&self, query: &TaskListQuery) -> Vec<Task> {
        self.list_tasks_matching(&|task| query.matches(task))
    }

    fn list_tasks_matching(&self, predicate: &dyn Fn(&Task) -> bool) -> Vec<Task> {
        let state = self.read();
        state
            .task_order
            .iter()
            .filter_map(|id| state.tasks.get(id))
            .filter(|task| predicate(task))
            .cloned()
            .collect()
    }

    fn put_task(&self, task: Task) -> StoreResult<()> {
        task.validate()?;
        let mut state = self.write();
        state.check_task_refs(&task)?;
        let is_new = match state.tasks.get(&task.id) {
            Some(existing) => {
                check_immutable(existing, &task)?;
                false
            }
            None => true,
        };
        if is_new {
            state.task_order.push(task.id.clone());
        }
        debug!(
            "event=task_put module=store status=ok task_id={} comments={}",
            task.id,
            task.comments.len()
        );
        state.tasks.insert(task.id.clone(), task);
        Ok(())
    }

    fn update_task(&self, id: &str, mutator: &mut TaskMutator<'_>) -> StoreResult<Task> {
        let mut state = self.write();
        let existing = state
            .tasks
            .get(id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Task, id))?;

        let mut working = existing.clone();
        mutator(&mut working)?;
        working.validate()?;
        check_immutable(existing, &working)?;
        state.check_task_refs(&working)?;

        state.tasks.insert(working.id.clone(), working.clone());
        Ok(working)
    }

    fn remove_task(&self, id: &str) -> StoreResult<Task> {
        let mut state = self.write();
        let removed = state
            .tasks
            .remove(id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Task, id))?;
        state.task_order.retain(|task_id| task_id != id);
        debug!(
            "event=task_remove module=store status=ok task_id={} comments={}",
            id,
            removed.comments.len()
        );
        Ok(removed)
    }

    fn append_comment(&self, task_id: &str, comment: Comment) -> StoreResult<Task> {
        let mut state = self.write();
        state.ensure_user(&comment.author_id)?;
        let task = state
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Task, task_id))?;
        task.push_comment(comment)?;
        Ok(task.clone())
    }

    fn put_notification(&self, notification: Notification) -> StoreResult<()> {
        notification.validate()?;
        let mut state = self.write();
        state.ensure_user(&notification.target_user_id)?;

        if let Some(&slot) = state.notification_slots.get(&notification.id) {
            let previous = &state.notifications[slot];
            if !previous.read {
                let target = previous.target_user_id.clone();
                state.adjust_unread(&target, -1);
            }
            if !notification.read {
                state.adjust_unread(&notification.target_user_id, 1);
            }
            state.notifications[slot] = notification;
            return Ok(());
        }

        if !notification.read {
            state.adjust_unread(&notification.target_user_id, 1);
        }
        let slot = state.notifications.len();
        state
            .notification_slots
            .insert(notification.id.clone(), slot);
        state.notifications.push(notification);
        Ok(())
    }

    fn get_notification(&self, id: &str) -> Option<Notification> {
        let state = self.read();
        state
            .notification_slots
            .get(id)
            .map(|&slot| state.notifications[slot].clone())
    }

    fn list_notifications(&self, user_id: &str, unread_only: bool) -> Vec<Notification> {
        self.read()
            .notifications
            .iter()
            .filter(|n| {
                if unread_only {
                    n.is_unread_for(user_id)
                } else {
                    n.target_user_id == user_id
                }
            })
            .cloned()
            .collect()
    }

    fn mark_notification_read(&self, id: &str) -> StoreResult<bool> {
        let mut state = self.write();
        let slot = *state
            .notification_slots
            .get(id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Notification, id))?;
        let notification = &mut state.notifications[slot];
        let changed = notification.mark_read();
        if changed {
            let target = notification.target_user_id.clone();
            state.adjust_unread(&target, -1);
        }
        Ok(changed)
    }

    fn unread_count(&self, user_id: &str) -> usize {
        self.read()
            .unread_by_user
            .get(user_id)
            .copied()
            .unwrap_or(0)
    }
}
