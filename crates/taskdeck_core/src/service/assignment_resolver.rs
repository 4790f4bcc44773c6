//! Read-side projection of task user references.
//!
//! # Responsibility
//! - Map assignee and creator ids to user records for rendering.
//! - Build the task detail view.
//!
//! # Invariants
//! - Resolution never fails on dangling references: unknown assignees are
//!   skipped, a missing creator or comment author is `None`.
//! - Every unresolved reference is counted and logged.
//! - Assignee order follows the stored id order.

use crate::model::task::{Comment, Task};
use crate::model::user::User;
use crate::model::EntityKind;
use crate::repo::entity_store::{EntityStore, StoreError, StoreResult};
use log::warn;
use std::sync::atomic::{AtomicU64, Ordering};

/// Comment paired with its resolved author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentView {
    pub comment: Comment,
    pub author: Option<User>,
}

/// Everything the task detail page renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskView {
    pub task: Task,
    pub assignees: Vec<User>,
    pub creator: Option<User>,
    pub comments: Vec<CommentView>,
}

pub struct AssignmentResolver<R: EntityStore> {
    store: R,
    unresolved: AtomicU64,
}

impl<R: EntityStore> AssignmentResolver<R> {
    pub fn new(store: R) -> Self {
        Self {
            store,
            unresolved: AtomicU64::new(0),
        }
    }

    /// Resolved assignees in stored order; unknown ids are skipped.
    pub fn resolve_assignees(&self, task: &Task) -> Vec<User> {
        task.assignee_ids
            .iter()
            .filter_map(|id| {
                let user = self.store.get_user(id);
                if user.is_none() {
                    self.note_unresolved(task, "assignee", id);
                }
                user
            })
            .collect()
    }

    /// Task creator, or `None` when the user record is gone.
    pub fn resolve_creator(&self, task: &Task) -> Option<User> {
        let creator = self.store.get_user(&task.creator_id);
        if creator.is_none() {
            self.note_unresolved(task, "creator", &task.creator_id);
        }
        creator
    }

    /// Detail-view projection for one task.
    pub fn resolve_task_view(&self, task_id: &str) -> StoreResult<TaskView> {
        let task = self
            .store
            .get_task(task_id)
            .ok_or_else(|| StoreError::not_found(EntityKind::Task, task_id))?;

        let assignees = self.resolve_assignees(&task);
        let creator = self.resolve_creator(&task);
        let comments = task
            .comments
            .iter()
            .map(|comment| {
                let author = self.store.get_user(&comment.author_id);
                if author.is_none() {
                    self.note_unresolved(&task, "comment_author", &comment.author_id);
                }
                CommentView {
                    comment: comment.clone(),
                    author,
                }
            })
            .collect();

        Ok(TaskView {
            task,
            assignees,
            creator,
            comments,
        })
    }

    /// Total dangling references seen since this resolver was built.
    pub fn skipped_references(&self) -> u64 {
        self.unresolved.load(Ordering::Relaxed)
    }

    fn note_unresolved(&self, task: &Task, role: &str, user_id: &str) {
        self.unresolved.fetch_add(1, Ordering::Relaxed);
        warn!(
            "event=user_ref_unresolved module=resolver status=skipped task_id={} role={} user_id={}",
            task.id, role, user_id
        );
    }
}
