//! Task and comment domain model.
//!
//! # Responsibility
//! - Define the task record, its status workflow and priority scale.
//! - Provide the only mutation paths for tasks (`set_status`, `apply_patch`,
//!   `push_comment`), each keeping the invariants below.
//!
//! # Invariants
//! - `creator_id` and `created_at` are fixed at creation.
//! - `updated_at >= created_at`; every mutation re-stamps `updated_at`, which
//!   strictly increases.
//! - `comments` is append-only and kept in insertion (chronological) order.
//! - Every comment's `task_id` equals the owning task's `id`.

use crate::model::{ensure_id, generate_id, CommentId, EntityKind, TaskId, UserId, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Workflow position of a task.
///
/// The order of variants follows the board columns, but transitions between
/// any two states are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    Backlog,
    Todo,
    InProgress,
    InReview,
    Done,
}

impl TaskStatus {
    /// All states in board order.
    pub const ALL: [TaskStatus; 5] = [
        Self::Backlog,
        Self::Todo,
        Self::InProgress,
        Self::InReview,
        Self::Done,
    ];

    /// Stable wire value (`in-progress`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::InReview => "in-review",
            Self::Done => "done",
        }
    }

    /// Human-facing badge label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Backlog => "Backlog",
            Self::Todo => "To Do",
            Self::InProgress => "In Progress",
            Self::InReview => "In Review",
            Self::Done => "Done",
        }
    }

    /// Target of the single quick action offered for this state:
    /// "Reopen" for done tasks, "Mark as Done" for everything else.
    pub fn shortcut(self) -> TaskStatus {
        match self {
            Self::Done => Self::InProgress,
            _ => Self::Done,
        }
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown status or priority string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl Display for ParseEnumError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unsupported {} `{}`", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

impl FromStr for TaskStatus {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "backlog" => Ok(Self::Backlog),
            "todo" => Ok(Self::Todo),
            "in-progress" => Ok(Self::InProgress),
            "in-review" => Ok(Self::InReview),
            "done" => Ok(Self::Done),
            other => Err(ParseEnumError {
                kind: "task status",
                value: other.to_string(),
            }),
        }
    }
}

/// Urgency scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl Display for TaskPriority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskPriority {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            other => Err(ParseEnumError {
                kind: "task priority",
                value: other.to_string(),
            }),
        }
    }
}

/// One entry in a task's discussion thread. Never edited or reordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub task_id: TaskId,
    #[serde(rename = "userId")]
    pub author_id: UserId,
    pub content: String,
    pub created_at: i64,
}

impl Comment {
    /// Creates a comment with a generated id.
    pub fn new(
        task_id: impl Into<TaskId>,
        author_id: impl Into<UserId>,
        content: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: generate_id(EntityKind::Comment),
            task_id: task_id.into(),
            author_id: author_id.into(),
            content: content.into(),
            created_at,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_id(&self.id, "comment id")?;
        ensure_id(&self.author_id, "comment author id")?;
        if self.content.trim().is_empty() {
            return Err(ValidationError::BlankCommentContent);
        }
        Ok(())
    }
}

/// Trackable unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// Epoch milliseconds.
    #[serde(default)]
    pub due_date: Option<i64>,
    #[serde(default)]
    pub assignee_ids: Vec<UserId>,
    #[serde(rename = "createdBy")]
    pub creator_id: UserId,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Partial update for the mutable task fields. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    /// `Some(None)` clears the due date.
    pub due_date: Option<Option<i64>>,
    pub labels: Option<Vec<String>>,
    pub assignee_ids: Option<Vec<UserId>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.labels.is_none()
            && self.assignee_ids.is_none()
    }
}

impl Task {
    /// Creates a `todo` task with medium priority and no assignees.
    pub fn new(
        id: impl Into<TaskId>,
        title: impl Into<String>,
        creator_id: impl Into<UserId>,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date: None,
            assignee_ids: Vec::new(),
            creator_id: creator_id.into(),
            labels: Vec::new(),
            comments: Vec::new(),
            created_at,
            updated_at: created_at,
        }
    }

    /// Moves the task to `status` and returns the previous state.
    pub fn set_status(&mut self, status: TaskStatus, now: i64) -> TaskStatus {
        let previous = self.status;
        self.status = status;
        self.touch(now);
        previous
    }

    /// Applies `patch` and returns the assignee ids it newly added.
    ///
    /// Referential checks on assignees are the store's job; this only
    /// enforces the shape invariants via `validate` afterwards.
    pub fn apply_patch(&mut self, patch: &TaskPatch, now: i64) -> Vec<UserId> {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(labels) = &patch.labels {
            self.labels = labels.clone();
        }

        let mut added = Vec::new();
        if let Some(assignee_ids) = &patch.assignee_ids {
            added = assignee_ids
                .iter()
                .filter(|id| !self.assignee_ids.contains(*id))
                .cloned()
                .collect();
            self.assignee_ids = assignee_ids.clone();
        }

        self.touch(now);
        added
    }

    /// Appends `comment` to the thread and stamps `updated_at` with its time.
    pub fn push_comment(&mut self, comment: Comment) -> Result<(), ValidationError> {
        if comment.task_id != self.id {
            return Err(ValidationError::CommentTaskMismatch {
                comment_id: comment.id,
                task_id: self.id.clone(),
            });
        }
        comment.validate()?;
        let stamp = comment.created_at;
        self.comments.push(comment);
        self.touch(stamp);
        Ok(())
    }

    pub fn is_assigned_to(&self, user_id: &str) -> bool {
        self.assignee_ids.iter().any(|id| id == user_id)
    }

    /// Assignees in stored order followed by the creator, without duplicates.
    pub fn stakeholders(&self) -> Vec<UserId> {
        let mut seen = HashSet::new();
        self.assignee_ids
            .iter()
            .chain(std::iter::once(&self.creator_id))
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect()
    }

    /// Shape invariants. User references are checked by the store.
    pub fn validate(&self) -> Result<(), ValidationError> {
        ensure_id(&self.id, "task id")?;
        ensure_id(&self.creator_id, "task creator id")?;
        if self.title.trim().is_empty() {
            return Err(ValidationError::BlankTitle);
        }
        if self.updated_at < self.created_at {
            return Err(ValidationError::UpdatedBeforeCreated {
                created_at: self.created_at,
                updated_at: self.updated_at,
            });
        }
        if self.labels.iter().any(|label| label.trim().is_empty()) {
            return Err(ValidationError::BlankLabel);
        }

        let mut seen = HashSet::new();
        for assignee in &self.assignee_ids {
            ensure_id(assignee, "assignee id")?;
            if !seen.insert(assignee.as_str()) {
                return Err(ValidationError::DuplicateAssignee(assignee.clone()));
            }
        }

        for comment in &self.comments {
            if comment.task_id != self.id {
                return Err(ValidationError::CommentTaskMismatch {
                    comment_id: comment.id.clone(),
                    task_id: self.id.clone(),
                });
            }
            comment.validate()?;
        }
        Ok(())
    }

    /// `updated_at` strictly increases, even when the clock lags the stored value.
    fn touch(&mut self, now: i64) {
        self.updated_at = now.max(self.updated_at.saturating_add(1));
    }
}

#[cfg(test)]
mod tests {
    use super::{Comment, Task, TaskPatch, TaskPriority, TaskStatus};
    use crate::model::ValidationError;

    fn sample_task() -> Task {
        let mut task = Task::new("task-1", "Ship dashboard", "user-1", 1_000);
        task.assignee_ids = vec!["user-2".to_string(), "user-1".to_string()];
        task
    }

    #[test]
    fn status_wire_values_round_trip_through_from_str() {
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>(), Ok(status));
        }
        assert!("finished".parse::<TaskStatus>().is_err());
        let json = serde_json::to_string(&TaskStatus::InReview).expect("status serializes");
        assert_eq!(json, "\"in-review\"");
    }

    #[test]
    fn shortcut_offers_reopen_only_for_done() {
        assert_eq!(TaskStatus::Done.shortcut(), TaskStatus::InProgress);
        assert_eq!(TaskStatus::Backlog.shortcut(), TaskStatus::Done);
        assert_eq!(TaskStatus::InReview.shortcut(), TaskStatus::Done);
        assert_eq!(TaskStatus::Todo.label(), "To Do");
    }

    #[test]
    fn set_status_stamps_updated_at() {
        let mut task = sample_task();
        let previous = task.set_status(TaskStatus::Done, 2_000);
        assert_eq!(previous, TaskStatus::Todo);
        assert_eq!(task.status, TaskStatus::Done);
        assert_eq!(task.updated_at, 2_000);
    }

    #[test]
    fn mutation_bumps_updated_at_past_a_lagging_clock() {
        let mut task = sample_task();
        task.updated_at = 5_000;
        task.set_status(TaskStatus::Done, 2_000);
        assert_eq!(task.updated_at, 5_001);

        task.push_comment(Comment::new("task-1", "user-2", "late", 5_001))
            .unwrap();
        assert_eq!(task.updated_at, 5_002);
    }

    #[test]
    fn apply_patch_reports_newly_added_assignees() {
        let mut task = sample_task();
        let patch = TaskPatch {
            priority: Some(TaskPriority::Urgent),
            assignee_ids: Some(vec!["user-1".to_string(), "user-3".to_string()]),
            ..TaskPatch::default()
        };
        let added = task.apply_patch(&patch, 1_500);
        assert_eq!(added, vec!["user-3".to_string()]);
        assert_eq!(task.priority, TaskPriority::Urgent);
        assert_eq!(task.updated_at, 1_500);
        assert!(!task.is_assigned_to("user-2"));
    }

    #[test]
    fn push_comment_rejects_foreign_and_blank_comments() {
        let mut task = sample_task();
        let foreign = Comment::new("task-9", "user-2", "hi", 1_100);
        assert!(matches!(
            task.push_comment(foreign),
            Err(ValidationError::CommentTaskMismatch { .. })
        ));

        let blank = Comment::new("task-1", "user-2", " \n ", 1_100);
        assert_eq!(
            task.push_comment(blank),
            Err(ValidationError::BlankCommentContent)
        );
        assert!(task.comments.is_empty());
        assert_eq!(task.updated_at, 1_000);
    }

    #[test]
    fn stakeholders_dedup_creator_already_assigned() {
        let task = sample_task();
        assert_eq!(
            task.stakeholders(),
            vec!["user-2".to_string(), "user-1".to_string()]
        );
    }

    #[test]
    fn validate_catches_duplicate_assignee_and_time_inversion() {
        let mut task = sample_task();
        task.assignee_ids.push("user-2".to_string());
        assert_eq!(
            task.validate(),
            Err(ValidationError::DuplicateAssignee("user-2".to_string()))
        );

        let mut task = sample_task();
        task.updated_at = 10;
        assert!(matches!(
            task.validate(),
            Err(ValidationError::UpdatedBeforeCreated { .. })
        ));
    }
}
