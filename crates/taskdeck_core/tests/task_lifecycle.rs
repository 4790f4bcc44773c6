use std::sync::Arc;
use std::thread;
use taskdeck_core::{
    Clock, EntityKind, EntityStore, InMemoryEntityStore, ManualClock, NewTask, NotificationKind,
    StoreError, SystemClock, Task, TaskPatch, TaskPriority, TaskService, TaskStatus, User,
    UserRole, ValidationError,
};

type Service = TaskService<Arc<InMemoryEntityStore>>;

fn seeded(clock: Arc<dyn Clock>) -> (Arc<InMemoryEntityStore>, Service) {
    let store = InMemoryEntityStore::shared();
    for (id, name, role) in [
        ("user-1", "John Doe", UserRole::Admin),
        ("user-2", "Jane Smith", UserRole::Manager),
        ("user-3", "Mike Johnson", UserRole::User),
    ] {
        let email = format!("{}@example.com", id);
        store.put_user(User::new(id, name, email, role)).unwrap();
    }

    let mut task = Task::new("task-1", "Redesign homepage", "user-1", 1_000);
    task.assignee_ids = vec!["user-3".to_string()];
    store.put_task(task).unwrap();

    let service = TaskService::new(Arc::clone(&store), clock);
    (store, service)
}

fn manual_clock() -> Arc<dyn Clock> {
    Arc::new(ManualClock::new(10_000, 1))
}

#[test]
fn change_status_sets_status_and_bumps_updated_at() {
    let (store, service) = seeded(Arc::new(SystemClock::new()));
    let before = store.get_task("task-1").unwrap().updated_at;

    let updated = service
        .change_status("user-1", "task-1", TaskStatus::InReview)
        .unwrap();
    assert_eq!(updated.status, TaskStatus::InReview);

    let stored = store.get_task("task-1").unwrap();
    assert_eq!(stored.status, TaskStatus::InReview);
    assert!(stored.updated_at > before);
}

#[test]
fn change_status_bumps_future_dated_updated_at() {
    let (store, service) = seeded(Arc::new(SystemClock::new()));
    let mut imported = Task::new("task-9", "Imported", "user-1", 1_000);
    imported.updated_at = i64::MAX / 2;
    store.put_task(imported).unwrap();

    let updated = service
        .change_status("user-1", "task-9", TaskStatus::Done)
        .unwrap();
    assert!(updated.updated_at > i64::MAX / 2);
    assert_eq!(store.get_task("task-9").unwrap().updated_at, updated.updated_at);
}

#[test]
fn change_status_bumps_updated_at_with_frozen_clock() {
    let (store, service) = seeded(Arc::new(ManualClock::new(10_000, 0)));
    let first = service
        .change_status("user-1", "task-1", TaskStatus::InProgress)
        .unwrap();
    let second = service
        .change_status("user-1", "task-1", TaskStatus::InProgress)
        .unwrap();
    assert!(second.updated_at > first.updated_at);
    assert_eq!(store.get_task("task-1").unwrap().updated_at, second.updated_at);
}

#[test]
fn any_status_may_follow_any_other() {
    let (store, service) = seeded(manual_clock());
    for from in TaskStatus::ALL {
        for to in TaskStatus::ALL {
            service.change_status("user-1", "task-1", from).unwrap();
            let before = store.get_task("task-1").unwrap().updated_at;
            let after = service.change_status("user-1", "task-1", to).unwrap();
            assert_eq!(after.status, to);
            assert!(after.updated_at > before, "{from} -> {to} must bump updated_at");
        }
    }
}

#[test]
fn change_status_on_missing_task_is_not_found() {
    let (_, service) = seeded(manual_clock());
    let err = service
        .change_status("user-1", "task-404", TaskStatus::Done)
        .unwrap_err();
    assert_eq!(err, StoreError::not_found(EntityKind::Task, "task-404"));
}

#[test]
fn comments_keep_insertion_order() {
    let (store, service) = seeded(manual_clock());
    let first = service.add_comment("user-2", "task-1", "first").unwrap();
    let second = service.add_comment("user-3", "task-1", "second").unwrap();

    let stored = store.get_task("task-1").unwrap();
    assert_eq!(stored.comments, vec![first.clone(), second.clone()]);
    assert!(first.created_at < second.created_at);
    assert_eq!(stored.updated_at, second.created_at);
}

#[test]
fn blank_comment_is_rejected_without_touching_task() {
    let (store, service) = seeded(manual_clock());
    let before = store.get_task("task-1").unwrap();

    for content in ["", "   ", "\n\t"] {
        let err = service.add_comment("user-2", "task-1", content).unwrap_err();
        assert_eq!(
            err,
            StoreError::Validation(ValidationError::BlankCommentContent)
        );
    }

    assert_eq!(store.get_task("task-1").unwrap(), before);
    assert_eq!(store.unread_count("user-1"), 0);
}

#[test]
fn add_comment_reports_missing_task_or_author() {
    let (_, service) = seeded(manual_clock());
    let err = service.add_comment("user-2", "task-404", "hi").unwrap_err();
    assert_eq!(err, StoreError::not_found(EntityKind::Task, "task-404"));

    let err = service.add_comment("ghost", "task-1", "hi").unwrap_err();
    assert_eq!(err, StoreError::not_found(EntityKind::User, "ghost"));
}

#[test]
fn concurrent_add_comment_keeps_every_comment() {
    const COMMENTS: usize = 64;
    let (store, service) = seeded(Arc::new(SystemClock::new()));

    thread::scope(|scope| {
        for index in 0..COMMENTS {
            let service = &service;
            scope.spawn(move || {
                service
                    .add_comment("user-2", "task-1", &format!("comment {index}"))
                    .unwrap();
            });
        }
    });

    let stored = store.get_task("task-1").unwrap();
    assert_eq!(stored.comments.len(), COMMENTS);
    assert!(stored
        .comments
        .windows(2)
        .all(|pair| pair[0].created_at < pair[1].created_at));
    assert_eq!(store.unread_count("user-1"), COMMENTS);
}

#[test]
fn delete_task_then_lookup_and_second_delete_fail() {
    let (store, service) = seeded(manual_clock());
    service.add_comment("user-2", "task-1", "soon gone").unwrap();

    let removed = service.delete_task("task-1").unwrap();
    assert_eq!(removed.comments.len(), 1);
    assert!(store.get_task("task-1").is_none());
    assert!(service.get_task("task-1").unwrap_err().is_not_found());

    let err = service.delete_task("task-1").unwrap_err();
    assert_eq!(err, StoreError::not_found(EntityKind::Task, "task-1"));
}

#[test]
fn edit_task_applies_patch_and_notifies_new_assignees() {
    let (store, service) = seeded(manual_clock());
    let before = store.get_task("task-1").unwrap();

    let patch = TaskPatch {
        title: Some("Redesign landing page".to_string()),
        priority: Some(TaskPriority::Urgent),
        due_date: Some(Some(99_000)),
        labels: Some(vec!["design".to_string()]),
        assignee_ids: Some(vec!["user-3".to_string(), "user-2".to_string()]),
        ..TaskPatch::default()
    };
    let edited = service.edit_task("user-1", "task-1", &patch).unwrap();

    assert_eq!(edited.title, "Redesign landing page");
    assert_eq!(edited.priority, TaskPriority::Urgent);
    assert_eq!(edited.due_date, Some(99_000));
    assert_eq!(edited.labels, vec!["design".to_string()]);
    assert_eq!(edited.creator_id, before.creator_id);
    assert_eq!(edited.created_at, before.created_at);
    assert!(edited.updated_at > before.updated_at);

    let assigned = service.notifications().list_for_user("user-2", true);
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].kind, NotificationKind::TaskAssigned);
    assert_eq!(service.notifications().compute_unread_count("user-3"), 0);
}

#[test]
fn empty_edit_leaves_task_untouched() {
    let (store, service) = seeded(manual_clock());
    let before = store.get_task("task-1").unwrap();

    let edited = service
        .edit_task("user-1", "task-1", &TaskPatch::default())
        .unwrap();
    assert_eq!(edited, before);
    assert_eq!(store.get_task("task-1"), Some(before));

    let err = service
        .edit_task("user-1", "task-404", &TaskPatch::default())
        .unwrap_err();
    assert_eq!(err, StoreError::not_found(EntityKind::Task, "task-404"));
}

#[test]
fn edit_task_with_unknown_assignee_changes_nothing() {
    let (store, service) = seeded(manual_clock());
    let before = store.get_task("task-1").unwrap();

    let patch = TaskPatch {
        title: Some("should not stick".to_string()),
        assignee_ids: Some(vec!["ghost".to_string()]),
        ..TaskPatch::default()
    };
    let err = service.edit_task("user-1", "task-1", &patch).unwrap_err();
    assert_eq!(
        err,
        StoreError::Validation(ValidationError::UnknownUser("ghost".to_string()))
    );
    assert_eq!(store.get_task("task-1").unwrap(), before);

    let blank_title = TaskPatch {
        title: Some("  ".to_string()),
        ..TaskPatch::default()
    };
    assert!(service
        .edit_task("user-1", "task-1", &blank_title)
        .unwrap_err()
        .is_validation());
}

#[test]
fn create_task_stamps_creator_and_notifies_assignees() {
    let (store, service) = seeded(manual_clock());
    let mut request = NewTask::titled("Fix login redirect");
    request.assignee_ids = vec!["user-1".to_string(), "user-2".to_string()];

    let created = service.create_task("user-1", request).unwrap();
    assert_eq!(created.creator_id, "user-1");
    assert_eq!(created.status, TaskStatus::Todo);
    assert_eq!(created.created_at, created.updated_at);
    assert_eq!(store.get_task(&created.id), Some(created.clone()));

    assert_eq!(store.unread_count("user-1"), 0);
    assert_eq!(store.unread_count("user-2"), 1);

    let err = service
        .create_task("ghost", NewTask::titled("orphan"))
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn comment_scenario_notifies_creator_and_assignees_except_author() {
    let (store, service) = seeded(manual_clock());

    service.add_comment("user-2", "task-1", "Looks good").unwrap();

    let task = store.get_task("task-1").unwrap();
    assert_eq!(task.comments.len(), 1);
    assert_eq!(task.comments[0].content, "Looks good");
    assert_eq!(task.status, TaskStatus::Todo);

    for recipient in ["user-1", "user-3"] {
        let notifications = store.list_notifications(recipient, false);
        assert_eq!(notifications.len(), 1, "{recipient} should be notified");
        assert!(!notifications[0].read);
        assert_eq!(notifications[0].kind, NotificationKind::CommentAdded);
        assert_eq!(notifications[0].task_id.as_deref(), Some("task-1"));
    }
    assert!(store.list_notifications("user-2", false).is_empty());
}

#[test]
fn done_then_reopen_scenario() {
    let (store, service) = seeded(manual_clock());
    let initial = store.get_task("task-1").unwrap().updated_at;

    let done = service
        .change_status("user-3", "task-1", TaskStatus::Done)
        .unwrap();
    let reopened = service
        .change_status("user-3", "task-1", TaskStatus::Done.shortcut())
        .unwrap();

    assert_eq!(reopened.status, TaskStatus::InProgress);
    assert!(done.updated_at > initial);
    assert!(reopened.updated_at > done.updated_at);

    let completed = store.list_notifications("user-1", false);
    assert_eq!(completed.len(), 1);
    assert_eq!(completed[0].kind, NotificationKind::TaskCompleted);
    assert!(store.list_notifications("user-3", false).is_empty());
}
