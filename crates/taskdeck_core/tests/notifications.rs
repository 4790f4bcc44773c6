use std::sync::Arc;
use taskdeck_core::{
    EntityKind, EntityStore, InMemoryEntityStore, ManualClock, Notification, NotificationKind,
    NotificationService, StoreError, Task, TaskEvent, TaskStatus, User, UserRole,
};

fn setup() -> (Arc<InMemoryEntityStore>, NotificationService<Arc<InMemoryEntityStore>>) {
    let store = InMemoryEntityStore::shared();
    for id in ["user-1", "user-2", "user-3"] {
        store
            .put_user(User::new(id, id, format!("{id}@example.com"), UserRole::User))
            .unwrap();
    }
    let mut task = Task::new("task-1", "Write API docs", "user-1", 100);
    task.assignee_ids = vec!["user-2".to_string(), "user-3".to_string()];
    store.put_task(task).unwrap();

    let service = NotificationService::new(Arc::clone(&store), Arc::new(ManualClock::new(500, 1)));
    (store, service)
}

fn brute_force_unread(store: &InMemoryEntityStore, user_id: &str) -> usize {
    store
        .list_notifications(user_id, false)
        .iter()
        .filter(|notification| notification.target_user_id == user_id && !notification.read)
        .count()
}

#[test]
fn unread_count_matches_brute_force_through_reads() {
    let (store, service) = setup();
    for index in 0..5 {
        let mut notification = Notification::new(
            "user-1",
            None,
            NotificationKind::TaskAssigned,
            format!("n{index}"),
            index,
        );
        notification.read = index % 2 == 0;
        store.put_notification(notification).unwrap();
    }

    assert_eq!(service.compute_unread_count("user-1"), 2);
    assert_eq!(
        service.compute_unread_count("user-1"),
        brute_force_unread(&store, "user-1")
    );

    for notification in service.list_for_user("user-1", false) {
        service.mark_read(&notification.id).unwrap();
        assert_eq!(
            service.compute_unread_count("user-1"),
            brute_force_unread(&store, "user-1")
        );
    }
    assert_eq!(service.compute_unread_count("user-1"), 0);
}

#[test]
fn mark_read_is_idempotent_and_reports_unknown_ids() {
    let (store, service) = setup();
    let notification = Notification::new("user-2", None, NotificationKind::CommentAdded, "x", 1);
    store.put_notification(notification.clone()).unwrap();

    let first = service.mark_read(&notification.id).unwrap();
    let second = service.mark_read(&notification.id).unwrap();
    assert!(first.read);
    assert_eq!(first, second);
    assert_eq!(service.compute_unread_count("user-2"), 0);

    let err = service.mark_read("notification-404").unwrap_err();
    assert_eq!(
        err,
        StoreError::not_found(EntityKind::Notification, "notification-404")
    );
}

#[test]
fn mark_all_read_flips_only_unread() {
    let (store, service) = setup();
    for read in [false, true, false] {
        let mut notification =
            Notification::new("user-3", None, NotificationKind::TaskCompleted, "x", 1);
        notification.read = read;
        store.put_notification(notification).unwrap();
    }

    assert_eq!(service.mark_all_read("user-3"), 2);
    assert_eq!(service.mark_all_read("user-3"), 0);
    assert_eq!(service.compute_unread_count("user-3"), 0);
}

#[test]
fn comment_event_reaches_assignees_and_creator_but_not_actor() {
    let (_, service) = setup();
    let created = service.emit(&TaskEvent::CommentAdded {
        task_id: "task-1".to_string(),
        actor_id: "user-2".to_string(),
        comment_id: "comment-1".to_string(),
    });

    let targets: Vec<_> = created
        .iter()
        .map(|notification| notification.target_user_id.as_str())
        .collect();
    assert_eq!(targets, vec!["user-3", "user-1"]);
    assert!(created.iter().all(|notification| !notification.read));
    assert!(created.iter().all(|notification| notification.created_at >= 500));
}

#[test]
fn status_event_only_fires_on_entering_done() {
    let (_, service) = setup();
    let to_review = service.emit(&TaskEvent::StatusChanged {
        task_id: "task-1".to_string(),
        actor_id: "user-1".to_string(),
        from: TaskStatus::Todo,
        to: TaskStatus::InReview,
    });
    assert!(to_review.is_empty());

    let already_done = service.emit(&TaskEvent::StatusChanged {
        task_id: "task-1".to_string(),
        actor_id: "user-1".to_string(),
        from: TaskStatus::Done,
        to: TaskStatus::Done,
    });
    assert!(already_done.is_empty());

    let completed = service.emit(&TaskEvent::StatusChanged {
        task_id: "task-1".to_string(),
        actor_id: "user-1".to_string(),
        from: TaskStatus::InReview,
        to: TaskStatus::Done,
    });
    assert_eq!(completed.len(), 2);
    assert!(completed
        .iter()
        .all(|notification| notification.kind == NotificationKind::TaskCompleted));
}

#[test]
fn emission_skips_unknown_recipients_and_missing_tasks() {
    let (store, service) = setup();
    let created = service.emit(&TaskEvent::TaskAssigned {
        task_id: "task-1".to_string(),
        actor_id: "user-1".to_string(),
        assignee_ids: vec!["ghost".to_string(), "user-2".to_string(), "user-1".to_string()],
    });
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].target_user_id, "user-2");
    assert_eq!(store.unread_count("ghost"), 0);

    let none = service.emit(&TaskEvent::CommentAdded {
        task_id: "task-404".to_string(),
        actor_id: "user-1".to_string(),
        comment_id: "comment-1".to_string(),
    });
    assert!(none.is_empty());
}
