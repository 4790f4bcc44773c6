//! CLI smoke entry point.
//!
//! # Responsibility
//! - Load a seed (file from `TASKDECK_SEED` or the demo dataset).
//! - Print the task board with resolved assignees and per-user unread badges.

use log::error;
use std::process::ExitCode;
use std::sync::Arc;
use taskdeck_core::{
    core_version, demo_seed, init_from_config, load_seed, load_seed_file, AssignmentResolver,
    Clock, CoreConfig, EntityStore, InMemoryEntityStore, NotificationService, SystemClock,
    TaskListQuery,
};

fn main() -> ExitCode {
    let config = CoreConfig::from_env();
    if let Err(err) = init_from_config(&config) {
        eprintln!("logging disabled: {err}");
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let store = InMemoryEntityStore::shared();
    let loaded = match &config.seed_path {
        Some(path) => load_seed_file(&*store, path),
        None => load_seed(&*store, &demo_seed(clock.now_ms())),
    };
    if let Err(err) = loaded {
        error!("event=cli_seed module=cli status=error error={err}");
        eprintln!("seed failed: {err}");
        return ExitCode::FAILURE;
    }

    println!("taskdeck_core version={}", core_version());

    let resolver = AssignmentResolver::new(Arc::clone(&store));
    for task in store.list_tasks(&TaskListQuery::default()) {
        let assignees = resolver
            .resolve_assignees(&task)
            .into_iter()
            .map(|user| user.name)
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "[{}] {} ({}, {}) assignees: {}",
            task.status.label(),
            task.title,
            task.priority,
            task.id,
            if assignees.is_empty() { "-" } else { assignees.as_str() }
        );
    }

    let notifications = NotificationService::new(Arc::clone(&store), clock);
    for user in store.list_users() {
        println!(
            "{} ({}) unread={}",
            user.name,
            user.role.as_str(),
            notifications.compute_unread_count(&user.id)
        );
    }
    ExitCode::SUCCESS
}
