mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use pretty_assertions::assert_eq;
use taskdeck_core::api::{
    CacheEvent, DeleteOutcome, ErrorCode, ReloadOutcome, ServiceError, SortField, SortOrder,
    StaticConfirm, TaskDraft, TaskPatch, TaskPriority, TaskStatus,
};

fn abc() -> Vec<taskdeck_core::api::Task> {
    vec![
        task("a", "Write report", TaskStatus::Pending, TaskPriority::High),
        task("b", "urgent2 call bank", TaskStatus::InProgress, TaskPriority::Medium),
        task("c", "urgent groceries", TaskStatus::Completed, TaskPriority::Low),
    ]
}

async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_reload_sends_query_and_replaces_cache() {
    let h = Harness::signed_in(abc()).await;
    assert_eq!(h.cached_ids().await, vec!["a", "b", "c"]);

    let outcome = h
        .ctx
        .tasks()
        .set_status_filter(Some(TaskStatus::Completed))
        .await
        .unwrap();
    assert!(matches!(outcome, Some(ReloadOutcome::Applied { len: 1, .. })));
    assert_eq!(h.cached_ids().await, vec!["c"]);

    let last = h.fake.list_queries().pop().unwrap();
    assert_eq!(last.status_filter, Some(TaskStatus::Completed));
    assert_eq!(last.sort_by, SortField::CreatedAt);
    assert_eq!(last.sort_order, SortOrder::Desc);
}

#[tokio::test]
async fn test_unchanged_filter_does_not_reload() {
    let h = Harness::signed_in(abc()).await;
    let before = h.fake.count("list_tasks");

    let outcome = h.ctx.tasks().set_sort_order(SortOrder::Desc).await.unwrap();
    assert_eq!(outcome, None);
    assert_eq!(h.fake.count("list_tasks"), before);

    h.ctx.tasks().set_sort_by(SortField::Priority).await.unwrap();
    h.ctx
        .tasks()
        .set_priority_filter(Some(TaskPriority::High))
        .await
        .unwrap();
    assert_eq!(h.fake.count("list_tasks"), before + 2);
    assert_eq!(h.cached_ids().await, vec!["a"]);
}

#[tokio::test]
async fn test_reload_failure_keeps_cache_and_notifies() {
    let h = Harness::signed_in(abc()).await;
    h.fake
        .fail_next("list_tasks", ServiceError::Network("timed out".into()));

    let err = h.ctx.tasks().reload().await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::NetworkError);
    assert_eq!(h.cached_ids().await, vec!["a", "b", "c"]);
    assert_eq!(h.notifier.notices(), vec![error("Failed to load tasks")]);
}

#[tokio::test]
async fn test_stale_reload_is_discarded() {
    let h = Harness::signed_in(abc()).await;
    let tasks = h.ctx.tasks().clone();
    let mut events = tasks.subscribe();

    // first reload answers with the unfiltered list but is held back
    let release = h.fake.gate("list_tasks");
    let slow = tokio::spawn({
        let tasks = tasks.clone();
        async move { tasks.reload().await }
    });
    settle().await;
    assert_eq!(h.fake.count("list_tasks"), 2);

    let fast = tasks
        .set_status_filter(Some(TaskStatus::Pending))
        .await
        .unwrap()
        .unwrap();
    assert!(fast.is_applied());
    assert_eq!(h.cached_ids().await, vec!["a"]);

    release.send(()).unwrap();
    let slow = slow.await.unwrap().unwrap();
    assert!(matches!(slow, ReloadOutcome::Stale { .. }));
    assert_eq!(h.cached_ids().await, vec!["a"]);

    assert!(matches!(events.recv().await.unwrap(), CacheEvent::Reloaded { len: 1, .. }));
    assert!(matches!(events.recv().await.unwrap(), CacheEvent::StaleDiscarded { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_search_is_debounced_to_last_term() {
    let h = Harness::signed_in(abc()).await;
    let before = h.fake.count("list_tasks");

    h.ctx.tasks().set_search_term("urgent").await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    h.ctx.tasks().set_search_term("urgent2").await;
    assert!(h.ctx.tasks().search_pending());

    tokio::time::sleep(Duration::from_millis(299)).await;
    assert_eq!(h.fake.count("list_tasks"), before);

    tokio::time::sleep(Duration::from_millis(50)).await;
    settle().await;
    assert_eq!(h.fake.count("list_tasks"), before + 1);
    assert_eq!(h.fake.list_queries().pop().unwrap().search_term, "urgent2");
    assert_eq!(h.cached_ids().await, vec!["b"]);
}

#[tokio::test(start_paused = true)]
async fn test_filter_change_leaves_pending_search_alone() {
    let h = Harness::signed_in(abc()).await;
    let before = h.fake.count("list_tasks");

    h.ctx.tasks().set_search_term("urgent").await;
    h.ctx
        .tasks()
        .set_status_filter(Some(TaskStatus::Completed))
        .await
        .unwrap();
    assert_eq!(h.fake.count("list_tasks"), before + 1);
    assert!(h.ctx.tasks().search_pending());

    tokio::time::sleep(Duration::from_millis(400)).await;
    settle().await;
    assert_eq!(h.fake.count("list_tasks"), before + 2);
    assert_eq!(h.cached_ids().await, vec!["c"]);
}

#[tokio::test]
async fn test_create_inserts_at_head_and_refreshes_stats() {
    let mut tasks = abc();
    tasks.push(task("d", "Dentist", TaskStatus::Pending, TaskPriority::Low));
    tasks.push(task("e", "Email Bob", TaskStatus::Pending, TaskPriority::Low));
    let h = Harness::signed_in(tasks).await;
    h.ctx
        .tasks()
        .set_priority_filter(Some(TaskPriority::Medium))
        .await
        .unwrap();
    assert_eq!(h.cached_ids().await, vec!["b"]);
    assert_eq!(h.ctx.stats().snapshot().await.total, 5);

    let mut draft = TaskDraft::titled("Taxes");
    draft.priority = Some(TaskPriority::High);
    let created = h.ctx.tasks().create(draft).await.unwrap();

    // inserted at the head even though it does not match the filter
    assert_eq!(h.cached_ids().await, vec![created.id.as_str(), "b"]);
    assert_eq!(h.ctx.stats().snapshot().await.total, 6);
    assert_eq!(h.notifier.last(), Some(success("Task created successfully")));
}

#[tokio::test]
async fn test_create_rejects_blank_title_locally() {
    let h = Harness::signed_in(abc()).await;

    let err = h.ctx.tasks().create(TaskDraft::titled("   ")).await.unwrap_err();
    assert_eq!(err.reason(), Some("Title is required"));
    assert_eq!(h.fake.count("create_task"), 0);
    assert_eq!(h.notifier.notices(), vec![error("Title is required")]);
}

#[tokio::test]
async fn test_update_rejects_blank_title_locally() {
    let h = Harness::signed_in(abc()).await;
    let patch = TaskPatch {
        title: Some("  ".into()),
        ..Default::default()
    };

    let err = h.ctx.tasks().update("a", patch).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::ValidationError);
    assert_eq!(h.fake.count("update_task"), 0);
    assert_eq!(h.notifier.notices(), vec![error("Title is required")]);
}

#[tokio::test]
async fn test_change_status_replaces_in_place() {
    let h = Harness::signed_in(abc()).await;

    let updated = h
        .ctx
        .tasks()
        .change_status("b", TaskStatus::Completed)
        .await
        .unwrap();
    assert_eq!(updated.status, TaskStatus::Completed);
    assert_eq!(h.cached_ids().await, vec!["a", "b", "c"]);
    assert_eq!(
        h.ctx.tasks().task("b").await.map(|t| t.status),
        Some(TaskStatus::Completed)
    );
    assert_eq!(h.ctx.stats().snapshot().await.count(TaskStatus::Completed), 2);
    assert_eq!(h.notifier.notices(), vec![success("Task status updated")]);
}

#[tokio::test]
async fn test_update_of_uncached_task_leaves_cache() {
    let h = Harness::signed_in(abc()).await;
    h.fake
        .push_server_task(task("z", "Hidden", TaskStatus::Pending, TaskPriority::Low));
    let before = h.ctx.tasks().tasks().await;

    let patch = TaskPatch {
        title: Some("Visible".into()),
        ..Default::default()
    };
    h.ctx.tasks().update("z", patch).await.unwrap();

    assert_eq!(h.ctx.tasks().tasks().await, before);
    assert_eq!(h.fake.count("update_task"), 1);
    assert_eq!(h.notifier.notices(), vec![success("Task updated successfully")]);
}

#[tokio::test]
async fn test_update_failure_leaves_cache() {
    let h = Harness::signed_in(abc()).await;
    let before = h.ctx.tasks().tasks().await;

    let err = h
        .ctx
        .tasks()
        .change_status("missing", TaskStatus::Completed)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::NotFound);
    assert_eq!(h.ctx.tasks().tasks().await, before);
    assert_eq!(h.notifier.notices(), vec![error("Task not found")]);
}

#[tokio::test]
async fn test_delete_preserves_order() {
    let h = Harness::signed_in(abc()).await;

    let outcome = h.ctx.tasks().delete("b").await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Deleted);
    assert_eq!(h.cached_ids().await, vec!["a", "c"]);
    assert_eq!(h.ctx.stats().snapshot().await.total, 2);
    assert_eq!(h.notifier.notices(), vec![success("Task deleted successfully")]);
}

#[tokio::test]
async fn test_declined_delete_sends_nothing() {
    let h = Harness::signed_in_with_confirm(abc(), Arc::new(StaticConfirm(false))).await;

    let outcome = h.ctx.tasks().delete("b").await.unwrap();
    assert_eq!(outcome, DeleteOutcome::Declined);
    assert_eq!(h.fake.count("delete_task"), 0);
    assert_eq!(h.cached_ids().await, vec!["a", "b", "c"]);
    assert!(h.notifier.notices().is_empty());
}

#[tokio::test]
async fn test_delete_failure_keeps_task() {
    let h = Harness::signed_in(abc()).await;
    h.fake
        .fail_next("delete_task", ServiceError::Server(String::new()));

    h.ctx.tasks().delete("a").await.unwrap_err();
    assert_eq!(h.cached_ids().await, vec!["a", "b", "c"]);
    assert_eq!(h.notifier.notices(), vec![error("Failed to delete task")]);
}

#[tokio::test]
async fn test_mutations_on_same_task_are_serialized() {
    let h = Harness::signed_in(abc()).await;
    let tasks = h.ctx.tasks().clone();

    let release = h.fake.gate("update_task");
    let first = tokio::spawn({
        let tasks = tasks.clone();
        async move { tasks.change_status("a", TaskStatus::InProgress).await }
    });
    settle().await;
    assert_eq!(h.fake.count("update_task"), 1);

    let second = tokio::spawn({
        let tasks = tasks.clone();
        async move { tasks.change_status("a", TaskStatus::Completed).await }
    });
    settle().await;
    // still waiting behind the first one
    assert_eq!(h.fake.count("update_task"), 1);

    // a different id is not held up
    tasks.change_status("c", TaskStatus::Pending).await.unwrap();
    assert_eq!(h.fake.count("update_task"), 2);

    release.send(()).unwrap();
    first.await.unwrap().unwrap();
    second.await.unwrap().unwrap();
    assert_eq!(h.fake.count("update_task"), 3);
    assert_eq!(
        tasks.task("a").await.map(|t| t.status),
        Some(TaskStatus::Completed)
    );
}

#[tokio::test]
async fn test_stats_never_move_backward() {
    let h = Harness::signed_in(abc()).await;
    let stats = h.ctx.stats().clone();

    let release = h.fake.gate("task_stats");
    let slow = tokio::spawn({
        let stats = stats.clone();
        async move { stats.refresh().await }
    });
    settle().await;

    h.ctx.tasks().create(TaskDraft::titled("Fourth")).await.unwrap();
    assert_eq!(stats.snapshot().await.total, 4);

    release.send(()).unwrap();
    assert!(matches!(
        slow.await.unwrap(),
        taskdeck_core::api::RefreshOutcome::Stale { .. }
    ));
    assert_eq!(stats.snapshot().await.total, 4);
}

#[tokio::test]
async fn test_stats_failure_is_silent() {
    let h = Harness::signed_in(abc()).await;
    h.fake
        .fail_next("task_stats", ServiceError::Server("boom".into()));

    h.ctx.tasks().delete("a").await.unwrap();
    assert_eq!(h.ctx.stats().snapshot().await.total, 3);
    assert_eq!(h.notifier.notices(), vec![success("Task deleted successfully")]);
}

#[tokio::test]
async fn test_logout_discards_in_flight_reload() {
    let h = Harness::signed_in(abc()).await;
    let tasks = h.ctx.tasks().clone();

    let release = h.fake.gate("list_tasks");
    let pending = tokio::spawn({
        let tasks = tasks.clone();
        async move { tasks.reload().await }
    });
    settle().await;

    h.ctx.logout().await;
    release.send(()).unwrap();
    assert!(matches!(
        pending.await.unwrap().unwrap(),
        ReloadOutcome::Stale { .. }
    ));
    assert!(tasks.tasks().await.is_empty());
}

#[tokio::test]
async fn test_logout_discards_in_flight_create() {
    let h = Harness::signed_in(abc()).await;
    let tasks = h.ctx.tasks().clone();

    let release = h.fake.gate("create_task");
    let pending = tokio::spawn({
        let tasks = tasks.clone();
        async move { tasks.create(TaskDraft::titled("Late arrival")).await }
    });
    settle().await;

    h.ctx.logout().await;
    release.send(()).unwrap();

    let err = pending.await.unwrap().unwrap_err();
    assert_eq!(err, ServiceError::Unauthenticated);
    assert!(tasks.tasks().await.is_empty());
    assert!(!h
        .notifier
        .notices()
        .contains(&success("Task created successfully")));
}

#[tokio::test]
async fn test_logout_discards_in_flight_delete() {
    let h = Harness::signed_in(abc()).await;
    let tasks = h.ctx.tasks().clone();

    let release = h.fake.gate("delete_task");
    let pending = tokio::spawn({
        let tasks = tasks.clone();
        async move { tasks.delete("a").await }
    });
    settle().await;

    h.ctx.logout().await;
    release.send(()).unwrap();

    assert_eq!(
        pending.await.unwrap().unwrap_err(),
        ServiceError::Unauthenticated
    );
    assert!(tasks.tasks().await.is_empty());
    assert!(!h
        .notifier
        .notices()
        .contains(&success("Task deleted successfully")));
}
