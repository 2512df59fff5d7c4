//! End-to-end scenarios for the scheduled-publication pipeline
//!
//! These exercise the schedule store, publisher, and scheduler together
//! against a real on-disk database, with mock providers standing in for
//! external destinations.

use std::sync::Arc;

use libcrier::config::SchedulerConfig;
use libcrier::providers::mock::MockProvider;
use libcrier::providers::StubProvider;
use libcrier::{CrierError, Database, Publisher, Scheduler, ScheduleStatus};
use tempfile::TempDir;

fn scheduler_config(batch_limit: u32) -> SchedulerConfig {
    SchedulerConfig {
        interval_seconds: 1,
        batch_limit,
    }
}

async fn test_db() -> (TempDir, Database) {
    let temp = TempDir::new().unwrap();
    let db_path = temp.path().join("test.db");
    let db = Database::new(db_path.to_str().unwrap()).await.unwrap();
    (temp, db)
}

#[tokio::test]
async fn immediately_due_schedule_is_published_in_one_iteration() {
    let (_temp, db) = test_db().await;

    let post = db.create_post("ship it", &[]).await.unwrap();
    // No explicit time: due immediately
    let now = chrono::Utc::now().timestamp();
    let schedule = db.create_schedule(post.id, now).await.unwrap();

    let publisher = Publisher::new(db.clone(), Arc::new(StubProvider::new()));
    let scheduler = Scheduler::new(db.clone(), publisher, &scheduler_config(10));
    scheduler.run_once().await.unwrap();

    let schedule = db.get_schedule(schedule.id).await.unwrap();
    assert_eq!(schedule.status, ScheduleStatus::Posted);
    assert_eq!(schedule.attempt_count, 1);
    assert!(schedule.last_error.is_none());

    let logs = db.list_publish_logs(post.id).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].post_id, post.id);
    assert_eq!(logs[0].status, "posted");
    assert!(logs[0].created_at >= now);
}

#[tokio::test]
async fn future_schedule_is_left_untouched() {
    let (_temp, db) = test_db().await;

    let post = db.create_post("later", &[]).await.unwrap();
    let in_an_hour = chrono::Utc::now().timestamp() + 3600;
    let schedule = db.create_schedule(post.id, in_an_hour).await.unwrap();

    let publisher = Publisher::new(db.clone(), Arc::new(StubProvider::new()));
    let scheduler = Scheduler::new(db.clone(), publisher, &scheduler_config(10));
    assert_eq!(scheduler.run_once().await.unwrap(), 0);

    let schedule = db.get_schedule(schedule.id).await.unwrap();
    assert_eq!(schedule.status, ScheduleStatus::Queued);
    assert_eq!(schedule.attempt_count, 0);
    assert!(db.list_publish_logs(post.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn provider_failure_marks_schedule_failed_with_provider_message() {
    let (_temp, db) = test_db().await;

    let post = db.create_post("doomed", &[]).await.unwrap();
    let now = chrono::Utc::now().timestamp();
    let schedule = db.create_schedule(post.id, now).await.unwrap();

    let provider = Arc::new(MockProvider::failure("mock", "rejected"));
    let publisher = Publisher::new(db.clone(), provider.clone());
    let scheduler = Scheduler::new(db.clone(), publisher, &scheduler_config(10));
    scheduler.run_once().await.unwrap();

    let schedule = db.get_schedule(schedule.id).await.unwrap();
    assert_eq!(schedule.status, ScheduleStatus::Failed);
    assert_eq!(schedule.attempt_count, 1);
    assert_eq!(schedule.last_error, Some("rejected".to_string()));

    // Failed attempts leave no audit record
    assert!(db.list_publish_logs(post.id).await.unwrap().is_empty());
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn failed_schedule_is_never_retried_automatically() {
    let (_temp, db) = test_db().await;

    let post = db.create_post("doomed", &[]).await.unwrap();
    let now = chrono::Utc::now().timestamp();
    let schedule = db.create_schedule(post.id, now).await.unwrap();

    let provider = Arc::new(MockProvider::failure("mock", "rejected"));
    let publisher = Publisher::new(db.clone(), provider.clone());
    let scheduler = Scheduler::new(db.clone(), publisher, &scheduler_config(10));

    scheduler.run_once().await.unwrap();
    scheduler.run_once().await.unwrap();
    scheduler.run_once().await.unwrap();

    let schedule = db.get_schedule(schedule.id).await.unwrap();
    assert_eq!(schedule.status, ScheduleStatus::Failed);
    // Only the first iteration attempted it; failed is terminal
    assert_eq!(schedule.attempt_count, 1);
    assert_eq!(provider.call_count(), 1);
}

#[tokio::test]
async fn manual_publish_of_missing_post_fails_without_side_effects() {
    let (_temp, db) = test_db().await;

    let provider = Arc::new(MockProvider::success("mock"));
    let publisher = Publisher::new(db.clone(), provider.clone());

    let err = publisher.publish_post(12345).await.unwrap_err();
    assert!(matches!(err, CrierError::NotFound { entity: "Post", .. }));

    assert_eq!(provider.call_count(), 0);
    assert!(db.list_publish_logs(12345).await.unwrap().is_empty());
    // The manual path never touches the schedule store
    assert!(db.list_schedules(10).await.unwrap().is_empty());
}

#[tokio::test]
async fn batch_limit_bounds_each_iteration() {
    let (_temp, db) = test_db().await;

    let post = db.create_post("bulk", &[]).await.unwrap();
    let now = chrono::Utc::now().timestamp();
    for offset in 0..15i64 {
        db.create_schedule(post.id, now - 60 + offset).await.unwrap();
    }

    let publisher = Publisher::new(db.clone(), Arc::new(StubProvider::new()));
    let scheduler = Scheduler::new(db.clone(), publisher, &scheduler_config(10));

    assert_eq!(scheduler.run_once().await.unwrap(), 10);

    let schedules = db.list_schedules(100).await.unwrap();
    let queued = schedules
        .iter()
        .filter(|s| s.status == ScheduleStatus::Queued)
        .count();
    let posted = schedules
        .iter()
        .filter(|s| s.status == ScheduleStatus::Posted)
        .count();
    assert_eq!(posted, 10);
    assert_eq!(queued, 5);

    // The remainder drains on the next iteration
    assert_eq!(scheduler.run_once().await.unwrap(), 5);
    let schedules = db.list_schedules(100).await.unwrap();
    assert!(schedules
        .iter()
        .all(|s| s.status == ScheduleStatus::Posted && s.attempt_count == 1));
}

#[tokio::test]
async fn mixed_batch_settles_into_exclusive_statuses() {
    let (_temp, db) = test_db().await;

    let now = chrono::Utc::now().timestamp();
    let good_post = db.create_post("good", &[]).await.unwrap();
    let good = db.create_schedule(good_post.id, now - 20).await.unwrap();
    let bad = db.create_schedule(9999, now - 10).await.unwrap();

    let publisher = Publisher::new(db.clone(), Arc::new(StubProvider::new()));
    let scheduler = Scheduler::new(db.clone(), publisher, &scheduler_config(10));
    scheduler.run_once().await.unwrap();

    // Every processed schedule lands in exactly one terminal status, and
    // last_error is populated iff the attempt failed.
    let good = db.get_schedule(good.id).await.unwrap();
    assert_eq!(good.status, ScheduleStatus::Posted);
    assert!(good.last_error.is_none());

    let bad = db.get_schedule(bad.id).await.unwrap();
    assert_eq!(bad.status, ScheduleStatus::Failed);
    assert!(bad.last_error.is_some());

    for schedule in [&good, &bad] {
        assert_eq!(schedule.attempt_count, 1);
    }
}

#[tokio::test]
async fn scheduled_and_manual_paths_share_publish_behavior() {
    let (_temp, db) = test_db().await;

    let post = db.create_post("either way", &[]).await.unwrap();
    let provider = Arc::new(MockProvider::success("mock"));
    let publisher = Publisher::new(db.clone(), provider.clone());

    // Manual path first
    let manual_log = publisher.publish_post(post.id).await.unwrap();
    assert_eq!(manual_log.provider, "mock");

    // Then the same post through the scheduler
    let now = chrono::Utc::now().timestamp();
    db.create_schedule(post.id, now).await.unwrap();
    let scheduler = Scheduler::new(db.clone(), publisher, &scheduler_config(10));
    scheduler.run_once().await.unwrap();

    let logs = db.list_publish_logs(post.id).await.unwrap();
    assert_eq!(logs.len(), 2);
    assert!(logs.iter().all(|l| l.status == "posted"));
    assert_eq!(provider.call_count(), 2);
}
