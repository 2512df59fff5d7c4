//! Scheduler loop
//!
//! A long-lived background task that wakes on a fixed interval, claims a
//! bounded batch of due schedules, and publishes each one, recording the
//! outcome on the schedule row. The loop outlives individual failures: a
//! bad iteration is logged and the next tick starts from scratch.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::SchedulerConfig;
use crate::db::Database;
use crate::error::Result;
use crate::publisher::Publisher;
use crate::types::{Schedule, ScheduleStatus};

/// The per-iteration work, shared between the owning [`Scheduler`] and the
/// spawned loop task.
#[derive(Clone)]
struct SchedulerCore {
    db: Database,
    publisher: Publisher,
    batch_limit: i64,
}

impl SchedulerCore {
    /// Run one iteration: claim the due batch and process it in order.
    ///
    /// Returns the number of schedules claimed. Per-schedule failures are
    /// absorbed into schedule state; only store-level failures (claim
    /// unavailable) surface as errors.
    async fn run_once(&self) -> Result<usize> {
        let now = chrono::Utc::now().timestamp();
        let due = self.db.claim_due(now, self.batch_limit).await?;
        let claimed = due.len();

        if claimed > 0 {
            info!("found {} schedule(s) due for publication", claimed);
        }

        for schedule in due {
            self.process(schedule).await;
        }

        Ok(claimed)
    }

    /// Attempt publication for one claimed schedule.
    ///
    /// Every attempt bumps `attempt_count`, success and failure alike. A
    /// failed status update is logged and dropped so one stuck row cannot
    /// take down the rest of the batch; the schedule stays `queued` and is
    /// reclaimed on a later tick.
    async fn process(&self, schedule: Schedule) {
        let attempts = schedule.attempt_count + 1;

        match self.publisher.publish_post(schedule.post_id).await {
            Ok(log) => {
                debug!(
                    "published post {} for schedule {} (log {})",
                    schedule.post_id, schedule.id, log.id
                );
                if let Err(e) = self
                    .db
                    .update_schedule_status(schedule.id, ScheduleStatus::Posted, attempts, None)
                    .await
                {
                    error!(
                        "failed to record success for schedule {}: {}",
                        schedule.id, e
                    );
                }
            }
            Err(e) => {
                warn!(
                    "failed to publish post {} for schedule {}: {}",
                    schedule.post_id, schedule.id, e
                );
                if let Err(db_err) = self
                    .db
                    .update_schedule_status(
                        schedule.id,
                        ScheduleStatus::Failed,
                        attempts,
                        Some(&e.to_string()),
                    )
                    .await
                {
                    error!(
                        "failed to record failure for schedule {}: {}",
                        schedule.id, db_err
                    );
                }
            }
        }
    }
}

struct Worker {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// Owns the scheduler lifecycle.
///
/// `start` spawns the loop task and is a no-op when already running.
/// `stop` is idempotent: it interrupts the interval sleep immediately and
/// waits for any in-flight iteration to finish before returning, so no
/// publish attempt is left half-recorded. Dropping the scheduler without
/// calling `stop` also ends the loop at its next suspension point.
pub struct Scheduler {
    core: SchedulerCore,
    interval: Duration,
    worker: Option<Worker>,
}

impl Scheduler {
    pub fn new(db: Database, publisher: Publisher, config: &SchedulerConfig) -> Self {
        Self {
            core: SchedulerCore {
                db,
                publisher,
                batch_limit: config.batch_limit as i64,
            },
            interval: Duration::from_secs(config.interval_seconds),
            worker: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Spawn the polling loop. No-op if already running.
    pub fn start(&mut self) {
        if self.worker.is_some() {
            debug!("scheduler already running, ignoring start");
            return;
        }

        let (shutdown, mut rx) = watch::channel(false);
        let core = self.core.clone();
        let interval = self.interval;

        let handle = tokio::spawn(async move {
            info!("scheduler started (interval: {}s)", interval.as_secs());
            loop {
                tokio::select! {
                    // Fires on stop() and when the Scheduler is dropped;
                    // either way the loop is done.
                    _ = rx.changed() => break,
                    _ = sleep(interval) => {}
                }

                if let Err(e) = core.run_once().await {
                    error!("scheduler iteration failed: {}", e);
                }
            }
            info!("scheduler stopped");
        });

        self.worker = Some(Worker { shutdown, handle });
    }

    /// Stop the polling loop, waiting for the current iteration to finish.
    /// No-op if not running.
    pub async fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            debug!("scheduler already stopped, ignoring stop");
            return;
        };

        let _ = worker.shutdown.send(true);
        if let Err(e) = worker.handle.await {
            error!("scheduler task did not shut down cleanly: {}", e);
        }
    }

    /// Run a single iteration on the caller's task.
    ///
    /// Used by the daemon's `--once` mode and by tests; behaves exactly
    /// like one wake-up of the background loop.
    pub async fn run_once(&self) -> Result<usize> {
        self.core.run_once().await
    }
}
