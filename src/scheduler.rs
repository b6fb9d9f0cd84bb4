//! In-process job scheduler
//!
//! Replaces the external cron triggers: the suspension sweep runs daily at
//! a configured UTC hour, the finalization sweep on a fixed interval. A
//! failed run is logged and the loop continues to its next tick; the
//! per-job mutex keeps a manual trigger from overlapping a scheduled run
//! in the same process.

use crate::config::JobsConfig;
use crate::db::Database;
use crate::notify::Notifier;
use crate::settlement::{
    FinalizeReport, SettlementError, SuspensionReport, finalize_expired_windows,
    suspend_overdue_vendors,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{MissedTickBehavior, interval, sleep};

pub struct JobRunner {
    db: Arc<Database>,
    jobs: JobsConfig,
    notifier: Arc<dyn Notifier>,
    suspension_lock: Mutex<()>,
    finalize_lock: Mutex<()>,
}

impl JobRunner {
    pub fn new(db: Arc<Database>, jobs: JobsConfig, notifier: Arc<dyn Notifier>) -> Arc<Self> {
        Arc::new(Self {
            db,
            jobs,
            notifier,
            suspension_lock: Mutex::new(()),
            finalize_lock: Mutex::new(()),
        })
    }

    /// Run the suspension sweep once (scheduled tick or manual trigger)
    pub async fn run_suspension(&self) -> Result<SuspensionReport, SettlementError> {
        let _guard = self.suspension_lock.lock().await;
        suspend_overdue_vendors(self.db.pool()).await
    }

    /// Run the finalization sweep once (scheduled tick or manual trigger)
    pub async fn run_finalization(&self) -> Result<FinalizeReport, SettlementError> {
        let _guard = self.finalize_lock.lock().await;
        finalize_expired_windows(self.db.pool(), self.notifier.as_ref()).await
    }

    /// Spawn both job loops onto the runtime
    pub fn spawn(self: &Arc<Self>) {
        let runner = self.clone();
        tokio::spawn(async move {
            loop {
                let wait = duration_until_hour_utc(Utc::now(), runner.jobs.suspension_hour_utc);
                tracing::info!(
                    target: "JOBS",
                    "next suspension sweep in {}s",
                    wait.as_secs()
                );
                sleep(wait).await;
                if let Err(e) = runner.run_suspension().await {
                    tracing::error!(target: "JOBS", "suspension sweep failed: {}", e);
                }
            }
        });

        let runner = self.clone();
        tokio::spawn(async move {
            let mut tick =
                interval(std::time::Duration::from_secs(runner.jobs.finalize_interval_secs));
            // A stuck run delays only its own next tick; no catch-up burst
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tick.tick().await;
                if let Err(e) = runner.run_finalization().await {
                    tracing::error!(target: "JOBS", "finalization sweep failed: {}", e);
                }
            }
        });
    }
}

/// Time until the next occurrence of `hour`:00 UTC, strictly in the future
fn duration_until_hour_utc(now: DateTime<Utc>, hour: u32) -> std::time::Duration {
    let hour = hour.min(23);
    let today = now
        .date_naive()
        .and_hms_opt(hour, 0, 0)
        .expect("valid wall-clock time")
        .and_utc();
    let next = if today > now {
        today
    } else {
        today + chrono::Duration::days(1)
    };
    (next - now).to_std().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_next_run_later_today() {
        let now = Utc.with_ymd_and_hms(2025, 1, 26, 0, 30, 0).unwrap();
        let wait = duration_until_hour_utc(now, 2);
        assert_eq!(wait.as_secs(), 90 * 60);
    }

    #[test]
    fn test_next_run_tomorrow() {
        let now = Utc.with_ymd_and_hms(2025, 1, 26, 2, 0, 0).unwrap();
        let wait = duration_until_hour_utc(now, 2);
        assert_eq!(wait.as_secs(), 24 * 60 * 60);
    }

    #[test]
    fn test_next_run_after_hour_passed() {
        let now = Utc.with_ymd_and_hms(2025, 1, 26, 23, 0, 0).unwrap();
        let wait = duration_until_hour_utc(now, 2);
        assert_eq!(wait.as_secs(), 3 * 60 * 60);
    }

    #[test]
    fn test_out_of_range_hour_clamped() {
        let now = Utc.with_ymd_and_hms(2025, 1, 26, 22, 0, 0).unwrap();
        let wait = duration_until_hour_utc(now, 99);
        assert_eq!(wait.as_secs(), 60 * 60);
    }
}
