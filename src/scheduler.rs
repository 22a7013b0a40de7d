use anyhow::Result;
use chrono::{Days, Local, NaiveDate};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Duration;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::config::SchedulerConfig;
use crate::state::SharedState;

/// Delete daily logs dated before `today - retention_days`.
pub async fn run_retention_cleanup(
    state: &SharedState,
    today: NaiveDate,
    retention_days: u32,
) -> Result<u64> {
    let cutoff = today
        .checked_sub_days(Days::new(u64::from(retention_days)))
        .unwrap_or(NaiveDate::MIN);
    let deleted = state.daily_logs.delete_older_than(cutoff).await?;
    info!(event = "retention_cleanup", %cutoff, deleted, "Old daily logs removed");
    Ok(deleted)
}

pub async fn flush_caches(state: &SharedState) {
    state.cache.clear_all().await;
}

fn elapsed_ms(start: std::time::Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

pub struct Scheduler {
    state: SharedState,
    config: SchedulerConfig,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    #[must_use]
    pub fn new(state: SharedState, config: SchedulerConfig) -> Self {
        Self {
            state,
            config,
            running: Arc::new(RwLock::new(false)),
        }
    }

    /// Runs until [`Scheduler::stop`] is called.
    pub async fn start(&self) -> Result<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in config");
            return Ok(());
        }

        *self.running.write().await = true;
        info!("Starting background scheduler");

        let mut sched = JobScheduler::new().await?;

        let state_for_cleanup = self.state.clone();
        let retention_days = self.config.retention_days;
        let cleanup_job = Job::new_async(self.config.cleanup_cron.as_str(), move |_uuid, _lock| {
            let state = state_for_cleanup.clone();
            Box::pin(async move {
                let start = std::time::Instant::now();
                info!(event = "job_started", job_name = "retention_cleanup", "Starting daily log retention cleanup");

                let today = Local::now().date_naive();
                if let Err(e) = run_retention_cleanup(&state, today, retention_days).await {
                    error!(event = "job_failed", job_name = "retention_cleanup", error = %e, "Retention cleanup failed");
                    return;
                }

                info!(
                    event = "job_finished",
                    job_name = "retention_cleanup",
                    duration_ms = elapsed_ms(start),
                    "Retention cleanup finished"
                );
            })
        })?;

        let state_for_flush = self.state.clone();
        let flush_job = Job::new_async(self.config.cache_flush_cron.as_str(), move |_uuid, _lock| {
            let state = state_for_flush.clone();
            Box::pin(async move {
                let start = std::time::Instant::now();
                info!(event = "job_started", job_name = "cache_flush", "Flushing caches");

                flush_caches(&state).await;

                info!(
                    event = "job_finished",
                    job_name = "cache_flush",
                    duration_ms = elapsed_ms(start),
                    "Caches flushed"
                );
            })
        })?;

        sched.add(cleanup_job).await?;
        sched.add(flush_job).await?;
        sched.start().await?;

        info!("Retention cleanup scheduled: {}", self.config.cleanup_cron);
        info!("Cache flush scheduled: {}", self.config.cache_flush_cron);

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        info!("Scheduler stopped");
        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping scheduler...");
        *self.running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }
}
