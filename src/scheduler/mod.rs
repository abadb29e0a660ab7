//! Recurring keyword schedules and the favorites sweep.
//!
//! Two jobs run as independent loops: a frequent tick that fires due keyword
//! schedules, and a slower favorites sweep. Each loop awaits its own work,
//! so a job never overlaps itself. Late ticks are skipped rather than
//! replayed.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::models::{KeywordSchedule, RunKind, SchedulerStatus, KEYWORD_SCHEDULER};
use crate::repository::{DbContext, DbError};
use crate::services::{RunOrchestrator, RunOutcome};

/// Loop cadences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub tick_interval: Duration,
    pub favorites_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(60),
            favorites_interval: Duration::from_secs(3600),
        }
    }
}

/// What one schedule tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub due: usize,
    pub executed: usize,
    pub failed: usize,
    pub skipped: usize,
}

enum ScheduleResult {
    Executed,
    Failed,
    Skipped,
}

/// Keyword scheduler.
#[derive(Clone)]
pub struct Scheduler {
    db: DbContext,
    orchestrator: RunOrchestrator,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(db: DbContext, orchestrator: RunOrchestrator, config: SchedulerConfig) -> Self {
        Self {
            db,
            orchestrator,
            config,
        }
    }

    /// Fire every schedule due at `now`.
    ///
    /// A failing schedule keeps its cursor, so the next tick retries it, and
    /// does not stop the remaining schedules.
    pub async fn tick(&self, now: DateTime<Utc>) -> Result<TickReport, DbError> {
        if let Err(e) = self.heartbeat(now).await {
            warn!("Failed to record scheduler heartbeat: {}", e);
        }

        let due = self.db.schedules().due(now).await?;
        let mut report = TickReport {
            due: due.len(),
            ..Default::default()
        };

        for schedule in &due {
            match self.run_schedule(schedule, now).await {
                Ok(ScheduleResult::Executed) => report.executed += 1,
                Ok(ScheduleResult::Skipped) => report.skipped += 1,
                Ok(ScheduleResult::Failed) => report.failed += 1,
                Err(e) => {
                    report.failed += 1;
                    error!("Schedule {} failed: {}", schedule.id, e);
                }
            }
        }

        if report.due > 0 {
            info!(
                "Tick: {} due, {} executed, {} failed, {} skipped",
                report.due, report.executed, report.failed, report.skipped
            );
        }
        Ok(report)
    }

    async fn run_schedule(
        &self,
        schedule: &KeywordSchedule,
        now: DateTime<Utc>,
    ) -> Result<ScheduleResult, DbError> {
        // Re-read: the schedule may have been changed since the due query
        let Some(mut current) = self.db.schedules().get(schedule.id).await? else {
            debug!("Schedule {} disappeared, skipping", schedule.id);
            return Ok(ScheduleResult::Skipped);
        };
        if !current.active {
            debug!("Schedule {} is inactive, skipping", current.id);
            return Ok(ScheduleResult::Skipped);
        }
        let Some(keyword) = self.db.keywords().get(current.keyword_id).await? else {
            warn!(
                "Keyword {} for schedule {} not found, skipping",
                current.keyword_id, current.id
            );
            return Ok(ScheduleResult::Skipped);
        };

        let outcome = self
            .orchestrator
            .run(std::slice::from_ref(&keyword), RunKind::Schedule)
            .await?;
        if !outcome.is_success() {
            return Ok(ScheduleResult::Failed);
        }

        current.advance(now);
        self.db.schedules().save_cursor(&current).await?;
        debug!(
            "Schedule {} ('{}') next run at {:?}",
            current.id, keyword.keyword, current.next_run_at
        );
        Ok(ScheduleResult::Executed)
    }

    /// Run one favorites sweep over all tracked sites.
    pub async fn sweep_favorites(&self) -> Result<RunOutcome, DbError> {
        let sites = self.db.tracked_sites().list().await?;
        self.orchestrator.sweep_favorites(&sites).await
    }

    async fn heartbeat(&self, now: DateTime<Utc>) -> Result<(), DbError> {
        let repo = self.db.scheduler_status();
        let mut status = repo
            .get(KEYWORD_SCHEDULER)
            .await?
            .unwrap_or_else(|| SchedulerStatus::new(KEYWORD_SCHEDULER));
        status.beat(now);
        repo.upsert(&status).await
    }

    async fn mark_stopped(&self) -> Result<(), DbError> {
        let repo = self.db.scheduler_status();
        let mut status = repo
            .get(KEYWORD_SCHEDULER)
            .await?
            .unwrap_or_else(|| SchedulerStatus::new(KEYWORD_SCHEDULER));
        status.set_stopped(Utc::now());
        repo.upsert(&status).await
    }

    /// Run both jobs until Ctrl-C, SIGTERM, or a message on `shutdown`.
    pub async fn run_until_shutdown(&self, shutdown: broadcast::Sender<()>) {
        info!(
            "Scheduler started (tick every {:?}, favorites every {:?})",
            self.config.tick_interval, self.config.favorites_interval
        );

        let schedule_job = tokio::spawn(self.clone().schedule_loop(shutdown.subscribe()));
        let favorites_job = tokio::spawn(self.clone().favorites_loop(shutdown.subscribe()));
        let mut shutdown_rx = shutdown.subscribe();

        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
            _ = wait_for_sigterm() => info!("Received SIGTERM, shutting down"),
            _ = shutdown_rx.recv() => info!("Shutdown requested"),
        }

        let _ = shutdown.send(());
        for (name, job) in [("schedule", schedule_job), ("favorites", favorites_job)] {
            if let Err(e) = job.await {
                warn!("{} job ended abnormally: {}", name, e);
            }
        }

        if let Err(e) = self.mark_stopped().await {
            warn!("Failed to mark scheduler stopped: {}", e);
        }
        info!("Scheduler stopped");
    }

    async fn schedule_loop(self, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut interval = tokio::time::interval(self.config.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.tick(Utc::now()).await {
                        error!("Schedule tick failed: {}", e);
                    }
                }
                _ = shutdown_rx.recv() => break,
            }
        }
    }

    /// The first sweep waits one full period after startup.
    async fn favorites_loop(self, mut shutdown_rx: broadcast::Receiver<()>) {
        let period = self.config.favorites_interval;
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = self.sweep_favorites().await {
                        error!("Favorites sweep failed: {}", e);
                    }
                }
                _ = shutdown_rx.recv() => break,
            }
        }
    }
}

#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("Failed to register SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}
