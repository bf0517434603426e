//! The scheduler loop for one instrument.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::metrics;
use crate::pipeline::PipelineEngine;
use crate::safety::{AbortReason, CancelSignal, SafetyMonitor};
use crate::task::{Outcome, Task};

use super::config::SchedulerConfig;
use super::portal::{Claim, ClaimToken, PortalClient};
use super::types::{select_next, SchedulerError};

/// Polls the portal, claims at most one task at a time and drives it
/// through the pipeline engine.
///
/// Claim exclusivity lives in the portal; the scheduler only ever runs a
/// task it was granted. A fresh safety monitor is spawned for each run so
/// monitor and run lifetimes coincide.
pub struct TaskScheduler {
    instrument: String,
    portal: Arc<dyn PortalClient>,
    engine: Arc<PipelineEngine>,
    safety: Arc<SafetyMonitor>,
    config: SchedulerConfig,
    /// Held for the duration of a run; a granted claim that cannot take
    /// it within the start grace is given back.
    busy: Mutex<()>,
    shutdown: CancelSignal,
}

/// Handle to a running scheduler loop.
pub struct SchedulerHandle {
    shutdown: CancelSignal,
    handle: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Requests shutdown and waits for the loop to exit. A run in
    /// progress is aborted through its cancel signal and still reports
    /// its outcome.
    pub async fn stop(self) {
        self.shutdown.cancel(AbortReason::Shutdown);
        let _ = self.handle.await;
    }
}

impl TaskScheduler {
    pub fn new(
        instrument: impl Into<String>,
        portal: Arc<dyn PortalClient>,
        engine: Arc<PipelineEngine>,
        safety: Arc<SafetyMonitor>,
        config: SchedulerConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            instrument: instrument.into(),
            portal,
            engine,
            safety,
            config,
            busy: Mutex::new(()),
            shutdown: CancelSignal::new(),
        })
    }

    /// Spawns the scheduler loop.
    pub fn start(self: &Arc<Self>) -> SchedulerHandle {
        let scheduler = Arc::clone(self);
        let interval = Duration::from_millis(self.config.poll_interval_ms);

        let handle = tokio::spawn(async move {
            info!(instrument = %scheduler.instrument, "scheduler started");
            loop {
                tokio::select! {
                    _ = scheduler.shutdown.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {
                        if let Err(e) = scheduler.tick().await {
                            warn!(instrument = %scheduler.instrument, "scheduler tick failed: {e}");
                        }
                    }
                }
            }
            info!(instrument = %scheduler.instrument, "scheduler stopped");
        });

        SchedulerHandle {
            shutdown: self.shutdown.clone(),
            handle,
        }
    }

    /// One poll cycle: list, pick, claim, run.
    async fn tick(&self) -> Result<(), SchedulerError> {
        let tasks = self.portal.list_tasks(&self.instrument).await?;
        let Some(task) = select_next(tasks, Utc::now()) else {
            return Ok(());
        };

        match self.portal.claim(&task.id).await? {
            Claim::Conflict => {
                metrics::SCHEDULER_CLAIMS
                    .with_label_values(&["conflict"])
                    .inc();
                debug!(task_id = %task.id, "task claimed by another orchestrator");
                Ok(())
            }
            Claim::Granted(token) => {
                metrics::SCHEDULER_CLAIMS
                    .with_label_values(&["granted"])
                    .inc();
                self.execute(task, token).await
            }
        }
    }

    async fn execute(&self, task: Task, token: ClaimToken) -> Result<(), SchedulerError> {
        debug!(task_id = %task.id, granted_at = %token.granted_at, "claim granted");

        let grace = Duration::from_millis(self.config.start_grace_ms);
        let Ok(_busy) = tokio::time::timeout(grace, self.busy.lock()).await else {
            warn!(task_id = %task.id, "instrument busy past start grace, giving claim back");
            self.portal
                .report(
                    &task.id,
                    Outcome::Aborted {
                        reason: "claim expired before run start".to_string(),
                    },
                )
                .await?;
            return Ok(());
        };

        let cancel = CancelSignal::new();
        let watch = self.safety.watch(cancel.clone());

        let run = self.engine.run(&task, &cancel);
        tokio::pin!(run);
        let result = tokio::select! {
            res = &mut run => res,
            _ = self.shutdown.cancelled() => {
                cancel.cancel(AbortReason::Shutdown);
                run.await
            }
        };

        watch.stop().await;

        info!(
            task_id = %task.id,
            run_id = %result.run_id,
            outcome = result.outcome.label(),
            "reporting run outcome"
        );
        self.portal.report(&task.id, result.outcome).await?;
        Ok(())
    }
}
