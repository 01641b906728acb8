// SPDX-FileCopyrightText: 2026 Proctor Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background profile worker and periodic timeout sweep.
//!
//! Profile jobs are written to the durable queue in the same transaction that
//! completes an interview, so a crash between `end` and synthesis loses
//! nothing: the next drain picks the job up. Bus events only shorten the wait.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use proctor_config::model::WorkerConfig;
use proctor_core::traits::storage::PROFILE_QUEUE;
use proctor_core::types::{InterviewId, QueueEntry};
use proctor_core::{InterviewEvent, ProctorError};

use crate::session::InterviewEngine;

#[derive(Debug, Deserialize)]
struct ProfileJob {
    interview_id: InterviewId,
}

/// Outcome counts for one drain of the profile queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    pub completed: usize,
    pub failed: usize,
}

/// Drains the profile queue and runs the timeout sweep on a schedule.
pub struct ProfileWorker {
    engine: Arc<InterviewEngine>,
    poll_interval: Duration,
    sweep_interval: Duration,
}

impl ProfileWorker {
    pub fn new(engine: Arc<InterviewEngine>, config: &WorkerConfig) -> Self {
        Self {
            engine,
            poll_interval: Duration::from_secs(config.poll_interval_secs),
            sweep_interval: Duration::from_secs(config.sweep_interval_secs),
        }
    }

    /// Processes claimable profile jobs until the queue is empty.
    ///
    /// A failed job goes back to pending and ends the drain; the next drain
    /// retries it until its attempt budget runs out.
    pub async fn drain(&self) -> Result<DrainStats, ProctorError> {
        let store = self.engine.store();
        let mut stats = DrainStats::default();

        while let Some(entry) = store.dequeue(PROFILE_QUEUE).await? {
            match self.process(&entry).await {
                Ok(()) => {
                    store.ack(entry.id).await?;
                    stats.completed += 1;
                }
                Err(e) => {
                    store.fail(entry.id).await?;
                    stats.failed += 1;
                    warn!(
                        job_id = entry.id,
                        attempt = entry.attempts + 1,
                        max_attempts = entry.max_attempts,
                        error = %e,
                        "profile job failed"
                    );
                    break;
                }
            }
        }

        if stats != DrainStats::default() {
            info!(completed = stats.completed, failed = stats.failed, "profile queue drained");
        }
        Ok(stats)
    }

    async fn process(&self, entry: &QueueEntry) -> Result<(), ProctorError> {
        let job: ProfileJob = serde_json::from_str(&entry.payload)
            .map_err(|e| ProctorError::Internal(format!("bad profile job payload: {e}")))?;
        debug!(job_id = entry.id, interview_id = %job.interview_id, "synthesizing profile");
        self.engine
            .synthesizer()
            .synthesize(&job.interview_id)
            .await
            .map(|_| ())
    }

    /// Runs until `cancel` fires.
    ///
    /// Drains on every poll tick and on every `ProfileRequested` event from
    /// `wake`. Sweeps expired interviews on every sweep tick unless the sweep
    /// interval is zero.
    pub async fn run(
        &self,
        mut wake: Option<broadcast::Receiver<InterviewEvent>>,
        cancel: CancellationToken,
    ) {
        let mut poll = tokio::time::interval(self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut sweep = (!self.sweep_interval.is_zero()).then(|| {
            let mut sweep = tokio::time::interval(self.sweep_interval);
            sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
            sweep
        });
        info!(
            poll_secs = self.poll_interval.as_secs(),
            sweep_secs = self.sweep_interval.as_secs(),
            "profile worker started"
        );

        loop {
            let mut bus_closed = false;
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("profile worker stopping");
                    break;
                }
                _ = poll.tick() => self.drain_logged().await,
                _ = next_tick(&mut sweep) => {
                    if let Err(e) = self.engine.sweep(Utc::now()).await {
                        error!(error = %e, "timeout sweep failed");
                    }
                }
                event = next_event(&mut wake) => match event {
                    Ok(InterviewEvent::ProfileRequested { interview_id }) => {
                        debug!(interview_id = %interview_id, "profile requested");
                        self.drain_logged().await;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "worker lagged behind the event bus");
                        self.drain_logged().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("event bus closed, falling back to polling");
                        bus_closed = true;
                    }
                },
            }
            if bus_closed {
                wake = None;
            }
        }
    }

    async fn drain_logged(&self) {
        if let Err(e) = self.drain().await {
            error!(error = %e, "profile queue drain failed");
        }
    }
}

/// Next sweep tick, or never when sweeping is disabled.
async fn next_tick(sweep: &mut Option<Interval>) {
    match sweep {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

/// Next bus event, or never when there is no bus.
async fn next_event(
    wake: &mut Option<broadcast::Receiver<InterviewEvent>>,
) -> Result<InterviewEvent, broadcast::error::RecvError> {
    match wake {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
