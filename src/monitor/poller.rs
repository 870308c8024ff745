//! Per-job polling loop.
//!
//! Each registered job gets its own task. A tick fetches status and logs
//! concurrently, commits the result to the registry and dispatches whatever
//! changed. The next tick is only armed once the previous one has resolved,
//! so ticks for one job never overlap.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::dispatch::EventDispatcher;
use crate::api::AgentBackend;
use crate::state::JobRegistry;

/// Cancellation handle stored in the registry row of a polled job.
#[derive(Debug, Clone)]
pub struct PollerHandle {
    generation: u64,
    token: CancellationToken,
}

impl PollerHandle {
    pub fn new(generation: u64, token: CancellationToken) -> Self {
        Self { generation, token }
    }

    /// Identifies one poller instance; a job re-registered or resumed gets a
    /// new generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stop the poller. Stopping twice is harmless.
    pub fn stop(&self) {
        self.token.cancel();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Collaborators shared by every poller of one monitor.
#[derive(Clone)]
pub(crate) struct PollContext {
    pub registry: JobRegistry,
    pub backend: Arc<dyn AgentBackend>,
    pub dispatcher: EventDispatcher,
}

/// Outcome of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tick {
    /// Poll again after the interval.
    Continue,
    /// Job reached a terminal status.
    Terminal,
    /// The poller no longer owns the registry row.
    Detached,
}

pub(crate) struct Poller {
    job_id: String,
    interval: Duration,
    handle: PollerHandle,
    ctx: PollContext,
}

impl Poller {
    pub(crate) fn new(job_id: String, interval: Duration, handle: PollerHandle, ctx: PollContext) -> Self {
        Self {
            job_id,
            interval,
            handle,
            ctx,
        }
    }

    pub(crate) async fn run(self) {
        debug!(job_id = %self.job_id, generation = self.handle.generation, "poller started");

        loop {
            if self.handle.is_stopped() {
                break;
            }

            match self.tick().await {
                Tick::Continue => {}
                Tick::Terminal => {
                    self.ctx
                        .registry
                        .detach_poller(&self.job_id, Some(self.handle.generation))
                        .await;
                    self.handle.stop();
                    info!(job_id = %self.job_id, "job reached a terminal status, polling stopped");
                    break;
                }
                Tick::Detached => break,
            }

            tokio::select! {
                _ = self.handle.token.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        debug!(job_id = %self.job_id, generation = self.handle.generation, "poller exited");
    }

    pub(crate) async fn tick(&self) -> Tick {
        let job_id = self.job_id.as_str();
        let (status, logs) = tokio::join!(
            self.ctx.backend.fetch_status(job_id),
            self.ctx.backend.fetch_logs(job_id),
        );

        let (status, logs) = match (status, logs) {
            (Ok(status), Ok(logs)) => (status, logs),
            (Err(e), _) | (_, Err(e)) => {
                warn!(job_id, error = %e, "poll failed");
                let owned = self
                    .ctx
                    .registry
                    .record_failure(job_id, self.handle.generation, e.to_string())
                    .await;
                return if owned { Tick::Continue } else { Tick::Detached };
            }
        };

        let terminal = status.status.is_terminal();
        let Some(commit) = self
            .ctx
            .registry
            .commit(job_id, self.handle.generation, status, logs)
            .await
        else {
            debug!(job_id, "discarding tick of a stopped poller");
            return Tick::Detached;
        };

        if !commit.events.is_empty() {
            debug!(job_id, events = commit.events.len(), "dispatching tick events");
            self.ctx.dispatcher.dispatch(&commit.job, commit.events).await;
        }

        if terminal {
            Tick::Terminal
        } else {
            Tick::Continue
        }
    }
}
