//! Agent monitoring.
//!
//! This module keeps a dynamic set of remote agent jobs under observation:
//!
//! - [`poller`]: one cancellable polling task per job
//! - [`diff`]: detection of new log lines and status transitions
//! - [`dispatch`]: conversion of those changes into notifications and callbacks
//!
//! [`AgentMonitor`] ties them together and owns the lifecycle of every poller,
//! including the global enabled switch.

pub mod diff;
pub mod dispatch;
pub mod poller;

pub use diff::MonitorEvent;
pub use dispatch::{EventDispatcher, MonitorCallbacks};
pub use poller::PollerHandle;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

use crate::api::AgentBackend;
use crate::notification::Notification;
use crate::state::{Job, JobRegistry, JobSummary, LogEntry, MonitorEntry, StatusSnapshot};
use poller::{PollContext, Poller};

/// Default polling interval for a job.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Capacity of the notification channel.
pub const NOTIFICATION_BUFFER: usize = 100;

/// Monitor settings.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub poll_interval: Duration,
    /// Whether polling starts enabled.
    pub enabled: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            enabled: true,
        }
    }
}

struct Control {
    enabled: bool,
    /// Set by `shutdown`; no poller is started afterwards.
    shut_down: bool,
}

/// Lifecycle controller for monitored agent jobs.
///
/// Per job: unregistered → active (polling) → terminal (stopped, still
/// queryable) → removed. Lifecycle operations are serialized; pollers only
/// ever touch their own registry row.
pub struct AgentMonitor {
    ctx: PollContext,
    config: MonitorConfig,
    control: Mutex<Control>,
    tracker: TaskTracker,
    root: CancellationToken,
    next_generation: AtomicU64,
}

impl AgentMonitor {
    /// Create a monitor and the receiving end of its notifications.
    pub fn new(
        backend: Arc<dyn AgentBackend>,
        config: MonitorConfig,
        callbacks: MonitorCallbacks,
    ) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(NOTIFICATION_BUFFER);
        let monitor = Self {
            ctx: PollContext {
                registry: JobRegistry::new(),
                backend,
                dispatcher: EventDispatcher::new(tx, callbacks),
            },
            control: Mutex::new(Control {
                enabled: config.enabled,
                shut_down: false,
            }),
            config,
            tracker: TaskTracker::new(),
            root: CancellationToken::new(),
            next_generation: AtomicU64::new(1),
        };
        (monitor, rx)
    }

    /// Start monitoring a job with the configured interval.
    pub async fn register(&self, job: Job) {
        self.register_inner(job, None).await;
    }

    /// Start monitoring a job with its own interval, kept across pause and
    /// resume. Registering an id again replaces its poller.
    pub async fn register_with_interval(&self, job: Job, interval: Duration) {
        self.register_inner(job, Some(interval)).await;
    }

    async fn register_inner(&self, job: Job, interval: Option<Duration>) {
        let control = self.control.lock().await;
        let job_id = job.id.clone();
        let active = job.is_active();

        if let Some(previous) = self.ctx.registry.upsert_with_interval(job, interval).await {
            previous.stop();
        }
        info!(%job_id, "job registered");

        if control.enabled && active {
            self.start(&control, &job_id, interval).await;
        }
    }

    /// Stop monitoring a job and forget it. Unknown ids are ignored.
    pub async fn unregister(&self, job_id: &str) {
        let _control = self.control.lock().await;
        if let Some(entry) = self.ctx.registry.remove(job_id).await {
            if let Some(poller) = entry.poller {
                poller.stop();
            }
            info!(job_id, "job unregistered");
        }
    }

    /// Stop the poller of one job, keeping its entry. A no-op if none runs.
    pub async fn stop(&self, job_id: &str) {
        let _control = self.control.lock().await;
        if let Some(poller) = self.ctx.registry.detach_poller(job_id, None).await {
            poller.stop();
            debug!(job_id, "poller stopped");
        }
    }

    /// Flip the global switch.
    ///
    /// Disabling stops every poller but keeps all entries. Enabling starts a
    /// fresh poller for every registered job that is not terminal.
    pub async fn set_enabled(&self, enabled: bool) {
        let mut control = self.control.lock().await;
        if control.shut_down {
            debug!(enabled, "monitor is shut down, switch ignored");
            return;
        }
        if control.enabled == enabled {
            return;
        }
        control.enabled = enabled;

        if enabled {
            let jobs = self.ctx.registry.resumable().await;
            info!(jobs = jobs.len(), "monitoring enabled");
            for (job, interval) in jobs {
                self.start(&control, &job.id, interval).await;
            }
        } else {
            let pollers = self.ctx.registry.detach_all().await;
            info!(pollers = pollers.len(), "monitoring disabled");
            for poller in pollers {
                poller.stop();
            }
        }
    }

    pub async fn is_enabled(&self) -> bool {
        self.control.lock().await.enabled
    }

    /// Stop every poller and wait for their tasks to finish.
    pub async fn shutdown(&self) {
        {
            let mut control = self.control.lock().await;
            control.enabled = false;
            control.shut_down = true;
            for poller in self.ctx.registry.detach_all().await {
                poller.stop();
            }
        }
        self.root.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        info!("monitor shut down");
    }

    async fn start(&self, control: &Control, job_id: &str, interval: Option<Duration>) {
        if control.shut_down || self.root.is_cancelled() {
            return;
        }
        let interval = interval.unwrap_or(self.config.poll_interval);
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let handle = PollerHandle::new(generation, self.root.child_token());
        if !self.ctx.registry.attach_poller(job_id, handle.clone()).await {
            return;
        }

        let poller = Poller::new(job_id.to_string(), interval, handle, self.ctx.clone());
        self.tracker.spawn(poller.run());
        debug!(job_id, generation, ?interval, "poller spawned");
    }

    /// Jobs in registration order.
    pub async fn jobs(&self) -> Vec<Job> {
        self.ctx.registry.snapshot().await
    }

    pub async fn summaries(&self) -> Vec<JobSummary> {
        self.ctx.registry.summaries().await
    }

    pub async fn logs(&self, job_id: &str) -> Option<Vec<LogEntry>> {
        self.ctx.registry.logs(job_id).await
    }

    pub async fn status(&self, job_id: &str) -> Option<StatusSnapshot> {
        self.ctx.registry.status(job_id).await
    }

    pub async fn entry(&self, job_id: &str) -> Option<MonitorEntry> {
        self.ctx.registry.get_entry(job_id).await
    }

    pub async fn is_polling(&self, job_id: &str) -> bool {
        self.ctx
            .registry
            .get_entry(job_id)
            .await
            .is_some_and(|e| e.is_polling())
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.ctx.registry
    }
}

impl Drop for AgentMonitor {
    fn drop(&mut self) {
        self.root.cancel();
    }
}
