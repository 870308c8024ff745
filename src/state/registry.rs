//! Job registry.
//!
//! The registry is the only state shared between pollers. Every mutation
//! replaces a whole row under the write lock; readers clone what they need
//! under the read lock.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use tokio::sync::RwLock;
use tracing::warn;

use crate::monitor::diff::{diff, MonitorEvent};
use crate::monitor::PollerHandle;
use crate::state::{Job, LogEntry, StatusSnapshot};

/// One registry row.
#[derive(Debug, Clone)]
pub struct MonitorEntry {
    pub job: Job,
    /// Absent until the first successful poll.
    pub last_status: Option<StatusSnapshot>,
    pub logs: Vec<LogEntry>,
    pub poller: Option<PollerHandle>,
    /// Polling interval requested at registration; `None` uses the monitor default.
    pub interval: Option<Duration>,
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
    pub last_polled: Option<DateTime<Utc>>,
    seq: u64,
}

impl MonitorEntry {
    fn new(job: Job, seq: u64) -> Self {
        Self {
            job,
            last_status: None,
            logs: Vec::new(),
            poller: None,
            interval: None,
            last_error: None,
            consecutive_failures: 0,
            last_polled: None,
            seq,
        }
    }

    pub fn last_log_count(&self) -> usize {
        self.logs.len()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_some()
    }

    fn owned_by(&self, generation: u64) -> bool {
        self.poller
            .as_ref()
            .is_some_and(|p| p.generation() == generation && !p.is_stopped())
    }
}

/// Dashboard row for one job.
#[derive(Debug, Clone)]
pub struct JobSummary {
    pub job: Job,
    pub polling: bool,
    pub last_error: Option<String>,
    pub status_message: Option<String>,
    pub progress: Option<f64>,
    pub log_count: usize,
}

/// Result of a committed tick.
#[derive(Debug)]
pub struct TickCommit {
    /// Registry copy of the job after the snapshot was applied.
    pub job: Job,
    pub events: Vec<MonitorEvent>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, MonitorEntry>,
    next_seq: u64,
}

/// Map from job id to its monitor entry.
#[derive(Clone, Default)]
pub struct JobRegistry {
    inner: Arc<RwLock<Inner>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a job or replace the job copy of an existing row.
    ///
    /// Stored snapshots survive a re-registration so already seen logs are not
    /// reported again. Any poller attached to the old row is detached and
    /// returned for the caller to stop.
    pub async fn upsert(&self, job: Job) -> Option<PollerHandle> {
        self.upsert_with_interval(job, None).await
    }

    /// Like [`upsert`](Self::upsert), also recording the job's own polling
    /// interval. The interval outlives pollers, so a resumed job keeps it.
    pub async fn upsert_with_interval(&self, job: Job, interval: Option<Duration>) -> Option<PollerHandle> {
        let mut inner = self.inner.write().await;
        let seq = inner.next_seq;
        match inner.entries.get_mut(&job.id) {
            Some(entry) => {
                entry.job = job;
                entry.interval = interval;
                entry.poller.take()
            }
            None => {
                inner.next_seq += 1;
                let mut entry = MonitorEntry::new(job, seq);
                entry.interval = interval;
                inner.entries.insert(entry.job.id.clone(), entry);
                None
            }
        }
    }

    pub async fn remove(&self, job_id: &str) -> Option<MonitorEntry> {
        self.inner.write().await.entries.remove(job_id)
    }

    /// Jobs in registration order.
    pub async fn snapshot(&self) -> Vec<Job> {
        let inner = self.inner.read().await;
        inner
            .entries
            .values()
            .sorted_by_key(|e| e.seq)
            .map(|e| e.job.clone())
            .collect()
    }

    pub async fn summaries(&self) -> Vec<JobSummary> {
        let inner = self.inner.read().await;
        inner
            .entries
            .values()
            .sorted_by_key(|e| e.seq)
            .map(|e| JobSummary {
                job: e.job.clone(),
                polling: e.is_polling(),
                last_error: e.last_error.clone(),
                status_message: e.last_status.as_ref().map(|s| s.message.clone()),
                progress: e.last_status.as_ref().and_then(StatusSnapshot::progress_ratio),
                log_count: e.logs.len(),
            })
            .collect()
    }

    pub async fn get_entry(&self, job_id: &str) -> Option<MonitorEntry> {
        self.inner.read().await.entries.get(job_id).cloned()
    }

    pub async fn contains(&self, job_id: &str) -> bool {
        self.inner.read().await.entries.contains_key(job_id)
    }

    pub async fn logs(&self, job_id: &str) -> Option<Vec<LogEntry>> {
        self.inner
            .read()
            .await
            .entries
            .get(job_id)
            .map(|e| e.logs.clone())
    }

    pub async fn status(&self, job_id: &str) -> Option<StatusSnapshot> {
        self.inner
            .read()
            .await
            .entries
            .get(job_id)
            .and_then(|e| e.last_status.clone())
    }

    /// Attach a poller to a row. Returns false if the job is not registered.
    pub async fn attach_poller(&self, job_id: &str, handle: PollerHandle) -> bool {
        match self.inner.write().await.entries.get_mut(job_id) {
            Some(entry) => {
                entry.poller = Some(handle);
                true
            }
            None => false,
        }
    }

    /// Detach the poller of a row.
    ///
    /// With a generation, only that exact poller is detached; a poller that
    /// has already been replaced leaves the row alone.
    pub async fn detach_poller(&self, job_id: &str, generation: Option<u64>) -> Option<PollerHandle> {
        let mut inner = self.inner.write().await;
        let entry = inner.entries.get_mut(job_id)?;
        match generation {
            Some(generation)
                if entry.poller.as_ref().map(PollerHandle::generation) != Some(generation) =>
            {
                None
            }
            _ => entry.poller.take(),
        }
    }

    pub async fn detach_all(&self) -> Vec<PollerHandle> {
        let mut inner = self.inner.write().await;
        inner
            .entries
            .values_mut()
            .filter_map(|e| e.poller.take())
            .collect()
    }

    /// Non-terminal jobs that currently have no poller, in registration
    /// order, with their recorded interval.
    pub async fn resumable(&self) -> Vec<(Job, Option<Duration>)> {
        let inner = self.inner.read().await;
        inner
            .entries
            .values()
            .filter(|e| e.poller.is_none() && e.job.is_active())
            .sorted_by_key(|e| e.seq)
            .map(|e| (e.job.clone(), e.interval))
            .collect()
    }

    /// Diff a fresh tick against the stored row and replace it.
    ///
    /// Returns `None` without touching the row when the poller identified by
    /// `generation` no longer owns it (stopped, replaced or unregistered).
    pub async fn commit(
        &self,
        job_id: &str,
        generation: u64,
        status: StatusSnapshot,
        logs: Vec<LogEntry>,
    ) -> Option<TickCommit> {
        let mut inner = self.inner.write().await;
        let entry = inner.entries.get_mut(job_id)?;
        if !entry.owned_by(generation) {
            return None;
        }

        let events = diff(entry, &status, &logs);
        if logs.len() < entry.last_log_count() {
            warn!(
                job_id,
                previous = entry.last_log_count(),
                fresh = logs.len(),
                "log stream shrank, treating it as a new stream"
            );
        }

        entry.job.apply_snapshot(&status);
        entry.last_status = Some(status);
        entry.logs = logs;
        entry.last_error = None;
        entry.consecutive_failures = 0;
        entry.last_polled = Some(Utc::now());

        Some(TickCommit {
            job: entry.job.clone(),
            events,
        })
    }

    /// Flag a failed tick on the row. Snapshots are left unchanged.
    pub async fn record_failure(&self, job_id: &str, generation: u64, error: String) -> bool {
        let mut inner = self.inner.write().await;
        match inner.entries.get_mut(job_id) {
            Some(entry) if entry.owned_by(generation) => {
                entry.last_error = Some(error);
                entry.consecutive_failures += 1;
                true
            }
            _ => false,
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{JobStatus, LogLevel};
    use pretty_assertions::assert_eq;
    use tokio_util::sync::CancellationToken;

    fn logs(job_id: &str, count: usize) -> Vec<LogEntry> {
        (0..count)
            .map(|i| LogEntry::new(i.to_string(), job_id, LogLevel::Info, format!("line {i}")))
            .collect()
    }

    async fn registry_with(job_id: &str, generation: u64) -> (JobRegistry, PollerHandle) {
        let registry = JobRegistry::new();
        registry
            .upsert(Job::new(job_id, "plumbers", JobStatus::Running))
            .await;
        let handle = PollerHandle::new(generation, CancellationToken::new());
        assert!(registry.attach_poller(job_id, handle.clone()).await);
        (registry, handle)
    }

    #[tokio::test]
    async fn snapshot_keeps_registration_order() {
        let registry = JobRegistry::new();
        for id in ["c", "a", "b"] {
            registry.upsert(Job::new(id, "q", JobStatus::Running)).await;
        }
        // Re-registering does not move a job to the back.
        registry.upsert(Job::new("c", "q2", JobStatus::Paused)).await;

        let ids: Vec<String> = registry.snapshot().await.into_iter().map(|j| j.id).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert_eq!(registry.get_entry("c").await.unwrap().job.query, "q2");
    }

    #[tokio::test]
    async fn upsert_hands_back_the_previous_poller() {
        let (registry, handle) = registry_with("j1", 1).await;

        let previous = registry
            .upsert(Job::new("j1", "plumbers", JobStatus::Running))
            .await
            .expect("previous poller");
        assert_eq!(previous.generation(), handle.generation());
        assert!(!registry.get_entry("j1").await.unwrap().is_polling());
    }

    #[tokio::test]
    async fn commit_updates_row_and_job_copy() {
        let (registry, _handle) = registry_with("j1", 1).await;

        let mut status = StatusSnapshot::new("j1", JobStatus::Running, "working");
        status.jobs_found = Some(5);
        let commit = registry.commit("j1", 1, status, logs("j1", 2)).await.unwrap();

        assert_eq!(commit.job.jobs_found, 5);
        let entry = registry.get_entry("j1").await.unwrap();
        assert_eq!(entry.last_log_count(), 2);
        assert_eq!(entry.last_status.unwrap().message, "working");
        assert!(entry.last_polled.is_some());
    }

    #[tokio::test]
    async fn commit_from_a_stale_generation_is_discarded() {
        let (registry, _handle) = registry_with("j1", 2).await;

        let status = StatusSnapshot::new("j1", JobStatus::Running, "stale");
        assert!(registry.commit("j1", 1, status, logs("j1", 4)).await.is_none());
        assert_eq!(registry.get_entry("j1").await.unwrap().last_log_count(), 0);
    }

    #[tokio::test]
    async fn commit_after_stop_is_discarded() {
        let (registry, handle) = registry_with("j1", 1).await;
        handle.stop();

        let status = StatusSnapshot::new("j1", JobStatus::Running, "late");
        assert!(registry.commit("j1", 1, status, logs("j1", 1)).await.is_none());
    }

    #[tokio::test]
    async fn failures_are_flagged_and_cleared_by_the_next_success() {
        let (registry, _handle) = registry_with("j1", 1).await;

        assert!(registry.record_failure("j1", 1, "timeout".into()).await);
        assert!(registry.record_failure("j1", 1, "timeout".into()).await);
        let entry = registry.get_entry("j1").await.unwrap();
        assert_eq!(entry.consecutive_failures, 2);
        assert_eq!(entry.last_error.as_deref(), Some("timeout"));

        let status = StatusSnapshot::new("j1", JobStatus::Running, "ok");
        registry.commit("j1", 1, status, Vec::new()).await.unwrap();
        let entry = registry.get_entry("j1").await.unwrap();
        assert_eq!(entry.consecutive_failures, 0);
        assert_eq!(entry.last_error, None);
    }

    #[tokio::test]
    async fn shrinking_log_stream_resets_the_stored_count() {
        let (registry, _handle) = registry_with("j1", 1).await;
        let running = || StatusSnapshot::new("j1", JobStatus::Running, "");

        registry.commit("j1", 1, running(), logs("j1", 5)).await.unwrap();
        let commit = registry.commit("j1", 1, running(), logs("j1", 2)).await.unwrap();
        assert!(commit.events.is_empty());
        assert_eq!(registry.get_entry("j1").await.unwrap().last_log_count(), 2);

        let commit = registry.commit("j1", 1, running(), logs("j1", 3)).await.unwrap();
        assert_eq!(commit.events.len(), 1);
    }

    #[tokio::test]
    async fn detach_with_generation_ignores_replaced_pollers() {
        let (registry, _handle) = registry_with("j1", 3).await;

        assert!(registry.detach_poller("j1", Some(2)).await.is_none());
        assert!(registry.get_entry("j1").await.unwrap().is_polling());
        assert!(registry.detach_poller("j1", Some(3)).await.is_some());
        assert!(registry.detach_poller("j1", None).await.is_none());
        assert!(registry.detach_poller("missing", None).await.is_none());
    }

    #[tokio::test]
    async fn resumable_skips_terminal_and_polling_jobs() {
        let (registry, _handle) = registry_with("polling", 1).await;
        registry.upsert(Job::new("idle", "q", JobStatus::Paused)).await;
        registry.upsert(Job::new("done", "q", JobStatus::Completed)).await;

        let ids: Vec<String> = registry.resumable().await.into_iter().map(|(j, _)| j.id).collect();
        assert_eq!(ids, vec!["idle"]);
    }

    #[tokio::test]
    async fn interval_is_kept_for_resumed_jobs() {
        let registry = JobRegistry::new();
        registry
            .upsert_with_interval(Job::new("slow", "q", JobStatus::Running), Some(Duration::from_secs(10)))
            .await;
        registry.upsert(Job::new("default", "q", JobStatus::Running)).await;

        let resumable = registry.resumable().await;
        assert_eq!(resumable[0].1, Some(Duration::from_secs(10)));
        assert_eq!(resumable[1].1, None);

        // Re-registering replaces the interval along with the job copy.
        registry.upsert(Job::new("slow", "q", JobStatus::Running)).await;
        assert_eq!(registry.get_entry("slow").await.unwrap().interval, None);
    }
}
