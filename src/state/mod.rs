//! Application state management.
//!
//! [`JobRegistry`] is the monitor's shared state. [`AppState`] is the
//! dashboard's own copy, refreshed from the registry on every frame and fed
//! with notifications as they arrive.

mod job;
mod registry;

pub use job::{Job, JobStatus, LogEntry, LogLevel, StatusSnapshot};
pub use registry::{JobRegistry, JobSummary, MonitorEntry, TickCommit};

use std::collections::VecDeque;
use std::time::Instant;

use crate::notification::Notification;

const HISTORY_SIZE: usize = 100; // Keep 100 notifications max
const MAX_TOASTS: usize = 4;

/// Whether the monitor is polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Temporality {
    Live,
    Paused,
}

impl Temporality {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            Temporality::Live
        } else {
            Temporality::Paused
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, Temporality::Live)
    }
}

/// A notification currently shown on screen.
#[derive(Debug, Clone)]
pub struct Toast {
    pub notification: Notification,
    pub expires_at: Option<Instant>,
}

/// Dashboard state.
pub struct AppState {
    /// Monitored jobs in registration order.
    pub jobs: Vec<JobSummary>,
    /// Selected job ID (for UI state)
    pub selected_job_id: Option<String>,
    /// Logs of the selected job.
    pub selected_logs: Vec<LogEntry>,
    /// Last status snapshot of the selected job.
    pub selected_status: Option<StatusSnapshot>,
    /// Toasts on screen, oldest first.
    pub toasts: VecDeque<Toast>,
    /// Received notifications, newest last.
    pub history: VecDeque<Notification>,
    /// Monitoring state.
    pub temporality: Temporality,
    /// Last update time.
    pub last_update: Instant,
    /// Animation frame for UI updates.
    pub animation_frame: usize,
}

impl AppState {
    /// Creates a new application state.
    pub fn new() -> Self {
        Self {
            jobs: Vec::new(),
            selected_job_id: None,
            selected_logs: Vec::new(),
            selected_status: None,
            toasts: VecDeque::with_capacity(MAX_TOASTS),
            history: VecDeque::with_capacity(HISTORY_SIZE),
            temporality: Temporality::Live,
            last_update: Instant::now(),
            animation_frame: 0,
        }
    }

    /// Replace the job list, dropping a selection that no longer exists.
    pub fn set_jobs(&mut self, jobs: Vec<JobSummary>) {
        self.jobs = jobs;
        if let Some(id) = &self.selected_job_id {
            if !self.jobs.iter().any(|s| &s.job.id == id) {
                self.selected_job_id = None;
                self.selected_logs.clear();
                self.selected_status = None;
            }
        }
        if self.selected_job_id.is_none() {
            self.selected_job_id = self.jobs.first().map(|s| s.job.id.clone());
        }
        self.last_update = Instant::now();
    }

    /// Store the details of the selected job.
    pub fn set_details(&mut self, logs: Vec<LogEntry>, status: Option<StatusSnapshot>) {
        self.selected_logs = logs;
        self.selected_status = status;
    }

    pub fn selected_job(&self) -> Option<&JobSummary> {
        let id = self.selected_job_id.as_ref()?;
        self.jobs.iter().find(|s| &s.job.id == id)
    }

    pub fn selected_index(&self) -> Option<usize> {
        let id = self.selected_job_id.as_ref()?;
        self.jobs.iter().position(|s| &s.job.id == id)
    }

    /// Select the next job in the list
    pub fn select_next_job(&mut self) {
        if self.jobs.is_empty() {
            self.selected_job_id = None;
            return;
        }
        let next = match self.selected_index() {
            Some(pos) if pos + 1 < self.jobs.len() => pos + 1,
            _ => 0,
        };
        self.selected_job_id = Some(self.jobs[next].job.id.clone());
    }

    /// Select the previous job in the list
    pub fn select_prev_job(&mut self) {
        if self.jobs.is_empty() {
            self.selected_job_id = None;
            return;
        }
        let prev = match self.selected_index() {
            Some(pos) if pos > 0 => pos - 1,
            _ => self.jobs.len() - 1,
        };
        self.selected_job_id = Some(self.jobs[prev].job.id.clone());
    }

    /// Record a notification and show it as a toast.
    pub fn push_notification(&mut self, notification: Notification) {
        let expires_at = notification.duration.map(|d| Instant::now() + d);
        self.toasts.push_back(Toast {
            notification: notification.clone(),
            expires_at,
        });
        if self.toasts.len() > MAX_TOASTS {
            self.toasts.pop_front();
        }

        self.history.push_back(notification);
        if self.history.len() > HISTORY_SIZE {
            self.history.pop_front();
        }
    }

    /// Drop toasts whose duration has elapsed.
    pub fn expire_toasts(&mut self, now: Instant) {
        self.toasts
            .retain(|t| t.expires_at.map_or(true, |deadline| deadline > now));
    }

    pub fn dismiss_toasts(&mut self) {
        self.toasts.clear();
    }

    /// Returns the count of jobs that are still being polled
    pub fn active_job_count(&self) -> usize {
        self.jobs.iter().filter(|s| s.polling).count()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn summary(id: &str, polling: bool) -> JobSummary {
        JobSummary {
            job: Job::new(id, "q", JobStatus::Running),
            polling,
            last_error: None,
            status_message: None,
            progress: None,
            log_count: 0,
        }
    }

    #[test]
    fn selection_wraps_and_follows_removals() {
        let mut state = AppState::new();
        state.set_jobs(vec![summary("a", true), summary("b", false), summary("c", true)]);
        assert_eq!(state.selected_job_id.as_deref(), Some("a"));

        state.select_prev_job();
        assert_eq!(state.selected_job_id.as_deref(), Some("c"));
        state.select_next_job();
        assert_eq!(state.selected_job_id.as_deref(), Some("a"));
        state.select_next_job();
        assert_eq!(state.active_job_count(), 2);

        state.set_jobs(vec![summary("a", true), summary("c", true)]);
        assert_eq!(state.selected_job_id.as_deref(), Some("a"));
    }

    #[test]
    fn toasts_expire_but_history_is_kept() {
        let mut state = AppState::new();
        state.push_notification(
            Notification::info("Agent status changed", "paused")
                .with_duration(Some(Duration::from_secs(3))),
        );
        state.push_notification(Notification::error("Agent error", "boom").with_duration(None));

        state.expire_toasts(Instant::now() + Duration::from_secs(4));
        assert_eq!(state.toasts.len(), 1);
        assert_eq!(state.toasts[0].notification.title, "Agent error");
        assert_eq!(state.history.len(), 2);
    }

    #[test]
    fn history_is_bounded() {
        let mut state = AppState::new();
        for i in 0..(HISTORY_SIZE + 5) {
            state.push_notification(Notification::info("n", i.to_string()));
        }
        assert_eq!(state.history.len(), HISTORY_SIZE);
        assert_eq!(state.history.front().unwrap().message, "5");
        assert_eq!(state.toasts.len(), MAX_TOASTS);
    }
}
