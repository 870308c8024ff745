//! Turns monitor events into notifications and callback invocations.
//!
//! The dispatcher is the only component that writes to the notification
//! channel. Events are consumed by value, so a single event can never be
//! delivered twice.

use std::fmt;
use std::sync::{Arc, OnceLock};

use regex::Regex;
use tokio::sync::mpsc;
use tracing::debug;

use crate::monitor::diff::MonitorEvent;
use crate::notification::{Category, Notification};
use crate::state::{Job, JobStatus, LogEntry, LogLevel, StatusSnapshot};

pub type StatusCallback = Arc<dyn Fn(&Job, &StatusSnapshot) + Send + Sync>;
pub type LogsCallback = Arc<dyn Fn(&Job, &[LogEntry]) + Send + Sync>;

/// Optional observer hooks invoked alongside notifications.
#[derive(Clone, Default)]
pub struct MonitorCallbacks {
    pub on_status_change: Option<StatusCallback>,
    pub on_new_logs: Option<LogsCallback>,
}

impl MonitorCallbacks {
    pub fn on_status_change(mut self, f: impl Fn(&Job, &StatusSnapshot) + Send + Sync + 'static) -> Self {
        self.on_status_change = Some(Arc::new(f));
        self
    }

    pub fn on_new_logs(mut self, f: impl Fn(&Job, &[LogEntry]) + Send + Sync + 'static) -> Self {
        self.on_new_logs = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for MonitorCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitorCallbacks")
            .field("on_status_change", &self.on_status_change.is_some())
            .field("on_new_logs", &self.on_new_logs.is_some())
            .finish()
    }
}

fn completion_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(complete|completed|finished|done)\b").expect("completion pattern is valid")
    })
}

/// Event dispatcher.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    sink: mpsc::Sender<Notification>,
    callbacks: MonitorCallbacks,
}

impl EventDispatcher {
    pub fn new(sink: mpsc::Sender<Notification>, callbacks: MonitorCallbacks) -> Self {
        Self { sink, callbacks }
    }

    /// Deliver the events of one tick, in order.
    pub async fn dispatch(&self, job: &Job, events: Vec<MonitorEvent>) {
        for event in events {
            match event {
                MonitorEvent::LogsAppended { entries } => {
                    if let Some(on_new_logs) = &self.callbacks.on_new_logs {
                        on_new_logs(job, &entries);
                    }
                    for entry in &entries {
                        if let Some(notification) = log_notification(job, entry) {
                            self.emit(notification).await;
                        }
                    }
                }
                MonitorEvent::StatusChanged { old, new } => {
                    debug!(job_id = %job.id, %old, new = %new.status, "status changed");
                    if let Some(on_status_change) = &self.callbacks.on_status_change {
                        on_status_change(job, &new);
                    }
                    self.emit(status_notification(job, &new)).await;
                }
            }
        }
    }

    async fn emit(&self, notification: Notification) {
        if self.sink.send(notification).await.is_err() {
            debug!("notification receiver dropped");
        }
    }
}

/// Only errors and completion messages are worth interrupting the user for.
fn log_notification(job: &Job, entry: &LogEntry) -> Option<Notification> {
    let notification = match entry.level {
        LogLevel::Error => Notification::error("Agent error", entry.message.clone()),
        LogLevel::Success if completion_pattern().is_match(&entry.message) => {
            Notification::success("Search completed", entry.message.clone())
        }
        _ => return None,
    };
    Some(notification.for_job(&job.id))
}

fn status_notification(job: &Job, status: &StatusSnapshot) -> Notification {
    let (category, title) = match status.status {
        JobStatus::Completed => (Category::Success, "Agent completed"),
        JobStatus::Failed => (Category::Error, "Agent failed"),
        _ => (Category::Info, "Agent status changed"),
    };
    let message = if status.message.is_empty() {
        format!("\"{}\" is now {}", job.query, status.status)
    } else {
        format!("\"{}\" is now {}: {}", job.query, status.status, status.message)
    };
    Notification::new(category, title, message).for_job(&job.id)
}
