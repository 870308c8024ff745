//! Outward notifications raised by the monitor.
//!
//! Notifications are plain messages; rendering them (toasts, history) is up to
//! whoever holds the receiving end of the channel.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Notification category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Success,
    Error,
    Warning,
    Info,
}

impl Category {
    /// How long a notification of this category stays on screen.
    pub fn default_duration(&self) -> Duration {
        match self {
            Category::Success => Duration::from_secs(5),
            Category::Info => Duration::from_secs(3),
            Category::Warning => Duration::from_secs(6),
            Category::Error => Duration::from_secs(8),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Success => "success",
            Category::Error => "error",
            Category::Warning => "warning",
            Category::Info => "info",
        }
    }
}

/// A user-facing notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub category: Category,
    pub title: String,
    pub message: String,
    pub job_id: Option<String>,
    /// Auto-dismiss after this long; `None` keeps it until dismissed.
    pub duration: Option<Duration>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(category: Category, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category,
            title: title.into(),
            message: message.into(),
            job_id: None,
            duration: Some(category.default_duration()),
            created_at: Utc::now(),
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Category::Success, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Category::Error, title, message)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Category::Warning, title, message)
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Category::Info, title, message)
    }

    pub fn for_job(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    pub fn with_duration(mut self, duration: Option<Duration>) -> Self {
        self.duration = duration;
        self
    }
}
