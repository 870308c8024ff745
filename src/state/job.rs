//! Agent job state.
//!
//! Types describing a remote lead-generation agent, the status snapshots the
//! backend reports for it, and its log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Agent job status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Paused,
    Completed,
    Failed,
    Processing,
}

impl JobStatus {
    /// Completed and failed jobs are never polled again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Running => "running",
            JobStatus::Paused => "paused",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Processing => "processing",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A monitored agent job.
///
/// The caller owns the authoritative copy; the registry keeps its own copy and
/// refreshes status and counters from every committed poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub query: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub jobs_found: u64,
    #[serde(default)]
    pub emails_found: u64,
    #[serde(default)]
    pub batch_id: Option<String>,
}

impl Job {
    pub fn new(id: impl Into<String>, query: impl Into<String>, status: JobStatus) -> Self {
        Self {
            id: id.into(),
            query: query.into(),
            status,
            created_at: Utc::now(),
            jobs_found: 0,
            emails_found: 0,
            batch_id: None,
        }
    }

    pub fn with_batch(mut self, batch_id: impl Into<String>) -> Self {
        self.batch_id = Some(batch_id.into());
        self
    }

    pub fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    pub fn elapsed(&self) -> chrono::Duration {
        Utc::now() - self.created_at
    }

    /// Fold a fresh status snapshot into this copy.
    pub(crate) fn apply_snapshot(&mut self, snapshot: &StatusSnapshot) {
        self.status = snapshot.status;
        if let Some(found) = snapshot.jobs_found {
            self.jobs_found = found;
        }
        if let Some(found) = snapshot.emails_found {
            self.emails_found = found;
        }
    }
}

/// Severity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Success => "success",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

/// One line of agent output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "job_id")]
    pub agent_id: String,
    pub message: String,
    #[serde(default)]
    pub level: LogLevel,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl LogEntry {
    pub fn new(
        id: impl Into<String>,
        agent_id: impl Into<String>,
        level: LogLevel,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            agent_id: agent_id.into(),
            message: message.into(),
            level,
            timestamp: Utc::now(),
            company: None,
            email: None,
        }
    }
}

/// Status report for one job, replaced wholesale on every poll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    #[serde(default)]
    pub job_id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub progress: Option<f32>,
    #[serde(default)]
    pub jobs_found: Option<u64>,
    #[serde(default)]
    pub emails_found: Option<u64>,
    #[serde(default)]
    pub processed_cities: Option<u64>,
    #[serde(default)]
    pub processed_companies: Option<u64>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

impl StatusSnapshot {
    pub fn new(job_id: impl Into<String>, status: JobStatus, message: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            status,
            message: message.into(),
            progress: None,
            jobs_found: None,
            emails_found: None,
            processed_cities: None,
            processed_companies: None,
            start_time: None,
            end_time: None,
        }
    }

    /// Progress as a 0.0-1.0 ratio; the backend reports a percentage.
    pub fn progress_ratio(&self) -> Option<f64> {
        self.progress.map(|p| (f64::from(p) / 100.0).clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(JobStatus::Running, false)]
    #[case(JobStatus::Paused, false)]
    #[case(JobStatus::Processing, false)]
    #[case(JobStatus::Completed, true)]
    #[case(JobStatus::Failed, true)]
    fn terminal_statuses(#[case] status: JobStatus, #[case] terminal: bool) {
        assert_eq!(status.is_terminal(), terminal);
    }

    #[test]
    fn status_snapshot_decodes_backend_payload() {
        let body = r#"{
            "status": "running",
            "message": "Scraping Berlin",
            "progress": 42.5,
            "jobs_found": 12,
            "emails_found": 3,
            "processed_cities": 1,
            "start_time": "2024-03-01T10:00:00"
        }"#;

        let snapshot: StatusSnapshot = serde_json::from_str(body).unwrap();
        assert_eq!(snapshot.status, JobStatus::Running);
        assert_eq!(snapshot.jobs_found, Some(12));
        assert_eq!(snapshot.processed_companies, None);
        assert_eq!(snapshot.start_time.as_deref(), Some("2024-03-01T10:00:00"));
        assert_eq!(snapshot.progress_ratio(), Some(0.425));
    }

    #[test]
    fn unknown_status_is_rejected() {
        let body = r#"{ "status": "exploded", "message": "" }"#;
        assert!(serde_json::from_str::<StatusSnapshot>(body).is_err());
    }

    #[test]
    fn log_entry_defaults_level_and_accepts_job_id_alias() {
        let body = r#"{ "id": "7", "job_id": "j1", "message": "Found company" }"#;
        let entry: LogEntry = serde_json::from_str(body).unwrap();
        assert_eq!(entry.agent_id, "j1");
        assert_eq!(entry.level, LogLevel::Info);
    }

    #[test]
    fn apply_snapshot_keeps_counters_the_backend_omits() {
        let mut job = Job::new("j1", "dentists in Berlin", JobStatus::Running);
        job.jobs_found = 4;

        let mut snapshot = StatusSnapshot::new("j1", JobStatus::Completed, "done");
        snapshot.emails_found = Some(9);
        job.apply_snapshot(&snapshot);

        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.jobs_found, 4);
        assert_eq!(job.emails_found, 9);
    }
}
