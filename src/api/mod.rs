//! Backend API used by the monitor.
//!
//! The monitor only needs two read endpoints per job. They sit behind the
//! [`AgentBackend`] trait so pollers can be driven by scripted backends in
//! tests.

mod http;

pub use http::HttpBackend;

use async_trait::async_trait;

use crate::error::BackendError;
use crate::state::{LogEntry, StatusSnapshot};

/// Read access to remote agent state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// `GET /status/{job_id}`
    async fn fetch_status(&self, job_id: &str) -> Result<StatusSnapshot, BackendError>;

    /// `GET /logs/{job_id}`, the full ordered log sequence.
    async fn fetch_logs(&self, job_id: &str) -> Result<Vec<LogEntry>, BackendError>;
}
