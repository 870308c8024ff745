//! reqwest implementation of the backend API.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::AgentBackend;
use crate::error::BackendError;
use crate::state::{LogEntry, StatusSnapshot};

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct LogsResponse {
    #[serde(default)]
    logs: Vec<LogEntry>,
}

/// HTTP client for the agent backend.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self, BackendError> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Backend whose requests give up after `timeout`.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| BackendError::Client { source })?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, resource: &str, job_id: &str) -> String {
        format!("{}/{resource}/{job_id}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, BackendError> {
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| BackendError::Request {
                url: url.clone(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(|source| BackendError::Request {
            url: url.clone(),
            source,
        })?;
        serde_json::from_slice(&body).map_err(|e| BackendError::Decode {
            url,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl AgentBackend for HttpBackend {
    async fn fetch_status(&self, job_id: &str) -> Result<StatusSnapshot, BackendError> {
        let mut snapshot: StatusSnapshot = self.get_json(self.url("status", job_id)).await?;
        snapshot.job_id = job_id.to_string();
        Ok(snapshot)
    }

    async fn fetch_logs(&self, job_id: &str) -> Result<Vec<LogEntry>, BackendError> {
        let response: LogsResponse = self.get_json(self.url("logs", job_id)).await?;
        Ok(response.logs)
    }
}
