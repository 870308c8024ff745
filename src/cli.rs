//! Command line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::app::AppConfig;
use crate::error::ConfigError;
use crate::monitor::MonitorConfig;
use crate::state::{Job, JobStatus};

#[derive(Parser, Debug, Clone)]
#[command(name = "agent-monitor", version, about = "Terminal dashboard for lead-generation agents")]
pub struct Cli {
    /// Base URL of the agent backend.
    #[arg(long, env = "AGENT_MONITOR_BACKEND_URL", default_value = "http://localhost:8000")]
    pub backend_url: String,

    /// Delay between two polls of the same job.
    #[arg(long, env = "AGENT_MONITOR_POLL_INTERVAL_MS", default_value_t = 5000)]
    pub poll_interval_ms: u64,

    /// Timeout of a single backend request.
    #[arg(long, env = "AGENT_MONITOR_REQUEST_TIMEOUT_MS", default_value_t = 10_000)]
    pub request_timeout_ms: u64,

    /// UI refresh tick.
    #[arg(long, default_value_t = 250)]
    pub tick_rate_ms: u64,

    /// Job to monitor, as `ID` or `ID=QUERY`. Repeatable.
    #[arg(long = "job", value_name = "ID[=QUERY]")]
    pub jobs: Vec<String>,

    /// Batch the given jobs belong to.
    #[arg(long, value_name = "BATCH_ID")]
    pub batch: Option<String>,

    /// Start with monitoring disabled.
    #[arg(long, default_value_t = false)]
    pub paused: bool,

    /// Directory for the log file.
    #[arg(long, env = "AGENT_MONITOR_LOG_DIR", default_value = ".")]
    pub log_dir: PathBuf,

    /// Default log filter when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    pub fn monitor_config(&self) -> Result<MonitorConfig, ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "poll-interval-ms".into(),
                message: "must be greater than zero".into(),
            });
        }
        Ok(MonitorConfig {
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            enabled: !self.paused,
        })
    }

    pub fn app_config(&self) -> AppConfig {
        AppConfig {
            tick_rate_ms: self.tick_rate_ms,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Jobs given on the command line. Their real status is learned on the
    /// first poll.
    pub fn jobs(&self) -> Result<Vec<Job>, ConfigError> {
        self.jobs
            .iter()
            .map(|spec| {
                let job = parse_job(spec)?;
                Ok(match &self.batch {
                    Some(batch) => job.with_batch(batch.as_str()),
                    None => job,
                })
            })
            .collect()
    }
}

fn parse_job(spec: &str) -> Result<Job, ConfigError> {
    let (id, query) = match spec.split_once('=') {
        Some((id, query)) => (id.trim(), query.trim()),
        None => (spec.trim(), ""),
    };
    if id.is_empty() {
        return Err(ConfigError::InvalidJob {
            spec: spec.to_string(),
            reason: "empty job id".into(),
        });
    }
    let query = if query.is_empty() { id } else { query };
    Ok(Job::new(id, query, JobStatus::Processing))
}
