//! Error types.

/// Failure of a single backend call. Always recoverable: the poller logs it,
/// flags the job and tries again on the next tick.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("cannot build HTTP client: {source}")]
    Client {
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("malformed response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

/// Invalid command line or environment configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid job spec {spec:?}: {reason}")]
    InvalidJob { spec: String, reason: String },

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}
