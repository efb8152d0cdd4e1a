use thiserror::Error;

/// Errors raised by the retrying fetch helper and the provider clients
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("unauthorized (401) from {url}")]
    Unauthorized { url: String },

    #[error("rate limited (429) from {url} after {attempts} attempts")]
    RateLimited { url: String, attempts: u32 },

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("network error calling {url}: {message}")]
    Network { url: String, message: String },

    #[error("invalid JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl FetchError {
    /// Whether another attempt could succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FetchError::Status { .. } | FetchError::Network { .. } | FetchError::RateLimited { .. }
        )
    }
}

/// Errors raised while assembling reports for the web server and batch jobs
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("team not found: {0}")]
    TeamNotFound(String),

    #[error("data source for {kind} is set to '{source_name}', only {expected} is supported")]
    SourceDisabled {
        kind: &'static str,
        source_name: String,
        expected: &'static str,
    },

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("persistence failed: {0}")]
    Persistence(String),
}
