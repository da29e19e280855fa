use thiserror::Error;

/// Failure of a single upstream call (CMS or RaceReady).
///
/// Fallback chains treat every variant as "no result" and advance to the next
/// step; nothing here is surfaced to clients directly.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("upstream is not configured")]
    NotConfigured,

    #[error("invalid upstream URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("request to {0} timed out")]
    Timeout(String),

    #[error("{url} responded with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("invalid JSON from {url}: {message}")]
    InvalidJson { url: String, message: String },
}

impl FetchError {
    /// Short tag used for the `outcome` metric label.
    pub fn outcome(&self) -> &'static str {
        match self {
            FetchError::NotConfigured => "not_configured",
            FetchError::InvalidUrl(_) => "invalid_url",
            FetchError::Request { .. } => "request_error",
            FetchError::Timeout(_) => "timeout",
            FetchError::Status { .. } => "bad_status",
            FetchError::InvalidJson { .. } => "invalid_json",
        }
    }
}
