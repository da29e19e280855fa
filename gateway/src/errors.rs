use http::StatusCode;
use thiserror::Error;

/// Errors that end a request or stop the gateway from starting.
///
/// Upstream failures never show up here: the content layer turns them into
/// fallbacks.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Failed to read request body: {0}")]
    RequestBody(String),

    #[error("Request body exceeds {0} bytes")]
    RequestBodyTooLarge(usize),

    #[error("Failed to build response: {0}")]
    ResponseBuild(#[from] http::Error),

    #[error("Response serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Could not load site config snapshot: {0}")]
    Snapshot(#[from] content::snapshot::SnapshotError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Status returned to the client when a request fails with this error.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::RequestBody(_) => StatusCode::BAD_REQUEST,
            GatewayError::RequestBodyTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
