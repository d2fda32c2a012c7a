use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("cannot reach local backend '{url}': {message}. Start the backend or update SIGMA_API_URL.")]
    LocalUnreachable { url: String, message: String },

    #[error("cannot reach backend '{url}': {message}")]
    Connect { url: String, message: String },

    #[error("request to '{url}' timed out: {message}")]
    Timeout { url: String, message: String },

    #[error("backend '{url}' returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{what} not found")]
    NotFound { what: String },

    #[error("invalid response from '{url}': {message}")]
    Decode { url: String, message: String },

    #[error("stream stalled: no data received for {}s", .0.as_secs())]
    Stalled(Duration),

    #[error("request to '{url}' failed: {message}")]
    Request { url: String, message: String },
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
