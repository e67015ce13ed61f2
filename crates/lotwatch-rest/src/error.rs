//! REST client error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RestError {
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("No active session")]
    Unauthenticated,

    #[error("Response decode error: {0}")]
    Decode(String),
}

impl RestError {
    /// Whether the backend rejected the credentials or token.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Unauthenticated)
            || matches!(self, Self::Status { status, .. } if *status == 401 || *status == 403)
    }
}

pub type RestResult<T> = Result<T, RestError>;
