use thiserror::Error;

/// Errors surfaced by the base-chain RPC collaborator (spec.md §4.1, §6).
///
/// Classification matters more than the message: transient failures are
/// retried locally with back-off, fatal ones propagate to the caller
/// immediately since retrying cannot change the outcome.
#[derive(Debug, Error)]
pub enum BtcioError {
    #[error("rpc timeout: {0}")]
    Timeout(String),

    #[error("rpc unavailable: {0}")]
    Unavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid request: {0}")]
    Validation(String),
}

impl BtcioError {
    /// Transient infrastructure failures (timeout, connection refused, 5xx)
    /// are retried by [`crate::backoff::BackoffPolicy`]. Everything else
    /// (404, malformed request) is fatal and surfaces immediately.
    pub fn is_transient(&self) -> bool {
        matches!(self, BtcioError::Timeout(_) | BtcioError::Unavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, BtcioError>;
