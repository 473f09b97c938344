use thiserror::Error;

/// Contract execution failures (spec.md §4.6). All are transaction-local:
/// the overlay is discarded, gas already spent is still charged, and the
/// enclosing block commit proceeds with a failed receipt.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("out of gas")]
    OutOfGas,

    #[error("call depth exceeded")]
    CallDepthExceeded,

    #[error("deploy depth exceeded")]
    DeployDepthExceeded,

    #[error("reverted: {reason}")]
    Revert { reason: String },

    #[error("unknown contract")]
    UnknownContract,

    #[error("invalid bytecode: {0}")]
    InvalidBytecode(String),

    #[error("invalid storage access")]
    InvalidStorageAccess,

    /// Hard wall-clock cap hit before the gas cap (spec.md §5
    /// "Cancellation and timeouts").
    #[error("execution timed out")]
    Timeout,
}

pub type Result<T> = std::result::Result<T, ExecError>;
