use thiserror::Error;

/// Epoch-manager failures (spec.md §4.7, §7 "Epoch" category).
#[derive(Debug, Error)]
pub enum EpochError {
    #[error("attempted mutation of a frozen epoch")]
    EpochFrozen,

    #[error("submission epoch_number {declared} does not match target epoch {expected}")]
    WinnerEpochMismatch { declared: u64, expected: u64 },

    #[error("block {height} outside epoch range [{start}, {end}]")]
    BlockOutsideEpochRange { height: u64, start: u64, end: u64 },
}

pub type Result<T> = std::result::Result<T, EpochError>;
