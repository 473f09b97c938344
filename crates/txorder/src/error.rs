use thiserror::Error;

#[derive(Debug, Error)]
pub enum TxOrderError {
    #[error("ordering produced {produced} transactions from {input} inputs")]
    OrderingCountMismatch { input: usize, produced: usize },
}

pub type Result<T> = std::result::Result<T, TxOrderError>;
