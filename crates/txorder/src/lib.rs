//! Transaction classification and in-block ordering (spec.md §4.3, §4.4).

mod classify;
mod error;
mod order;

pub use classify::{classify_kind, EnvelopeHint};
pub use error::{Result, TxOrderError};
pub use order::order_transactions;
