//! Error types for glft-ledger.

use thiserror::Error;

/// Ledger error types.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invalid fill: {0}")]
    InvalidFill(String),
}

/// Result type alias for ledger operations.
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
