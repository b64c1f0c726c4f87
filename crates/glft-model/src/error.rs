//! Error types for glft-model.

use thiserror::Error;

/// Model error types.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Invalid parameter set. Fatal at startup, never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Market state unusable for quoting (zero mid, invalid sigma).
    #[error("Invalid market state: {0}")]
    InvalidMarketState(String),
}

/// Result type alias for model operations.
pub type ModelResult<T> = std::result::Result<T, ModelError>;
