use thiserror::Error;

#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("backtest configuration error: {0}")]
    Configuration(String),

    /// Malformed input data is a hard error, never skipped: silently
    /// dropping rows produces misleading performance numbers.
    #[error("invalid market data: {0}")]
    InvalidData(String),

    #[error(transparent)]
    Core(#[from] glft_core::CoreError),

    #[error(transparent)]
    Model(#[from] glft_model::ModelError),

    #[error(transparent)]
    Ledger(#[from] glft_ledger::LedgerError),

    #[error(transparent)]
    Risk(#[from] glft_risk::RiskError),

    #[error(transparent)]
    Fill(#[from] glft_fill::FillError),

    #[error("report serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type BacktestResult<T> = Result<T, BacktestError>;
