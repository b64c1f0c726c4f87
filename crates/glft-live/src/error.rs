use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LiveError {
    #[error("live configuration error: {0}")]
    Configuration(String),

    /// Transient: quoting pauses and retries, resting protection stays.
    #[error("market data unavailable: {0}")]
    MarketDataUnavailable(String),

    /// Venue declined an order; recompute and resubmit next tick.
    #[error("order rejected by venue: {0}")]
    ExecutionRejected(String),

    /// Local and exchange position disagree. Placement halts until they
    /// agree again; PnL-affecting state is never auto-corrected.
    #[error("position reconciliation mismatch: local {local}, exchange {exchange}")]
    ReconciliationMismatch { local: Decimal, exchange: Decimal },

    #[error("venue I/O timed out after {0}ms")]
    Timeout(u64),

    #[error(transparent)]
    Model(#[from] glft_model::ModelError),

    #[error(transparent)]
    Ledger(#[from] glft_ledger::LedgerError),

    #[error(transparent)]
    Risk(#[from] glft_risk::RiskError),
}

pub type LiveResult<T> = Result<T, LiveError>;
