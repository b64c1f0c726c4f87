//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("model error: {0}")]
    Model(#[from] glft_model::ModelError),

    #[error("risk error: {0}")]
    Risk(#[from] glft_risk::RiskError),

    #[error("fill error: {0}")]
    Fill(#[from] glft_fill::FillError),

    #[error("backtest error: {0}")]
    Backtest(#[from] glft_backtest::BacktestError),

    #[error("live trading error: {0}")]
    Live(#[from] glft_live::LiveError),

    #[error("telemetry error: {0}")]
    Telemetry(#[from] glft_telemetry::TelemetryError),

    #[error("candle data error: {0}")]
    Data(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
