use rust_decimal::Decimal;
use serde::Serialize;

use glft_core::trade::{EquityPoint, Trade};
use glft_metrics::PerformanceReport;

use crate::error::BacktestResult;

/// Artifact of one backtest run: the equity curve and trade log the
/// metrics were computed from, plus the metrics themselves.
#[derive(Debug, Clone, Serialize)]
pub struct BacktestReport {
    pub candles: usize,
    pub final_equity: Decimal,
    /// Net position remaining at the end of the run.
    pub final_position: Decimal,
    pub metrics: PerformanceReport,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<Trade>,
}

impl BacktestReport {
    /// Serialize for storage or downstream tooling.
    pub fn to_json(&self) -> BacktestResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
