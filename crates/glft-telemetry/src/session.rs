//! End-of-session summary.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use glft_metrics::PerformanceReport;

/// Shutdown report for one trading session or backtest run.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub runtime_secs: i64,
    pub trade_count: usize,
    pub round_trips: usize,
    pub realized_pnl: Decimal,
    pub fees_paid: Decimal,
    pub max_drawdown: f64,
    pub final_equity: Decimal,
}

impl SessionSummary {
    pub fn new(
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
        metrics: &PerformanceReport,
        fees_paid: Decimal,
        final_equity: Decimal,
    ) -> Self {
        Self {
            started_at,
            ended_at,
            runtime_secs: (ended_at - started_at).num_seconds(),
            trade_count: metrics.trade_count,
            round_trips: metrics.round_trips,
            realized_pnl: metrics.realized_pnl,
            fees_paid,
            max_drawdown: metrics.max_drawdown,
            final_equity,
        }
    }

    /// Emit the summary as one structured log record.
    pub fn log(&self) {
        info!(
            runtime_secs = self.runtime_secs,
            trades = self.trade_count,
            round_trips = self.round_trips,
            realized_pnl = %self.realized_pnl,
            fees = %self.fees_paid,
            max_drawdown = self.max_drawdown,
            final_equity = %self.final_equity,
            "session summary"
        );
    }
}
