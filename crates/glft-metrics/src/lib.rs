//! Performance metrics over an equity curve and a realized trade log.
//!
//! Ratio metrics use only active-period returns: ticks where the strategy
//! was paused by the regime gate carry no information about its skill, and
//! annualizing over total elapsed periods would silently inflate Sharpe
//! for a strategy that is mostly idle. Win rate and profit factor come
//! from the ledger's realized trades, never from pairing raw fills.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use glft_core::trade::{EquityPoint, Trade};

/// Summary statistics for one session or backtest.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceReport {
    /// Annualized Sharpe over active-period returns. None with fewer than
    /// two returns or zero variance.
    pub sharpe: Option<f64>,
    /// Annualized Sortino over active-period returns. None without any
    /// downside deviation.
    pub sortino: Option<f64>,
    /// Largest peak-to-trough equity decline, as a fraction of the peak.
    pub max_drawdown: f64,
    /// Fraction of realized trades with positive PnL.
    pub win_rate: Option<f64>,
    /// Gross profit over gross loss. None while no losing trade exists.
    pub profit_factor: Option<f64>,
    /// Sum of realized PnL across trades (before fees).
    pub realized_pnl: Decimal,
    /// Fees attributed to closing fills.
    pub fees: Decimal,
    pub trade_count: usize,
    /// Trades that took the position all the way back to flat.
    pub round_trips: usize,
    pub active_periods: usize,
    pub elapsed_periods: usize,
}

/// Computes a [`PerformanceReport`] from raw session artifacts.
#[derive(Debug, Clone)]
pub struct MetricsEngine {
    /// Active trading periods per year for annualization, derived from
    /// the tick/candle interval.
    periods_per_year: f64,
}

impl MetricsEngine {
    pub fn new(periods_per_year: f64) -> Self {
        Self { periods_per_year }
    }

    /// Annualization factor for a fixed tick interval in seconds.
    pub fn for_interval_secs(interval_secs: u64) -> Self {
        const SECS_PER_YEAR: f64 = 365.25 * 24.0 * 3600.0;
        Self::new(SECS_PER_YEAR / interval_secs.max(1) as f64)
    }

    pub fn report(&self, equity: &[EquityPoint], trades: &[Trade]) -> PerformanceReport {
        let returns = active_returns(equity);
        let (sharpe, sortino) = self.ratios(&returns);

        let realized_pnl: Decimal = trades.iter().map(|t| t.realized_pnl).sum();
        let fees: Decimal = trades.iter().map(|t| t.fees).sum();

        PerformanceReport {
            sharpe,
            sortino,
            max_drawdown: max_drawdown(equity),
            win_rate: win_rate(trades),
            profit_factor: profit_factor(trades),
            realized_pnl,
            fees,
            trade_count: trades.len(),
            round_trips: trades.iter().filter(|t| t.full_close).count(),
            active_periods: equity.iter().filter(|p| p.active).count(),
            elapsed_periods: equity.len(),
        }
    }

    fn ratios(&self, returns: &[f64]) -> (Option<f64>, Option<f64>) {
        if returns.len() < 2 {
            return (None, None);
        }
        let n = returns.len() as f64;
        let mean = returns.iter().sum::<f64>() / n;
        let var = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / (n - 1.0);
        let std = var.sqrt();
        let annualize = self.periods_per_year.sqrt();

        let sharpe = if std > 0.0 {
            Some(mean / std * annualize)
        } else {
            None
        };

        let downside_var = returns.iter().map(|r| r.min(0.0).powi(2)).sum::<f64>() / n;
        let downside = downside_var.sqrt();
        let sortino = if downside > 0.0 {
            Some(mean / downside * annualize)
        } else {
            None
        };

        (sharpe, sortino)
    }
}

/// Per-period returns for periods in which the strategy was active.
///
/// A return belongs to the period ending at point `i`; it is kept only if
/// that period was traded. Pauses therefore contribute neither returns nor
/// periods to the annualization.
fn active_returns(equity: &[EquityPoint]) -> Vec<f64> {
    equity
        .windows(2)
        .filter(|w| w[1].active)
        .filter_map(|w| {
            let prev = w[0].equity.to_f64()?;
            let curr = w[1].equity.to_f64()?;
            if prev.abs() < f64::EPSILON {
                None
            } else {
                Some((curr - prev) / prev)
            }
        })
        .collect()
}

/// Largest fractional peak-to-trough decline over the whole curve,
/// paused periods included: a drawdown suffered while paused is still a
/// drawdown.
fn max_drawdown(equity: &[EquityPoint]) -> f64 {
    let mut peak = f64::MIN;
    let mut worst: f64 = 0.0;
    for point in equity {
        let e = match point.equity.to_f64() {
            Some(e) => e,
            None => continue,
        };
        if e > peak {
            peak = e;
        }
        if peak > 0.0 {
            worst = worst.max((peak - e) / peak);
        }
    }
    worst
}

fn win_rate(trades: &[Trade]) -> Option<f64> {
    if trades.is_empty() {
        return None;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    Some(winners as f64 / trades.len() as f64)
}

fn profit_factor(trades: &[Trade]) -> Option<f64> {
    let gross_profit: Decimal = trades
        .iter()
        .filter(|t| t.realized_pnl > Decimal::ZERO)
        .map(|t| t.realized_pnl)
        .sum();
    let gross_loss: Decimal = trades
        .iter()
        .filter(|t| t.realized_pnl < Decimal::ZERO)
        .map(|t| -t.realized_pnl)
        .sum();
    if gross_loss.is_zero() {
        return None;
    }
    Some(gross_profit.to_f64()? / gross_loss.to_f64()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use glft_core::decimal::{Price, Size};
    use glft_core::order::OrderSide;
    use glft_core::trade::ExitReason;
    use rust_decimal_macros::dec;

    fn ts(i: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + i * 60, 0).unwrap()
    }

    fn point(i: i64, equity: Decimal, active: bool) -> EquityPoint {
        EquityPoint {
            timestamp: ts(i),
            cash: equity,
            equity,
            active,
        }
    }

    /// Equity curve realizing the given per-period returns, all active.
    fn curve(returns: &[f64]) -> Vec<EquityPoint> {
        let mut equity = 10_000.0;
        let mut points = vec![point(0, Decimal::from_f64_retain(equity).unwrap(), true)];
        for (i, r) in returns.iter().enumerate() {
            equity *= 1.0 + r;
            points.push(point(
                i as i64 + 1,
                Decimal::from_f64_retain(equity).unwrap(),
                true,
            ));
        }
        points
    }

    fn trade(pnl: Decimal, full_close: bool) -> Trade {
        Trade {
            side: OrderSide::Buy,
            entry_price: Price::new(dec!(100)),
            exit_price: Price::new(dec!(101)),
            quantity: Size::new(dec!(1)),
            fees: dec!(0.1),
            realized_pnl: pnl,
            full_close,
            exit_reason: ExitReason::Quote,
            opened_at: ts(0),
            closed_at: ts(1),
        }
    }

    #[test]
    fn sharpe_matches_hand_computation() {
        // returns: +1%, -1%, +2%, 0% -> mean 0.005, sample std known
        let returns = [0.01, -0.01, 0.02, 0.0];
        let engine = MetricsEngine::new(252.0);
        let report = engine.report(&curve(&returns), &[]);

        let mean = 0.005;
        let var = ((0.01f64 - mean).powi(2)
            + (-0.01f64 - mean).powi(2)
            + (0.02f64 - mean).powi(2)
            + (0.0f64 - mean).powi(2))
            / 3.0;
        let expected = mean / var.sqrt() * 252.0f64.sqrt();
        let sharpe = report.sharpe.unwrap();
        assert!(
            (sharpe - expected).abs() < 1e-9,
            "sharpe {sharpe} vs expected {expected}"
        );
    }

    #[test]
    fn paused_periods_do_not_dilute_sharpe() {
        let active_only = curve(&[0.01, -0.01, 0.02, 0.0]);
        let engine = MetricsEngine::new(252.0);
        let base = engine.report(&active_only, &[]).sharpe.unwrap();

        // same active returns with a flat paused stretch spliced in
        let mut with_pause = active_only.clone();
        let mid_equity = with_pause[2].equity;
        with_pause.splice(
            3..3,
            (0..5).map(|i| point(100 + i, mid_equity, false)),
        );
        let paused = engine.report(&with_pause, &[]).sharpe.unwrap();
        assert!(
            (base - paused).abs() < 1e-9,
            "pause changed sharpe: {base} vs {paused}"
        );
    }

    #[test]
    fn constant_returns_have_no_sharpe() {
        let engine = MetricsEngine::new(252.0);
        let report = engine.report(&curve(&[0.01, 0.01, 0.01]), &[]);
        assert!(report.sharpe.is_none());
    }

    #[test]
    fn sortino_penalizes_only_downside() {
        let engine = MetricsEngine::new(252.0);
        let report = engine.report(&curve(&[0.01, -0.02, 0.03, -0.01]), &[]);
        let sortino = report.sortino.unwrap();
        let mean = (0.01 - 0.02 + 0.03 - 0.01) / 4.0;
        let downside = ((0.02f64.powi(2) + 0.01f64.powi(2)) / 4.0).sqrt();
        let expected = mean / downside * 252.0f64.sqrt();
        assert!((sortino - expected).abs() < 1e-9);
    }

    #[test]
    fn max_drawdown_peak_to_trough() {
        let points = vec![
            point(0, dec!(10000), true),
            point(1, dec!(11000), true),
            point(2, dec!(9900), true),
            point(3, dec!(10500), true),
            point(4, dec!(10120), true),
        ];
        let engine = MetricsEngine::new(252.0);
        let report = engine.report(&points, &[]);
        // peak 11000 -> trough 9900 = 10%
        assert!((report.max_drawdown - 0.1).abs() < 1e-12);
    }

    #[test]
    fn trade_stats_from_realized_log() {
        let trades = vec![
            trade(dec!(30), true),
            trade(dec!(-10), false),
            trade(dec!(20), true),
            trade(dec!(-15), true),
        ];
        let engine = MetricsEngine::new(252.0);
        let report = engine.report(&[], &trades);
        assert_eq!(report.trade_count, 4);
        assert_eq!(report.round_trips, 3);
        assert!((report.win_rate.unwrap() - 0.5).abs() < 1e-12);
        assert!((report.profit_factor.unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(report.realized_pnl, dec!(25));
    }

    #[test]
    fn empty_inputs_degrade_gracefully() {
        let engine = MetricsEngine::new(252.0);
        let report = engine.report(&[], &[]);
        assert!(report.sharpe.is_none());
        assert!(report.win_rate.is_none());
        assert!(report.profit_factor.is_none());
        assert_eq!(report.max_drawdown, 0.0);
    }
}
