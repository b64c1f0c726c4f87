//! Reservation price and optimal spread (GLFT form).
//!
//! The model quotes around an inventory-adjusted fair value:
//!
//! ```text
//! r      = S - q * gamma * sigma^2 * tau
//! delta* = (1/kappa) * ln(1 + kappa/gamma) + sqrt(gamma * sigma^2 / (2 * A * kappa))
//! bid    = r - delta*/2,  ask = r + delta*/2
//! ```
//!
//! The reservation adjustment is **absolute**, never re-scaled by S:
//! percentage scaling silently changes sensitivity for high-priced assets
//! and invalidates externally calibrated gamma/kappa. The spread form is
//! session-length independent, so delta* does not collapse toward zero as
//! a trading session ends.

use crate::config::ModelConfig;
use crate::error::{ModelError, ModelResult};
use glft_core::{MarketState, Price, Quote, Regime, Size};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Pure quote computation from market and inventory state.
#[derive(Debug, Clone)]
pub struct QuoteModel {
    config: ModelConfig,
}

impl QuoteModel {
    /// Create a model from validated configuration.
    pub fn new(config: ModelConfig) -> ModelResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Reservation price: r = S - q * gamma * sigma^2 * tau.
    pub fn reservation_price(&self, mid: f64, q: f64, sigma: f64) -> f64 {
        mid - q * self.config.gamma * sigma * sigma * self.config.horizon_secs
    }

    /// Optimal total spread before clamping.
    pub fn optimal_spread(&self, sigma: f64, kappa: f64) -> f64 {
        let gamma = self.config.gamma;
        let liquidity_term = (1.0 / kappa) * (1.0 + kappa / gamma).ln();
        let risk_term = (gamma * sigma * sigma / (2.0 * self.config.arrival_rate * kappa)).sqrt();
        liquidity_term + risk_term
    }

    /// Compute the two-sided quote for one tick.
    ///
    /// `position_qty` is the signed net position from the ledger. Kappa and
    /// sigma come from `state` (estimator outputs), not from configuration.
    pub fn quote(&self, state: &MarketState, position_qty: Decimal) -> ModelResult<Quote> {
        if state.kappa <= 0.0 || !state.kappa.is_finite() {
            return Err(ModelError::Configuration(format!(
                "kappa must be positive, got {}",
                state.kappa
            )));
        }
        if state.sigma < 0.0 || !state.sigma.is_finite() {
            return Err(ModelError::Configuration(format!(
                "sigma must be non-negative, got {}",
                state.sigma
            )));
        }
        if !state.mid.is_positive() {
            return Err(ModelError::InvalidMarketState(format!(
                "mid price must be positive, got {}",
                state.mid
            )));
        }

        let mid = state.mid.to_f64();
        let q = position_qty.to_f64().unwrap_or(0.0);

        let reservation = self.reservation_price(mid, q, state.sigma);
        let spread = self
            .optimal_spread(state.sigma, state.kappa)
            .clamp(self.config.min_spread, self.config.max_spread);

        let half = spread / 2.0;
        let bid = reservation - half;
        let ask = reservation + half;

        if bid <= 0.0 || !bid.is_finite() || !ask.is_finite() {
            return Err(ModelError::InvalidMarketState(format!(
                "degenerate quote: bid {bid} ask {ask} around mid {mid}"
            )));
        }

        Ok(Quote {
            bid: Price::from_f64(bid),
            ask: Price::from_f64(ask),
            size: self.sized_for_regime(state.regime),
            reservation_price: Price::from_f64(reservation),
            half_spread: Price::from_f64(half),
        })
    }

    /// Quote size after the regime gate.
    ///
    /// StrongTrend returns zero size; the orchestrators additionally skip
    /// placement entirely via `Regime::allows_new_orders`.
    fn sized_for_regime(&self, regime: Regime) -> Size {
        match regime {
            Regime::Ranging => Size::new(self.config.order_size),
            Regime::MildTrend => {
                let factor = Decimal::from_f64_retain(self.config.mild_size_factor)
                    .unwrap_or(Decimal::ZERO);
                Size::new(self.config.order_size * factor)
            }
            Regime::StrongTrend => Size::ZERO,
        }
    }
}
