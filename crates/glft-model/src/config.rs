//! Model configuration.

use crate::error::{ModelError, ModelResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Quote model configuration.
///
/// `kappa_seed` is only a bootstrap value: live kappa comes from the
/// `KappaEstimator` once it has enough depth samples. An order-of-magnitude
/// wrong kappa produces persistently mispriced quotes, so the seed is
/// validated like every other parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Risk-aversion coefficient (gamma).
    #[serde(default = "default_gamma")]
    pub gamma: f64,

    /// Liquidity decay bootstrap (kappa) used until the estimator warms up.
    #[serde(default = "default_kappa_seed")]
    pub kappa_seed: f64,

    /// Order arrival rate (A) at the top of book.
    #[serde(default = "default_arrival_rate")]
    pub arrival_rate: f64,

    /// Inventory risk horizon tau, in seconds.
    #[serde(default = "default_horizon_secs")]
    pub horizon_secs: f64,

    /// Minimum total quoted spread, in absolute currency units.
    #[serde(default = "default_min_spread")]
    pub min_spread: f64,

    /// Maximum total quoted spread, in absolute currency units.
    #[serde(default = "default_max_spread")]
    pub max_spread: f64,

    /// Base order size per side.
    #[serde(default = "default_order_size")]
    pub order_size: Decimal,

    /// Size multiplier applied in a mild trend (0..1].
    #[serde(default = "default_mild_size_factor")]
    pub mild_size_factor: f64,

    /// EWMA volatility lookback (ticks) before estimates are trusted.
    #[serde(default = "default_vol_lookback")]
    pub vol_lookback: usize,

    /// EWMA smoothing alpha for the volatility estimator.
    #[serde(default = "default_vol_alpha")]
    pub vol_alpha: f64,
}

fn default_gamma() -> f64 {
    0.1
}

fn default_kappa_seed() -> f64 {
    1.5
}

fn default_arrival_rate() -> f64 {
    140.0
}

fn default_horizon_secs() -> f64 {
    0.5
}

fn default_min_spread() -> f64 {
    1.0
}

fn default_max_spread() -> f64 {
    500.0
}

fn default_order_size() -> Decimal {
    rust_decimal_macros::dec!(0.01)
}

fn default_mild_size_factor() -> f64 {
    0.5
}

fn default_vol_lookback() -> usize {
    60
}

fn default_vol_alpha() -> f64 {
    0.06
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            gamma: default_gamma(),
            kappa_seed: default_kappa_seed(),
            arrival_rate: default_arrival_rate(),
            horizon_secs: default_horizon_secs(),
            min_spread: default_min_spread(),
            max_spread: default_max_spread(),
            order_size: default_order_size(),
            mild_size_factor: default_mild_size_factor(),
            vol_lookback: default_vol_lookback(),
            vol_alpha: default_vol_alpha(),
        }
    }
}

impl ModelConfig {
    /// Validate the parameter set. Fatal at startup on failure.
    pub fn validate(&self) -> ModelResult<()> {
        if self.gamma <= 0.0 || !self.gamma.is_finite() {
            return Err(ModelError::Configuration(format!(
                "gamma must be positive, got {}",
                self.gamma
            )));
        }
        if self.kappa_seed <= 0.0 || !self.kappa_seed.is_finite() {
            return Err(ModelError::Configuration(format!(
                "kappa must be positive, got {}",
                self.kappa_seed
            )));
        }
        if self.arrival_rate <= 0.0 || !self.arrival_rate.is_finite() {
            return Err(ModelError::Configuration(format!(
                "arrival_rate must be positive, got {}",
                self.arrival_rate
            )));
        }
        if self.horizon_secs < 0.0 || !self.horizon_secs.is_finite() {
            return Err(ModelError::Configuration(format!(
                "horizon_secs must be non-negative, got {}",
                self.horizon_secs
            )));
        }
        if self.min_spread < 0.0 || self.max_spread <= 0.0 || self.min_spread > self.max_spread {
            return Err(ModelError::Configuration(format!(
                "spread bounds invalid: [{}, {}]",
                self.min_spread, self.max_spread
            )));
        }
        if self.order_size <= Decimal::ZERO {
            return Err(ModelError::Configuration(format!(
                "order_size must be positive, got {}",
                self.order_size
            )));
        }
        if !(0.0..=1.0).contains(&self.mild_size_factor) {
            return Err(ModelError::Configuration(format!(
                "mild_size_factor must be in [0, 1], got {}",
                self.mild_size_factor
            )));
        }
        if !(0.0..=1.0).contains(&self.vol_alpha) {
            return Err(ModelError::Configuration(format!(
                "vol_alpha must be in [0, 1], got {}",
                self.vol_alpha
            )));
        }
        Ok(())
    }
}

/// Regime detector configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeConfig {
    /// ADX lookback window (Wilder periods).
    #[serde(default = "default_regime_window")]
    pub window: usize,

    /// ADX level above which the market counts as mildly trending.
    #[serde(default = "default_mild_threshold")]
    pub mild_threshold: f64,

    /// ADX level above which new placement is paused.
    #[serde(default = "default_strong_threshold")]
    pub strong_threshold: f64,
}

fn default_regime_window() -> usize {
    14
}

fn default_mild_threshold() -> f64 {
    20.0
}

fn default_strong_threshold() -> f64 {
    30.0
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            window: default_regime_window(),
            mild_threshold: default_mild_threshold(),
            strong_threshold: default_strong_threshold(),
        }
    }
}

impl RegimeConfig {
    pub fn validate(&self) -> ModelResult<()> {
        if self.window < 2 {
            return Err(ModelError::Configuration(format!(
                "regime window must be at least 2, got {}",
                self.window
            )));
        }
        if self.mild_threshold <= 0.0 || self.strong_threshold <= self.mild_threshold {
            return Err(ModelError::Configuration(format!(
                "regime thresholds invalid: mild {} strong {}",
                self.mild_threshold, self.strong_threshold
            )));
        }
        Ok(())
    }
}
