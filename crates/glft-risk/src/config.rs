use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::error::{RiskError, RiskResult};

/// Risk limits and overlay tuning. All limits are expressed in base units
/// (same unit as order size), percentages as fractions.
#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    /// Inventory magnitude at which quotes start skewing toward reduction.
    #[serde(default = "default_soft_limit")]
    pub soft_limit: Decimal,
    /// Inventory magnitude at which the exposure-increasing side is pulled
    /// entirely. Must be >= soft_limit.
    #[serde(default = "default_hard_limit")]
    pub hard_limit: Decimal,
    /// Adverse move from entry, as a fraction, that triggers the protective
    /// stop (0.02 = 2%).
    #[serde(default = "default_stop_loss_pct")]
    pub stop_loss_pct: f64,
    /// Account leverage used for the liquidation price estimate. 1.0 means
    /// spot-like (no liquidation monitoring).
    #[serde(default = "default_leverage")]
    pub leverage: f64,
    /// Maintenance margin fraction of notional.
    #[serde(default = "default_maint_margin_pct")]
    pub maint_margin_pct: f64,
    /// Distance-to-liquidation fraction below which emergency reduction
    /// fires.
    #[serde(default = "default_liquidation_buffer_pct")]
    pub liquidation_buffer_pct: f64,
    /// Minimum seconds between emergency reductions.
    #[serde(default = "default_liquidation_cooldown_secs")]
    pub liquidation_cooldown_secs: u64,
    /// Fraction of the position closed by one emergency reduction.
    #[serde(default = "default_emergency_reduce_fraction")]
    pub emergency_reduce_fraction: Decimal,
    /// Strength of the soft-breach inventory skew. At full soft-limit
    /// utilisation the increasing side is widened by this fraction and the
    /// reducing side tightened by the same fraction.
    #[serde(default = "default_skew_factor")]
    pub skew_factor: f64,
    /// Upper bound on any per-side spread multiplier.
    #[serde(default = "default_max_overlay")]
    pub max_overlay: f64,
    /// Lower bound on any per-side spread multiplier.
    #[serde(default = "default_min_overlay")]
    pub min_overlay: f64,
    /// Mid displacement, in units of per-tick sigma, at which the
    /// displacement guard starts widening both sides.
    #[serde(default = "default_displacement_sigmas")]
    pub displacement_sigmas: f64,
    /// Window of recent fills used by the fill-imbalance overlay.
    #[serde(default = "default_imbalance_window")]
    pub imbalance_window: usize,
    /// Absolute imbalance (0..1) at which the hit side starts widening.
    #[serde(default = "default_imbalance_threshold")]
    pub imbalance_threshold: f64,
    /// Regime signal age (ticks) under which transition caution widens
    /// both sides.
    #[serde(default = "default_transition_caution_ticks")]
    pub transition_caution_ticks: u64,
}

fn default_soft_limit() -> Decimal {
    dec!(3)
}

fn default_hard_limit() -> Decimal {
    dec!(5)
}

fn default_stop_loss_pct() -> f64 {
    0.02
}

fn default_leverage() -> f64 {
    1.0
}

fn default_maint_margin_pct() -> f64 {
    0.005
}

fn default_liquidation_buffer_pct() -> f64 {
    0.05
}

fn default_liquidation_cooldown_secs() -> u64 {
    30
}

fn default_emergency_reduce_fraction() -> Decimal {
    dec!(0.5)
}

fn default_skew_factor() -> f64 {
    0.5
}

fn default_max_overlay() -> f64 {
    3.0
}

fn default_min_overlay() -> f64 {
    0.25
}

fn default_displacement_sigmas() -> f64 {
    2.0
}

fn default_imbalance_window() -> usize {
    20
}

fn default_imbalance_threshold() -> f64 {
    0.6
}

fn default_transition_caution_ticks() -> u64 {
    5
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            soft_limit: default_soft_limit(),
            hard_limit: default_hard_limit(),
            stop_loss_pct: default_stop_loss_pct(),
            leverage: default_leverage(),
            maint_margin_pct: default_maint_margin_pct(),
            liquidation_buffer_pct: default_liquidation_buffer_pct(),
            liquidation_cooldown_secs: default_liquidation_cooldown_secs(),
            emergency_reduce_fraction: default_emergency_reduce_fraction(),
            skew_factor: default_skew_factor(),
            max_overlay: default_max_overlay(),
            min_overlay: default_min_overlay(),
            displacement_sigmas: default_displacement_sigmas(),
            imbalance_window: default_imbalance_window(),
            imbalance_threshold: default_imbalance_threshold(),
            transition_caution_ticks: default_transition_caution_ticks(),
        }
    }
}

impl RiskConfig {
    pub fn validate(&self) -> RiskResult<()> {
        if self.soft_limit <= Decimal::ZERO {
            return Err(RiskError::Configuration(
                "soft_limit must be positive".into(),
            ));
        }
        if self.hard_limit < self.soft_limit {
            return Err(RiskError::Configuration(format!(
                "hard_limit {} must be >= soft_limit {}",
                self.hard_limit, self.soft_limit
            )));
        }
        if self.stop_loss_pct <= 0.0 || self.stop_loss_pct >= 1.0 {
            return Err(RiskError::Configuration(
                "stop_loss_pct must be in (0, 1)".into(),
            ));
        }
        if self.leverage < 1.0 {
            return Err(RiskError::Configuration("leverage must be >= 1".into()));
        }
        if self.emergency_reduce_fraction <= Decimal::ZERO
            || self.emergency_reduce_fraction > Decimal::ONE
        {
            return Err(RiskError::Configuration(
                "emergency_reduce_fraction must be in (0, 1]".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.min_overlay) || self.max_overlay <= 1.0 {
            return Err(RiskError::Configuration(
                "overlay bounds must satisfy 0 <= min_overlay < 1 < max_overlay".into(),
            ));
        }
        if self.skew_factor < 0.0 || self.skew_factor >= 1.0 {
            return Err(RiskError::Configuration(
                "skew_factor must be in [0, 1)".into(),
            ));
        }
        Ok(())
    }
}
