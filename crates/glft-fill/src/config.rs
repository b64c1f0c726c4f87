use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::error::{FillError, FillResult};

/// Tuning for the simulated fill model. All price-denominated fields are
/// absolute currency units, matching the spread configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct FillConfig {
    /// How far price must trade through a limit before the order is
    /// eligible to fill. Zero means fill on touch-through.
    #[serde(default = "default_min_penetration")]
    pub min_penetration: Decimal,
    /// Scales fill probability; higher assumes better queue position.
    #[serde(default = "default_aggressiveness")]
    pub aggressiveness: f64,
    /// Penetration depth at which fill probability saturates toward 1.
    #[serde(default = "default_probability_scale")]
    pub probability_scale: Decimal,
    /// Adverse price adjustment applied to every fill. Never improves the
    /// fill; buys execute higher, sells lower.
    #[serde(default = "default_slippage")]
    pub slippage: Decimal,
    /// Seed for the intra-candle path and fill-probability draws.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_min_penetration() -> Decimal {
    Decimal::ZERO
}

fn default_aggressiveness() -> f64 {
    1.0
}

fn default_probability_scale() -> Decimal {
    dec!(10)
}

fn default_slippage() -> Decimal {
    Decimal::ZERO
}

fn default_seed() -> u64 {
    42
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            min_penetration: default_min_penetration(),
            aggressiveness: default_aggressiveness(),
            probability_scale: default_probability_scale(),
            slippage: default_slippage(),
            seed: default_seed(),
        }
    }
}

impl FillConfig {
    pub fn validate(&self) -> FillResult<()> {
        if self.min_penetration < Decimal::ZERO {
            return Err(FillError::Configuration(
                "min_penetration must be non-negative".into(),
            ));
        }
        if self.aggressiveness <= 0.0 {
            return Err(FillError::Configuration(
                "aggressiveness must be positive".into(),
            ));
        }
        if self.probability_scale <= Decimal::ZERO {
            return Err(FillError::Configuration(
                "probability_scale must be positive".into(),
            ));
        }
        if self.slippage < Decimal::ZERO {
            return Err(FillError::Configuration(
                "slippage must be non-negative".into(),
            ));
        }
        Ok(())
    }

    /// A fill model that fills deterministically on touch-through. Used by
    /// tests and by paper trading, where the book itself gates fills.
    pub fn always_fill() -> Self {
        Self {
            min_penetration: Decimal::ZERO,
            aggressiveness: f64::MAX,
            ..Self::default()
        }
    }
}
