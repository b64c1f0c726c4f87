use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::error::{BacktestError, BacktestResult};

#[derive(Debug, Clone, Deserialize)]
pub struct BacktestConfig {
    /// Starting cash balance.
    #[serde(default = "default_initial_cash")]
    pub initial_cash: Decimal,
    /// Candle interval in seconds; drives metric annualization.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Fee rate on passive (quoted) fills, as a fraction of notional.
    #[serde(default = "default_maker_fee")]
    pub maker_fee: Decimal,
    /// Fee rate on forced reductions, which cross the spread.
    #[serde(default = "default_taker_fee")]
    pub taker_fee: Decimal,
}

fn default_initial_cash() -> Decimal {
    dec!(10000)
}

fn default_interval_secs() -> u64 {
    60
}

fn default_maker_fee() -> Decimal {
    dec!(0.0002)
}

fn default_taker_fee() -> Decimal {
    dec!(0.0005)
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            initial_cash: default_initial_cash(),
            interval_secs: default_interval_secs(),
            maker_fee: default_maker_fee(),
            taker_fee: default_taker_fee(),
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> BacktestResult<()> {
        if self.initial_cash <= Decimal::ZERO {
            return Err(BacktestError::Configuration(
                "initial_cash must be positive".into(),
            ));
        }
        if self.interval_secs == 0 {
            return Err(BacktestError::Configuration(
                "interval_secs must be positive".into(),
            ));
        }
        if self.maker_fee < Decimal::ZERO || self.taker_fee < Decimal::ZERO {
            return Err(BacktestError::Configuration(
                "fee rates must be non-negative".into(),
            ));
        }
        Ok(())
    }
}
