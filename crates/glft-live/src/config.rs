use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

use crate::error::{LiveError, LiveResult};

#[derive(Debug, Clone, Deserialize)]
pub struct LiveConfig {
    /// Market data poll cadence in milliseconds. REST cadence, not
    /// tick-by-tick.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Upper bound on any single venue call.
    #[serde(default = "default_io_timeout_ms")]
    pub io_timeout_ms: u64,
    /// Price drift, in absolute currency units, below which a resting
    /// order is left alone instead of replaced.
    #[serde(default = "default_requote_tolerance")]
    pub requote_tolerance: Decimal,
    /// Ticks between local-vs-exchange position reconciliations.
    #[serde(default = "default_reconcile_interval_ticks")]
    pub reconcile_interval_ticks: u64,
    /// Starting cash for the local ledger.
    #[serde(default = "default_initial_cash")]
    pub initial_cash: Decimal,
    /// Fee rate assumed on passive fills when the venue reports none.
    #[serde(default = "default_maker_fee")]
    pub maker_fee: Decimal,
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_io_timeout_ms() -> u64 {
    5_000
}

fn default_requote_tolerance() -> Decimal {
    dec!(0.5)
}

fn default_reconcile_interval_ticks() -> u64 {
    20
}

fn default_initial_cash() -> Decimal {
    dec!(10000)
}

fn default_maker_fee() -> Decimal {
    dec!(0.0002)
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            io_timeout_ms: default_io_timeout_ms(),
            requote_tolerance: default_requote_tolerance(),
            reconcile_interval_ticks: default_reconcile_interval_ticks(),
            initial_cash: default_initial_cash(),
            maker_fee: default_maker_fee(),
        }
    }
}

impl LiveConfig {
    pub fn validate(&self) -> LiveResult<()> {
        if self.poll_interval_ms == 0 {
            return Err(LiveError::Configuration(
                "poll_interval_ms must be positive".into(),
            ));
        }
        if self.io_timeout_ms == 0 {
            return Err(LiveError::Configuration(
                "io_timeout_ms must be positive".into(),
            ));
        }
        if self.requote_tolerance < Decimal::ZERO {
            return Err(LiveError::Configuration(
                "requote_tolerance must be non-negative".into(),
            ));
        }
        if self.reconcile_interval_ticks == 0 {
            return Err(LiveError::Configuration(
                "reconcile_interval_ticks must be positive".into(),
            ));
        }
        if self.initial_cash <= Decimal::ZERO {
            return Err(LiveError::Configuration(
                "initial_cash must be positive".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        LiveConfig::default().validate().unwrap();
    }

    #[test]
    fn zero_poll_interval_rejected() {
        let cfg = LiveConfig {
            poll_interval_ms: 0,
            ..LiveConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
