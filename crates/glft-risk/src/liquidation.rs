use chrono::{DateTime, Duration, Utc};
use glft_core::decimal::Price;
use glft_ledger::position::Position;
use tracing::warn;

use crate::config::RiskConfig;

/// Outcome of one liquidation check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiquidationStatus {
    /// Fractional distance from mark to the estimated liquidation price.
    /// `None` when the account is unleveraged or the position is flat.
    pub distance: Option<f64>,
    /// True when the distance is inside the buffer.
    pub breached: bool,
    /// True exactly when an emergency reduction should fire this tick.
    pub emergency: bool,
}

impl LiquidationStatus {
    const CLEAR: LiquidationStatus = LiquidationStatus {
        distance: None,
        breached: false,
        emergency: false,
    };
}

/// Tracks distance to the estimated liquidation price and decides when an
/// emergency reduction is due.
///
/// Firing is cooldown-gated: one reduction per breach entry, re-armed only
/// after the cooldown while the breach persists. Without the gate a
/// persistent breach would emit a reduction every tick and race its own
/// fills.
#[derive(Debug)]
pub struct LiquidationMonitor {
    last_fired: Option<DateTime<Utc>>,
}

impl LiquidationMonitor {
    pub fn new() -> Self {
        Self { last_fired: None }
    }

    pub fn check(
        &mut self,
        cfg: &RiskConfig,
        position: &Position,
        mark: Price,
        now: DateTime<Utc>,
    ) -> LiquidationStatus {
        // leverage 1.0 means there is no liquidation price to defend
        if cfg.leverage <= 1.0 || position.is_flat() {
            return LiquidationStatus::CLEAR;
        }

        let distance = match Self::distance(cfg, position, mark) {
            Some(d) => d,
            None => return LiquidationStatus::CLEAR,
        };

        let breached = distance < cfg.liquidation_buffer_pct;
        let emergency = if breached {
            let cooled = match self.last_fired {
                Some(t) => {
                    now - t >= Duration::seconds(cfg.liquidation_cooldown_secs as i64)
                }
                None => true,
            };
            if cooled {
                warn!(
                    distance = distance,
                    buffer = cfg.liquidation_buffer_pct,
                    "liquidation buffer breached, emergency reduction"
                );
                self.last_fired = Some(now);
            }
            cooled
        } else {
            false
        };

        LiquidationStatus {
            distance: Some(distance),
            breached,
            emergency,
        }
    }

    /// Estimated fractional distance from mark to liquidation. Long
    /// positions liquidate below entry, shorts above.
    fn distance(cfg: &RiskConfig, position: &Position, mark: Price) -> Option<f64> {
        let entry = position.avg_entry.to_f64();
        let mark = mark.to_f64();
        if entry <= 0.0 || mark <= 0.0 {
            return None;
        }
        let margin_frac = 1.0 / cfg.leverage - cfg.maint_margin_pct;
        if margin_frac <= 0.0 {
            return Some(0.0);
        }
        let distance = if position.is_long() {
            let liq = entry * (1.0 - margin_frac);
            (mark - liq) / mark
        } else {
            let liq = entry * (1.0 + margin_frac);
            (liq - mark) / mark
        };
        Some(distance.max(0.0))
    }
}

impl Default for LiquidationMonitor {
    fn default() -> Self {
        Self::new()
    }
}
