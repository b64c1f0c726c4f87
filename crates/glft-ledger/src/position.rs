//! Signed position with average cost basis.

use chrono::{DateTime, Utc};
use glft_core::Price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Net exposure on the instrument.
///
/// `quantity` is the sole source of truth for net exposure: positive is
/// long, negative is short. The cost basis stays well-defined across sign
/// flips because the ledger realizes the closing portion before opening
/// the remainder at the fill price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Signed net quantity.
    pub quantity: Decimal,
    /// Average entry price of the open quantity. Zero when flat.
    pub avg_entry: Price,
    /// When the current position was opened. None when flat.
    pub opened_at: Option<DateTime<Utc>>,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            quantity: Decimal::ZERO,
            avg_entry: Price::ZERO,
            opened_at: None,
        }
    }
}

impl Position {
    pub fn is_flat(&self) -> bool {
        self.quantity.is_zero()
    }

    pub fn is_long(&self) -> bool {
        self.quantity > Decimal::ZERO
    }

    pub fn is_short(&self) -> bool {
        self.quantity < Decimal::ZERO
    }

    /// Absolute exposure.
    pub fn abs_quantity(&self) -> Decimal {
        self.quantity.abs()
    }

    /// Mark-to-market PnL of the open quantity.
    pub fn unrealized_pnl(&self, mark: Price) -> Decimal {
        if self.is_flat() {
            return Decimal::ZERO;
        }
        (mark.inner() - self.avg_entry.inner()) * self.quantity
    }

    /// Notional exposure at the mark.
    pub fn notional(&self, mark: Price) -> Decimal {
        self.quantity.abs() * mark.inner()
    }
}
