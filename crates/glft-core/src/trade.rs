//! Append-only bookkeeping records: fills, realized trades, equity curve.
//!
//! `Trade` records are derived by the ledger whenever a position is reduced
//! or closed; they never reference back into live position state.

use crate::{FillId, OrderId, OrderSide, Price, Size};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An execution against a resting order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    /// Venue fill id, the idempotency key for application.
    pub id: FillId,
    /// The order this fill executed against.
    pub order_id: OrderId,
    pub side: OrderSide,
    pub price: Price,
    pub quantity: Size,
    /// Fee charged on this fill, deducted from cash immediately.
    pub fee: Decimal,
    pub timestamp: DateTime<Utc>,
}

impl Fill {
    /// Signed quantity: positive for buys, negative for sells.
    pub fn signed_quantity(&self) -> Decimal {
        match self.side {
            OrderSide::Buy => self.quantity.inner(),
            OrderSide::Sell => -self.quantity.inner(),
        }
    }

    /// Signed notional: cash outflow for buys, inflow for sells.
    pub fn signed_notional(&self) -> Decimal {
        self.signed_quantity() * self.price.inner()
    }
}

/// Why a round-trip (or reduction) was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    /// Opposite-side quote filled in the normal cycle.
    Quote,
    /// Protective stop breached.
    StopLoss,
    /// Liquidation-distance emergency reduction.
    Liquidation,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quote => write!(f, "quote"),
            Self::StopLoss => write!(f, "stop_loss"),
            Self::Liquidation => write!(f, "liquidation"),
        }
    }
}

/// A realized trade: a full closure or partial reduction of a position.
///
/// PnL is computed against the cost basis held before the reducing fill,
/// never by pairing raw buy/sell fills.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Side of the position that was reduced (Buy = was long).
    pub side: OrderSide,
    /// Average cost basis of the closed portion.
    pub entry_price: Price,
    /// Price the closing fill executed at.
    pub exit_price: Price,
    pub quantity: Size,
    /// Fees attributed to the closing fill.
    pub fees: Decimal,
    /// Realized PnL net of nothing (fees tracked separately in cash).
    pub realized_pnl: Decimal,
    /// True when the position went all the way to zero.
    pub full_close: bool,
    pub exit_reason: ExitReason,
    pub opened_at: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
}

impl Trade {
    /// Whether the round-trip made money before fees.
    pub fn is_winner(&self) -> bool {
        self.realized_pnl > Decimal::ZERO
    }
}

/// One point of the mark-to-market equity curve.
///
/// Append-only, monotonic in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub cash: Decimal,
    /// cash + position * mark price.
    pub equity: Decimal,
    /// False for ticks where the strategy was paused (regime gate);
    /// downstream annualization only counts active points.
    pub active: bool,
}
