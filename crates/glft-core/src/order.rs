//! Order lifecycle types and identifiers.
//!
//! One resting order per side per symbol is the structural invariant of the
//! whole engine; the `Order` type here is deliberately flat to keep that
//! discipline visible at the call sites.

use crate::{Price, Size};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Order side: buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Returns the opposite side.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }

    /// Returns 1 for buy, -1 for sell (for position calculations).
    pub fn sign(&self) -> i8 {
        match self {
            Self::Buy => 1,
            Self::Sell => -1,
        }
    }
}

impl fmt::Display for OrderSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "buy"),
            Self::Sell => write!(f, "sell"),
        }
    }
}

/// Order status through its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Resting on the book.
    Open,
    /// Fully filled.
    Filled,
    /// Cancelled before completion.
    Cancelled,
    /// Rejected by the venue.
    Rejected,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Filled => write!(f, "filled"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Venue-assigned order identifier.
pub type OrderId = u64;

/// Exchange fill identifier, the idempotency key for fill application.
pub type FillId = String;

/// Client order ID for idempotency.
///
/// Every order carries a unique cloid so that a retried submission can
/// never double-place.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientOrderId(String);

impl ClientOrderId {
    /// Create a new unique client order ID.
    ///
    /// Format: `glft_{timestamp_ms}_{uuid_short}`
    pub fn new() -> Self {
        let ts = chrono::Utc::now().timestamp_millis();
        let uuid_short = &Uuid::new_v4().to_string()[..8];
        Self(format!("glft_{ts}_{uuid_short}"))
    }

    /// Create from an existing string (for parsing responses).
    pub fn from_string(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ClientOrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A resting limit order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Venue order id.
    pub id: OrderId,
    /// Client order id (idempotency key for placement).
    pub cloid: ClientOrderId,
    pub side: OrderSide,
    pub price: Price,
    /// Original quantity.
    pub quantity: Size,
    /// Quantity still resting. Starts equal to `quantity`.
    pub remaining: Size,
    pub status: OrderStatus,
    /// True for risk-forced orders that may only reduce |position|.
    pub reduce_only: bool,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Create a new open order.
    pub fn new(id: OrderId, side: OrderSide, price: Price, quantity: Size) -> Self {
        Self {
            id,
            cloid: ClientOrderId::new(),
            side,
            price,
            quantity,
            remaining: quantity,
            status: OrderStatus::Open,
            reduce_only: false,
            created_at: Utc::now(),
        }
    }

    /// Create a reduce-only order (risk-forced reductions).
    pub fn reduce_only(id: OrderId, side: OrderSide, price: Price, quantity: Size) -> Self {
        Self {
            reduce_only: true,
            ..Self::new(id, side, price, quantity)
        }
    }

    /// Whether this order can still receive fills.
    pub fn is_active(&self) -> bool {
        self.status == OrderStatus::Open && self.remaining.is_positive()
    }

    /// Consume filled quantity, capped at remaining, and update status.
    ///
    /// Returns the quantity actually consumed; a fill can never exceed the
    /// order's remaining quantity.
    pub fn consume(&mut self, quantity: Size) -> Size {
        let consumed = quantity.min(self.remaining);
        self.remaining = self.remaining - consumed;
        if self.remaining.is_zero() {
            self.status = OrderStatus::Filled;
        }
        consumed
    }

    /// Requote hysteresis: whether a desired quote has drifted far enough
    /// from this resting order to justify a cancel/replace. Churning the
    /// order for sub-tolerance drift loses queue position for nothing.
    pub fn deviates_from(&self, price: Price, size: Size, tolerance: Decimal) -> bool {
        self.price.distance(price) > tolerance || self.remaining != size
    }
}

/// A two-sided quote computed for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub bid: Price,
    pub ask: Price,
    /// Size quoted on each side.
    pub size: Size,
    /// Inventory-adjusted fair value the quote is centered on.
    pub reservation_price: Price,
    /// Half-distance from reservation price to each side.
    pub half_spread: Price,
}

impl Quote {
    /// Full quoted spread: ask - bid.
    pub fn spread(&self) -> Price {
        self.ask - self.bid
    }

    /// Bid below ask, both positive.
    pub fn is_valid(&self) -> bool {
        self.bid.is_positive() && self.ask.is_positive() && self.bid < self.ask
    }
}
