//! Fill matching for resting limit orders.
//!
//! One interface, two implementations. [`CandleFillEngine`] replays OHLC
//! candles through a deterministic intra-candle price path so a backtest
//! can never fill both sides of a quote just because the candle's range
//! covered both, and never sees prices outside the candle being processed.
//! [`BookFillEngine`] matches against live best bid/ask and fills at the
//! order's resting limit price.

pub mod book;
pub mod candle;
pub mod config;
pub mod error;

pub use book::BookFillEngine;
pub use candle::CandleFillEngine;
pub use config::FillConfig;
pub use error::{FillError, FillResult};

use glft_core::decimal::{Price, Size};
use glft_core::order::{Order, OrderId, OrderSide};

/// A simulated execution against a resting order.
///
/// Carries no fee or venue fill id; the orchestrator assigns those when it
/// turns the event into a ledger fill.
#[derive(Debug, Clone, PartialEq)]
pub struct Execution {
    pub order_id: OrderId,
    pub side: OrderSide,
    pub price: Price,
    pub quantity: Size,
}

/// Matches resting orders against one unit of market data.
///
/// Implementations must not mutate the orders; the caller consumes
/// remaining quantity when it applies the executions.
pub trait FillEngine {
    type MarketData;

    fn match_orders(&mut self, orders: &[Order], data: &Self::MarketData) -> Vec<Execution>;
}
