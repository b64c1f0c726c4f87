//! Venue abstraction.
//!
//! One implementation per exchange, plus the in-memory paper venue. Trait
//! methods return boxed futures so implementations stay dyn-compatible
//! and tests can inject mocks without a runtime macro.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use glft_core::decimal::{Price, Size};
use glft_core::market::{Candle, Ticker};
use glft_core::order::{OrderId, OrderSide};
use glft_core::trade::Fill;
use glft_model::DepthSample;

use crate::error::{LiveError, LiveResult};

/// Boxed future for dyn-compatible async trait methods.
pub use futures_util::future::BoxFuture;

/// Read side of a venue: prices only, never order state.
pub trait MarketDataSource: Send + Sync {
    /// Current best bid/ask and last trade.
    fn get_ticker(&self) -> BoxFuture<'_, LiveResult<Ticker>>;

    /// Recent history, oldest first, for estimator warmup.
    fn get_ohlcv(&self, limit: usize) -> BoxFuture<'_, LiveResult<Vec<Candle>>>;

    /// Visible book depth near the touch, as cumulative size per distance
    /// from mid. Venues without an L2 feed may return an empty snapshot;
    /// kappa estimation then falls back to the calibrated seed.
    fn get_depth(&self) -> BoxFuture<'_, LiveResult<Vec<DepthSample>>>;
}

/// Outcome of an order placement attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaceOutcome {
    Placed(OrderId),
    /// Venue declined; the reason is logged and the quote recomputed next
    /// tick. Never fatal.
    Rejected(String),
}

impl PlaceOutcome {
    /// Map the outcome onto the error taxonomy. Rejection is recoverable;
    /// callers log it and resubmit on the next tick.
    pub fn into_result(self) -> LiveResult<OrderId> {
        match self {
            Self::Placed(id) => Ok(id),
            Self::Rejected(reason) => Err(LiveError::ExecutionRejected(reason)),
        }
    }
}

/// Write side of a venue: order lifecycle and account state.
pub trait OrderExecutionClient: Send + Sync {
    fn place_order(
        &self,
        side: OrderSide,
        price: Price,
        quantity: Size,
        post_only: bool,
    ) -> BoxFuture<'_, LiveResult<PlaceOutcome>>;

    fn cancel(&self, order_id: OrderId) -> BoxFuture<'_, LiveResult<()>>;

    /// Fills at or after `since`. May overlap previous polls; application
    /// is idempotent by fill id.
    fn get_fills(&self, since: DateTime<Utc>) -> BoxFuture<'_, LiveResult<Vec<Fill>>>;

    /// Exchange-reported signed net position, for reconciliation.
    fn get_position(&self) -> BoxFuture<'_, LiveResult<Decimal>>;
}
