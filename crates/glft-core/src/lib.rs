//! Core domain types for the GLFT market-making engine.
//!
//! This crate provides the fundamental types shared by every other crate:
//! - `Price`, `Size`: precision-safe numeric types
//! - `Order`, `Quote`, `Fill`: order lifecycle types
//! - `Candle`, `Ticker`, `MarketState`: market data snapshots
//! - `Trade`, `EquityPoint`: append-only bookkeeping records

pub mod decimal;
pub mod error;
pub mod market;
pub mod order;
pub mod trade;

pub use decimal::{Price, Size};
pub use error::{CoreError, Result};
pub use market::{Candle, MarketState, Regime, Ticker};
pub use order::{ClientOrderId, FillId, Order, OrderId, OrderSide, OrderStatus, Quote};
pub use trade::{EquityPoint, ExitReason, Fill, Trade};
