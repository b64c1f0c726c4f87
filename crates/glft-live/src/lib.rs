//! Live and paper trading.
//!
//! The trading loop polls market data at a fixed cadence and drives the
//! same model, risk and ledger components the backtester uses. Venue
//! access goes through the [`MarketDataSource`] and
//! [`OrderExecutionClient`] traits; [`PaperVenue`] is the in-memory
//! implementation used for dry runs and tests.

pub mod config;
pub mod error;
pub mod paper;
pub mod trading_loop;
pub mod venue;

pub use config::LiveConfig;
pub use error::{LiveError, LiveResult};
pub use paper::PaperVenue;
pub use trading_loop::LiveTradingLoop;
pub use venue::{BoxFuture, MarketDataSource, OrderExecutionClient, PlaceOutcome};
