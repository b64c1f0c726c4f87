//! Candle-replay backtesting.
//!
//! The simulator drives the same model, risk and ledger components the
//! live loop uses, one candle at a time, with no access to future data:
//! resting orders are matched against a candle before that candle updates
//! any estimator or produces a new quote. Runs are deterministic for a
//! fixed fill-model seed.

pub mod config;
pub mod error;
pub mod report;
pub mod simulator;

pub use config::BacktestConfig;
pub use error::{BacktestError, BacktestResult};
pub use report::BacktestReport;
pub use simulator::BacktestSimulator;
