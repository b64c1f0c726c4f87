//! GLFT market-making bot.
//!
//! Wires the quote model, risk controller, fill engines and ledger into
//! two runnable modes:
//! - Backtest: deterministic candle replay through the simulator
//! - Paper: the live trading loop against an in-process paper venue

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::{AppConfig, OperatingMode};
pub use error::{AppError, AppResult};
