//! Risk layer: inventory limit state machine, protective stops,
//! liquidation-distance monitoring and bounded spread overlays.
//!
//! The controller sits between the quote model and order placement. Every
//! tick it re-evaluates the position, may suppress or skew one or both
//! sides of the model's quote, and may emit forced reduction orders that
//! bypass the normal quoting cycle.

pub mod config;
pub mod controller;
pub mod error;
pub mod liquidation;
pub mod overlays;

pub use config::RiskConfig;
pub use controller::{ForcedOrder, RiskController, RiskDecision, RiskPhase, SideQuote};
pub use error::{RiskError, RiskResult};
pub use liquidation::LiquidationMonitor;
pub use overlays::SpreadOverlays;
