//! Inventory bookkeeping for the GLFT engine.
//!
//! The `InventoryLedger` is the single writer of position and cash state.
//! Fills flow in from the fill engine (backtest) or the live loop; Trade
//! records flow out, append-only.

pub mod error;
pub mod ledger;
pub mod position;

pub use error::{LedgerError, LedgerResult};
pub use ledger::InventoryLedger;
pub use position::Position;
