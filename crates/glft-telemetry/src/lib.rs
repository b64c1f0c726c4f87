//! Structured logging and end-of-session reporting.

pub mod error;
pub mod logging;
pub mod session;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, LogFormat};
pub use session::SessionSummary;
