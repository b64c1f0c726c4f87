//! Quote model and market classification for the GLFT engine.
//!
//! This crate is the pure math layer:
//! - `QuoteModel`: reservation price and optimal spread (GLFT form)
//! - `RegimeDetector`: ADX-based trend/range classification
//! - `VolEstimator`: EWMA volatility of log returns
//! - `KappaEstimator`: order-book liquidity decay fit
//!
//! Nothing here does I/O or owns order state.

pub mod config;
pub mod error;
pub mod kappa;
pub mod quote;
pub mod regime;
pub mod volatility;

pub use config::{ModelConfig, RegimeConfig};
pub use error::{ModelError, ModelResult};
pub use kappa::{DepthSample, KappaEstimator};
pub use quote::QuoteModel;
pub use regime::{RegimeDetector, RegimeSignal};
pub use volatility::VolEstimator;
