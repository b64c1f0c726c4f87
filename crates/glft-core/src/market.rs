//! Market data snapshots.
//!
//! `Candle` and `Ticker` are the two raw inputs (historical and live);
//! `MarketState` is the per-tick snapshot every downstream component
//! consumes. It is refreshed exactly once per tick.

use crate::error::{CoreError, Result};
use crate::Price;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trend/range classification gating trading aggressiveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regime {
    /// Sideways market: quote full size.
    #[default]
    Ranging,
    /// Mild trend: quote reduced size.
    MildTrend,
    /// Strong trend: pause new placement, reductions still allowed.
    StrongTrend,
}

impl Regime {
    /// Whether new (exposure-increasing) orders may be placed.
    pub fn allows_new_orders(&self) -> bool {
        !matches!(self, Self::StrongTrend)
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ranging => write!(f, "ranging"),
            Self::MildTrend => write!(f, "mild_trend"),
            Self::StrongTrend => write!(f, "strong_trend"),
        }
    }
}

/// One OHLCV candle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: Price,
    pub high: Price,
    pub low: Price,
    pub close: Price,
    pub volume: crate::Size,
}

impl Candle {
    /// Structural validation: positive prices and a consistent range.
    ///
    /// Malformed candles are a hard error, never skipped: silent skipping
    /// has previously produced misleading backtest numbers.
    pub fn validate(&self) -> Result<()> {
        if !self.open.is_positive()
            || !self.high.is_positive()
            || !self.low.is_positive()
            || !self.close.is_positive()
        {
            return Err(CoreError::InvalidCandle(format!(
                "non-positive price at {}",
                self.timestamp
            )));
        }
        if self.high < self.low {
            return Err(CoreError::InvalidCandle(format!(
                "high {} below low {} at {}",
                self.high, self.low, self.timestamp
            )));
        }
        if self.open > self.high
            || self.open < self.low
            || self.close > self.high
            || self.close < self.low
        {
            return Err(CoreError::InvalidCandle(format!(
                "open/close outside range at {}",
                self.timestamp
            )));
        }
        Ok(())
    }

    /// True if the candle closed at or above its open.
    pub fn is_up(&self) -> bool {
        self.close >= self.open
    }
}

/// Top-of-book ticker from a live venue.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub bid: Price,
    pub ask: Price,
    pub last: Price,
    pub timestamp: DateTime<Utc>,
}

impl Ticker {
    /// Mid price: (bid + ask) / 2. None for an empty or crossed book.
    pub fn mid(&self) -> Option<Price> {
        if !self.bid.is_positive() || !self.ask.is_positive() || self.bid >= self.ask {
            return None;
        }
        Some(Price::new(
            (self.bid.inner() + self.ask.inner()) / rust_decimal::Decimal::TWO,
        ))
    }
}

/// Per-tick market snapshot consumed by the quote model and risk layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    /// Current mid price.
    pub mid: Price,
    /// Volatility estimate (per-tick sigma, model space).
    pub sigma: f64,
    /// Regime classification for this tick.
    pub regime: Regime,
    /// Order-book liquidity parameter kappa (fill-intensity decay).
    pub kappa: f64,
    pub timestamp: DateTime<Utc>,
}
