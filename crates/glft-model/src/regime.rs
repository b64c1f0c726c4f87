//! ADX-based regime detection with Wilder smoothing.
//!
//! Wilder's original recursive smoothing is used rather than an EWMA so the
//! configured thresholds stay portable across implementations and charting
//! tools. The detector also exposes regime confidence and age: the risk
//! layer wants to get cautious while a transition is still forming, not
//! only after it is confirmed.

use crate::config::RegimeConfig;
use glft_core::{Candle, Price, Regime};
use tracing::debug;

/// Classification output for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegimeSignal {
    pub regime: Regime,
    /// Current ADX value; 0 until warmed up.
    pub adx: f64,
    /// How deep inside the regime's ADX band the reading sits, in [0, 1].
    /// Low confidence means the market is near a regime boundary.
    pub confidence: f64,
    /// Ticks since the regime last changed.
    pub age: u64,
}

/// Stateful ADX regime detector.
#[derive(Debug)]
pub struct RegimeDetector {
    config: RegimeConfig,
    prev: Option<Bar>,
    /// Bars consumed so far (excluding the seed bar).
    bars: usize,
    smoothed_tr: f64,
    smoothed_plus_dm: f64,
    smoothed_minus_dm: f64,
    /// DX accumulator during ADX warmup.
    dx_sum: f64,
    dx_count: usize,
    adx: Option<f64>,
    current: Regime,
    age: u64,
}

#[derive(Debug, Clone, Copy)]
struct Bar {
    high: f64,
    low: f64,
    close: f64,
}

impl RegimeDetector {
    pub fn new(config: RegimeConfig) -> Self {
        Self {
            config,
            prev: None,
            bars: 0,
            smoothed_tr: 0.0,
            smoothed_plus_dm: 0.0,
            smoothed_minus_dm: 0.0,
            dx_sum: 0.0,
            dx_count: 0,
            adx: None,
            current: Regime::Ranging,
            age: 0,
        }
    }

    /// Whether enough bars have been seen for ADX to be meaningful.
    pub fn is_warmed_up(&self) -> bool {
        self.adx.is_some()
    }

    /// Feed one candle and classify.
    pub fn on_candle(&mut self, candle: &Candle) -> RegimeSignal {
        self.on_bar(Bar {
            high: candle.high.to_f64(),
            low: candle.low.to_f64(),
            close: candle.close.to_f64(),
        })
    }

    /// Feed a live mid price as a degenerate bar (high = low = close).
    ///
    /// Directional movement then reduces to consecutive mid changes, which
    /// keeps backtest and live classification on the same math.
    pub fn on_mid(&mut self, mid: Price) -> RegimeSignal {
        let m = mid.to_f64();
        self.on_bar(Bar {
            high: m,
            low: m,
            close: m,
        })
    }

    /// Classify a whole price history from scratch (backtest warmup).
    pub fn classify(config: RegimeConfig, history: &[Candle]) -> RegimeSignal {
        let mut detector = Self::new(config);
        let mut signal = detector.signal();
        for candle in history {
            signal = detector.on_candle(candle);
        }
        signal
    }

    fn on_bar(&mut self, bar: Bar) -> RegimeSignal {
        let Some(prev) = self.prev.replace(bar) else {
            return self.signal();
        };

        let tr = (bar.high - bar.low)
            .max((bar.high - prev.close).abs())
            .max((bar.low - prev.close).abs());
        let up_move = bar.high - prev.high;
        let down_move = prev.low - bar.low;
        let plus_dm = if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        };
        let minus_dm = if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        };

        self.bars += 1;
        let window = self.config.window as f64;

        if self.bars <= self.config.window {
            // Seeding phase: plain sums.
            self.smoothed_tr += tr;
            self.smoothed_plus_dm += plus_dm;
            self.smoothed_minus_dm += minus_dm;
            if self.bars < self.config.window {
                return self.signal();
            }
        } else {
            // Wilder recursion: s = s - s/n + x.
            self.smoothed_tr = self.smoothed_tr - self.smoothed_tr / window + tr;
            self.smoothed_plus_dm = self.smoothed_plus_dm - self.smoothed_plus_dm / window + plus_dm;
            self.smoothed_minus_dm =
                self.smoothed_minus_dm - self.smoothed_minus_dm / window + minus_dm;
        }

        let dx = if self.smoothed_tr > 0.0 {
            let plus_di = 100.0 * self.smoothed_plus_dm / self.smoothed_tr;
            let minus_di = 100.0 * self.smoothed_minus_dm / self.smoothed_tr;
            let di_sum = plus_di + minus_di;
            if di_sum > 0.0 {
                100.0 * (plus_di - minus_di).abs() / di_sum
            } else {
                0.0
            }
        } else {
            0.0
        };

        match self.adx {
            None => {
                self.dx_sum += dx;
                self.dx_count += 1;
                if self.dx_count >= self.config.window {
                    self.adx = Some(self.dx_sum / self.dx_count as f64);
                }
            }
            Some(adx) => {
                self.adx = Some((adx * (window - 1.0) + dx) / window);
            }
        }

        self.reclassify();
        self.signal()
    }

    fn reclassify(&mut self) {
        let Some(adx) = self.adx else {
            return;
        };
        let next = if adx < self.config.mild_threshold {
            Regime::Ranging
        } else if adx < self.config.strong_threshold {
            Regime::MildTrend
        } else {
            Regime::StrongTrend
        };

        if next != self.current {
            debug!(from = %self.current, to = %next, adx, "regime transition");
            self.current = next;
            self.age = 0;
        } else {
            self.age = self.age.saturating_add(1);
        }
    }

    fn signal(&self) -> RegimeSignal {
        let adx = self.adx.unwrap_or(0.0);
        RegimeSignal {
            regime: if self.adx.is_some() {
                self.current
            } else {
                Regime::Ranging
            },
            adx,
            confidence: if self.adx.is_some() {
                self.confidence(adx)
            } else {
                0.0
            },
            age: self.age,
        }
    }

    /// Distance into the current band, normalized by half the band width.
    fn confidence(&self, adx: f64) -> f64 {
        let mild = self.config.mild_threshold;
        let strong = self.config.strong_threshold;
        let band = match self.current {
            Regime::Ranging => (0.0, mild),
            Regime::MildTrend => (mild, strong),
            Regime::StrongTrend => (strong, 100.0),
        };
        let half_width = (band.1 - band.0) / 2.0;
        if half_width <= 0.0 {
            return 0.0;
        }
        let dist = (adx - band.0).min(band.1 - adx).max(0.0);
        (dist / half_width).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use glft_core::Size;
    use rust_decimal_macros::dec;

    fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
        let start = Utc::now();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let px = Price::from_f64(c);
                Candle {
                    timestamp: start + Duration::seconds(i as i64 * 60),
                    open: px,
                    high: px,
                    low: px,
                    close: px,
                    volume: Size::new(dec!(1)),
                }
            })
            .collect()
    }

    #[test]
    fn test_warmup_returns_ranging_with_zero_confidence() {
        let mut detector = RegimeDetector::new(RegimeConfig::default());
        let candles = candles_from_closes(&[100.0, 101.0, 100.5]);
        let mut signal = None;
        for c in &candles {
            signal = Some(detector.on_candle(c));
        }
        let signal = signal.unwrap();
        assert_eq!(signal.regime, Regime::Ranging);
        assert_eq!(signal.confidence, 0.0);
        assert!(!detector.is_warmed_up());
    }

    #[test]
    fn test_monotonic_trend_classifies_strong() {
        // 80 strictly rising closes: DI- is zero, DX pins at 100.
        let closes: Vec<f64> = (0..80).map(|i| 100.0 + i as f64).collect();
        let signal = RegimeDetector::classify(RegimeConfig::default(), &candles_from_closes(&closes));

        assert_eq!(signal.regime, Regime::StrongTrend);
        assert!(signal.adx > 30.0);
        assert!(!signal.regime.allows_new_orders());
    }

    #[test]
    fn test_alternating_chop_classifies_ranging() {
        // Symmetric up/down chop: directional movement cancels out.
        let closes: Vec<f64> = (0..80)
            .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
            .collect();
        let signal = RegimeDetector::classify(RegimeConfig::default(), &candles_from_closes(&closes));

        assert_eq!(signal.regime, Regime::Ranging);
        assert!(signal.adx < 20.0);
    }

    #[test]
    fn test_age_resets_on_transition() {
        let mut detector = RegimeDetector::new(RegimeConfig::default());

        // Warm up in chop, then flip to a hard trend.
        for c in &candles_from_closes(
            &(0..60)
                .map(|i| if i % 2 == 0 { 100.0 } else { 101.0 })
                .collect::<Vec<_>>(),
        ) {
            detector.on_candle(c);
        }
        let ranging_age = detector.signal().age;
        assert!(ranging_age > 0);

        let mut last = detector.signal();
        for c in &candles_from_closes(&(0..120).map(|i| 101.0 + 2.0 * i as f64).collect::<Vec<_>>())
        {
            let prev_regime = last.regime;
            last = detector.on_candle(c);
            if last.regime != prev_regime {
                assert_eq!(last.age, 0);
            }
        }
        assert_eq!(last.regime, Regime::StrongTrend);
    }

    #[test]
    fn test_mid_feed_matches_degenerate_candles() {
        let closes: Vec<f64> = (0..50).map(|i| 100.0 + (i as f64) * 0.5).collect();

        let from_candles =
            RegimeDetector::classify(RegimeConfig::default(), &candles_from_closes(&closes));

        let mut detector = RegimeDetector::new(RegimeConfig::default());
        let mut from_mids = detector.signal();
        for &c in &closes {
            from_mids = detector.on_mid(Price::from_f64(c));
        }

        assert_eq!(from_candles.regime, from_mids.regime);
        assert!((from_candles.adx - from_mids.adx).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_low_near_boundary() {
        let config = RegimeConfig::default();
        let mut detector = RegimeDetector::new(config);
        detector.adx = Some(19.9); // just under the mild threshold
        detector.current = Regime::Ranging;
        let near = detector.confidence(19.9);

        detector.adx = Some(10.0); // middle of the ranging band
        let deep = detector.confidence(10.0);

        assert!(near < deep);
        assert!(deep > 0.9);
    }
}
