//! EWMA volatility estimation from mid-price log returns.
//!
//! Feeds the sigma input of the quote model. Estimates are untrusted until
//! `lookback` returns have been observed; cold-start noise otherwise trips
//! the spread straight to its ceiling.

use glft_core::Price;

/// Exponentially weighted volatility of per-tick log returns.
#[derive(Debug, Clone)]
pub struct VolEstimator {
    alpha: f64,
    lookback: usize,
    count: usize,
    last_mid: Option<f64>,
    variance: f64,
}

impl VolEstimator {
    pub fn new(lookback: usize, alpha: f64) -> Self {
        Self {
            alpha,
            lookback,
            count: 0,
            last_mid: None,
            variance: 0.0,
        }
    }

    /// Observe a new mid price.
    pub fn on_mid(&mut self, mid: Price) {
        let m = mid.to_f64();
        if m <= 0.0 {
            return;
        }
        if let Some(last) = self.last_mid {
            let ret = (m / last).ln();
            let sq = ret * ret;
            if self.count == 0 {
                self.variance = sq;
            } else {
                self.variance = self.alpha * sq + (1.0 - self.alpha) * self.variance;
            }
            self.count += 1;
        }
        self.last_mid = Some(m);
    }

    /// Per-tick sigma of log returns.
    pub fn sigma(&self) -> f64 {
        self.variance.max(0.0).sqrt()
    }

    /// Sigma in absolute currency units around the given mid.
    ///
    /// The quote model's reservation adjustment is absolute, so sigma is
    /// converted once here rather than re-scaled inside the model.
    pub fn sigma_abs(&self, mid: Price) -> f64 {
        self.sigma() * mid.to_f64()
    }

    pub fn is_warmed_up(&self) -> bool {
        self.count >= self.lookback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_flat_prices_zero_sigma() {
        let mut vol = VolEstimator::new(5, 0.1);
        for _ in 0..10 {
            vol.on_mid(Price::new(dec!(100)));
        }
        assert!(vol.is_warmed_up());
        assert_eq!(vol.sigma(), 0.0);
    }

    #[test]
    fn test_oscillation_raises_sigma() {
        let mut quiet = VolEstimator::new(5, 0.1);
        let mut noisy = VolEstimator::new(5, 0.1);
        for i in 0..50 {
            quiet.on_mid(Price::from_f64(100.0 + 0.01 * (i % 2) as f64));
            noisy.on_mid(Price::from_f64(100.0 + 5.0 * (i % 2) as f64));
        }
        assert!(noisy.sigma() > quiet.sigma());
    }

    #[test]
    fn test_warmup_gate() {
        let mut vol = VolEstimator::new(10, 0.1);
        vol.on_mid(Price::new(dec!(100)));
        vol.on_mid(Price::new(dec!(101)));
        assert!(!vol.is_warmed_up());
    }

    #[test]
    fn test_sigma_abs_scales_with_mid() {
        let mut vol = VolEstimator::new(2, 0.5);
        vol.on_mid(Price::new(dec!(100)));
        vol.on_mid(Price::new(dec!(101)));
        vol.on_mid(Price::new(dec!(100)));

        let at_100 = vol.sigma_abs(Price::new(dec!(100)));
        let at_100k = vol.sigma_abs(Price::new(dec!(100000)));
        assert!(at_100k > at_100 * 900.0);
    }

    #[test]
    fn test_ignores_non_positive_mid() {
        let mut vol = VolEstimator::new(2, 0.5);
        vol.on_mid(Price::new(dec!(100)));
        vol.on_mid(Price::ZERO);
        vol.on_mid(Price::new(dec!(100)));
        assert_eq!(vol.sigma(), 0.0);
    }
}
