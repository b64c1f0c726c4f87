//! Order-book liquidity decay (kappa) estimation.
//!
//! Kappa is the fill-intensity decay parameter of the GLFT spread: how fast
//! executable liquidity falls off with distance from mid. It must be fit to
//! observed depth, not hand-picked; an order-of-magnitude-wrong constant
//! here was a root cause of persistently mispriced quotes.
//!
//! Model: cumulative depth D(d) ~ A * exp(-kappa * d), fit by least-squares
//! regression of ln D against distance d.

use std::collections::VecDeque;

/// One observed depth level: distance from mid and cumulative size there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthSample {
    /// Absolute distance from mid, in currency units.
    pub distance: f64,
    /// Cumulative visible size from mid out to `distance`.
    pub cumulative_size: f64,
}

/// Rolling log-linear fit of depth decay.
#[derive(Debug)]
pub struct KappaEstimator {
    /// (distance, ln cumulative size) observations.
    samples: VecDeque<(f64, f64)>,
    max_samples: usize,
    min_samples: usize,
}

impl KappaEstimator {
    pub fn new(max_samples: usize, min_samples: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples,
            min_samples: min_samples.max(2),
        }
    }

    /// Record one book snapshot worth of depth levels.
    pub fn on_snapshot(&mut self, levels: &[DepthSample]) {
        for level in levels {
            if level.distance <= 0.0 || level.cumulative_size <= 0.0 {
                continue;
            }
            if self.samples.len() == self.max_samples {
                self.samples.pop_front();
            }
            self.samples
                .push_back((level.distance, level.cumulative_size.ln()));
        }
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Current kappa estimate.
    ///
    /// None until enough samples exist or when the fit is degenerate
    /// (non-negative slope means depth does not decay — no usable kappa).
    pub fn kappa(&self) -> Option<f64> {
        if self.samples.len() < self.min_samples {
            return None;
        }

        let n = self.samples.len() as f64;
        let (mut sx, mut sy, mut sxx, mut sxy) = (0.0, 0.0, 0.0, 0.0);
        for &(x, y) in &self.samples {
            sx += x;
            sy += y;
            sxx += x * x;
            sxy += x * y;
        }
        let denom = n * sxx - sx * sx;
        if denom.abs() < f64::EPSILON {
            return None;
        }
        let slope = (n * sxy - sx * sy) / denom;
        let kappa = -slope;
        if kappa > 0.0 && kappa.is_finite() {
            Some(kappa)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exponential_book(kappa: f64, a: f64) -> Vec<DepthSample> {
        (1..=10)
            .map(|i| {
                let d = i as f64 * 0.5;
                DepthSample {
                    distance: d,
                    cumulative_size: a * (-kappa * d).exp(),
                }
            })
            .collect()
    }

    #[test]
    fn test_recovers_known_kappa() {
        let mut est = KappaEstimator::new(500, 10);
        for _ in 0..5 {
            est.on_snapshot(&exponential_book(1.5, 100.0));
        }
        let kappa = est.kappa().unwrap();
        assert!((kappa - 1.5).abs() < 1e-6, "kappa {kappa}");
    }

    #[test]
    fn test_insufficient_samples_returns_none() {
        let mut est = KappaEstimator::new(500, 10);
        est.on_snapshot(&exponential_book(1.5, 100.0)[..3]);
        assert!(est.kappa().is_none());
    }

    #[test]
    fn test_flat_depth_has_no_kappa() {
        let mut est = KappaEstimator::new(500, 4);
        let flat: Vec<DepthSample> = (1..=10)
            .map(|i| DepthSample {
                distance: i as f64,
                cumulative_size: 50.0,
            })
            .collect();
        est.on_snapshot(&flat);
        assert!(est.kappa().is_none());
    }

    #[test]
    fn test_rolling_window_caps_samples() {
        let mut est = KappaEstimator::new(20, 4);
        for _ in 0..10 {
            est.on_snapshot(&exponential_book(2.0, 100.0));
        }
        assert_eq!(est.sample_count(), 20);
        let kappa = est.kappa().unwrap();
        assert!((kappa - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_ignores_degenerate_levels() {
        let mut est = KappaEstimator::new(100, 2);
        est.on_snapshot(&[
            DepthSample {
                distance: 0.0,
                cumulative_size: 10.0,
            },
            DepthSample {
                distance: 1.0,
                cumulative_size: 0.0,
            },
        ]);
        assert_eq!(est.sample_count(), 0);
    }
}
