use std::collections::VecDeque;

use glft_core::order::OrderSide;

use crate::config::RiskConfig;

/// Per-side multipliers applied to the model's half-spread.
///
/// `bid` scales the distance from reservation price down to the bid,
/// `ask` the distance up to the ask. Both are bounded by the configured
/// overlay limits, so no overlay can invert the quote.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideMultipliers {
    pub bid: f64,
    pub ask: f64,
}

impl SideMultipliers {
    pub const NEUTRAL: SideMultipliers = SideMultipliers { bid: 1.0, ask: 1.0 };
}

/// Stateful spread overlays. All three components are multiplicative,
/// bounded and reversible: when the driving condition clears, the
/// component's contribution returns to exactly 1.0.
///
/// Components:
/// - displacement guard: widens both sides when mid has moved further from
///   its short-horizon anchor than `displacement_sigmas` per-tick sigmas;
/// - inventory skew: widens the exposure-increasing side and tightens the
///   reducing side in proportion to soft-limit utilisation;
/// - fill imbalance: widens whichever side has been hit disproportionately
///   over the recent fill window.
#[derive(Debug)]
pub struct SpreadOverlays {
    anchor: Option<f64>,
    recent_fills: VecDeque<OrderSide>,
}

/// EWMA weight for the mid anchor. Short horizon so the guard reacts to
/// displacement within a few ticks and decays just as fast.
const ANCHOR_ALPHA: f64 = 0.2;

impl SpreadOverlays {
    pub fn new() -> Self {
        Self {
            anchor: None,
            recent_fills: VecDeque::new(),
        }
    }

    /// Record a fill on our quotes. Window length comes from config at
    /// evaluation time, so only the raw sides are stored here.
    pub fn on_fill(&mut self, side: OrderSide) {
        self.recent_fills.push_back(side);
        // hard cap so an unconsulted overlay cannot grow without bound
        while self.recent_fills.len() > 256 {
            self.recent_fills.pop_front();
        }
    }

    /// Advance the mid anchor. Call once per tick before `multipliers`.
    pub fn on_tick(&mut self, mid: f64) {
        match self.anchor {
            Some(a) => self.anchor = Some(a + ANCHOR_ALPHA * (mid - a)),
            None => self.anchor = Some(mid),
        }
    }

    /// Combined per-side multipliers for this tick.
    ///
    /// `inventory_ratio` is signed position over soft limit, clamped to
    /// [-1, 1] by the caller. `sigma_abs` is per-tick sigma in price units.
    /// `transition_caution` widens both sides during a fresh regime change.
    pub fn multipliers(
        &self,
        cfg: &RiskConfig,
        mid: f64,
        sigma_abs: f64,
        inventory_ratio: f64,
        transition_caution: bool,
    ) -> SideMultipliers {
        let displacement = self.displacement_mult(cfg, mid, sigma_abs);
        let caution = if transition_caution { 1.25 } else { 1.0 };
        let (skew_bid, skew_ask) = self.skew_mults(cfg, inventory_ratio);
        let (imb_bid, imb_ask) = self.imbalance_mults(cfg);

        let clamp = |m: f64| m.clamp(cfg.min_overlay, cfg.max_overlay);
        SideMultipliers {
            bid: clamp(displacement * caution * skew_bid * imb_bid),
            ask: clamp(displacement * caution * skew_ask * imb_ask),
        }
    }

    /// Symmetric widening when mid is displaced from its anchor. Grows
    /// linearly in sigmas past the threshold, capped by the overlay bound.
    fn displacement_mult(&self, cfg: &RiskConfig, mid: f64, sigma_abs: f64) -> f64 {
        let anchor = match self.anchor {
            Some(a) => a,
            None => return 1.0,
        };
        if sigma_abs <= 0.0 {
            return 1.0;
        }
        let sigmas = (mid - anchor).abs() / sigma_abs;
        if sigmas <= cfg.displacement_sigmas {
            1.0
        } else {
            1.0 + 0.5 * (sigmas - cfg.displacement_sigmas)
        }
    }

    /// Inventory skew: long inventory widens the bid (discourages buying)
    /// and tightens the ask (encourages selling); short is the mirror.
    fn skew_mults(&self, cfg: &RiskConfig, inventory_ratio: f64) -> (f64, f64) {
        let skew = cfg.skew_factor * inventory_ratio.clamp(-1.0, 1.0);
        (1.0 + skew, 1.0 - skew)
    }

    /// One-sided widening when recent fills are lopsided. A run of bid
    /// fills means the market is leaning on our bid, so back it off.
    fn imbalance_mults(&self, cfg: &RiskConfig) -> (f64, f64) {
        if self.recent_fills.len() < cfg.imbalance_window {
            return (1.0, 1.0);
        }
        let buys = self
            .recent_fills
            .iter()
            .rev()
            .take(cfg.imbalance_window)
            .filter(|s| **s == OrderSide::Buy)
            .count() as f64;
        let total = cfg.imbalance_window as f64;
        let imbalance = (2.0 * buys - total) / total;
        if imbalance.abs() <= cfg.imbalance_threshold {
            return (1.0, 1.0);
        }
        let excess = imbalance.abs() - cfg.imbalance_threshold;
        let widen = 1.0 + excess;
        if imbalance > 0.0 {
            // bids keep filling: the flow is selling into us
            (widen, 1.0)
        } else {
            (1.0, widen)
        }
    }
}

impl Default for SpreadOverlays {
    fn default() -> Self {
        Self::new()
    }
}
