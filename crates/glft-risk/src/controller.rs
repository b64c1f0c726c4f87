use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use glft_core::decimal::{Price, Size};
use glft_core::market::MarketState;
use glft_core::order::{OrderSide, Quote};
use glft_core::trade::ExitReason;
use glft_ledger::position::Position;
use glft_model::regime::RegimeSignal;

use crate::config::RiskConfig;
use crate::liquidation::LiquidationMonitor;
use crate::overlays::SpreadOverlays;
use crate::RiskResult;

/// Risk state machine phase.
///
/// Transitions are driven purely by observed position size and
/// liquidation distance, re-evaluated every tick:
/// Normal -> SoftLimitBreach -> HardLimitBreach, and Liquidating whenever
/// the liquidation buffer is breached. All phases recover to Normal once
/// the driving condition clears; nothing latches permanently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskPhase {
    Normal,
    SoftLimitBreach,
    HardLimitBreach,
    Liquidating,
}

impl RiskPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::SoftLimitBreach => "soft_limit_breach",
            Self::HardLimitBreach => "hard_limit_breach",
            Self::Liquidating => "liquidating",
        }
    }

    /// Whether exposure-increasing orders are allowed in this phase.
    pub fn allows_increase(&self) -> bool {
        matches!(self, Self::Normal | Self::SoftLimitBreach)
    }
}

/// One side of a risk-adjusted quote, ready for placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SideQuote {
    pub price: Price,
    pub size: Size,
}

/// Out-of-cycle reduction the orchestrator must execute before quoting.
#[derive(Debug, Clone, PartialEq)]
pub struct ForcedOrder {
    pub side: OrderSide,
    pub quantity: Size,
    pub reason: ExitReason,
}

/// Result of one risk evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskDecision {
    pub bid: Option<SideQuote>,
    pub ask: Option<SideQuote>,
    pub forced: Vec<ForcedOrder>,
    pub phase: RiskPhase,
}

/// Applies inventory limits, stops, liquidation protection and spread
/// overlays to the model's raw quote.
#[derive(Debug)]
pub struct RiskController {
    config: RiskConfig,
    phase: RiskPhase,
    overlays: SpreadOverlays,
    liquidation: LiquidationMonitor,
}

impl RiskController {
    pub fn new(config: RiskConfig) -> RiskResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            phase: RiskPhase::Normal,
            overlays: SpreadOverlays::new(),
            liquidation: LiquidationMonitor::new(),
        })
    }

    pub fn phase(&self) -> RiskPhase {
        self.phase
    }

    /// Feed a fill on our quotes into the imbalance overlay.
    pub fn on_fill(&mut self, side: OrderSide) {
        self.overlays.on_fill(side);
    }

    /// Evaluate the position against all risk rules and shape the quote.
    ///
    /// `adverse_low`/`adverse_high` are the worst prices traded against us
    /// since the last evaluation: candle low/high in simulation, current
    /// bid/ask live. The protective stop triggers off these, not off mid,
    /// so an intra-candle spike through the stop is not missed.
    pub fn evaluate(
        &mut self,
        quote: &Quote,
        position: &Position,
        market: &MarketState,
        signal: &RegimeSignal,
        adverse_low: Price,
        adverse_high: Price,
        now: DateTime<Utc>,
    ) -> RiskDecision {
        let mid_f = market.mid.to_f64();
        self.overlays.on_tick(mid_f);

        // Protective stop first: it overrides everything else this tick.
        if let Some(forced) = self.stop_order(position, adverse_low, adverse_high) {
            return self.decide(None, None, vec![forced]);
        }

        let liq = self
            .liquidation
            .check(&self.config, position, market.mid, now);

        let abs_q = position.abs_quantity();
        let next_phase = if liq.breached {
            RiskPhase::Liquidating
        } else if abs_q >= self.config.hard_limit {
            RiskPhase::HardLimitBreach
        } else if abs_q >= self.config.soft_limit {
            RiskPhase::SoftLimitBreach
        } else {
            RiskPhase::Normal
        };
        self.transition(next_phase);

        let mut forced = Vec::new();
        if liq.emergency {
            let qty = abs_q * self.config.emergency_reduce_fraction;
            if qty > Decimal::ZERO {
                forced.push(ForcedOrder {
                    side: reducing_side(position),
                    quantity: Size::new(qty),
                    reason: ExitReason::Liquidation,
                });
            }
        }

        if quote.size.is_zero() || !quote.is_valid() {
            return self.decide(None, None, forced);
        }

        let (bid, ask) = self.shape_quote(quote, position, market, signal);
        self.decide(bid, ask, forced)
    }

    /// Force a full close when the adverse extreme crossed the stop price.
    fn stop_order(
        &self,
        position: &Position,
        adverse_low: Price,
        adverse_high: Price,
    ) -> Option<ForcedOrder> {
        if position.is_flat() {
            return None;
        }
        let entry = position.avg_entry.inner();
        let stop_frac = Decimal::from_f64_retain(self.config.stop_loss_pct)?;
        let breached = if position.is_long() {
            adverse_low.inner() <= entry * (Decimal::ONE - stop_frac)
        } else {
            adverse_high.inner() >= entry * (Decimal::ONE + stop_frac)
        };
        if !breached {
            return None;
        }
        warn!(
            quantity = %position.quantity,
            entry = %position.avg_entry,
            "protective stop triggered"
        );
        Some(ForcedOrder {
            side: reducing_side(position),
            quantity: Size::new(position.abs_quantity()),
            reason: ExitReason::StopLoss,
        })
    }

    /// Apply overlays and phase gating to the raw quote.
    fn shape_quote(
        &self,
        quote: &Quote,
        position: &Position,
        market: &MarketState,
        signal: &RegimeSignal,
    ) -> (Option<SideQuote>, Option<SideQuote>) {
        let mid_f = market.mid.to_f64();
        let sigma_abs = market.sigma * mid_f;
        let ratio = decimal_ratio(position.quantity, self.config.soft_limit);
        let caution = signal.age < self.config.transition_caution_ticks;

        let mults = self
            .overlays
            .multipliers(&self.config, mid_f, sigma_abs, ratio, caution);

        let r = quote.reservation_price;
        let h = quote.half_spread.inner();
        let bid_offset = h * decimal_mult(mults.bid);
        let ask_offset = h * decimal_mult(mults.ask);
        let bid_price = Price::new(r.inner() - bid_offset);
        let ask_price = Price::new(r.inner() + ask_offset);

        let reduce_size = Size::new(quote.size.inner().min(position.abs_quantity()));
        let (bid, ask) = match (self.phase, position.is_long()) {
            // only the reducing side, capped so it cannot flip us
            (RiskPhase::HardLimitBreach | RiskPhase::Liquidating, true) => {
                (None, Some((ask_price, reduce_size)))
            }
            (RiskPhase::HardLimitBreach | RiskPhase::Liquidating, false) => {
                (Some((bid_price, reduce_size)), None)
            }
            _ => (
                Some((bid_price, quote.size)),
                Some((ask_price, quote.size)),
            ),
        };

        let into_quote = |side: Option<(Price, Size)>| {
            side.filter(|(price, size)| price.is_positive() && size.is_positive())
                .map(|(price, size)| SideQuote { price, size })
        };
        (into_quote(bid), into_quote(ask))
    }

    fn transition(&mut self, next: RiskPhase) {
        if next != self.phase {
            info!(
                from = self.phase.as_str(),
                to = next.as_str(),
                "risk phase transition"
            );
            self.phase = next;
        }
    }

    fn decide(
        &self,
        bid: Option<SideQuote>,
        ask: Option<SideQuote>,
        forced: Vec<ForcedOrder>,
    ) -> RiskDecision {
        RiskDecision {
            bid,
            ask,
            forced,
            phase: self.phase,
        }
    }
}

fn reducing_side(position: &Position) -> OrderSide {
    if position.is_long() {
        OrderSide::Sell
    } else {
        OrderSide::Buy
    }
}

fn decimal_ratio(quantity: Decimal, limit: Decimal) -> f64 {
    use rust_decimal::prelude::ToPrimitive;
    let q = quantity.to_f64().unwrap_or(0.0);
    let l = limit.to_f64().unwrap_or(1.0);
    if l <= 0.0 {
        0.0
    } else {
        (q / l).clamp(-1.0, 1.0)
    }
}

fn decimal_mult(mult: f64) -> Decimal {
    Decimal::from_f64_retain(mult).unwrap_or(Decimal::ONE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use glft_core::market::Regime;
    use rust_decimal_macros::dec;

    fn cfg() -> RiskConfig {
        RiskConfig::default()
    }

    fn market(mid: Decimal) -> MarketState {
        MarketState {
            mid: Price::new(mid),
            sigma: 0.0002,
            regime: Regime::Ranging,
            kappa: 1.5,
            timestamp: now(),
        }
    }

    fn signal() -> RegimeSignal {
        RegimeSignal {
            regime: Regime::Ranging,
            adx: 12.0,
            confidence: 0.8,
            age: 100,
        }
    }

    fn quote(mid: Decimal, half: Decimal, size: Decimal) -> Quote {
        Quote {
            bid: Price::new(mid - half),
            ask: Price::new(mid + half),
            size: Size::new(size),
            reservation_price: Price::new(mid),
            half_spread: Price::new(half),
        }
    }

    fn position(qty: Decimal, entry: Decimal) -> Position {
        Position {
            quantity: qty,
            avg_entry: Price::new(entry),
            opened_at: None,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn evaluate_simple(
        ctl: &mut RiskController,
        q: &Quote,
        pos: &Position,
        mid: Decimal,
    ) -> RiskDecision {
        let m = market(mid);
        ctl.evaluate(q, pos, &m, &signal(), m.mid, m.mid, now())
    }

    #[test]
    fn invalid_config_rejected() {
        let cfg = RiskConfig {
            hard_limit: dec!(1),
            soft_limit: dec!(2),
            ..RiskConfig::default()
        };
        assert!(RiskController::new(cfg).is_err());
    }

    #[test]
    fn flat_normal_passes_quote_through() {
        let mut ctl = RiskController::new(cfg()).unwrap();
        let q = quote(dec!(100), dec!(0.5), dec!(1));
        let d = evaluate_simple(&mut ctl, &q, &Position::default(), dec!(100));
        assert_eq!(d.phase, RiskPhase::Normal);
        assert!(d.forced.is_empty());
        let bid = d.bid.unwrap();
        let ask = d.ask.unwrap();
        assert_eq!(bid.price, Price::new(dec!(99.5)));
        assert_eq!(ask.price, Price::new(dec!(100.5)));
        assert_eq!(bid.size, Size::new(dec!(1)));
    }

    #[test]
    fn soft_breach_skews_toward_reduction() {
        // long 3 against soft limit 3: the ask must sit closer to the
        // reservation price than the bid does
        let mut ctl = RiskController::new(cfg()).unwrap();
        let q = quote(dec!(100), dec!(0.5), dec!(1));
        let pos = position(dec!(3), dec!(100));
        let d = evaluate_simple(&mut ctl, &q, &pos, dec!(100));
        assert_eq!(d.phase, RiskPhase::SoftLimitBreach);
        let bid = d.bid.unwrap();
        let ask = d.ask.unwrap();
        let r = dec!(100);
        let bid_offset = r - bid.price.inner();
        let ask_offset = ask.price.inner() - r;
        assert!(ask_offset < bid_offset, "ask should be tighter than bid");
    }

    #[test]
    fn hard_breach_quotes_reducing_side_only() {
        let mut ctl = RiskController::new(cfg()).unwrap();
        let q = quote(dec!(100), dec!(0.5), dec!(1));
        let pos = position(dec!(5), dec!(100));
        let d = evaluate_simple(&mut ctl, &q, &pos, dec!(100));
        assert_eq!(d.phase, RiskPhase::HardLimitBreach);
        assert!(d.bid.is_none());
        assert!(d.ask.is_some());
    }

    #[test]
    fn hard_breach_short_quotes_bid_only() {
        let mut ctl = RiskController::new(cfg()).unwrap();
        let q = quote(dec!(100), dec!(0.5), dec!(1));
        let pos = position(dec!(-5), dec!(100));
        let d = evaluate_simple(&mut ctl, &q, &pos, dec!(100));
        assert_eq!(d.phase, RiskPhase::HardLimitBreach);
        assert!(d.bid.is_some());
        assert!(d.ask.is_none());
    }

    #[test]
    fn stop_loss_forces_full_close() {
        let mut ctl = RiskController::new(cfg()).unwrap();
        let q = quote(dec!(49000), dec!(5), dec!(1));
        let pos = position(dec!(1), dec!(50000));
        let m = market(dec!(48950));
        // candle low pierced the 2% stop at 49000
        let d = ctl.evaluate(
            &q,
            &pos,
            &m,
            &signal(),
            Price::new(dec!(48900)),
            Price::new(dec!(49100)),
            now(),
        );
        assert!(d.bid.is_none() && d.ask.is_none());
        assert_eq!(d.forced.len(), 1);
        let f = &d.forced[0];
        assert_eq!(f.side, OrderSide::Sell);
        assert_eq!(f.quantity, Size::new(dec!(1)));
        assert_eq!(f.reason, ExitReason::StopLoss);
    }

    #[test]
    fn short_stop_triggers_on_high() {
        let mut ctl = RiskController::new(cfg()).unwrap();
        let q = quote(dec!(102), dec!(0.5), dec!(1));
        let pos = position(dec!(-2), dec!(100));
        let m = market(dec!(101.9));
        let d = ctl.evaluate(
            &q,
            &pos,
            &m,
            &signal(),
            Price::new(dec!(101.5)),
            Price::new(dec!(102.1)),
            now(),
        );
        assert_eq!(d.forced.len(), 1);
        assert_eq!(d.forced[0].side, OrderSide::Buy);
        assert_eq!(d.forced[0].quantity, Size::new(dec!(2)));
    }

    #[test]
    fn liquidation_breach_forces_partial_reduction() {
        // wide stop so the liquidation path is what fires
        let cfg = RiskConfig {
            leverage: 10.0,
            stop_loss_pct: 0.15,
            ..RiskConfig::default()
        };
        let mut ctl = RiskController::new(cfg).unwrap();
        let q = quote(dec!(89), dec!(0.5), dec!(1));
        // 10x long from 94 liquidates near 85.1; mark 89 leaves ~4.4%
        // distance, inside the 5% buffer
        let pos = position(dec!(4), dec!(94));
        let d = evaluate_simple(&mut ctl, &q, &pos, dec!(89));
        assert_eq!(d.phase, RiskPhase::Liquidating);
        assert_eq!(d.forced.len(), 1);
        assert_eq!(d.forced[0].reason, ExitReason::Liquidation);
        assert_eq!(d.forced[0].side, OrderSide::Sell);
        assert_eq!(d.forced[0].quantity, Size::new(dec!(2)));
        // only the reducing side stays quoted
        assert!(d.bid.is_none());
        assert!(d.ask.is_some());
    }

    #[test]
    fn phases_recover_to_normal() {
        let mut ctl = RiskController::new(cfg()).unwrap();
        let q = quote(dec!(100), dec!(0.5), dec!(1));
        evaluate_simple(&mut ctl, &q, &position(dec!(5), dec!(100)), dec!(100));
        assert_eq!(ctl.phase(), RiskPhase::HardLimitBreach);
        evaluate_simple(&mut ctl, &q, &position(dec!(1), dec!(100)), dec!(100));
        assert_eq!(ctl.phase(), RiskPhase::Normal);
    }

    #[test]
    fn zero_size_quote_suppresses_both_sides() {
        let mut ctl = RiskController::new(cfg()).unwrap();
        let q = quote(dec!(100), dec!(0.5), dec!(0));
        let d = evaluate_simple(&mut ctl, &q, &Position::default(), dec!(100));
        assert!(d.bid.is_none() && d.ask.is_none());
    }

    #[test]
    fn reduce_side_capped_at_position() {
        let mut ctl = RiskController::new(cfg()).unwrap();
        let q = quote(dec!(100), dec!(0.5), dec!(10));
        let pos = position(dec!(5), dec!(100));
        let d = evaluate_simple(&mut ctl, &q, &pos, dec!(100));
        assert_eq!(d.ask.unwrap().size, Size::new(dec!(5)));
    }
}
