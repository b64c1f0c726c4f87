use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::trace;

use glft_core::decimal::Price;
use glft_core::market::Candle;
use glft_core::order::{Order, OrderId, OrderSide};

use crate::config::FillConfig;
use crate::error::FillResult;
use crate::{Execution, FillEngine};

/// Matches resting orders against OHLC candles.
///
/// Each candle is replayed as a piecewise price path: bullish candles walk
/// open -> low -> high -> close, bearish candles open -> high -> low ->
/// close; a doji picks a direction from the seeded RNG. An order fills
/// only where the path actually crosses through its limit by at least the
/// configured penetration, in path order. Both sides of a quote can fill
/// in one candle only if the path genuinely reaches the second level after
/// the first fill; a candle whose range merely covers both levels does not
/// guarantee that.
///
/// Fill probability grows with penetration depth: p = 1 - exp(-a*d/s)
/// where `a` is aggressiveness and `s` the probability scale. A bare touch
/// (zero depth) never fills; queue position is assumed to eat it.
#[derive(Debug)]
pub struct CandleFillEngine {
    config: FillConfig,
    rng: StdRng,
}

impl CandleFillEngine {
    pub fn new(config: FillConfig) -> FillResult<Self> {
        config.validate()?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self { config, rng })
    }

    /// Price the order's limit must be traded through before it can fill.
    fn trigger(&self, order: &Order) -> Decimal {
        match order.side {
            OrderSide::Buy => order.price.inner() - self.config.min_penetration,
            OrderSide::Sell => order.price.inner() + self.config.min_penetration,
        }
    }

    /// Execution price after adverse-only slippage. Buys never improve
    /// below the limit, sells never above it.
    fn exec_price(&self, order: &Order) -> Price {
        match order.side {
            OrderSide::Buy => Price::new(order.price.inner() + self.config.slippage),
            OrderSide::Sell => Price::new(order.price.inner() - self.config.slippage),
        }
    }

    /// One probability draw for a crossing that penetrated `depth` past
    /// the trigger. Zero depth never fills.
    fn draw_fill(&mut self, depth: Decimal) -> bool {
        if depth <= Decimal::ZERO {
            return false;
        }
        let depth = depth.to_f64().unwrap_or(0.0);
        let scale = self.config.probability_scale.to_f64().unwrap_or(1.0);
        let p = 1.0 - (-self.config.aggressiveness * depth / scale).exp();
        self.rng.gen::<f64>() < p
    }

    /// The intra-candle path as turning points, open first.
    fn path(&mut self, candle: &Candle) -> [Decimal; 4] {
        let (o, h, l, c) = (
            candle.open.inner(),
            candle.high.inner(),
            candle.low.inner(),
            candle.close.inner(),
        );
        let low_first = if c > o {
            true
        } else if c < o {
            false
        } else {
            self.rng.gen_bool(0.5)
        };
        if low_first {
            [o, l, h, c]
        } else {
            [o, h, l, c]
        }
    }
}

impl FillEngine for CandleFillEngine {
    type MarketData = Candle;

    fn match_orders(&mut self, orders: &[Order], candle: &Candle) -> Vec<Execution> {
        let path = self.path(candle);
        let mut filled: Vec<OrderId> = Vec::new();
        let mut executions = Vec::new();

        let fill = |engine: &mut Self,
                        order: &Order,
                        depth: Decimal,
                        filled: &mut Vec<OrderId>,
                        executions: &mut Vec<Execution>| {
            if engine.draw_fill(depth) {
                filled.push(order.id);
                trace!(order_id = order.id, side = %order.side, depth = %depth, "candle fill");
                executions.push(Execution {
                    order_id: order.id,
                    side: order.side,
                    price: engine.exec_price(order),
                    quantity: order.remaining,
                });
            }
        };

        // Candle opened through a limit: the order fills at its limit
        // price, never at the better open (no phantom improvement).
        for order in orders.iter().filter(|o| o.is_active()) {
            let trigger = self.trigger(order);
            let gapped = match order.side {
                OrderSide::Buy => candle.open.inner() <= trigger,
                OrderSide::Sell => candle.open.inner() >= trigger,
            };
            if gapped {
                let depth = match order.side {
                    OrderSide::Buy => trigger - candle.low.inner(),
                    OrderSide::Sell => candle.high.inner() - trigger,
                };
                fill(self, order, depth, &mut filled, &mut executions);
            }
        }

        // Walk the path segment by segment; within a segment, levels are
        // attempted in the order the price sweep reaches them.
        for seg in path.windows(2) {
            let (from, to) = (seg[0], seg[1]);
            let downward = to < from;
            let mut hits: Vec<&Order> = orders
                .iter()
                .filter(|o| o.is_active() && !filled.contains(&o.id))
                .filter(|o| {
                    let trigger = self.trigger(o);
                    match o.side {
                        OrderSide::Buy => downward && to <= trigger && trigger < from,
                        OrderSide::Sell => !downward && from < trigger && trigger <= to,
                    }
                })
                .collect();
            hits.sort_by_key(|o| {
                let trigger = self.trigger(o);
                (from - trigger).abs()
            });
            for order in hits {
                let trigger = self.trigger(order);
                let depth = if downward { trigger - to } else { to - trigger };
                fill(self, order, depth, &mut filled, &mut executions);
            }
        }

        executions
    }
}
