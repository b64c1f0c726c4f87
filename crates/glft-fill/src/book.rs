use glft_core::market::Ticker;
use glft_core::order::{Order, OrderSide};
use tracing::trace;

use crate::{Execution, FillEngine};

/// Matches resting orders against live best bid/ask.
///
/// A resting buy fills when the best ask crosses down to its limit, a
/// resting sell when the best bid crosses up. The trigger is always the
/// touch, never the last-trade print, and the execution price is the
/// order's resting limit, never the newly observed market price: a crossed
/// quote does not grant retroactive price improvement.
#[derive(Debug, Default)]
pub struct BookFillEngine;

impl BookFillEngine {
    pub fn new() -> Self {
        Self
    }
}

impl FillEngine for BookFillEngine {
    type MarketData = Ticker;

    fn match_orders(&mut self, orders: &[Order], ticker: &Ticker) -> Vec<Execution> {
        orders
            .iter()
            .filter(|o| o.is_active())
            .filter(|o| match o.side {
                OrderSide::Buy => ticker.ask.is_positive() && ticker.ask <= o.price,
                OrderSide::Sell => ticker.bid.is_positive() && ticker.bid >= o.price,
            })
            .map(|o| {
                trace!(order_id = o.id, side = %o.side, limit = %o.price, "book fill");
                Execution {
                    order_id: o.id,
                    side: o.side,
                    price: o.price,
                    quantity: o.remaining,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use glft_core::decimal::{Price, Size};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn ticker(bid: Decimal, ask: Decimal, last: Decimal) -> Ticker {
        Ticker {
            bid: Price::new(bid),
            ask: Price::new(ask),
            last: Price::new(last),
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        }
    }

    fn order(id: u64, side: OrderSide, price: Decimal) -> Order {
        Order::new(id, side, Price::new(price), Size::new(dec!(1)))
    }

    #[test]
    fn buy_fills_when_ask_crosses_down() {
        let mut eng = BookFillEngine::new();
        let orders = vec![order(1, OrderSide::Buy, dec!(99))];
        assert!(eng
            .match_orders(&orders, &ticker(dec!(99.5), dec!(100), dec!(99.7)))
            .is_empty());
        let execs = eng.match_orders(&orders, &ticker(dec!(98.5), dec!(98.9), dec!(98.7)));
        assert_eq!(execs.len(), 1);
        // fills at the resting limit, not at the crossed ask
        assert_eq!(execs[0].price, Price::new(dec!(99)));
    }

    #[test]
    fn sell_fills_when_bid_crosses_up() {
        let mut eng = BookFillEngine::new();
        let orders = vec![order(1, OrderSide::Sell, dec!(101))];
        let execs = eng.match_orders(&orders, &ticker(dec!(101.2), dec!(101.5), dec!(101.3)));
        assert_eq!(execs.len(), 1);
        assert_eq!(execs[0].price, Price::new(dec!(101)));
    }

    #[test]
    fn last_trade_price_does_not_trigger() {
        let mut eng = BookFillEngine::new();
        let orders = vec![order(1, OrderSide::Buy, dec!(99))];
        // a stale last print below the limit while the book sits higher
        let execs = eng.match_orders(&orders, &ticker(dec!(99.5), dec!(100), dec!(98.5)));
        assert!(execs.is_empty());
    }
}
