//! In-memory simulated venue.
//!
//! Matches resting orders with the same [`BookFillEngine`] semantics a
//! real venue would exhibit: a buy fills when the pushed ticker's ask
//! crosses its limit, at the limit price. Shared by paper trading and the
//! loop's tests so both paths exercise identical behavior.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;

use glft_core::decimal::{Price, Size};
use glft_core::market::{Candle, Ticker};
use glft_core::order::{Order, OrderId, OrderSide};
use glft_core::trade::Fill;
use glft_fill::{BookFillEngine, FillEngine};
use glft_model::DepthSample;

use crate::error::{LiveError, LiveResult};
use crate::venue::{BoxFuture, MarketDataSource, OrderExecutionClient, PlaceOutcome};

#[derive(Debug)]
struct PaperState {
    ticker: Option<Ticker>,
    orders: Vec<Order>,
    fills: Vec<Fill>,
    position: Decimal,
    next_order_id: OrderId,
    fill_seq: u64,
    engine: BookFillEngine,
    /// When set, the next placement is rejected with this reason.
    reject_next: Option<String>,
    /// Simulates a dead data feed.
    feed_down: bool,
}

/// Simulated venue backed by an in-memory order list.
#[derive(Debug)]
pub struct PaperVenue {
    maker_fee: Decimal,
    state: Mutex<PaperState>,
}

impl PaperVenue {
    pub fn new(maker_fee: Decimal) -> Self {
        Self {
            maker_fee,
            state: Mutex::new(PaperState {
                ticker: None,
                orders: Vec::new(),
                fills: Vec::new(),
                position: Decimal::ZERO,
                next_order_id: 1,
                fill_seq: 0,
                engine: BookFillEngine::new(),
                reject_next: None,
                feed_down: false,
            }),
        }
    }

    /// Advance the simulated market: store the ticker and match resting
    /// orders against it.
    pub fn push_ticker(&self, ticker: Ticker) {
        let mut state = self.state.lock();
        let snapshot = state.orders.clone();
        let executions = state.engine.match_orders(&snapshot, &ticker);
        for exec in executions {
            let Some(order) = state.orders.iter_mut().find(|o| o.id == exec.order_id) else {
                continue;
            };
            let consumed = order.consume(exec.quantity);
            if !consumed.is_positive() {
                continue;
            }
            state.fill_seq += 1;
            let fee = consumed.notional(exec.price) * self.maker_fee;
            let signed = match exec.side {
                OrderSide::Buy => consumed.inner(),
                OrderSide::Sell => -consumed.inner(),
            };
            state.position += signed;
            let id = format!("paper_{}", state.fill_seq);
            state.fills.push(Fill {
                id,
                order_id: exec.order_id,
                side: exec.side,
                price: exec.price,
                quantity: consumed,
                fee,
                timestamp: ticker.timestamp,
            });
        }
        state.orders.retain(|o| o.is_active());
        state.ticker = Some(ticker);
    }

    /// Make the next `place_order` call fail, for rejection-path tests.
    pub fn reject_next_order(&self, reason: &str) {
        self.state.lock().reject_next = Some(reason.to_string());
    }

    pub fn set_feed_down(&self, down: bool) {
        self.state.lock().feed_down = down;
    }

    /// Corrupt the venue position, for reconciliation tests.
    pub fn set_position(&self, position: Decimal) {
        self.state.lock().position = position;
    }

    pub fn open_orders(&self) -> Vec<Order> {
        self.state.lock().orders.clone()
    }
}

impl MarketDataSource for PaperVenue {
    fn get_ticker(&self) -> BoxFuture<'_, LiveResult<Ticker>> {
        Box::pin(async move {
            let state = self.state.lock();
            if state.feed_down {
                return Err(LiveError::MarketDataUnavailable("feed down".into()));
            }
            state
                .ticker
                .ok_or_else(|| LiveError::MarketDataUnavailable("no ticker yet".into()))
        })
    }

    fn get_ohlcv(&self, _limit: usize) -> BoxFuture<'_, LiveResult<Vec<Candle>>> {
        Box::pin(async move { Ok(Vec::new()) })
    }

    /// No real book exists; synthesize one off the current quote, with
    /// liquidity halving at each spread-width step away from the touch.
    fn get_depth(&self) -> BoxFuture<'_, LiveResult<Vec<DepthSample>>> {
        Box::pin(async move {
            let state = self.state.lock();
            if state.feed_down {
                return Err(LiveError::MarketDataUnavailable("feed down".into()));
            }
            let Some(ticker) = state.ticker else {
                return Ok(Vec::new());
            };
            let spread = (ticker.ask - ticker.bid).to_f64();
            let step = if spread > 0.0 { spread } else { 0.01 };
            Ok((1..=8)
                .map(|i| DepthSample {
                    distance: step * i as f64,
                    cumulative_size: 100.0 * 0.5_f64.powi(i),
                })
                .collect())
        })
    }
}

impl OrderExecutionClient for PaperVenue {
    fn place_order(
        &self,
        side: OrderSide,
        price: Price,
        quantity: Size,
        _post_only: bool,
    ) -> BoxFuture<'_, LiveResult<PlaceOutcome>> {
        Box::pin(async move {
            let mut state = self.state.lock();
            if let Some(reason) = state.reject_next.take() {
                return Ok(PlaceOutcome::Rejected(reason));
            }
            let id = state.next_order_id;
            state.next_order_id += 1;
            state.orders.push(Order::new(id, side, price, quantity));
            Ok(PlaceOutcome::Placed(id))
        })
    }

    fn cancel(&self, order_id: OrderId) -> BoxFuture<'_, LiveResult<()>> {
        Box::pin(async move {
            self.state.lock().orders.retain(|o| o.id != order_id);
            Ok(())
        })
    }

    fn get_fills(&self, since: DateTime<Utc>) -> BoxFuture<'_, LiveResult<Vec<Fill>>> {
        Box::pin(async move {
            Ok(self
                .state
                .lock()
                .fills
                .iter()
                .filter(|f| f.timestamp >= since)
                .cloned()
                .collect())
        })
    }

    fn get_position(&self) -> BoxFuture<'_, LiveResult<Decimal>> {
        Box::pin(async move { Ok(self.state.lock().position) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn ticker(bid: Decimal, ask: Decimal, secs: i64) -> Ticker {
        Ticker {
            bid: Price::new(bid),
            ask: Price::new(ask),
            last: Price::new((bid + ask) / dec!(2)),
            timestamp: Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn resting_buy_fills_when_ask_crosses() {
        let venue = PaperVenue::new(dec!(0.0002));
        venue.push_ticker(ticker(dec!(99.5), dec!(100), 0));
        let outcome = venue
            .place_order(
                OrderSide::Buy,
                Price::new(dec!(99)),
                Size::new(dec!(1)),
                true,
            )
            .await
            .unwrap();
        assert!(matches!(outcome, PlaceOutcome::Placed(_)));

        venue.push_ticker(ticker(dec!(98.5), dec!(98.9), 1));
        let fills = venue
            .get_fills(Utc.timestamp_opt(1_700_000_000, 0).unwrap())
            .await
            .unwrap();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].price, Price::new(dec!(99)));
        assert_eq!(venue.get_position().await.unwrap(), dec!(1));
        assert!(venue.open_orders().is_empty());
    }

    #[tokio::test]
    async fn synthesized_depth_decays_away_from_touch() {
        let venue = PaperVenue::new(dec!(0));
        assert!(venue.get_depth().await.unwrap().is_empty());

        venue.push_ticker(ticker(dec!(99.9), dec!(100.1), 0));
        let levels = venue.get_depth().await.unwrap();
        assert!(!levels.is_empty());
        assert!(levels.windows(2).all(|w| {
            w[0].distance < w[1].distance && w[0].cumulative_size > w[1].cumulative_size
        }));
    }

    #[tokio::test]
    async fn cancel_removes_resting_order() {
        let venue = PaperVenue::new(dec!(0));
        let PlaceOutcome::Placed(id) = venue
            .place_order(
                OrderSide::Sell,
                Price::new(dec!(101)),
                Size::new(dec!(1)),
                true,
            )
            .await
            .unwrap()
        else {
            panic!("placement should succeed");
        };
        venue.cancel(id).await.unwrap();
        assert!(venue.open_orders().is_empty());
    }

    #[tokio::test]
    async fn fill_poll_overlap_returns_duplicates() {
        let venue = PaperVenue::new(dec!(0));
        venue
            .place_order(
                OrderSide::Buy,
                Price::new(dec!(99)),
                Size::new(dec!(1)),
                true,
            )
            .await
            .unwrap();
        venue.push_ticker(ticker(dec!(98), dec!(98.5), 1));

        let since = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let first = venue.get_fills(since).await.unwrap();
        let second = venue.get_fills(since).await.unwrap();
        // downstream idempotent application is what dedups, not the venue
        assert_eq!(first, second);
        assert_eq!(first.len(), 1);
    }
}
