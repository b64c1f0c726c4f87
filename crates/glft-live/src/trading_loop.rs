//! The poll-driven trading loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use glft_core::decimal::Size;
use glft_core::market::{MarketState, Ticker};
use glft_core::order::{Order, OrderSide};
use glft_core::trade::{EquityPoint, ExitReason};
use glft_ledger::InventoryLedger;
use glft_model::{
    KappaEstimator, ModelConfig, QuoteModel, RegimeConfig, RegimeDetector, VolEstimator,
};
use glft_risk::{ForcedOrder, RiskConfig, RiskController, RiskPhase, SideQuote};

use crate::config::LiveConfig;
use crate::error::{LiveError, LiveResult};
use crate::venue::{BoxFuture, MarketDataSource, OrderExecutionClient};

/// Depth snapshots retained by the kappa estimator.
const KAPPA_MAX_SAMPLES: usize = 240;
const KAPPA_MIN_SAMPLES: usize = 30;

/// One strategy instance against one venue.
///
/// Owns its ledger and risk state exclusively; all venue I/O is bounded
/// by the configured timeout, and order placement never overlaps
/// reconciliation because the loop is a single task.
pub struct LiveTradingLoop {
    config: LiveConfig,
    model: QuoteModel,
    detector: RegimeDetector,
    vol: VolEstimator,
    kappa: KappaEstimator,
    risk: RiskController,
    ledger: InventoryLedger,
    market: Arc<dyn MarketDataSource>,
    client: Arc<dyn OrderExecutionClient>,
    bid: Option<Order>,
    ask: Option<Order>,
    /// The one forced reduction allowed to rest at a time. The breach
    /// re-fires every tick; without this slot each re-fire would stack
    /// another full-size order and the fills would carry the position
    /// through flat.
    forced: Option<Order>,
    /// Exit reasons for in-flight forced reductions, keyed by order id.
    forced_reasons: HashMap<u64, ExitReason>,
    halted: bool,
    ticks: u64,
    last_fill_since: DateTime<Utc>,
    equity: Vec<EquityPoint>,
    started_at: DateTime<Utc>,
}

impl LiveTradingLoop {
    pub fn new(
        model_cfg: ModelConfig,
        regime_cfg: RegimeConfig,
        risk_cfg: RiskConfig,
        config: LiveConfig,
        market: Arc<dyn MarketDataSource>,
        client: Arc<dyn OrderExecutionClient>,
    ) -> LiveResult<Self> {
        config.validate()?;
        regime_cfg.validate()?;
        let model = QuoteModel::new(model_cfg)?;
        let vol = VolEstimator::new(model.config().vol_lookback, model.config().vol_alpha);
        Ok(Self {
            detector: RegimeDetector::new(regime_cfg),
            kappa: KappaEstimator::new(KAPPA_MAX_SAMPLES, KAPPA_MIN_SAMPLES),
            risk: RiskController::new(risk_cfg)?,
            ledger: InventoryLedger::new(config.initial_cash),
            vol,
            model,
            config,
            market,
            client,
            bid: None,
            ask: None,
            forced: None,
            forced_reasons: HashMap::new(),
            halted: false,
            ticks: 0,
            // floor, not now(): venue clocks (and replayed data) may lag ours,
            // and the ledger dedups any overlap anyway
            last_fill_since: DateTime::<Utc>::MIN_UTC,
            equity: Vec::new(),
            started_at: Utc::now(),
        })
    }

    pub fn ledger(&self) -> &InventoryLedger {
        &self.ledger
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Run until the token is cancelled. Resting orders are cancelled
    /// before this returns, on every exit path.
    pub async fn run(&mut self, shutdown: CancellationToken) -> LiveResult<()> {
        self.warmup().await;
        let mut interval = time::interval(Duration::from_millis(self.config.poll_interval_ms));
        info!(
            poll_interval_ms = self.config.poll_interval_ms,
            "starting trading loop"
        );
        let result = loop {
            tokio::select! {
                _ = shutdown.cancelled() => break Ok(()),
                _ = interval.tick() => {
                    match self.tick().await {
                        Ok(()) => {}
                        Err(e @ LiveError::Configuration(_)) => break Err(e),
                        Err(e) => warn!(error = %e, "tick failed"),
                    }
                }
            }
        };
        self.shutdown().await;
        result
    }

    /// Seed regime and volatility estimators from recent history.
    async fn warmup(&mut self) {
        let lookback = self.model.config().vol_lookback;
        match self.io(self.market.get_ohlcv(lookback)).await {
            Ok(candles) if !candles.is_empty() => {
                for candle in &candles {
                    self.detector.on_candle(candle);
                    self.vol.on_mid(candle.close);
                }
                info!(candles = candles.len(), "estimators warmed from history");
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "history warmup unavailable"),
        }
    }

    /// One full cycle: market data, fills, model, risk, orders,
    /// reconciliation.
    pub async fn tick(&mut self) -> LiveResult<()> {
        self.ticks += 1;

        let ticker = match self.io(self.market.get_ticker()).await {
            Ok(t) => t,
            Err(e @ (LiveError::MarketDataUnavailable(_) | LiveError::Timeout(_))) => {
                // transient: pause quoting, keep resting orders working
                warn!(error = %e, "no market data, skipping tick");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let Some(mid) = ticker.mid() else {
            warn!(bid = %ticker.bid, ask = %ticker.ask, "crossed or empty book, skipping tick");
            return Ok(());
        };

        // fills first: risk and sizing must see the freshest position,
        // or a reduction that already filled gets submitted again
        self.poll_fills().await?;

        match self.io(self.market.get_depth()).await {
            Ok(levels) => self.kappa.on_snapshot(&levels),
            Err(e) => debug!(error = %e, "no depth snapshot this tick"),
        }

        let signal = self.detector.on_mid(mid);
        self.vol.on_mid(mid);
        let kappa = self
            .kappa
            .kappa()
            .unwrap_or(self.model.config().kappa_seed);

        let market = MarketState {
            mid,
            sigma: self.vol.sigma(),
            regime: signal.regime,
            kappa,
            timestamp: ticker.timestamp,
        };
        let quote = self.model.quote(&market, self.ledger.position().quantity)?;
        let position = *self.ledger.position();
        let decision = self.risk.evaluate(
            &quote,
            &position,
            &market,
            &signal,
            ticker.bid,
            ticker.ask,
            ticker.timestamp,
        );

        // risk-forced reductions bypass the quoting cycle, halted or not
        if decision.forced.is_empty() && decision.phase != RiskPhase::Liquidating {
            self.clear_forced().await?;
        }
        for forced in &decision.forced {
            self.execute_forced(forced, &ticker).await?;
        }

        if self.halted {
            debug!("placement halted pending reconciliation");
        } else {
            self.sync_side(OrderSide::Buy, decision.bid).await?;
            self.sync_side(OrderSide::Sell, decision.ask).await?;
        }

        let reconcile_result = if self.ticks % self.config.reconcile_interval_ticks == 0 {
            self.reconcile().await
        } else {
            Ok(())
        };

        let active = signal.regime.allows_new_orders() || !self.ledger.position().is_flat();
        self.equity.push(EquityPoint {
            timestamp: ticker.timestamp,
            cash: self.ledger.cash(),
            equity: self.ledger.equity(mid),
            active,
        });

        reconcile_result
    }

    /// Cross the spread to reduce, at the current touch.
    ///
    /// At most one forced reduction rests at a time, sized at no more
    /// than the current |position|. A still-working reduction from a
    /// prior tick is kept while its price and size hold, replaced when
    /// the touch has moved, never added to.
    async fn execute_forced(&mut self, forced: &ForcedOrder, ticker: &Ticker) -> LiveResult<()> {
        let price = match forced.side {
            OrderSide::Buy => ticker.ask,
            OrderSide::Sell => ticker.bid,
        };
        if let Some(resting) = self.forced.take() {
            if resting.side == forced.side
                && !resting.deviates_from(price, forced.quantity, self.config.requote_tolerance)
            {
                self.forced = Some(resting);
                return Ok(());
            }
            self.io(self.client.cancel(resting.id)).await?;
            self.forced_reasons.remove(&resting.id);
        }
        let qty = forced
            .quantity
            .min(Size::new(self.ledger.position().abs_quantity()));
        if !qty.is_positive() {
            return Ok(());
        }
        info!(
            side = %forced.side,
            qty = %qty,
            reason = %forced.reason,
            "submitting forced reduction"
        );
        match self
            .io(self.client.place_order(forced.side, price, qty, false))
            .await?
            .into_result()
        {
            Ok(id) => {
                self.forced_reasons.insert(id, forced.reason);
                self.forced = Some(Order::reduce_only(id, forced.side, price, qty));
            }
            Err(e) => {
                // resubmitted next tick while the breach persists
                warn!(error = %e, "forced reduction rejected");
            }
        }
        Ok(())
    }

    /// The breach cleared before its reduction filled; take it down and
    /// forget its exit reason.
    async fn clear_forced(&mut self) -> LiveResult<()> {
        if let Some(order) = self.forced.take() {
            self.io(self.client.cancel(order.id)).await?;
            self.forced_reasons.remove(&order.id);
            debug!(order_id = order.id, "forced reduction no longer needed, cancelled");
        }
        Ok(())
    }

    /// Bring one side's resting order in line with the desired quote,
    /// with hysteresis: small drift is not worth losing queue position.
    async fn sync_side(&mut self, side: OrderSide, desired: Option<SideQuote>) -> LiveResult<()> {
        let current = match side {
            OrderSide::Buy => self.bid.take(),
            OrderSide::Sell => self.ask.take(),
        };

        let placed = match (current, desired) {
            (Some(order), Some(want))
                if !order.deviates_from(want.price, want.size, self.config.requote_tolerance) =>
            {
                Some(order)
            }
            (current, want) => {
                if let Some(order) = current {
                    self.io(self.client.cancel(order.id)).await?;
                }
                match want {
                    Some(want) => {
                        match self
                            .io(self.client.place_order(side, want.price, want.size, true))
                            .await?
                            .into_result()
                        {
                            Ok(id) => Some(Order::new(id, side, want.price, want.size)),
                            Err(e) => {
                                warn!(side = %side, error = %e, "quote rejected, retrying next tick");
                                None
                            }
                        }
                    }
                    None => None,
                }
            }
        };

        match side {
            OrderSide::Buy => self.bid = placed,
            OrderSide::Sell => self.ask = placed,
        }
        Ok(())
    }

    /// Apply venue-reported fills. Polls deliberately overlap; the ledger
    /// deduplicates by fill id.
    async fn poll_fills(&mut self) -> LiveResult<()> {
        let fills = self.io(self.client.get_fills(self.last_fill_since)).await?;
        for fill in fills {
            if self.ledger.has_fill(&fill.id) {
                continue;
            }
            let reason = self
                .forced_reasons
                .remove(&fill.order_id)
                .unwrap_or(ExitReason::Quote);
            self.ledger.apply_fill(&fill, reason)?;
            self.risk.on_fill(fill.side);
            info!(
                fill_id = %fill.id,
                side = %fill.side,
                price = %fill.price,
                qty = %fill.quantity,
                "fill applied"
            );
            for slot in [&mut self.bid, &mut self.ask, &mut self.forced] {
                if let Some(order) = slot {
                    if order.id == fill.order_id {
                        order.consume(fill.quantity);
                        if !order.is_active() {
                            *slot = None;
                        }
                    }
                }
            }
            if fill.timestamp > self.last_fill_since {
                self.last_fill_since = fill.timestamp;
            }
        }
        Ok(())
    }

    /// Compare local and exchange position. A mismatch halts placement
    /// until a later reconciliation agrees; it is never auto-corrected.
    async fn reconcile(&mut self) -> LiveResult<()> {
        let exchange = self.io(self.client.get_position()).await?;
        let local = self.ledger.position().quantity;
        if exchange != local {
            self.halted = true;
            error!(%local, %exchange, "position mismatch, halting placement");
            return Err(LiveError::ReconciliationMismatch { local, exchange });
        }
        if self.halted {
            info!("reconciliation clean, resuming placement");
            self.halted = false;
        }
        Ok(())
    }

    /// Cancel all resting orders. Runs on every exit path.
    pub async fn shutdown(&mut self) {
        for order in self
            .bid
            .take()
            .into_iter()
            .chain(self.ask.take())
            .chain(self.forced.take())
        {
            if let Err(e) = self.io(self.client.cancel(order.id)).await {
                warn!(order_id = order.id, error = %e, "cancel on shutdown failed");
            }
        }
        info!("trading loop stopped, resting orders cancelled");
    }

    /// Bound a venue call by the configured I/O timeout.
    async fn io<T>(&self, fut: BoxFuture<'_, LiveResult<T>>) -> LiveResult<T> {
        match time::timeout(Duration::from_millis(self.config.io_timeout_ms), fut).await {
            Ok(result) => result,
            Err(_) => Err(LiveError::Timeout(self.config.io_timeout_ms)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::PaperVenue;
    use glft_core::decimal::Price;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn ticker(bid: Decimal, ask: Decimal, secs: i64) -> Ticker {
        Ticker {
            bid: Price::new(bid),
            ask: Price::new(ask),
            last: Price::new((bid + ask) / dec!(2)),
            timestamp: chrono::TimeZone::timestamp_opt(&Utc, 1_700_000_000 + secs, 0).unwrap(),
        }
    }

    fn model_cfg() -> ModelConfig {
        ModelConfig {
            min_spread: 1.0,
            max_spread: 1.0,
            order_size: dec!(1),
            ..ModelConfig::default()
        }
    }

    fn build(venue: &Arc<PaperVenue>, live_cfg: LiveConfig) -> LiveTradingLoop {
        LiveTradingLoop::new(
            model_cfg(),
            RegimeConfig::default(),
            RiskConfig::default(),
            live_cfg,
            venue.clone() as Arc<dyn MarketDataSource>,
            venue.clone() as Arc<dyn OrderExecutionClient>,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn tick_places_two_sided_quote() {
        let venue = Arc::new(PaperVenue::new(dec!(0.0002)));
        venue.push_ticker(ticker(dec!(99.9), dec!(100.1), 0));
        let mut bot = build(&venue, LiveConfig::default());

        bot.tick().await.unwrap();
        let orders = venue.open_orders();
        assert_eq!(orders.len(), 2);
        assert!(orders.iter().any(|o| o.side == OrderSide::Buy));
        assert!(orders.iter().any(|o| o.side == OrderSide::Sell));
        assert_eq!(bot.equity_curve().len(), 1);
    }

    #[tokio::test]
    async fn fills_flow_into_ledger_once() {
        let venue = Arc::new(PaperVenue::new(dec!(0.0002)));
        venue.push_ticker(ticker(dec!(99.9), dec!(100.1), 0));
        let mut bot = build(&venue, LiveConfig::default());
        bot.tick().await.unwrap();

        // market trades down through the resting bid
        venue.push_ticker(ticker(dec!(98), dec!(98.4), 1));
        bot.tick().await.unwrap();
        assert_eq!(bot.ledger().position().quantity, dec!(1));

        // the same fill reappears in the next overlapping poll
        bot.tick().await.unwrap();
        assert_eq!(bot.ledger().position().quantity, dec!(1));
    }

    /// Fill a 2-lot bid, then drop the market through the 2% stop so a
    /// forced reduction is resting when this returns.
    async fn long_two_through_stop(venue: &Arc<PaperVenue>) -> LiveTradingLoop {
        venue.push_ticker(ticker(dec!(99.9), dec!(100.1), 0));
        let mut bot = LiveTradingLoop::new(
            ModelConfig {
                min_spread: 1.0,
                max_spread: 1.0,
                order_size: dec!(2),
                ..ModelConfig::default()
            },
            RegimeConfig::default(),
            RiskConfig {
                soft_limit: dec!(1),
                hard_limit: dec!(2),
                ..RiskConfig::default()
            },
            LiveConfig::default(),
            venue.clone() as Arc<dyn MarketDataSource>,
            venue.clone() as Arc<dyn OrderExecutionClient>,
        )
        .unwrap();

        bot.tick().await.unwrap();
        // the bid fills in full: long 2 from ~99.5
        venue.push_ticker(ticker(dec!(98), dec!(98.4), 1));
        bot.tick().await.unwrap();
        assert_eq!(bot.ledger().position().quantity, dec!(2));

        // the next leg down pierces the stop
        venue.push_ticker(ticker(dec!(96), dec!(96.4), 2));
        bot.tick().await.unwrap();
        bot
    }

    #[tokio::test]
    async fn stop_refire_keeps_one_reduction_and_never_crosses_flat() {
        let venue = Arc::new(PaperVenue::new(dec!(0)));
        let mut bot = long_two_through_stop(&venue).await;

        // the stop re-fires each tick while the reduction is unfilled;
        // the resting order must be kept, not stacked
        bot.tick().await.unwrap();
        bot.tick().await.unwrap();
        let open = venue.open_orders();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].side, OrderSide::Sell);
        assert_eq!(open[0].remaining, Size::new(dec!(2)));

        // the reduction matches: the close is exact, never past flat
        venue.push_ticker(ticker(dec!(96), dec!(96.4), 3));
        bot.tick().await.unwrap();
        assert_eq!(bot.ledger().position().quantity, Decimal::ZERO);
        assert_eq!(venue.get_position().await.unwrap(), Decimal::ZERO);
        let trade = bot.ledger().trades().last().unwrap();
        assert_eq!(trade.exit_reason, ExitReason::StopLoss);
        assert!(trade.full_close);
    }

    #[tokio::test]
    async fn stale_forced_reduction_is_replaced_not_stacked() {
        let venue = Arc::new(PaperVenue::new(dec!(0)));
        let mut bot = long_two_through_stop(&venue).await;
        assert_eq!(venue.open_orders().len(), 1);

        // the touch keeps falling; the reduction follows it as one order
        venue.push_ticker(ticker(dec!(95), dec!(95.4), 3));
        bot.tick().await.unwrap();
        let open = venue.open_orders();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].price, Price::new(dec!(95)));
        // the replaced order's exit reason was evicted with it
        assert_eq!(bot.forced_reasons.len(), 1);
    }

    #[tokio::test]
    async fn depth_snapshots_drive_kappa_estimation() {
        let venue = Arc::new(PaperVenue::new(dec!(0)));
        venue.push_ticker(ticker(dec!(99.9), dec!(100.1), 0));
        let mut bot = build(&venue, LiveConfig::default());
        assert!(bot.kappa.kappa().is_none());

        // eight levels per snapshot, four snapshots clear the sample bar
        for _ in 0..4 {
            bot.tick().await.unwrap();
        }
        assert!(bot.kappa.kappa().is_some());
    }

    #[tokio::test]
    async fn rejection_is_not_fatal() {
        let venue = Arc::new(PaperVenue::new(dec!(0)));
        venue.push_ticker(ticker(dec!(99.9), dec!(100.1), 0));
        let mut bot = build(&venue, LiveConfig::default());
        venue.reject_next_order("post-only would cross");

        bot.tick().await.unwrap();
        // one side was rejected, the other placed; both return next tick
        assert_eq!(venue.open_orders().len(), 1);
        bot.tick().await.unwrap();
        assert_eq!(venue.open_orders().len(), 2);
    }

    #[tokio::test]
    async fn dead_feed_pauses_quoting_but_keeps_orders() {
        let venue = Arc::new(PaperVenue::new(dec!(0)));
        venue.push_ticker(ticker(dec!(99.9), dec!(100.1), 0));
        let mut bot = build(&venue, LiveConfig::default());
        bot.tick().await.unwrap();
        assert_eq!(venue.open_orders().len(), 2);

        venue.set_feed_down(true);
        bot.tick().await.unwrap();
        // resting orders were not cancelled by the outage
        assert_eq!(venue.open_orders().len(), 2);
    }

    #[tokio::test]
    async fn reconciliation_mismatch_halts_placement() {
        let venue = Arc::new(PaperVenue::new(dec!(0)));
        venue.push_ticker(ticker(dec!(99.9), dec!(100.1), 0));
        let cfg = LiveConfig {
            reconcile_interval_ticks: 1,
            ..LiveConfig::default()
        };
        let mut bot = build(&venue, cfg);

        venue.set_position(dec!(5));
        let err = bot.tick().await.unwrap_err();
        assert!(matches!(err, LiveError::ReconciliationMismatch { .. }));
        assert!(bot.is_halted());

        // placement stays halted while the mismatch persists
        venue.push_ticker(ticker(dec!(99.8), dec!(100.2), 1));
        let before = venue.open_orders();
        let _ = bot.tick().await;
        assert_eq!(venue.open_orders(), before);

        // once the venue agrees again, quoting resumes
        venue.set_position(Decimal::ZERO);
        bot.tick().await.unwrap();
        assert!(!bot.is_halted());
    }

    #[tokio::test]
    async fn shutdown_cancels_resting_orders() {
        let venue = Arc::new(PaperVenue::new(dec!(0)));
        venue.push_ticker(ticker(dec!(99.9), dec!(100.1), 0));
        let mut bot = build(&venue, LiveConfig::default());
        bot.tick().await.unwrap();
        assert!(!venue.open_orders().is_empty());

        bot.shutdown().await;
        assert!(venue.open_orders().is_empty());
    }
}
