use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, info};

use glft_core::decimal::{Price, Size};
use glft_core::market::{Candle, MarketState};
use glft_core::order::{Order, OrderId, OrderSide};
use glft_core::trade::{EquityPoint, ExitReason, Fill};
use glft_fill::{CandleFillEngine, FillConfig, FillEngine};
use glft_ledger::InventoryLedger;
use glft_metrics::MetricsEngine;
use glft_model::{ModelConfig, QuoteModel, RegimeConfig, RegimeDetector, VolEstimator};
use glft_risk::{ForcedOrder, RiskConfig, RiskController, SideQuote};

use crate::config::BacktestConfig;
use crate::error::{BacktestError, BacktestResult};
use crate::report::BacktestReport;

/// Replays a candle series through the full quoting stack.
///
/// Per candle, strictly in this order: resting orders (placed from the
/// previous candle's quote) are matched first, then the candle updates
/// regime and volatility estimators, then a fresh quote is computed and
/// risk-adjusted, forced reductions execute, and new orders are placed.
/// A quote therefore never rests against the candle that produced it.
pub struct BacktestSimulator {
    config: BacktestConfig,
    model: QuoteModel,
    detector: RegimeDetector,
    vol: VolEstimator,
    risk: RiskController,
    fill: CandleFillEngine,
    ledger: InventoryLedger,
    slippage: Decimal,
    bid: Option<Order>,
    ask: Option<Order>,
    next_order_id: OrderId,
    fill_seq: u64,
    last_ts: Option<DateTime<Utc>>,
    equity: Vec<EquityPoint>,
}

impl BacktestSimulator {
    pub fn new(
        model_cfg: ModelConfig,
        regime_cfg: RegimeConfig,
        risk_cfg: RiskConfig,
        fill_cfg: FillConfig,
        config: BacktestConfig,
    ) -> BacktestResult<Self> {
        config.validate()?;
        regime_cfg.validate()?;
        let slippage = fill_cfg.slippage;
        let model = QuoteModel::new(model_cfg)?;
        let vol = VolEstimator::new(model.config().vol_lookback, model.config().vol_alpha);
        Ok(Self {
            ledger: InventoryLedger::new(config.initial_cash),
            detector: RegimeDetector::new(regime_cfg),
            risk: RiskController::new(risk_cfg)?,
            fill: CandleFillEngine::new(fill_cfg)?,
            vol,
            model,
            config,
            slippage,
            bid: None,
            ask: None,
            next_order_id: 1,
            fill_seq: 0,
            last_ts: None,
            equity: Vec::new(),
        })
    }

    /// Run the full series and produce the report artifact.
    pub fn run(mut self, candles: &[Candle]) -> BacktestResult<BacktestReport> {
        info!(candles = candles.len(), "starting backtest");
        for candle in candles {
            self.step(candle)?;
        }
        let metrics = MetricsEngine::for_interval_secs(self.config.interval_secs)
            .report(&self.equity, self.ledger.trades());
        let final_equity = self
            .equity
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.config.initial_cash);
        info!(
            trades = self.ledger.trades().len(),
            final_equity = %final_equity,
            "backtest complete"
        );
        Ok(BacktestReport {
            candles: candles.len(),
            final_equity,
            final_position: self.ledger.position().quantity,
            metrics,
            equity_curve: self.equity,
            trades: self.ledger.trades().to_vec(),
        })
    }

    fn step(&mut self, candle: &Candle) -> BacktestResult<()> {
        candle.validate()?;
        if let Some(prev) = self.last_ts {
            if candle.timestamp <= prev {
                return Err(BacktestError::InvalidData(format!(
                    "non-monotonic timestamp {} after {}",
                    candle.timestamp, prev
                )));
            }
        }
        self.last_ts = Some(candle.timestamp);

        self.match_resting(candle)?;

        let signal = self.detector.on_candle(candle);
        self.vol.on_mid(candle.close);

        let market = MarketState {
            mid: candle.close,
            sigma: self.vol.sigma(),
            regime: signal.regime,
            // no book depth in candle replay; kappa stays at its
            // calibrated seed
            kappa: self.model.config().kappa_seed,
            timestamp: candle.timestamp,
        };
        let quote = self.model.quote(&market, self.ledger.position().quantity)?;
        let position = *self.ledger.position();
        let decision = self.risk.evaluate(
            &quote,
            &position,
            &market,
            &signal,
            candle.low,
            candle.high,
            candle.timestamp,
        );

        for forced in &decision.forced {
            self.execute_forced(forced, candle)?;
        }

        self.bid = match decision.bid {
            Some(side) => Some(self.place(OrderSide::Buy, side, candle.timestamp)),
            None => None,
        };
        self.ask = match decision.ask {
            Some(side) => Some(self.place(OrderSide::Sell, side, candle.timestamp)),
            None => None,
        };

        let active = signal.regime.allows_new_orders() || !self.ledger.position().is_flat();
        self.equity.push(EquityPoint {
            timestamp: candle.timestamp,
            cash: self.ledger.cash(),
            equity: self.ledger.equity(candle.close),
            active,
        });
        Ok(())
    }

    /// Match the resting orders against this candle and book the fills.
    fn match_resting(&mut self, candle: &Candle) -> BacktestResult<()> {
        let orders: Vec<Order> = self.bid.iter().chain(self.ask.iter()).cloned().collect();
        if orders.is_empty() {
            return Ok(());
        }
        let executions = self.fill.match_orders(&orders, candle);
        for exec in executions {
            let slot = match exec.side {
                OrderSide::Buy => &mut self.bid,
                OrderSide::Sell => &mut self.ask,
            };
            let order = match slot.as_mut() {
                Some(o) => o,
                None => continue,
            };
            let consumed = order.consume(exec.quantity);
            if !consumed.is_positive() {
                continue;
            }
            let fee = consumed.notional(exec.price) * self.config.maker_fee;
            self.fill_seq += 1;
            let fill = Fill {
                id: format!("bt_{}", self.fill_seq),
                order_id: order.id,
                side: exec.side,
                price: exec.price,
                quantity: consumed,
                fee,
                timestamp: candle.timestamp,
            };
            debug!(side = %exec.side, price = %exec.price, qty = %consumed, "backtest fill");
            self.ledger.apply_fill(&fill, ExitReason::Quote)?;
            self.risk.on_fill(exec.side);
            if !order.is_active() {
                *slot = None;
            }
        }
        Ok(())
    }

    /// Execute a risk-forced reduction as a marketable order at the
    /// candle close, with adverse slippage and taker fees.
    fn execute_forced(&mut self, forced: &ForcedOrder, candle: &Candle) -> BacktestResult<()> {
        let qty = forced
            .quantity
            .inner()
            .min(self.ledger.position().abs_quantity());
        if qty <= Decimal::ZERO {
            return Ok(());
        }
        let price = match forced.side {
            OrderSide::Buy => Price::new(candle.close.inner() + self.slippage),
            OrderSide::Sell => Price::new(candle.close.inner() - self.slippage),
        };
        let quantity = Size::new(qty);
        let fee = quantity.notional(price) * self.config.taker_fee;
        self.fill_seq += 1;
        let fill = Fill {
            id: format!("bt_forced_{}", self.fill_seq),
            order_id: 0,
            side: forced.side,
            price,
            quantity,
            fee,
            timestamp: candle.timestamp,
        };
        info!(
            side = %forced.side,
            qty = %quantity,
            reason = %forced.reason,
            "forced reduction"
        );
        self.ledger.apply_fill(&fill, forced.reason)?;
        Ok(())
    }

    fn place(&mut self, side: OrderSide, desired: SideQuote, ts: DateTime<Utc>) -> Order {
        let id = self.next_order_id;
        self.next_order_id += 1;
        let mut order = Order::new(id, side, desired.price, desired.size);
        order.created_at = ts;
        order
    }
}
