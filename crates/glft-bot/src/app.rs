//! Main application orchestration.
//!
//! Backtest mode builds the simulator and replays candles; paper mode
//! drives the live trading loop against an in-process venue fed with
//! synthetic top-of-book derived from the same candle file.

use crate::config::{AppConfig, OperatingMode};
use crate::error::{AppError, AppResult};
use chrono::Utc;
use glft_backtest::{BacktestReport, BacktestSimulator};
use glft_core::{Candle, Price, Ticker};
use glft_live::{LiveTradingLoop, MarketDataSource, OrderExecutionClient, PaperVenue};
use glft_metrics::MetricsEngine;
use glft_telemetry::SessionSummary;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Main application.
pub struct Application {
    config: AppConfig,
}

impl Application {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run the configured mode to completion.
    pub async fn run(&self) -> AppResult<()> {
        match self.config.mode {
            OperatingMode::Backtest => {
                self.run_backtest()?;
                Ok(())
            }
            OperatingMode::Paper => self.run_paper().await,
        }
    }

    /// Replay the candle file through the simulator and log a summary.
    pub fn run_backtest(&self) -> AppResult<BacktestReport> {
        let candles = load_candles(&self.config.data.candle_file)?;
        info!(
            candles = candles.len(),
            file = %self.config.data.candle_file,
            "loaded candle history"
        );

        let simulator = BacktestSimulator::new(
            self.config.model.clone(),
            self.config.regime.clone(),
            self.config.risk.clone(),
            self.config.fill.clone(),
            self.config.backtest.clone(),
        )?;

        let started_at = Utc::now();
        let report = simulator.run(&candles)?;

        SessionSummary::new(
            started_at,
            Utc::now(),
            &report.metrics,
            report.metrics.fees,
            report.final_equity,
        )
        .log();

        if let Some(path) = &self.config.data.report_file {
            std::fs::write(path, report.to_json()?)?;
            info!(path = %path, "backtest report written");
        }

        Ok(report)
    }

    /// Run the live loop against a paper venue until the candle feed is
    /// exhausted or the process is interrupted.
    pub async fn run_paper(&self) -> AppResult<()> {
        let candles = load_candles(&self.config.data.candle_file)?;
        let venue = Arc::new(PaperVenue::new(self.config.live.maker_fee));
        let mut bot = LiveTradingLoop::new(
            self.config.model.clone(),
            self.config.regime.clone(),
            self.config.risk.clone(),
            self.config.live.clone(),
            venue.clone() as Arc<dyn MarketDataSource>,
            venue.clone() as Arc<dyn OrderExecutionClient>,
        )?;

        let shutdown = CancellationToken::new();
        let ctrl_c = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, shutting down");
                ctrl_c.cancel();
            }
        });

        let feeder = tokio::spawn(feed_candles(
            venue.clone(),
            candles,
            self.config.live.poll_interval_ms,
            self.config.paper.half_spread,
            shutdown.clone(),
        ));

        let result = bot.run(shutdown).await;
        if let Err(e) = feeder.await {
            warn!(error = %e, "candle feeder task failed");
        }

        let interval_secs = (self.config.live.poll_interval_ms / 1000).max(1);
        let metrics = MetricsEngine::for_interval_secs(interval_secs)
            .report(bot.equity_curve(), bot.ledger().trades());
        let final_equity = bot
            .equity_curve()
            .last()
            .map(|p| p.equity)
            .unwrap_or(self.config.live.initial_cash);
        SessionSummary::new(
            bot.started_at(),
            Utc::now(),
            &metrics,
            bot.ledger().fees_paid(),
            final_equity,
        )
        .log();

        result.map_err(AppError::from)
    }
}

/// Push one synthetic top-of-book per interval, then stop the session.
async fn feed_candles(
    venue: Arc<PaperVenue>,
    candles: Vec<Candle>,
    interval_ms: u64,
    half_spread: rust_decimal::Decimal,
    shutdown: CancellationToken,
) {
    let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));
    for candle in candles {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = interval.tick() => {
                venue.push_ticker(Ticker {
                    bid: Price::new(candle.close.inner() - half_spread),
                    ask: Price::new(candle.close.inner() + half_spread),
                    last: candle.close,
                    timestamp: candle.timestamp,
                });
            }
        }
    }
    info!("candle feed exhausted, ending paper session");
    shutdown.cancel();
}

/// Load a JSON array of candles.
fn load_candles(path: &str) -> AppResult<Vec<Candle>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("failed to read candle file {path}: {e}")))?;
    let candles: Vec<Candle> = serde_json::from_str(&content)?;
    Ok(candles)
}
