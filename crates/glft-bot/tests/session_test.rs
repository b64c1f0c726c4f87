//! End-to-end session tests: config file in, summary out, for both
//! operating modes.

use chrono::{TimeZone, Utc};
use glft_bot::{AppConfig, Application, OperatingMode};
use glft_core::{Candle, Price, Size};
use rust_decimal_macros::dec;
use std::path::PathBuf;

/// Sideways market with enough wick to trade both sides.
fn ranging_candles(count: usize) -> Vec<Candle> {
    let offsets = [
        dec!(0),
        dec!(1.2),
        dec!(2),
        dec!(1.2),
        dec!(0),
        dec!(-1.2),
        dec!(-2),
        dec!(-1.2),
    ];
    (0..count)
        .map(|i| {
            let open = dec!(100) + offsets[i % offsets.len()];
            let close = dec!(100) + offsets[(i + 1) % offsets.len()];
            let high = open.max(close) + dec!(0.5);
            let low = open.min(close) - dec!(0.5);
            Candle {
                timestamp: Utc.timestamp_opt(1_700_000_000 + (i as i64) * 60, 0).unwrap(),
                open: Price::new(open),
                high: Price::new(high),
                low: Price::new(low),
                close: Price::new(close),
                volume: Size::new(dec!(10)),
            }
        })
        .collect()
}

fn write_candles(name: &str, candles: &[Candle]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("glft_{}_{}.json", name, std::process::id()));
    std::fs::write(&path, serde_json::to_string(candles).unwrap()).unwrap();
    path
}

fn config_for(candle_file: &PathBuf, mode: OperatingMode) -> AppConfig {
    let mut config = AppConfig::default();
    config.mode = mode;
    config.data.candle_file = candle_file.to_string_lossy().into_owned();
    // tight quoting so the ranging series generates fills
    config.model.min_spread = 1.0;
    config.model.max_spread = 1.0;
    config.model.order_size = dec!(0.5);
    config
}

#[test]
fn backtest_session_produces_report() {
    let candles = ranging_candles(300);
    let path = write_candles("backtest", &candles);
    let report_path = std::env::temp_dir().join(format!("glft_report_{}.json", std::process::id()));

    let mut config = config_for(&path, OperatingMode::Backtest);
    config.data.report_file = Some(report_path.to_string_lossy().into_owned());

    let app = Application::new(config).unwrap();
    let report = app.run_backtest().unwrap();

    assert_eq!(report.candles, 300);
    assert_eq!(report.equity_curve.len(), 300);
    assert!(!report.trades.is_empty());

    let written = std::fs::read_to_string(&report_path).unwrap();
    assert!(written.contains("equity_curve"));

    std::fs::remove_file(path).ok();
    std::fs::remove_file(report_path).ok();
}

#[test]
fn backtest_is_deterministic_across_runs() {
    let candles = ranging_candles(200);
    let path = write_candles("determinism", &candles);
    let config = config_for(&path, OperatingMode::Backtest);

    let first = Application::new(config.clone())
        .unwrap()
        .run_backtest()
        .unwrap();
    let second = Application::new(config).unwrap().run_backtest().unwrap();

    assert_eq!(first.equity_curve, second.equity_curve);
    assert_eq!(first.trades.len(), second.trades.len());

    std::fs::remove_file(path).ok();
}

#[tokio::test]
async fn paper_session_runs_to_completion() {
    let candles = ranging_candles(40);
    let path = write_candles("paper", &candles);

    let mut config = config_for(&path, OperatingMode::Paper);
    config.live.poll_interval_ms = 5;
    config.live.io_timeout_ms = 1000;

    let app = Application::new(config).unwrap();
    app.run().await.unwrap();

    std::fs::remove_file(path).ok();
}

#[test]
fn missing_candle_file_is_a_config_error() {
    let mut config = AppConfig::default();
    config.data.candle_file = "/nonexistent/candles.json".to_string();
    let app = Application::new(config).unwrap();
    assert!(app.run_backtest().is_err());
}
