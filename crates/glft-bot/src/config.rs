//! Application configuration.
//!
//! One TOML file drives the whole bot; every section falls back to the
//! owning crate's defaults so a minimal config is just `mode`.

use crate::error::{AppError, AppResult};
use glft_backtest::BacktestConfig;
use glft_fill::FillConfig;
use glft_live::LiveConfig;
use glft_model::{ModelConfig, RegimeConfig};
use glft_risk::RiskConfig;
use glft_telemetry::LogFormat;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

/// Operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperatingMode {
    /// Deterministic candle replay through the simulator.
    #[default]
    Backtest,
    /// Live trading loop against the in-process paper venue.
    Paper,
}

/// Candle input and report output paths.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// JSON array of OHLCV candles.
    #[serde(default = "default_candle_file")]
    pub candle_file: String,
    /// Where to write the backtest report; omit to skip.
    #[serde(default)]
    pub report_file: Option<String>,
}

fn default_candle_file() -> String {
    "data/candles.json".to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            candle_file: default_candle_file(),
            report_file: None,
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub log_format: LogFormat,
}

/// Paper-venue feed shaping.
#[derive(Debug, Clone, Deserialize)]
pub struct PaperConfig {
    /// Half-spread applied around each candle close when synthesizing
    /// the top of book.
    #[serde(default = "default_half_spread")]
    pub half_spread: Decimal,
}

fn default_half_spread() -> Decimal {
    Decimal::new(5, 2)
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            half_spread: default_half_spread(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub mode: OperatingMode,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub regime: RegimeConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub fill: FillConfig,
    #[serde(default)]
    pub backtest: BacktestConfig,
    #[serde(default)]
    pub live: LiveConfig,
    #[serde(default)]
    pub paper: PaperConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mode: OperatingMode::default(),
            data: DataConfig::default(),
            telemetry: TelemetryConfig::default(),
            model: ModelConfig::default(),
            regime: RegimeConfig::default(),
            risk: RiskConfig::default(),
            fill: FillConfig::default(),
            backtest: BacktestConfig::default(),
            live: LiveConfig::default(),
            paper: PaperConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration, falling back to defaults if the file is absent.
    pub fn load(path: &str) -> AppResult<Self> {
        if Path::new(path).exists() {
            Self::from_file(path)
        } else {
            tracing::warn!(path = %path, "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("failed to parse config: {e}")))
    }

    /// Validate every section before any component is built.
    pub fn validate(&self) -> AppResult<()> {
        self.regime.validate()?;
        self.risk.validate()?;
        self.fill.validate()?;
        self.backtest.validate()?;
        self.live.validate()?;
        if self.paper.half_spread < Decimal::ZERO {
            return Err(AppError::Config(
                "paper.half_spread must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}
