pub mod backtest_config;
pub mod oanda_config;

pub use backtest_config::{BacktestConfiguration, RsiParams};
pub use oanda_config::{OandaConfig, OandaEnvironment};

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("OANDA_API_KEY and OANDA_ACCOUNT_ID must be set (environment or .env file); missing {0}")]
    MissingCredential(&'static str),
    #[error("Unknown OANDA environment '{0}' (expected 'practice' or 'live')")]
    InvalidEnvironment(String),
    #[error("Failed to read env file {path}: {reason}")]
    EnvFile { path: String, reason: String },
    #[error("Unknown granularity '{0}'")]
    InvalidGranularity(String),
    #[error("RSI threshold {0} outside [0, 100]")]
    ThresholdOutOfRange(f64),
    #[error("Degenerate RSI thresholds: oversold ({oversold}) must be below overbought ({overbought})")]
    DegenerateThresholds { oversold: f64, overbought: f64 },
    #[error("Long exit level ({exit_long}) must be above oversold ({oversold})")]
    DegenerateLongExit { exit_long: f64, oversold: f64 },
    #[error("Short exit level ({exit_short}) must be below overbought ({overbought})")]
    DegenerateShortExit { exit_short: f64, overbought: f64 },
    #[error("RSI period must be at least 1")]
    InvalidPeriod,
    #[error("Order size must be at least 1 unit")]
    InvalidUnits,
    #[error("Position limit ({max_units}) is smaller than one order ({units})")]
    PositionLimitTooSmall { units: u32, max_units: u32 },
    #[error("Start {start} is not before end {end}")]
    InvalidDateRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("Initial balance must be positive, got {0}")]
    InvalidBalance(f64),
    #[error("Commission must be a non-negative number, got {0}")]
    NegativeCommission(f64),
    #[error("Instrument name is empty")]
    EmptyInstrument,
}
