use crate::config::ConfigError;
use crate::data::Granularity;
use crate::engine::BacktestConfig;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

//how far back a run reaches when no start date is given
pub const DEFAULT_LOOKBACK_DAYS: i64 = 7;

//rsi reversion rule parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiParams {
    pub period: usize,

    //entry levels
    pub oversold: f64,
    pub overbought: f64,

    //rsi at or above this closes longs (default: overbought)
    pub exit_long: Option<f64>,

    //rsi at or below this covers shorts (default: oversold)
    pub exit_short: Option<f64>,

    //units per order
    pub units: u32,

    //largest absolute position; entries re-trigger in the zone until it is reached
    pub max_units: u32,
}

impl Default for RsiParams {
    fn default() -> Self {
        RsiParams {
            period: 14,
            oversold: 30.0,
            overbought: 70.0,
            exit_long: None,
            exit_short: None,
            units: 1,
            max_units: 1,
        }
    }
}

impl RsiParams {
    pub fn exit_long_level(&self) -> f64 {
        self.exit_long.unwrap_or(self.overbought)
    }

    pub fn exit_short_level(&self) -> f64 {
        self.exit_short.unwrap_or(self.oversold)
    }

    //rejects settings the rule cannot trade sensibly with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period == 0 {
            return Err(ConfigError::InvalidPeriod);
        }

        let exit_long = self.exit_long_level();
        let exit_short = self.exit_short_level();

        for threshold in [self.oversold, self.overbought, exit_long, exit_short] {
            if !(0.0..=100.0).contains(&threshold) {
                return Err(ConfigError::ThresholdOutOfRange(threshold));
            }
        }

        if self.oversold >= self.overbought {
            return Err(ConfigError::DegenerateThresholds {
                oversold: self.oversold,
                overbought: self.overbought,
            });
        }

        //a long entered at oversold must not be closed on the same reading
        if exit_long <= self.oversold {
            return Err(ConfigError::DegenerateLongExit {
                exit_long,
                oversold: self.oversold,
            });
        }
        if exit_short >= self.overbought {
            return Err(ConfigError::DegenerateShortExit {
                exit_short,
                overbought: self.overbought,
            });
        }

        if self.units == 0 {
            return Err(ConfigError::InvalidUnits);
        }

        if self.max_units < self.units {
            return Err(ConfigError::PositionLimitTooSmall {
                units: self.units,
                max_units: self.max_units,
            });
        }

        Ok(())
    }
}

//complete run configuration, loadable from json
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfiguration {
    //market data
    pub instrument: String,
    pub granularity: Granularity,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,

    //read bars from this csv instead of the api
    pub data_path: Option<PathBuf>,

    //where downloaded candles are cached
    pub data_dir: PathBuf,

    //strategy
    pub rsi: RsiParams,

    //account settings
    pub initial_balance: f64,
    pub commission_per_unit: f64,
    pub flatten_on_finish: bool,

    //annual rate used by the daily sharpe
    pub risk_free_rate: f64,

    //optional output paths
    pub output_equity_csv: Option<PathBuf>,
    pub output_trades_csv: Option<PathBuf>,
    pub output_fills_csv: Option<PathBuf>,
}

impl Default for BacktestConfiguration {
    fn default() -> Self {
        BacktestConfiguration {
            instrument: "EUR_USD".to_string(),
            granularity: Granularity::H1,
            start: None,
            end: None,
            data_path: None,
            data_dir: PathBuf::from("data"),
            rsi: RsiParams::default(),
            initial_balance: 100000.0,
            commission_per_unit: 0.0,
            flatten_on_finish: true,
            risk_free_rate: 0.0004,
            output_equity_csv: None,
            output_trades_csv: None,
            output_fills_csv: None,
        }
    }
}

impl BacktestConfiguration {
    //load configuration from a JSON file
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: BacktestConfiguration = serde_json::from_str(&contents)?;
        Ok(config)
    }

    //save configuration to a JSON file
    pub fn to_json_file(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    //checks everything that can be checked before touching the network
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instrument.trim().is_empty() {
            return Err(ConfigError::EmptyInstrument);
        }
        self.rsi.validate()?;

        if !(self.initial_balance > 0.0) {
            return Err(ConfigError::InvalidBalance(self.initial_balance));
        }
        if !(self.commission_per_unit >= 0.0) {
            return Err(ConfigError::NegativeCommission(self.commission_per_unit));
        }

        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start >= end {
                return Err(ConfigError::InvalidDateRange { start, end });
            }
        }
        Ok(())
    }

    //fills in the default range: the last week up to `now`
    pub fn resolve_range(
        &self,
        now: DateTime<Utc>,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>), ConfigError> {
        let end = self.end.unwrap_or(now);
        let start = self
            .start
            .unwrap_or(end - Duration::days(DEFAULT_LOOKBACK_DAYS));

        if start >= end {
            return Err(ConfigError::InvalidDateRange { start, end });
        }
        Ok((start, end))
    }

    //engine settings derived from this configuration
    pub fn engine_config(&self) -> BacktestConfig {
        BacktestConfig {
            initial_balance: self.initial_balance,
            commission_per_unit: self.commission_per_unit,
            flatten_on_finish: self.flatten_on_finish,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn default_params_are_valid() {
        assert!(RsiParams::default().validate().is_ok());
        assert!(BacktestConfiguration::default().validate().is_ok());
    }

    #[test]
    fn equal_thresholds_are_degenerate() {
        let params = RsiParams {
            oversold: 30.0,
            overbought: 30.0,
            ..RsiParams::default()
        };
        assert_eq!(
            params.validate(),
            Err(ConfigError::DegenerateThresholds {
                oversold: 30.0,
                overbought: 30.0
            })
        );
    }

    #[test]
    fn inverted_thresholds_are_degenerate() {
        let params = RsiParams {
            oversold: 75.0,
            overbought: 25.0,
            ..RsiParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::DegenerateThresholds { .. })
        ));
    }

    #[test]
    fn threshold_outside_scale_is_rejected() {
        let params = RsiParams {
            overbought: 120.0,
            ..RsiParams::default()
        };
        assert_eq!(
            params.validate(),
            Err(ConfigError::ThresholdOutOfRange(120.0))
        );
    }

    #[test]
    fn exit_levels_default_to_entry_thresholds() {
        let params = RsiParams::default();
        assert_eq!(params.exit_long_level(), 70.0);
        assert_eq!(params.exit_short_level(), 30.0);

        let params = RsiParams {
            exit_long: Some(55.0),
            exit_short: Some(45.0),
            ..RsiParams::default()
        };
        assert!(params.validate().is_ok());
        assert_eq!(params.exit_long_level(), 55.0);
        assert_eq!(params.exit_short_level(), 45.0);
    }

    #[test]
    fn exit_inside_entry_zone_is_rejected() {
        let params = RsiParams {
            exit_long: Some(25.0),
            ..RsiParams::default()
        };
        assert_eq!(
            params.validate(),
            Err(ConfigError::DegenerateLongExit {
                exit_long: 25.0,
                oversold: 30.0
            })
        );

        let params = RsiParams {
            exit_short: Some(70.0),
            ..RsiParams::default()
        };
        assert!(matches!(
            params.validate(),
            Err(ConfigError::DegenerateShortExit { .. })
        ));

        let params = RsiParams {
            exit_long: Some(101.0),
            ..RsiParams::default()
        };
        assert_eq!(
            params.validate(),
            Err(ConfigError::ThresholdOutOfRange(101.0))
        );
    }

    #[test]
    fn position_limit_must_fit_one_order() {
        let params = RsiParams {
            units: 5,
            max_units: 2,
            ..RsiParams::default()
        };
        assert_eq!(
            params.validate(),
            Err(ConfigError::PositionLimitTooSmall {
                units: 5,
                max_units: 2
            })
        );
    }

    #[test]
    fn resolve_range_defaults_to_last_week() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        let (start, end) = BacktestConfiguration::default().resolve_range(now).unwrap();
        assert_eq!(end, now);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 5, 3, 12, 0, 0).unwrap());
    }

    #[test]
    fn nan_commission_is_rejected() {
        let config = BacktestConfiguration {
            commission_per_unit: f64::NAN,
            ..BacktestConfiguration::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NegativeCommission(c)) if c.is_nan()
        ));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let config = BacktestConfiguration {
            start: Some(Utc.with_ymd_and_hms(2024, 5, 10, 0, 0, 0).unwrap()),
            end: Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap()),
            ..BacktestConfiguration::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDateRange { .. })
        ));
    }

    #[test]
    fn json_file_round_trip_with_partial_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        std::fs::write(
            &path,
            r#"{ "instrument": "NATGAS_USD", "granularity": "M15", "rsi": { "max_units": 3 } }"#,
        )
        .unwrap();

        let config = BacktestConfiguration::from_json_file(&path).unwrap();
        assert_eq!(config.instrument, "NATGAS_USD");
        assert_eq!(config.granularity, Granularity::M15);
        assert_eq!(config.rsi.max_units, 3);
        assert_eq!(config.rsi.period, 14);

        let out = dir.path().join("saved.json");
        config.to_json_file(&out).unwrap();
        assert_eq!(BacktestConfiguration::from_json_file(&out).unwrap(), config);
    }
}
