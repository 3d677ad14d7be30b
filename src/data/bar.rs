use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum BarError {
    #[error("Invalid OHLC values: high ({high}) < low ({low})")]
    InvalidHighLow { high: f64, low: f64 },
    #[error("Invalid OHLC values: close ({close}) outside high-low range [{low}, {high}]")]
    InvalidClose { close: f64, high: f64, low: f64 },
    #[error("Invalid OHLC values: open ({open}) outside high-low range [{low}, {high}]")]
    InvalidOpen { open: f64, high: f64, low: f64 },
    #[error("Negative volume: {0}")]
    NegativeVolume(f64),
    #[error("Bars out of order: {later} does not come after {earlier}")]
    OutOfOrder {
        earlier: DateTime<Utc>,
        later: DateTime<Utc>,
    },
}

//one ohlcv candle of market data (mid prices for oanda)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    //creates a new Bar with validation
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Result<Self, BarError> {
        //validate high >= low
        if high < low {
            return Err(BarError::InvalidHighLow { high, low });
        }

        //validate close within [low, high]
        if close < low || close > high {
            return Err(BarError::InvalidClose { close, high, low });
        }

        //validate open within [low, high]
        if open < low || open > high {
            return Err(BarError::InvalidOpen { open, high, low });
        }

        //validate non-negative volume
        if volume < 0.0 {
            return Err(BarError::NegativeVolume(volume));
        }

        Ok(Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

//sorts bars chronologically and drops repeated timestamps (first one wins)
pub fn normalize_series(bars: &mut Vec<Bar>) {
    bars.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    bars.dedup_by(|later, earlier| later.timestamp == earlier.timestamp);
}

//checks that timestamps are strictly increasing
pub fn check_series(bars: &[Bar]) -> Result<(), BarError> {
    for pair in bars.windows(2) {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(BarError::OutOfOrder {
                earlier: pair[0].timestamp,
                later: pair[1].timestamp,
            });
        }
    }
    Ok(())
}
