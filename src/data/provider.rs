use crate::config::ConfigError;
use crate::data::bar::{Bar, BarError};
use crate::data::Granularity;
use crate::instrument::Instrument;
use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Unknown instrument: {0}")]
    UnknownInstrument(String),
    #[error("No candles for {instrument} between {start} and {end}")]
    NoData {
        instrument: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    #[error("Malformed response: {0}")]
    Decode(String),
    #[error("Invalid candle at {time}: {source}")]
    InvalidBar {
        time: String,
        #[source]
        source: BarError,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

//historical candles for one instrument over [start, end)
#[derive(Debug, Clone, PartialEq)]
pub struct CandleRequest {
    pub instrument: String,
    pub granularity: Granularity,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl CandleRequest {
    pub fn new(
        instrument: impl Into<String>,
        granularity: Granularity,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self, ConfigError> {
        let instrument = instrument.into();
        if instrument.trim().is_empty() {
            return Err(ConfigError::EmptyInstrument);
        }
        if start >= end {
            return Err(ConfigError::InvalidDateRange { start, end });
        }
        Ok(CandleRequest {
            instrument,
            granularity,
            start,
            end,
        })
    }
}

//source of historical bars and of the tradable instrument list
pub trait MarketDataProvider {
    //instruments the configured account may trade
    fn list_instruments(&self) -> Result<Vec<Instrument>, ProviderError>;

    //time-ordered bars without duplicate timestamps, all inside the requested range
    fn fetch_bars(&self, request: &CandleRequest) -> Result<Vec<Bar>, ProviderError>;
}
