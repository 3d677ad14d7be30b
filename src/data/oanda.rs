//blocking client for the oanda v20 rest api (instrument list and mid candles)

use crate::config::OandaConfig;
use crate::data::bar::{normalize_series, Bar};
use crate::data::provider::{CandleRequest, MarketDataProvider, ProviderError};
use crate::data::Granularity;
use crate::instrument::Instrument;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Instant;
use tracing::{debug, info, warn};

//largest `count` the candles endpoint accepts
pub const MAX_CANDLES_PER_REQUEST: u32 = 5000;

const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct InstrumentsResponse {
    instruments: Vec<Instrument>,
}

#[derive(Debug, Deserialize)]
struct CandlesResponse {
    #[serde(default)]
    candles: Vec<CandleData>,
}

#[derive(Debug, Deserialize)]
struct CandleData {
    time: String,
    #[serde(default)]
    volume: f64,
    #[serde(default = "default_complete")]
    complete: bool,
    mid: Option<PriceData>,
}

//prices arrive as decimal strings
#[derive(Debug, Deserialize)]
struct PriceData {
    o: String,
    h: String,
    l: String,
    c: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiErrorBody {
    error_message: String,
}

fn default_complete() -> bool {
    true
}

impl CandleData {
    fn into_bar(self) -> Result<Bar, ProviderError> {
        let timestamp = DateTime::parse_from_rfc3339(&self.time)
            .map_err(|e| ProviderError::Decode(format!("bad candle time '{}': {}", self.time, e)))?
            .with_timezone(&Utc);

        let mid = self
            .mid
            .ok_or_else(|| ProviderError::Decode(format!("candle {} has no mid prices", self.time)))?;

        Bar::new(
            timestamp,
            parse_price(&mid.o)?,
            parse_price(&mid.h)?,
            parse_price(&mid.l)?,
            parse_price(&mid.c)?,
            self.volume,
        )
        .map_err(|source| ProviderError::InvalidBar {
            time: self.time,
            source,
        })
    }
}

fn parse_price(raw: &str) -> Result<f64, ProviderError> {
    raw.parse::<f64>()
        .map_err(|_| ProviderError::Decode(format!("bad price '{}'", raw)))
}

//http client bound to one account
pub struct OandaClient {
    config: OandaConfig,
    http: Client,
    page_size: u32,
}

impl OandaClient {
    pub fn new(config: OandaConfig) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(OandaClient {
            config,
            http,
            page_size: MAX_CANDLES_PER_REQUEST,
        })
    }

    //candles requested per page, clamped to what the api allows
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_CANDLES_PER_REQUEST);
        self
    }

    pub fn config(&self) -> &OandaConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url().trim_end_matches('/'), path)
    }

    fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Response, ProviderError> {
        let url = self.url(path);
        debug!(%url, ?query, "GET");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .header("Accept-Datetime-Format", "RFC3339")
            .query(query)
            .send()?;

        Ok(response)
    }

    fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ProviderError> {
        let status = response.status();
        if !status.is_success() {
            return Err(api_error(status, response));
        }
        response
            .json::<T>()
            .map_err(|e| ProviderError::Decode(e.to_string()))
    }

    //one page of candles starting at `from` (inclusive)
    fn fetch_page(
        &self,
        instrument: &str,
        granularity: Granularity,
        from: DateTime<Utc>,
    ) -> Result<Vec<CandleData>, ProviderError> {
        let path = format!("/v3/instruments/{}/candles", instrument);
        let query = [
            ("granularity", granularity.code().to_string()),
            ("price", "M".to_string()),
            ("from", from.to_rfc3339_opts(SecondsFormat::Millis, true)),
            ("count", self.page_size.to_string()),
        ];

        let response = self.get(&path, &query)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ProviderError::UnknownInstrument(instrument.to_string()));
        }

        let body: CandlesResponse = Self::decode(response)?;
        Ok(body.candles)
    }
}

fn api_error(status: StatusCode, response: Response) -> ProviderError {
    let text = response.text().unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&text)
        .map(|body| body.error_message)
        .unwrap_or(text);

    ProviderError::Api {
        status: status.as_u16(),
        message,
    }
}

impl MarketDataProvider for OandaClient {
    fn list_instruments(&self) -> Result<Vec<Instrument>, ProviderError> {
        let path = format!("/v3/accounts/{}/instruments", self.config.account_id);
        let response = self.get(&path, &[])?;
        let body: InstrumentsResponse = Self::decode(response)?;

        info!(
            account = %self.config.account_id,
            count = body.instruments.len(),
            "fetched instrument list"
        );
        Ok(body.instruments)
    }

    //walks forward page by page from the start of the range until the end is
    //reached, a page comes back empty, or timestamps stop advancing
    fn fetch_bars(&self, request: &CandleRequest) -> Result<Vec<Bar>, ProviderError> {
        let mut bars: Vec<Bar> = Vec::new();
        let mut next_from = request.start;
        let mut last_seen: Option<DateTime<Utc>> = None;
        let mut page = 0u32;

        while next_from < request.end {
            page += 1;
            let started = Instant::now();
            info!(page, from = %next_from, instrument = %request.instrument, "requesting candles");

            let candles = self.fetch_page(&request.instrument, request.granularity, next_from)?;
            debug!(
                page,
                elapsed_ms = started.elapsed().as_millis() as u64,
                returned = candles.len(),
                "candles received"
            );

            if candles.is_empty() {
                info!(page, "no candles returned, stopping");
                break;
            }

            //the newest candle may still be forming
            let mut page_bars = candles
                .into_iter()
                .filter(|c| c.complete)
                .map(CandleData::into_bar)
                .collect::<Result<Vec<_>, _>>()?;

            let last_ts = match page_bars.iter().map(|b| b.timestamp).max() {
                Some(ts) => ts,
                None => {
                    info!(page, "only incomplete candles returned, stopping");
                    break;
                }
            };

            if last_seen.is_some_and(|prev| last_ts <= prev) {
                warn!(page, last = %last_ts, "candle timestamps stopped advancing, stopping");
                break;
            }
            last_seen = Some(last_ts);

            bars.append(&mut page_bars);
            next_from = last_ts + Duration::milliseconds(1);
        }

        bars.retain(|b| b.timestamp >= request.start && b.timestamp < request.end);
        normalize_series(&mut bars);

        if bars.is_empty() {
            return Err(ProviderError::NoData {
                instrument: request.instrument.clone(),
                start: request.start,
                end: request.end,
            });
        }

        info!(
            instrument = %request.instrument,
            granularity = %request.granularity,
            bars = bars.len(),
            pages = page,
            "fetched candles"
        );
        Ok(bars)
    }
}
