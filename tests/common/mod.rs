#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use rsilab::data::{Bar, CandleRequest, MarketDataProvider, ProviderError};
use rsilab::instrument::{Instrument, InstrumentType};
use std::cell::RefCell;

//in-memory provider recording the requests it receives
pub struct MockProvider {
    pub bars: Vec<Bar>,
    pub instruments: Vec<Instrument>,
    pub requests: RefCell<Vec<CandleRequest>>,
}

impl MockProvider {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self {
            bars,
            instruments: vec![Instrument {
                name: "EUR_USD".to_string(),
                display_name: "EUR/USD".to_string(),
                instrument_type: InstrumentType::Currency,
                pip_location: -4,
            }],
            requests: RefCell::new(Vec::new()),
        }
    }
}

impl MarketDataProvider for MockProvider {
    fn list_instruments(&self) -> Result<Vec<Instrument>, ProviderError> {
        Ok(self.instruments.clone())
    }

    fn fetch_bars(&self, request: &CandleRequest) -> Result<Vec<Bar>, ProviderError> {
        self.requests.borrow_mut().push(request.clone());
        if !self.instruments.iter().any(|i| i.name == request.instrument) {
            return Err(ProviderError::UnknownInstrument(request.instrument.clone()));
        }
        Ok(self
            .bars
            .iter()
            .filter(|b| b.timestamp >= request.start && b.timestamp < request.end)
            .cloned()
            .collect())
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

//hourly bars opening at the previous close
pub fn hourly_bars(closes: &[f64]) -> Vec<Bar> {
    let mut prev = closes.first().copied().unwrap_or(1.0);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = prev;
            prev = close;
            Bar::new(
                start_time() + Duration::hours(i as i64),
                open,
                open.max(close),
                open.min(close),
                close,
                100.0,
            )
            .unwrap()
        })
        .collect()
}

//a falling leg, a rally, then a second fall: drives rsi through both zones
pub fn swing_closes() -> Vec<f64> {
    let mut closes = Vec::new();
    let mut price = 1.2000;
    for _ in 0..20 {
        price -= 0.0010;
        closes.push(price);
    }
    for _ in 0..20 {
        price += 0.0015;
        closes.push(price);
    }
    for _ in 0..20 {
        price -= 0.0012;
        closes.push(price);
    }
    closes
}
