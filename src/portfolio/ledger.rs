//per-lot trade bookkeeping
//each entry fill opens a lot and exits close the oldest lots first

use crate::engine::execution::Fill;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeSide {
    Long,
    Short,
}

#[derive(Debug, Clone, PartialEq)]
struct Lot {
    side: TradeSide,
    units: i64,
    entry_time: DateTime<Utc>,
    entry_price: f64,
    entry_rsi: Option<f64>,
}

//one completed round trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub side: TradeSide,
    pub units: i64,
    pub entry_time: DateTime<Utc>,
    pub entry_price: f64,
    pub entry_rsi: Option<f64>,
    pub exit_time: DateTime<Utc>,
    pub exit_price: f64,
    pub exit_rsi: Option<f64>,
    pub pnl: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TradeLedger {
    open_lots: VecDeque<Lot>,
    closed: Vec<ClosedTrade>,
}

impl TradeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    //books a fill, closing lots fifo and opening a lot with any remainder
    pub fn record(&mut self, fill: &Fill) {
        let mut remaining = fill.units.abs();
        let fill_side = if fill.units > 0 {
            TradeSide::Long
        } else {
            TradeSide::Short
        };

        while remaining > 0 {
            let lot = match self.open_lots.front_mut() {
                Some(lot) if lot.side != fill_side => lot,
                _ => break,
            };

            let closed_units = remaining.min(lot.units);
            let per_unit = match lot.side {
                TradeSide::Long => fill.fill_price - lot.entry_price,
                TradeSide::Short => lot.entry_price - fill.fill_price,
            };

            self.closed.push(ClosedTrade {
                side: lot.side,
                units: closed_units,
                entry_time: lot.entry_time,
                entry_price: lot.entry_price,
                entry_rsi: lot.entry_rsi,
                exit_time: fill.timestamp,
                exit_price: fill.fill_price,
                exit_rsi: fill.signal_rsi,
                pnl: per_unit * closed_units as f64,
            });

            lot.units -= closed_units;
            remaining -= closed_units;
            if lot.units == 0 {
                self.open_lots.pop_front();
            }
        }

        if remaining > 0 {
            self.open_lots.push_back(Lot {
                side: fill_side,
                units: remaining,
                entry_time: fill.timestamp,
                entry_price: fill.fill_price,
                entry_rsi: fill.signal_rsi,
            });
        }
    }

    //completed round trips in closing order
    pub fn closed_trades(&self) -> &[ClosedTrade] {
        &self.closed
    }

    //number of lots still open
    pub fn open_lot_count(&self) -> usize {
        self.open_lots.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::execution::OrderSide;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn fill(hour: u32, units: i64, price: f64, rsi: f64) -> Fill {
        Fill {
            id: hour as u64,
            order_id: hour as u64,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap(),
            units,
            side: if units > 0 {
                OrderSide::Buy
            } else {
                OrderSide::Sell
            },
            fill_price: price,
            fees: 0.0,
            signal_rsi: Some(rsi),
        }
    }

    #[test]
    fn each_entry_becomes_its_own_round_trip() {
        let mut ledger = TradeLedger::new();
        ledger.record(&fill(1, 1, 10.0, 25.0));
        ledger.record(&fill(2, 1, 9.0, 22.0));
        ledger.record(&fill(3, -2, 12.0, 75.0));

        let trades = ledger.closed_trades();
        assert_eq!(trades.len(), 2);
        assert_relative_eq!(trades[0].pnl, 2.0);
        assert_relative_eq!(trades[1].pnl, 3.0);
        assert_eq!(trades[0].entry_rsi, Some(25.0));
        assert_eq!(trades[1].exit_rsi, Some(75.0));
        assert_eq!(ledger.open_lot_count(), 0);
    }

    #[test]
    fn partial_close_splits_lot() {
        let mut ledger = TradeLedger::new();
        ledger.record(&fill(1, -5, 20.0, 80.0));
        ledger.record(&fill(2, 2, 18.0, 20.0));

        let trades = ledger.closed_trades();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].side, TradeSide::Short);
        assert_eq!(trades[0].units, 2);
        assert_relative_eq!(trades[0].pnl, 4.0);
        assert_eq!(ledger.open_lot_count(), 1);
    }

    #[test]
    fn reversal_opens_remainder() {
        let mut ledger = TradeLedger::new();
        ledger.record(&fill(1, 1, 10.0, 25.0));
        ledger.record(&fill(2, -3, 11.0, 72.0));

        assert_eq!(ledger.closed_trades().len(), 1);
        assert_eq!(ledger.open_lot_count(), 1);

        ledger.record(&fill(3, 2, 10.5, 28.0));
        let last = ledger.closed_trades().last().unwrap();
        assert_eq!(last.side, TradeSide::Short);
        assert_eq!(last.units, 2);
        assert_relative_eq!(last.pnl, 1.0);
    }
}
