use crate::engine::{BacktestResult, Fill, OrderSide};
use crate::instrument::Instrument;
use crate::metrics::EquityPoint;
use crate::portfolio::ClosedTrade;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

#[derive(Serialize)]
struct FillRow<'a> {
    id: u64,
    order_id: u64,
    timestamp: DateTime<Utc>,
    side: &'a str,
    units: i64,
    fill_price: f64,
    notional: f64,
    fees: f64,
    signal_rsi: Option<f64>,
}

fn write_rows<T: Serialize>(rows: impl IntoIterator<Item = T>, path: &Path) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).context(format!("Failed to create {:?}", path))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

//timestamp,equity,drawdown,returns,position
pub fn save_equity_csv(equity_curve: &[EquityPoint], path: &Path) -> Result<()> {
    write_rows(equity_curve, path)
}

//one row per closed round trip
pub fn save_trades_csv(trades: &[ClosedTrade], path: &Path) -> Result<()> {
    write_rows(trades, path)
}

pub fn save_fills_csv(fills: &[Fill], path: &Path) -> Result<()> {
    write_rows(
        fills.iter().map(|fill| FillRow {
            id: fill.id,
            order_id: fill.order_id,
            timestamp: fill.timestamp,
            side: match fill.side {
                OrderSide::Buy => "BUY",
                OrderSide::Sell => "SELL",
            },
            units: fill.units,
            fill_price: fill.fill_price,
            notional: fill.notional_value(),
            fees: fill.fees,
            signal_rsi: fill.signal_rsi,
        }),
        path,
    )
}

//numbered instrument listing
pub fn write_instruments<W: Write>(
    out: &mut W,
    account_id: &str,
    instruments: &[Instrument],
) -> std::io::Result<()> {
    writeln!(out, "\n--- Acceptable Instruments for Account ID: {} ---", account_id)?;
    for (i, instrument) in instruments.iter().enumerate() {
        writeln!(out, "{}", instrument.listing_line(i + 1))?;
    }
    writeln!(out, "----------------------------------------------------------")
}

//headline and summary table
pub fn write_summary<W: Write>(out: &mut W, result: &BacktestResult) -> std::io::Result<()> {
    writeln!(out, "Backtest Results: {}", result.strategy)?;
    writeln!(out, "================\n")?;
    write!(out, "{}", result.summary.to_table())
}
