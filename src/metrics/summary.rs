use crate::metrics::daily::{daily_risk_metrics, DailyRiskMetrics};
use crate::metrics::timeseries::{exposure, max_drawdown, EquityPoint};
use crate::portfolio::ClosedTrade;
use prettytable::{Cell, Row, Table};
use serde::{Deserialize, Serialize};

//summary metrics for a backtest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryMetrics {
    pub initial_balance: f64,
    pub final_balance: f64,
    pub total_return: f64,
    pub total_return_pct: f64,
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub profit_factor: f64,
    pub num_trades: usize,
    pub num_winning_trades: usize,
    pub num_losing_trades: usize,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub exposure: f64,
    pub num_fills: usize,
    pub total_fees: f64,
    pub daily: Option<DailyRiskMetrics>,
}

impl SummaryMetrics {
    //calculate summary metrics from the equity curve and closed round trips
    pub fn from_backtest(
        equity_curve: &[EquityPoint],
        trades: &[ClosedTrade],
        num_fills: usize,
        total_fees: f64,
        initial_balance: f64,
        risk_free_rate: f64,
    ) -> Self {
        let final_balance = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_balance);

        let total_return = final_balance - initial_balance;
        let total_return_pct = total_return / initial_balance;

        let trade_stats = calculate_trade_statistics(trades);

        SummaryMetrics {
            initial_balance,
            final_balance,
            total_return,
            total_return_pct,
            max_drawdown: max_drawdown(equity_curve),
            win_rate: trade_stats.win_rate,
            avg_win: trade_stats.avg_win,
            avg_loss: trade_stats.avg_loss,
            profit_factor: trade_stats.profit_factor,
            num_trades: trade_stats.num_trades,
            num_winning_trades: trade_stats.num_winning_trades,
            num_losing_trades: trade_stats.num_losing_trades,
            largest_win: trade_stats.largest_win,
            largest_loss: trade_stats.largest_loss,
            exposure: exposure(equity_curve),
            num_fills,
            total_fees,
            daily: daily_risk_metrics(trades, initial_balance, risk_free_rate),
        }
    }

    //builds the metrics table
    pub fn to_table(&self) -> Table {
        let mut table = Table::new();

        table.add_row(Row::new(vec![Cell::new("Metric"), Cell::new("Value")]));

        let mut add = |name: &str, value: String| {
            table.add_row(Row::new(vec![Cell::new(name), Cell::new(&value)]));
        };

        add("Initial Balance", format!("{:.2}", self.initial_balance));
        add("Final Balance", format!("{:.2}", self.final_balance));
        add(
            "Total Return",
            format!(
                "{:.2} ({:.2}%)",
                self.total_return,
                self.total_return_pct * 100.0
            ),
        );
        add("Max Drawdown", format!("{:.2}%", self.max_drawdown * 100.0));
        add("Closed Trades", format!("{}", self.num_trades));
        add(
            "Winners / Losers",
            format!("{} / {}", self.num_winning_trades, self.num_losing_trades),
        );
        add("Win Rate", format!("{:.2}%", self.win_rate * 100.0));
        add("Avg Win", format!("{:.5}", self.avg_win));
        add("Avg Loss", format!("{:.5}", self.avg_loss));
        add("Largest Win", format!("{:.5}", self.largest_win));
        add("Largest Loss", format!("{:.5}", self.largest_loss));
        add("Profit Factor", format!("{:.3}", self.profit_factor));
        add("Exposure", format!("{:.2}%", self.exposure * 100.0));
        add("Fills", format!("{}", self.num_fills));
        add("Fees", format!("{:.2}", self.total_fees));

        match &self.daily {
            Some(daily) => {
                add(
                    "Mean Daily Return",
                    format!("{:.4}%", daily.mean_daily_return * 100.0),
                );
                add(
                    "Annual Volatility",
                    format!("{:.2}%", daily.annual_volatility * 100.0),
                );
                add(
                    "Daily Trade-PnL Sharpe (ann.)",
                    format!("{:.3}", daily.annual_sharpe),
                );
            }
            None => add("Daily Trade-PnL Sharpe (ann.)", "n/a".to_string()),
        }

        table
    }
}

#[derive(Default)]
struct TradeStats {
    num_trades: usize,
    num_winning_trades: usize,
    num_losing_trades: usize,
    win_rate: f64,
    avg_win: f64,
    avg_loss: f64,
    profit_factor: f64,
    largest_win: f64,
    largest_loss: f64,
}

//breakeven trades count toward the total but neither side
fn calculate_trade_statistics(trades: &[ClosedTrade]) -> TradeStats {
    let mut stats = TradeStats {
        num_trades: trades.len(),
        ..TradeStats::default()
    };
    let mut gross_profit = 0.0;
    let mut gross_loss = 0.0;

    for pnl in trades.iter().map(|t| t.pnl) {
        if pnl > 0.0 {
            stats.num_winning_trades += 1;
            gross_profit += pnl;
            stats.largest_win = stats.largest_win.max(pnl);
        } else if pnl < 0.0 {
            stats.num_losing_trades += 1;
            gross_loss += pnl;
            stats.largest_loss = stats.largest_loss.min(pnl);
        }
    }

    if stats.num_trades > 0 {
        stats.win_rate = stats.num_winning_trades as f64 / stats.num_trades as f64;
    }
    if stats.num_winning_trades > 0 {
        stats.avg_win = gross_profit / stats.num_winning_trades as f64;
    }
    if stats.num_losing_trades > 0 {
        stats.avg_loss = gross_loss / stats.num_losing_trades as f64;
    }

    stats.profit_factor = match (gross_profit > 0.0, gross_loss < 0.0) {
        (_, true) => gross_profit / -gross_loss,
        (true, false) => f64::INFINITY,
        (false, false) => 0.0,
    };

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::TradeSide;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};

    fn trade(pnl: f64) -> ClosedTrade {
        let time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        ClosedTrade {
            side: TradeSide::Long,
            units: 1,
            entry_time: time,
            entry_price: 1.0,
            entry_rsi: None,
            exit_time: time,
            exit_price: 1.0 + pnl,
            exit_rsi: None,
            pnl,
        }
    }

    #[test]
    fn trade_statistics() {
        let stats = calculate_trade_statistics(&[trade(3.0), trade(-1.0), trade(1.0), trade(-2.0)]);

        assert_eq!(stats.num_trades, 4);
        assert_eq!(stats.num_winning_trades, 2);
        assert_relative_eq!(stats.win_rate, 0.5);
        assert_relative_eq!(stats.avg_win, 2.0);
        assert_relative_eq!(stats.avg_loss, -1.5);
        assert_relative_eq!(stats.profit_factor, 4.0 / 3.0);
        assert_relative_eq!(stats.largest_win, 3.0);
        assert_relative_eq!(stats.largest_loss, -2.0);
    }

    #[test]
    fn no_trades_is_all_zero() {
        let summary = SummaryMetrics::from_backtest(&[], &[], 0, 0.0, 500.0, 0.0);
        assert_eq!(summary.num_trades, 0);
        assert_eq!(summary.final_balance, 500.0);
        assert_eq!(summary.profit_factor, 0.0);
        assert!(summary.daily.is_none());
    }

    #[test]
    fn table_lists_sharpe_row() {
        let summary = SummaryMetrics::from_backtest(&[], &[trade(1.0)], 2, 0.0, 500.0, 0.0);
        let rendered = summary.to_table().to_string();
        assert!(rendered.contains("Closed Trades"));
        assert!(rendered.contains("n/a"));
    }
}
