//daily return statistics from closed trades
//pnl is summed by exit date over the starting cash, every calendar day between
//the first and last exit is present (zero when nothing closed), annualised with 252 days

use crate::portfolio::ClosedTrade;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReturn {
    pub date: NaiveDate,
    pub ret: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRiskMetrics {
    pub daily_returns: Vec<DailyReturn>,
    pub mean_daily_return: f64,
    pub annual_volatility: f64,
    pub annual_sharpe: f64,
}

//none when there are fewer than two days or the returns never vary
pub fn daily_risk_metrics(
    trades: &[ClosedTrade],
    start_cash: f64,
    risk_free_rate: f64,
) -> Option<DailyRiskMetrics> {
    if start_cash <= 0.0 {
        return None;
    }

    let mut pnl_by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for trade in trades {
        *pnl_by_day.entry(trade.exit_time.date_naive()).or_insert(0.0) += trade.pnl;
    }

    let first = *pnl_by_day.keys().next()?;
    let last = *pnl_by_day.keys().next_back()?;

    let daily_returns: Vec<DailyReturn> = first
        .iter_days()
        .take_while(|date| *date <= last)
        .map(|date| DailyReturn {
            date,
            ret: pnl_by_day.get(&date).copied().unwrap_or(0.0) / start_cash,
        })
        .collect();

    if daily_returns.len() < 2 {
        return None;
    }

    let series: Vec<f64> = daily_returns.iter().map(|d| d.ret).collect();
    let mean = series.iter().mean();
    let daily_vol = series.iter().std_dev();

    if !daily_vol.is_finite() || daily_vol == 0.0 {
        return None;
    }

    let daily_rf = risk_free_rate / TRADING_DAYS_PER_YEAR;
    let daily_sharpe = (mean - daily_rf) / daily_vol;

    Some(DailyRiskMetrics {
        daily_returns,
        mean_daily_return: mean,
        annual_volatility: daily_vol * TRADING_DAYS_PER_YEAR.sqrt(),
        annual_sharpe: daily_sharpe * TRADING_DAYS_PER_YEAR.sqrt(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::portfolio::TradeSide;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};

    fn trade(day: u32, pnl: f64) -> ClosedTrade {
        let time = Utc.with_ymd_and_hms(2024, 1, day, 10, 0, 0).unwrap();
        ClosedTrade {
            side: TradeSide::Long,
            units: 1,
            entry_time: time,
            entry_price: 1.0,
            entry_rsi: None,
            exit_time: time,
            exit_price: 1.0,
            exit_rsi: None,
            pnl,
        }
    }

    #[test]
    fn fills_missing_days_with_zero() {
        let trades = vec![trade(1, 60.0), trade(1, 40.0), trade(3, -50.0)];
        let metrics = daily_risk_metrics(&trades, 10_000.0, 0.0004).unwrap();

        let returns: Vec<f64> = metrics.daily_returns.iter().map(|d| d.ret).collect();
        assert_eq!(returns.len(), 3);
        assert_relative_eq!(returns[0], 0.01);
        assert_relative_eq!(returns[1], 0.0);
        assert_relative_eq!(returns[2], -0.005);

        let mean: f64 = (0.01 + 0.0 - 0.005) / 3.0;
        let var = ((0.01 - mean).powi(2) + mean.powi(2) + (-0.005 - mean).powi(2)) / 2.0;
        let std = var.sqrt();

        assert_relative_eq!(metrics.mean_daily_return, mean, epsilon = 1e-12);
        assert_relative_eq!(metrics.annual_volatility, std * 252f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(
            metrics.annual_sharpe,
            (mean - 0.0004 / 252.0) / std * 252f64.sqrt(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn single_day_is_undefined() {
        assert!(daily_risk_metrics(&[trade(2, 10.0)], 1000.0, 0.0).is_none());
        assert!(daily_risk_metrics(&[], 1000.0, 0.0).is_none());
    }
}
