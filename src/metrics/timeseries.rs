use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

//a point in the equity curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub equity: f64,
    pub drawdown: f64,
    pub returns: f64,
    pub position: i64,
}

//builds the equity curve with drawdowns from (time, equity, position) samples
pub fn calculate_equity_curve(
    samples: &[(DateTime<Utc>, f64, i64)],
    initial_balance: f64,
) -> Vec<EquityPoint> {
    let mut curve = Vec::with_capacity(samples.len());
    let mut peak = initial_balance;
    let mut prev_equity = initial_balance;

    for &(timestamp, equity, position) in samples {
        if equity > peak {
            peak = equity;
        }

        let drawdown = if peak > 0.0 {
            (peak - equity) / peak
        } else {
            0.0
        };

        //first point is measured against the starting balance
        let returns = if prev_equity != 0.0 {
            (equity - prev_equity) / prev_equity
        } else {
            0.0
        };

        curve.push(EquityPoint {
            timestamp,
            equity,
            drawdown,
            returns,
            position,
        });
        prev_equity = equity;
    }

    curve
}

//calculates maximum drawdown from equity curve
pub fn max_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    equity_curve
        .iter()
        .map(|point| point.drawdown)
        .fold(0.0, f64::max)
}

//fraction of points with an open position
pub fn exposure(equity_curve: &[EquityPoint]) -> f64 {
    if equity_curve.is_empty() {
        return 0.0;
    }
    let in_market = equity_curve.iter().filter(|p| p.position != 0).count();
    in_market as f64 / equity_curve.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn samples(values: &[(f64, i64)]) -> Vec<(DateTime<Utc>, f64, i64)> {
        values
            .iter()
            .enumerate()
            .map(|(i, &(equity, position))| {
                (
                    Utc.with_ymd_and_hms(2024, 1, 1, i as u32, 0, 0).unwrap(),
                    equity,
                    position,
                )
            })
            .collect()
    }

    #[test]
    fn drawdown_tracks_peak() {
        let curve = calculate_equity_curve(
            &samples(&[(100.0, 0), (120.0, 1), (90.0, 1), (130.0, 0)]),
            100.0,
        );

        assert_relative_eq!(curve[2].drawdown, 0.25);
        assert_relative_eq!(curve[3].drawdown, 0.0);
        assert_relative_eq!(max_drawdown(&curve), 0.25);
        assert_relative_eq!(curve[1].returns, 0.2);
        assert_relative_eq!(curve[0].returns, 0.0);
    }

    #[test]
    fn exposure_counts_bars_in_market() {
        let curve = calculate_equity_curve(
            &samples(&[(100.0, 0), (100.0, 2), (100.0, -1), (100.0, 0)]),
            100.0,
        );
        assert_relative_eq!(exposure(&curve), 0.5);
        assert_eq!(exposure(&[]), 0.0);
    }
}
