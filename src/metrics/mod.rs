pub mod daily;
pub mod summary;
pub mod timeseries;

pub use daily::{daily_risk_metrics, DailyReturn, DailyRiskMetrics, TRADING_DAYS_PER_YEAR};
pub use summary::SummaryMetrics;
pub use timeseries::{calculate_equity_curve, EquityPoint};
