pub mod backtest;
pub mod execution;

pub use backtest::{BacktestConfig, BacktestEngine, BacktestResult};
pub use execution::{ExecutionEngine, Fill, Order, OrderSide};
