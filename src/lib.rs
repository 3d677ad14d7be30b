//an rsi mean-reversion backtester over oanda historical candles

pub mod config;
pub mod data;
pub mod engine;
pub mod indicator;
pub mod instrument;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod portfolio;
pub mod report;
pub mod strategy;

//prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{
        BacktestConfiguration, ConfigError, OandaConfig, OandaEnvironment, RsiParams,
    };
    pub use crate::data::{
        load_csv, save_csv, Bar, CandleRequest, Granularity, MarketDataProvider, OandaClient,
        ProviderError,
    };
    pub use crate::engine::{BacktestConfig, BacktestEngine, BacktestResult, Fill, OrderSide};
    pub use crate::indicator::Rsi;
    pub use crate::instrument::Instrument;
    pub use crate::metrics::{EquityPoint, SummaryMetrics};
    pub use crate::portfolio::{Account, ClosedTrade, Position};
    pub use crate::strategy::{
        decide, rsi_reversion::RsiReversionStrategy, BarContext, OrderIntent, Signal, Strategy,
    };
}
