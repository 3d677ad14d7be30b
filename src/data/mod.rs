pub mod bar;
pub mod granularity;
pub mod loader;
pub mod oanda;
pub mod provider;

pub use bar::{check_series, normalize_series, Bar, BarError};
pub use granularity::Granularity;
pub use loader::{cache_path, load_csv, save_csv};
pub use oanda::OandaClient;
pub use provider::{CandleRequest, MarketDataProvider, ProviderError};
