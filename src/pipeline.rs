//the run step by step: fetch or load bars, run the engine, write the exports

use crate::config::BacktestConfiguration;
use crate::data::{
    cache_path, check_series, load_csv, save_csv, Bar, CandleRequest, Granularity,
    MarketDataProvider,
};
use crate::engine::{BacktestEngine, BacktestResult};
use crate::report::{save_equity_csv, save_fills_csv, save_trades_csv};
use crate::strategy::rsi_reversion::RsiReversionStrategy;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

//downloads candles and stores them in the cache directory
pub fn download_bars(
    provider: &dyn MarketDataProvider,
    instrument: &str,
    granularity: Granularity,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    data_dir: &Path,
) -> Result<(Vec<Bar>, PathBuf)> {
    let request = CandleRequest::new(instrument, granularity, start, end)?;
    let bars = provider
        .fetch_bars(&request)
        .context(format!("Failed to fetch candles for {}", instrument))?;

    let path = cache_path(data_dir, instrument, granularity, start, end);
    save_csv(&bars, &path)?;
    info!(bars = bars.len(), path = %path.display(), "saved candles");

    Ok((bars, path))
}

//bars for a run: the configured csv if there is one, otherwise the provider
//a configuration that cannot be traded fails here, before any request
pub fn load_bars(
    config: &BacktestConfiguration,
    provider: Option<&dyn MarketDataProvider>,
    now: DateTime<Utc>,
) -> Result<Vec<Bar>> {
    config.validate()?;
    let (start, end) = config.resolve_range(now)?;

    let bars = match (&config.data_path, provider) {
        (Some(path), _) => {
            info!(path = %path.display(), "loading bars from csv");
            let bars = load_csv(path).context(format!("Failed to load data from {:?}", path))?;
            //only narrow the file when a range was asked for
            if config.start.is_some() || config.end.is_some() {
                bars.into_iter()
                    .filter(|b| b.timestamp >= start && b.timestamp < end)
                    .collect()
            } else {
                bars
            }
        }
        (None, Some(provider)) => {
            download_bars(
                provider,
                &config.instrument,
                config.granularity,
                start,
                end,
                &config.data_dir,
            )?
            .0
        }
        (None, None) => anyhow::bail!("No data file given and no market data provider available"),
    };

    if bars.is_empty() {
        anyhow::bail!("No bars for {} in the requested range", config.instrument);
    }
    check_series(&bars)?;

    Ok(bars)
}

//runs the rsi reversion strategy over the bars
pub fn run_backtest(config: &BacktestConfiguration, bars: Vec<Bar>) -> Result<BacktestResult> {
    config.validate()?;
    let mut strategy = RsiReversionStrategy::new(config.rsi.clone())?;

    if bars.len() <= config.rsi.period {
        warn!(
            bars = bars.len(),
            period = config.rsi.period,
            "not enough bars to leave the rsi warm-up, no orders will be placed"
        );
    }

    let mut engine = BacktestEngine::new(config.engine_config(), bars, config.rsi.period);
    Ok(engine.run(&mut strategy, config.risk_free_rate))
}

//writes whichever csv exports the configuration asks for
pub fn write_outputs(config: &BacktestConfiguration, result: &BacktestResult) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    if let Some(path) = &config.output_equity_csv {
        save_equity_csv(&result.equity_curve, path)?;
        written.push(path.clone());
    }
    if let Some(path) = &config.output_trades_csv {
        save_trades_csv(&result.trades, path)?;
        written.push(path.clone());
    }
    if let Some(path) = &config.output_fills_csv {
        save_fills_csv(&result.fills, path)?;
        written.push(path.clone());
    }

    Ok(written)
}
