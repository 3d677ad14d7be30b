use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use rsilab::pipeline::{download_bars, load_bars, run_backtest, write_outputs};
use rsilab::prelude::*;
use rsilab::report::{write_instruments, write_summary};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "rsilab")]
#[command(about = "Backtests an RSI mean-reversion rule on OANDA candles", long_about = None)]
struct Cli {
    //env file holding OANDA_API_KEY / OANDA_ACCOUNT_ID (default .env if present)
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    //emit logs as json lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    //list the instruments the account can trade
    Instruments,

    //download candles into the data directory
    Fetch {
        //instrument name (eg EUR_USD, NATGAS_USD)
        #[arg(long)]
        instrument: String,

        //candle granularity (eg M15, H4, D)
        #[arg(long, default_value = "H1")]
        granularity: Granularity,

        //start date or rfc3339 time (default: 7 days before --to)
        #[arg(long, value_parser = parse_time)]
        from: Option<DateTime<Utc>>,

        //end date or rfc3339 time (default: now)
        #[arg(long, value_parser = parse_time)]
        to: Option<DateTime<Utc>>,

        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },

    //run a backtest
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    //json configuration; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    instrument: Option<String>,

    #[arg(long)]
    granularity: Option<Granularity>,

    #[arg(long, value_parser = parse_time)]
    from: Option<DateTime<Utc>>,

    #[arg(long, value_parser = parse_time)]
    to: Option<DateTime<Utc>>,

    //read candles from this csv instead of calling the api
    #[arg(long)]
    data: Option<PathBuf>,

    #[arg(long)]
    data_dir: Option<PathBuf>,

    //rsi lookback period
    #[arg(long)]
    rsi_period: Option<usize>,

    //buy at or below this rsi
    #[arg(long)]
    oversold: Option<f64>,

    //sell at or above this rsi
    #[arg(long)]
    overbought: Option<f64>,

    //close longs at or above this rsi (default: --overbought)
    #[arg(long)]
    exit_long: Option<f64>,

    //cover shorts at or below this rsi (default: --oversold)
    #[arg(long)]
    exit_short: Option<f64>,

    //units per order
    #[arg(long)]
    units: Option<u32>,

    //largest absolute position (allows stacked entries when above --units)
    #[arg(long)]
    max_units: Option<u32>,

    #[arg(long)]
    initial_balance: Option<f64>,

    //commission per unit per fill
    #[arg(long)]
    commission: Option<f64>,

    //annual risk-free rate for the daily sharpe
    #[arg(long)]
    risk_free_rate: Option<f64>,

    //leave the final position open instead of closing it at the last close
    #[arg(long)]
    keep_open: bool,

    //output options
    #[arg(long)]
    output_equity_csv: Option<PathBuf>,

    #[arg(long)]
    output_trades_csv: Option<PathBuf>,

    #[arg(long)]
    output_fills_csv: Option<PathBuf>,

    //write the effective configuration to this json file
    #[arg(long)]
    save_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    rsilab::logging::init_logging(cli.log_json);

    match cli.command {
        Commands::Instruments => list_instruments(cli.env_file),
        Commands::Fetch {
            instrument,
            granularity,
            from,
            to,
            data_dir,
        } => fetch(cli.env_file, instrument, granularity, from, to, data_dir),
        Commands::Run(args) => run(cli.env_file, args),
    }
}

fn client(env_file: Option<PathBuf>) -> Result<OandaClient> {
    let config = OandaConfig::load(env_file.as_deref()).context("Failed to load OANDA credentials")?;
    info!(account = %config.account_id, environment = ?config.environment, "using OANDA account");
    Ok(OandaClient::new(config)?)
}

fn list_instruments(env_file: Option<PathBuf>) -> Result<()> {
    let client = client(env_file)?;
    let instruments = client
        .list_instruments()
        .context("Error fetching instruments")?;

    let stdout = std::io::stdout();
    write_instruments(&mut stdout.lock(), &client.config().account_id, &instruments)?;
    Ok(())
}

fn fetch(
    env_file: Option<PathBuf>,
    instrument: String,
    granularity: Granularity,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
    data_dir: PathBuf,
) -> Result<()> {
    let range = BacktestConfiguration {
        instrument: instrument.clone(),
        granularity,
        start: from,
        end: to,
        ..BacktestConfiguration::default()
    };
    let (start, end) = range.resolve_range(Utc::now())?;

    let client = client(env_file)?;
    let (bars, path) = download_bars(&client, &instrument, granularity, start, end, &data_dir)?;

    println!(
        "Successfully fetched {} candles for {} at {} into {:?}",
        bars.len(),
        instrument,
        granularity,
        path
    );
    Ok(())
}

fn run(env_file: Option<PathBuf>, args: RunArgs) -> Result<()> {
    let config = build_configuration(&args)?;

    //degenerate thresholds and ranges fail before any request
    config.validate()?;

    if let Some(path) = &args.save_config {
        config.to_json_file(path)?;
        info!(path = %path.display(), "configuration saved");
    }

    let client = match config.data_path {
        Some(_) => None,
        None => Some(client(env_file)?),
    };
    let provider = client.as_ref().map(|c| c as &dyn MarketDataProvider);

    let bars = load_bars(&config, provider, Utc::now())?;
    info!(
        instrument = %config.instrument,
        bars = bars.len(),
        first = %bars[0].timestamp,
        last = %bars[bars.len() - 1].timestamp,
        "bars loaded"
    );
    info!(
        period = config.rsi.period,
        oversold = config.rsi.oversold,
        overbought = config.rsi.overbought,
        exit_long = config.rsi.exit_long_level(),
        exit_short = config.rsi.exit_short_level(),
        units = config.rsi.units,
        max_units = config.rsi.max_units,
        "strategy parameters"
    );

    let result = run_backtest(&config, bars)?;

    let stdout = std::io::stdout();
    write_summary(&mut stdout.lock(), &result)?;

    for path in write_outputs(&config, &result)? {
        println!("Saved {:?}", path);
    }

    Ok(())
}

fn build_configuration(args: &RunArgs) -> Result<BacktestConfiguration> {
    let mut config = match &args.config {
        Some(path) => BacktestConfiguration::from_json_file(path)
            .context(format!("Failed to load configuration from {:?}", path))?,
        None => BacktestConfiguration::default(),
    };

    if let Some(instrument) = &args.instrument {
        config.instrument = instrument.clone();
    }
    if let Some(granularity) = args.granularity {
        config.granularity = granularity;
    }
    if args.from.is_some() {
        config.start = args.from;
    }
    if args.to.is_some() {
        config.end = args.to;
    }
    if args.data.is_some() {
        config.data_path = args.data.clone();
    }
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(period) = args.rsi_period {
        config.rsi.period = period;
    }
    if let Some(oversold) = args.oversold {
        config.rsi.oversold = oversold;
    }
    if let Some(overbought) = args.overbought {
        config.rsi.overbought = overbought;
    }
    if args.exit_long.is_some() {
        config.rsi.exit_long = args.exit_long;
    }
    if args.exit_short.is_some() {
        config.rsi.exit_short = args.exit_short;
    }
    if let Some(units) = args.units {
        config.rsi.units = units;
        //a lone --units keeps single-entry sizing
        if args.max_units.is_none() && config.rsi.max_units < units {
            config.rsi.max_units = units;
        }
    }
    if let Some(max_units) = args.max_units {
        config.rsi.max_units = max_units;
    }
    if let Some(balance) = args.initial_balance {
        config.initial_balance = balance;
    }
    if let Some(commission) = args.commission {
        config.commission_per_unit = commission;
    }
    if let Some(rate) = args.risk_free_rate {
        config.risk_free_rate = rate;
    }
    if args.keep_open {
        config.flatten_on_finish = false;
    }
    if args.output_equity_csv.is_some() {
        config.output_equity_csv = args.output_equity_csv.clone();
    }
    if args.output_trades_csv.is_some() {
        config.output_trades_csv = args.output_trades_csv.clone();
    }
    if args.output_fills_csv.is_some() {
        config.output_fills_csv = args.output_fills_csv.clone();
    }

    Ok(config)
}

//accepts 2024-01-31 (midnight utc) or a full rfc3339 time
fn parse_time(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Ok(time.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("'{}' is neither YYYY-MM-DD nor an RFC3339 time", raw))
}
