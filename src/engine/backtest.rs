use crate::data::Bar;
use crate::engine::execution::{ExecutionEngine, Fill, OrderSide};
use crate::indicator::Rsi;
use crate::metrics::{calculate_equity_curve, EquityPoint, SummaryMetrics};
use crate::portfolio::{Account, ClosedTrade};
use crate::strategy::{BarContext, OrderIntent, Strategy};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

//result of a backtest
#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub strategy: String,
    pub summary: SummaryMetrics,
    pub equity_curve: Vec<EquityPoint>,
    pub fills: Vec<Fill>,
    pub trades: Vec<ClosedTrade>,
}

//configuration for a backtest
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_balance: f64,
    pub commission_per_unit: f64,

    //close any open position at the last close
    pub flatten_on_finish: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_balance: 100000.0,
            commission_per_unit: 0.0,
            flatten_on_finish: true,
        }
    }
}

//main backtest engine
pub struct BacktestEngine {
    config: BacktestConfig,
    bars: Vec<Bar>,
    rsi: Rsi,
    account: Account,
    execution: ExecutionEngine,
    equity_history: Vec<(DateTime<Utc>, f64, i64)>,
}

impl BacktestEngine {
    //creates a new backtest engine over time-ordered bars
    pub fn new(config: BacktestConfig, bars: Vec<Bar>, rsi_period: usize) -> Self {
        let account = Account::new(config.initial_balance);
        let execution = ExecutionEngine::new(config.commission_per_unit);

        BacktestEngine {
            config,
            bars,
            rsi: Rsi::new(rsi_period),
            account,
            execution,
            equity_history: Vec::new(),
        }
    }

    //runs the backtest with the given strategy
    //orders produced on a bar fill at the next bar's open
    pub fn run(&mut self, strategy: &mut dyn Strategy, risk_free_rate: f64) -> BacktestResult {
        info!(
            strategy = strategy.name(),
            bars = self.bars.len(),
            "running backtest"
        );

        for i in 0..self.bars.len() {
            let bar = &self.bars[i];

            //orders from the previous bar
            for fill in self.execution.process_orders(bar.timestamp, bar.open) {
                debug!(time = %fill.timestamp, units = fill.units, price = fill.fill_price, "fill");
                self.account.process_fill(fill);
            }

            let rsi = self.rsi.update(bar.close);
            let context = BarContext {
                bar,
                rsi,
                position: self.account.net_units(),
            };

            if let Some(OrderIntent { side, units }) = strategy.on_bar(&context) {
                self.execution.market_order(bar.timestamp, units, side, rsi);
            }

            self.account.update_equity(bar.close);
            self.equity_history
                .push((bar.timestamp, self.account.equity, self.account.net_units()));
        }

        self.finish();
        self.build_result(strategy.name(), risk_free_rate)
    }

    //settles what is left after the last bar at its close
    fn finish(&mut self) {
        let last_bar = match self.bars.last() {
            Some(bar) => bar,
            None => return,
        };

        //no next open exists for the final bar's orders
        for fill in self
            .execution
            .process_orders(last_bar.timestamp, last_bar.close)
        {
            self.account.process_fill(fill);
        }

        if self.config.flatten_on_finish && !self.account.position.is_flat() {
            let units = self.account.net_units();
            let side = if units > 0 {
                OrderSide::Sell
            } else {
                OrderSide::Buy
            };
            info!(units, price = last_bar.close, "closing open position at end of data");

            let closing_units = u32::try_from(units.unsigned_abs()).unwrap_or(u32::MAX);
            self.execution
                .market_order(last_bar.timestamp, closing_units, side, None);
            for fill in self
                .execution
                .process_orders(last_bar.timestamp, last_bar.close)
            {
                self.account.process_fill(fill);
            }
        }

        self.account.update_equity(last_bar.close);

        //final point reflects settlement
        if let Some(last) = self.equity_history.last_mut() {
            last.1 = self.account.equity;
            last.2 = self.account.net_units();
        }
    }

    fn build_result(&self, strategy: &str, risk_free_rate: f64) -> BacktestResult {
        let equity_curve = calculate_equity_curve(&self.equity_history, self.config.initial_balance);
        let fills = self.account.trade_log.clone();
        let trades = self.account.ledger.closed_trades().to_vec();

        let summary = SummaryMetrics::from_backtest(
            &equity_curve,
            &trades,
            fills.len(),
            self.account.total_fees,
            self.config.initial_balance,
            risk_free_rate,
        );

        BacktestResult {
            strategy: strategy.to_string(),
            summary,
            equity_curve,
            fills,
            trades,
        }
    }

    //returns a reference to the account
    pub fn account(&self) -> &Account {
        &self.account
    }
}
