use crate::engine::execution::Fill;
use crate::portfolio::ledger::TradeLedger;
use crate::portfolio::position::Position;

//simulated account trading a single instrument
#[derive(Debug, Clone)]
pub struct Account {
    //initial account balance
    pub initial_balance: f64,

    //current cash (includes realized pnl, subtracts fees)
    pub cash: f64,

    //current total equity (cash + unrealized pnl)
    pub equity: f64,

    //open position
    pub position: Position,

    //every fill in execution order
    pub trade_log: Vec<Fill>,

    //round trips per entry lot
    pub ledger: TradeLedger,

    //fees paid so far
    pub total_fees: f64,
}

impl Account {
    //creates a new account with initial balance
    pub fn new(initial_balance: f64) -> Self {
        Account {
            initial_balance,
            cash: initial_balance,
            equity: initial_balance,
            position: Position::new(),
            trade_log: Vec::new(),
            ledger: TradeLedger::new(),
            total_fees: 0.0,
        }
    }

    //processes a fill and updates the account
    pub fn process_fill(&mut self, fill: Fill) {
        self.cash -= fill.fees;
        self.total_fees += fill.fees;

        let realized_pnl = self.position.update_with_fill(fill.units, fill.fill_price);
        self.cash += realized_pnl;

        self.ledger.record(&fill);
        self.trade_log.push(fill);
    }

    //updates total equity at the current market price
    pub fn update_equity(&mut self, price: f64) {
        self.equity = self.cash + self.position.unrealized_pnl(price);
    }

    //signed units held
    pub fn net_units(&self) -> i64 {
        self.position.net_units
    }

    //returns the total return as a fraction of the initial balance
    pub fn total_return(&self) -> f64 {
        (self.equity - self.initial_balance) / self.initial_balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::execution::OrderSide;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};

    fn fill(units: i64, price: f64, fees: f64) -> Fill {
        Fill {
            id: 1,
            order_id: 1,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            units,
            side: if units > 0 {
                OrderSide::Buy
            } else {
                OrderSide::Sell
            },
            fill_price: price,
            fees,
            signal_rsi: None,
        }
    }

    #[test]
    fn round_trip_moves_cash_by_pnl_minus_fees() {
        let mut account = Account::new(1000.0);
        account.process_fill(fill(100, 1.10, 0.5));

        account.update_equity(1.15);
        assert_relative_eq!(account.equity, 1000.0 - 0.5 + 5.0, epsilon = 1e-9);

        account.process_fill(fill(-100, 1.20, 0.5));
        account.update_equity(1.30);

        assert!(account.position.is_flat());
        assert_relative_eq!(account.cash, 1009.0, epsilon = 1e-9);
        assert_relative_eq!(account.equity, account.cash);
        assert_relative_eq!(account.total_fees, 1.0);
        assert_relative_eq!(account.total_return(), 0.009, epsilon = 1e-12);
        assert_eq!(account.trade_log.len(), 2);
        assert_eq!(account.ledger.closed_trades().len(), 1);
    }
}
