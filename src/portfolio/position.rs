use serde::{Deserialize, Serialize};

//net position in the traded instrument
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    //net units (positive for long, negative for short, 0 for flat)
    pub net_units: i64,

    //average entry price
    pub avg_entry_price: f64,

    //realized pnl from closed units
    pub realized_pnl: f64,
}

impl Position {
    //creates a new flat position
    pub fn new() -> Self {
        Self::default()
    }

    //calculates unrealized pnl at a given price
    pub fn unrealized_pnl(&self, current_price: f64) -> f64 {
        if self.net_units == 0 {
            return 0.0;
        }
        (current_price - self.avg_entry_price) * self.net_units as f64
    }

    //returns true if the position is flat (no open position)
    pub fn is_flat(&self) -> bool {
        self.net_units == 0
    }

    //returns true if the position is long
    pub fn is_long(&self) -> bool {
        self.net_units > 0
    }

    //returns true if the position is short
    pub fn is_short(&self) -> bool {
        self.net_units < 0
    }

    //updates position with a new fill
    //returns the realized pnl from this fill (if it closes/reduces position)
    pub fn update_with_fill(&mut self, fill_units: i64, fill_price: f64) -> f64 {
        //if position is flat, just establish new position
        if self.net_units == 0 {
            self.net_units = fill_units;
            self.avg_entry_price = fill_price;
            return 0.0;
        }

        let same_direction = self.net_units.signum() == fill_units.signum();

        if same_direction {
            //adding to position - update average entry price
            let total_units = self.net_units + fill_units;
            let total_cost = self.avg_entry_price * self.net_units as f64
                + fill_price * fill_units as f64;
            self.avg_entry_price = total_cost / total_units as f64;
            self.net_units = total_units;
            return 0.0;
        }

        //reducing or reversing position
        let close_units = fill_units.abs().min(self.net_units.abs());
        let price_diff = if self.net_units > 0 {
            fill_price - self.avg_entry_price
        } else {
            self.avg_entry_price - fill_price
        };

        let realized_pnl = price_diff * close_units as f64;
        self.realized_pnl += realized_pnl;
        self.net_units += fill_units;

        if self.net_units == 0 {
            self.avg_entry_price = 0.0;
        } else if self.net_units.signum() == fill_units.signum() {
            //reversed through flat, remainder opened at the fill price
            self.avg_entry_price = fill_price;
        }

        realized_pnl
    }

    //returns the notional value of the position
    pub fn notional_value(&self, current_price: f64) -> f64 {
        current_price * self.net_units.abs() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn adding_averages_entry() {
        let mut position = Position::new();
        position.update_with_fill(1, 1.10);
        position.update_with_fill(3, 1.20);

        assert_eq!(position.net_units, 4);
        assert_relative_eq!(position.avg_entry_price, 1.175, epsilon = 1e-12);
        assert_relative_eq!(position.unrealized_pnl(1.275), 0.4, epsilon = 1e-12);
        assert_relative_eq!(position.notional_value(1.5), 6.0);
    }

    #[test]
    fn closing_long_realizes_pnl() {
        let mut position = Position::new();
        position.update_with_fill(10, 2.0);
        let pnl = position.update_with_fill(-4, 2.5);

        assert_relative_eq!(pnl, 2.0);
        assert_eq!(position.net_units, 6);
        assert_relative_eq!(position.avg_entry_price, 2.0);
    }

    #[test]
    fn reversing_short_to_long() {
        let mut position = Position::new();
        position.update_with_fill(-2, 3.0);
        assert!(position.is_short());

        let pnl = position.update_with_fill(5, 2.0);
        assert_relative_eq!(pnl, 2.0);
        assert!(position.is_long());
        assert_eq!(position.net_units, 3);
        assert_relative_eq!(position.avg_entry_price, 2.0);
    }

    #[test]
    fn flat_after_full_close() {
        let mut position = Position::new();
        position.update_with_fill(1, 1.0);
        position.update_with_fill(-1, 0.5);
        assert!(position.is_flat());
        assert_eq!(position.avg_entry_price, 0.0);
        assert_relative_eq!(position.realized_pnl, -0.5);
    }
}
