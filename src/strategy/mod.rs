pub mod rsi_reversion;
pub mod rule;

use crate::data::Bar;
use crate::engine::execution::OrderSide;

pub use rule::{decide, Signal};

//everything a strategy sees on one bar
#[derive(Debug, Clone, Copy)]
pub struct BarContext<'a> {
    pub bar: &'a Bar,

    //none while the indicator is warming up
    pub rsi: Option<f64>,

    //signed units currently held (positive long, negative short)
    pub position: i64,
}

//an order the strategy wants the engine to place at the next opportunity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderIntent {
    pub side: OrderSide,
    pub units: u32,
}

impl OrderIntent {
    //sizes a signal against the current position
    //buy covers a short if there is one, otherwise opens `units` long
    //sell exits a long if there is one, otherwise opens `units` short
    pub fn from_signal(signal: Signal, position: i64, units: u32) -> Option<Self> {
        let (side, size) = match signal {
            Signal::Hold => return None,
            Signal::Buy if position < 0 => (OrderSide::Buy, position.unsigned_abs()),
            Signal::Buy => (OrderSide::Buy, units as u64),
            Signal::Sell if position > 0 => (OrderSide::Sell, position.unsigned_abs()),
            Signal::Sell => (OrderSide::Sell, units as u64),
        };

        u32::try_from(size)
            .ok()
            .filter(|&units| units > 0)
            .map(|units| OrderIntent { side, units })
    }
}

//per-bar callback the backtest engine drives
pub trait Strategy {
    //called on each new bar after the indicator has been updated
    fn on_bar(&mut self, context: &BarContext) -> Option<OrderIntent>;

    //returns the strategy name
    fn name(&self) -> &str;
}
