use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

//order side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    //converts to quantity sign (Buy = +1, Sell = -1)
    pub fn to_qty_sign(&self) -> i64 {
        match self {
            OrderSide::Buy => 1,
            OrderSide::Sell => -1,
        }
    }
}

//a market order waiting for the next bar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub submitted_at: DateTime<Utc>,
    pub units: u32,
    pub side: OrderSide,

    //rsi on the bar that produced the order
    pub signal_rsi: Option<f64>,
}

impl Order {
    //returns the signed quantity (positive for buy, negative for sell)
    pub fn signed_units(&self) -> i64 {
        self.units as i64 * self.side.to_qty_sign()
    }
}

//represents a filled order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub id: u64,
    pub order_id: u64,
    pub timestamp: DateTime<Utc>,
    pub units: i64, //signed: positive for buy, negative for sell
    pub side: OrderSide,
    pub fill_price: f64,
    pub fees: f64,
    pub signal_rsi: Option<f64>,
}

impl Fill {
    pub fn from_order(
        fill_id: u64,
        order: &Order,
        timestamp: DateTime<Utc>,
        fill_price: f64,
        fees: f64,
    ) -> Self {
        Fill {
            id: fill_id,
            order_id: order.id,
            timestamp,
            units: order.signed_units(),
            side: order.side,
            fill_price,
            fees,
            signal_rsi: order.signal_rsi,
        }
    }

    //returns the notional value of the fill
    pub fn notional_value(&self) -> f64 {
        self.fill_price * self.units.abs() as f64
    }
}

//simulates market order execution
pub struct ExecutionEngine {
    next_order_id: u64,
    next_fill_id: u64,
    pending_orders: Vec<Order>,
    commission_per_unit: f64,
}

impl ExecutionEngine {
    pub fn new(commission_per_unit: f64) -> Self {
        ExecutionEngine {
            next_order_id: 1,
            next_fill_id: 1,
            pending_orders: Vec::new(),
            commission_per_unit,
        }
    }

    //creates and queues a market order, returning its id
    pub fn market_order(
        &mut self,
        submitted_at: DateTime<Utc>,
        units: u32,
        side: OrderSide,
        signal_rsi: Option<f64>,
    ) -> u64 {
        let order = Order {
            id: self.next_order_id,
            submitted_at,
            units,
            side,
            signal_rsi,
        };
        self.next_order_id += 1;
        self.pending_orders.push(order);
        self.next_order_id - 1
    }

    //fills every pending order at `price` (the open of the bar after submission)
    pub fn process_orders(&mut self, fill_time: DateTime<Utc>, price: f64) -> Vec<Fill> {
        let mut fills = Vec::with_capacity(self.pending_orders.len());

        for order in self.pending_orders.drain(..) {
            let fees = self.commission_per_unit * order.units as f64;
            fills.push(Fill::from_order(
                self.next_fill_id,
                &order,
                fill_time,
                price,
                fees,
            ));
            self.next_fill_id += 1;
        }

        fills
    }

    //returns the number of pending orders
    pub fn pending_order_count(&self) -> usize {
        self.pending_orders.len()
    }
}
