pub mod account;
pub mod ledger;
pub mod position;

pub use account::Account;
pub use ledger::{ClosedTrade, TradeLedger, TradeSide};
pub use position::Position;
