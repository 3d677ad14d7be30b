pub mod tradable;

pub use tradable::{Instrument, InstrumentType};
