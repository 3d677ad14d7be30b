use serde::{Deserialize, Serialize};
use std::fmt;

//asset class reported by the account instruments endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InstrumentType {
    Currency,
    Cfd,
    Metal,
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstrumentType::Currency => "CURRENCY",
            InstrumentType::Cfd => "CFD",
            InstrumentType::Metal => "METAL",
        };
        f.write_str(s)
    }
}

//represents an instrument the account may trade (eg EUR_USD, NATGAS_USD)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    //identifier used in candle requests
    pub name: String,

    //human readable name (eg EUR/USD)
    pub display_name: String,

    #[serde(rename = "type")]
    pub instrument_type: InstrumentType,

    //location of the pip as a power of ten (eg -4 for EUR_USD)
    #[serde(default)]
    pub pip_location: i32,
}

impl Instrument {
    //price value of one pip
    pub fn pip_size(&self) -> f64 {
        10f64.powi(self.pip_location)
    }

    //one line of the numbered instrument listing (position is 1-based)
    pub fn listing_line(&self, position: usize) -> String {
        format!(
            "  {}. {} ({}) [Type: {}]",
            position, self.name, self.display_name, self.instrument_type
        )
    }
}
