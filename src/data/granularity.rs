use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//candle granularities accepted by the oanda candles endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    S5,
    S10,
    S15,
    S30,
    M1,
    M2,
    M4,
    M5,
    M10,
    M15,
    M30,
    H1,
    H2,
    H3,
    H4,
    H6,
    H8,
    H12,
    D,
    W,
    #[serde(rename = "M")]
    Month,
}

impl Granularity {
    pub const ALL: [Granularity; 21] = [
        Granularity::S5,
        Granularity::S10,
        Granularity::S15,
        Granularity::S30,
        Granularity::M1,
        Granularity::M2,
        Granularity::M4,
        Granularity::M5,
        Granularity::M10,
        Granularity::M15,
        Granularity::M30,
        Granularity::H1,
        Granularity::H2,
        Granularity::H3,
        Granularity::H4,
        Granularity::H6,
        Granularity::H8,
        Granularity::H12,
        Granularity::D,
        Granularity::W,
        Granularity::Month,
    ];

    //code sent in the `granularity` query parameter
    pub fn code(&self) -> &'static str {
        match self {
            Granularity::S5 => "S5",
            Granularity::S10 => "S10",
            Granularity::S15 => "S15",
            Granularity::S30 => "S30",
            Granularity::M1 => "M1",
            Granularity::M2 => "M2",
            Granularity::M4 => "M4",
            Granularity::M5 => "M5",
            Granularity::M10 => "M10",
            Granularity::M15 => "M15",
            Granularity::M30 => "M30",
            Granularity::H1 => "H1",
            Granularity::H2 => "H2",
            Granularity::H3 => "H3",
            Granularity::H4 => "H4",
            Granularity::H6 => "H6",
            Granularity::H8 => "H8",
            Granularity::H12 => "H12",
            Granularity::D => "D",
            Granularity::W => "W",
            Granularity::Month => "M",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Granularity {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        //"M" is monthly, "m" would be ambiguous so matching is case-sensitive
        Granularity::ALL
            .iter()
            .copied()
            .find(|g| g.code() == s)
            .ok_or_else(|| ConfigError::InvalidGranularity(s.to_string()))
    }
}
