//! Bar widths a series can carry.

use crate::domain::error::TapedeckError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The closed set of supported bar widths. A series declares exactly one and
/// never mixes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "15s")]
    S15,
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "1d")]
    D1,
    #[serde(rename = "1w")]
    W1,
}

impl Resolution {
    /// Width of one bar in seconds.
    pub fn seconds(&self) -> u64 {
        match self {
            Resolution::S15 => 15,
            Resolution::M1 => 60,
            Resolution::M5 => 60 * 5,
            Resolution::H1 => 60 * 60,
            Resolution::D1 => 60 * 60 * 24,
            Resolution::W1 => 60 * 60 * 24 * 7,
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.seconds() as i64)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Resolution::S15 => "15s",
            Resolution::M1 => "1m",
            Resolution::M5 => "5m",
            Resolution::H1 => "1h",
            Resolution::D1 => "1d",
            Resolution::W1 => "1w",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for Resolution {
    type Err = TapedeckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "15s" => Ok(Resolution::S15),
            "1m" => Ok(Resolution::M1),
            "5m" => Ok(Resolution::M5),
            "1h" => Ok(Resolution::H1),
            "1d" => Ok(Resolution::D1),
            "1w" => Ok(Resolution::W1),
            other => Err(TapedeckError::Usage {
                reason: format!("unknown resolution '{}', expected one of 15s/1m/5m/1h/1d/1w", other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_per_resolution() {
        assert_eq!(Resolution::S15.seconds(), 15);
        assert_eq!(Resolution::M1.seconds(), 60);
        assert_eq!(Resolution::M5.seconds(), 300);
        assert_eq!(Resolution::H1.seconds(), 3_600);
        assert_eq!(Resolution::D1.seconds(), 86_400);
        assert_eq!(Resolution::W1.seconds(), 604_800);
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for res in [
            Resolution::S15,
            Resolution::M1,
            Resolution::M5,
            Resolution::H1,
            Resolution::D1,
            Resolution::W1,
        ] {
            assert_eq!(res.to_string().parse::<Resolution>().unwrap(), res);
        }
    }

    #[test]
    fn unknown_label_is_a_usage_error() {
        let err = "3m".parse::<Resolution>().unwrap_err();
        assert!(matches!(err, TapedeckError::Usage { .. }));
    }
}
