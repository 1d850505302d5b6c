use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Time-bucket size of a bar.
///
/// The string forms are stable: `daily` for the daily partition, and
/// `1min`, `5min`, `15min`, `30min`, `1hour` for intraday bars. The intraday
/// strings double as the `timeframe` discriminator column in the cache.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    #[serde(rename = "daily")]
    Daily,
    #[serde(rename = "1min")]
    Min1,
    #[serde(rename = "5min")]
    Min5,
    #[serde(rename = "15min")]
    Min15,
    #[serde(rename = "30min")]
    Min30,
    #[serde(rename = "1hour")]
    Hour1,
}

/// Error returned when parsing an unknown granularity string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown granularity: {0}")]
pub struct ParseGranularityError(pub String);

impl Granularity {
    /// All supported granularities, daily first.
    pub const ALL: [Granularity; 6] = [
        Granularity::Daily,
        Granularity::Min1,
        Granularity::Min5,
        Granularity::Min15,
        Granularity::Min30,
        Granularity::Hour1,
    ];

    /// Stable string form, also used as the storage discriminator.
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "daily",
            Granularity::Min1 => "1min",
            Granularity::Min5 => "5min",
            Granularity::Min15 => "15min",
            Granularity::Min30 => "30min",
            Granularity::Hour1 => "1hour",
        }
    }

    /// Whether bars of this granularity belong to the intraday partition.
    pub fn is_intraday(&self) -> bool {
        !matches!(self, Granularity::Daily)
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = ParseGranularityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Granularity::Daily),
            "1min" => Ok(Granularity::Min1),
            "5min" => Ok(Granularity::Min5),
            "15min" => Ok(Granularity::Min15),
            "30min" => Ok(Granularity::Min30),
            "1hour" => Ok(Granularity::Hour1),
            other => Err(ParseGranularityError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_round_trip() {
        for granularity in Granularity::ALL {
            let parsed: Granularity = granularity.as_str().parse().unwrap();
            assert_eq!(parsed, granularity);
        }
    }

    #[test]
    fn test_unknown_string_is_rejected() {
        let err = "2min".parse::<Granularity>().unwrap_err();
        assert_eq!(err, ParseGranularityError("2min".to_string()));
    }

    #[test]
    fn test_daily_is_not_intraday() {
        assert!(!Granularity::Daily.is_intraday());
        assert!(Granularity::Min15.is_intraday());
        assert!(Granularity::Hour1.is_intraday());
    }

    #[test]
    fn test_serde_uses_stable_strings() {
        let json = serde_json::to_string(&Granularity::Min15).unwrap();
        assert_eq!(json, "\"15min\"");
        let back: Granularity = serde_json::from_str("\"1hour\"").unwrap();
        assert_eq!(back, Granularity::Hour1);
    }
}
