use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::Symbol;
use crate::ValidationError;

/// Bar width for intraday series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Interval {
    #[serde(rename = "1min")]
    OneMinute,
    #[default]
    #[serde(rename = "5min")]
    FiveMinutes,
    #[serde(rename = "15min")]
    FifteenMinutes,
    #[serde(rename = "30min")]
    ThirtyMinutes,
    #[serde(rename = "60min")]
    SixtyMinutes,
}

impl Interval {
    pub const ALL: [Self; 5] = [
        Self::OneMinute,
        Self::FiveMinutes,
        Self::FifteenMinutes,
        Self::ThirtyMinutes,
        Self::SixtyMinutes,
    ];

    /// Value of the upstream `interval` query parameter.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OneMinute => "1min",
            Self::FiveMinutes => "5min",
            Self::FifteenMinutes => "15min",
            Self::ThirtyMinutes => "30min",
            Self::SixtyMinutes => "60min",
        }
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1min" | "1m" => Ok(Self::OneMinute),
            "5min" | "5m" => Ok(Self::FiveMinutes),
            "15min" | "15m" => Ok(Self::FifteenMinutes),
            "30min" | "30m" => Ok(Self::ThirtyMinutes),
            "60min" | "60m" | "1h" => Ok(Self::SixtyMinutes),
            other => Err(ValidationError::InvalidInterval {
                value: other.to_owned(),
            }),
        }
    }
}

/// Which price series to fetch for a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesGranularity {
    Intraday(Interval),
    Daily,
    Weekly,
    Monthly,
}

impl SeriesGranularity {
    /// Upstream `function` selecting this series.
    pub const fn function(self) -> &'static str {
        match self {
            Self::Intraday(_) => "TIME_SERIES_INTRADAY",
            Self::Daily => "TIME_SERIES_DAILY",
            Self::Weekly => "TIME_SERIES_WEEKLY",
            Self::Monthly => "TIME_SERIES_MONTHLY",
        }
    }

    pub const fn interval(self) -> Option<Interval> {
        match self {
            Self::Intraday(interval) => Some(interval),
            _ => None,
        }
    }

    pub fn cache_key(self, symbol: &Symbol) -> String {
        match self {
            Self::Intraday(interval) => format!("intraday_{symbol}_{interval}"),
            Self::Daily => format!("daily_{symbol}"),
            Self::Weekly => format!("weekly_{symbol}"),
            Self::Monthly => format!("monthly_{symbol}"),
        }
    }

    /// Parse a CLI-style name; intraday takes the given interval.
    pub fn parse(value: &str, interval: Interval) -> Result<Self, ValidationError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "intraday" => Ok(Self::Intraday(interval)),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(ValidationError::InvalidGranularity {
                value: other.to_owned(),
            }),
        }
    }
}
