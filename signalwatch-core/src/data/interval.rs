//! Sampling intervals supported by the bar providers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Bar sampling interval.
///
/// Serialized with the provider's own spelling (`"5m"`, `"1d"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BarInterval {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "60m")]
    SixtyMinutes,
    #[serde(rename = "1d")]
    OneDay,
}

impl BarInterval {
    pub const ALL: [BarInterval; 6] = [
        BarInterval::OneMinute,
        BarInterval::FiveMinutes,
        BarInterval::FifteenMinutes,
        BarInterval::ThirtyMinutes,
        BarInterval::SixtyMinutes,
        BarInterval::OneDay,
    ];

    /// Query-string spelling used by the chart API.
    pub fn as_str(self) -> &'static str {
        match self {
            BarInterval::OneMinute => "1m",
            BarInterval::FiveMinutes => "5m",
            BarInterval::FifteenMinutes => "15m",
            BarInterval::ThirtyMinutes => "30m",
            BarInterval::SixtyMinutes => "60m",
            BarInterval::OneDay => "1d",
        }
    }

    /// Longest lookback (in days) the chart API serves for this interval.
    pub fn max_lookback_days(self) -> Option<u32> {
        match self {
            BarInterval::OneMinute => Some(7),
            BarInterval::FiveMinutes
            | BarInterval::FifteenMinutes
            | BarInterval::ThirtyMinutes => Some(60),
            BarInterval::SixtyMinutes => Some(730),
            BarInterval::OneDay => None,
        }
    }

    /// Whether `days` is a lookback the provider will honour.
    pub fn accepts_lookback(self, days: u32) -> bool {
        days >= 1 && self.max_lookback_days().map_or(true, |max| days <= max)
    }
}

impl Default for BarInterval {
    fn default() -> Self {
        BarInterval::FiveMinutes
    }
}

impl fmt::Display for BarInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BarInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        BarInterval::ALL
            .into_iter()
            .find(|i| i.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!("unknown interval '{s}'. Valid: 1m, 5m, 15m, 30m, 60m, 1d")
            })
    }
}
