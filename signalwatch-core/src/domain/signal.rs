//! Signal rows and the per-pass result set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Two-state signal for a qualifying symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Signal {
    /// Live price has not fallen below the qualifying candle's open.
    Watching,
    /// Live price has fallen below the qualifying candle's open.
    Sell,
}

impl Signal {
    pub fn label(self) -> &'static str {
        match self {
            Signal::Watching => "WATCHING",
            Signal::Sell => "SELL",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Signal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "WATCHING" => Ok(Signal::Watching),
            "SELL" => Ok(Signal::Sell),
            other => Err(format!("unknown signal '{other}' (expected WATCHING or SELL)")),
        }
    }
}

/// One output row: a symbol that qualified during a pass.
///
/// `candle_open` and `live_price` are rounded to two decimals; every comparison
/// that produced `signal` used the unrounded values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalResult {
    pub symbol: String,
    pub signal: Signal,
    pub candle_open: f64,
    pub live_price: f64,
    pub volume: u64,
    pub prev_volume: u64,
    pub checked_at: DateTime<Utc>,
}

/// Round to two fractional digits (half away from zero).
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Ordered rows produced by one pass, in watchlist order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    rows: Vec<SignalResult>,
}

impl ResultSet {
    pub fn new(rows: Vec<SignalResult>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[SignalResult] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SignalResult> {
        self.rows.iter()
    }

    /// Number of rows carrying the given signal.
    pub fn count(&self, signal: Signal) -> usize {
        self.rows.iter().filter(|r| r.signal == signal).count()
    }
}

impl FromIterator<SignalResult> for ResultSet {
    fn from_iter<I: IntoIterator<Item = SignalResult>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a SignalResult;
    type IntoIter = std::slice::Iter<'a, SignalResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
