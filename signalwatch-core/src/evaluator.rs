//! Signal evaluation: the green-candle / rising-volume rule.
//!
//! A symbol qualifies when its latest bar closed above its open on higher
//! volume than the bar before. Only then is a live quote requested; the row is
//! WATCHING while the live price holds at or above the candle's open and SELL
//! once it trades below it.
//!
//! Every comparison is strict and uses full precision. Rounding is applied to
//! the emitted row only.

use crate::data::DataError;
use crate::domain::{round2, Bar, BarSeries, Quote, Signal, SignalResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One-line description of the rule, shown above result tables.
pub const RULE_CAPTION: &str =
    "Green candle + volume > previous -> WATCHING. Falls below open -> SELL.";

/// Why a symbol produced no row this pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Fewer than two bars (newly listed, data gap, market not open yet).
    InsufficientData { bars: usize },
    /// Latest bar is not a green candle on rising volume.
    NotQualified,
}

/// Outcome of evaluating one symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Signal(SignalResult),
    Skip(SkipReason),
}

impl Evaluation {
    pub fn into_signal(self) -> Option<SignalResult> {
        match self {
            Evaluation::Signal(row) => Some(row),
            Evaluation::Skip(_) => None,
        }
    }
}

/// Green candle with rising volume: `close > open` and `volume > prev.volume`.
pub fn qualifies(prev: &Bar, latest: &Bar) -> bool {
    latest.is_green() && latest.volume > prev.volume
}

/// SELL when the live price is strictly below the candle's open.
pub fn decide_signal(candle_open: f64, live_price: f64) -> Signal {
    if live_price < candle_open {
        Signal::Sell
    } else {
        Signal::Watching
    }
}

/// Evaluate one symbol.
///
/// `fetch_quote` is called at most once, and only for a qualifying series.
/// Its error is returned unchanged so the caller can attribute it to the
/// symbol; skips are not errors.
pub fn evaluate<F>(
    symbol: &str,
    series: &BarSeries,
    fetch_quote: F,
    checked_at: DateTime<Utc>,
) -> Result<Evaluation, DataError>
where
    F: FnOnce() -> Result<Quote, DataError>,
{
    let Some((prev, latest)) = series.last_two() else {
        return Ok(Evaluation::Skip(SkipReason::InsufficientData {
            bars: series.len(),
        }));
    };

    if !qualifies(prev, latest) {
        return Ok(Evaluation::Skip(SkipReason::NotQualified));
    }

    let quote = fetch_quote()?;
    if !quote.price.is_finite() {
        return Err(DataError::NoQuote {
            symbol: symbol.to_string(),
        });
    }

    if quote.as_of < latest.timestamp {
        debug!(
            symbol,
            quote_as_of = %quote.as_of,
            bar_at = %latest.timestamp,
            "live quote predates the latest bar"
        );
    }

    Ok(Evaluation::Signal(SignalResult {
        symbol: symbol.to_string(),
        signal: decide_signal(latest.open, quote.price),
        candle_open: round2(latest.open),
        live_price: round2(quote.price),
        volume: latest.volume,
        prev_volume: prev.volume,
        checked_at,
    }))
}
