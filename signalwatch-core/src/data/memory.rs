//! In-memory data source.
//!
//! Serves fixed bars and quotes per symbol, with optional injected failures
//! and per-symbol latency. Used by tests and offline demos; it records how
//! many requests each symbol received so callers can assert on fetch order
//! and on quotes never being requested for non-qualifying symbols.

use super::interval::BarInterval;
use super::provider::{DataError, DataSource};
use crate::domain::{Bar, BarSeries, Quote};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct SymbolData {
    bars: Option<Result<Vec<Bar>, DataError>>,
    quote: Option<Result<Quote, DataError>>,
    latency: Duration,
}

/// Request counters for one symbol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestCounts {
    pub bars: usize,
    pub quotes: usize,
}

#[derive(Debug)]
pub struct MemorySource {
    symbols: HashMap<String, SymbolData>,
    counts: Mutex<HashMap<String, RequestCounts>>,
    available: bool,
}

impl Default for MemorySource {
    fn default() -> Self {
        Self {
            symbols: HashMap::new(),
            counts: Mutex::default(),
            available: true,
        }
    }
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<Bar>) -> Self {
        self.entry(symbol).bars = Some(Ok(bars));
        self
    }

    pub fn with_bars_error(mut self, symbol: &str, error: DataError) -> Self {
        self.entry(symbol).bars = Some(Err(error));
        self
    }

    pub fn with_quote(mut self, symbol: &str, price: f64, as_of: DateTime<Utc>) -> Self {
        self.entry(symbol).quote = Some(Ok(Quote { price, as_of }));
        self
    }

    pub fn with_quote_error(mut self, symbol: &str, error: DataError) -> Self {
        self.entry(symbol).quote = Some(Err(error));
        self
    }

    /// Delay every request for `symbol` by `latency`.
    pub fn with_latency(mut self, symbol: &str, latency: Duration) -> Self {
        self.entry(symbol).latency = latency;
        self
    }

    /// Report the source as unavailable (as a tripped circuit breaker would).
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn request_counts(&self, symbol: &str) -> RequestCounts {
        self.counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(symbol)
            .copied()
            .unwrap_or_default()
    }

    fn entry(&mut self, symbol: &str) -> &mut SymbolData {
        self.symbols.entry(symbol.to_string()).or_default()
    }

    fn record(&self, symbol: &str, update: impl FnOnce(&mut RequestCounts)) {
        let mut counts = self.counts.lock().unwrap_or_else(PoisonError::into_inner);
        update(counts.entry(symbol.to_string()).or_default());
    }

    fn lookup(&self, symbol: &str) -> Result<&SymbolData, DataError> {
        let data = self.symbols.get(symbol).ok_or_else(|| DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        })?;
        if !data.latency.is_zero() {
            std::thread::sleep(data.latency);
        }
        Ok(data)
    }
}

impl DataSource for MemorySource {
    fn name(&self) -> &str {
        "memory"
    }

    fn fetch_bars(
        &self,
        symbol: &str,
        _interval: BarInterval,
        _lookback_days: u32,
    ) -> Result<BarSeries, DataError> {
        self.record(symbol, |c| c.bars += 1);
        match &self.lookup(symbol)?.bars {
            Some(Ok(bars)) => Ok(BarSeries::new(bars.clone())),
            Some(Err(e)) => Err(e.clone()),
            None => Ok(BarSeries::default()),
        }
    }

    fn fetch_live_quote(&self, symbol: &str) -> Result<Quote, DataError> {
        self.record(symbol, |c| c.quotes += 1);
        match &self.lookup(symbol)?.quote {
            Some(result) => result.clone(),
            None => Err(DataError::NoQuote {
                symbol: symbol.to_string(),
            }),
        }
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar(open: f64, close: f64, volume: u64, minute: u32) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 6, 3, 4, minute, 0).unwrap(),
            open,
            high: open.max(close),
            low: open.min(close),
            close,
            volume,
        }
    }

    #[test]
    fn unknown_symbol_is_not_found() {
        let source = MemorySource::new();
        let err = source
            .fetch_bars("NOPE", BarInterval::FiveMinutes, 5)
            .unwrap_err();
        assert_eq!(err, DataError::SymbolNotFound { symbol: "NOPE".into() });
    }

    #[test]
    fn serves_bars_and_counts_requests() {
        let source = MemorySource::new().with_bars("ACC.NS", vec![bar(1.0, 2.0, 3, 5), bar(1.0, 1.5, 2, 0)]);
        let series = source
            .fetch_bars("ACC.NS", BarInterval::FiveMinutes, 5)
            .unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.latest().unwrap().volume, 3);
        assert_eq!(source.request_counts("ACC.NS"), RequestCounts { bars: 1, quotes: 0 });
    }

    #[test]
    fn missing_quote_is_no_quote() {
        let source = MemorySource::new().with_bars("ACC.NS", vec![]);
        let err = source.fetch_live_quote("ACC.NS").unwrap_err();
        assert_eq!(err, DataError::NoQuote { symbol: "ACC.NS".into() });
        assert_eq!(source.request_counts("ACC.NS").quotes, 1);
    }

    #[test]
    fn injected_errors_are_returned() {
        let source = MemorySource::new()
            .with_bars_error("TCS.NS", DataError::NetworkUnreachable("down".into()));
        assert!(matches!(
            source.fetch_bars("TCS.NS", BarInterval::FiveMinutes, 5),
            Err(DataError::NetworkUnreachable(_))
        ));
    }
}
