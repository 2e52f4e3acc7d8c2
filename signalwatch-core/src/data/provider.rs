//! Data source trait and structured error types.
//!
//! The DataSource trait abstracts over where bars and quotes come from (Yahoo
//! Finance, in-memory fixtures) so the evaluator and the pass builder can be
//! exercised without the network.

use super::interval::BarInterval;
use crate::domain::{BarSeries, Quote};
use thiserror::Error;

/// Structured error types for data operations.
///
/// Every variant is a per-symbol failure: callers log it against the symbol and
/// move on to the next one.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("request for {symbol} timed out after {secs}s")]
    Timeout { symbol: String, secs: u64 },

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no live price available for {symbol}")]
    NoQuote { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("pass cancelled before this symbol was checked")]
    Cancelled,

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    /// Short category label for structured logs.
    pub fn category(&self) -> &'static str {
        match self {
            DataError::NetworkUnreachable(_) | DataError::Timeout { .. } => "network",
            DataError::RateLimited { .. } | DataError::CircuitBreakerTripped => "provider",
            DataError::ResponseFormatChanged(_) | DataError::NoQuote { .. } => "data",
            DataError::SymbolNotFound { .. } => "symbol",
            DataError::InvalidRequest(_) | DataError::Cancelled | DataError::Other(_) => "other",
        }
    }
}

/// Trait for market data sources.
///
/// Implementations must be shareable across threads: the pass builder may
/// evaluate symbols in parallel against one source.
pub trait DataSource: Send + Sync {
    /// Human-readable name of this source.
    fn name(&self) -> &str;

    /// Fetch recent bars for a symbol, oldest first.
    fn fetch_bars(
        &self,
        symbol: &str,
        interval: BarInterval,
        lookback_days: u32,
    ) -> Result<BarSeries, DataError>;

    /// Fetch a current price reading, potentially fresher than the bars.
    fn fetch_live_quote(&self, symbol: &str) -> Result<Quote, DataError>;

    /// Check if the source is currently accepting requests.
    fn is_available(&self) -> bool {
        true
    }
}

impl<T: DataSource + ?Sized> DataSource for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn fetch_bars(
        &self,
        symbol: &str,
        interval: BarInterval,
        lookback_days: u32,
    ) -> Result<BarSeries, DataError> {
        (**self).fetch_bars(symbol, interval, lookback_days)
    }

    fn fetch_live_quote(&self, symbol: &str) -> Result<Quote, DataError> {
        (**self).fetch_live_quote(symbol)
    }

    fn is_available(&self) -> bool {
        (**self).is_available()
    }
}
