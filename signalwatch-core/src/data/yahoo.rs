//! Yahoo Finance data provider.
//!
//! Both operations go through the v8 chart API:
//! - bars: `range={n}d&interval={interval}` over the lookback window
//! - live quote: `meta.regularMarketPrice` from a one-day, one-minute request,
//!   which is refreshed by Yahoo ahead of the bar close
//!
//! Handles retries with exponential backoff, per-request timeouts, HTTP status
//! mapping, and the shared circuit breaker. Yahoo has no official API and is
//! subject to unannounced format changes; those surface as
//! `DataError::ResponseFormatChanged` for the affected symbol only.

use super::circuit_breaker::CircuitBreaker;
use super::interval::BarInterval;
use super::provider::{DataError, DataSource};
use crate::domain::{Bar, BarSeries, Quote};
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";

/// Yahoo Finance v8 chart API response.
#[derive(Debug, Deserialize)]
pub(crate) struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    regular_market_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteColumns>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QuoteColumns {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

/// Longest server-requested `Retry-After` honoured before the next attempt.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(10);

/// Backoff before retry `attempt` (1-based): exponential from `base`,
/// stretched to a server `Retry-After` capped at [`MAX_RETRY_AFTER`].
fn retry_delay(base: Duration, attempt: u32, retry_after: Option<Duration>) -> Duration {
    let backoff = base * 2u32.pow(attempt.saturating_sub(1));
    match retry_after {
        Some(wait) => backoff.max(wait.min(MAX_RETRY_AFTER)),
        None => backoff,
    }
}

/// Yahoo Finance data provider.
pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    /// Build a provider whose every HTTP request is bounded by `timeout`.
    pub fn new(circuit_breaker: Arc<CircuitBreaker>, timeout: Duration) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout,
            max_retries: 2,
            base_delay: Duration::from_millis(500),
        })
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Point the provider at another host (mirrors, local test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// `{base}/v8/finance/chart/{symbol}` with the symbol percent-encoded.
    fn chart_url(&self, symbol: &str) -> Result<reqwest::Url, DataError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| DataError::InvalidRequest(format!("bad base url '{}': {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| DataError::InvalidRequest(format!("bad base url '{}'", self.base_url)))?
            .pop_if_empty()
            .extend(["v8", "finance", "chart", symbol]);
        Ok(url)
    }

    /// Execute a chart request with retry and circuit breaker logic.
    fn get_chart(&self, symbol: &str, query: &[(&str, String)]) -> Result<ChartResponse, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let url = self.chart_url(symbol)?;
        let mut last_error = None;
        let mut retry_after = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = retry_delay(self.base_delay, attempt, retry_after.take());
                debug!(symbol, attempt, ?delay, "retrying chart request");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(url.clone()).query(query).send() {
                Ok(resp) => resp,
                Err(e) => {
                    // Transport failures count toward the breaker like 5xx/429.
                    self.circuit_breaker.record_failure();
                    // A timeout already cost a full budget; fail the symbol rather than retry.
                    if e.is_timeout() {
                        return Err(DataError::Timeout {
                            symbol: symbol.to_string(),
                            secs: self.timeout.as_secs(),
                        });
                    }
                    if e.is_connect() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            };

            let status = resp.status();

            if status == StatusCode::FORBIDDEN {
                self.circuit_breaker.trip();
                return Err(DataError::CircuitBreakerTripped);
            }

            if status == StatusCode::NOT_FOUND {
                return Err(DataError::SymbolNotFound {
                    symbol: symbol.to_string(),
                });
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let wait_secs = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok());
                warn!(symbol, retry_after = ?wait_secs, "rate limited by Yahoo");
                retry_after = wait_secs.map(Duration::from_secs);
                last_error = Some(DataError::RateLimited {
                    retry_after_secs: wait_secs.unwrap_or(60),
                });
                continue;
            }

            if !status.is_success() {
                self.circuit_breaker.record_failure();
                last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                continue;
            }

            let chart: ChartResponse = resp.json().map_err(|e| {
                if e.is_timeout() {
                    self.circuit_breaker.record_failure();
                    DataError::Timeout {
                        symbol: symbol.to_string(),
                        secs: self.timeout.as_secs(),
                    }
                } else {
                    DataError::ResponseFormatChanged(format!(
                        "failed to parse response for {symbol}: {e}"
                    ))
                }
            })?;
            self.circuit_breaker.record_success();
            return Ok(chart);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }

    /// Unwrap the single result entry, mapping Yahoo's error envelope.
    fn first_result(symbol: &str, resp: ChartResponse) -> Result<ChartData, DataError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => {
                DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))
    }

    /// Parse a chart response into a bar series.
    ///
    /// Rows missing open, close, or volume (halts, the pre-open slot) are
    /// dropped. A response without timestamps yields an empty series.
    pub(crate) fn parse_bars(symbol: &str, resp: ChartResponse) -> Result<BarSeries, DataError> {
        let data = Self::first_result(symbol, resp)?;

        let Some(timestamps) = data.timestamp else {
            return Ok(BarSeries::default());
        };

        let columns = data
            .indicators
            .and_then(|i| i.quote.into_iter().next())
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let mut bars = Vec::with_capacity(timestamps.len());

        for (i, &ts) in timestamps.iter().enumerate() {
            let timestamp = DateTime::<Utc>::from_timestamp(ts, 0).ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
            })?;

            let open = columns.open.get(i).copied().flatten();
            let close = columns.close.get(i).copied().flatten();
            let volume = columns.volume.get(i).copied().flatten();

            let (Some(open), Some(close), Some(volume)) = (open, close, volume) else {
                continue;
            };

            let high = columns
                .high
                .get(i)
                .copied()
                .flatten()
                .unwrap_or_else(|| open.max(close));
            let low = columns
                .low
                .get(i)
                .copied()
                .flatten()
                .unwrap_or_else(|| open.min(close));

            let bar = Bar {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            };
            if !bar.is_sane() {
                debug!(symbol, ts, "dropping bar with non-finite or non-positive prices");
                continue;
            }
            bars.push(bar);
        }

        Ok(BarSeries::new(bars))
    }

    /// Parse the live price out of the chart metadata.
    pub(crate) fn parse_quote(symbol: &str, resp: ChartResponse) -> Result<Quote, DataError> {
        let data = Self::first_result(symbol, resp)?;
        let meta = data.meta.ok_or_else(|| DataError::NoQuote {
            symbol: symbol.to_string(),
        })?;

        let price = meta
            .regular_market_price
            .filter(|p| p.is_finite())
            .ok_or_else(|| DataError::NoQuote {
                symbol: symbol.to_string(),
            })?;

        let as_of = meta
            .regular_market_time
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .unwrap_or_else(Utc::now);

        Ok(Quote { price, as_of })
    }
}

impl DataSource for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch_bars(
        &self,
        symbol: &str,
        interval: BarInterval,
        lookback_days: u32,
    ) -> Result<BarSeries, DataError> {
        if !interval.accepts_lookback(lookback_days) {
            return Err(DataError::InvalidRequest(format!(
                "{lookback_days}d lookback is not available for {interval} bars"
            )));
        }

        let query = [
            ("range", format!("{lookback_days}d")),
            ("interval", interval.as_str().to_string()),
            ("includePrePost", "false".to_string()),
        ];
        let chart = self.get_chart(symbol, &query)?;
        let series = Self::parse_bars(symbol, chart)?;
        debug!(symbol, bars = series.len(), %interval, "fetched bars");
        Ok(series)
    }

    fn fetch_live_quote(&self, symbol: &str) -> Result<Quote, DataError> {
        let query = [
            ("range", "1d".to_string()),
            ("interval", "1m".to_string()),
        ];
        let chart = self.get_chart(symbol, &query)?;
        Self::parse_quote(symbol, chart)
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}
