//! One refresh pass: fetch, evaluate and collect every watchlist symbol.
//!
//! A pass never fails as a whole. Each symbol ends up in exactly one of
//! `results`, `skipped` or `failures`, and `results` keeps watchlist order in
//! both sequential and parallel mode.

use std::time::{Duration, Instant};

use chrono::{DateTime, SubsecRound, Utc};
use rayon::prelude::*;
use signalwatch_core::data::{BarInterval, DataError, DataSource};
use signalwatch_core::domain::{ResultSet, SignalResult};
use signalwatch_core::{evaluate, Clock, Evaluation, SkipReason};
use tracing::{debug, info, warn};

use crate::config::WatchConfig;

/// How a pass fetches data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassOptions {
    pub interval: BarInterval,
    pub lookback_days: u32,
    /// Evaluate symbols on the rayon pool instead of one after another.
    pub parallel: bool,
}

impl Default for PassOptions {
    fn default() -> Self {
        Self {
            interval: BarInterval::FiveMinutes,
            lookback_days: 5,
            parallel: false,
        }
    }
}

impl From<&WatchConfig> for PassOptions {
    fn from(config: &WatchConfig) -> Self {
        Self {
            interval: config.data.interval,
            lookback_days: config.data.lookback_days,
            parallel: config.data.parallel,
        }
    }
}

/// A symbol that could not be evaluated this pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolFailure {
    pub symbol: String,
    pub error: DataError,
}

/// Everything one pass produced.
#[derive(Debug, Clone)]
pub struct PassReport {
    pub results: ResultSet,
    pub failures: Vec<SymbolFailure>,
    pub skipped: Vec<(String, SkipReason)>,
    pub checked_at: DateTime<Utc>,
    pub elapsed: Duration,
}

impl PassReport {
    /// Symbols attempted this pass.
    pub fn total(&self) -> usize {
        self.results.len() + self.failures.len() + self.skipped.len()
    }

    /// Every symbol failed: the source is down, not just quiet.
    ///
    /// A cancelled pass is never systemic.
    pub fn is_systemic_failure(&self) -> bool {
        !self.was_cancelled() && !self.failures.is_empty() && self.failures.len() == self.total()
    }

    /// The pass stopped early because its progress sink asked it to.
    pub fn was_cancelled(&self) -> bool {
        self.failures.iter().any(|f| f.error == DataError::Cancelled)
    }

    /// One-line summary for status bars and logs.
    pub fn summary(&self) -> String {
        format!(
            "{} signals, {} skipped, {} failed of {} symbols in {:.1}s",
            self.results.len(),
            self.skipped.len(),
            self.failures.len(),
            self.total(),
            self.elapsed.as_secs_f64()
        )
    }
}

/// Progress callbacks for a pass.
///
/// Called from rayon worker threads in parallel mode, hence `Sync`.
pub trait PassProgress: Send + Sync {
    fn on_start(&self, symbol: &str, index: usize, total: usize);

    fn on_complete(
        &self,
        symbol: &str,
        index: usize,
        total: usize,
        outcome: &Result<Evaluation, DataError>,
    );

    fn on_pass_complete(&self, report: &PassReport);

    /// Polled before each symbol; `true` stops the pass and marks the
    /// symbols not yet started as [`DataError::Cancelled`].
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Reports nothing.
pub struct NoProgress;

impl PassProgress for NoProgress {
    fn on_start(&self, _symbol: &str, _index: usize, _total: usize) {}
    fn on_complete(
        &self,
        _symbol: &str,
        _index: usize,
        _total: usize,
        _outcome: &Result<Evaluation, DataError>,
    ) {
    }
    fn on_pass_complete(&self, _report: &PassReport) {}
}

/// Prints per-symbol progress to stderr, keeping stdout for the table.
pub struct StderrProgress;

impl PassProgress for StderrProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        eprintln!("[{}/{}] Checking {symbol}...", index + 1, total);
    }

    fn on_complete(
        &self,
        symbol: &str,
        _index: usize,
        _total: usize,
        outcome: &Result<Evaluation, DataError>,
    ) {
        match outcome {
            Ok(Evaluation::Signal(row)) => eprintln!("  {}: {symbol}", row.signal),
            Ok(Evaluation::Skip(_)) => eprintln!("  --: {symbol}"),
            Err(e) => eprintln!("  FAIL: {symbol}: {e}"),
        }
    }

    fn on_pass_complete(&self, report: &PassReport) {
        eprintln!("\nPass complete: {}", report.summary());
    }
}

/// Run one pass over `symbols`.
///
/// `checked_at` is read from `clock` once, truncated to whole seconds (the
/// precision every display and export format keeps), and stamped on every row.
pub fn build_result_set(
    symbols: &[String],
    source: &dyn DataSource,
    clock: &dyn Clock,
    options: &PassOptions,
    progress: &dyn PassProgress,
) -> PassReport {
    let started = Instant::now();
    let checked_at = clock.now().trunc_subsecs(0);
    let total = symbols.len();

    info!(
        source = source.name(),
        symbols = total,
        interval = %options.interval,
        parallel = options.parallel,
        "starting pass"
    );

    let outcomes: Vec<Result<Evaluation, DataError>> = if options.parallel {
        symbols
            .par_iter()
            .enumerate()
            .map(|(i, symbol)| {
                if progress.is_cancelled() {
                    return Err(DataError::Cancelled);
                }
                progress.on_start(symbol, i, total);
                let outcome = evaluate_symbol(symbol, source, options, checked_at);
                progress.on_complete(symbol, i, total, &outcome);
                outcome
            })
            .collect()
    } else {
        let mut outcomes = Vec::with_capacity(total);
        for (i, symbol) in symbols.iter().enumerate() {
            if progress.is_cancelled() {
                debug!(remaining = total - i, "pass cancelled");
                outcomes.extend(symbols[i..].iter().map(|_| Err(DataError::Cancelled)));
                break;
            }
            progress.on_start(symbol, i, total);
            let outcome = evaluate_symbol(symbol, source, options, checked_at);
            progress.on_complete(symbol, i, total, &outcome);
            outcomes.push(outcome);

            // Stop hammering a provider that has locked us out.
            if !source.is_available() {
                for _ in &symbols[(i + 1)..] {
                    outcomes.push(Err(DataError::CircuitBreakerTripped));
                }
                break;
            }
        }
        outcomes
    };

    let mut rows: Vec<SignalResult> = Vec::new();
    let mut failures = Vec::new();
    let mut skipped = Vec::new();

    for (symbol, outcome) in symbols.iter().zip(outcomes) {
        match outcome {
            Ok(Evaluation::Signal(row)) => {
                debug!(symbol = %symbol, signal = %row.signal, "qualified");
                rows.push(row);
            }
            Ok(Evaluation::Skip(reason)) => {
                debug!(symbol = %symbol, reason = ?reason, "skipped");
                skipped.push((symbol.clone(), reason));
            }
            Err(error) => {
                if error != DataError::Cancelled {
                    warn!(
                        symbol = %symbol,
                        category = error.category(),
                        error = %error,
                        "symbol failed"
                    );
                }
                failures.push(SymbolFailure {
                    symbol: symbol.clone(),
                    error,
                });
            }
        }
    }

    let report = PassReport {
        results: ResultSet::new(rows),
        failures,
        skipped,
        checked_at,
        elapsed: started.elapsed(),
    };

    if report.is_systemic_failure() {
        warn!(failed = report.failures.len(), "every symbol failed this pass");
    }
    info!("{}", report.summary());
    progress.on_pass_complete(&report);
    report
}

/// Fetch bars, evaluate, and fetch a quote if the symbol qualifies.
pub fn evaluate_symbol(
    symbol: &str,
    source: &dyn DataSource,
    options: &PassOptions,
    checked_at: DateTime<Utc>,
) -> Result<Evaluation, DataError> {
    if !source.is_available() {
        return Err(DataError::CircuitBreakerTripped);
    }
    let series = source.fetch_bars(symbol, options.interval, options.lookback_days)?;
    evaluate(symbol, &series, || source.fetch_live_quote(symbol), checked_at)
}
