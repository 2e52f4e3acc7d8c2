//! Integration tests for the result-set builder.
//!
//! Verifies watchlist ordering (sequential and parallel, with injected
//! latency), per-symbol failure isolation, lazy quote fetching, the single
//! `checked_at` per pass, and circuit-breaker bail-out.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use signalwatch_core::data::{DataError, MemorySource, RequestCounts};
use signalwatch_core::domain::{Bar, Signal};
use signalwatch_core::{CategoryFilter, Evaluation, FilterCriteria, FixedClock, SkipReason};
use signalwatch_runner::{build_result_set, NoProgress, PassOptions, PassProgress, PassReport};

// ── Helpers ──────────────────────────────────────────────────────────

fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 4, minute, 0).unwrap()
}

fn bar(minute: u32, open: f64, close: f64, volume: u64) -> Bar {
    Bar {
        timestamp: at(minute),
        open,
        high: open.max(close),
        low: open.min(close),
        close,
        volume,
    }
}

/// Green candle on rising volume, opening at `open`.
fn qualifying(open: f64) -> Vec<Bar> {
    vec![bar(5, open + 1.0, open - 1.0, 500), bar(10, open, open + 2.0, 900)]
}

fn red() -> Vec<Bar> {
    vec![bar(5, 100.0, 98.0, 500), bar(10, 99.0, 97.0, 300)]
}

fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn row_symbols(report: &PassReport) -> Vec<&str> {
    report.results.iter().map(|r| r.symbol.as_str()).collect()
}

fn sequential() -> PassOptions {
    PassOptions::default()
}

fn parallel() -> PassOptions {
    PassOptions {
        parallel: true,
        ..PassOptions::default()
    }
}

/// A mixed watchlist where the first symbols are the slowest.
fn slow_first_source() -> MemorySource {
    MemorySource::new()
        .with_bars("RELIANCE.NS", qualifying(2900.0))
        .with_quote("RELIANCE.NS", 2901.0, at(12))
        .with_latency("RELIANCE.NS", Duration::from_millis(60))
        .with_bars("TCS.NS", qualifying(3800.0))
        .with_quote("TCS.NS", 3700.0, at(12))
        .with_latency("TCS.NS", Duration::from_millis(30))
        .with_bars("INFY.NS", red())
        .with_bars("ACC.NS", qualifying(99.0))
        .with_quote("ACC.NS", 98.5, at(12))
}

// ── Ordering ─────────────────────────────────────────────────────────

#[test]
fn sequential_keeps_watchlist_order() {
    let source = slow_first_source();
    let list = symbols(&["RELIANCE.NS", "TCS.NS", "INFY.NS", "ACC.NS"]);
    let report = build_result_set(&list, &source, &FixedClock(at(15)), &sequential(), &NoProgress);
    assert_eq!(row_symbols(&report), ["RELIANCE.NS", "TCS.NS", "ACC.NS"]);
}

#[test]
fn parallel_keeps_watchlist_order_despite_latency() {
    let source = slow_first_source();
    let list = symbols(&["RELIANCE.NS", "TCS.NS", "INFY.NS", "ACC.NS"]);
    let report = build_result_set(&list, &source, &FixedClock(at(15)), &parallel(), &NoProgress);
    assert_eq!(row_symbols(&report), ["RELIANCE.NS", "TCS.NS", "ACC.NS"]);

    let signals: Vec<Signal> = report.results.iter().map(|r| r.signal).collect();
    assert_eq!(signals, [Signal::Watching, Signal::Sell, Signal::Sell]);
}

#[test]
fn parallel_and_sequential_agree() {
    let list = symbols(&["RELIANCE.NS", "TCS.NS", "INFY.NS", "ACC.NS", "MISSING.NS"]);
    let a = build_result_set(&list, &slow_first_source(), &FixedClock(at(15)), &sequential(), &NoProgress);
    let b = build_result_set(&list, &slow_first_source(), &FixedClock(at(15)), &parallel(), &NoProgress);
    assert_eq!(a.results, b.results);
    assert_eq!(a.failures, b.failures);
    assert_eq!(a.skipped, b.skipped);
}

// ── Failure isolation ────────────────────────────────────────────────

#[test]
fn failures_do_not_abort_the_pass() {
    let source = MemorySource::new()
        .with_bars_error("RELIANCE.NS", DataError::NetworkUnreachable("reset".into()))
        .with_bars("TCS.NS", qualifying(3800.0))
        .with_quote_error(
            "TCS.NS",
            DataError::Timeout {
                symbol: "TCS.NS".into(),
                secs: 10,
            },
        )
        .with_bars("ACC.NS", qualifying(99.0))
        .with_quote("ACC.NS", 99.5, at(12));

    let list = symbols(&["RELIANCE.NS", "TCS.NS", "ACC.NS"]);
    let report = build_result_set(&list, &source, &FixedClock(at(15)), &sequential(), &NoProgress);

    assert_eq!(row_symbols(&report), ["ACC.NS"]);
    assert_eq!(report.results.rows()[0].signal, Signal::Watching);
    let failed: Vec<&str> = report.failures.iter().map(|f| f.symbol.as_str()).collect();
    assert_eq!(failed, ["RELIANCE.NS", "TCS.NS"]);
    assert!(matches!(report.failures[1].error, DataError::Timeout { .. }));
    assert!(!report.is_systemic_failure());
}

#[test]
fn all_failed_is_systemic() {
    let source = MemorySource::new();
    let list = symbols(&["A.NS", "B.NS"]);
    let report = build_result_set(&list, &source, &FixedClock(at(15)), &sequential(), &NoProgress);
    assert!(report.results.is_empty());
    assert_eq!(report.failures.len(), 2);
    assert!(report.is_systemic_failure());
}

#[test]
fn nothing_qualifying_is_a_valid_empty_pass() {
    let source = MemorySource::new().with_bars("INFY.NS", red()).with_bars("NEW.NS", vec![]);
    let list = symbols(&["INFY.NS", "NEW.NS"]);
    let report = build_result_set(&list, &source, &FixedClock(at(15)), &sequential(), &NoProgress);
    assert!(report.results.is_empty());
    assert!(report.failures.is_empty());
    assert!(!report.is_systemic_failure());
    assert_eq!(
        report.skipped,
        vec![
            ("INFY.NS".to_string(), SkipReason::NotQualified),
            ("NEW.NS".to_string(), SkipReason::InsufficientData { bars: 0 }),
        ]
    );
}

// ── Requests and timestamps ──────────────────────────────────────────

#[test]
fn quotes_only_requested_for_qualifying_symbols() {
    let source = slow_first_source();
    let list = symbols(&["INFY.NS", "ACC.NS"]);
    build_result_set(&list, &source, &FixedClock(at(15)), &sequential(), &NoProgress);
    assert_eq!(source.request_counts("INFY.NS"), RequestCounts { bars: 1, quotes: 0 });
    assert_eq!(source.request_counts("ACC.NS"), RequestCounts { bars: 1, quotes: 1 });
}

#[test]
fn every_row_shares_the_pass_timestamp() {
    let source = slow_first_source();
    let list = symbols(&["RELIANCE.NS", "TCS.NS", "ACC.NS"]);
    let report = build_result_set(&list, &source, &FixedClock(at(20)), &parallel(), &NoProgress);
    assert_eq!(report.checked_at, at(20));
    assert!(report.results.iter().all(|r| r.checked_at == at(20)));
}

#[test]
fn filtering_the_report_is_a_derived_view() {
    let source = slow_first_source();
    let list = symbols(&["RELIANCE.NS", "TCS.NS", "INFY.NS", "ACC.NS"]);
    let report = build_result_set(&list, &source, &FixedClock(at(15)), &sequential(), &NoProgress);

    let sells = report
        .results
        .filtered(&FilterCriteria::new("", CategoryFilter::Only(Signal::Sell)));
    assert_eq!(sells.len(), 2);
    let acc = report
        .results
        .filtered(&FilterCriteria::new("acc", CategoryFilter::All));
    assert_eq!(acc.len(), 1);
    assert_eq!(report.results.len(), 3);
}

// ── Circuit breaker ──────────────────────────────────────────────────

#[test]
fn unavailable_source_short_circuits_remaining_symbols() {
    let source = slow_first_source().unavailable();
    let list = symbols(&["RELIANCE.NS", "TCS.NS", "ACC.NS"]);
    let report = build_result_set(&list, &source, &FixedClock(at(15)), &sequential(), &NoProgress);
    assert_eq!(report.failures.len(), 3);
    assert!(report
        .failures
        .iter()
        .all(|f| f.error == DataError::CircuitBreakerTripped));
    for s in &list {
        assert_eq!(source.request_counts(s), RequestCounts::default());
    }
}

// ── Progress ─────────────────────────────────────────────────────────

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl PassProgress for Recorder {
    fn on_start(&self, symbol: &str, _index: usize, _total: usize) {
        self.events.lock().unwrap().push(format!("start {symbol}"));
    }

    fn on_complete(
        &self,
        symbol: &str,
        _index: usize,
        _total: usize,
        outcome: &Result<Evaluation, DataError>,
    ) {
        let tag = match outcome {
            Ok(Evaluation::Signal(_)) => "row",
            Ok(Evaluation::Skip(_)) => "skip",
            Err(_) => "fail",
        };
        self.events.lock().unwrap().push(format!("{tag} {symbol}"));
    }

    fn on_pass_complete(&self, report: &PassReport) {
        self.events
            .lock()
            .unwrap()
            .push(format!("done {}", report.total()));
    }
}

#[test]
fn progress_reports_each_symbol_then_the_pass() {
    let source = slow_first_source();
    let recorder = Recorder::default();
    let list = symbols(&["INFY.NS", "ACC.NS", "NOPE.NS"]);
    build_result_set(&list, &source, &FixedClock(at(15)), &sequential(), &recorder);
    let events = recorder.events.into_inner().unwrap();
    assert_eq!(
        events,
        [
            "start INFY.NS",
            "skip INFY.NS",
            "start ACC.NS",
            "row ACC.NS",
            "start NOPE.NS",
            "fail NOPE.NS",
            "done 3",
        ]
    );
}
