//! Property tests for evaluator and filter invariants.
//!
//! Uses proptest to verify:
//! 1. Qualification is exactly `close > open && volume > prev_volume`
//! 2. SELL iff the live price is strictly below the candle open
//! 3. Filtering is a subset that preserves order and never mutates the source
//! 4. Blank search with category All is the identity

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use signalwatch_core::domain::{Bar, BarSeries, Quote, ResultSet, Signal, SignalResult};
use signalwatch_core::{evaluate, CategoryFilter, Evaluation, FilterCriteria, SkipReason};

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_price() -> impl Strategy<Value = f64> {
    (1.0..5000.0_f64).prop_map(|p| (p * 100.0).round() / 100.0)
}

fn arb_volume() -> impl Strategy<Value = u64> {
    0..1_000_000_u64
}

fn arb_signal() -> impl Strategy<Value = Signal> {
    prop_oneof![Just(Signal::Watching), Just(Signal::Sell)]
}

fn arb_symbol() -> impl Strategy<Value = String> {
    "[A-Z]{2,8}\\.NS"
}

fn arb_category() -> impl Strategy<Value = CategoryFilter> {
    prop_oneof![
        Just(CategoryFilter::All),
        Just(CategoryFilter::Only(Signal::Watching)),
        Just(CategoryFilter::Only(Signal::Sell)),
    ]
}

fn arb_result_set() -> impl Strategy<Value = ResultSet> {
    prop::collection::vec((arb_symbol(), arb_signal(), arb_price(), arb_volume()), 0..20).prop_map(
        |rows| {
            let checked_at = Utc.with_ymd_and_hms(2024, 6, 3, 4, 15, 0).unwrap();
            rows.into_iter()
                .map(|(symbol, signal, price, volume)| SignalResult {
                    symbol,
                    signal,
                    candle_open: price,
                    live_price: price,
                    volume,
                    prev_volume: volume / 2,
                    checked_at,
                })
                .collect()
        },
    )
}

fn two_bars(prev_volume: u64, open: f64, close: f64, volume: u64) -> BarSeries {
    let t0 = Utc.with_ymd_and_hms(2024, 6, 3, 4, 0, 0).unwrap();
    BarSeries::new(vec![
        Bar {
            timestamp: t0,
            open: 100.0,
            high: 101.0,
            low: 97.0,
            close: 98.0,
            volume: prev_volume,
        },
        Bar {
            timestamp: t0 + Duration::minutes(5),
            open,
            high: open.max(close),
            low: open.min(close),
            close,
            volume,
        },
    ])
}

// ── 1-2. Evaluator ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn qualification_matches_rule(
        prev_volume in arb_volume(),
        open in arb_price(),
        close in arb_price(),
        volume in arb_volume(),
        price in arb_price(),
    ) {
        let series = two_bars(prev_volume, open, close, volume);
        let checked_at = Utc::now();
        let out = evaluate("X.NS", &series, || Ok(Quote { price, as_of: checked_at }), checked_at)
            .unwrap();
        let qualifies = close > open && volume > prev_volume;
        match out {
            Evaluation::Signal(row) => {
                prop_assert!(qualifies);
                let expected = if price < open { Signal::Sell } else { Signal::Watching };
                prop_assert_eq!(row.signal, expected);
                prop_assert_eq!(row.volume, volume);
                prop_assert_eq!(row.prev_volume, prev_volume);
            }
            Evaluation::Skip(reason) => {
                prop_assert!(!qualifies);
                prop_assert_eq!(reason, SkipReason::NotQualified);
            }
        }
    }

    #[test]
    fn equal_open_and_price_is_watching(open in arb_price(), volume in 1..1_000_000_u64) {
        let series = two_bars(0, open, open + 1.0, volume);
        let checked_at = Utc::now();
        let row = evaluate("X.NS", &series, || Ok(Quote { price: open, as_of: checked_at }), checked_at)
            .unwrap()
            .into_signal()
            .unwrap();
        prop_assert_eq!(row.signal, Signal::Watching);
    }
}

// ── 3-4. Filters ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn filter_is_ordered_subset(
        set in arb_result_set(),
        search in "[a-zA-Z.]{0,3}",
        category in arb_category(),
    ) {
        let before = set.clone();
        let criteria = FilterCriteria::new(search.clone(), category);
        let view = set.filtered(&criteria);

        prop_assert_eq!(&set, &before);
        prop_assert!(view.len() <= set.len());

        // Every view row appears in the source, in the same relative order.
        let mut cursor = set.iter();
        for row in view.iter() {
            prop_assert!(cursor.any(|r| r == row));
            prop_assert!(category.matches(row.signal));
            prop_assert!(row.symbol.to_lowercase().contains(&search.trim().to_lowercase()));
        }

        // And nothing matching was dropped.
        let expected = set.iter().filter(|r| criteria.matches(r)).count();
        prop_assert_eq!(view.len(), expected);
    }

    #[test]
    fn blank_search_all_is_identity(set in arb_result_set(), spaces in " {0,4}") {
        let view = set.filtered(&FilterCriteria::new(spaces, CategoryFilter::All));
        prop_assert_eq!(view, set);
    }

    #[test]
    fn categories_partition_the_set(set in arb_result_set()) {
        let watching = set.filtered(&FilterCriteria::new("", CategoryFilter::Only(Signal::Watching)));
        let sell = set.filtered(&FilterCriteria::new("", CategoryFilter::Only(Signal::Sell)));
        prop_assert_eq!(watching.len() + sell.len(), set.len());
        prop_assert!(watching.iter().all(|r| r.signal == Signal::Watching));
        prop_assert!(sell.iter().all(|r| r.signal == Signal::Sell));
    }
}
