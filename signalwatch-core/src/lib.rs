//! SignalWatch Core: domain types, data sources, signal evaluation, filtering.
//!
//! This crate holds everything a single pass needs that is not I/O plumbing:
//! - Domain types (bars, quotes, signals, result sets)
//! - The `DataSource` trait with the Yahoo and in-memory implementations
//! - The green-candle / rising-volume evaluator
//! - Search, category and sort views over a result set

pub mod clock;
pub mod data;
pub mod domain;
pub mod evaluator;
pub mod filter;

pub use clock::{Clock, FixedClock, SystemClock};
pub use evaluator::{evaluate, Evaluation, SkipReason, RULE_CAPTION};
pub use filter::{CategoryFilter, EmptyState, FilterCriteria, SortColumn, SortKey};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything a pass hands across threads is Send + Sync.
    ///
    /// The dashboard worker and the rayon pool both depend on it.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<domain::Bar>();
        require_sync::<domain::Bar>();
        require_send::<domain::BarSeries>();
        require_sync::<domain::BarSeries>();
        require_send::<domain::Quote>();
        require_sync::<domain::Quote>();
        require_send::<domain::SignalResult>();
        require_sync::<domain::SignalResult>();
        require_send::<domain::ResultSet>();
        require_sync::<domain::ResultSet>();

        require_send::<Evaluation>();
        require_sync::<Evaluation>();
        require_send::<FilterCriteria>();
        require_sync::<FilterCriteria>();

        require_send::<data::DataError>();
        require_sync::<data::DataError>();
        require_send::<data::CircuitBreaker>();
        require_sync::<data::CircuitBreaker>();
        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<data::MemorySource>();
        require_sync::<data::MemorySource>();
    }

    /// The data source must be usable as a trait object from the runner.
    #[test]
    fn data_source_is_object_safe() {
        fn _takes_dyn(source: &dyn data::DataSource) -> bool {
            source.is_available()
        }
        let source = data::MemorySource::new();
        assert!(_takes_dyn(&source));
    }
}
