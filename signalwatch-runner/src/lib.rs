//! SignalWatch Runner: pass orchestration and host plumbing.
//!
//! This crate builds on `signalwatch-core` to provide:
//! - Watch configuration (TOML, defaults, validation, overrides)
//! - The result-set builder that runs one pass over the watchlist
//! - Refresh scheduling for repeated passes
//! - CSV/JSON export of a result set
//! - Logging setup for the binaries

pub mod config;
pub mod export;
pub mod logging;
pub mod pass;
pub mod refresh;

pub use config::{ConfigError, ConfigOverrides, DataConfig, WatchConfig};
pub use export::{export_csv, export_json, import_csv, write_csv_file, DEFAULT_EXPORT_FILE};
pub use pass::{
    build_result_set, NoProgress, PassOptions, PassProgress, PassReport, StderrProgress,
    SymbolFailure,
};
pub use refresh::{watch_loop, RefreshSchedule};

use std::sync::Arc;

use signalwatch_core::data::{CircuitBreaker, DataError, YahooProvider};

/// Build the Yahoo provider described by `config`.
pub fn yahoo_from_config(config: &WatchConfig) -> Result<YahooProvider, DataError> {
    YahooProvider::new(Arc::new(CircuitBreaker::default_provider()), config.fetch_timeout())
        .map(|provider| provider.with_max_retries(config.data.max_retries))
}

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn pass_report_is_send_sync() {
        assert_send::<PassReport>();
        assert_sync::<PassReport>();
    }

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<WatchConfig>();
        assert_sync::<WatchConfig>();
        assert_send::<PassOptions>();
        assert_sync::<PassOptions>();
    }

    #[test]
    fn schedule_is_send() {
        assert_send::<RefreshSchedule>();
    }

    #[test]
    fn yahoo_provider_builds_from_defaults() {
        assert!(yahoo_from_config(&WatchConfig::default()).is_ok());
    }
}
