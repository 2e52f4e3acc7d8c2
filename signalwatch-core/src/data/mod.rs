//! Market data: sources, providers, and the scan universe

pub mod circuit_breaker;
pub mod interval;
pub mod memory;
pub mod provider;
pub mod watchlist;
pub mod yahoo;

pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use interval::BarInterval;
pub use memory::{MemorySource, RequestCounts};
pub use provider::{DataError, DataSource};
pub use watchlist::{Watchlist, DEFAULT_NSE_SYMBOLS};
pub use yahoo::YahooProvider;
