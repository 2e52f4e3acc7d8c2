//! Domain types for SignalWatch

pub mod bar;
pub mod quote;
pub mod signal;

pub use bar::{Bar, BarSeries};
pub use quote::Quote;
pub use signal::{round2, ResultSet, Signal, SignalResult};
