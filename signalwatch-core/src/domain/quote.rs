//! Live quote read at evaluation time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single live price reading for a symbol.
///
/// May be fresher than the latest bar of the symbol's series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub price: f64,
    pub as_of: DateTime<Utc>,
}
