//! Derived views over a [`ResultSet`]: search, category filter, sort.
//!
//! Nothing here mutates the source set or touches the network. A view is a
//! fresh `ResultSet` built from clones of the matching rows.

use crate::domain::{ResultSet, Signal, SignalResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Category filter: everything, or one signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Signal),
}

impl CategoryFilter {
    /// Cycle order used by the dashboard: All → WATCHING → SELL → All.
    pub fn next(self) -> Self {
        match self {
            CategoryFilter::All => CategoryFilter::Only(Signal::Watching),
            CategoryFilter::Only(Signal::Watching) => CategoryFilter::Only(Signal::Sell),
            CategoryFilter::Only(Signal::Sell) => CategoryFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CategoryFilter::All => "All",
            CategoryFilter::Only(signal) => signal.label(),
        }
    }

    pub fn matches(self, signal: Signal) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(wanted) => wanted == signal,
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CategoryFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(CategoryFilter::All);
        }
        s.parse::<Signal>()
            .map(CategoryFilter::Only)
            .map_err(|_| format!("unknown category '{}' (expected all, watching or sell)", s.trim()))
    }
}

/// Search text plus category, combined with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub search: String,
    pub category: CategoryFilter,
}

impl FilterCriteria {
    pub fn new(search: impl Into<String>, category: CategoryFilter) -> Self {
        Self {
            search: search.into(),
            category,
        }
    }

    /// True when the criteria let every row through.
    pub fn is_identity(&self) -> bool {
        self.search.trim().is_empty() && self.category == CategoryFilter::All
    }

    pub fn matches(&self, row: &SignalResult) -> bool {
        self.category.matches(row.signal) && symbol_matches(&row.symbol, &self.search)
    }
}

/// Case-insensitive substring match; blank search matches everything.
pub fn symbol_matches(symbol: &str, search: &str) -> bool {
    let needle = search.trim();
    if needle.is_empty() {
        return true;
    }
    symbol.to_lowercase().contains(&needle.to_lowercase())
}

/// Why a view has no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    /// The pass itself produced no rows.
    NoSignals,
    /// Rows exist but the filters removed all of them.
    NoMatches,
}

impl EmptyState {
    pub fn message(self) -> &'static str {
        match self {
            EmptyState::NoSignals => "No signals matching the logic found yet.",
            EmptyState::NoMatches => "No rows match the current search and filter.",
        }
    }
}

/// Sortable table columns, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortColumn {
    Stock,
    Signal,
    CandleOpen,
    LivePrice,
    Volume,
    PrevVolume,
    LastChecked,
}

impl SortColumn {
    pub const ALL: [SortColumn; 7] = [
        SortColumn::Stock,
        SortColumn::Signal,
        SortColumn::CandleOpen,
        SortColumn::LivePrice,
        SortColumn::Volume,
        SortColumn::PrevVolume,
        SortColumn::LastChecked,
    ];

    pub fn header(self) -> &'static str {
        match self {
            SortColumn::Stock => "Stock",
            SortColumn::Signal => "Signal",
            SortColumn::CandleOpen => "Candle Open",
            SortColumn::LivePrice => "Live Price",
            SortColumn::Volume => "Volume",
            SortColumn::PrevVolume => "Prev Volume",
            SortColumn::LastChecked => "Last Checked",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    fn compare(self, a: &SignalResult, b: &SignalResult) -> Ordering {
        match self {
            SortColumn::Stock => a.symbol.cmp(&b.symbol),
            SortColumn::Signal => a.signal.label().cmp(b.signal.label()),
            SortColumn::CandleOpen => a.candle_open.total_cmp(&b.candle_open),
            SortColumn::LivePrice => a.live_price.total_cmp(&b.live_price),
            SortColumn::Volume => a.volume.cmp(&b.volume),
            SortColumn::PrevVolume => a.prev_volume.cmp(&b.prev_volume),
            SortColumn::LastChecked => a.checked_at.cmp(&b.checked_at),
        }
    }
}

impl fmt::Display for SortColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "stock" | "symbol" => Ok(SortColumn::Stock),
            "signal" => Ok(SortColumn::Signal),
            "candleopen" | "open" => Ok(SortColumn::CandleOpen),
            "liveprice" | "price" => Ok(SortColumn::LivePrice),
            "volume" => Ok(SortColumn::Volume),
            "prevvolume" => Ok(SortColumn::PrevVolume),
            "lastchecked" | "checked" => Ok(SortColumn::LastChecked),
            _ => Err(format!("unknown sort column '{s}'")),
        }
    }
}

/// Column plus direction. `None` in a view means input (watchlist) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub column: SortColumn,
    pub descending: bool,
}

impl SortKey {
    pub fn ascending(column: SortColumn) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    pub fn descending(column: SortColumn) -> Self {
        Self {
            column,
            descending: true,
        }
    }
}

impl ResultSet {
    /// Rows matching `criteria`, in input order.
    pub fn filtered(&self, criteria: &FilterCriteria) -> ResultSet {
        if criteria.is_identity() {
            return self.clone();
        }
        self.iter().filter(|r| criteria.matches(r)).cloned().collect()
    }

    /// A copy sorted by `key`. Stable, so ties keep watchlist order.
    pub fn sorted(&self, key: SortKey) -> ResultSet {
        let mut rows = self.rows().to_vec();
        rows.sort_by(|a, b| {
            let ord = key.column.compare(a, b);
            if key.descending {
                ord.reverse()
            } else {
                ord
            }
        });
        ResultSet::new(rows)
    }

    /// Filter then optionally sort; the usual presentation pipeline.
    pub fn view(&self, criteria: &FilterCriteria, sort: Option<SortKey>) -> ResultSet {
        let filtered = self.filtered(criteria);
        match sort {
            Some(key) => filtered.sorted(key),
            None => filtered,
        }
    }

    /// Classify an empty `view` of this set. `None` when the view has rows.
    pub fn empty_state(&self, view: &ResultSet) -> Option<EmptyState> {
        if !view.is_empty() {
            None
        } else if self.is_empty() {
            Some(EmptyState::NoSignals)
        } else {
            Some(EmptyState::NoMatches)
        }
    }
}
