//! Watchlist: the ordered scan universe.
//!
//! Order is significant: every pass reports rows in watchlist order. Symbols
//! are normalized (trimmed, upper-cased) and de-duplicated on construction,
//! keeping the first occurrence.

use serde::{Deserialize, Serialize};

/// Default NSE symbols scanned when no watchlist is configured.
pub const DEFAULT_NSE_SYMBOLS: [&str; 12] = [
    "RELIANCE.NS",
    "TCS.NS",
    "INFY.NS",
    "ACC.NS",
    "ADANIENT.NS",
    "AMBUJACEM.NS",
    "APOLLOHOSP.NS",
    "JSWSTEEL.NS",
    "JINDALSTEL.NS",
    "CHOLAFIN.NS",
    "BHARATFORG.NS",
    "WOCKPHARMA.NS",
];

/// Ordered, de-duplicated list of symbols to scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Watchlist {
    symbols: Vec<String>,
}

impl Watchlist {
    /// Build a watchlist, rejecting blank entries.
    pub fn new<I, S>(symbols: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for (i, raw) in symbols.into_iter().enumerate() {
            let symbol = raw.as_ref().trim().to_uppercase();
            if symbol.is_empty() {
                return Err(format!("watchlist entry {} is blank", i + 1));
            }
            if symbol.chars().any(char::is_whitespace) {
                return Err(format!("watchlist entry '{symbol}' contains whitespace"));
            }
            if !out.contains(&symbol) {
                out.push(symbol);
            }
        }
        Ok(Self { symbols: out })
    }

    /// The twelve NSE large/mid caps the dashboard shipped with.
    pub fn default_nse() -> Self {
        Self {
            symbols: DEFAULT_NSE_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s.eq_ignore_ascii_case(symbol))
    }
}

impl Default for Watchlist {
    fn default() -> Self {
        Self::default_nse()
    }
}

impl TryFrom<Vec<String>> for Watchlist {
    type Error = String;

    fn try_from(symbols: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(symbols)
    }
}

impl From<Watchlist> for Vec<String> {
    fn from(watchlist: Watchlist) -> Self {
        watchlist.symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_watchlist_keeps_source_order() {
        let w = Watchlist::default_nse();
        assert_eq!(w.len(), 12);
        assert_eq!(w.symbols()[0], "RELIANCE.NS");
        assert_eq!(w.symbols()[11], "WOCKPHARMA.NS");
    }

    #[test]
    fn normalizes_and_dedupes_keeping_first() {
        let w = Watchlist::new([" tcs.ns", "ACC.NS", "TCS.NS", "infy.ns"]).unwrap();
        assert_eq!(w.symbols(), ["TCS.NS", "ACC.NS", "INFY.NS"]);
        assert!(w.contains("acc.ns"));
    }

    #[test]
    fn rejects_blank_entries() {
        let err = Watchlist::new(["ACC.NS", "  "]).unwrap_err();
        assert!(err.contains("entry 2"));
        assert!(Watchlist::new(["ACC NS"]).is_err());
    }

    #[test]
    fn empty_watchlist_is_allowed() {
        let w = Watchlist::new(Vec::<String>::new()).unwrap();
        assert!(w.is_empty());
    }

    #[test]
    fn serde_goes_through_normalization() {
        let w: Watchlist = serde_json::from_str(r#"["acc.ns", "ACC.NS", "tcs.ns"]"#).unwrap();
        assert_eq!(w.symbols(), ["ACC.NS", "TCS.NS"]);
        assert!(serde_json::from_str::<Watchlist>(r#"["", "X"]"#).is_err());
    }
}
