//! Bar: one sampled interval of price and volume for a symbol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single symbol over one sampling interval.
///
/// Prices keep full provider precision; rounding is a presentation concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Bar {
    /// Close strictly above open.
    pub fn is_green(&self) -> bool {
        self.close > self.open
    }

    /// Finite prices with a positive open and close.
    pub fn is_sane(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|p| p.is_finite())
            && self.open > 0.0
            && self.close > 0.0
    }
}

/// Chronologically ordered bars (oldest first) for one symbol.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Build a series, sorting by timestamp. Equal timestamps keep provider order.
    pub fn new(mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.timestamp);
        Self { bars }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn latest(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// The two most recent bars as `(prev, latest)`, or `None` with fewer than two.
    pub fn last_two(&self) -> Option<(&Bar, &Bar)> {
        match self.bars.as_slice() {
            [.., prev, latest] => Some((prev, latest)),
            _ => None,
        }
    }
}

impl From<Vec<Bar>> for BarSeries {
    fn from(bars: Vec<Bar>) -> Self {
        Self::new(bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bar_at(minute: u32, open: f64, close: f64, volume: u64) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 6, 3, 4, minute, 0).unwrap(),
            open,
            high: open.max(close),
            low: open.min(close),
            close,
            volume,
        }
    }

    #[test]
    fn green_is_strict() {
        assert!(bar_at(0, 99.0, 101.0, 1).is_green());
        assert!(!bar_at(0, 100.0, 100.0, 1).is_green());
        assert!(!bar_at(0, 100.0, 98.0, 1).is_green());
    }

    #[test]
    fn nan_or_non_positive_bar_is_not_sane() {
        let mut bar = bar_at(0, 100.0, 101.0, 10);
        assert!(bar.is_sane());
        bar.close = f64::NAN;
        assert!(!bar.is_sane());

        let mut bar = bar_at(0, 100.0, 101.0, 10);
        bar.high = f64::INFINITY;
        assert!(!bar.is_sane());

        assert!(!bar_at(0, 0.0, 101.0, 10).is_sane());
    }

    #[test]
    fn series_sorts_oldest_first() {
        let series = BarSeries::new(vec![bar_at(10, 2.0, 2.0, 2), bar_at(5, 1.0, 1.0, 1)]);
        assert_eq!(series.bars()[0].volume, 1);
        assert_eq!(series.latest().unwrap().volume, 2);
    }

    #[test]
    fn last_two_needs_two_bars() {
        assert!(BarSeries::default().last_two().is_none());
        let one = BarSeries::new(vec![bar_at(0, 1.0, 1.0, 1)]);
        assert!(one.last_two().is_none());

        let three = BarSeries::new(vec![
            bar_at(0, 1.0, 1.0, 1),
            bar_at(5, 2.0, 2.0, 2),
            bar_at(10, 3.0, 3.0, 3),
        ]);
        let (prev, latest) = three.last_two().unwrap();
        assert_eq!(prev.volume, 2);
        assert_eq!(latest.volume, 3);
    }
}
