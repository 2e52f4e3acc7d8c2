//! CSV and JSON export of a result set.
//!
//! CSV columns, in order: Stock, Signal, Candle Open, Live Price, Volume,
//! Prev Volume, Last Checked. `Last Checked` is local wall time in the
//! configured timezone, so importing needs the same zone to recover UTC.
//! Rows checked during the hour a DST fall-back repeats import one hour
//! early; every other row survives export exactly.

use std::path::Path;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use signalwatch_core::clock::{format_local, parse_local};
use signalwatch_core::domain::{ResultSet, Signal, SignalResult};

/// File name used when the user does not pick one.
pub const DEFAULT_EXPORT_FILE: &str = "stock_signals.csv";

pub const CSV_HEADERS: [&str; 7] = [
    "Stock",
    "Signal",
    "Candle Open",
    "Live Price",
    "Volume",
    "Prev Volume",
    "Last Checked",
];

#[derive(Debug, Serialize, Deserialize)]
struct ExportRow {
    #[serde(rename = "Stock")]
    stock: String,
    #[serde(rename = "Signal")]
    signal: Signal,
    #[serde(rename = "Candle Open")]
    candle_open: f64,
    #[serde(rename = "Live Price")]
    live_price: f64,
    #[serde(rename = "Volume")]
    volume: u64,
    #[serde(rename = "Prev Volume")]
    prev_volume: u64,
    #[serde(rename = "Last Checked")]
    last_checked: String,
}

/// Serialize rows to CSV text with a header line.
pub fn export_csv(rows: &ResultSet, tz: Tz) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    if rows.is_empty() {
        wtr.write_record(CSV_HEADERS)?;
    }
    for r in rows {
        wtr.serialize(ExportRow {
            stock: r.symbol.clone(),
            signal: r.signal,
            candle_open: r.candle_open,
            live_price: r.live_price,
            volume: r.volume,
            prev_volume: r.prev_volume,
            last_checked: format_local(r.checked_at, tz),
        })
        .with_context(|| format!("failed to write CSV row for {}", r.symbol))?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Parse CSV produced by [`export_csv`] back into rows.
pub fn import_csv(data: &str, tz: Tz) -> Result<ResultSet> {
    let mut rdr = csv::Reader::from_reader(data.as_bytes());
    let headers = rdr.headers().context("CSV has no header row")?.clone();
    if headers.iter().ne(CSV_HEADERS) {
        anyhow::bail!(
            "unexpected CSV header {:?} (expected {:?})",
            headers.iter().collect::<Vec<_>>(),
            CSV_HEADERS
        );
    }
    let mut rows = Vec::new();
    for (i, record) in rdr.deserialize::<ExportRow>().enumerate() {
        let row = record.with_context(|| format!("bad CSV record {}", i + 1))?;
        let checked_at = parse_local(&row.last_checked, tz)
            .map_err(anyhow::Error::msg)
            .with_context(|| format!("bad Last Checked in record {}", i + 1))?;
        rows.push(SignalResult {
            symbol: row.stock,
            signal: row.signal,
            candle_open: row.candle_open,
            live_price: row.live_price,
            volume: row.volume,
            prev_volume: row.prev_volume,
            checked_at,
        });
    }
    Ok(ResultSet::new(rows))
}

/// Write rows as CSV to `path`, replacing any existing file.
pub fn write_csv_file(path: &Path, rows: &ResultSet, tz: Tz) -> Result<()> {
    let csv = export_csv(rows, tz)?;
    std::fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))
}

/// Pretty JSON array of rows; `checked_at` stays in UTC (RFC 3339).
pub fn export_json(rows: &ResultSet) -> Result<String> {
    serde_json::to_string_pretty(rows.rows()).context("failed to serialize rows to JSON")
}
