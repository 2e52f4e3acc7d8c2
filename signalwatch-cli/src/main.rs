//! SignalWatch CLI: one-shot scans, a refresh loop, and config management.
//!
//! Commands:
//! - `scan`: run one pass over the watchlist and print the signal table
//! - `watch`: re-run the pass every `refresh_interval_seconds`
//! - `config init`: write the default config file
//! - `config show`: print the effective configuration

use anyhow::{Context, Result};
use chrono_tz::Tz;
use clap::{Args, Parser, Subcommand, ValueEnum};
use signalwatch_core::clock::format_local;
use signalwatch_core::data::{BarInterval, DataSource};
use signalwatch_core::domain::ResultSet;
use signalwatch_core::{
    CategoryFilter, FilterCriteria, SortColumn, SortKey, SystemClock, RULE_CAPTION,
};
use signalwatch_runner::{
    build_result_set, export_csv, export_json, logging, watch_loop, write_csv_file,
    yahoo_from_config, ConfigOverrides, NoProgress, PassOptions, PassProgress, PassReport,
    RefreshSchedule, StderrProgress, WatchConfig,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Exit code for a pass in which every symbol failed.
const EXIT_SYSTEMIC_FAILURE: i32 = 2;

#[derive(Parser)]
#[command(
    name = "signalwatch",
    about = "SignalWatch: green-candle volume signals for a stock watchlist"
)]
struct Cli {
    /// Config file. Defaults to <config dir>/signalwatch/config.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug-level logging on stderr (RUST_LOG overrides).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one pass and print the signal table.
    Scan {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        view: ViewArgs,
    },
    /// Re-run the pass on the refresh interval until interrupted.
    Watch {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        view: ViewArgs,

        /// Stop after this many passes.
        #[arg(long)]
        max_passes: Option<u64>,
    },
    /// Config file management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default configuration as TOML.
    Init {
        /// Destination. Defaults to the standard config location.
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file.
        #[arg(long, default_value_t = false)]
        force: bool,
    },
    /// Print the effective configuration (file plus overrides).
    Show {
        #[command(flatten)]
        source: SourceArgs,
    },
}

/// Overrides for values normally read from the config file.
#[derive(Args)]
struct SourceArgs {
    /// Comma-separated watchlist (e.g. RELIANCE.NS,TCS.NS).
    #[arg(long, value_delimiter = ',')]
    symbols: Option<Vec<String>>,

    /// Bar interval: 1m, 5m, 15m, 30m, 60m, 1d.
    #[arg(long)]
    interval: Option<BarInterval>,

    /// IANA timezone for displayed times (e.g. Asia/Kolkata).
    #[arg(long)]
    timezone: Option<String>,

    /// Evaluate symbols in parallel.
    #[arg(long, default_value_t = false)]
    parallel: bool,
}

impl SourceArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            symbols: self.symbols.clone(),
            interval: self.interval,
            timezone: self.timezone.clone(),
            parallel: self.parallel,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

/// Presentation options: filters, sort, output.
#[derive(Args)]
struct ViewArgs {
    /// Case-insensitive substring of the symbol.
    #[arg(long, default_value = "")]
    search: String,

    /// Signal category: all, watching, sell.
    #[arg(long, default_value = "all")]
    signal: CategoryFilter,

    /// Sort column (stock, signal, open, price, volume, prev_volume, checked).
    #[arg(long)]
    sort: Option<SortColumn>,

    /// Sort descending.
    #[arg(long, default_value_t = false)]
    desc: bool,

    /// Also export the displayed rows as CSV to this path.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Output format on stdout.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Print per-symbol progress on stderr.
    #[arg(long, default_value_t = false)]
    progress: bool,
}

impl ViewArgs {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria::new(self.search.clone(), self.signal)
    }

    fn sort_key(&self) -> Option<SortKey> {
        self.sort.map(|column| SortKey {
            column,
            descending: self.desc,
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_stderr(cli.verbose);

    match cli.command {
        Commands::Scan { source, view } => {
            let config = load_config(cli.config.as_deref(), &source)?;
            run_scan(&config, &view)
        }
        Commands::Watch {
            source,
            view,
            max_passes,
        } => {
            let config = load_config(cli.config.as_deref(), &source)?;
            run_watch(&config, &view, max_passes)
        }
        Commands::Config { action } => match action {
            ConfigAction::Init { path, force } => run_config_init(path, force),
            ConfigAction::Show { source } => {
                let config = load_config(cli.config.as_deref(), &source)?;
                print!("{}", config.to_toml()?);
                Ok(())
            }
        },
    }
}

fn load_config(path: Option<&Path>, source: &SourceArgs) -> Result<WatchConfig> {
    let mut config = WatchConfig::load(path)?;
    config
        .apply_overrides(&source.overrides())
        .context("invalid command-line override")?;
    Ok(config)
}

fn run_scan(config: &WatchConfig, view: &ViewArgs) -> Result<()> {
    let provider = yahoo_from_config(config)?;
    let tz = config.tz()?;
    let report = run_pass(config, &provider, view);
    print_report(&report, view, tz)?;

    if report.is_systemic_failure() {
        eprintln!(
            "Error: all {} symbols failed; the data source may be unreachable.",
            report.failures.len()
        );
        std::process::exit(EXIT_SYSTEMIC_FAILURE);
    }
    Ok(())
}

fn run_watch(config: &WatchConfig, view: &ViewArgs, max_passes: Option<u64>) -> Result<()> {
    let provider = yahoo_from_config(config)?;
    let tz = config.tz()?;
    let mut schedule = RefreshSchedule::new(config.refresh_interval());

    eprintln!(
        "Watching {} symbols every {}s (Ctrl-C to stop)",
        config.symbols.len(),
        config.refresh_interval_seconds
    );

    let stop = AtomicBool::new(false);
    let mut render_error = None;
    watch_loop(&mut schedule, max_passes, Some(&stop), |pass| {
        println!("\n=== Pass {pass} ===");
        let report = run_pass(config, &provider, view);
        if let Err(e) = print_report(&report, view, tz) {
            render_error = Some(e);
            stop.store(true, Ordering::Relaxed);
            return;
        }
        if report.is_systemic_failure() {
            eprintln!("Error: every symbol failed this pass; retrying on the next refresh.");
        }
    });

    match render_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn run_pass(config: &WatchConfig, source: &dyn DataSource, view: &ViewArgs) -> PassReport {
    let progress: &dyn PassProgress = if view.progress {
        &StderrProgress
    } else {
        &NoProgress
    };
    build_result_set(
        config.symbols.symbols(),
        source,
        &SystemClock,
        &PassOptions::from(config),
        progress,
    )
}

fn print_report(report: &PassReport, view: &ViewArgs, tz: Tz) -> Result<()> {
    for failure in &report.failures {
        eprintln!("Error loading {}: {}", failure.symbol, failure.error);
    }

    let shown = report.results.view(&view.criteria(), view.sort_key());
    let empty = report.results.empty_state(&shown);

    match view.format {
        OutputFormat::Table => {
            println!("{RULE_CAPTION}");
            println!();
            match empty {
                Some(state) => println!("{}", state.message()),
                None => print!("{}", render_table(&shown, tz)),
            }
            println!();
            println!("Last updated: {}", format_local(report.checked_at, tz));
        }
        OutputFormat::Json => {
            println!("{}", export_json(&shown)?);
            if let Some(state) = empty {
                eprintln!("{}", state.message());
            }
        }
        OutputFormat::Csv => {
            print!("{}", export_csv(&shown, tz)?);
            if let Some(state) = empty {
                eprintln!("{}", state.message());
            }
        }
    }

    if let Some(path) = &view.csv {
        write_csv_file(path, &shown, tz)?;
        eprintln!("Exported {} rows to {}", shown.len(), path.display());
    }
    Ok(())
}

fn render_table(rows: &ResultSet, tz: Tz) -> String {
    let mut out = format!(
        "{:<14} {:<8} {:>12} {:>12} {:>12} {:>12}  {:<19}\n",
        "Stock", "Signal", "Candle Open", "Live Price", "Volume", "Prev Volume", "Last Checked"
    );
    out.push_str(&"-".repeat(96));
    out.push('\n');
    for r in rows {
        out.push_str(&format!(
            "{:<14} {:<8} {:>12.2} {:>12.2} {:>12} {:>12}  {:<19}\n",
            r.symbol,
            r.signal.label(),
            r.candle_open,
            r.live_price,
            r.volume,
            r.prev_volume,
            format_local(r.checked_at, tz)
        ));
    }
    out
}

fn run_config_init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match path {
        Some(p) => p,
        None => WatchConfig::default_path()
            .context("no platform config directory; pass --path explicitly")?,
    };
    WatchConfig::default().write_to(&path, force)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use signalwatch_core::domain::{Signal, SignalResult};

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn scan_flags_parse() {
        let cli = Cli::try_parse_from([
            "signalwatch",
            "scan",
            "--symbols",
            "acc.ns,tcs.ns",
            "--signal",
            "SELL",
            "--sort",
            "live price",
            "--desc",
            "--format",
            "json",
        ])
        .unwrap();
        let Commands::Scan { source, view } = cli.command else {
            panic!("expected scan");
        };
        assert_eq!(source.symbols.unwrap(), ["acc.ns", "tcs.ns"]);
        assert_eq!(view.signal, CategoryFilter::Only(Signal::Sell));
        assert_eq!(view.sort_key(), Some(SortKey::descending(SortColumn::LivePrice)));
    }

    #[test]
    fn bad_interval_is_rejected() {
        assert!(Cli::try_parse_from(["signalwatch", "scan", "--interval", "7m"]).is_err());
    }

    #[test]
    fn table_has_headers_and_two_decimals() {
        let rows = ResultSet::new(vec![SignalResult {
            symbol: "ACC.NS".into(),
            signal: Signal::Sell,
            candle_open: 99.0,
            live_price: 98.5,
            volume: 900,
            prev_volume: 500,
            checked_at: Utc.with_ymd_and_hms(2024, 6, 3, 4, 15, 0).unwrap(),
        }]);
        let table = render_table(&rows, chrono_tz::Asia::Kolkata);
        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[0].starts_with("Stock"));
        assert!(lines[0].contains("Prev Volume"));
        assert!(lines[2].contains("SELL"));
        assert!(lines[2].contains("99.00"));
        assert!(lines[2].contains("98.50"));
        assert!(lines[2].contains("2024-06-03 09:45:00"));
    }
}
