//! `tracing` subscriber setup for the two binaries.
//!
//! `RUST_LOG` always wins over the built-in default level.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_level},reqwest=warn,hyper=warn")))
}

/// Compact logs on stderr. `verbose` lowers the default level to debug.
pub fn init_stderr(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .compact()
        .with_writer(std::io::stderr)
        .with_env_filter(filter(level))
        .try_init();
}

/// Append logs to `path`; used when the terminal belongs to a UI.
pub fn init_file(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;
    let _ = tracing_subscriber::fmt()
        .with_target(true)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .with_env_filter(filter("info"))
        .try_init();
    Ok(())
}
