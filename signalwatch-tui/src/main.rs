//! SignalWatch TUI: live signal dashboard.
//!
//! Usage: `signalwatch-tui [CONFIG]`. Without a path the default config file
//! is used if present, otherwise built-in defaults.
//!
//! A background worker runs a pass on the refresh schedule; the main thread
//! renders the latest result set and handles keys.

mod app;
mod input;
mod theme;
mod ui;
mod worker;

use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use signalwatch_runner::{logging, yahoo_from_config, PassOptions, WatchConfig};
use tracing::info;

use crate::app::AppState;
use crate::worker::{WorkerResponse, WorkerSettings};

const LOG_FILE: &str = "signalwatch-tui.log";

fn main() -> Result<()> {
    logging::init_file(Path::new(LOG_FILE))?;

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = WatchConfig::load(config_path.as_deref())?;
    let tz = config.tz()?;
    let provider = yahoo_from_config(&config)?;
    info!(
        symbols = config.symbols.len(),
        refresh_secs = config.refresh_interval_seconds,
        "starting dashboard"
    );

    // Install a panic hook that restores the terminal before printing the panic.
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stderr(), LeaveAlternateScreen);
        default_hook(info);
    }));

    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (resp_tx, resp_rx) = mpsc::channel();
    let settings = WorkerSettings {
        symbols: config.symbols.symbols().to_vec(),
        options: PassOptions::from(&config),
        refresh_interval: config.refresh_interval(),
    };
    let cancel = Arc::new(AtomicBool::new(false));
    let worker_handle =
        worker::spawn_worker(provider, settings, cmd_rx, resp_tx, Arc::clone(&cancel))
            .context("failed to spawn background worker")?;

    let mut app = AppState::new(cmd_tx, cancel, tz, config.refresh_interval());

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &mut app, &resp_rx);

    // Hand the terminal back before waiting on the symbol in flight.
    app.shutdown_worker();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    drop(resp_rx);
    if worker_handle.join().is_err() {
        eprintln!("background worker panicked");
    }

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    worker_rx: &Receiver<WorkerResponse>,
) -> Result<()> {
    loop {
        // 1. Render
        terminal.draw(|f| ui::draw(f, app))?;

        // 2. Drain worker responses (non-blocking)
        while let Ok(resp) = worker_rx.try_recv() {
            app.handle_worker_response(resp);
        }

        // 3. Poll for input events (50ms timeout for ~20 FPS tick)
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                input::handle_key(app, key);
            }
        }

        // 4. Check quit
        if !app.running {
            break;
        }
    }
    Ok(())
}
