//! Background worker thread: runs passes on the refresh schedule.
//!
//! Communication with the TUI main thread is via `mpsc` channels. The worker
//! owns the data source and the schedule; the UI only sends commands and
//! renders whatever reports come back.
//!
//! Setting the shared cancel flag stops a pass between symbols; the worker
//! then exits without reporting the partial pass.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use signalwatch_core::data::{DataError, DataSource};
use signalwatch_core::{Evaluation, SystemClock};
use signalwatch_runner::{build_result_set, PassOptions, PassProgress, PassReport, RefreshSchedule};
use tracing::info;

/// Upper bound on how long the worker blocks waiting for a command.
const POLL: Duration = Duration::from_millis(250);

/// Commands sent from the TUI to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerCommand {
    /// Run a pass now instead of waiting for the timer.
    RefreshNow,
    Shutdown,
}

/// Responses sent from the worker back to the TUI.
#[derive(Debug, Clone)]
pub enum WorkerResponse {
    PassStarted {
        total: usize,
    },
    SymbolStarted {
        symbol: String,
        index: usize,
        total: usize,
    },
    PassComplete(Box<PassReport>),
}

/// Static inputs for every pass.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub symbols: Vec<String>,
    pub options: PassOptions,
    pub refresh_interval: Duration,
}

/// Spawn the background worker thread.
pub fn spawn_worker<S>(
    source: S,
    settings: WorkerSettings,
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
    cancel: Arc<AtomicBool>,
) -> std::io::Result<JoinHandle<()>>
where
    S: DataSource + 'static,
{
    thread::Builder::new()
        .name("signalwatch-worker".into())
        .spawn(move || worker_loop(&source, &settings, rx, tx, cancel))
}

fn worker_loop(
    source: &dyn DataSource,
    settings: &WorkerSettings,
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
    cancel: Arc<AtomicBool>,
) {
    let mut schedule = RefreshSchedule::new(settings.refresh_interval);
    let progress = ChannelProgress {
        tx: tx.clone(),
        cancel,
    };

    loop {
        if progress.is_cancelled() {
            break;
        }
        let now = Instant::now();
        if schedule.is_due(now) {
            schedule.mark_started(now);
            let _ = tx.send(WorkerResponse::PassStarted {
                total: settings.symbols.len(),
            });
            let report = build_result_set(
                &settings.symbols,
                source,
                &SystemClock,
                &settings.options,
                &progress,
            );
            if report.was_cancelled() {
                info!(checked = report.total() - report.failures.len(), "pass cancelled");
                break;
            }
            if tx.send(WorkerResponse::PassComplete(Box::new(report))).is_err() {
                break;
            }
            continue;
        }

        let wait = schedule.time_until_next(Instant::now()).min(POLL);
        match rx.recv_timeout(wait) {
            Ok(WorkerCommand::RefreshNow) => schedule.request_now(),
            Ok(WorkerCommand::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }
    }
    info!("worker stopped");
}

/// Forwards per-symbol progress to the UI.
struct ChannelProgress {
    tx: Sender<WorkerResponse>,
    cancel: Arc<AtomicBool>,
}

impl PassProgress for ChannelProgress {
    fn on_start(&self, symbol: &str, index: usize, total: usize) {
        let _ = self.tx.send(WorkerResponse::SymbolStarted {
            symbol: symbol.to_string(),
            index,
            total,
        });
    }

    fn on_complete(
        &self,
        _symbol: &str,
        _index: usize,
        _total: usize,
        _outcome: &Result<Evaluation, DataError>,
    ) {
    }

    // The full report travels in `PassComplete`.
    fn on_pass_complete(&self, _report: &PassReport) {}

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }
}
