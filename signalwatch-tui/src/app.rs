//! Application state for the dashboard.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use chrono_tz::Tz;
use signalwatch_core::data::DataError;
use signalwatch_core::domain::ResultSet;
use signalwatch_core::{CategoryFilter, FilterCriteria, SortColumn, SortKey};
use signalwatch_runner::{write_csv_file, PassReport};
use tracing::{info, warn};

use crate::worker::{WorkerCommand, WorkerResponse};

const MAX_ERROR_HISTORY: usize = 50;

/// Status message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusLevel {
    #[default]
    Info,
    Warning,
    Error,
}

/// Error category for the history overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Provider,
    Data,
    Symbol,
    Export,
    Other,
}

impl ErrorCategory {
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Network => "NET",
            ErrorCategory::Provider => "PROV",
            ErrorCategory::Data => "DATA",
            ErrorCategory::Symbol => "SYM",
            ErrorCategory::Export => "EXP",
            ErrorCategory::Other => "ERR",
        }
    }
}

impl From<&DataError> for ErrorCategory {
    fn from(error: &DataError) -> Self {
        match error {
            DataError::NetworkUnreachable(_) | DataError::Timeout { .. } => ErrorCategory::Network,
            DataError::RateLimited { .. } | DataError::CircuitBreakerTripped => {
                ErrorCategory::Provider
            }
            DataError::ResponseFormatChanged(_) | DataError::NoQuote { .. } => ErrorCategory::Data,
            DataError::SymbolNotFound { .. } => ErrorCategory::Symbol,
            DataError::InvalidRequest(_) | DataError::Cancelled | DataError::Other(_) => {
                ErrorCategory::Other
            }
        }
    }
}

/// One entry in the error history.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub timestamp: NaiveDateTime,
    pub category: ErrorCategory,
    pub message: String,
    /// Symbol or file the error concerns.
    pub context: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overlay {
    #[default]
    None,
    Search,
    ErrorHistory,
}

/// The symbol the worker is currently checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassProgressState {
    pub symbol: Option<String>,
    pub index: usize,
    pub total: usize,
}

pub struct AppState {
    pub running: bool,
    pub tz: Tz,
    pub refresh_interval: Duration,
    pub export_path: PathBuf,

    /// Latest completed pass. Replaced wholesale, never merged.
    pub report: Option<PassReport>,
    pub criteria: FilterCriteria,
    pub sort: Option<SortKey>,
    pub scroll: usize,
    pub overlay: Overlay,

    pub progress: Option<PassProgressState>,
    pub last_pass_started: Option<Instant>,

    pub status_message: String,
    pub status_level: StatusLevel,
    pub error_history: VecDeque<ErrorRecord>,
    pub error_scroll: usize,

    worker_tx: Sender<WorkerCommand>,
    cancel: Arc<AtomicBool>,
}

impl AppState {
    pub fn new(
        worker_tx: Sender<WorkerCommand>,
        cancel: Arc<AtomicBool>,
        tz: Tz,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            running: true,
            tz,
            refresh_interval,
            export_path: PathBuf::from(signalwatch_runner::DEFAULT_EXPORT_FILE),
            report: None,
            criteria: FilterCriteria::default(),
            sort: None,
            scroll: 0,
            overlay: Overlay::None,
            progress: None,
            last_pass_started: None,
            status_message: "Starting first pass...".into(),
            status_level: StatusLevel::Info,
            error_history: VecDeque::new(),
            error_scroll: 0,
            worker_tx,
            cancel,
        }
    }

    // ── Status ───────────────────────────────────────────────────────

    pub fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
        self.status_level = StatusLevel::Info;
    }

    pub fn set_warning(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
        self.status_level = StatusLevel::Warning;
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
        self.status_level = StatusLevel::Error;
    }

    /// Record an error in the history, newest first.
    pub fn push_error(
        &mut self,
        category: ErrorCategory,
        message: impl Into<String>,
        context: Option<String>,
    ) {
        self.error_history.push_front(ErrorRecord {
            timestamp: chrono::Local::now().naive_local(),
            category,
            message: message.into(),
            context,
        });
        self.error_history.truncate(MAX_ERROR_HISTORY);
    }

    // ── Worker traffic ───────────────────────────────────────────────

    pub fn handle_worker_response(&mut self, response: WorkerResponse) {
        match response {
            WorkerResponse::PassStarted { total } => {
                self.last_pass_started = Some(Instant::now());
                self.progress = Some(PassProgressState {
                    symbol: None,
                    index: 0,
                    total,
                });
            }
            WorkerResponse::SymbolStarted {
                symbol,
                index,
                total,
            } => {
                self.progress = Some(PassProgressState {
                    symbol: Some(symbol),
                    index,
                    total,
                });
            }
            WorkerResponse::PassComplete(report) => self.apply_report(*report),
        }
    }

    /// Replace the displayed rows with a finished pass.
    pub fn apply_report(&mut self, report: PassReport) {
        self.progress = None;
        for failure in &report.failures {
            self.push_error(
                ErrorCategory::from(&failure.error),
                failure.error.to_string(),
                Some(failure.symbol.clone()),
            );
        }
        if report.is_systemic_failure() {
            self.set_error(format!(
                "All {} symbols failed; the data source may be unreachable (e: errors)",
                report.total()
            ));
        } else if !report.failures.is_empty() {
            self.set_warning(report.summary());
        } else {
            self.set_status(report.summary());
        }
        info!(summary = %report.summary(), "pass applied");
        self.report = Some(report);
        self.clamp_scroll();
    }

    /// Ask the worker for a pass now.
    pub fn request_refresh(&mut self) {
        if self.worker_tx.send(WorkerCommand::RefreshNow).is_err() {
            self.set_error("Background worker is not running");
            return;
        }
        self.set_status("Refresh requested");
    }

    /// Abandon any pass in flight and stop the worker.
    pub fn shutdown_worker(&self) {
        self.cancel.store(true, Ordering::Relaxed);
        let _ = self.worker_tx.send(WorkerCommand::Shutdown);
    }

    /// Time left before the next scheduled pass; `None` while one runs.
    pub fn next_refresh_in(&self, now: Instant) -> Option<Duration> {
        if self.progress.is_some() {
            return None;
        }
        let started = self.last_pass_started?;
        Some(
            self.refresh_interval
                .saturating_sub(now.saturating_duration_since(started)),
        )
    }

    // ── View ─────────────────────────────────────────────────────────

    /// Rows after search, category filter and sort.
    pub fn view(&self) -> ResultSet {
        self.report
            .as_ref()
            .map(|r| r.results.view(&self.criteria, self.sort))
            .unwrap_or_default()
    }

    /// Message to show in place of an empty table.
    pub fn empty_message(&self, view: &ResultSet) -> Option<&'static str> {
        match &self.report {
            None => Some("Waiting for the first pass..."),
            Some(report) => report.results.empty_state(view).map(|s| s.message()),
        }
    }

    pub fn cycle_category(&mut self) {
        self.criteria.category = self.criteria.category.next();
        self.scroll = 0;
    }

    /// Off, then each column ascending in table order, then off again.
    pub fn cycle_sort(&mut self) {
        let first = SortColumn::ALL[0];
        self.sort = match self.sort {
            None => Some(SortKey::ascending(first)),
            Some(key) if key.column.next() == first => None,
            Some(key) => Some(SortKey {
                column: key.column.next(),
                descending: key.descending,
            }),
        };
    }

    pub fn toggle_sort_direction(&mut self) {
        match self.sort.as_mut() {
            Some(key) => key.descending = !key.descending,
            None => self.set_warning("No sort column selected (s: sort)"),
        }
    }

    pub fn clear_filters(&mut self) {
        self.criteria = FilterCriteria::new("", CategoryFilter::All);
        self.scroll = 0;
    }

    pub fn push_search_char(&mut self, c: char) {
        self.criteria.search.push(c);
        self.scroll = 0;
    }

    pub fn pop_search_char(&mut self) {
        self.criteria.search.pop();
        self.scroll = 0;
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1);
        self.clamp_scroll();
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = usize::MAX;
        self.clamp_scroll();
    }

    fn clamp_scroll(&mut self) {
        let len = self.view().len();
        self.scroll = self.scroll.min(len.saturating_sub(1));
    }

    // ── Export ───────────────────────────────────────────────────────

    /// Write the current view to the export file.
    pub fn export_view(&mut self) {
        if self.report.is_none() {
            self.set_warning("Nothing to export yet");
            return;
        }
        let view = self.view();
        match write_csv_file(&self.export_path, &view, self.tz) {
            Ok(()) => {
                info!(rows = view.len(), path = %self.export_path.display(), "exported view");
                self.set_status(format!(
                    "Exported {} rows to {}",
                    view.len(),
                    self.export_path.display()
                ));
            }
            Err(e) => {
                warn!(error = %e, "export failed");
                let message = format!("{e:#}");
                self.push_error(
                    ErrorCategory::Export,
                    message.clone(),
                    Some(self.export_path.display().to_string()),
                );
                self.set_error(format!("Export failed: {message}"));
            }
        }
    }
}
