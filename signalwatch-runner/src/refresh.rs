//! Refresh timing for hosts that re-run passes.
//!
//! The schedule only answers "is a pass due?"; it never sleeps or spawns. The
//! CLI `watch` loop and the dashboard worker each drive it from their own loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Longest single sleep in [`watch_loop`], so cancellation is noticed promptly.
const MAX_NAP: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct RefreshSchedule {
    interval: Duration,
    last_started: Option<Instant>,
    forced: bool,
}

impl RefreshSchedule {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_started: None,
            forced: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Due on first use, after a manual request, or once the interval has elapsed.
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_started {
            None => true,
            Some(_) if self.forced => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    /// Record that a pass started at `now`; clears any manual request.
    pub fn mark_started(&mut self, now: Instant) {
        self.last_started = Some(now);
        self.forced = false;
    }

    /// Make the next `is_due` check succeed regardless of elapsed time.
    pub fn request_now(&mut self) {
        self.forced = true;
    }

    /// Time left until the next pass is due (zero when already due).
    pub fn time_until_next(&self, now: Instant) -> Duration {
        if self.is_due(now) {
            return Duration::ZERO;
        }
        match self.last_started {
            Some(last) => self
                .interval
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }
}

/// Drive `run_pass` from `schedule` until `max_passes` is reached or `cancel` is set.
///
/// `run_pass` receives the 1-based pass number. Returns the number of passes run.
pub fn watch_loop<F>(
    schedule: &mut RefreshSchedule,
    max_passes: Option<u64>,
    cancel: Option<&AtomicBool>,
    mut run_pass: F,
) -> u64
where
    F: FnMut(u64),
{
    let mut passes = 0;
    loop {
        if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
            break;
        }
        if max_passes.is_some_and(|max| passes >= max) {
            break;
        }
        let now = Instant::now();
        if schedule.is_due(now) {
            schedule.mark_started(now);
            passes += 1;
            run_pass(passes);
        } else {
            std::thread::sleep(schedule.time_until_next(now).min(MAX_NAP));
        }
    }
    passes
}
