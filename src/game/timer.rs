//! Timer handles and the elapsed-time clock.
//!
//! The browser owns the actual `setTimeout`/`setInterval` calls. The session
//! only hands out handles and remembers which ones are live; a callback that
//! comes back with any other handle is stale and gets dropped. Cancelling a
//! timer is just forgetting its handle.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerHandle(pub u64);

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues handles that are never reused, even across restarts.
#[derive(Debug, Default)]
pub struct TimerIds {
    next: u64,
}

impl TimerIds {
    pub fn issue(&mut self) -> TimerHandle {
        self.next += 1;
        TimerHandle(self.next)
    }
}

/// The mismatch delay: resolve the current move at `due_at` unless the
/// player short-circuits it first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingResolution {
    pub handle: TimerHandle,
    pub due_at: u64,
}

impl PendingResolution {
    pub fn delay_remaining(&self, now: u64) -> u64 {
        self.due_at.saturating_sub(now)
    }
}

/// Elapsed session time, derived from the start timestamp on every read.
#[derive(Debug, Clone, Copy)]
pub struct ElapsedClock {
    started_on: u64,
    stopped_at: Option<u64>,
    ticker: Option<TimerHandle>,
}

impl ElapsedClock {
    pub fn start(now: u64, ticker: TimerHandle) -> Self {
        Self {
            started_on: now,
            stopped_at: None,
            ticker: Some(ticker),
        }
    }

    pub fn ticker(&self) -> Option<TimerHandle> {
        self.ticker
    }

    pub fn is_live(&self, handle: TimerHandle) -> bool {
        self.ticker == Some(handle)
    }

    /// Move the start time of a clock that has not been stopped.
    pub fn restart_at(&mut self, now: u64) {
        if self.stopped_at.is_none() {
            self.started_on = now;
        }
    }

    /// Freeze the clock and drop the ticker handle. Stopping twice keeps the
    /// first stop time.
    pub fn stop(&mut self, now: u64) {
        if self.stopped_at.is_none() {
            self.stopped_at = Some(now.max(self.started_on));
        }
        self.ticker = None;
    }

    pub fn elapsed(&self, now: u64) -> u64 {
        self.stopped_at.unwrap_or(now).saturating_sub(self.started_on)
    }
}

/// `HH:MM:SS` for an elapsed duration, wrapping at 24 hours.
pub fn format_elapsed(millis: u64) -> String {
    let secs = millis / 1000;
    format!(
        "{:02}:{:02}:{:02}",
        (secs / 3600) % 24,
        (secs / 60) % 60,
        secs % 60
    )
}
