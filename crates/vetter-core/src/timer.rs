//! Pause-aware decision timer.
//!
//! Elapsed time is `accumulated + (now - resumed_at)` while running and just
//! `accumulated` while paused. Only clock reads matter, so a slow display
//! refresh never skews the recorded time.

use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionTimer {
    loaded_at: Instant,
    resumed_at: Instant,
    accumulated: Duration,
    paused: bool,
}

impl DecisionTimer {
    /// Start a running timer at the item acquisition time `t0`.
    #[must_use]
    pub const fn start(t0: Instant) -> Self {
        Self {
            loaded_at: t0,
            resumed_at: t0,
            accumulated: Duration::ZERO,
            paused: false,
        }
    }

    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub const fn loaded_at(&self) -> Instant {
        self.loaded_at
    }

    /// Time spent deciding as of `now`.
    #[must_use]
    pub fn elapsed(&self, now: Instant) -> Duration {
        if self.paused {
            self.accumulated
        } else {
            self.accumulated + now.saturating_duration_since(self.resumed_at)
        }
    }

    /// [`Self::elapsed`] in whole milliseconds, saturating.
    #[must_use]
    pub fn elapsed_ms(&self, now: Instant) -> u64 {
        u64::try_from(self.elapsed(now).as_millis()).unwrap_or(u64::MAX)
    }

    /// Freeze when running, resume when paused. Returns the new paused state.
    pub fn toggle_pause(&mut self, now: Instant) -> bool {
        if self.paused {
            self.resumed_at = now;
            self.paused = false;
        } else {
            self.accumulated += now.saturating_duration_since(self.resumed_at);
            self.paused = true;
        }
        self.paused
    }

    /// Zero the accumulated time. The paused flag is left as it is.
    pub const fn reset(&mut self, now: Instant) {
        self.accumulated = Duration::ZERO;
        self.resumed_at = now;
    }
}

/// `mm:ss` rendering used in the review header.
#[must_use]
pub fn format_clock(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
