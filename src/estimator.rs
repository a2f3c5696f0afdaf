//! Wall-clock extrapolation between sparse MTC updates
//!
//! MTC confirms the timecode far less often than events need to fire, so the
//! engine keeps the last confirmed timecode together with the instant it
//! arrived and extrapolates between updates. Past a one second silence the
//! source is treated as stopped and the estimate freezes rather than running
//! away.

use std::time::{Duration, Instant};

use crate::timecode::Timecode;

/// How long the estimate keeps extrapolating after the last confirmation.
pub const STALENESS_THRESHOLD: Duration = Duration::from_secs(1);

/// Last confirmed timecode plus the instant it was confirmed
#[derive(Debug, Clone, Copy)]
pub struct ClockEstimate {
    timecode: Timecode,
    confirmed_at: Instant,
}

impl ClockEstimate {
    pub fn new(timecode: Timecode, confirmed_at: Instant) -> Self {
        ClockEstimate {
            timecode,
            confirmed_at,
        }
    }

    /// Records a newly committed timecode.
    pub fn confirm(&mut self, timecode: Timecode, at: Instant) {
        self.timecode = timecode;
        self.confirmed_at = at;
    }

    /// The last confirmed timecode, without extrapolation.
    pub fn last_confirmed(&self) -> Timecode {
        self.timecode
    }

    /// True once the source has been silent past the staleness threshold.
    pub fn is_stale(&self, at: Instant) -> bool {
        at.saturating_duration_since(self.confirmed_at) > STALENESS_THRESHOLD
    }

    /// The estimated current timecode at `at`.
    ///
    /// While fresh: confirmed timecode advanced by round(elapsed × rate)
    /// frames, ties rounding to even so an exact half-frame boundary does not
    /// advance the clock. Stale: the confirmed timecode unchanged.
    pub fn now(&self, at: Instant) -> Timecode {
        let elapsed = at.saturating_duration_since(self.confirmed_at);
        if elapsed > STALENESS_THRESHOLD {
            return self.timecode;
        }
        let additional = (elapsed.as_secs_f64() * self.timecode.rate().as_f64()).round_ties_even();
        self.timecode.add(additional as u64)
    }
}
