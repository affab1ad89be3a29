//! Host-side tick driver that never replays missed intervals.

use std::time::{Duration, Instant};

/// Wall-clock time between ticks at normal speed.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(200);

/// Speed multipliers offered to the user.
pub const SPEED_PRESETS: [f64; 4] = [0.5, 1.0, 2.0, 5.0];

/// Schedules ticks at a fixed interval divided by a speed multiplier.
///
/// Each [`Cadence::poll`] fires at most once and reschedules from the poll
/// instant, so a stalled host resumes at the normal pace without a burst.
#[derive(Clone, Debug, PartialEq)]
pub struct Cadence {
    base_interval: Duration,
    speed: f64,
    next_due: Option<Instant>,
}

impl Cadence {
    /// Creates a disarmed cadence with the provided base interval at 1x speed.
    #[must_use]
    pub const fn new(base_interval: Duration) -> Self {
        Self {
            base_interval,
            speed: 1.0,
            next_due: None,
        }
    }

    /// Sets the speed multiplier; non-positive or non-finite values reset to 1x.
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = if speed.is_finite() && speed > 0.0 {
            speed
        } else {
            1.0
        };
    }

    /// Current speed multiplier.
    #[must_use]
    pub const fn speed(&self) -> f64 {
        self.speed
    }

    /// Wall-clock time between ticks at the current speed.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.base_interval.div_f64(self.speed)
    }

    /// Schedules the first tick one interval after `now`.
    pub fn arm(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval());
    }

    /// Cancels every pending tick.
    pub fn disarm(&mut self) {
        self.next_due = None;
    }

    /// Reports whether ticks are scheduled.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    /// Instant of the next scheduled tick.
    #[must_use]
    pub const fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    /// Returns `true` at most once per call when a tick is due.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.next_due = Some(now + self.interval());
                true
            }
            _ => false,
        }
    }
}

impl Default for Cadence {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL)
    }
}
