#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Playback clock over simulated hours and the host-side tick cadence.

pub mod cadence;
pub mod clock;

pub use cadence::{Cadence, DEFAULT_TICK_INTERVAL, SPEED_PRESETS};
pub use clock::PlaybackClock;

/// Formats simulated hours as `"5h"` under a day and `"2d 3h"` otherwise.
#[must_use]
pub fn format_hours(hours: f64) -> String {
    if hours < 24.0 {
        format!("{}h", hours.round())
    } else {
        let days = (hours / 24.0).floor();
        let remaining = hours % 24.0;
        format!("{days}d {}h", remaining.round())
    }
}
