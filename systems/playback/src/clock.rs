//! Play, pause and scrub state over a bounded simulated timeline.

use neural_terra_core::PlaybackState;

/// Clock owning the current simulated time and the play flag.
///
/// `0 <= current_time <= duration_hours` holds after every operation; any
/// requested time outside that range is clamped, never rejected.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackClock {
    current_time: f64,
    duration_hours: u32,
    is_playing: bool,
    loaded: bool,
}

impl PlaybackClock {
    /// Creates a stopped clock at hour zero with no series loaded.
    #[must_use]
    pub const fn new(duration_hours: u32) -> Self {
        Self {
            current_time: 0.0,
            duration_hours,
            is_playing: false,
            loaded: false,
        }
    }

    /// Loads a series of the given duration, rewinding and pausing the clock.
    pub fn load(&mut self, duration_hours: u32) {
        *self = Self {
            loaded: true,
            ..Self::new(duration_hours)
        };
    }

    /// Drops the loaded series, rewinding and pausing the clock.
    pub fn unload(&mut self, duration_hours: u32) {
        *self = Self::new(duration_hours);
    }

    /// Starts playback, returning whether the clock transitioned to playing.
    ///
    /// No-op without a loaded series, at the end of the timeline, or when
    /// already playing.
    pub fn play(&mut self) -> bool {
        if self.is_playing || !self.loaded || self.current_time >= self.duration() {
            return false;
        }
        self.is_playing = true;
        true
    }

    /// Pauses playback, returning whether the clock was playing.
    pub fn pause(&mut self) -> bool {
        let was_playing = self.is_playing;
        self.is_playing = false;
        was_playing
    }

    /// Plays when paused and pauses when playing; returns the resulting flag.
    pub fn toggle(&mut self) -> bool {
        if self.is_playing {
            let _ = self.pause();
        } else {
            let _ = self.play();
        }
        self.is_playing
    }

    /// Moves to `hours` clamped to the timeline, keeping the play flag.
    pub fn scrub_to(&mut self, hours: f64) -> f64 {
        self.current_time = if hours.is_nan() {
            0.0
        } else {
            hours.clamp(0.0, self.duration())
        };
        self.current_time
    }

    /// Scrubs by `delta_hours` relative to the current time.
    pub fn step(&mut self, delta_hours: f64) -> f64 {
        self.scrub_to(self.current_time + delta_hours)
    }

    /// Advances one hour when playing and returns the new time.
    ///
    /// At the end of the timeline the clock stays playing and further ticks
    /// leave the time unchanged.
    pub fn tick(&mut self) -> Option<f64> {
        if !self.is_playing {
            return None;
        }
        self.current_time = (self.current_time + 1.0).min(self.duration());
        Some(self.current_time)
    }

    /// Current simulated time in hours.
    #[must_use]
    pub const fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Upper bound of the timeline in whole hours.
    #[must_use]
    pub const fn duration_hours(&self) -> u32 {
        self.duration_hours
    }

    /// Reports whether ticks advance the clock.
    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Reports whether a series is loaded.
    #[must_use]
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Reports whether the clock sits on the end of the timeline.
    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.current_time >= self.duration()
    }

    /// Snapshot of the clock.
    #[must_use]
    pub const fn state(&self) -> PlaybackState {
        PlaybackState {
            current_time: self.current_time,
            duration_hours: self.duration_hours,
            is_playing: self.is_playing,
        }
    }

    fn duration(&self) -> f64 {
        f64::from(self.duration_hours)
    }
}
