//! Time-qualified digital signal filtering
//!
//! A [Debouncer] only accepts a level once it has been observed without change for a hold
//! duration. The settled active level produces a single [Edge::Rising] no matter how long it is
//! held, and the following settled inactive level produces a single [Edge::Falling] and re-arms
//! the filter. The same primitive is used for front-panel buttons and for the persistence timers
//! of fault conditions.
use crate::monotonic::{Duration, Instant};

/// A qualified transition of a debounced signal.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Edge {
    /// The signal settled in the active level.
    Rising,

    /// The signal settled in the inactive level after a rising edge was reported.
    Falling,
}

/// Debounce filter for a single boolean signal.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Debouncer {
    hold: Duration,
    level: Option<bool>,
    changed_at: Instant,
    consumed: bool,
}

impl Debouncer {
    /// Construct a debouncer.
    ///
    /// # Args
    /// * `hold` - How long a level must be stable before it is accepted.
    pub const fn new(hold: Duration) -> Self {
        Self {
            hold,
            level: None,
            changed_at: Instant::from_millis(0),
            consumed: false,
        }
    }

    /// Feed the current level of the signal into the filter.
    ///
    /// # Note
    /// A change of level (including the first observation after construction or a reset) only
    /// restarts the hold timer and never produces an edge on the same call.
    ///
    /// # Args
    /// * `now` - The current time.
    /// * `active` - The current level of the signal.
    ///
    /// # Returns
    /// The qualified edge, if one occurred.
    pub fn update(&mut self, now: Instant, active: bool) -> Option<Edge> {
        if self.level != Some(active) {
            self.level = Some(active);
            self.changed_at = now;
            return None;
        }

        if !self.is_settled(now) {
            return None;
        }

        match (active, self.consumed) {
            (true, false) => {
                self.consumed = true;
                Some(Edge::Rising)
            }
            (false, true) => {
                self.consumed = false;
                Some(Edge::Falling)
            }
            _ => None,
        }
    }

    /// Check if the current level has been stable for the hold duration.
    pub fn is_settled(&self, now: Instant) -> bool {
        self.level.is_some()
            && now
                .checked_duration_since(self.changed_at)
                .map_or(false, |elapsed| elapsed >= self.hold)
    }

    /// Get the accepted level of the signal, if it has settled.
    pub fn settled_level(&self, now: Instant) -> Option<bool> {
        if self.is_settled(now) {
            self.level
        } else {
            None
        }
    }

    /// The time the signal last became active, if it is currently active.
    pub fn active_since(&self) -> Option<Instant> {
        match self.level {
            Some(true) => Some(self.changed_at),
            _ => None,
        }
    }

    /// Forget the observed level. The next update restarts the hold timer.
    pub fn reset(&mut self) {
        self.level = None;
        self.consumed = false;
    }

    /// How long a level must be stable before it is accepted.
    pub fn hold(&self) -> Duration {
        self.hold
    }
}
