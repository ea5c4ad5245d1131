//! Amplifier controller monotonic time base
//!
//! Timestamps are taken from a free-running millisecond counter that wraps around after
//! `u32::MAX` ticks. All elapsed-time arithmetic uses the two's-complement difference of the raw
//! counts, so comparisons stay correct across a wrap as long as the two instants are less than
//! half of the counter range apart.
use core::{cmp::Ordering, ops};

/// Longest duration that can be measured unambiguously between two instants.
pub const MAX_ELAPSED: Duration = Duration {
    inner: i32::MAX as u32,
};

/// A point in time read from the wrapping millisecond counter.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct Instant {
    inner: i32,
}

impl Instant {
    /// Construct an instant from a raw millisecond tick count.
    pub const fn from_millis(ticks: u32) -> Self {
        Instant {
            inner: ticks as i32,
        }
    }

    /// The raw millisecond tick count of this instant.
    pub fn counts(&self) -> u32 {
        self.inner as u32
    }

    /// Compute the time elapsed since an earlier instant.
    ///
    /// # Returns
    /// The elapsed duration, or `None` if `earlier` is actually after `self`.
    pub fn checked_duration_since(&self, earlier: Instant) -> Option<Duration> {
        let diff = self.inner.wrapping_sub(earlier.inner);
        if diff >= 0 {
            Some(Duration { inner: diff as u32 })
        } else {
            None
        }
    }

    /// Compute the time elapsed since an earlier instant, saturating to zero if `earlier` is
    /// after `self`.
    pub fn saturating_duration_since(&self, earlier: Instant) -> Duration {
        self.checked_duration_since(earlier).unwrap_or_default()
    }
}

impl core::fmt::Debug for Instant {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("Instant")
            .field(&(self.inner as u32))
            .finish()
    }
}

impl ops::AddAssign<Duration> for Instant {
    fn add_assign(&mut self, dur: Duration) {
        // There's no foolproof way to detect a wrap around here, the user may write
        // `(instant + dur) + dur` where `dur` is `(1<<31)-1` ticks.
        debug_assert!(dur.inner < (1 << 31));
        self.inner = self.inner.wrapping_add(dur.inner as i32);
    }
}

impl ops::Add<Duration> for Instant {
    type Output = Self;

    fn add(mut self, dur: Duration) -> Self {
        self += dur;
        self
    }
}

impl ops::SubAssign<Duration> for Instant {
    fn sub_assign(&mut self, dur: Duration) {
        debug_assert!(dur.inner < (1 << 31));
        self.inner = self.inner.wrapping_sub(dur.inner as i32);
    }
}

impl ops::Sub<Duration> for Instant {
    type Output = Self;

    fn sub(mut self, dur: Duration) -> Self {
        self -= dur;
        self
    }
}

impl ops::Sub<Instant> for Instant {
    type Output = Duration;

    fn sub(self, other: Instant) -> Duration {
        self.saturating_duration_since(other)
    }
}

impl Ord for Instant {
    fn cmp(&self, rhs: &Self) -> Ordering {
        self.inner.wrapping_sub(rhs.inner).cmp(&0)
    }
}

impl PartialOrd for Instant {
    fn partial_cmp(&self, rhs: &Self) -> Option<Ordering> {
        Some(self.cmp(rhs))
    }
}

/// A `Duration` type to represent a span of time.
///
/// # Correctness
///
/// Each tick is 1ms, so this duration can hold up to 49.7 days. Only durations below
/// [MAX_ELAPSED] can be compared against the distance between two instants.
#[derive(Clone, Copy, Default, Eq, Ord, PartialEq, PartialOrd, Hash)]
pub struct Duration {
    inner: u32,
}

impl Duration {
    /// Creates a new `Duration` from the specified number of milliseconds.
    pub const fn from_millis(millis: u32) -> Self {
        Duration { inner: millis }
    }

    /// Returns the total number of milliseconds contained by this `Duration`.
    pub fn as_millis(&self) -> u32 {
        self.inner
    }
}

impl core::fmt::Debug for Duration {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}ms", self.inner)
    }
}

impl ops::AddAssign for Duration {
    fn add_assign(&mut self, dur: Duration) {
        self.inner = self.inner.saturating_add(dur.inner);
    }
}

impl ops::Add<Duration> for Duration {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self += other;
        self
    }
}

impl ops::SubAssign for Duration {
    fn sub_assign(&mut self, rhs: Duration) {
        self.inner = self.inner.saturating_sub(rhs.inner);
    }
}

impl ops::Sub<Duration> for Duration {
    type Output = Self;

    fn sub(mut self, rhs: Self) -> Self {
        self -= rhs;
        self
    }
}

pub trait U32Ext {
    fn secs(self) -> Duration;

    fn millis(self) -> Duration;
}

impl U32Ext for u32 {
    fn secs(self) -> Duration {
        Duration {
            inner: self.saturating_mul(1_000),
        }
    }

    fn millis(self) -> Duration {
        Duration { inner: self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_across_counter_wrap() {
        let before = Instant::from_millis(u32::MAX - 1);
        let after = Instant::from_millis(u32::MAX.wrapping_add(1));

        assert_eq!(after.checked_duration_since(before), Some(2.millis()));
        assert!(after > before);
    }

    #[test]
    fn earlier_instant_is_not_elapsed() {
        let now = Instant::from_millis(1_000);
        let later = now + 5.millis();

        assert_eq!(now.checked_duration_since(later), None);
        assert_eq!(now - later, Duration::default());
        assert_eq!(later - now, 5.millis());
    }

    #[test]
    fn instant_arithmetic_wraps() {
        let start = Instant::from_millis(u32::MAX - 10);
        let end = start + 20.millis();

        assert_eq!(end.counts(), 9);
        assert_eq!(end - 20.millis(), start);
    }

    #[test]
    fn duration_units() {
        assert_eq!(5.secs(), 5_000.millis());
        assert_eq!(Duration::from_millis(7).as_millis(), 7);
        assert_eq!(3.millis() - 5.millis(), Duration::default());
    }
}
