//! Time abstraction traits for platform-agnostic timing.
//!
//! The player uses these for its response timeout, the buttons for their
//! settle time, and the game for its debounce and capture window. All of
//! them only ever need "milliseconds since an earlier instant".

/// Trait for abstracting monotonic time sources.
pub trait TimeSource<I: TimeInstant> {
    /// Returns the current time instant.
    fn now(&self) -> I;
}

/// Trait abstraction for duration types.
pub trait TimeDuration: Copy + PartialEq {
    /// Converts duration to milliseconds.
    fn as_millis(&self) -> u64;
}

/// Trait abstraction for instant types.
pub trait TimeInstant: Copy {
    /// Duration type for this instant.
    type Duration: TimeDuration;

    /// Calculates duration since an earlier instant.
    fn duration_since(&self, earlier: Self) -> Self::Duration;

    /// Milliseconds elapsed between `earlier` and `self`.
    #[inline]
    fn millis_since(&self, earlier: Self) -> u64 {
        self.duration_since(earlier).as_millis()
    }
}

/// Returns true once at least `millis` have passed since `start`.
#[inline]
pub fn has_elapsed<I: TimeInstant>(now: I, start: I, millis: u64) -> bool {
    now.millis_since(start) >= millis
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy, PartialEq)]
    struct Millis(u64);

    impl TimeDuration for Millis {
        fn as_millis(&self) -> u64 {
            self.0
        }
    }

    #[derive(Clone, Copy)]
    struct Tick(u64);

    impl TimeInstant for Tick {
        type Duration = Millis;

        fn duration_since(&self, earlier: Self) -> Millis {
            Millis(self.0 - earlier.0)
        }
    }

    #[test]
    fn elapsed_is_inclusive() {
        assert!(!has_elapsed(Tick(119), Tick(100), 20));
        assert!(has_elapsed(Tick(120), Tick(100), 20));
        assert!(has_elapsed(Tick(100), Tick(100), 0));
    }
}
