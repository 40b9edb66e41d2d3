//! Time and power abstraction traits for platform-agnostic timing.

/// Trait for abstracting the system millisecond tick.
pub trait TimeSource {
    /// Returns milliseconds since startup. Wraps after ~49.7 days.
    fn now_ms(&self) -> u32;

    /// Returns the current instant as a [`Tick`].
    #[inline]
    fn now(&self) -> Tick {
        Tick(self.now_ms())
    }
}

/// Trait for halting the processor until the next interrupt.
///
/// Control returns to the caller once any interrupt has been serviced.
pub trait LowPower {
    /// Enters low-power mode.
    fn sleep(&self);
}

/// A point in time on the wrapping millisecond counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tick(pub u32);

impl Tick {
    /// Milliseconds elapsed since an earlier instant, correct across a counter wrap.
    #[inline]
    pub fn elapsed_since(self, earlier: Tick) -> u32 {
        self.0.wrapping_sub(earlier.0)
    }

    /// Instant `millis` after this one.
    #[inline]
    pub fn wrapping_add(self, millis: u32) -> Tick {
        Tick(self.0.wrapping_add(millis))
    }

    /// Returns true if this instant is strictly later than `deadline`.
    ///
    /// Valid as long as the two instants are less than half the counter range apart.
    #[inline]
    pub fn is_after(self, deadline: Tick) -> bool {
        let diff = self.0.wrapping_sub(deadline.0);
        diff != 0 && diff < (1 << 31)
    }

    /// Returns the raw millisecond count.
    #[inline]
    pub fn as_millis(self) -> u32 {
        self.0
    }
}
