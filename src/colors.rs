//! Indicator colors.
//!
//! The indicator is driven with 8-bit sRGB components. Named colors match the
//! distance bands of the display state machine.

use palette::Srgb;

/// 8-bit sRGB color sent to a [`crate::DisplayPort`].
pub type Color = Srgb<u8>;

/// Danger band.
pub const RED: Color = Srgb::new(255, 0, 0);

/// Warning band.
pub const YELLOW: Color = Srgb::new(94, 94, 0);

/// No-problem band.
pub const GREEN: Color = Srgb::new(0, 255, 0);

/// Info band.
pub const TURQUOISE: Color = Srgb::new(25, 89, 82);

/// OK band.
pub const BLUE: Color = Srgb::new(0, 0, 255);

/// Indicator off, also used for out-of-range readings.
pub const OFF: Color = Srgb::new(0, 0, 0);

/// Maximum value of a color component.
pub const MAX_COMPONENT: u8 = u8::MAX;

/// Returns true if every component is zero.
#[inline]
pub fn is_off(color: Color) -> bool {
    color == OFF
}

/// Converts one color component to a PWM compare value.
///
/// `period` is the timer period in ticks (auto-reload + 1). Returns `None` for a
/// zero component, meaning the channel output should be disabled rather than
/// driven at zero duty.
#[inline]
pub fn duty_cycle(component: u8, period: u32) -> Option<u32> {
    if component == 0 {
        return None;
    }

    let scaled = (component as u64 * period as u64) / MAX_COMPONENT as u64;
    Some((scaled as u32).saturating_sub(1))
}
