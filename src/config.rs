//! System-wide constants and runtime configuration.
//!
//! Peripheral identifiers, timing parameters and the display distance bands
//! live here so they can be tuned in one place.

use crate::port::PeripheralId;

// Peripheral identifiers

/// Rear parking button (arms/disarms the system).
pub const PARKING_BUTTON_ID: PeripheralId = PeripheralId(0);

/// Rear parking ultrasonic sensor.
pub const REAR_PARKING_SENSOR_ID: PeripheralId = PeripheralId(0);

/// Rear parking RGB indicator.
pub const REAR_PARKING_DISPLAY_ID: PeripheralId = PeripheralId(0);

// Button

/// Button debounce time (ms).
pub const BUTTON_DEBOUNCE_TIME_MS: u32 = 100;

// Supervisor

/// Presses longer than this toggle the system on/off (ms).
pub const ON_OFF_PRESS_TIME_MS: u32 = 1000;

/// Presses longer than this (and shorter than the on/off press) toggle the display pause (ms).
pub const PAUSE_DISPLAY_TIME_MS: u32 = 500;

// Ultrasound

/// Speed of sound in air (m/s).
pub const SPEED_OF_SOUND_M_S: u32 = 343;

/// Trigger pulse width (µs).
pub const TRIGGER_UP_US: u32 = 10;

/// Period of the timer that opens a new sample window (ms).
pub const SENSOR_SAMPLE_PERIOD_MS: u32 = 100;

/// Ticks per wraparound of the 16-bit echo capture timer (1 µs per tick).
pub const ECHO_TIMER_PERIOD_TICKS: u32 = 65_536;

/// Samples kept by the median filter.
pub const ULTRASOUND_NUM_MEASUREMENTS: usize = 5;

// Display bands (cm). Each band is closed at its upper limit.

pub const DANGER_MIN_CM: u32 = 0;
pub const WARNING_MIN_CM: u32 = 25;
pub const NO_PROBLEM_MIN_CM: u32 = 50;
pub const INFO_MIN_CM: u32 = 150;
pub const OK_MIN_CM: u32 = 175;
pub const OK_MAX_CM: u32 = 200;

/// Press-duration thresholds of the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UrbaniteConfig {
    /// Presses strictly longer than this toggle the system on/off (ms).
    pub on_off_press_time_ms: u32,

    /// Presses strictly between this and `on_off_press_time_ms` toggle the pause (ms).
    pub pause_display_time_ms: u32,
}

impl UrbaniteConfig {
    /// Creates a configuration with explicit thresholds.
    pub const fn new(on_off_press_time_ms: u32, pause_display_time_ms: u32) -> Self {
        Self {
            on_off_press_time_ms,
            pause_display_time_ms,
        }
    }
}

impl Default for UrbaniteConfig {
    fn default() -> Self {
        Self::new(ON_OFF_PRESS_TIME_MS, PAUSE_DISPLAY_TIME_MS)
    }
}
