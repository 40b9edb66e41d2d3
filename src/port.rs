//! Hardware collaborator traits.
//!
//! These traits are the boundary between the state machines and the
//! platform-specific peripheral code. Implement them for your GPIO, timer and
//! PWM drivers. All methods take `&self`: the underlying flags and tick counters
//! are written from interrupt handlers, so implementations keep them in
//! single-word cells (or a critical-section mutex) rather than behind `&mut`.

use crate::colors::Color;

/// An identifier for one peripheral of a given kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeripheralId(pub u8);

impl From<u8> for PeripheralId {
    fn from(id: u8) -> Self {
        PeripheralId(id)
    }
}

impl From<PeripheralId> for usize {
    fn from(id: PeripheralId) -> Self {
        id.0 as usize
    }
}

/// Errors reported by the collaborator layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortError {
    /// No peripheral is registered under this identifier.
    InvalidId(PeripheralId),

    /// A peripheral is already registered under this identifier.
    DuplicateId(PeripheralId),

    /// The identifier exceeds the registry's capacity.
    IdOutOfBounds { id: PeripheralId, capacity: usize },
}

impl core::fmt::Display for PortError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PortError::InvalidId(id) => {
                write!(f, "peripheral ID {} is not registered", id.0)
            }
            PortError::DuplicateId(id) => {
                write!(f, "peripheral ID {} is already registered", id.0)
            }
            PortError::IdOutOfBounds { id, capacity } => {
                write!(
                    f,
                    "peripheral ID {} exceeds registry capacity of {}",
                    id.0, capacity
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for PortError {}

/// Push-button input.
pub trait ButtonPort {
    /// Configures the button. Fails if the identifier is unknown.
    fn init(&self, id: PeripheralId) -> Result<(), PortError>;

    /// Returns true while the button is held down.
    fn is_pressed(&self, id: PeripheralId) -> bool;
}

/// Ultrasonic transceiver: trigger output, echo input capture and the
/// periodic timer that opens a new sample window.
pub trait UltrasoundPort {
    /// Configures the transceiver. Fails if the identifier is unknown.
    fn init(&self, id: PeripheralId) -> Result<(), PortError>;

    /// Returns true while a new sample window is open.
    fn trigger_ready(&self, id: PeripheralId) -> bool;

    /// Opens or closes the sample window.
    fn set_trigger_ready(&self, id: PeripheralId, ready: bool);

    /// Raises the trigger line and starts the trigger, echo and sample timers.
    fn start_measurement(&self, id: PeripheralId);

    /// Returns true once the trigger pulse has been held for its full width.
    fn trigger_pulse_done(&self, id: PeripheralId) -> bool;

    /// Clears the pulse-complete flag.
    fn clear_trigger_pulse_done(&self, id: PeripheralId);

    /// Lowers the trigger line and stops its timer.
    fn stop_trigger_timer(&self, id: PeripheralId);

    /// Timer tick latched on the echo rising edge, 0 if not captured yet.
    fn echo_rising_tick(&self, id: PeripheralId) -> u32;

    /// Returns true once the echo falling edge has been captured.
    fn echo_received(&self, id: PeripheralId) -> bool;

    /// Timer tick latched on the echo falling edge.
    fn echo_falling_tick(&self, id: PeripheralId) -> u32;

    /// Number of capture-timer wraparounds between the two edges.
    fn echo_overflow_count(&self, id: PeripheralId) -> u32;

    /// Stops the echo capture timer.
    fn stop_echo_timer(&self, id: PeripheralId);

    /// Clears both captured ticks, the received flag and the overflow count.
    fn reset_echo_capture(&self, id: PeripheralId);

    /// Starts the periodic timer that opens sample windows.
    fn start_sample_timer(&self, id: PeripheralId);

    /// Stops every timer of this transceiver and clears the echo capture.
    fn stop_ranging(&self, id: PeripheralId);
}

/// Tri-color indicator.
pub trait DisplayPort {
    /// Configures the indicator and turns it off. Fails if the identifier is unknown.
    fn init(&self, id: PeripheralId) -> Result<(), PortError>;

    /// Drives the indicator to the given color.
    ///
    /// Implementations convert the 8-bit components to their native format
    /// (see [`crate::colors::duty_cycle`] for PWM). This method cannot fail.
    fn set_color(&self, id: PeripheralId, color: Color);
}
