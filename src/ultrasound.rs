//! Ultrasonic ranging with a median-of-5 filter.
//!
//! [`UltrasoundFsm`] issues a trigger pulse each time the port opens a sample
//! window, times the echo through input capture and converts the round trip to
//! centimeters. Every fifth sample the buffer is sorted and the median is
//! published, which rejects spurious reflections without smoothing real motion.

use crate::config::{ECHO_TIMER_PERIOD_TICKS, SPEED_OF_SOUND_M_S, ULTRASOUND_NUM_MEASUREMENTS};
use crate::fsm::{Fsm, StateMachine, Transition};
use crate::port::{PeripheralId, PortError, UltrasoundPort};

/// States of the ranging cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UltrasoundState {
    /// Waiting to be enabled and for a sample window.
    WaitStart,
    /// Trigger pulse in progress.
    TriggerStart,
    /// Waiting for the echo rising edge.
    WaitEchoStart,
    /// Waiting for the echo falling edge.
    WaitEchoEnd,
    /// Sample stored, waiting for the next window.
    SetDistance,
}

/// Echo pulse width in microseconds from captured timer ticks.
///
/// The capture timer runs at 1 µs per tick and wraps every
/// [`ECHO_TIMER_PERIOD_TICKS`]; `overflows` counts the wraps between the edges.
#[inline]
pub fn echo_elapsed_us(rising: u32, falling: u32, overflows: u32) -> u64 {
    let end = falling as u64 + overflows as u64 * ECHO_TIMER_PERIOD_TICKS as u64;
    end.saturating_sub(rising as u64)
}

/// Converts a round-trip echo time to a one-way distance in centimeters.
#[inline]
pub fn echo_time_to_distance_cm(elapsed_us: u64) -> u32 {
    // µs * m/s * 100 cm/m / 1e6 µs/s / 2 (round trip)
    let cm = elapsed_us * SPEED_OF_SOUND_M_S as u64 / 20_000;
    u32::try_from(cm).unwrap_or(u32::MAX)
}

struct Ultrasound<'p, P: UltrasoundPort> {
    port: &'p P,
    id: PeripheralId,
    enabled: bool,
    samples: [u32; ULTRASOUND_NUM_MEASUREMENTS],
    sample_idx: usize,
    distance_cm: u32,
    new_measurement: bool,
}

impl<'p, P: UltrasoundPort> Ultrasound<'p, P> {
    fn transitions() -> [Transition<UltrasoundState, Self>; 6] {
        [
            Transition::new(
                UltrasoundState::WaitStart,
                Self::check_on,
                UltrasoundState::TriggerStart,
                Some(Self::do_start_measurement),
            ),
            Transition::new(
                UltrasoundState::TriggerStart,
                Self::check_trigger_end,
                UltrasoundState::WaitEchoStart,
                Some(Self::do_stop_trigger),
            ),
            Transition::new(
                UltrasoundState::WaitEchoStart,
                Self::check_echo_init,
                UltrasoundState::WaitEchoEnd,
                None,
            ),
            Transition::new(
                UltrasoundState::WaitEchoEnd,
                Self::check_echo_received,
                UltrasoundState::SetDistance,
                Some(Self::do_set_distance),
            ),
            Transition::new(
                UltrasoundState::SetDistance,
                Self::check_on,
                UltrasoundState::TriggerStart,
                Some(Self::do_start_measurement),
            ),
            Transition::new(
                UltrasoundState::SetDistance,
                Self::check_off,
                UltrasoundState::WaitStart,
                Some(Self::do_stop_measurement),
            ),
        ]
    }

    fn check_on(&self) -> bool {
        self.enabled && self.port.trigger_ready(self.id)
    }

    fn check_off(&self) -> bool {
        !self.enabled
    }

    fn check_trigger_end(&self) -> bool {
        self.port.trigger_pulse_done(self.id)
    }

    fn check_echo_init(&self) -> bool {
        self.port.echo_rising_tick(self.id) > 0
    }

    fn check_echo_received(&self) -> bool {
        self.port.echo_received(self.id)
    }

    fn do_start_measurement(&mut self) {
        self.port.start_measurement(self.id);
    }

    fn do_stop_trigger(&mut self) {
        self.port.stop_trigger_timer(self.id);
        self.port.clear_trigger_pulse_done(self.id);
    }

    fn do_set_distance(&mut self) {
        let elapsed_us = echo_elapsed_us(
            self.port.echo_rising_tick(self.id),
            self.port.echo_falling_tick(self.id),
            self.port.echo_overflow_count(self.id),
        );
        self.samples[self.sample_idx] = echo_time_to_distance_cm(elapsed_us);

        if self.sample_idx == ULTRASOUND_NUM_MEASUREMENTS - 1 {
            let mut sorted = self.samples;
            sorted.sort_unstable();
            self.distance_cm = sorted[ULTRASOUND_NUM_MEASUREMENTS / 2];
            self.new_measurement = true;

            #[cfg(feature = "defmt")]
            defmt::debug!("[ULTRASOUND] median {} cm", self.distance_cm);
        }
        self.sample_idx = (self.sample_idx + 1) % ULTRASOUND_NUM_MEASUREMENTS;

        self.port.stop_echo_timer(self.id);
        self.port.reset_echo_capture(self.id);
    }

    fn do_stop_measurement(&mut self) {
        self.port.stop_ranging(self.id);
    }

    fn reset_filter(&mut self) {
        self.samples = [0; ULTRASOUND_NUM_MEASUREMENTS];
        self.sample_idx = 0;
        self.distance_cm = 0;
        self.new_measurement = false;
    }
}

/// Ultrasonic distance sensor state machine.
///
/// # Type Parameters
/// * `'p` - Lifetime of the port reference
/// * `P` - Ultrasound port implementation
pub struct UltrasoundFsm<'p, P: UltrasoundPort> {
    fsm: Fsm<UltrasoundState, Ultrasound<'p, P>, 6>,
    sensor: Ultrasound<'p, P>,
}

impl<'p, P: UltrasoundPort> UltrasoundFsm<'p, P> {
    /// Creates a disabled sensor and configures its port.
    ///
    /// # Errors
    /// Returns the port error if `id` is not a known transceiver.
    pub fn new(port: &'p P, id: PeripheralId) -> Result<Self, PortError> {
        port.init(id)?;

        Ok(Self {
            fsm: Fsm::new(Ultrasound::transitions()),
            sensor: Ultrasound {
                port,
                id,
                enabled: false,
                samples: [0; ULTRASOUND_NUM_MEASUREMENTS],
                sample_idx: 0,
                distance_cm: 0,
                new_measurement: false,
            },
        })
    }

    /// Enables ranging and opens the first sample window.
    pub fn start(&mut self) {
        let sensor = &mut self.sensor;
        sensor.enabled = true;
        sensor.reset_filter();
        sensor.port.reset_echo_capture(sensor.id);
        sensor.port.set_trigger_ready(sensor.id, true);
        sensor.port.start_sample_timer(sensor.id);
    }

    /// Disables ranging and stops every timer of the transceiver.
    ///
    /// A cycle with a pulse or echo in flight is abandoned and the machine goes
    /// back to [`UltrasoundState::WaitStart`]; a machine parked in
    /// [`UltrasoundState::SetDistance`] leaves through its table on the next fire.
    pub fn stop(&mut self) {
        let sensor = &mut self.sensor;
        sensor.enabled = false;
        sensor.reset_filter();
        sensor.port.stop_ranging(sensor.id);

        if self.check_activity() {
            self.fsm.set_state(UltrasoundState::WaitStart);
        }
    }

    /// Returns the last published median and acknowledges it.
    pub fn distance(&mut self) -> u32 {
        self.sensor.new_measurement = false;
        self.sensor.distance_cm
    }

    /// Returns true if a median was published and not yet read.
    pub fn new_measurement_ready(&self) -> bool {
        self.sensor.new_measurement
    }

    /// Returns true while a pulse or its echo is in flight.
    pub fn check_activity(&self) -> bool {
        matches!(
            self.fsm.state(),
            UltrasoundState::TriggerStart
                | UltrasoundState::WaitEchoStart
                | UltrasoundState::WaitEchoEnd
        )
    }

    /// Returns true if ranging is enabled.
    pub fn status(&self) -> bool {
        self.sensor.enabled
    }

    /// Sets the enabled flag without touching the port.
    pub fn set_status(&mut self, enabled: bool) {
        self.sensor.enabled = enabled;
    }

    /// Returns true while the port's sample window is open.
    pub fn is_ready(&self) -> bool {
        self.sensor.port.trigger_ready(self.sensor.id)
    }

    pub fn id(&self) -> PeripheralId {
        self.sensor.id
    }
}

impl<P: UltrasoundPort> StateMachine for UltrasoundFsm<'_, P> {
    type State = UltrasoundState;

    fn fire(&mut self) -> bool {
        self.fsm.fire(&mut self.sensor)
    }

    fn state(&self) -> UltrasoundState {
        self.fsm.state()
    }

    fn set_state(&mut self, state: UltrasoundState) {
        self.fsm.set_state(state);
    }
}
