//! Debounced push-button classifier.
//!
//! Provides [`ButtonFsm`], which filters contact bounce on a digital input and
//! reports the duration of each completed press. The duration is a one-shot
//! event: it stays readable until the consumer calls
//! [`ButtonFsm::reset_duration`].

use crate::fsm::{Fsm, StateMachine, Transition};
use crate::port::{ButtonPort, PeripheralId, PortError};
use crate::time::{Tick, TimeSource};

/// States of the button classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonState {
    /// Button up and stable.
    Released,
    /// Press detected, waiting out the bounce.
    PressedWait,
    /// Press confirmed.
    Pressed,
    /// Release detected, waiting out the bounce.
    ReleasedWait,
}

struct Button<'p, P: ButtonPort, T: TimeSource> {
    port: &'p P,
    clock: &'p T,
    id: PeripheralId,
    debounce_time_ms: u32,
    next_timeout: Tick,
    press_tick: Tick,
    duration_ms: u32,
}

impl<'p, P: ButtonPort, T: TimeSource> Button<'p, P, T> {
    fn transitions() -> [Transition<ButtonState, Self>; 4] {
        [
            Transition::new(
                ButtonState::Released,
                Self::check_button_pressed,
                ButtonState::PressedWait,
                Some(Self::do_store_press_tick),
            ),
            Transition::new(
                ButtonState::PressedWait,
                Self::check_timeout,
                ButtonState::Pressed,
                None,
            ),
            Transition::new(
                ButtonState::Pressed,
                Self::check_button_released,
                ButtonState::ReleasedWait,
                Some(Self::do_set_duration),
            ),
            Transition::new(
                ButtonState::ReleasedWait,
                Self::check_timeout,
                ButtonState::Released,
                None,
            ),
        ]
    }

    fn check_button_pressed(&self) -> bool {
        self.port.is_pressed(self.id)
    }

    fn check_button_released(&self) -> bool {
        !self.port.is_pressed(self.id)
    }

    fn check_timeout(&self) -> bool {
        self.clock.now().is_after(self.next_timeout)
    }

    fn do_store_press_tick(&mut self) {
        let now = self.clock.now();
        self.press_tick = now;
        self.next_timeout = now.wrapping_add(self.debounce_time_ms);
    }

    fn do_set_duration(&mut self) {
        let now = self.clock.now();
        self.duration_ms = now.elapsed_since(self.press_tick);
        self.next_timeout = now.wrapping_add(self.debounce_time_ms);
    }
}

/// Debounced button with press-duration measurement.
///
/// # Type Parameters
/// * `'p` - Lifetime of the port and clock references
/// * `P` - Button port implementation
/// * `T` - Millisecond time source
pub struct ButtonFsm<'p, P: ButtonPort, T: TimeSource> {
    fsm: Fsm<ButtonState, Button<'p, P, T>, 4>,
    button: Button<'p, P, T>,
}

impl<'p, P: ButtonPort, T: TimeSource> ButtonFsm<'p, P, T> {
    /// Creates a released button and configures its port.
    ///
    /// # Errors
    /// Returns the port error if `id` is not a known button.
    pub fn new(
        port: &'p P,
        clock: &'p T,
        debounce_time_ms: u32,
        id: PeripheralId,
    ) -> Result<Self, PortError> {
        port.init(id)?;

        Ok(Self {
            fsm: Fsm::new(Button::transitions()),
            button: Button {
                port,
                clock,
                id,
                debounce_time_ms,
                next_timeout: Tick::default(),
                press_tick: Tick::default(),
                duration_ms: 0,
            },
        })
    }

    /// Duration of the last completed press in ms, 0 if none is pending.
    pub fn duration(&self) -> u32 {
        self.button.duration_ms
    }

    /// Acknowledges the last press.
    pub fn reset_duration(&mut self) {
        self.button.duration_ms = 0;
    }

    /// Returns true while a press or a debounce window is in progress.
    pub fn check_activity(&self) -> bool {
        self.fsm.state() != ButtonState::Released
    }

    /// Returns the configured debounce time in ms.
    pub fn debounce_time_ms(&self) -> u32 {
        self.button.debounce_time_ms
    }

    /// Returns the peripheral identifier.
    pub fn id(&self) -> PeripheralId {
        self.button.id
    }
}

impl<P: ButtonPort, T: TimeSource> StateMachine for ButtonFsm<'_, P, T> {
    type State = ButtonState;

    fn fire(&mut self) -> bool {
        self.fsm.fire(&mut self.button)
    }

    fn state(&self) -> ButtonState {
        self.fsm.state()
    }

    fn set_state(&mut self, state: ButtonState) {
        self.fsm.set_state(state);
    }
}
