//! Distance indicator.
//!
//! [`DisplayFsm`] maps the latest distance onto a color band and drives the RGB
//! indicator. Distances are pushed with [`DisplayFsm::set_distance`]; the color
//! is committed on the next [`StateMachine::fire`].

use crate::colors::{self, Color};
use crate::config::{INFO_MIN_CM, NO_PROBLEM_MIN_CM, OK_MAX_CM, OK_MIN_CM, WARNING_MIN_CM};
use crate::fsm::{Fsm, StateMachine, Transition};
use crate::port::{DisplayPort, PeripheralId, PortError};

/// States of the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayState {
    /// Disabled, indicator off.
    WaitDisplay,
    /// Enabled, tracking the distance.
    SetDisplay,
}

/// Returns the indicator color for a distance.
///
/// Bands are closed at their upper limit, so a boundary value belongs to the
/// nearer band. Anything beyond [`OK_MAX_CM`] turns the indicator off.
pub fn color_for_distance(distance_cm: u32) -> Color {
    match distance_cm {
        d if d <= WARNING_MIN_CM => colors::RED,
        d if d <= NO_PROBLEM_MIN_CM => colors::YELLOW,
        d if d <= INFO_MIN_CM => colors::GREEN,
        d if d <= OK_MIN_CM => colors::TURQUOISE,
        d if d <= OK_MAX_CM => colors::BLUE,
        _ => colors::OFF,
    }
}

struct Display<'p, P: DisplayPort> {
    port: &'p P,
    id: PeripheralId,
    distance_cm: Option<u32>,
    new_color: bool,
    enabled: bool,
    idle: bool,
}

impl<'p, P: DisplayPort> Display<'p, P> {
    fn transitions() -> [Transition<DisplayState, Self>; 3] {
        [
            Transition::new(
                DisplayState::WaitDisplay,
                Self::check_active,
                DisplayState::SetDisplay,
                Some(Self::do_set_on),
            ),
            Transition::new(
                DisplayState::SetDisplay,
                Self::check_set_new_color,
                DisplayState::SetDisplay,
                Some(Self::do_set_color),
            ),
            Transition::new(
                DisplayState::SetDisplay,
                Self::check_off,
                DisplayState::WaitDisplay,
                Some(Self::do_set_off),
            ),
        ]
    }

    fn check_active(&self) -> bool {
        self.enabled
    }

    fn check_set_new_color(&self) -> bool {
        self.new_color
    }

    fn check_off(&self) -> bool {
        !self.enabled
    }

    fn do_set_on(&mut self) {
        self.port.set_color(self.id, colors::OFF);
        self.idle = !self.new_color;
    }

    fn do_set_color(&mut self) {
        let color = self.distance_cm.map_or(colors::OFF, color_for_distance);
        self.port.set_color(self.id, color);
        self.new_color = false;
        self.idle = true;
    }

    fn do_set_off(&mut self) {
        self.port.set_color(self.id, colors::OFF);
        self.enabled = false;
        self.idle = true;
    }
}

/// RGB distance indicator state machine.
///
/// # Type Parameters
/// * `'p` - Lifetime of the port reference
/// * `P` - Display port implementation
pub struct DisplayFsm<'p, P: DisplayPort> {
    fsm: Fsm<DisplayState, Display<'p, P>, 3>,
    display: Display<'p, P>,
}

impl<'p, P: DisplayPort> DisplayFsm<'p, P> {
    /// Creates a disabled indicator and configures its port.
    ///
    /// # Errors
    /// Returns the port error if `id` is not a known indicator.
    pub fn new(port: &'p P, id: PeripheralId) -> Result<Self, PortError> {
        port.init(id)?;

        Ok(Self {
            fsm: Fsm::new(Display::transitions()),
            display: Display {
                port,
                id,
                distance_cm: None,
                new_color: false,
                enabled: false,
                idle: true,
            },
        })
    }

    /// Stores a distance and flags a pending color update.
    pub fn set_distance(&mut self, distance_cm: u32) {
        self.display.distance_cm = Some(distance_cm);
        self.display.new_color = true;
        self.display.idle = false;
    }

    /// Enables or disables the indicator. Takes effect on the next fire.
    pub fn set_status(&mut self, enabled: bool) {
        if enabled && !self.display.enabled {
            self.display.idle = false;
        }
        self.display.enabled = enabled;
    }

    pub fn status(&self) -> bool {
        self.display.enabled
    }

    /// Last distance received, `None` before the first one.
    pub fn distance(&self) -> Option<u32> {
        self.display.distance_cm
    }

    /// Returns true if a color update is waiting for the next fire.
    pub fn pending_update(&self) -> bool {
        self.display.new_color
    }

    /// Returns true while enabled with an uncommitted change.
    pub fn check_activity(&self) -> bool {
        self.display.enabled && !self.display.idle
    }

    pub fn id(&self) -> PeripheralId {
        self.display.id
    }
}

impl<P: DisplayPort> StateMachine for DisplayFsm<'_, P> {
    type State = DisplayState;

    fn fire(&mut self) -> bool {
        self.fsm.fire(&mut self.display)
    }

    fn state(&self) -> DisplayState {
        self.fsm.state()
    }

    fn set_state(&mut self, state: DisplayState) {
        self.fsm.set_state(state);
    }
}
