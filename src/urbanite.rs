//! Supervisory state machine.
//!
//! [`UrbaniteFsm`] turns button press durations into mode changes, forwards
//! distances from the ranging machine to the indicator and puts the processor to
//! sleep whenever no peripheral machine has work in flight.
//!
//! The supervisor does not own the peripheral machines. The application keeps
//! each one in a [`RefCell`] so it can fire them from the main loop, and hands
//! the supervisor shared references to those cells. Borrows only last for the
//! duration of one guard or action.
//!
//! # Example
//!
//! ```
//! use core::cell::RefCell;
//! use urbanite::sim::{SimButtonPort, SimClock, SimDisplayPort, SimUltrasoundPort};
//! use urbanite::{
//!     ButtonFsm, DisplayFsm, PeripheralId, StateMachine, UltrasoundFsm, UrbaniteConfig,
//!     UrbaniteFsm,
//! };
//!
//! let id = PeripheralId(0);
//! let clock = SimClock::new();
//! let mut buttons: SimButtonPort<1> = SimButtonPort::new();
//! let mut sensors: SimUltrasoundPort<1> = SimUltrasoundPort::new();
//! let mut leds: SimDisplayPort<1, 8> = SimDisplayPort::new();
//! buttons.register(id).unwrap();
//! sensors.register(id).unwrap();
//! leds.register(id).unwrap();
//!
//! let button = RefCell::new(ButtonFsm::new(&buttons, &clock, 100, id).unwrap());
//! let sensor = RefCell::new(UltrasoundFsm::new(&sensors, id).unwrap());
//! let display = RefCell::new(DisplayFsm::new(&leds, id).unwrap());
//! let mut urbanite =
//!     UrbaniteFsm::new(&button, &sensor, &display, &clock, UrbaniteConfig::default());
//!
//! button.borrow_mut().fire();
//! sensor.borrow_mut().fire();
//! display.borrow_mut().fire();
//! urbanite.fire();
//! ```

use core::cell::RefCell;

use crate::button::ButtonFsm;
use crate::config::{UrbaniteConfig, WARNING_MIN_CM};
use crate::display::DisplayFsm;
use crate::fsm::{Fsm, StateMachine, Transition};
use crate::port::{ButtonPort, DisplayPort, UltrasoundPort};
use crate::time::{LowPower, TimeSource};
use crate::ultrasound::UltrasoundFsm;

/// States of the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UrbaniteState {
    /// System off, waiting for an on/off press.
    Off,
    /// Ranging active, distances forwarded to the indicator.
    Measure,
    /// Asleep while off.
    SleepWhileOff,
    /// Asleep between measurements.
    SleepWhileOn,
}

/// What the supervisor needs from the button.
pub trait ButtonControl {
    /// Duration of the last completed press, 0 if none is pending.
    fn duration(&self) -> u32;
    /// Acknowledges the last press.
    fn reset_duration(&mut self);
    /// Returns true while a press is in progress.
    fn check_activity(&self) -> bool;
}

/// What the supervisor needs from the ranging machine.
pub trait UltrasoundControl {
    /// Enables ranging.
    fn start(&mut self);
    /// Disables ranging.
    fn stop(&mut self);
    /// Returns the latest median and acknowledges it.
    fn distance(&mut self) -> u32;
    /// Returns true if a median is waiting to be read.
    fn new_measurement_ready(&self) -> bool;
    /// Returns true while a measurement is in flight.
    fn check_activity(&self) -> bool;
}

/// What the supervisor needs from the indicator.
pub trait DisplayControl {
    /// Pushes a new distance.
    fn set_distance(&mut self, distance_cm: u32);
    /// Enables or disables the indicator.
    fn set_status(&mut self, enabled: bool);
    /// Returns true while a color update is in flight.
    fn check_activity(&self) -> bool;
}

impl<P: ButtonPort, T: TimeSource> ButtonControl for ButtonFsm<'_, P, T> {
    fn duration(&self) -> u32 {
        ButtonFsm::duration(self)
    }

    fn reset_duration(&mut self) {
        ButtonFsm::reset_duration(self);
    }

    fn check_activity(&self) -> bool {
        ButtonFsm::check_activity(self)
    }
}

impl<P: UltrasoundPort> UltrasoundControl for UltrasoundFsm<'_, P> {
    fn start(&mut self) {
        UltrasoundFsm::start(self);
    }

    fn stop(&mut self) {
        UltrasoundFsm::stop(self);
    }

    fn distance(&mut self) -> u32 {
        UltrasoundFsm::distance(self)
    }

    fn new_measurement_ready(&self) -> bool {
        UltrasoundFsm::new_measurement_ready(self)
    }

    fn check_activity(&self) -> bool {
        UltrasoundFsm::check_activity(self)
    }
}

impl<P: DisplayPort> DisplayControl for DisplayFsm<'_, P> {
    fn set_distance(&mut self, distance_cm: u32) {
        DisplayFsm::set_distance(self, distance_cm);
    }

    fn set_status(&mut self, enabled: bool) {
        DisplayFsm::set_status(self, enabled);
    }

    fn check_activity(&self) -> bool {
        DisplayFsm::check_activity(self)
    }
}

struct Urbanite<'a, B, U, D, W> {
    button: &'a RefCell<B>,
    ultrasound: &'a RefCell<U>,
    display: &'a RefCell<D>,
    power: &'a W,
    config: UrbaniteConfig,
    is_paused: bool,
}

impl<'a, B, U, D, W> Urbanite<'a, B, U, D, W>
where
    B: ButtonControl,
    U: UltrasoundControl,
    D: DisplayControl,
    W: LowPower,
{
    fn transitions() -> [Transition<UrbaniteState, Self>; 10] {
        use UrbaniteState::*;

        [
            Transition::new(Off, Self::check_on_off, Measure, Some(Self::do_start_up_measure)),
            Transition::new(Off, Self::check_no_activity, SleepWhileOff, Some(Self::do_sleep)),
            Transition::new(Measure, Self::check_on_off, Off, Some(Self::do_stop_urbanite)),
            Transition::new(
                Measure,
                Self::check_pause_display,
                Measure,
                Some(Self::do_pause_display),
            ),
            Transition::new(
                Measure,
                Self::check_new_measure,
                Measure,
                Some(Self::do_display_distance),
            ),
            Transition::new(Measure, Self::check_no_activity, SleepWhileOn, Some(Self::do_sleep)),
            Transition::new(SleepWhileOn, Self::check_new_measure, Measure, None),
            Transition::new(
                SleepWhileOn,
                Self::check_no_activity,
                SleepWhileOn,
                Some(Self::do_sleep),
            ),
            Transition::new(SleepWhileOff, Self::check_activity, Off, None),
            Transition::new(
                SleepWhileOff,
                Self::check_no_activity,
                SleepWhileOff,
                Some(Self::do_sleep),
            ),
        ]
    }

    fn check_on_off(&self) -> bool {
        self.button.borrow().duration() > self.config.on_off_press_time_ms
    }

    fn check_pause_display(&self) -> bool {
        let duration = self.button.borrow().duration();
        duration > self.config.pause_display_time_ms
            && duration < self.config.on_off_press_time_ms
    }

    fn check_new_measure(&self) -> bool {
        self.ultrasound.borrow().new_measurement_ready()
    }

    fn check_activity(&self) -> bool {
        self.button.borrow().check_activity()
            || self.display.borrow().check_activity()
            || self.ultrasound.borrow().check_activity()
    }

    fn check_no_activity(&self) -> bool {
        !self.check_activity()
    }

    fn do_start_up_measure(&mut self) {
        self.button.borrow_mut().reset_duration();
        self.ultrasound.borrow_mut().start();
        self.display.borrow_mut().set_status(true);

        #[cfg(feature = "defmt")]
        defmt::info!("[URBANITE] Urbanite system ON");
    }

    fn do_stop_urbanite(&mut self) {
        self.button.borrow_mut().reset_duration();
        self.ultrasound.borrow_mut().stop();
        self.display.borrow_mut().set_status(false);
        self.is_paused = false;

        #[cfg(feature = "defmt")]
        defmt::info!("[URBANITE] Urbanite system OFF");
    }

    fn do_pause_display(&mut self) {
        self.button.borrow_mut().reset_duration();
        self.is_paused = !self.is_paused;
        self.display.borrow_mut().set_status(!self.is_paused);

        #[cfg(feature = "defmt")]
        defmt::info!(
            "[URBANITE] Urbanite system display {}",
            if self.is_paused { "PAUSE" } else { "RESUME" }
        );
    }

    fn do_display_distance(&mut self) {
        let distance_cm = self.ultrasound.borrow_mut().distance();
        let mut display = self.display.borrow_mut();

        if !self.is_paused {
            display.set_distance(distance_cm);
        } else if distance_cm < WARNING_MIN_CM / 2 {
            // Paused, but close enough to warn anyway
            display.set_distance(distance_cm);
            display.set_status(true);
        } else {
            display.set_status(false);
        }

        #[cfg(feature = "defmt")]
        defmt::info!("[URBANITE] Distance: {} cm", distance_cm);
    }

    fn do_sleep(&mut self) {
        self.power.sleep();
    }
}

/// Top-level parking-aid controller.
///
/// # Type Parameters
/// * `'a` - Lifetime of the shared peripheral machines and power control
/// * `B` - Button machine
/// * `U` - Ranging machine
/// * `D` - Indicator machine
/// * `W` - Low-power control
///
/// # Panics
/// [`StateMachine::fire`] panics if one of the peripheral cells is mutably
/// borrowed by the caller at the time of the call.
pub struct UrbaniteFsm<'a, B, U, D, W> {
    fsm: Fsm<UrbaniteState, Urbanite<'a, B, U, D, W>, 10>,
    urbanite: Urbanite<'a, B, U, D, W>,
}

impl<'a, B, U, D, W> UrbaniteFsm<'a, B, U, D, W>
where
    B: ButtonControl,
    U: UltrasoundControl,
    D: DisplayControl,
    W: LowPower,
{
    /// Creates a supervisor in [`UrbaniteState::Off`].
    pub fn new(
        button: &'a RefCell<B>,
        ultrasound: &'a RefCell<U>,
        display: &'a RefCell<D>,
        power: &'a W,
        config: UrbaniteConfig,
    ) -> Self {
        Self {
            fsm: Fsm::new(Urbanite::transitions()),
            urbanite: Urbanite {
                button,
                ultrasound,
                display,
                power,
                config,
                is_paused: false,
            },
        }
    }

    /// Returns true while the indicator is paused.
    pub fn is_paused(&self) -> bool {
        self.urbanite.is_paused
    }

    pub fn config(&self) -> &UrbaniteConfig {
        &self.urbanite.config
    }
}

impl<B, U, D, W> StateMachine for UrbaniteFsm<'_, B, U, D, W>
where
    B: ButtonControl,
    U: UltrasoundControl,
    D: DisplayControl,
    W: LowPower,
{
    type State = UrbaniteState;

    fn fire(&mut self) -> bool {
        self.fsm.fire(&mut self.urbanite)
    }

    fn state(&self) -> UrbaniteState {
        self.fsm.state()
    }

    fn set_state(&mut self, state: UrbaniteState) {
        self.fsm.set_state(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    #[derive(Default)]
    struct FakeButton {
        duration: u32,
        active: bool,
    }

    impl ButtonControl for FakeButton {
        fn duration(&self) -> u32 {
            self.duration
        }

        fn reset_duration(&mut self) {
            self.duration = 0;
        }

        fn check_activity(&self) -> bool {
            self.active
        }
    }

    #[derive(Default)]
    struct FakeUltrasound {
        running: bool,
        distance: u32,
        ready: bool,
        active: bool,
    }

    impl UltrasoundControl for FakeUltrasound {
        fn start(&mut self) {
            self.running = true;
        }

        fn stop(&mut self) {
            self.running = false;
        }

        fn distance(&mut self) -> u32 {
            self.ready = false;
            self.distance
        }

        fn new_measurement_ready(&self) -> bool {
            self.ready
        }

        fn check_activity(&self) -> bool {
            self.active
        }
    }

    #[derive(Default)]
    struct FakeDisplay {
        enabled: bool,
        distance: Option<u32>,
        active: bool,
    }

    impl DisplayControl for FakeDisplay {
        fn set_distance(&mut self, distance_cm: u32) {
            self.distance = Some(distance_cm);
        }

        fn set_status(&mut self, enabled: bool) {
            self.enabled = enabled;
        }

        fn check_activity(&self) -> bool {
            self.active
        }
    }

    #[derive(Default)]
    struct FakePower {
        sleeps: Cell<u32>,
    }

    impl LowPower for FakePower {
        fn sleep(&self) {
            self.sleeps.set(self.sleeps.get() + 1);
        }
    }

    struct Rig {
        button: RefCell<FakeButton>,
        ultrasound: RefCell<FakeUltrasound>,
        display: RefCell<FakeDisplay>,
        power: FakePower,
    }

    impl Rig {
        fn new() -> Self {
            Self {
                button: RefCell::new(FakeButton::default()),
                ultrasound: RefCell::new(FakeUltrasound::default()),
                display: RefCell::new(FakeDisplay::default()),
                power: FakePower::default(),
            }
        }

        fn urbanite(&self) -> UrbaniteFsm<'_, FakeButton, FakeUltrasound, FakeDisplay, FakePower> {
            UrbaniteFsm::new(
                &self.button,
                &self.ultrasound,
                &self.display,
                &self.power,
                UrbaniteConfig::new(1000, 500),
            )
        }
    }

    #[test]
    fn thresholds_are_strict() {
        let rig = Rig::new();
        let mut urbanite = rig.urbanite();
        rig.button.borrow_mut().active = true;

        rig.button.borrow_mut().duration = 1000;
        assert!(!urbanite.fire());
        assert_eq!(urbanite.state(), UrbaniteState::Off);

        rig.button.borrow_mut().duration = 1001;
        urbanite.fire();
        assert_eq!(urbanite.state(), UrbaniteState::Measure);

        rig.button.borrow_mut().duration = 500;
        assert!(!urbanite.fire());
        assert!(!urbanite.is_paused());
    }

    #[test]
    fn paused_display_wakes_for_near_field_only() {
        let rig = Rig::new();
        let mut urbanite = rig.urbanite();
        urbanite.set_state(UrbaniteState::Measure);
        rig.button.borrow_mut().active = true;

        rig.button.borrow_mut().duration = 700;
        urbanite.fire();
        assert!(urbanite.is_paused());
        assert!(!rig.display.borrow().enabled);

        rig.ultrasound.borrow_mut().distance = 10;
        rig.ultrasound.borrow_mut().ready = true;
        urbanite.fire();
        assert!(rig.display.borrow().enabled);
        assert_eq!(rig.display.borrow().distance, Some(10));

        rig.ultrasound.borrow_mut().distance = 40;
        rig.ultrasound.borrow_mut().ready = true;
        urbanite.fire();
        assert!(!rig.display.borrow().enabled);
        assert_eq!(rig.display.borrow().distance, Some(10));
    }

    #[test]
    fn stop_clears_pause_and_disables_display() {
        let rig = Rig::new();
        let mut urbanite = rig.urbanite();
        urbanite.set_state(UrbaniteState::Measure);
        rig.button.borrow_mut().active = true;

        rig.button.borrow_mut().duration = 700;
        urbanite.fire();
        rig.button.borrow_mut().duration = 1500;
        urbanite.fire();

        assert_eq!(urbanite.state(), UrbaniteState::Off);
        assert!(!urbanite.is_paused());
        assert!(!rig.display.borrow().enabled);
        assert!(!rig.ultrasound.borrow().running);
        assert_eq!(rig.button.borrow().duration, 0);
    }

    #[test]
    fn idle_supervisor_sleeps_in_every_mode() {
        let rig = Rig::new();
        let mut urbanite = rig.urbanite();

        urbanite.fire();
        assert_eq!(urbanite.state(), UrbaniteState::SleepWhileOff);
        urbanite.fire();
        assert_eq!(urbanite.state(), UrbaniteState::SleepWhileOff);

        urbanite.set_state(UrbaniteState::Measure);
        urbanite.fire();
        assert_eq!(urbanite.state(), UrbaniteState::SleepWhileOn);
        urbanite.fire();

        assert_eq!(rig.power.sleeps.get(), 4);
        assert_eq!(urbanite.config().pause_display_time_ms, 500);
    }

    #[test]
    fn display_activity_wakes_supervisor_while_off() {
        let rig = Rig::new();
        let mut urbanite = rig.urbanite();
        urbanite.set_state(UrbaniteState::SleepWhileOff);

        rig.display.borrow_mut().active = true;
        urbanite.fire();
        assert_eq!(urbanite.state(), UrbaniteState::Off);
        assert_eq!(rig.power.sleeps.get(), 0);
    }
}
