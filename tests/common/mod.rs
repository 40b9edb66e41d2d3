//! Shared test infrastructure for urbanite integration tests

#![allow(dead_code)] // Items used across multiple test files; Rust analyzes per-file

use core::cell::RefCell;

use urbanite::sim::{SimButtonPort, SimClock, SimDisplayPort, SimUltrasoundPort};
use urbanite::{ButtonFsm, DisplayFsm, PeripheralId, StateMachine, UltrasoundFsm};

// ============================================================================
// Test Bench
// ============================================================================

pub const ID: PeripheralId = PeripheralId(0);
pub const MAX_IDS: usize = 2;
pub const HISTORY: usize = 64;

/// Debounce time used by every bench button
pub const DEBOUNCE_MS: u32 = 100;

/// Non-zero tick latched on every simulated echo rising edge
pub const RISING_TICK: u32 = 1_000;

pub type TestButton<'a> = ButtonFsm<'a, SimButtonPort<MAX_IDS>, SimClock>;
pub type TestSensor<'a> = UltrasoundFsm<'a, SimUltrasoundPort<MAX_IDS>>;
pub type TestDisplay<'a> = DisplayFsm<'a, SimDisplayPort<MAX_IDS, HISTORY>>;

/// Simulated hardware with one peripheral of each kind registered under `ID`
pub struct Bench {
    pub clock: SimClock,
    pub buttons: SimButtonPort<MAX_IDS>,
    pub sensors: SimUltrasoundPort<MAX_IDS>,
    pub leds: SimDisplayPort<MAX_IDS, HISTORY>,
}

impl Bench {
    pub fn new() -> Self {
        let mut buttons = SimButtonPort::new();
        let mut sensors = SimUltrasoundPort::new();
        let mut leds = SimDisplayPort::new();
        buttons.register(ID).unwrap();
        sensors.register(ID).unwrap();
        leds.register(ID).unwrap();

        Self {
            clock: SimClock::new(),
            buttons,
            sensors,
            leds,
        }
    }

    pub fn button(&self) -> TestButton<'_> {
        ButtonFsm::new(&self.buttons, &self.clock, DEBOUNCE_MS, ID).unwrap()
    }

    pub fn sensor(&self) -> TestSensor<'_> {
        UltrasoundFsm::new(&self.sensors, ID).unwrap()
    }

    pub fn display(&self) -> TestDisplay<'_> {
        DisplayFsm::new(&self.leds, ID).unwrap()
    }

    /// Emulates the echo capture interrupts for an obstacle at `cm`
    pub fn echo(&self, cm: u32) {
        let end = RISING_TICK + echo_us_for_cm(cm);
        self.sensors.capture_rising(ID, RISING_TICK).unwrap();
        self.sensors
            .capture_falling(ID, end % 65_536, end / 65_536)
            .unwrap();
    }
}

// ============================================================================
// Test Helper Functions
// ============================================================================

/// Shortest echo time (µs) that converts to exactly `cm`
pub fn echo_us_for_cm(cm: u32) -> u32 {
    (cm * 20_000).div_ceil(343)
}

/// Runs one full trigger/echo cycle on a sensor that is enabled and idle.
///
/// Opens a sample window first unless one is already open.
pub fn ping(bench: &Bench, sensor: &mut TestSensor<'_>, cm: u32) {
    if !sensor.is_ready() {
        bench.sensors.open_sample_window(ID).unwrap();
    }
    assert!(sensor.fire(), "trigger did not start");
    bench.sensors.finish_trigger(ID).unwrap();
    assert!(sensor.fire(), "trigger did not end");
    bench.echo(cm);
    assert!(sensor.fire(), "rising edge not seen");
    assert!(sensor.fire(), "falling edge not seen");
}

/// Lets any earlier release bounce settle, holds the button for `held_ms`
/// (longer than the debounce time), then releases it.
///
/// Fires only the button; the press duration is left pending.
pub fn press_for(bench: &Bench, button: &RefCell<TestButton<'_>>, held_ms: u32) {
    // Settle any earlier release bounce
    bench.clock.advance(DEBOUNCE_MS + 1);
    button.borrow_mut().fire();

    bench.buttons.press(ID).unwrap();
    button.borrow_mut().fire();
    bench.clock.advance(held_ms);
    button.borrow_mut().fire();
    bench.buttons.release(ID).unwrap();
    button.borrow_mut().fire();
}

/// One pass of the main loop, in the order the application fires the machines
pub fn cycle<B, U, D, S>(
    button: &RefCell<B>,
    sensor: &RefCell<U>,
    display: &RefCell<D>,
    urbanite: &mut S,
) where
    B: StateMachine,
    U: StateMachine,
    D: StateMachine,
    S: StateMachine,
{
    button.borrow_mut().fire();
    sensor.borrow_mut().fire();
    display.borrow_mut().fire();
    urbanite.fire();
}
