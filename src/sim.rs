//! Host-side simulation of the peripheral ports.
//!
//! These backends stand in for the GPIO, timer and PWM drivers when running on
//! a development machine. Each one keeps a [`Registry`] of per-peripheral
//! records in cells, and exposes helpers (`press`, `capture_rising`, ...) that
//! play the role of the interrupt handlers on real hardware.

use core::cell::{Cell, Ref, RefCell};

use crate::colors::{self, Color};
use crate::port::{ButtonPort, DisplayPort, PeripheralId, PortError, UltrasoundPort};
use crate::registry::Registry;
use crate::time::{LowPower, TimeSource};

/// Settable millisecond clock that counts sleep requests.
#[derive(Debug, Default)]
pub struct SimClock {
    now_ms: Cell<u32>,
    sleeps: Cell<u32>,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now_ms: u32) {
        self.now_ms.set(now_ms);
    }

    /// Advances the clock, wrapping like the hardware counter.
    pub fn advance(&self, ms: u32) {
        self.now_ms.set(self.now_ms.get().wrapping_add(ms));
    }

    /// Number of times [`LowPower::sleep`] has been called.
    pub fn sleep_count(&self) -> u32 {
        self.sleeps.get()
    }
}

impl TimeSource for SimClock {
    fn now_ms(&self) -> u32 {
        self.now_ms.get()
    }
}

impl LowPower for SimClock {
    fn sleep(&self) {
        self.sleeps.set(self.sleeps.get().wrapping_add(1));
    }
}

/// Simulated push buttons.
pub struct SimButtonPort<const MAX: usize> {
    buttons: Registry<Cell<bool>, MAX>,
}

impl<const MAX: usize> SimButtonPort<MAX> {
    pub fn new() -> Self {
        Self {
            buttons: Registry::new(),
        }
    }

    /// Adds a released button.
    ///
    /// # Errors
    /// Fails if the ID is already registered or out of range.
    pub fn register(&mut self, id: PeripheralId) -> Result<(), PortError> {
        self.buttons.insert(id, Cell::new(false))
    }

    pub fn press(&self, id: PeripheralId) -> Result<(), PortError> {
        self.buttons.get(id)?.set(true);
        Ok(())
    }

    pub fn release(&self, id: PeripheralId) -> Result<(), PortError> {
        self.buttons.get(id)?.set(false);
        Ok(())
    }
}

impl<const MAX: usize> Default for SimButtonPort<MAX> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const MAX: usize> ButtonPort for SimButtonPort<MAX> {
    fn init(&self, id: PeripheralId) -> Result<(), PortError> {
        self.release(id)
    }

    fn is_pressed(&self, id: PeripheralId) -> bool {
        self.buttons.get(id).is_ok_and(Cell::get)
    }
}

/// Interrupt-owned state of one simulated transceiver.
#[derive(Debug, Default)]
pub struct UltrasoundChannel {
    trigger_ready: Cell<bool>,
    trigger_end: Cell<bool>,
    trigger_high: Cell<bool>,
    echo_rising: Cell<u32>,
    echo_falling: Cell<u32>,
    echo_received: Cell<bool>,
    echo_overflows: Cell<u32>,
    echo_timer_running: Cell<bool>,
    sample_timer_running: Cell<bool>,
}

impl UltrasoundChannel {
    fn reset_capture(&self) {
        self.echo_rising.set(0);
        self.echo_falling.set(0);
        self.echo_received.set(false);
        self.echo_overflows.set(0);
    }
}

/// Simulated ultrasonic transceivers.
pub struct SimUltrasoundPort<const MAX: usize> {
    channels: Registry<UltrasoundChannel, MAX>,
}

impl<const MAX: usize> SimUltrasoundPort<MAX> {
    pub fn new() -> Self {
        Self {
            channels: Registry::new(),
        }
    }

    /// Adds an idle transceiver.
    ///
    /// # Errors
    /// Fails if the ID is already registered or out of range.
    pub fn register(&mut self, id: PeripheralId) -> Result<(), PortError> {
        self.channels.insert(id, UltrasoundChannel::default())
    }

    /// Sample timer interrupt: a new measurement may start.
    pub fn open_sample_window(&self, id: PeripheralId) -> Result<(), PortError> {
        self.channels.get(id)?.trigger_ready.set(true);
        Ok(())
    }

    /// Trigger timer interrupt: the pulse has been held long enough.
    pub fn finish_trigger(&self, id: PeripheralId) -> Result<(), PortError> {
        self.channels.get(id)?.trigger_end.set(true);
        Ok(())
    }

    /// Echo capture interrupt on the rising edge. `tick` must be non-zero.
    pub fn capture_rising(&self, id: PeripheralId, tick: u32) -> Result<(), PortError> {
        self.channels.get(id)?.echo_rising.set(tick);
        Ok(())
    }

    /// Echo capture interrupt on the falling edge, after `overflows` timer wraps.
    pub fn capture_falling(
        &self,
        id: PeripheralId,
        tick: u32,
        overflows: u32,
    ) -> Result<(), PortError> {
        let channel = self.channels.get(id)?;
        channel.echo_falling.set(tick);
        channel.echo_overflows.set(overflows);
        channel.echo_received.set(true);
        Ok(())
    }

    /// Returns true while the trigger line is high.
    pub fn trigger_high(&self, id: PeripheralId) -> bool {
        self.channels.get(id).is_ok_and(|c| c.trigger_high.get())
    }

    pub fn echo_timer_running(&self, id: PeripheralId) -> bool {
        self.channels.get(id).is_ok_and(|c| c.echo_timer_running.get())
    }

    pub fn sample_timer_running(&self, id: PeripheralId) -> bool {
        self.channels
            .get(id)
            .is_ok_and(|c| c.sample_timer_running.get())
    }

    fn channel(&self, id: PeripheralId) -> Option<&UltrasoundChannel> {
        self.channels.get(id).ok()
    }
}

impl<const MAX: usize> Default for SimUltrasoundPort<MAX> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const MAX: usize> UltrasoundPort for SimUltrasoundPort<MAX> {
    fn init(&self, id: PeripheralId) -> Result<(), PortError> {
        let channel = self.channels.get(id)?;
        channel.trigger_ready.set(false);
        channel.trigger_end.set(false);
        channel.reset_capture();
        Ok(())
    }

    fn trigger_ready(&self, id: PeripheralId) -> bool {
        self.channel(id).is_some_and(|c| c.trigger_ready.get())
    }

    fn set_trigger_ready(&self, id: PeripheralId, ready: bool) {
        if let Some(c) = self.channel(id) {
            c.trigger_ready.set(ready);
        }
    }

    fn start_measurement(&self, id: PeripheralId) {
        if let Some(c) = self.channel(id) {
            c.trigger_ready.set(false);
            c.trigger_end.set(false);
            c.reset_capture();
            c.trigger_high.set(true);
            c.echo_timer_running.set(true);
            c.sample_timer_running.set(true);
        }
    }

    fn trigger_pulse_done(&self, id: PeripheralId) -> bool {
        self.channel(id).is_some_and(|c| c.trigger_end.get())
    }

    fn clear_trigger_pulse_done(&self, id: PeripheralId) {
        if let Some(c) = self.channel(id) {
            c.trigger_end.set(false);
        }
    }

    fn stop_trigger_timer(&self, id: PeripheralId) {
        if let Some(c) = self.channel(id) {
            c.trigger_high.set(false);
        }
    }

    fn echo_rising_tick(&self, id: PeripheralId) -> u32 {
        self.channel(id).map_or(0, |c| c.echo_rising.get())
    }

    fn echo_received(&self, id: PeripheralId) -> bool {
        self.channel(id).is_some_and(|c| c.echo_received.get())
    }

    fn echo_falling_tick(&self, id: PeripheralId) -> u32 {
        self.channel(id).map_or(0, |c| c.echo_falling.get())
    }

    fn echo_overflow_count(&self, id: PeripheralId) -> u32 {
        self.channel(id).map_or(0, |c| c.echo_overflows.get())
    }

    fn stop_echo_timer(&self, id: PeripheralId) {
        if let Some(c) = self.channel(id) {
            c.echo_timer_running.set(false);
        }
    }

    fn reset_echo_capture(&self, id: PeripheralId) {
        if let Some(c) = self.channel(id) {
            c.reset_capture();
        }
    }

    fn start_sample_timer(&self, id: PeripheralId) {
        if let Some(c) = self.channel(id) {
            c.sample_timer_running.set(true);
        }
    }

    fn stop_ranging(&self, id: PeripheralId) {
        if let Some(c) = self.channel(id) {
            c.trigger_high.set(false);
            c.echo_timer_running.set(false);
            c.sample_timer_running.set(false);
            c.reset_capture();
        }
    }
}

/// Simulated RGB indicators.
///
/// Records the last `HIST` color writes across all indicators; older writes
/// are dropped first.
pub struct SimDisplayPort<const MAX: usize, const HIST: usize> {
    colors: Registry<Cell<Color>, MAX>,
    history: RefCell<heapless::Vec<(PeripheralId, Color), HIST>>,
}

impl<const MAX: usize, const HIST: usize> SimDisplayPort<MAX, HIST> {
    pub fn new() -> Self {
        Self {
            colors: Registry::new(),
            history: RefCell::new(heapless::Vec::new()),
        }
    }

    /// Adds an indicator that is off.
    ///
    /// # Errors
    /// Fails if the ID is already registered or out of range.
    pub fn register(&mut self, id: PeripheralId) -> Result<(), PortError> {
        self.colors.insert(id, Cell::new(colors::OFF))
    }

    /// Current color of an indicator, `None` if the ID is unknown.
    pub fn color(&self, id: PeripheralId) -> Option<Color> {
        self.colors.get(id).ok().map(Cell::get)
    }

    /// Color writes in order, oldest first.
    pub fn history(&self) -> Ref<'_, [(PeripheralId, Color)]> {
        Ref::map(self.history.borrow(), |h| h.as_slice())
    }

    pub fn clear_history(&self) {
        self.history.borrow_mut().clear();
    }
}

impl<const MAX: usize, const HIST: usize> Default for SimDisplayPort<MAX, HIST> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const MAX: usize, const HIST: usize> DisplayPort for SimDisplayPort<MAX, HIST> {
    fn init(&self, id: PeripheralId) -> Result<(), PortError> {
        self.colors.get(id)?.set(colors::OFF);
        Ok(())
    }

    fn set_color(&self, id: PeripheralId, color: Color) {
        let Ok(current) = self.colors.get(id) else {
            return;
        };
        current.set(color);

        let mut history = self.history.borrow_mut();
        if history.is_full() && !history.is_empty() {
            history.remove(0);
        }
        let _ = history.push((id, color));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: PeripheralId = PeripheralId(0);

    #[test]
    fn button_port_rejects_unknown_ids() {
        let mut port: SimButtonPort<2> = SimButtonPort::new();
        port.register(ID).unwrap();

        assert_eq!(port.init(ID), Ok(()));
        assert_eq!(
            port.press(PeripheralId(1)),
            Err(PortError::InvalidId(PeripheralId(1)))
        );
        assert!(!port.is_pressed(PeripheralId(1)));

        port.press(ID).unwrap();
        assert!(port.is_pressed(ID));
    }

    #[test]
    fn start_measurement_consumes_window() {
        let mut port: SimUltrasoundPort<1> = SimUltrasoundPort::new();
        port.register(ID).unwrap();
        port.open_sample_window(ID).unwrap();
        port.capture_rising(ID, 7).unwrap();

        port.start_measurement(ID);
        assert!(!port.trigger_ready(ID));
        assert!(port.trigger_high(ID));
        assert_eq!(port.echo_rising_tick(ID), 0);

        port.stop_ranging(ID);
        assert!(!port.trigger_high(ID));
        assert!(!port.echo_timer_running(ID));
        assert!(!port.sample_timer_running(ID));
    }

    #[test]
    fn display_history_drops_oldest() {
        let mut port: SimDisplayPort<1, 2> = SimDisplayPort::new();
        port.register(ID).unwrap();

        port.set_color(ID, colors::RED);
        port.set_color(ID, colors::GREEN);
        port.set_color(ID, colors::BLUE);

        assert_eq!(port.color(ID), Some(colors::BLUE));
        assert_eq!(
            &*port.history(),
            &[(ID, colors::GREEN), (ID, colors::BLUE)]
        );
    }

    #[test]
    fn writes_to_unknown_display_are_ignored() {
        let port: SimDisplayPort<1, 4> = SimDisplayPort::new();
        port.set_color(ID, colors::RED);
        assert!(port.history().is_empty());
        assert_eq!(port.color(ID), None);
    }

    #[test]
    fn clock_wraps_and_counts_sleeps() {
        let clock = SimClock::new();
        clock.set(u32::MAX);
        clock.advance(2);
        assert_eq!(clock.now_ms(), 1);

        clock.sleep();
        clock.sleep();
        assert_eq!(clock.sleep_count(), 2);
    }
}
