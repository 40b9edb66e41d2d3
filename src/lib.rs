#![cfg_attr(not(feature = "std"), no_std)]
#![doc = include_str!("../README.md")]

//! # Core Concepts
//!
//! - **`Fsm`**: Generic engine, an ordered transition table plus the current state
//! - **`StateMachine`**: Common `fire`/`state`/`set_state` interface of every controller
//! - **`ButtonFsm`**: Debounces a push button and measures press durations
//! - **`UltrasoundFsm`**: Runs the trigger/echo cycle and publishes a median-of-5 distance
//! - **`DisplayFsm`**: Maps distances to color bands on an RGB indicator
//! - **`UrbaniteFsm`**: Supervisor wiring the three together, with on/off, pause and sleep
//! - **`ButtonPort`**, **`UltrasoundPort`**, **`DisplayPort`**: Traits to implement for your hardware
//! - **`TimeSource`**, **`LowPower`**: Traits for the millisecond tick and the sleep instruction
//!
//! Each controller is fired once per pass of a single cooperative loop. Interrupt
//! handlers only touch the port layer; the state machines read it.

// Re-export Srgb from palette for user convenience
pub use palette::Srgb;

pub mod button;
pub mod colors;
pub mod config;
pub mod display;
pub mod fsm;
pub mod port;
pub mod registry;
pub mod sim;
pub mod time;
pub mod ultrasound;
pub mod urbanite;

pub use button::{ButtonFsm, ButtonState};
pub use colors::Color;
pub use config::UrbaniteConfig;
pub use display::{DisplayFsm, DisplayState, color_for_distance};
pub use fsm::{Action, Fsm, Guard, StateMachine, Transition};
pub use port::{ButtonPort, DisplayPort, PeripheralId, PortError, UltrasoundPort};
pub use registry::Registry;
pub use time::{LowPower, Tick, TimeSource};
pub use ultrasound::{UltrasoundFsm, UltrasoundState, echo_elapsed_us, echo_time_to_distance_cm};
pub use urbanite::{ButtonControl, DisplayControl, UltrasoundControl, UrbaniteFsm, UrbaniteState};
