//! `helm-hal` – the outbound edge of the autopilot.
//!
//! The scheduler never talks to the game directly; it hands every
//! [`Command`][helm_types::Command] to a [`CommandSink`].  Delivery
//! mechanisms implement that trait, so the decision engine can be pointed at
//! the real process, a recorder, or the in-process [`SimShip`] without any
//! change to policy code.
//!
//! # Modules
//!
//! - [`sink`] – [`CommandSink`] and the [`RecordingSink`] used by tests.
//! - [`sim`] – [`SimShip`]: a headless stand-in for the observed game that
//!   applies commands to a [`ShipSnapshot`][helm_types::ShipSnapshot] and
//!   steps oxygen, FTL charge and timers forward.

pub mod sim;
pub mod sink;

pub use sim::SimShip;
pub use sink::{CommandSink, RecordingSink};
