//! Core traits and types shared by the chip crates.
//!
//! Chips are plain structs driven by an external stepping loop. Anything a
//! chip needs from the rest of the machine arrives through a trait passed
//! per call, never through a stored back-reference.

mod bus;
mod observable;

pub use bus::{OpenBus, WordBus};
pub use observable::{Observable, Value};
