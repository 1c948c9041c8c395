//! Firmware for the Aqua328 aquarium controller (ATmega328P).
//!
//! Timer0 is run undivided to move the D5/D6 light PWM out of the audible
//! range, which makes the wiring clock tick 64 times too fast. Everything
//! that waits or reads time goes through [`timing`] to undo that.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(target_arch = "avr", feature(abi_avr_interrupt))]

pub mod application;
pub mod board;
pub mod config;
pub mod display;
pub mod drivers;
pub mod glyphs;
pub mod selftest;
pub mod tasks;
pub mod timing;

#[cfg(target_arch = "avr")]
pub mod hal;

#[cfg(test)]
mod testutil;

// `log!` expands in downstream crates
#[doc(hidden)]
pub use ufmt;
