//! Core of an 8-bit fantasy microprocessor
//!
//! Owns the whole processor state (4 KiB memory with a built-in hex glyph
//! table, 16 registers, call stack, two countdown timers, a 16-key input
//! latch and a 64x64 monochrome framebuffer) and exposes a non-blocking
//! single-step execution primitive. Hosts provide rendering, input mapping
//! and scheduling: call [`Plum8::tick_chip`] N times per display refresh,
//! [`Plum8::tick_timers`] at 60 Hz, and forward key edges through
//! [`Plum8::set_key`], all from one logical timeline.
#![no_std]

#[cfg(test)]
extern crate std;

pub mod builder;
pub mod context;
pub mod error;
pub mod frame;
pub mod opcode;
pub mod plum;
pub mod timer;

mod keypad;

pub use builder::Builder;
pub use context::Context;
pub use error::Error;
pub use frame::{Frame, FrameView};
pub use opcode::OpCode;
pub use plum::Plum8;

#[cfg(feature = "embedded-graphics")]
pub use embedded_graphics;
