//! Context for accessing functionalities of the platform that `Plum8` is
//! emulated on.
//!
//! The context is handed over at construction, so the core never reaches
//! for ambient global state. Display and keypad are owned by the core
//! itself: hosts pull frames with [`Plum8::frame`] and push key events
//! with [`Plum8::set_key`], which leaves randomness and sound edges as
//! the only platform services.
//!
//! [`Plum8::frame`]: crate::Plum8::frame
//! [`Plum8::set_key`]: crate::Plum8::set_key

/// Trait aggregating platform functionalities
pub trait Context {
    /// Generate random 8-bit number
    ///
    /// Called by `tick_chip` whenever requested by executing program
    fn gen_random(&mut self) -> u8;
    /// Turn sound on
    ///
    /// Called when a program stores a non-zero sound timer value
    fn sound_on(&mut self);
    /// Turn sound off
    ///
    /// Called by `tick_timers` when the sound timer reaches zero;
    /// hosts may instead poll `Plum8::sound_timer`
    fn sound_off(&mut self);
}
