//! State of the 4x4 hex keypad and the wait-for-key latch

/// Pressed/released state per key plus an optional pending key wait
///
/// Key events are edge triggered: repeating the current state is a no-op,
/// so holding a key down cannot resolve a wait-for-key more than once.
/// While `waiting` holds a target register index the chip suspends
/// instruction execution; the first fresh key press resolves it.
#[derive(Debug)]
pub(crate) struct Keypad {
    keys: [bool; 16],
    waiting: Option<u8>,
}

/// A key press that completed a pending wait
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct Resolved {
    pub reg: u8,
    pub key: u8,
}

impl Keypad {
    pub fn new() -> Self {
        Self {
            keys: [false; 16],
            waiting: None,
        }
    }

    pub fn reset(&mut self) {
        self.keys = [false; 16];
        self.waiting = None;
    }

    /// Record a host key event, returning the resolved wait if this press
    /// ended one.
    pub fn set(&mut self, key: u8, pressed: bool) -> Option<Resolved> {
        let key = key & 0x0F;
        let state = &mut self.keys[key as usize];
        if *state == pressed {
            return None;
        }
        *state = pressed;
        if pressed {
            self.waiting.take().map(|reg| Resolved { reg, key })
        } else {
            None
        }
    }

    pub fn is_pressed(&self, key: u8) -> bool {
        self.keys[(key & 0x0F) as usize]
    }

    /// Enter wait-for-key mode; the next fresh press lands in register `reg`.
    pub fn wait_for(&mut self, reg: u8) {
        self.waiting = Some(reg);
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting.is_some()
    }
}
