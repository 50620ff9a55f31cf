use core::fmt;

/// Fatal execution errors
///
/// Every variant ends the current session: the host is expected to stop
/// driving `tick_chip`/`tick_timers` and may offer a `reset`. Wrapping
/// 8/16-bit arithmetic is defined behavior and never reported here.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Error {
    /// Return executed with an empty call stack
    StackUnderflow,
    /// Call executed with 16 return addresses already stacked
    StackOverflow,
    /// Instruction word matches no known opcode pattern
    UnhandledInstruction { instr: u16 },
    /// Program image does not fit in 0x200..=0xFFF
    LoadOverflow { len: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::StackUnderflow => write!(f, "Can't return, not in subroutine"),
            Error::StackOverflow => write!(f, "Cannot enter subroutine, stack is full"),
            Error::UnhandledInstruction { instr } => {
                write!(f, "Unhandled instruction {:#06X}", instr)
            }
            Error::LoadOverflow { len } => {
                write!(f, "Program of {} bytes exceeds program region", len)
            }
        }
    }
}
