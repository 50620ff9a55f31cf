use core::convert::TryFrom;

use crate::error::Error;

/// An enum representing the 35 instruction patterns understood by the core
///
/// A raw instruction word decodes on its top nibble, and for the 0x0, 0x8,
/// 0xE and 0xF families additionally on a trailing 4- or 8-bit subfield.
/// Words matching no pattern are a fatal decode error; in particular the
/// historical "machine language subroutine" 0NNN family is rejected.
///
/// Examples:
/// ```
/// use core::convert::TryFrom;
/// use plum8::opcode::OpCode;
///
/// let instruction = 0x1ABC;
/// let opcode = OpCode::try_from(instruction).unwrap();
///
/// assert_eq!(
///     opcode,
///     OpCode::_1NNN { nnn: 0x0ABC },
/// );
/// ```
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum OpCode {
    /// Clear the screen
    _00E0,
    /// Return from a subroutine
    _00EE,
    /// Jump to address NNN
    _1NNN { nnn: u16 },
    /// Execute subroutine starting at address NNN
    _2NNN { nnn: u16 },
    /// Skip the following instruction if the value of register VX equals NN
    _3XNN { x: u8, nn: u8 },
    /// Skip the following instruction if the value of register VX is not equal to NN
    _4XNN { x: u8, nn: u8 },
    /// Skip the following instruction if the value of register VX is equal to the value of register VY
    _5XY0 { x: u8, y: u8 },
    /// Store number NN in register VX
    _6XNN { x: u8, nn: u8 },
    /// Add the value NN to register VX, without touching the flag register
    _7XNN { x: u8, nn: u8 },
    /// Store the value of register VY in register VX
    _8XY0 { x: u8, y: u8 },
    /// Set VX to VX OR VY
    _8XY1 { x: u8, y: u8 },
    /// Set VX to VX AND VY
    _8XY2 { x: u8, y: u8 },
    /// Set VX to VX XOR VY
    _8XY3 { x: u8, y: u8 },
    /// Add the value of register VY to register VX, Set VF to 01 if a carry occurs, Set VF to 00 if a carry does not occur
    _8XY4 { x: u8, y: u8 },
    /// Subtract the value of register VY from register VX, Set VF to 00 if a borrow occurs, Set VF to 01 if a borrow does not occur
    _8XY5 { x: u8, y: u8 },
    /// Shift VX right one bit in place, Set register VF to the least significant bit prior to the shift
    _8XY6 { x: u8, y: u8 },
    /// Set register VX to the value of VY minus VX, Set VF to 00 if a borrow occurs, Set VF to 01 if a borrow does not occur
    _8XY7 { x: u8, y: u8 },
    /// Shift VX left one bit in place, flag semantics depend on the strict_shift setting
    _8XYE { x: u8, y: u8 },
    /// Skip the following instruction if the value of register VX is not equal to the value of register VY
    _9XY0 { x: u8, y: u8 },
    /// Store memory address NNN in register I
    _ANNN { nnn: u16 },
    /// Jump to address NNN + V0
    _BNNN { nnn: u16 },
    /// Set VX to a random number with a mask of NN
    _CXNN { x: u8, nn: u8 },
    /// Draw a sprite at position VX, VY with N bytes of sprite data starting at the address stored in I, Set VF to 01 if any set pixels are changed to unset, and 00 otherwise
    _DXYN { x: u8, y: u8, n: u8 },
    /// Skip the following instruction if the key corresponding to the hex value currently stored in register VX is pressed
    _EX9E { x: u8 },
    /// Skip the following instruction if the key corresponding to the hex value currently stored in register VX is not pressed
    _EXA1 { x: u8 },
    /// Store the current value of the delay timer in register VX
    _FX07 { x: u8 },
    /// Wait for a keypress and store the result in register VX
    _FX0A { x: u8 },
    /// Set the delay timer to the value of register VX
    _FX15 { x: u8 },
    /// Set the sound timer to the value of register VX
    _FX18 { x: u8 },
    /// Add the value stored in register VX to register I
    _FX1E { x: u8 },
    /// Set I to the memory address of the glyph sprite for the hexadecimal digit stored in register VX
    _FX29 { x: u8 },
    /// Store the binary-coded decimal equivalent of the value stored in register VX at addresses I, I+1, and I+2
    _FX33 { x: u8 },
    /// Store the values of registers V0 to VX inclusive in memory starting at address I
    _FX55 { x: u8 },
    /// Fill registers V0 to VX inclusive with the values stored in memory starting at address I
    _FX65 { x: u8 },
}

impl OpCode {
    fn read_first(raw: u16) -> u8 {
        (raw >> 12 & 0x000Fu16) as u8
    }

    fn read_last(raw: u16) -> u8 {
        (raw & 0x000Fu16) as u8
    }

    fn read_x(raw: u16) -> u8 {
        (raw >> 8 & 0x000Fu16) as u8
    }

    fn read_y(raw: u16) -> u8 {
        (raw >> 4 & 0x000Fu16) as u8
    }

    fn read_nn(raw: u16) -> u8 {
        (raw & 0x00FFu16) as u8
    }

    fn read_nnn(raw: u16) -> u16 {
        raw & 0x0FFFu16
    }
}

impl TryFrom<u16> for OpCode {
    type Error = Error;

    fn try_from(raw: u16) -> Result<Self, Error> {
        let unhandled = Err(Error::UnhandledInstruction { instr: raw });
        let opcode = match Self::read_first(raw) {
            0x0u8 => match Self::read_nn(raw) {
                0xE0u8 => OpCode::_00E0,
                0xEEu8 => OpCode::_00EE,
                _ => return unhandled,
            },
            0x1u8 => OpCode::_1NNN {
                nnn: Self::read_nnn(raw),
            },
            0x2u8 => OpCode::_2NNN {
                nnn: Self::read_nnn(raw),
            },
            0x3u8 => OpCode::_3XNN {
                x: Self::read_x(raw),
                nn: Self::read_nn(raw),
            },
            0x4u8 => OpCode::_4XNN {
                x: Self::read_x(raw),
                nn: Self::read_nn(raw),
            },
            0x5u8 => match Self::read_last(raw) {
                0x0u8 => OpCode::_5XY0 {
                    x: Self::read_x(raw),
                    y: Self::read_y(raw),
                },
                _ => return unhandled,
            },
            0x6u8 => OpCode::_6XNN {
                x: Self::read_x(raw),
                nn: Self::read_nn(raw),
            },
            0x7u8 => OpCode::_7XNN {
                x: Self::read_x(raw),
                nn: Self::read_nn(raw),
            },
            0x8u8 => {
                let x = Self::read_x(raw);
                let y = Self::read_y(raw);
                match Self::read_last(raw) {
                    0x0u8 => OpCode::_8XY0 { x, y },
                    0x1u8 => OpCode::_8XY1 { x, y },
                    0x2u8 => OpCode::_8XY2 { x, y },
                    0x3u8 => OpCode::_8XY3 { x, y },
                    0x4u8 => OpCode::_8XY4 { x, y },
                    0x5u8 => OpCode::_8XY5 { x, y },
                    0x6u8 => OpCode::_8XY6 { x, y },
                    0x7u8 => OpCode::_8XY7 { x, y },
                    0xEu8 => OpCode::_8XYE { x, y },
                    _ => return unhandled,
                }
            }
            0x9u8 => match Self::read_last(raw) {
                0x0u8 => OpCode::_9XY0 {
                    x: Self::read_x(raw),
                    y: Self::read_y(raw),
                },
                _ => return unhandled,
            },
            0xAu8 => OpCode::_ANNN {
                nnn: Self::read_nnn(raw),
            },
            0xBu8 => OpCode::_BNNN {
                nnn: Self::read_nnn(raw),
            },
            0xCu8 => OpCode::_CXNN {
                x: Self::read_x(raw),
                nn: Self::read_nn(raw),
            },
            0xDu8 => OpCode::_DXYN {
                x: Self::read_x(raw),
                y: Self::read_y(raw),
                n: Self::read_last(raw),
            },
            0xEu8 => {
                let x = Self::read_x(raw);
                match Self::read_nn(raw) {
                    0x9Eu8 => OpCode::_EX9E { x },
                    0xA1u8 => OpCode::_EXA1 { x },
                    _ => return unhandled,
                }
            }
            0xFu8 => {
                let x = Self::read_x(raw);
                match Self::read_nn(raw) {
                    0x07u8 => OpCode::_FX07 { x },
                    0x0Au8 => OpCode::_FX0A { x },
                    0x15u8 => OpCode::_FX15 { x },
                    0x18u8 => OpCode::_FX18 { x },
                    0x1Eu8 => OpCode::_FX1E { x },
                    0x29u8 => OpCode::_FX29 { x },
                    0x33u8 => OpCode::_FX33 { x },
                    0x55u8 => OpCode::_FX55 { x },
                    0x65u8 => OpCode::_FX65 { x },
                    _ => return unhandled,
                }
            }
            _ => unreachable!(),
        };
        Ok(opcode)
    }
}
