use core::convert::TryFrom;

use heapless::Vec;
use log::{info, trace, warn};

use crate::context::Context;
use crate::error::Error;
use crate::frame::{Frame, FrameView, WIDTH};
use crate::keypad::Keypad;
use crate::opcode::OpCode;
use crate::timer::TimerState;

#[cfg(feature = "atomic")]
use crate::timer::atomic::Timer;
#[cfg(not(feature = "atomic"))]
use crate::timer::racy::Timer;

const MEM_SIZE: usize = 4096;
const PROG_START: usize = 0x200;
const ADDR_MASK: u16 = 0x0FFF;

/// Bitmap glyphs for the hexadecimal digits, 5 bytes each, seeded at
/// address 0 so FX29 can address them as `digit * 5`.
#[rustfmt::skip]
const GLYPHS: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// The whole processor state behind a single-step execution API
///
/// A host drives it from one logical timeline: `tick_chip` N times per
/// display refresh, `tick_timers` at a fixed 60 Hz cadence, `set_key` as
/// input events arrive. Nothing here blocks; a pending wait-for-key turns
/// `tick_chip` into a no-op until a key press resolves it.
pub struct Plum8<C: Context + Sized> {
    ctx: C,
    v: [u8; 16],
    i: u16,
    pc: u16,
    memory: [u8; MEM_SIZE],
    stack: Vec<u16, 16>,
    frame: Frame,
    delay_timer: Timer,
    sound_timer: Timer,
    keypad: Keypad,
    strict_shift: bool,
}

impl<C: Context + Sized> Plum8<C> {
    pub fn new(ctx: C) -> Self {
        let mut memory = [0; MEM_SIZE];
        memory[..GLYPHS.len()].copy_from_slice(&GLYPHS);
        Self {
            ctx,
            v: [0; 16],
            i: 0,
            pc: PROG_START as u16,
            memory,
            stack: Vec::new(),
            frame: Frame::new(),
            delay_timer: Timer::new(),
            sound_timer: Timer::new(),
            keypad: Keypad::new(),
            strict_shift: false,
        }
    }

    /// Reinitialize all volatile state
    ///
    /// Clears registers, stack, timers, display and keypad, zeroes the
    /// program region and reseeds the glyph table. Idempotent.
    pub fn reset(&mut self) {
        self.v = [0; 16];
        self.i = 0;
        self.pc = PROG_START as u16;
        self.stack.clear();
        self.frame.clear();
        self.memory[PROG_START..].iter_mut().for_each(|b| *b = 0);
        self.memory[..GLYPHS.len()].copy_from_slice(&GLYPHS);
        self.delay_timer.store(0);
        self.sound_timer.store(0);
        self.keypad.reset();
        info!("chip reset");
    }

    /// Load a program image into memory from 0x200 (_start address)
    ///
    /// Resets the chip first. Images longer than the program region are
    /// rejected without touching any state.
    pub fn load(&mut self, prog: &[u8]) -> Result<(), Error> {
        if prog.len() > MEM_SIZE - PROG_START {
            return Err(Error::LoadOverflow { len: prog.len() });
        }
        if prog.len() % 2 != 0 {
            // instructions are 2 bytes wide, a trailing byte is suspicious
            warn!("program image has odd length {}", prog.len());
        }
        self.reset();
        self.memory[PROG_START..PROG_START + prog.len()].copy_from_slice(prog);
        info!("loaded {} byte program", prog.len());
        Ok(())
    }

    /// Fetch, decode and execute the instruction at pc
    ///
    /// No-op while a wait-for-key is pending. Any returned error is fatal
    /// to the session; the host should stop its run loop.
    pub fn tick_chip(&mut self) -> Result<(), Error> {
        if self.keypad.is_waiting() {
            return Ok(());
        }
        let raw = self.fetch();
        let opcode = OpCode::try_from(raw)?;
        trace!("{:#05X}: {:?}", self.pc, opcode);
        self.execute(opcode)
    }

    /// Decrement both countdown timers, called at the host's fixed cadence
    /// (60 Hz by design)
    pub fn tick_timers(&mut self) {
        self.delay_timer.decrement();
        if self.sound_timer.decrement() == TimerState::Finished {
            self.ctx.sound_off();
        }
    }

    /// Record an edge-triggered key event from the host
    ///
    /// A fresh press while the chip awaits a key stores the key in the
    /// target register and resumes execution.
    pub fn set_key(&mut self, key: u8, pressed: bool) {
        if let Some(resolved) = self.keypad.set(key, pressed) {
            self.v[resolved.reg as usize] = resolved.key;
        }
    }

    /// Get a read-only view over the current display contents
    pub fn frame(&self) -> FrameView<'_> {
        self.frame.view()
    }

    /// Current sound timer value; a host plays a tone while it is non-zero
    pub fn sound_timer(&self) -> u8 {
        self.sound_timer.load()
    }

    /// Choose between the reference interpreter's SHL flag (bit 0 of VX,
    /// an operator precedence accident it shipped with) and the
    /// conventional bit 7. Off by default for compatibility with images
    /// tuned to the reference behavior.
    pub fn set_strict_shift(&mut self, strict: bool) {
        self.strict_shift = strict;
    }

    pub fn context(&self) -> &C {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.ctx
    }

    fn fetch(&self) -> u16 {
        let hi = self.memory[(self.pc & ADDR_MASK) as usize] as u16;
        let lo = self.memory[(self.pc.wrapping_add(1) & ADDR_MASK) as usize] as u16;
        hi << 8 | lo
    }

    fn pc_increment(&mut self) {
        self.pc = self.pc.wrapping_add(2);
    }
}

// OpCodes impls
impl<C: Context + Sized> Plum8<C> {
    #[rustfmt::skip]
    fn execute(&mut self, opcode: OpCode) -> Result<(), Error> {
        match opcode {
            OpCode::_00E0             => self.clear_screen(),
            OpCode::_00EE             => self.subroutine_return(),
            OpCode::_1NNN { nnn }     => return self.jump_to(nnn),
            OpCode::_2NNN { nnn }     => return self.exec_subroutine_at(nnn),
            OpCode::_3XNN { x, nn }   => self.skip_if_vx_eq_nn(x, nn),
            OpCode::_4XNN { x, nn }   => self.skip_if_vx_ne_nn(x, nn),
            OpCode::_5XY0 { x, y }    => self.skip_if_vx_eq_vy(x, y),
            OpCode::_6XNN { x, nn }   => self.assign_vx_nn(x, nn),
            OpCode::_7XNN { x, nn }   => self.assign_add_vx_nn(x, nn),
            OpCode::_8XY0 { x, y }    => self.assign_vx_vy(x, y),
            OpCode::_8XY1 { x, y }    => self.assign_or_vx_vy(x, y),
            OpCode::_8XY2 { x, y }    => self.assign_and_vx_vy(x, y),
            OpCode::_8XY3 { x, y }    => self.assign_xor_vx_vy(x, y),
            OpCode::_8XY4 { x, y }    => self.assign_add_vx_vy(x, y),
            OpCode::_8XY5 { x, y }    => self.assign_sub_vx_vy(x, y),
            OpCode::_8XY6 { x, .. }   => self.assign_vx_shifted_r(x),
            OpCode::_8XY7 { x, y }    => self.assign_vx_vy_sub_vx(x, y),
            OpCode::_8XYE { x, .. }   => self.assign_vx_shifted_l(x),
            OpCode::_9XY0 { x, y }    => self.skip_if_vx_ne_vy(x, y),
            OpCode::_ANNN { nnn }     => self.assign_i_nnn(nnn),
            OpCode::_BNNN { nnn }     => return self.jump_to_nnn_add_v0(nnn),
            OpCode::_CXNN { x, nn }   => self.assign_vx_random_and_nn(x, nn),
            OpCode::_DXYN { x, y, n } => self.draw_n_at_vx_vy(x, y, n),
            OpCode::_EX9E { x }       => self.skip_if_vx_in_keys(x),
            OpCode::_EXA1 { x }       => self.skip_if_vx_not_in_keys(x),
            OpCode::_FX07 { x }       => self.assign_vx_delay_t(x),
            OpCode::_FX0A { x }       => self.assign_vx_wait_for_key(x),
            OpCode::_FX15 { x }       => self.assign_delay_t_vx(x),
            OpCode::_FX18 { x }       => self.assign_sound_t_vx(x),
            OpCode::_FX1E { x }       => self.assign_add_i_vx(x),
            OpCode::_FX29 { x }       => self.assign_i_addr_of_glyph_vx(x),
            OpCode::_FX33 { x }       => self.assign_mem_at_i_bcd_of_vx(x),
            OpCode::_FX55 { x }       => self.assign_mem_at_i_v0_to_vx(x),
            OpCode::_FX65 { x }       => self.assign_v0_to_vx_mem_at_i(x),
        }?;
        self.pc_increment();
        Ok(())
    }

    /// Clear the screen
    /// 00E0,
    fn clear_screen(&mut self) -> Result<(), Error> {
        self.frame.clear();
        Ok(())
    }

    /// Return from a subroutine
    ///
    /// The stack holds the address of the call instruction, so the common
    /// increment after this handler resumes past the call.
    /// 00EE,
    fn subroutine_return(&mut self) -> Result<(), Error> {
        self.stack
            .pop()
            .ok_or(Error::StackUnderflow)
            .map(|addr| self.pc = addr)
    }

    /// Jump to address NNN
    /// 1NNN { nnn: u16 },
    fn jump_to(&mut self, nnn: u16) -> Result<(), Error> {
        self.pc = nnn;
        Ok(())
    }

    /// Execute subroutine starting at address NNN
    /// 2NNN { nnn: u16 },
    fn exec_subroutine_at(&mut self, nnn: u16) -> Result<(), Error> {
        self.stack
            .push(self.pc)
            .or(Err(Error::StackOverflow))
            .map(|_| self.pc = nnn)
    }

    /// Skip the following instruction if the value of register VX equals NN
    /// 3XNN { x: u8, nn: u8 },
    fn skip_if_vx_eq_nn(&mut self, x: u8, nn: u8) -> Result<(), Error> {
        if self.v[x as usize] == nn {
            self.pc_increment();
        }
        Ok(())
    }

    /// Skip the following instruction if the value of register VX is not equal to NN
    /// 4XNN { x: u8, nn: u8 },
    fn skip_if_vx_ne_nn(&mut self, x: u8, nn: u8) -> Result<(), Error> {
        if self.v[x as usize] != nn {
            self.pc_increment();
        }
        Ok(())
    }

    /// Skip the following instruction if the value of register VX is equal to the value of register VY
    /// 5XY0 { x: u8, y: u8 },
    fn skip_if_vx_eq_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        if self.v[x as usize] == self.v[y as usize] {
            self.pc_increment();
        }
        Ok(())
    }

    /// Store number NN in register VX
    /// 6XNN { x: u8, nn: u8 },
    fn assign_vx_nn(&mut self, x: u8, nn: u8) -> Result<(), Error> {
        self.v[x as usize] = nn;
        Ok(())
    }

    /// Add the value NN to register VX, no carry flag
    /// 7XNN { x: u8, nn: u8 },
    fn assign_add_vx_nn(&mut self, x: u8, nn: u8) -> Result<(), Error> {
        self.v[x as usize] = self.v[x as usize].wrapping_add(nn);
        Ok(())
    }

    /// Store the value of register VY in register VX
    /// 8XY0 { x: u8, y: u8 },
    fn assign_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        self.v[x as usize] = self.v[y as usize];
        Ok(())
    }

    /// Set VX to VX OR VY
    /// 8XY1 { x: u8, y: u8 },
    fn assign_or_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        self.v[x as usize] |= self.v[y as usize];
        Ok(())
    }

    /// Set VX to VX AND VY
    /// 8XY2 { x: u8, y: u8 },
    fn assign_and_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        self.v[x as usize] &= self.v[y as usize];
        Ok(())
    }

    /// Set VX to VX XOR VY
    /// 8XY3 { x: u8, y: u8 },
    fn assign_xor_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        self.v[x as usize] ^= self.v[y as usize];
        Ok(())
    }

    /// Add the value of register VY to register VX, Set VF to 01 if a carry occurs, Set VF to 00 if a carry does not occur
    ///
    /// The flag write precedes the result write, so with X = F the result
    /// wins, as in the reference interpreter.
    /// 8XY4 { x: u8, y: u8 },
    fn assign_add_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        let sum = self.v[x as usize] as u16 + self.v[y as usize] as u16;
        self.v[0xF] = (sum > 0xFF) as u8;
        self.v[x as usize] = sum as u8;
        Ok(())
    }

    /// Subtract the value of register VY from register VX, Set VF to 00 if a borrow occurs, Set VF to 01 if a borrow does not occur
    /// 8XY5 { x: u8, y: u8 },
    fn assign_sub_vx_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        let value = self.v[x as usize].wrapping_sub(self.v[y as usize]);
        self.v[0xF] = (self.v[x as usize] > self.v[y as usize]) as u8;
        self.v[x as usize] = value;
        Ok(())
    }

    /// Shift VX right one bit in place, Set register VF to the least significant bit prior to the shift
    ///
    /// VY is decoded but ignored; the reference interpreter shifts VX
    /// itself rather than storing a shifted VY.
    /// 8XY6 { x: u8, y: u8 },
    fn assign_vx_shifted_r(&mut self, x: u8) -> Result<(), Error> {
        self.v[0xF] = self.v[x as usize] & 1;
        self.v[x as usize] >>= 1;
        Ok(())
    }

    /// Set register VX to the value of VY minus VX, Set VF to 00 if a borrow occurs, Set VF to 01 if a borrow does not occur
    /// 8XY7 { x: u8, y: u8 },
    fn assign_vx_vy_sub_vx(&mut self, x: u8, y: u8) -> Result<(), Error> {
        let value = self.v[y as usize].wrapping_sub(self.v[x as usize]);
        self.v[0xF] = (self.v[x as usize] < self.v[y as usize]) as u8;
        self.v[x as usize] = value;
        Ok(())
    }

    /// Shift VX left one bit in place
    ///
    /// With `strict_shift` the flag is bit 7 of VX prior to the shift.
    /// Without it the flag is bit 0, reproducing the reference
    /// interpreter's `x & 0x80 == 0x80` precedence accident.
    /// 8XYE { x: u8, y: u8 },
    fn assign_vx_shifted_l(&mut self, x: u8) -> Result<(), Error> {
        let mask = if self.strict_shift { 0x80 } else { 0x01 };
        self.v[0xF] = (self.v[x as usize] & mask != 0) as u8;
        self.v[x as usize] <<= 1;
        Ok(())
    }

    /// Skip the following instruction if the value of register VX is not equal to the value of register VY
    /// 9XY0 { x: u8, y: u8 },
    fn skip_if_vx_ne_vy(&mut self, x: u8, y: u8) -> Result<(), Error> {
        if self.v[x as usize] != self.v[y as usize] {
            self.pc_increment();
        }
        Ok(())
    }

    /// Store memory address NNN in register I
    /// ANNN { nnn: u16 },
    fn assign_i_nnn(&mut self, nnn: u16) -> Result<(), Error> {
        self.i = nnn;
        Ok(())
    }

    /// Jump to address NNN + V0
    /// BNNN { nnn: u16 },
    fn jump_to_nnn_add_v0(&mut self, nnn: u16) -> Result<(), Error> {
        self.pc = nnn.wrapping_add(self.v[0] as u16);
        Ok(())
    }

    /// Set VX to a random number with a mask of NN
    /// CXNN { x: u8, nn: u8 },
    fn assign_vx_random_and_nn(&mut self, x: u8, nn: u8) -> Result<(), Error> {
        self.v[x as usize] = self.ctx.gen_random() & nn;
        Ok(())
    }

    /// Draw a sprite at position VX, VY with N bytes of sprite data starting at the address stored in I, Set VF to 01 if any set pixels are changed to unset, and 00 otherwise
    ///
    /// The blitter addresses the frame by flat bit index without wrapping
    /// or clipping against the row width: sprites drawn near the right
    /// edge spill into the following row, and writes past the last pixel
    /// are dropped. Coordinate registers are re-read per pixel after the
    /// flag is cleared, so a sprite addressed through VF lands at 0 (and
    /// at the flag value once a collision sets it). Both match the
    /// reference interpreter and programs rely on it.
    /// DXYN { x: u8, y: u8, n: u8 },
    fn draw_n_at_vx_vy(&mut self, x: u8, y: u8, n: u8) -> Result<(), Error> {
        self.v[0xF] = 0;
        for row in 0..n as usize {
            let bits = self.memory[(self.i as usize + row) & ADDR_MASK as usize];
            for col in 0..8 {
                let pix = bits >> (7 - col) & 1 == 1;
                let loc = self.v[x as usize] as usize
                    + col
                    + (self.v[y as usize] as usize + row) * WIDTH;
                if let Some(prev) = self.frame.xor_bit_at(loc, pix) {
                    if prev && pix {
                        self.v[0xF] = 1;
                    }
                }
            }
        }
        Ok(())
    }

    /// Skip the following instruction if the key corresponding to the hex value currently stored in register VX is pressed
    /// EX9E { x: u8 },
    fn skip_if_vx_in_keys(&mut self, x: u8) -> Result<(), Error> {
        if self.keypad.is_pressed(self.v[x as usize]) {
            self.pc_increment();
        }
        Ok(())
    }

    /// Skip the following instruction if the key corresponding to the hex value currently stored in register VX is not pressed
    /// EXA1 { x: u8 },
    fn skip_if_vx_not_in_keys(&mut self, x: u8) -> Result<(), Error> {
        if !self.keypad.is_pressed(self.v[x as usize]) {
            self.pc_increment();
        }
        Ok(())
    }

    /// Store the current value of the delay timer in register VX
    /// FX07 { x: u8 },
    fn assign_vx_delay_t(&mut self, x: u8) -> Result<(), Error> {
        self.v[x as usize] = self.delay_timer.load();
        Ok(())
    }

    /// Wait for a keypress and store the result in register VX
    ///
    /// Completes its own cycle (pc moves past it); following `tick_chip`
    /// calls are no-ops until a fresh key press arrives.
    /// FX0A { x: u8 },
    fn assign_vx_wait_for_key(&mut self, x: u8) -> Result<(), Error> {
        self.keypad.wait_for(x);
        Ok(())
    }

    /// Set the delay timer to the value of register VX
    /// FX15 { x: u8 },
    fn assign_delay_t_vx(&mut self, x: u8) -> Result<(), Error> {
        self.delay_timer.store(self.v[x as usize]);
        Ok(())
    }

    /// Set the sound timer to the value of register VX
    /// FX18 { x: u8 },
    fn assign_sound_t_vx(&mut self, x: u8) -> Result<(), Error> {
        let value = self.v[x as usize];
        self.sound_timer.store(value);
        if value > 0 {
            self.ctx.sound_on();
        }
        Ok(())
    }

    /// Add the value stored in register VX to register I, wrapping at 16 bits
    /// FX1E { x: u8 },
    fn assign_add_i_vx(&mut self, x: u8) -> Result<(), Error> {
        self.i = self.i.wrapping_add(self.v[x as usize] as u16);
        Ok(())
    }

    /// Set I to the memory address of the glyph sprite for the hexadecimal digit stored in register VX
    /// FX29 { x: u8 },
    fn assign_i_addr_of_glyph_vx(&mut self, x: u8) -> Result<(), Error> {
        self.i = self.v[x as usize] as u16 * 5;
        Ok(())
    }

    /// Store the binary-coded decimal equivalent of the value stored in register VX at addresses I, I+1, and I+2
    /// FX33 { x: u8 },
    fn assign_mem_at_i_bcd_of_vx(&mut self, x: u8) -> Result<(), Error> {
        let value = self.v[x as usize];
        let i = self.i as usize;
        self.memory[i & ADDR_MASK as usize] = value / 100;
        self.memory[(i + 1) & ADDR_MASK as usize] = value / 10 % 10;
        self.memory[(i + 2) & ADDR_MASK as usize] = value % 10;
        Ok(())
    }

    /// Store the values of registers V0 to VX inclusive in memory starting at address I
    ///
    /// I itself is left unchanged, as in the reference interpreter.
    /// FX55 { x: u8 },
    fn assign_mem_at_i_v0_to_vx(&mut self, x: u8) -> Result<(), Error> {
        for idx in 0..=x as usize {
            self.memory[(self.i as usize + idx) & ADDR_MASK as usize] = self.v[idx];
        }
        Ok(())
    }

    /// Fill registers V0 to VX inclusive with the values stored in memory starting at address I
    ///
    /// I itself is left unchanged, as in the reference interpreter.
    /// FX65 { x: u8 },
    fn assign_v0_to_vx_mem_at_i(&mut self, x: u8) -> Result<(), Error> {
        for idx in 0..=x as usize {
            self.v[idx] = self.memory[(self.i as usize + idx) & ADDR_MASK as usize];
        }
        Ok(())
    }
}
