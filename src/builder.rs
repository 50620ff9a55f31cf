use crate::context::Context;
use crate::error::Error;
use crate::plum::Plum8;

/// Assembles a configured chip in one expression
///
/// The context is mandatory and taken up front; program and compatibility
/// options are applied on `build`.
pub struct Builder<'a, C: Context> {
    context: C,
    program: Option<&'a [u8]>,
    strict_shift: bool,
}

impl<'a, C: Context> Builder<'a, C> {
    pub fn new(context: C) -> Self {
        Self {
            context,
            program: None,
            strict_shift: false,
        }
    }

    pub fn with_program(mut self, prog: &'a [u8]) -> Self {
        self.program = Some(prog);
        self
    }

    /// Use the conventional bit-7 SHL flag instead of the reference
    /// interpreter's bit-0 behavior
    pub fn with_strict_shift(mut self, strict: bool) -> Self {
        self.strict_shift = strict;
        self
    }

    pub fn build(self) -> Result<Plum8<C>, Error> {
        let mut chip = Plum8::new(self.context);
        chip.set_strict_shift(self.strict_shift);
        if let Some(prog) = self.program {
            chip.load(prog)?;
        }
        Ok(chip)
    }
}
