use std::io;
use thiserror::Error;

/// Everything that can go wrong inside the machine.
///
/// Only a few of these stop the interpreter; see [`MachineError::is_fatal`].
#[derive(Debug, Error)]
pub enum MachineError {
    /// 00EE with nothing on the stack
    #[error("return with an empty stack")]
    StackUnderflow,

    /// 2NNN with the stack already full
    #[error("stack overflow: {depth} return addresses already pushed")]
    StackOverflow { depth: usize },

    /// instruction fetch past the end of RAM
    #[error("program counter out of bounds: 0x{0:04x}")]
    ProgramCounterOutOfBounds(u16),

    /// memory operand outside the 4K window; the instruction is skipped
    #[error("address out of range: 0x{addr:04x} (+{len} bytes)")]
    AddressOutOfRange { addr: usize, len: usize },

    /// program image does not fit between the program address and the top of RAM
    #[error("program is {len} bytes, at most {max} fit in memory")]
    ProgramTooLarge { len: usize, max: usize },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl MachineError {
    /// fatal errors end the instruction batch and, in the stock binary, the run
    pub fn is_fatal(&self) -> bool {
        !matches!(self, MachineError::AddressOutOfRange { .. })
    }
}
