/// # machine
///
/// Everything the CHIP-8 program can see and change:
///  * 4K of RAM with the font at 0x050 and the program from 0x200
///  * V0..VF, where VF doubles as the carry/borrow/collision flag
///  * I, the index register; only its low 12 bits address memory
///  * the program counter
///  * a bounded stack of return addresses
///  * delay and sound timers, shared with the ticker thread
///  * the 64x32 framebuffer
/// plus whether we're running or parked on FX0A.
use crate::display::Framebuffer;
use crate::error::MachineError;
use crate::input::KeyLatch;
use crate::memory::{Chip8MemoryMap, MemoryMap, CHIP8_RAM_SIZE_BYTES};
use crate::timer::Timers;
use std::fmt;
use std::io;
use std::sync::Arc;

/// how deep subroutine calls can nest
pub const STACK_DEPTH: usize = 16;

/// VF
pub const FLAG_REGISTER: usize = 0xF;

/// I is 12 bits wide as far as memory is concerned
pub const INDEX_MASK: u16 = 0x0FFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    /// parked on FX0A until a key goes down and back up; the answer lands in
    /// `register`
    AwaitingKey { register: usize, latch: KeyLatch },
}

pub struct Machine {
    pub memory: Chip8MemoryMap,
    pub registers: [u8; 16],
    pub index_register: u16,
    pub program_counter: u16,
    stack: Vec<u16>,
    pub timers: Arc<Timers>,
    pub framebuffer: Framebuffer,
    pub run_state: RunState,
}

impl Machine {
    /// fresh machine: font loaded, pc at the program address, all else zero
    pub fn new() -> Self {
        let memory = Chip8MemoryMap::new();
        let program_counter = memory.program_addr;
        Machine {
            memory,
            registers: [0; 16],
            index_register: 0,
            program_counter,
            stack: Vec::with_capacity(STACK_DEPTH),
            timers: Arc::new(Timers::new()),
            framebuffer: Framebuffer::new(),
            run_state: RunState::Running,
        }
    }

    /// load a program at the program address and point the pc at it
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize, MachineError> {
        let len = self.memory.load_program(reader)?;
        self.program_counter = self.memory.program_addr;
        Ok(len)
    }

    pub fn push(&mut self, addr: u16) -> Result<(), MachineError> {
        if self.stack.len() >= STACK_DEPTH {
            return Err(MachineError::StackOverflow {
                depth: self.stack.len(),
            });
        }
        self.stack.push(addr);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16, MachineError> {
        self.stack.pop().ok_or(MachineError::StackUnderflow)
    }

    pub fn stack(&self) -> &[u16] {
        &self.stack
    }

    /// fetch the instruction word at the pc, which must leave room for both bytes
    pub fn fetch(&self) -> Result<u16, MachineError> {
        let pc = self.program_counter;
        if pc as usize + 1 >= CHIP8_RAM_SIZE_BYTES {
            return Err(MachineError::ProgramCounterOutOfBounds(pc));
        }
        self.memory.get_word(pc)
    }

    /// I as a memory address
    pub fn index_addr(&self) -> u16 {
        self.index_register & INDEX_MASK
    }

    pub fn delay_timer(&self) -> u8 {
        self.timers.delay()
    }

    pub fn sound_timer(&self) -> u8 {
        self.timers.sound()
    }

    pub fn is_awaiting_key(&self) -> bool {
        matches!(self.run_state, RunState::AwaitingKey { .. })
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

/// register dump, as logged in debug mode
impl fmt::Display for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, pair) in self.registers.chunks(4).enumerate() {
            let i = i * 4;
            writeln!(
                f,
                "V{:X}: {:02x}  V{:X}: {:02x}  V{:X}: {:02x}  V{:X}: {:02x}",
                i,
                pair[0],
                i + 1,
                pair[1],
                i + 2,
                pair[2],
                i + 3,
                pair[3]
            )?;
        }
        write!(
            f,
            "PC: {:04x}  I: {:04x}  DT: {:02x}  ST: {:02x}  SP: {}",
            self.program_counter,
            self.index_register,
            self.delay_timer(),
            self.sound_timer(),
            self.stack.len()
        )
    }
}
