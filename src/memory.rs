use crate::error::MachineError;
use std::io;

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// Represents the memory map: font, program, everything else
pub trait MemoryMap {
    /// write unknown len of data into memory at a particular address
    fn write_any(&mut self, reader: &mut impl io::Read, addr: u16) -> Result<usize, MachineError> {
        let mut buf = Vec::new();
        let len = reader.read_to_end(&mut buf)?;
        self.write(&buf, addr)?;
        Ok(len)
    }

    /// write a chunk of bytes into "RAM"
    fn write(&mut self, data: &[u8], addr: u16) -> Result<(), MachineError> {
        self.get_rw_slice(addr, data.len())?.copy_from_slice(data);
        Ok(())
    }

    /// get a big-endian two-byte word (instruction fetch)
    fn get_word(&self, addr: u16) -> Result<u16, MachineError> {
        let word = self.get_ro_slice(addr, 2)?;
        Ok(((word[0] as u16) << 8) | (word[1] as u16))
    }

    /// get a r/w slice of the underlying memory
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8], MachineError>;

    /// get a r/o slice of the underlying memory
    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8], MachineError>;
}

/// Defines the CHIP-8 memory map, 4K configuration:
///   0x0000-0x004f  unused
///   0x0050-0x009f  font, 16 glyphs of 5 bytes
///   0x00a0-0x01ff  unused
///   0x0200-0x0fff  program
///
/// the stack, timers and display live outside of RAM
pub struct Chip8MemoryMap {
    bytes: Box<[u8]>,
    pub font_addr: u16,
    pub program_addr: u16,
}

impl MemoryMap for Chip8MemoryMap {
    fn get_rw_slice(&mut self, addr: u16, len: usize) -> Result<&mut [u8], MachineError> {
        let a = addr as usize;
        self.bytes
            .get_mut(a..a + len)
            .ok_or(MachineError::AddressOutOfRange { addr: a, len })
    }

    fn get_ro_slice(&self, addr: u16, len: usize) -> Result<&[u8], MachineError> {
        let a = addr as usize;
        self.bytes
            .get(a..a + len)
            .ok_or(MachineError::AddressOutOfRange { addr: a, len })
    }
}

/// how much RAM we have
pub const CHIP8_RAM_SIZE_BYTES: usize = 4096;

/// where the program is loaded
pub const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

/// where the hex font lives
pub const CHIP8_FONT_ADDR: u16 = 0x050;

/// height of one font glyph, in bytes
pub const CHIP8_FONT_GLYPH_BYTES: u16 = 5;

impl Chip8MemoryMap {
    /// zeroed RAM with the font baked in
    pub fn new() -> Self {
        let mut bytes = vec![0u8; CHIP8_RAM_SIZE_BYTES].into_boxed_slice();
        let font = CHIP8_FONT_ADDR as usize;
        bytes[font..font + CHIP8_FONT.len()].copy_from_slice(&CHIP8_FONT);
        Chip8MemoryMap {
            bytes,
            font_addr: CHIP8_FONT_ADDR,
            program_addr: CHIP8_PROGRAM_ADDR,
        }
    }

    /// load a CHIP-8 program at 0x200, returning how many bytes were loaded
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize, MachineError> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        let max = CHIP8_RAM_SIZE_BYTES - self.program_addr as usize;
        if buf.len() > max {
            return Err(MachineError::ProgramTooLarge { len: buf.len(), max });
        }
        self.write(&buf, self.program_addr)?;
        Ok(buf.len())
    }

    /// byte-level access, mostly for inspection
    pub fn get(&self, addr: usize) -> Option<u8> {
        self.bytes.get(addr).copied()
    }
}

impl Default for Chip8MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

pub const CHIP8_FONT: [u8; 80] = [
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
