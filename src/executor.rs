/// # executor
///
/// Instruction semantics.
///
/// [`Executor::step`] runs one instruction against a [`Machine`]: fetch,
/// advance the pc by 2, decode, execute. Jumps, calls, returns and skips then
/// adjust the pc from there.
///
/// Errors come in two kinds. Fatal ones (stack under/overflow, fetching past
/// the end of RAM) come back out of `step` and stop the batch. A memory
/// operand out of range is logged and the instruction is dropped, pc already
/// advanced. Unknown instructions are skipped the same way.
use crate::config::{Config, Quirks};
use crate::display::SCREEN_HEIGHT;
use crate::error::MachineError;
use crate::input::{KeyLatch, Keypad};
use crate::instruction::Instruction;
use crate::machine::{Machine, RunState, FLAG_REGISTER, INDEX_MASK};
use crate::memory::{MemoryMap, CHIP8_FONT_GLYPH_BYTES};
use log::{debug, trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct Executor {
    quirks: Quirks,
    rng: StdRng,
    debug: bool,
}

impl Executor {
    pub fn new(config: &Config) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Executor {
            quirks: config.quirks,
            rng,
            debug: config.debug,
        }
    }

    /// Run up to `count` instructions. Stops early on a fatal error, or once
    /// the machine is parked waiting for a key, since nothing can change that
    /// before the host pumps input again. Returns how many steps were taken.
    pub fn run_batch(
        &mut self,
        machine: &mut Machine,
        keypad: &(impl Keypad + ?Sized),
        count: u32,
    ) -> Result<u32, MachineError> {
        for taken in 1..=count {
            self.step(machine, keypad)?;
            if machine.is_awaiting_key() {
                return Ok(taken);
            }
        }
        Ok(count)
    }

    /// one instruction, or one look at the keypad if parked on FX0A
    pub fn step(
        &mut self,
        machine: &mut Machine,
        keypad: &(impl Keypad + ?Sized),
    ) -> Result<(), MachineError> {
        if machine.is_awaiting_key() {
            poll_for_key(machine, keypad);
            return Ok(());
        }

        let pc = machine.program_counter;
        let raw = machine.fetch()?;
        let instruction = Instruction::decode(raw);
        trace!("{:04x}: {:04x}  {}", pc, raw, instruction);

        machine.program_counter = pc.wrapping_add(2);
        match self.execute(machine, instruction, keypad) {
            Err(e) if !e.is_fatal() => warn!("{:04x}: {} skipped: {}", pc, instruction, e),
            result => result?,
        }

        if self.debug {
            debug!("\n{}", machine);
        }
        Ok(())
    }

    /// apply an already-fetched instruction; the pc is expected to point past it
    pub fn execute(
        &mut self,
        machine: &mut Machine,
        instruction: Instruction,
        keypad: &(impl Keypad + ?Sized),
    ) -> Result<(), MachineError> {
        use Instruction::*;
        let m = machine;
        let v = &mut m.registers;

        match instruction {
            ClearScreen => m.framebuffer.clear(),
            Return => m.program_counter = m.pop()?,
            Jump(addr) => m.program_counter = addr,
            Call(addr) => {
                m.push(m.program_counter)?;
                m.program_counter = addr;
            }
            SkipIfEqualByte(x, nn) => skip_if(&mut m.program_counter, m.registers[x] == nn),
            SkipIfNotEqualByte(x, nn) => skip_if(&mut m.program_counter, m.registers[x] != nn),
            SkipIfRegistersEqual(x, y) => {
                skip_if(&mut m.program_counter, m.registers[x] == m.registers[y])
            }
            SkipIfRegistersNotEqual(x, y) => {
                skip_if(&mut m.program_counter, m.registers[x] != m.registers[y])
            }
            LoadByte(x, nn) => v[x] = nn,
            AddByte(x, nn) => v[x] = v[x].wrapping_add(nn),
            Assign(x, y) => v[x] = v[y],
            Or(x, y) => v[x] |= v[y],
            And(x, y) => v[x] &= v[y],
            Xor(x, y) => v[x] ^= v[y],
            AddRegisters(x, y) => {
                let (sum, carry) = v[x].overflowing_add(v[y]);
                v[x] = sum;
                v[FLAG_REGISTER] = carry as u8;
            }
            SubtractYFromX(x, y) => {
                let (a, b) = (v[x], v[y]);
                v[x] = a.wrapping_sub(b);
                v[FLAG_REGISTER] = (a > b) as u8;
            }
            SubtractXFromY(x, y) => {
                let (a, b) = (v[x], v[y]);
                v[x] = b.wrapping_sub(a);
                v[FLAG_REGISTER] = (b > a) as u8;
            }
            ShiftRight(x, y) => {
                if self.quirks.legacy_shift_copies_source {
                    v[x] = v[y];
                }
                let bit = v[x] & 0x01;
                v[x] >>= 1;
                v[FLAG_REGISTER] = bit;
            }
            ShiftLeft(x, y) => {
                if self.quirks.legacy_shift_copies_source {
                    v[x] = v[y];
                }
                let bit = v[x] >> 7;
                v[x] <<= 1;
                v[FLAG_REGISTER] = bit;
            }
            SetIndex(addr) => m.index_register = addr,
            JumpWithOffset(x, addr) => {
                let offset = if self.quirks.jump_with_offset_uses_encoded_register {
                    m.registers[x]
                } else {
                    m.registers[0]
                };
                m.program_counter = addr + offset as u16;
            }
            Random(x, nn) => v[x] = self.rng.random::<u8>() & nn,
            Draw(x, y, n) => {
                // coordinates are taken before VF is touched, as either may be VF
                let (vx, vy) = (m.registers[x], m.registers[y]);
                // rows past the bottom edge are never read
                let visible = (n as usize).min(SCREEN_HEIGHT - vy as usize % SCREEN_HEIGHT);
                let rows = m.memory.get_ro_slice(m.index_addr(), visible)?;
                m.registers[FLAG_REGISTER] = 0;
                let collision = m.framebuffer.draw_sprite(vx, vy, rows);
                m.registers[FLAG_REGISTER] = collision as u8;
            }
            SkipIfKeyPressed(x) => {
                skip_if(&mut m.program_counter, keypad.is_held(m.registers[x]))
            }
            SkipIfKeyNotPressed(x) => {
                skip_if(&mut m.program_counter, !keypad.is_held(m.registers[x]))
            }
            ReadDelayTimer(x) => m.registers[x] = m.timers.delay(),
            SetDelayTimer(x) => m.timers.set_delay(m.registers[x]),
            SetSoundTimer(x) => m.timers.set_sound(m.registers[x]),
            AddToIndex(x) => {
                let index = (m.index_register & INDEX_MASK) + m.registers[x] as u16;
                m.index_register = index;
                // the 13th bit is the overflow
                if index & 0x1000 != 0 {
                    m.registers[FLAG_REGISTER] = 1;
                }
            }
            WaitForKey(x) => {
                // stay on this instruction until the latch sees a key go up
                m.program_counter = m.program_counter.wrapping_sub(2);
                m.run_state = RunState::AwaitingKey {
                    register: x,
                    latch: KeyLatch::new(),
                };
                poll_for_key(m, keypad);
            }
            FontCharacter(x) => {
                m.index_register =
                    m.memory.font_addr + CHIP8_FONT_GLYPH_BYTES * m.registers[x] as u16;
            }
            BinaryCodedDecimal(x) => {
                let value = m.registers[x];
                let digits = [value / 100, (value / 10) % 10, value % 10];
                let addr = m.index_addr();
                m.memory.write(&digits, addr)?;
            }
            // NB. I is left where it was, unlike on the COSMAC VIP
            StoreRegisters(x) => {
                let addr = m.index_addr();
                m.memory.write(&m.registers[..=x], addr)?;
            }
            LoadRegisters(x) => {
                let src = m.memory.get_ro_slice(m.index_addr(), x + 1)?;
                m.registers[..=x].copy_from_slice(src);
            }
            Unknown(raw) => debug!("ignoring unknown instruction 0x{:04x}", raw),
        }
        Ok(())
    }
}

fn skip_if(program_counter: &mut u16, condition: bool) {
    if condition {
        *program_counter = program_counter.wrapping_add(2);
    }
}

/// one look at the keypad for a parked FX0A; on a release, deliver the key
/// and move past the instruction
fn poll_for_key(machine: &mut Machine, keypad: &(impl Keypad + ?Sized)) {
    if let RunState::AwaitingKey { register, latch } = &mut machine.run_state {
        if let Some(key) = latch.poll(keypad) {
            let register = *register;
            machine.registers[register] = key;
            machine.program_counter = machine.program_counter.wrapping_add(2);
            machine.run_state = RunState::Running;
        }
    }
}
