///
/// ## Design
///
/// * CHIP-8 instructions run in batches, a fixed number per frame, then sleep
///   out the rest of the frame; not cycle accurate, nor trying to be
/// * delay and sound timers count down at 60Hz on their own thread, whatever
///   the instruction rate
/// * abstract display so can plug alternatives; starting with TUI in-console
/// * input device, with trait for reading key-presses
/// * audio device, with trait for making beeps
/// * the two quirks where interpreters disagree are config, not code
///
/// Pieces:
///
/// * memory map
///    - 4K, font at 0x050, program at 0x200
///    - initialised from an external reader
/// * instruction set
///    - decode is total: every u16 is *some* instruction, unknown ones are
///      skipped
/// * the machine itself
///    - registers, I, pc, stack, timers, framebuffer
///    - state machine: either running, or parked on FX0A until a key goes
///      down and back up
/// * executor
///    - pub .step() -- one instruction (or one look at the keypad)
///    - pub .run_batch(n) -- up to n instructions
/// * config (quirks, speed)
///
/// Model
///
/// main
///  |-- config(args)
///  |-- display, input, audio
///  `-- interpreter(config, display, input, audio)
///       |-- machine(memory, timers, framebuffer)
///       |-- executor(quirks, rng)
///       `-- main loop
///            |-- timer thread: timers.tick() at the frame rate
///            `-- every frame
///                 |-- commands = input.pump()
///                 |-- executor.run_batch(machine, input, instructions_per_frame)
///                 |-- audio gate from the sound timer
///                 |-- display.draw(framebuffer)
///                 `-- sleep(rest of frame)
pub mod config;
pub mod display;
pub mod error;
pub mod executor;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod machine;
pub mod memory;
pub mod sound;
pub mod timer;

pub use config::{Config, Quirks};
pub use error::MachineError;
pub use executor::Executor;
pub use instruction::{Instruction, Opcode};
pub use interpreter::Chip8Interpreter;
pub use machine::{Machine, RunState};
