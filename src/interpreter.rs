/// # interpreter
///
/// The frame loop. Once per frame:
///  1. pump host input: keypad state, quit, speed hotkeys, single-step toggle
///  2. run a batch of instructions (`instructions_per_frame`)
///  3. open or close the audio gate from the sound timer
///  4. redraw
///  5. in single-step mode, wait for the user before carrying on
/// then sleep off whatever is left of the frame.
///
/// The delay and sound timers are counted down by a separate thread at the
/// frame rate, so a slow or busy frame doesn't slow the timers.
use crate::config::Config;
use crate::display::Display;
use crate::error::MachineError;
use crate::executor::Executor;
use crate::input::{HostCommand, Input};
use crate::machine::Machine;
use crate::sound::{AudioGate, Sound};
use crate::timer::TimerTicker;
use log::{error, info, warn};
use std::error::Error;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub struct Chip8Interpreter<'a> {
    machine: Machine,
    executor: Executor,
    display: &'a mut dyn Display,
    input: &'a mut dyn Input,
    sound: &'a mut dyn Sound,
    gate: AudioGate,
    instructions_per_frame: u32,
    frames_per_second: u32,
    step_through: bool,
    running: bool,
}

impl<'a> Chip8Interpreter<'a> {
    pub fn new(
        config: &Config,
        display: &'a mut dyn Display,
        input: &'a mut dyn Input,
        sound: &'a mut dyn Sound,
    ) -> Self {
        Chip8Interpreter {
            machine: Machine::new(),
            executor: Executor::new(config),
            display,
            input,
            sound,
            gate: AudioGate::new(),
            instructions_per_frame: config.instructions_per_frame.max(1),
            frames_per_second: config.frames_per_second.max(1),
            step_through: config.step_through,
            running: true,
        }
    }

    /// load a chip8 program
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize, MachineError> {
        let len = self.machine.load_program(reader)?;
        info!("loaded {} byte program at 0x{:03x}", len, self.machine.program_counter);
        Ok(len)
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn instructions_per_frame(&self) -> u32 {
        self.instructions_per_frame
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_stepping(&self) -> bool {
        self.step_through
    }

    /// Run frames until told to quit, `max_frames` runs out, or the machine
    /// hits a fatal error. The timer thread lives exactly as long as this call.
    pub fn main_loop(&mut self, max_frames: Option<u64>) -> Result<(), Box<dyn Error>> {
        let frame_duration = Duration::from_secs(1) / self.frames_per_second;
        let mut ticker =
            TimerTicker::spawn(Arc::clone(&self.machine.timers), self.frames_per_second);
        let mut frames = 0u64;

        while self.running && max_frames.map_or(true, |max| frames < max) {
            let frame_start = Instant::now();
            if let Err(e) = self.frame() {
                ticker.stop();
                self.silence();
                return Err(e);
            }
            frames += 1;

            if let Some(sleep_time) = frame_duration.checked_sub(frame_start.elapsed()) {
                spin_sleep::sleep(sleep_time);
            }
        }

        ticker.stop();
        self.silence();
        info!("stopped after {} frames", frames);
        Ok(())
    }

    /// one trip round the loop
    pub fn frame(&mut self) -> Result<(), Box<dyn Error>> {
        for command in self.input.pump()? {
            self.handle(command);
        }
        if !self.running {
            return Ok(());
        }

        if let Err(e) = self
            .executor
            .run_batch(&mut self.machine, &*self.input, self.instructions_per_frame)
        {
            error!("halting at 0x{:04x}: {}", self.machine.program_counter, e);
            self.running = false;
            return Err(e.into());
        }

        self.gate.update(self.machine.sound_timer(), &mut *self.sound)?;
        self.display.draw(&self.machine.framebuffer)?;

        if self.step_through {
            if let Some(command) = self.input.wait_for_step()? {
                self.handle(command);
            }
        }
        Ok(())
    }

    fn handle(&mut self, command: HostCommand) {
        match command {
            HostCommand::Quit => {
                info!("quit");
                self.running = false;
            }
            HostCommand::SpeedUp => {
                self.instructions_per_frame += 1;
                info!("instructions per frame: {}", self.instructions_per_frame);
            }
            HostCommand::SpeedDown => {
                if self.instructions_per_frame > 1 {
                    self.instructions_per_frame -= 1;
                }
                info!("instructions per frame: {}", self.instructions_per_frame);
            }
            HostCommand::ToggleStep => {
                self.step_through = !self.step_through;
                info!("single step {}", if self.step_through { "on" } else { "off" });
            }
        }
    }

    // don't leave a tone running on the way out
    fn silence(&mut self) {
        if let Err(e) = self.gate.update(0, &mut *self.sound) {
            warn!("couldn't stop the tone: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::DummyDisplay;
    use crate::input::DummyInput;
    use crate::sound::Mute;

    #[test]
    fn test_program_load_ok() -> Result<(), MachineError> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        let mut i = Chip8Interpreter::new(&Config::default(), &mut display, &mut input, &mut sound);
        let mut prog: &[u8] = &[0x00, 0xe0]; // clear screen
        assert_eq!(i.load_program(&mut prog)?, 2);
        Ok(())
    }

    #[test]
    fn test_frame_runs_a_batch_and_draws() -> Result<(), Box<dyn Error>> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        let config = Config {
            instructions_per_frame: 3,
            ..Config::default()
        };
        {
            let mut i = Chip8Interpreter::new(&config, &mut display, &mut input, &mut sound);
            // V0 += 1, four times
            let mut prog: &[u8] = &[0x70, 0x01, 0x70, 0x01, 0x70, 0x01, 0x70, 0x01];
            i.load_program(&mut prog)?;
            i.frame()?;
            assert_eq!(i.machine().registers[0], 3);
            assert_eq!(i.machine().program_counter, 0x206);
        }
        assert_eq!(display.frames, 1);
        Ok(())
    }

    #[test]
    fn test_hotkeys() -> Result<(), Box<dyn Error>> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        let config = Config {
            instructions_per_frame: 1,
            ..Config::default()
        };
        input.send(HostCommand::SpeedDown);
        input.send(HostCommand::SpeedUp);
        input.send(HostCommand::SpeedUp);
        let mut i = Chip8Interpreter::new(&config, &mut display, &mut input, &mut sound);
        i.frame()?;
        assert_eq!(i.instructions_per_frame(), 3);
        assert!(i.is_running());
        i.handle(HostCommand::ToggleStep);
        assert!(i.is_stepping());
        i.handle(HostCommand::Quit);
        assert!(!i.is_running());
        Ok(())
    }

    #[test]
    fn test_quit_skips_the_batch() -> Result<(), Box<dyn Error>> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        input.send(HostCommand::Quit);
        let mut i = Chip8Interpreter::new(&Config::default(), &mut display, &mut input, &mut sound);
        i.frame()?;
        assert!(!i.is_running());
        assert_eq!(i.machine().program_counter, 0x200);
        Ok(())
    }

    #[test]
    fn test_audio_gate_follows_sound_timer() -> Result<(), Box<dyn Error>> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        {
            let config = Config {
                instructions_per_frame: 2,
                ..Config::default()
            };
            let mut i = Chip8Interpreter::new(&config, &mut display, &mut input, &mut sound);
            // V0 = 2; ST = V0; then spin on a jump to self
            let mut prog: &[u8] = &[0x60, 0x02, 0xf0, 0x18, 0x12, 0x04];
            i.load_program(&mut prog)?;
            i.frame()?;
            i.frame()?;
            i.machine().timers.tick();
            i.frame()?;
            i.machine().timers.tick();
            i.frame()?;
            i.frame()?;
        }
        assert_eq!((sound.beeps, sound.stops), (1, 1));
        Ok(())
    }

    #[test]
    fn test_fatal_error_stops_the_loop() {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        let mut i = Chip8Interpreter::new(&Config::default(), &mut display, &mut input, &mut sound);
        let mut prog: &[u8] = &[0x00, 0xee]; // return, with nothing to return to
        i.load_program(&mut prog).unwrap();
        assert!(i.main_loop(Some(5)).is_err());
        assert!(!i.is_running());
    }

    #[test]
    fn test_main_loop_frame_limit() -> Result<(), Box<dyn Error>> {
        let mut display = DummyDisplay::new();
        let mut input = DummyInput::new(&[]);
        let mut sound = Mute::new();
        let config = Config {
            frames_per_second: 1000,
            ..Config::default()
        };
        {
            let mut i = Chip8Interpreter::new(&config, &mut display, &mut input, &mut sound);
            let mut prog: &[u8] = &[0x12, 0x00]; // jump to self
            i.load_program(&mut prog)?;
            i.main_loop(Some(4))?;
            assert!(i.is_running());
        }
        assert_eq!(display.frames, 4);
        Ok(())
    }
}
