use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal;
use log::{debug, warn};
use std::collections::HashMap;
use std::io;
use std::time::{Duration, Instant};

/// map of keys on the left-hand side of a qwerty keyboard to the hex keypad
const CHIP8_CONVENTIONAL_KEYMAP: [(char, u8); 16] = [
    ('x', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('q', 0x04),
    ('w', 0x05),
    ('e', 0x06),
    ('a', 0x07),
    ('s', 0x08),
    ('d', 0x09),
    ('z', 0x0a),
    ('c', 0x0b),
    ('4', 0x0c),
    ('r', 0x0d),
    ('f', 0x0e),
    ('v', 0x0f),
];

/// how many keys on the keypad
pub const KEY_COUNT: usize = 16;

/// The question the interpreter asks of the keyboard: is this key down right now?
pub trait Keypad {
    /// `key` comes straight out of a register, so anything above 0xF is
    /// simply not held
    fn is_held(&self, key: u8) -> bool;
}

/// Things the host asks of the frame loop, as opposed to keypad presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    Quit,
    SpeedUp,
    SpeedDown,
    ToggleStep,
}

/// reads the keyboard once per frame
pub trait Input: Keypad {
    /// drain whatever the host has queued up since the last frame, updating
    /// held keys, and hand back any commands for the frame loop
    fn pump(&mut self) -> Result<Vec<HostCommand>, io::Error>;

    /// block until the user lets single-step mode move on to the next frame;
    /// a command pressed instead of the confirm key is handed back
    fn wait_for_step(&mut self) -> Result<Option<HostCommand>, io::Error> {
        Ok(None)
    }
}

/// Edge detector for FX0A: a key counts once it has been seen held and is
/// then seen released. Keys are scanned from 0x0 up, so when several are let
/// go at once the lowest one wins.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KeyLatch {
    latched: [bool; KEY_COUNT],
}

impl KeyLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// latch every held key; report the first latched key now released,
    /// resetting the latch when one is found
    pub fn poll(&mut self, keypad: &(impl Keypad + ?Sized)) -> Option<u8> {
        for key in 0..KEY_COUNT as u8 {
            let latched = &mut self.latched[key as usize];
            if keypad.is_held(key) {
                *latched = true;
            } else if *latched {
                self.reset();
                return Some(key);
            }
        }
        None
    }

    pub fn reset(&mut self) {
        self.latched = [false; KEY_COUNT];
    }

    pub fn is_latched(&self, key: u8) -> bool {
        self.latched.get(key as usize).copied().unwrap_or(false)
    }
}

/// Terminals only report presses (and auto-repeats), never releases, so a key
/// is taken to be held for this long after it was last reported.
const HOLD_TIME: Duration = Duration::from_millis(250);

/// Input from the controlling terminal, using crossterm in raw mode.
pub struct StdinInput {
    keymap: HashMap<char, u8>,
    last_seen: [Option<Instant>; KEY_COUNT],
}

impl StdinInput {
    pub fn new() -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(StdinInput {
            keymap: HashMap::from(CHIP8_CONVENTIONAL_KEYMAP),
            last_seen: [None; KEY_COUNT],
        })
    }

    /// keypad press, host command, or nothing we care about
    fn handle_key(&mut self, evt: KeyEvent) -> Option<HostCommand> {
        match evt.code {
            KeyCode::Char('c') if evt.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(HostCommand::Quit)
            }
            KeyCode::Char(key) => {
                match self.keymap.get(&key.to_ascii_lowercase()) {
                    Some(mapped_key) => {
                        self.last_seen[*mapped_key as usize] = Some(Instant::now());
                    }
                    None => warn!("can't map {:?} to a keypad key", key),
                }
                None
            }
            KeyCode::Esc => Some(HostCommand::Quit),
            KeyCode::Up => Some(HostCommand::SpeedUp),
            KeyCode::Down => Some(HostCommand::SpeedDown),
            KeyCode::Backspace => Some(HostCommand::ToggleStep),
            other => {
                debug!("ignoring key {:?}", other);
                None
            }
        }
    }
}

impl Drop for StdinInput {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

impl Keypad for StdinInput {
    fn is_held(&self, key: u8) -> bool {
        match self.last_seen.get(key as usize) {
            Some(Some(seen)) => seen.elapsed() < HOLD_TIME,
            _ => false,
        }
    }
}

impl Input for StdinInput {
    fn pump(&mut self) -> Result<Vec<HostCommand>, io::Error> {
        let mut commands = Vec::new();
        while poll(Duration::from_millis(0))? {
            if let Event::Key(evt) = read()? {
                commands.extend(self.handle_key(evt));
            }
        }
        Ok(commands)
    }

    fn wait_for_step(&mut self) -> Result<Option<HostCommand>, io::Error> {
        loop {
            if let Event::Key(evt) = read()? {
                if evt.code == KeyCode::Enter {
                    return Ok(None);
                }
                if let Some(command) = self.handle_key(evt) {
                    return Ok(Some(command));
                }
            }
        }
    }
}

/// dummy Input implementation for testing: keys and commands are set by hand
#[derive(Debug, Default)]
pub struct DummyInput {
    held: [bool; KEY_COUNT],
    commands: Vec<HostCommand>,
}

impl DummyInput {
    pub fn new(keys: &[u8]) -> Self {
        let mut input = Self::default();
        for key in keys {
            input.press(*key);
        }
        input
    }

    pub fn press(&mut self, key: u8) {
        if let Some(held) = self.held.get_mut(key as usize) {
            *held = true;
        }
    }

    pub fn release(&mut self, key: u8) {
        if let Some(held) = self.held.get_mut(key as usize) {
            *held = false;
        }
    }

    /// queue a command for the next pump
    pub fn send(&mut self, command: HostCommand) {
        self.commands.push(command);
    }
}

impl Keypad for DummyInput {
    fn is_held(&self, key: u8) -> bool {
        self.held.get(key as usize).copied().unwrap_or(false)
    }
}

impl Input for DummyInput {
    fn pump(&mut self) -> Result<Vec<HostCommand>, io::Error> {
        Ok(std::mem::take(&mut self.commands))
    }
}
