use beep::beep;
use log::debug;
use std::error::Error;

/// Tone generator. Only ever told to start or stop.
pub trait Sound {
    fn beep(&mut self) -> Result<(), Box<dyn Error>>;
    fn stop(&mut self) -> Result<(), Box<dyn Error>>;
}

const SIMPLEBEEP_PITCH: u16 = 440; // A

/// PC speaker via the `beep` crate
#[derive(Debug, Default)]
pub struct SimpleBeep;

impl SimpleBeep {
    pub fn new() -> Self {
        SimpleBeep
    }
}

impl Sound for SimpleBeep {
    fn beep(&mut self) -> Result<(), Box<dyn Error>> {
        beep(SIMPLEBEEP_PITCH)?;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn Error>> {
        beep(0)?;
        Ok(())
    }
}

/// no sound at all; counts what it was asked to do, for tests
#[derive(Debug, Default)]
pub struct Mute {
    pub beeps: usize,
    pub stops: usize,
}

impl Mute {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Sound for Mute {
    fn beep(&mut self) -> Result<(), Box<dyn Error>> {
        self.beeps += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Box<dyn Error>> {
        self.stops += 1;
        Ok(())
    }
}

/// Tracks whether the tone should be playing and only bothers the sound
/// device when that changes.
#[derive(Debug, Default)]
pub struct AudioGate {
    open: bool,
}

impl AudioGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// recompute the gate from the sound timer, starting or stopping the tone
    /// on a change; returns whether anything was sent to the device
    pub fn update(&mut self, sound_timer: u8, sound: &mut dyn Sound) -> Result<bool, Box<dyn Error>> {
        let open = sound_timer != 0;
        if open == self.open {
            return Ok(false);
        }
        if open {
            sound.beep()?;
        } else {
            sound.stop()?;
        }
        debug!("audio gate {}", if open { "open" } else { "closed" });
        self.open = open;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_only_sends_changes() -> Result<(), Box<dyn Error>> {
        let mut gate = AudioGate::new();
        let mut mute = Mute::new();
        assert!(!gate.update(0, &mut mute)?);
        assert!(gate.update(5, &mut mute)?);
        assert!(!gate.update(4, &mut mute)?);
        assert!(!gate.update(1, &mut mute)?);
        assert!(gate.is_open());
        assert!(gate.update(0, &mut mute)?);
        assert!(!gate.update(0, &mut mute)?);
        assert_eq!((mute.beeps, mute.stops), (1, 1));
        assert!(!gate.is_open());
        Ok(())
    }

    /// a device that refuses to start
    struct Broken;
    impl Sound for Broken {
        fn beep(&mut self) -> Result<(), Box<dyn Error>> {
            Err("no speaker".into())
        }
        fn stop(&mut self) -> Result<(), Box<dyn Error>> {
            Ok(())
        }
    }

    #[test]
    fn test_gate_stays_shut_when_device_fails() {
        let mut gate = AudioGate::new();
        assert!(gate.update(3, &mut Broken).is_err());
        assert!(!gate.is_open());
    }
}
