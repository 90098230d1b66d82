/// # config
///
/// Startup configuration.
///
/// Everything here is fixed once the interpreter is built. The one exception
/// is the instructions-per-frame throttle, which the frame loop copies and
/// lets the user nudge with hotkeys.
use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_INSTRUCTIONS_PER_FRAME: u32 = 11;
pub const DEFAULT_FRAMES_PER_SECOND: u32 = 60;

/// Behaviours where historical interpreters disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quirks {
    /// 8XY6/8XYE copy VY into VX before shifting (COSMAC VIP)
    pub legacy_shift_copies_source: bool,
    /// BXNN jumps to XNN + VX (SUPER-CHIP) rather than NNN + V0
    pub jump_with_offset_uses_encoded_register: bool,
}

impl Default for Quirks {
    fn default() -> Self {
        Quirks {
            legacy_shift_copies_source: true,
            jump_with_offset_uses_encoded_register: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub quirks: Quirks,
    /// instructions executed per frame, at least 1
    pub instructions_per_frame: u32,
    /// frame rate, which is also the timer rate
    pub frames_per_second: u32,
    /// fixed seed for CXNN; entropy from the OS otherwise
    pub seed: Option<u64>,
    /// dump registers after every instruction
    pub debug: bool,
    /// start suspended after each frame
    pub step_through: bool,
    pub mute: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            quirks: Quirks::default(),
            instructions_per_frame: DEFAULT_INSTRUCTIONS_PER_FRAME,
            frames_per_second: DEFAULT_FRAMES_PER_SECOND,
            seed: None,
            debug: false,
            step_through: false,
            mute: false,
        }
    }
}

#[doc(hidden)]
#[derive(Parser, Debug)]
#[command(version, about = "CHIP-8 interpreter for the terminal", long_about = None)]
pub struct Args {
    /// Path to the program to run
    pub rom: PathBuf,

    #[arg(long, default_value_t = DEFAULT_INSTRUCTIONS_PER_FRAME,
          value_parser = clap::value_parser!(u32).range(1..),
          help = "Instructions executed per frame")]
    pub ipf: u32,

    #[arg(long, default_value_t = DEFAULT_FRAMES_PER_SECOND,
          value_parser = clap::value_parser!(u32).range(1..),
          help = "Frames (and timer ticks) per second")]
    pub fps: u32,

    #[arg(long, help = "Shift VX in place instead of copying VY into it first")]
    pub no_shift_quirk: bool,

    #[arg(long, help = "Jump with offset always adds V0 (BNNN) instead of VX (BXNN)")]
    pub jump_v0: bool,

    #[arg(long, help = "Seed for the random number instruction")]
    pub seed: Option<u64>,

    #[arg(long, help = "No sound")]
    pub mute: bool,

    #[arg(short, long, help = "Log registers after every instruction")]
    pub debug: bool,

    #[arg(short, long, help = "Wait for Enter after every frame")]
    pub step: bool,
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Config {
            quirks: Quirks {
                legacy_shift_copies_source: !args.no_shift_quirk,
                jump_with_offset_uses_encoded_register: !args.jump_v0,
            },
            instructions_per_frame: args.ipf,
            frames_per_second: args.fps,
            seed: args.seed,
            debug: args.debug,
            step_through: args.step,
            mute: args.mute,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["chip8", "snake.ch8"]).unwrap();
        let config = Config::from(&args);
        assert_eq!(config, Config::default());
        assert_eq!(args.rom, PathBuf::from("snake.ch8"));
    }

    #[test]
    fn test_flags() {
        let args = Args::try_parse_from([
            "chip8", "--ipf", "20", "--fps", "30", "--no-shift-quirk", "--jump-v0", "--seed", "7",
            "--mute", "-d", "-s", "game.ch8",
        ])
        .unwrap();
        let config = Config::from(&args);
        assert_eq!(config.instructions_per_frame, 20);
        assert_eq!(config.frames_per_second, 30);
        assert!(!config.quirks.legacy_shift_copies_source);
        assert!(!config.quirks.jump_with_offset_uses_encoded_register);
        assert_eq!(config.seed, Some(7));
        assert!(config.mute && config.debug && config.step_through);
    }

    #[test]
    fn test_zero_rates_rejected() {
        assert!(Args::try_parse_from(["chip8", "--ipf", "0", "a.ch8"]).is_err());
        assert!(Args::try_parse_from(["chip8", "--fps", "0", "a.ch8"]).is_err());
    }
}
