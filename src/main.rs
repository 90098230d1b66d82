use std::error::Error;
use std::fs::File;

use chip8::config::{Args, Config};
use chip8::display::MonoTermDisplay;
use chip8::input::StdinInput;
use chip8::interpreter::Chip8Interpreter;
use chip8::sound::{Mute, SimpleBeep, Sound};
use clap::Parser;
use log::{error, LevelFilter};

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config = Config::from(&args);

    // the terminal belongs to the display, so logs go to stderr; quiet by default
    let level = if config.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    // load the program before touching the terminal, so a bad path reads cleanly
    let mut f = File::open(&args.rom)?;

    // initialise
    let mut display = MonoTermDisplay::new()?;
    let mut input = StdinInput::new()?;
    let mut sound: Box<dyn Sound> = if config.mute {
        Box::new(Mute::new())
    } else {
        Box::new(SimpleBeep::new())
    };
    let mut interpreter = Chip8Interpreter::new(&config, &mut display, &mut input, &mut *sound);
    interpreter.load_program(&mut f)?;

    let result = interpreter.main_loop(None);
    if let Err(e) = &result {
        error!("{}", e);
    }
    drop(interpreter);
    drop(input);
    drop(display);

    // shove some junk on stdout to stop the cli messing up the last frame
    for _ in 0..4 {
        println!();
    }
    result
}
