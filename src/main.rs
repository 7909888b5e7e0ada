use clap::Parser;
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use chip8_vm::config::{Config, Quirks, DEFAULT_INSTRUCTIONS_PER_SECOND, DEFAULT_TIMER_HZ};
use chip8_vm::display::MonoTermDisplay;
use chip8_vm::environment::Environment;
use chip8_vm::input::{Keymap, StdinInput};
use chip8_vm::instruction::disassemble;
use chip8_vm::interpreter::Chip8Interpreter;
use chip8_vm::sound::{Mute, SimpleBeep, Sound};

/// Run a CHIP-8 program in the terminal. Esc quits.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// program image to load at 0x200
    rom: PathBuf,

    /// instructions per second
    #[arg(long, default_value_t = DEFAULT_INSTRUCTIONS_PER_SECOND)]
    ips: u32,

    /// timer (and frame) rate in Hz
    #[arg(long, default_value_t = DEFAULT_TIMER_HZ)]
    timer_hz: u32,

    /// seed the random number generator instead of using the clock
    #[arg(long)]
    seed: Option<u64>,

    /// stop after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// make 5xy0 compare Vx with Vy
    #[arg(long = "fix-5xy0")]
    fix_5xy0: bool,

    /// shift Vy into Vx for 8xy6/8xyE
    #[arg(long)]
    shift_vy: bool,

    /// advance I past the registers for Fx55/Fx65
    #[arg(long)]
    bump_index: bool,

    /// use 0-9 and a-f as the keypad instead of the 1234/qwer/asdf/zxcv block
    #[arg(long)]
    literal_keys: bool,

    /// beep through the PC speaker
    #[arg(long)]
    sound: bool,

    /// print a listing of the program and exit
    #[arg(long)]
    disassemble: bool,
}

impl Args {
    fn config(&self) -> Config {
        Config {
            instructions_per_second: self.ips,
            timer_hz: self.timer_hz,
            seed: self.seed,
            max_frames: self.frames,
            quirks: Quirks {
                self_compare_skip: !self.fix_5xy0,
                shift_reads_vy: self.shift_vy,
                load_store_bumps_index: self.bump_index,
            },
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("error")).init();
    let args = Args::parse();
    let config = args.config();
    let mut f = File::open(&args.rom)?;

    if args.disassemble {
        let mut image = Vec::new();
        f.read_to_end(&mut image)?;
        for (addr, raw, instruction) in disassemble(&image) {
            println!("{:03x}: {:04x}  {}", addr, raw, instruction);
        }
        return Ok(());
    }

    // load before touching the terminal so a bad rom reports cleanly
    let mut interpreter = Chip8Interpreter::from_config(&config);
    interpreter.load_program(&mut f)?;

    let keymap = if args.literal_keys {
        Keymap::Literal
    } else {
        Keymap::Conventional
    };
    let mut display = MonoTermDisplay::new()?;
    let mut input = StdinInput::new(keymap)?;
    let mut sound: Box<dyn Sound> = if args.sound {
        Box::new(SimpleBeep::new())
    } else {
        Box::new(Mute::new())
    };

    let result = Environment::new(
        interpreter,
        &mut display,
        &mut input,
        sound.as_mut(),
        config,
    )
    .run();

    // shove some junk on stdout to stop the cli messing up the last frame
    for _ in 0..12 {
        println!();
    }
    result?;
    Ok(())
}
