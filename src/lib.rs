//! A CHIP-8 virtual machine with a terminal front end.
//!
//! ## Design
//!
//! * the machine core is plain data plus one `step()` per instruction; it
//!   never sleeps, renders, beeps or reads the keyboard itself
//! * instruction throughput and the 60Hz timers are independent; the host
//!   decides how many cycles to run between timer ticks
//! * decode into an enum and `match` it exhaustively, so there is no dispatch
//!   table with holes; anything undefined is a no-op
//! * abstract display, input and sound behind traits so can plug
//!   alternatives; starting with TUI in-console
//! * random numbers come from a seedable generator handed to the machine, so
//!   runs can be replayed
//!
//! Model
//!
//! ```text
//! Environment
//!  |-- display, input, sound, config
//!  |-- interpreter(memory, framebuffer, keypad, rng, quirks)
//!  |    |-- instruction decode
//!  |    `-- operations
//!  `-- main loop, once per frame
//!       |-- keypad = input.poll_keys()
//!       |-- up to ips / timer_hz cycles (stops early waiting on Fx0A)
//!       |-- tick timers; sound follows the sound timer
//!       |-- redraw if the framebuffer changed
//!       `-- sleep until the next frame
//! ```
pub mod config;
pub mod display;
pub mod environment;
pub mod error;
pub mod input;
pub mod instruction;
pub mod interpreter;
pub mod memory;
pub mod sound;

pub use config::{Config, Quirks};
pub use display::Framebuffer;
pub use error::Chip8Error;
pub use input::Keypad;
pub use instruction::Instruction;
pub use interpreter::{Chip8Interpreter, Cycle};
