//! # interpreter
//!
//! The machine itself: 4K of RAM, sixteen 8-bit registers V0-VF, the 16-bit
//! I pointer and program counter, a sixteen-deep return stack, the delay and
//! sound timers, the keypad and the framebuffer.
//!
//! A cycle is fetch (big-endian word at PC), advance PC by 2, decode, execute.
//! Timers are not touched by cycles at all; the host calls `tick_timers` at its
//! own rate (traditionally 60Hz) however many cycles it runs in between.
//!
//! VF doubles as the carry/borrow/collision flag. Where an instruction sets the
//! flag and a result, the flag goes in first, so an instruction targeting VF
//! itself ends up holding the result.
use crate::config::{Config, Quirks};
use crate::display::Framebuffer;
use crate::error::Chip8Error;
use crate::input::Keypad;
use crate::instruction::{Instruction, Reg};
use crate::memory::{Chip8MemoryMap, MemoryMap, CHIP8_PROGRAM_ADDR};
use log::{debug, error, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io;
use std::time::{SystemTime, UNIX_EPOCH};

pub const REGISTER_COUNT: usize = 16;
pub const STACK_DEPTH: usize = 16;

/// VF
const FLAG: Reg = 0xf;

/// the tallest sprite a nibble can ask for
const MAX_SPRITE_ROWS: usize = 15;

/// What a single cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    /// the instruction ran; unknown instructions run as no-ops
    Executed(Instruction),
    /// Fx0A saw no key go down since it started waiting, so PC was left on it
    /// and the next cycle will try again
    WaitingForKey,
}

pub struct Chip8Interpreter {
    memory: Chip8MemoryMap,
    v: [u8; REGISTER_COUNT],
    i: u16,
    program_counter: u16,
    stack: [u16; STACK_DEPTH],
    stack_pointer: usize,
    delay_timer: u8,
    sound_timer: u8,
    keypad: Keypad,
    /// keys held when Fx0A last looked, while it is waiting
    key_wait: Option<Keypad>,
    framebuffer: Framebuffer,
    opcode: u16,
    redraw: bool,
    rng: StdRng,
    quirks: Quirks,
}

impl Chip8Interpreter {
    /// fresh machine drawing its random numbers from `rng`
    pub fn new(rng: StdRng) -> Chip8Interpreter {
        Chip8Interpreter {
            memory: Chip8MemoryMap::new(),
            v: [0; REGISTER_COUNT],
            i: 0x0000,
            program_counter: CHIP8_PROGRAM_ADDR,
            stack: [0; STACK_DEPTH],
            stack_pointer: 0,
            delay_timer: 0x00,
            sound_timer: 0x00,
            keypad: Keypad::new(),
            key_wait: None,
            framebuffer: Framebuffer::new(),
            opcode: 0x0000,
            redraw: false,
            rng,
            quirks: Quirks::default(),
        }
    }

    /// deterministic random numbers, for tests and replays
    pub fn with_seed(seed: u64) -> Chip8Interpreter {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// random numbers seeded from the wall clock
    pub fn from_clock() -> Chip8Interpreter {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        Self::with_seed(seed)
    }

    pub fn from_config(config: &Config) -> Chip8Interpreter {
        let machine = match config.seed {
            Some(seed) => Self::with_seed(seed),
            None => Self::from_clock(),
        };
        machine.with_quirks(config.quirks)
    }

    pub fn with_quirks(mut self, quirks: Quirks) -> Chip8Interpreter {
        self.quirks = quirks;
        self
    }

    /// load a program image at 0x200; nothing is written if it doesn't fit
    pub fn load(&mut self, image: &[u8]) -> Result<(), Chip8Error> {
        self.memory.load(image)
    }

    /// load a chip8 program from a file or similar
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize, Chip8Error> {
        self.memory.load_program(reader)
    }

    /// Run one instruction. A fatal error (stack overflow or underflow) leaves
    /// the machine exactly as it was before the cycle, with PC on the culprit.
    pub fn step(&mut self) -> Result<Cycle, Chip8Error> {
        let addr = self.program_counter;
        self.opcode = self.memory.get_word(addr);
        self.program_counter = addr.wrapping_add(2);
        let instruction = Instruction::decode(self.opcode);
        trace!("{:#05x}: {:04x}  {}", addr, self.opcode, instruction);

        self.execute(instruction, addr).map_err(|e| {
            self.program_counter = addr;
            error!("{}", e);
            e
        })
    }

    /// count both timers down by one, stopping at zero
    pub fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.framebuffer
    }

    /// Checks and clears the redraw flag
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    /// replace the whole key matrix; call between cycles
    pub fn set_keypad(&mut self, keypad: Keypad) {
        self.keypad = keypad;
    }

    pub fn keypad_mut(&mut self) -> &mut Keypad {
        &mut self.keypad
    }

    pub fn registers(&self) -> &[u8; REGISTER_COUNT] {
        &self.v
    }

    pub fn index(&self) -> u16 {
        self.i
    }

    pub fn program_counter(&self) -> u16 {
        self.program_counter
    }

    pub fn stack_depth(&self) -> usize {
        self.stack_pointer
    }

    /// the instruction word fetched by the last cycle
    pub fn opcode(&self) -> u16 {
        self.opcode
    }

    pub fn memory(&self) -> &[u8] {
        self.memory.get_ro_slice()
    }

    fn execute(&mut self, instruction: Instruction, addr: u16) -> Result<Cycle, Chip8Error> {
        use Instruction::*;
        match instruction {
            Cls => {
                self.framebuffer.clear();
                self.redraw = true;
            }
            Ret => self.program_counter = self.pop_stack(addr)?,
            Jp(nnn) => self.program_counter = nnn,
            Call(nnn) => {
                self.push_stack(self.program_counter, addr)?;
                self.program_counter = nnn;
            }
            SeByte(x, kk) => self.skip_if(self.v[x] == kk),
            SneByte(x, kk) => self.skip_if(self.v[x] != kk),
            SeReg(x, y) => {
                let other = if self.quirks.self_compare_skip { x } else { y };
                self.skip_if(self.v[x] == self.v[other]);
            }
            LdByte(x, kk) => self.v[x] = kk,
            AddByte(x, kk) => self.v[x] = self.v[x].wrapping_add(kk),
            LdReg(x, y) => self.v[x] = self.v[y],
            Or(x, y) => self.v[x] |= self.v[y],
            And(x, y) => self.v[x] &= self.v[y],
            Xor(x, y) => self.v[x] ^= self.v[y],
            AddReg(x, y) => {
                let (sum, carry) = self.v[x].overflowing_add(self.v[y]);
                self.v[FLAG] = carry as u8;
                self.v[x] = sum;
            }
            Sub(x, y) => {
                let (vx, vy) = (self.v[x], self.v[y]);
                self.v[FLAG] = (vx > vy) as u8;
                self.v[x] = vx.wrapping_sub(vy);
            }
            Shr(x, y) => {
                let src = self.v[self.shift_source(x, y)];
                self.v[FLAG] = src & 0x01;
                self.v[x] = src >> 1;
            }
            Subn(x, y) => {
                let (vx, vy) = (self.v[x], self.v[y]);
                self.v[FLAG] = (vy > vx) as u8;
                self.v[x] = vy.wrapping_sub(vx);
            }
            Shl(x, y) => {
                let src = self.v[self.shift_source(x, y)];
                self.v[FLAG] = src >> 7;
                self.v[x] = src << 1;
            }
            SneReg(x, y) => self.skip_if(self.v[x] != self.v[y]),
            LdI(nnn) => self.i = nnn,
            JpV0(nnn) => self.program_counter = self.v[0] as u16 + nnn,
            Rnd(x, kk) => self.v[x] = self.rng.gen::<u8>() & kk,
            Drw(x, y, n) => self.draw_sprite(x, y, n),
            Skp(x) => self.skip_if(self.keypad.is_pressed(self.v[x])),
            Sknp(x) => self.skip_if(!self.keypad.is_pressed(self.v[x])),
            LdRegDt(x) => self.v[x] = self.delay_timer,
            LdKey(x) => {
                let newly_pressed = self
                    .key_wait
                    .and_then(|before| self.keypad.first_pressed_since(&before));
                match newly_pressed {
                    Some(key) => {
                        self.v[x] = key;
                        self.key_wait = None;
                    }
                    None => {
                        // keys already down don't count; go round again next cycle
                        if self.key_wait.is_none() {
                            debug!("waiting for a key at {:#05x}", addr);
                        }
                        self.key_wait = Some(self.keypad);
                        self.program_counter = addr;
                        return Ok(Cycle::WaitingForKey);
                    }
                }
            }
            LdDtReg(x) => self.delay_timer = self.v[x],
            LdStReg(x) => self.sound_timer = self.v[x],
            AddI(x) => self.i = self.i.wrapping_add(self.v[x] as u16),
            LdFont(x) => self.i = Chip8MemoryMap::font_addr(self.v[x]),
            LdBcd(x) => {
                let val = self.v[x];
                self.memory.write(&[val / 100, val / 10 % 10, val % 10], self.i);
            }
            StoreRegs(x) => {
                self.memory.write(&self.v[..=x], self.i);
                self.bump_index(x);
            }
            LoadRegs(x) => {
                for r in 0..=x {
                    self.v[r] = self.memory.read_byte(self.i.wrapping_add(r as u16));
                }
                self.bump_index(x);
            }
            Unknown(op) => debug!("ignoring unknown instruction {:#06x} at {:#05x}", op, addr),
        }
        Ok(Cycle::Executed(instruction))
    }

    fn skip_if(&mut self, condition: bool) {
        if condition {
            self.program_counter = self.program_counter.wrapping_add(2);
        }
    }

    fn shift_source(&self, x: Reg, y: Reg) -> Reg {
        if self.quirks.shift_reads_vy {
            y
        } else {
            x
        }
    }

    fn bump_index(&mut self, x: Reg) {
        if self.quirks.load_store_bumps_index {
            self.i = self.i.wrapping_add(x as u16 + 1);
        }
    }

    fn draw_sprite(&mut self, x: Reg, y: Reg, n: u8) {
        let rows = n as usize;
        let mut sprite = [0u8; MAX_SPRITE_ROWS];
        for (row, byte) in sprite[..rows].iter_mut().enumerate() {
            *byte = self.memory.read_byte(self.i.wrapping_add(row as u16));
        }
        let collision = self
            .framebuffer
            .draw_sprite(self.v[x], self.v[y], &sprite[..rows]);
        self.v[FLAG] = collision as u8;
        self.redraw = true;
    }

    fn push_stack(&mut self, val: u16, addr: u16) -> Result<(), Chip8Error> {
        if self.stack_pointer >= STACK_DEPTH {
            return Err(Chip8Error::StackOverflow { pc: addr });
        }
        self.stack[self.stack_pointer] = val;
        self.stack_pointer += 1;
        Ok(())
    }

    fn pop_stack(&mut self, addr: u16) -> Result<u16, Chip8Error> {
        if self.stack_pointer == 0 {
            return Err(Chip8Error::StackUnderflow { pc: addr });
        }
        self.stack_pointer -= 1;
        Ok(self.stack[self.stack_pointer])
    }
}
