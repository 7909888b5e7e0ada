use crossterm::event::{poll, read, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal;
use log::warn;
use std::collections::HashMap;
use std::io;
use std::time::Duration;

pub const KEY_COUNT: usize = 16;

/// The sixteen-key hex keypad as the machine sees it. The host writes it
/// between cycles; the machine only reads it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Keypad([bool; KEY_COUNT]);

impl Keypad {
    pub fn new() -> Self {
        Keypad([false; KEY_COUNT])
    }

    /// a keypad with exactly these keys held
    pub fn from_keys(keys: &[u8]) -> Self {
        let mut pad = Keypad::new();
        for key in keys {
            pad.press(*key);
        }
        pad
    }

    /// only the low nibble of `key` counts
    pub fn press(&mut self, key: u8) {
        self.0[(key & 0x0f) as usize] = true;
    }

    pub fn release(&mut self, key: u8) {
        self.0[(key & 0x0f) as usize] = false;
    }

    pub fn is_pressed(&self, key: u8) -> bool {
        self.0[(key & 0x0f) as usize]
    }

    /// lowest-numbered key held now that was not held in `before`
    pub fn first_pressed_since(&self, before: &Keypad) -> Option<u8> {
        self.0
            .iter()
            .zip(before.0.iter())
            .position(|(now, was)| *now && !*was)
            .map(|k| k as u8)
    }
}

/// which physical keys stand for the sixteen CHIP-8 keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Keymap {
    /// the 4x4 block at the left of a qwerty keyboard
    #[default]
    Conventional,
    /// the hex digits themselves
    Literal,
}

impl Keymap {
    fn table(self) -> [(char, u8); 16] {
        match self {
            Keymap::Conventional => CHIP8_CONVENTIONAL_KEYMAP,
            Keymap::Literal => CHIP8_LITERAL_KEYMAP,
        }
    }
}

/// map of characters read from the keyboard to what the chip8 might expect
/// where '1' => 0x01 and 'a' => 0x0a
const CHIP8_LITERAL_KEYMAP: [(char, u8); 16] = [
    ('0', 0x00),
    ('1', 0x01),
    ('2', 0x02),
    ('3', 0x03),
    ('4', 0x04),
    ('5', 0x05),
    ('6', 0x06),
    ('7', 0x07),
    ('8', 0x08),
    ('9', 0x09),
    ('a', 0x0a),
    ('b', 0x0b),
    ('c', 0x0c),
    ('d', 0x0d),
    ('e', 0x0e),
    ('f', 0x0f),
];

/// ditto using left-hand side of qwerty keyboard
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

/// terminals only report presses (and auto-repeat), never releases, so a key
/// counts as held for this many polls after its last event
const KEY_HOLD_POLLS: u8 = 6;

/// reads keypresses
pub trait Input {
    /// sample which keys are held right now
    fn poll_keys(&mut self) -> Result<Keypad, io::Error>;

    /// whether the user has asked to leave the emulator
    fn quit_requested(&self) -> bool;
}

/// Key state built from terminal key events: which CHIP-8 keys are still
/// latched and whether the user asked to quit. Knows nothing about the
/// terminal itself.
struct KeyLatch {
    held: [u8; KEY_COUNT],
    keymap: HashMap<char, u8>,
    quit: bool,
}

impl KeyLatch {
    fn new(keymap: Keymap) -> Self {
        KeyLatch {
            held: [0; KEY_COUNT],
            keymap: HashMap::from(keymap.table()),
            quit: false,
        }
    }

    fn on_key(&mut self, evt: KeyEvent) {
        match evt.code {
            // raw mode swallows SIGINT, so Ctrl-C arrives here
            KeyCode::Char('c') if evt.modifiers.contains(KeyModifiers::CONTROL) => self.quit = true,
            KeyCode::Char(key) => match self.keymap.get(&key.to_ascii_lowercase()) {
                Some(mapped_key) => self.held[*mapped_key as usize] = KEY_HOLD_POLLS,
                None => warn!("can't map {:?} to a CHIP-8 key", key),
            },
            KeyCode::Esc => self.quit = true,
            other => warn!("unmapped key event {:?}", other),
        }
    }

    /// age every latch by one poll
    fn decay(&mut self) {
        for hold in self.held.iter_mut() {
            *hold = hold.saturating_sub(1);
        }
    }

    fn keypad(&self) -> Keypad {
        let mut pad = Keypad::new();
        for (key, hold) in self.held.iter().enumerate() {
            if *hold > 0 {
                pad.press(key as u8);
            }
        }
        pad
    }
}

/// implementation of Input reading key events from the terminal
pub struct StdinInput {
    latch: KeyLatch,
}

impl StdinInput {
    pub fn new(keymap: Keymap) -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        Ok(StdinInput {
            latch: KeyLatch::new(keymap),
        })
    }

    fn read_stdin(&mut self) -> Result<(), io::Error> {
        while poll(Duration::from_millis(0))? {
            match read()? {
                Event::Key(evt) => self.latch.on_key(evt),
                Event::Resize(..) => (),
                _ => warn!("unknown event received"),
            }
        }
        Ok(())
    }
}

impl Drop for StdinInput {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            warn!("could not restore terminal: {}", e);
        }
    }
}

impl Input for StdinInput {
    fn poll_keys(&mut self) -> Result<Keypad, io::Error> {
        self.latch.decay();
        self.read_stdin()?;
        Ok(self.latch.keypad())
    }

    fn quit_requested(&self) -> bool {
        self.latch.quit
    }
}

/// dummy Input implementation for testing: replays a script of keypads, one
/// per poll, then asks to quit
pub struct DummyInput {
    script: Vec<Keypad>,
    polls: usize,
}

impl DummyInput {
    pub fn new(script: &[Keypad]) -> Self {
        DummyInput {
            script: Vec::from(script),
            polls: 0,
        }
    }
}

impl Input for DummyInput {
    fn poll_keys(&mut self) -> Result<Keypad, io::Error> {
        let pad = self.script.get(self.polls).copied().unwrap_or_default();
        self.polls += 1;
        Ok(pad)
    }

    fn quit_requested(&self) -> bool {
        self.polls > self.script.len()
    }
}
