use crate::error::Chip8Error;
use log::info;
use std::io;

// NB. addresses are u16 as per the chip-8; lengths are usize to stop endless casting

/// how much RAM we have
pub const CHIP8_RAM_SIZE_BYTES: usize = 4096;

/// where the program is loaded
pub const CHIP8_PROGRAM_ADDR: u16 = 0x0200;

/// the largest program image that fits between 0x200 and 0xfff
pub const CHIP8_MAX_PROGRAM_BYTES: usize = CHIP8_RAM_SIZE_BYTES - CHIP8_PROGRAM_ADDR as usize;

/// where the hex digit glyphs live
pub const CHIP8_FONT_ADDR: u16 = 0x000;

/// each glyph is five rows of one byte
pub const CHIP8_FONT_GLYPH_BYTES: u16 = 5;

const ADDR_MASK: u16 = (CHIP8_RAM_SIZE_BYTES - 1) as u16;

/// Represents the memory map. Every access goes through an address that is
/// wrapped into the 4K space, so no instruction can reach outside it.
pub trait MemoryMap {
    /// read one byte
    fn read_byte(&self, addr: u16) -> u8 {
        self.get_ro_slice()[(addr & ADDR_MASK) as usize]
    }

    /// write one byte
    fn write_byte(&mut self, addr: u16, val: u8) {
        self.get_rw_slice()[(addr & ADDR_MASK) as usize] = val;
    }

    /// get a big-endian two-byte word (instruction fetch)
    fn get_word(&self, addr: u16) -> u16 {
        ((self.read_byte(addr) as u16) << 8) | self.read_byte(addr.wrapping_add(1)) as u16
    }

    /// write a chunk of bytes, wrapping at the top of RAM
    fn write(&mut self, data: &[u8], addr: u16) {
        for (offset, byte) in data.iter().enumerate() {
            self.write_byte(addr.wrapping_add(offset as u16), *byte);
        }
    }

    /// get a r/w view of the whole of RAM
    fn get_rw_slice(&mut self) -> &mut [u8];

    /// get a r/o view of the whole of RAM
    fn get_ro_slice(&self) -> &[u8];
}

/// The CHIP-8 memory map:
///   0x0000-0x004f  font
///   0x0050-0x01ff  unused (historically the interpreter)
///   0x0200-0x0fff  program and data
pub struct Chip8MemoryMap {
    bytes: Box<[u8; CHIP8_RAM_SIZE_BYTES]>,
}

impl MemoryMap for Chip8MemoryMap {
    fn get_rw_slice(&mut self) -> &mut [u8] {
        &mut self.bytes[..]
    }
    fn get_ro_slice(&self) -> &[u8] {
        &self.bytes[..]
    }
}

impl Chip8MemoryMap {
    /// zeroed RAM with the font baked in
    pub fn new() -> Self {
        let mut mm = Chip8MemoryMap {
            bytes: Box::new([0u8; CHIP8_RAM_SIZE_BYTES]),
        };
        mm.write(&CHIP8_FONT, CHIP8_FONT_ADDR);
        mm
    }

    /// copy a program image to 0x200. Nothing is written unless the whole
    /// image fits.
    pub fn load(&mut self, image: &[u8]) -> Result<(), Chip8Error> {
        if image.len() > CHIP8_MAX_PROGRAM_BYTES {
            return Err(Chip8Error::ProgramTooLarge {
                len: image.len(),
                max: CHIP8_MAX_PROGRAM_BYTES,
            });
        }
        let start = CHIP8_PROGRAM_ADDR as usize;
        self.bytes[start..start + image.len()].copy_from_slice(image);
        info!("loaded {} byte program at {:#05x}", image.len(), start);
        Ok(())
    }

    /// read a whole program from somewhere, then load it at 0x200
    pub fn load_program(&mut self, reader: &mut impl io::Read) -> Result<usize, Chip8Error> {
        let mut buf = Vec::new();
        let len = reader.read_to_end(&mut buf)?;
        self.load(&buf)?;
        Ok(len)
    }

    /// address of the glyph for a hex digit; only the low nibble counts
    pub fn font_addr(digit: u8) -> u16 {
        CHIP8_FONT_ADDR + (digit & 0x0f) as u16 * CHIP8_FONT_GLYPH_BYTES
    }
}

impl Default for Chip8MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

#[rustfmt::skip]
const CHIP8_FONT: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];
