//! Decoding of the two-byte CHIP-8 instruction words.
//!
//! The top nibble picks the family. Families `0x0`, `0x8` and `0xE` are split
//! further on the low nibble and `0xF` on the low byte; the middle fields of
//! those families are operands and are never checked, which matches how the
//! historical dispatch tables behaved. Anything that does not land on a
//! defined operation becomes [`Instruction::Unknown`].

use crate::memory::CHIP8_PROGRAM_ADDR;
use std::fmt;

/// A register index, always 0x0-0xf because it comes from a nibble.
pub type Reg = usize;

/// One decoded instruction, with its operands pulled out of the word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    Cls,
    /// 00EE
    Ret,
    /// 1nnn
    Jp(u16),
    /// 2nnn
    Call(u16),
    /// 3xkk
    SeByte(Reg, u8),
    /// 4xkk
    SneByte(Reg, u8),
    /// 5xy0
    SeReg(Reg, Reg),
    /// 6xkk
    LdByte(Reg, u8),
    /// 7xkk
    AddByte(Reg, u8),
    /// 8xy0
    LdReg(Reg, Reg),
    /// 8xy1
    Or(Reg, Reg),
    /// 8xy2
    And(Reg, Reg),
    /// 8xy3
    Xor(Reg, Reg),
    /// 8xy4
    AddReg(Reg, Reg),
    /// 8xy5
    Sub(Reg, Reg),
    /// 8xy6
    Shr(Reg, Reg),
    /// 8xy7
    Subn(Reg, Reg),
    /// 8xyE
    Shl(Reg, Reg),
    /// 9xy0
    SneReg(Reg, Reg),
    /// Annn
    LdI(u16),
    /// Bnnn
    JpV0(u16),
    /// Cxkk
    Rnd(Reg, u8),
    /// Dxyn
    Drw(Reg, Reg, u8),
    /// Ex9E
    Skp(Reg),
    /// ExA1
    Sknp(Reg),
    /// Fx07
    LdRegDt(Reg),
    /// Fx0A
    LdKey(Reg),
    /// Fx15
    LdDtReg(Reg),
    /// Fx18
    LdStReg(Reg),
    /// Fx1E
    AddI(Reg),
    /// Fx29
    LdFont(Reg),
    /// Fx33
    LdBcd(Reg),
    /// Fx55
    StoreRegs(Reg),
    /// Fx65
    LoadRegs(Reg),
    /// anything else; executes as a no-op
    Unknown(u16),
}

#[inline(always)]
fn nnn(op: u16) -> u16 {
    op & 0x0fff
}

#[inline(always)]
fn kk(op: u16) -> u8 {
    (op & 0x00ff) as u8
}

#[inline(always)]
fn n(op: u16) -> u8 {
    (op & 0x000f) as u8
}

#[inline(always)]
fn x(op: u16) -> Reg {
    ((op & 0x0f00) >> 8) as Reg
}

#[inline(always)]
fn y(op: u16) -> Reg {
    ((op & 0x00f0) >> 4) as Reg
}

impl Instruction {
    /// classify a raw instruction word
    pub fn decode(op: u16) -> Instruction {
        use Instruction::*;
        match op >> 12 {
            0x0 => match n(op) {
                0x0 => Cls,
                0xe => Ret,
                _ => Unknown(op),
            },
            0x1 => Jp(nnn(op)),
            0x2 => Call(nnn(op)),
            0x3 => SeByte(x(op), kk(op)),
            0x4 => SneByte(x(op), kk(op)),
            0x5 => SeReg(x(op), y(op)),
            0x6 => LdByte(x(op), kk(op)),
            0x7 => AddByte(x(op), kk(op)),
            0x8 => match n(op) {
                0x0 => LdReg(x(op), y(op)),
                0x1 => Or(x(op), y(op)),
                0x2 => And(x(op), y(op)),
                0x3 => Xor(x(op), y(op)),
                0x4 => AddReg(x(op), y(op)),
                0x5 => Sub(x(op), y(op)),
                0x6 => Shr(x(op), y(op)),
                0x7 => Subn(x(op), y(op)),
                0xe => Shl(x(op), y(op)),
                _ => Unknown(op),
            },
            0x9 => SneReg(x(op), y(op)),
            0xa => LdI(nnn(op)),
            0xb => JpV0(nnn(op)),
            0xc => Rnd(x(op), kk(op)),
            0xd => Drw(x(op), y(op), n(op)),
            0xe => match n(op) {
                0xe => Skp(x(op)),
                0x1 => Sknp(x(op)),
                _ => Unknown(op),
            },
            _ => match kk(op) {
                0x07 => LdRegDt(x(op)),
                0x0a => LdKey(x(op)),
                0x15 => LdDtReg(x(op)),
                0x18 => LdStReg(x(op)),
                0x1e => AddI(x(op)),
                0x29 => LdFont(x(op)),
                0x33 => LdBcd(x(op)),
                0x55 => StoreRegs(x(op)),
                0x65 => LoadRegs(x(op)),
                _ => Unknown(op),
            },
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;
        match *self {
            Cls => write!(f, "CLS"),
            Ret => write!(f, "RET"),
            Jp(a) => write!(f, "JP {:#05x}", a),
            Call(a) => write!(f, "CALL {:#05x}", a),
            SeByte(x, k) => write!(f, "SE V{:X}, {:#04x}", x, k),
            SneByte(x, k) => write!(f, "SNE V{:X}, {:#04x}", x, k),
            SeReg(x, y) => write!(f, "SE V{:X}, V{:X}", x, y),
            LdByte(x, k) => write!(f, "LD V{:X}, {:#04x}", x, k),
            AddByte(x, k) => write!(f, "ADD V{:X}, {:#04x}", x, k),
            LdReg(x, y) => write!(f, "LD V{:X}, V{:X}", x, y),
            Or(x, y) => write!(f, "OR V{:X}, V{:X}", x, y),
            And(x, y) => write!(f, "AND V{:X}, V{:X}", x, y),
            Xor(x, y) => write!(f, "XOR V{:X}, V{:X}", x, y),
            AddReg(x, y) => write!(f, "ADD V{:X}, V{:X}", x, y),
            Sub(x, y) => write!(f, "SUB V{:X}, V{:X}", x, y),
            Shr(x, y) => write!(f, "SHR V{:X}, V{:X}", x, y),
            Subn(x, y) => write!(f, "SUBN V{:X}, V{:X}", x, y),
            Shl(x, y) => write!(f, "SHL V{:X}, V{:X}", x, y),
            SneReg(x, y) => write!(f, "SNE V{:X}, V{:X}", x, y),
            LdI(a) => write!(f, "LD I, {:#05x}", a),
            JpV0(a) => write!(f, "JP V0, {:#05x}", a),
            Rnd(x, k) => write!(f, "RND V{:X}, {:#04x}", x, k),
            Drw(x, y, n) => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            Skp(x) => write!(f, "SKP V{:X}", x),
            Sknp(x) => write!(f, "SKNP V{:X}", x),
            LdRegDt(x) => write!(f, "LD V{:X}, DT", x),
            LdKey(x) => write!(f, "LD V{:X}, K", x),
            LdDtReg(x) => write!(f, "LD DT, V{:X}", x),
            LdStReg(x) => write!(f, "LD ST, V{:X}", x),
            AddI(x) => write!(f, "ADD I, V{:X}", x),
            LdFont(x) => write!(f, "LD F, V{:X}", x),
            LdBcd(x) => write!(f, "LD B, V{:X}", x),
            StoreRegs(x) => write!(f, "LD [I], V{:X}", x),
            LoadRegs(x) => write!(f, "LD V{:X}, [I]", x),
            Unknown(op) => write!(f, "DW {:#06x}", op),
        }
    }
}

/// Walk a program image as it would sit in memory, yielding
/// `(address, raw word, instruction)`. A trailing odd byte is paired with 0.
pub fn disassemble(image: &[u8]) -> impl Iterator<Item = (u16, u16, Instruction)> + '_ {
    image.chunks(2).enumerate().map(|(i, pair)| {
        let raw = ((pair[0] as u16) << 8) | *pair.get(1).unwrap_or(&0) as u16;
        let addr = CHIP8_PROGRAM_ADDR.wrapping_add(2 * i as u16);
        (addr, raw, Instruction::decode(raw))
    })
}

#[cfg(test)]
mod tests {
    use super::Instruction::*;
    use super::*;

    #[test]
    fn test_opcode_translation() {
        let cases = [
            (0x00E0, Cls),
            (0x00EE, Ret),
            (0x1228, Jp(0x228)),
            (0x2456, Call(0x456)),
            (0x342A, SeByte(4, 0x2A)),
            (0x4A75, SneByte(0xA, 0x75)),
            (0x5AE0, SeReg(0xA, 0xE)),
            (0x63F5, LdByte(3, 0xF5)),
            (0x7B12, AddByte(0xB, 0x12)),
            (0x8590, LdReg(5, 9)),
            (0x8101, Or(1, 0)),
            (0x8642, And(6, 4)),
            (0x87F3, Xor(7, 0xF)),
            (0x8264, AddReg(2, 6)),
            (0x8C45, Sub(0xC, 4)),
            (0x8106, Shr(1, 0)),
            (0x86D7, Subn(6, 0xD)),
            (0x8E0E, Shl(0xE, 0)),
            (0x9990, SneReg(9, 9)),
            (0xA568, LdI(0x568)),
            (0xBABC, JpV0(0xABC)),
            (0xC5AF, Rnd(5, 0xAF)),
            (0xD7B0, Drw(7, 0xB, 0)),
            (0xE49E, Skp(4)),
            (0xECA1, Sknp(0xC)),
            (0xF907, LdRegDt(9)),
            (0xFD0A, LdKey(0xD)),
            (0xF315, LdDtReg(3)),
            (0xF718, LdStReg(7)),
            (0xF91E, AddI(9)),
            (0xFF29, LdFont(0xF)),
            (0xF533, LdBcd(5)),
            (0xF655, StoreRegs(6)),
            (0xF265, LoadRegs(2)),
        ];
        for (op, expected) in cases {
            assert_eq!(Instruction::decode(op), expected, "decoding {:#06x}", op);
        }
    }

    #[test]
    fn test_unknown_opcodes() {
        for op in [0x00E1, 0x0123, 0x8008, 0x800F, 0xE000, 0xE09F, 0xF000, 0xF0FF] {
            assert_eq!(Instruction::decode(op), Unknown(op), "decoding {:#06x}", op);
        }
    }

    #[test]
    fn test_secondary_dispatch_ignores_middle_nibbles() {
        // 0x0 and 0xE families only look at the low nibble
        assert_eq!(Instruction::decode(0x0120), Cls);
        assert_eq!(Instruction::decode(0x0FFE), Ret);
        assert_eq!(Instruction::decode(0xE30E), Skp(3));
        assert_eq!(Instruction::decode(0xE3F1), Sknp(3));
    }

    #[test]
    fn test_every_word_decodes() {
        // exhaustive; must never panic
        for op in 0..=u16::MAX {
            let _ = Instruction::decode(op);
        }
    }

    #[test]
    fn test_mnemonics() {
        assert_eq!(Instruction::decode(0x1228).to_string(), "JP 0x228");
        assert_eq!(Instruction::decode(0x6005).to_string(), "LD V0, 0x05");
        assert_eq!(Instruction::decode(0xD125).to_string(), "DRW V1, V2, 5");
        assert_eq!(Instruction::decode(0xFA55).to_string(), "LD [I], VA");
        assert_eq!(Instruction::decode(0xF0FF).to_string(), "DW 0xf0ff");
    }

    #[test]
    fn test_disassemble() {
        let listing: Vec<_> = disassemble(&[0x60, 0x05, 0x70, 0x0A, 0x12]).collect();
        assert_eq!(
            listing,
            vec![
                (0x200, 0x6005, LdByte(0, 0x05)),
                (0x202, 0x700A, AddByte(0, 0x0A)),
                (0x204, 0x1200, Jp(0x200)),
            ]
        );
    }
}
