use std::io;
use thiserror::Error;

/// Everything that can go wrong inside the virtual machine.
///
/// Unknown instructions are deliberately absent: they decode to a no-op.
#[derive(Debug, Error)]
pub enum Chip8Error {
    /// the program image does not fit between 0x200 and the top of RAM
    #[error("program is {len} bytes but at most {max} bytes fit above 0x200")]
    ProgramTooLarge { len: usize, max: usize },

    /// the program source could not be read
    #[error("failed to read program: {0}")]
    Io(#[from] io::Error),

    /// CALL with all sixteen stack slots in use
    #[error("call stack overflow at {pc:#05x}")]
    StackOverflow { pc: u16 },

    /// RET with nothing on the stack
    #[error("return with an empty call stack at {pc:#05x}")]
    StackUnderflow { pc: u16 },
}

impl PartialEq for Chip8Error {
    // io::Error has no PartialEq, so compare those by kind
    fn eq(&self, other: &Self) -> bool {
        use Chip8Error::*;
        match (self, other) {
            (ProgramTooLarge { len: a, max: b }, ProgramTooLarge { len: c, max: d }) => {
                a == c && b == d
            }
            (Io(a), Io(b)) => a.kind() == b.kind(),
            (StackOverflow { pc: a }, StackOverflow { pc: b }) => a == b,
            (StackUnderflow { pc: a }, StackUnderflow { pc: b }) => a == b,
            _ => false,
        }
    }
}
