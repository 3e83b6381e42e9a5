use thiserror::Error;

pub type Result<T> = std::result::Result<T, Chip8Error>;

/// Faults raised while loading or executing a program.
///
/// None of these are fatal to the core; the driver decides whether to halt or carry on.
#[derive(Debug, Error)]
pub enum Chip8Error {
    #[error("stack overflow calling from {pc:#05X}")]
    StackOverflow { pc: u16 },
    #[error("stack underflow returning from {pc:#05X}")]
    StackUnderflow { pc: u16 },
    #[error("memory access of {len} byte(s) at {addr:#05X} is out of bounds")]
    MemoryOutOfBounds { addr: usize, len: usize },
    #[error("ROM of {size} bytes exceeds the {capacity} bytes available")]
    RomTooLarge { size: usize, capacity: usize },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
