pub use chip8::{read_rom, Chip8};
pub use error::{Chip8Error, Result};
pub use instruction::{disassemble, Instruction};
pub use opcode::Opcode;
pub use operations::Flow;
pub use state::{FrameBuffer, Quirks, State};

mod chip8;
pub mod constants;
mod error;
mod instruction;
mod opcode;
mod operations;
pub mod state;
