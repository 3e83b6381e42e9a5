use std::fmt;

use crate::error::Result;
use crate::opcode::Opcode;
use crate::operations;
use crate::state::State;

/// # Instructions
/// One variant per Chip-8 operation, with its operands already pulled out of the opcode.
///
/// Words that don't encode a known operation decode to `Unknown` rather than failing so that
/// programs relying on falling through unsupported opcodes keep running.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// `00E0`
    Cls,
    /// `00EE`
    Ret,
    /// `1nnn`
    Jump(u16),
    /// `2nnn`
    Call(u16),
    /// `3xkk`
    SkipEqByte { x: u8, kk: u8 },
    /// `4xkk`
    SkipNeByte { x: u8, kk: u8 },
    /// `5xy0`
    SkipEqReg { x: u8, y: u8 },
    /// `6xkk`
    LoadByte { x: u8, kk: u8 },
    /// `7xkk`
    AddByte { x: u8, kk: u8 },
    /// `8xy0`
    LoadReg { x: u8, y: u8 },
    /// `8xy1`
    Or { x: u8, y: u8 },
    /// `8xy2`
    And { x: u8, y: u8 },
    /// `8xy3`
    Xor { x: u8, y: u8 },
    /// `8xy4`
    AddReg { x: u8, y: u8 },
    /// `8xy5`
    Sub { x: u8, y: u8 },
    /// `8xy6`
    Shr { x: u8 },
    /// `8xy7`
    SubN { x: u8, y: u8 },
    /// `8xyE`
    Shl { x: u8 },
    /// `9xy0`
    SkipNeReg { x: u8, y: u8 },
    /// `Annn`
    LoadI(u16),
    /// `Bnnn`
    JumpV0(u16),
    /// `Cxkk`
    Random { x: u8, kk: u8 },
    /// `Dxyn`
    Draw { x: u8, y: u8, n: u8 },
    /// `Ex9E`
    SkipKeyPressed { x: u8 },
    /// `ExA1`
    SkipKeyNotPressed { x: u8 },
    /// `Fx07`
    LoadDelay { x: u8 },
    /// `Fx0A`
    WaitKey { x: u8 },
    /// `Fx15`
    SetDelay { x: u8 },
    /// `Fx18`
    SetSound { x: u8 },
    /// `Fx1E`
    AddI { x: u8 },
    /// `Fx29`
    LoadSprite { x: u8 },
    /// `Fx33`
    StoreBcd { x: u8 },
    /// `Fx55`
    StoreRegisters { x: u8 },
    /// `Fx65`
    LoadRegisters { x: u8 },
    Unknown(u16),
}

impl Instruction {
    /// Selects the Instruction for an opcode.
    ///
    /// The category nibble picks the operation; categories 0x0, 0xE and 0xF are further split on
    /// the low byte and 0x8 on the low nibble.
    pub fn decode(op: u16) -> Self {
        let (x, y, n, kk, addr) = (op.x(), op.y(), op.n(), op.kk(), op.addr());
        match op.category() {
            0x0 => match kk {
                0xE0 => Instruction::Cls,
                0xEE => Instruction::Ret,
                _ => Instruction::Unknown(op),
            },
            0x1 => Instruction::Jump(addr),
            0x2 => Instruction::Call(addr),
            0x3 => Instruction::SkipEqByte { x, kk },
            0x4 => Instruction::SkipNeByte { x, kk },
            0x5 => Instruction::SkipEqReg { x, y },
            0x6 => Instruction::LoadByte { x, kk },
            0x7 => Instruction::AddByte { x, kk },
            0x8 => match n {
                0x0 => Instruction::LoadReg { x, y },
                0x1 => Instruction::Or { x, y },
                0x2 => Instruction::And { x, y },
                0x3 => Instruction::Xor { x, y },
                0x4 => Instruction::AddReg { x, y },
                0x5 => Instruction::Sub { x, y },
                0x6 => Instruction::Shr { x },
                0x7 => Instruction::SubN { x, y },
                0xE => Instruction::Shl { x },
                _ => Instruction::Unknown(op),
            },
            0x9 => Instruction::SkipNeReg { x, y },
            0xA => Instruction::LoadI(addr),
            0xB => Instruction::JumpV0(addr),
            0xC => Instruction::Random { x, kk },
            0xD => Instruction::Draw { x, y, n },
            0xE => match kk {
                0x9E => Instruction::SkipKeyPressed { x },
                0xA1 => Instruction::SkipKeyNotPressed { x },
                _ => Instruction::Unknown(op),
            },
            0xF => match kk {
                0x07 => Instruction::LoadDelay { x },
                0x0A => Instruction::WaitKey { x },
                0x15 => Instruction::SetDelay { x },
                0x18 => Instruction::SetSound { x },
                0x1E => Instruction::AddI { x },
                0x29 => Instruction::LoadSprite { x },
                0x33 => Instruction::StoreBcd { x },
                0x55 => Instruction::StoreRegisters { x },
                0x65 => Instruction::LoadRegisters { x },
                _ => Instruction::Unknown(op),
            },
            _ => Instruction::Unknown(op),
        }
    }

    /// Applies the Instruction to `state` and moves the program counter on.
    ///
    /// The program counter policy lives here rather than in each operation:
    /// - jumps, calls and returns set it outright
    /// - skips advance two words when their condition holds
    /// - waiting for a key leaves it in place
    /// - everything else advances one word
    ///
    /// On error the state is left as it was before the call.
    pub fn execute(&self, state: &mut State) -> Result<()> {
        use operations::*;

        let flow = match *self {
            Instruction::Cls => cls(state),
            Instruction::Ret => ret(state)?,
            Instruction::Jump(addr) => jump(addr),
            Instruction::Call(addr) => call(state, addr)?,
            Instruction::SkipEqByte { x, kk } => se_byte(state, x, kk),
            Instruction::SkipNeByte { x, kk } => sne_byte(state, x, kk),
            Instruction::SkipEqReg { x, y } => se_reg(state, x, y),
            Instruction::LoadByte { x, kk } => ld_byte(state, x, kk),
            Instruction::AddByte { x, kk } => add_byte(state, x, kk),
            Instruction::LoadReg { x, y } => ld_reg(state, x, y),
            Instruction::Or { x, y } => or(state, x, y),
            Instruction::And { x, y } => and(state, x, y),
            Instruction::Xor { x, y } => xor(state, x, y),
            Instruction::AddReg { x, y } => add_reg(state, x, y),
            Instruction::Sub { x, y } => sub(state, x, y),
            Instruction::Shr { x } => shr(state, x),
            Instruction::SubN { x, y } => subn(state, x, y),
            Instruction::Shl { x } => shl(state, x),
            Instruction::SkipNeReg { x, y } => sne_reg(state, x, y),
            Instruction::LoadI(addr) => ld_i(state, addr),
            Instruction::JumpV0(addr) => jump_v0(state, addr),
            Instruction::Random { x, kk } => rnd(state, x, kk),
            Instruction::Draw { x, y, n } => drw(state, x, y, n)?,
            Instruction::SkipKeyPressed { x } => skp(state, x),
            Instruction::SkipKeyNotPressed { x } => sknp(state, x),
            Instruction::LoadDelay { x } => ld_vx_dt(state, x),
            Instruction::WaitKey { x } => ld_vx_k(state, x),
            Instruction::SetDelay { x } => ld_dt_vx(state, x),
            Instruction::SetSound { x } => ld_st_vx(state, x),
            Instruction::AddI { x } => add_i(state, x)?,
            Instruction::LoadSprite { x } => ld_f(state, x),
            Instruction::StoreBcd { x } => ld_b(state, x)?,
            Instruction::StoreRegisters { x } => ld_i_vx(state, x)?,
            Instruction::LoadRegisters { x } => ld_vx_i(state, x)?,
            Instruction::Unknown(op) => {
                log::warn!("skipping unknown opcode {:04X} at {:#05X}", op, state.pc);
                Flow::Next
            }
        };

        state.pc = match flow {
            Flow::Next => state.pc.wrapping_add(2),
            Flow::Skip => state.pc.wrapping_add(4),
            Flow::Jump(addr) => addr,
            Flow::Wait => state.pc,
        };
        Ok(())
    }
}

impl From<u16> for Instruction {
    fn from(op: u16) -> Self {
        Instruction::decode(op)
    }
}

/// Assembler mnemonics in the conventional Chip-8 syntax.
impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Instruction::Cls => write!(f, "CLS"),
            Instruction::Ret => write!(f, "RET"),
            Instruction::Jump(addr) => write!(f, "JP {:#05X}", addr),
            Instruction::Call(addr) => write!(f, "CALL {:#05X}", addr),
            Instruction::SkipEqByte { x, kk } => write!(f, "SE V{:X}, {:#04X}", x, kk),
            Instruction::SkipNeByte { x, kk } => write!(f, "SNE V{:X}, {:#04X}", x, kk),
            Instruction::SkipEqReg { x, y } => write!(f, "SE V{:X}, V{:X}", x, y),
            Instruction::LoadByte { x, kk } => write!(f, "LD V{:X}, {:#04X}", x, kk),
            Instruction::AddByte { x, kk } => write!(f, "ADD V{:X}, {:#04X}", x, kk),
            Instruction::LoadReg { x, y } => write!(f, "LD V{:X}, V{:X}", x, y),
            Instruction::Or { x, y } => write!(f, "OR V{:X}, V{:X}", x, y),
            Instruction::And { x, y } => write!(f, "AND V{:X}, V{:X}", x, y),
            Instruction::Xor { x, y } => write!(f, "XOR V{:X}, V{:X}", x, y),
            Instruction::AddReg { x, y } => write!(f, "ADD V{:X}, V{:X}", x, y),
            Instruction::Sub { x, y } => write!(f, "SUB V{:X}, V{:X}", x, y),
            Instruction::Shr { x } => write!(f, "SHR V{:X}", x),
            Instruction::SubN { x, y } => write!(f, "SUBN V{:X}, V{:X}", x, y),
            Instruction::Shl { x } => write!(f, "SHL V{:X}", x),
            Instruction::SkipNeReg { x, y } => write!(f, "SNE V{:X}, V{:X}", x, y),
            Instruction::LoadI(addr) => write!(f, "LD I, {:#05X}", addr),
            Instruction::JumpV0(addr) => write!(f, "JP V0, {:#05X}", addr),
            Instruction::Random { x, kk } => write!(f, "RND V{:X}, {:#04X}", x, kk),
            Instruction::Draw { x, y, n } => write!(f, "DRW V{:X}, V{:X}, {}", x, y, n),
            Instruction::SkipKeyPressed { x } => write!(f, "SKP V{:X}", x),
            Instruction::SkipKeyNotPressed { x } => write!(f, "SKNP V{:X}", x),
            Instruction::LoadDelay { x } => write!(f, "LD V{:X}, DT", x),
            Instruction::WaitKey { x } => write!(f, "LD V{:X}, K", x),
            Instruction::SetDelay { x } => write!(f, "LD DT, V{:X}", x),
            Instruction::SetSound { x } => write!(f, "LD ST, V{:X}", x),
            Instruction::AddI { x } => write!(f, "ADD I, V{:X}", x),
            Instruction::LoadSprite { x } => write!(f, "LD F, V{:X}", x),
            Instruction::StoreBcd { x } => write!(f, "LD B, V{:X}", x),
            Instruction::StoreRegisters { x } => write!(f, "LD [I], V{:X}", x),
            Instruction::LoadRegisters { x } => write!(f, "LD V{:X}, [I]", x),
            Instruction::Unknown(op) => write!(f, "DW {:#06X}", op),
        }
    }
}

/// Decodes a program image word by word, pairing each instruction with its address.
///
/// A trailing odd byte is treated as the high byte of a final word.
pub fn disassemble(program: &[u8], base: u16) -> Vec<(u16, u16, Instruction)> {
    program
        .chunks(2)
        .enumerate()
        .map(|(index, word)| {
            let op = u16::from(word[0]) << 8 | u16::from(word.get(1).copied().unwrap_or(0));
            let addr = base.wrapping_add(2 * index as u16);
            (addr, op, op.to_instruction())
        })
        .collect()
}
