use crate::constants::{FLAG_REGISTER, SPRITE_BYTES};
use crate::error::{Chip8Error, Result};
use crate::state::State;

/// How the program counter moves once an operation has been applied.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Advance to the next instruction word.
    Next,
    /// Advance past the next instruction word.
    Skip,
    /// Continue at an absolute address.
    Jump(u16),
    /// Stay on the current instruction so it is executed again next cycle.
    Wait,
}

fn skip_if(condition: bool) -> Flow {
    if condition {
        Flow::Skip
    } else {
        Flow::Next
    }
}

/// clear
pub fn cls(state: &mut State) -> Flow {
    state.clear_screen();
    Flow::Next
}

/// PC = STACK.pop()
/// Resumes after the call that pushed the return address.
pub fn ret(state: &mut State) -> Result<Flow> {
    let addr = state.pop()?;
    Ok(Flow::Jump(addr.wrapping_add(2)))
}

/// PC = addr
pub fn jump(addr: u16) -> Flow {
    Flow::Jump(addr)
}

/// STACK.push(PC); PC = addr
pub fn call(state: &mut State, addr: u16) -> Result<Flow> {
    state.push(state.pc)?;
    Ok(Flow::Jump(addr))
}

/// if Vx == kk then skip
pub fn se_byte(state: &State, x: u8, kk: u8) -> Flow {
    skip_if(state.register(x) == kk)
}

/// if Vx != kk then skip
pub fn sne_byte(state: &State, x: u8, kk: u8) -> Flow {
    skip_if(state.register(x) != kk)
}

/// if Vx == Vy then skip
pub fn se_reg(state: &State, x: u8, y: u8) -> Flow {
    skip_if(state.register(x) == state.register(y))
}

/// if Vx != Vy then skip
pub fn sne_reg(state: &State, x: u8, y: u8) -> Flow {
    skip_if(state.register(x) != state.register(y))
}

/// Vx = kk
pub fn ld_byte(state: &mut State, x: u8, kk: u8) -> Flow {
    state.set_register(x, kk);
    Flow::Next
}

/// Vx += kk
/// Overflow wraps and VF is left alone
pub fn add_byte(state: &mut State, x: u8, kk: u8) -> Flow {
    let res = state.register(x).wrapping_add(kk);
    state.set_register(x, res);
    Flow::Next
}

/// Vx = Vy
pub fn ld_reg(state: &mut State, x: u8, y: u8) -> Flow {
    state.set_register(x, state.register(y));
    Flow::Next
}

/// Vx |= Vy
pub fn or(state: &mut State, x: u8, y: u8) -> Flow {
    state.set_register(x, state.register(x) | state.register(y));
    Flow::Next
}

/// Vx &= Vy
pub fn and(state: &mut State, x: u8, y: u8) -> Flow {
    state.set_register(x, state.register(x) & state.register(y));
    Flow::Next
}

/// Vx ^= Vy
pub fn xor(state: &mut State, x: u8, y: u8) -> Flow {
    state.set_register(x, state.register(x) ^ state.register(y));
    Flow::Next
}

/// Vx += Vy; VF = carry
pub fn add_reg(state: &mut State, x: u8, y: u8) -> Flow {
    let (res, carry) = state.register(x).overflowing_add(state.register(y));
    set_with_flag(state, x, res, carry)
}

/// Vx -= Vy; VF = !borrow
pub fn sub(state: &mut State, x: u8, y: u8) -> Flow {
    let (vx, vy) = (state.register(x), state.register(y));
    set_with_flag(state, x, vx.wrapping_sub(vy), vx >= vy)
}

/// Vx >>= 1; VF = bit shifted out
pub fn shr(state: &mut State, x: u8) -> Flow {
    let vx = state.register(x);
    set_with_flag(state, x, vx >> 1, vx & 0x01 != 0)
}

/// Vx = Vy - Vx; VF = !borrow
pub fn subn(state: &mut State, x: u8, y: u8) -> Flow {
    let (vx, vy) = (state.register(x), state.register(y));
    set_with_flag(state, x, vy.wrapping_sub(vx), vy >= vx)
}

/// Vx <<= 1; VF = bit shifted out
pub fn shl(state: &mut State, x: u8) -> Flow {
    let vx = state.register(x);
    set_with_flag(state, x, vx << 1, vx & 0x80 != 0)
}

// VF is written last so the flag wins when x is F.
fn set_with_flag(state: &mut State, x: u8, value: u8, flag: bool) -> Flow {
    state.set_register(x, value);
    state.v[FLAG_REGISTER] = u8::from(flag);
    Flow::Next
}

/// I = addr
pub fn ld_i(state: &mut State, addr: u16) -> Flow {
    state.set_i(addr);
    Flow::Next
}

/// PC = V0 + addr
pub fn jump_v0(state: &State, addr: u16) -> Flow {
    Flow::Jump(addr + u16::from(state.register(0x0)))
}

/// Vx = rand_byte & kk
pub fn rnd(state: &mut State, x: u8, kk: u8) -> Flow {
    let rand_byte: u8 = rand::random();
    state.set_register(x, rand_byte & kk);
    Flow::Next
}

/// draw_sprite(x=Vx y=Vy size=n)
/// XORs a sprite from memory I..I+n at position x, y on the FrameBuffer with wrapping.
/// Sets VF if any lit pixel is turned off
pub fn drw(state: &mut State, x: u8, y: u8, n: u8) -> Result<Flow> {
    let mut sprite = [0u8; 0xF];
    let height = n as usize;
    sprite[..height].copy_from_slice(state.read(state.i, height)?);

    // Coordinates are latched before VF is reset in case either names it
    let origin_x = state.register(x) as usize;
    let origin_y = state.register(y) as usize;
    state.v[FLAG_REGISTER] = 0x0;

    let mut collision = false;
    for (row, byte) in sprite[..height].iter().enumerate() {
        for bit in 0..8 {
            if byte & (0x80 >> bit) == 0 {
                continue;
            }
            let (px, py) = (origin_x + bit, origin_y + row);
            let lit = state.pixel(px, py);
            collision |= lit;
            state.set_pixel(px, py, !lit);
        }
    }

    state.v[FLAG_REGISTER] = u8::from(collision);
    state.draw_flag = true;
    Ok(Flow::Next)
}

// Only the low nibble of Vx names a key.
fn key_for(state: &State, x: u8) -> u8 {
    state.register(x) & 0x0F
}

/// if Vx.pressed then skip
pub fn skp(state: &State, x: u8) -> Flow {
    skip_if(state.key(key_for(state, x)))
}

/// if !Vx.pressed then skip
pub fn sknp(state: &State, x: u8) -> Flow {
    skip_if(!state.key(key_for(state, x)))
}

/// Vx = DT
pub fn ld_vx_dt(state: &mut State, x: u8) -> Flow {
    state.set_register(x, state.delay_timer);
    Flow::Next
}

/// await keypress for Vx
/// Takes the lowest pressed key, consuming its press, or stays put until one arrives
pub fn ld_vx_k(state: &mut State, x: u8) -> Flow {
    match state.keys.iter().position(|&pressed| pressed) {
        Some(key) => {
            state.keys[key] = false;
            state.set_register(x, key as u8);
            Flow::Next
        }
        None => {
            log::debug!("V{:X} waiting for a key press at {:#05X}", x, state.pc);
            Flow::Wait
        }
    }
}

/// DT = Vx
pub fn ld_dt_vx(state: &mut State, x: u8) -> Flow {
    state.delay_timer = state.register(x);
    Flow::Next
}

/// ST = Vx
pub fn ld_st_vx(state: &mut State, x: u8) -> Flow {
    state.sound_timer = state.register(x);
    Flow::Next
}

/// I += Vx
/// Fails rather than wrapping I back around to low memory
pub fn add_i(state: &mut State, x: u8) -> Result<Flow> {
    let vx = u16::from(state.register(x));
    let i = state.i.checked_add(vx).ok_or(Chip8Error::MemoryOutOfBounds {
        addr: state.i as usize + vx as usize,
        len: 1,
    })?;
    state.set_i(i);
    Ok(Flow::Next)
}

/// I = Vx * 5
/// Set I to the memory address of the sprite for Vx
/// See constants::SPRITE_SHEET for more details
pub fn ld_f(state: &mut State, x: u8) -> Flow {
    state.set_i(u16::from(state.register(x)) * SPRITE_BYTES);
    Flow::Next
}

/// mem[I..I+3] = bcd(Vx)
pub fn ld_b(state: &mut State, x: u8) -> Result<Flow> {
    let vx = state.register(x);
    let bcd = [vx / 100, vx / 10 % 10, vx % 10];
    state.write(state.i, bcd.len())?.copy_from_slice(&bcd);
    Ok(Flow::Next)
}

/// mem[I..=I+x] = V0..=Vx
pub fn ld_i_vx(state: &mut State, x: u8) -> Result<Flow> {
    let count = x as usize + 1;
    let registers = state.v;
    state
        .write(state.i, count)?
        .copy_from_slice(&registers[..count]);
    advance_i_after_transfer(state, count);
    Ok(Flow::Next)
}

/// V0..=Vx = mem[I..=I+x]
pub fn ld_vx_i(state: &mut State, x: u8) -> Result<Flow> {
    let count = x as usize + 1;
    let mut registers = [0u8; 16];
    registers[..count].copy_from_slice(state.read(state.i, count)?);
    state.v[..count].copy_from_slice(&registers[..count]);
    advance_i_after_transfer(state, count);
    Ok(Flow::Next)
}

fn advance_i_after_transfer(state: &mut State, count: usize) {
    if state.quirks.load_store_increments_i {
        state.set_i(state.i + count as u16);
    }
}
