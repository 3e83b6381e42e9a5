use crate::constants::{
    DISPLAY_HEIGHT, DISPLAY_WIDTH, KEY_COUNT, MAX_ROM_SIZE, MEMORY_SIZE, PROGRAM_START,
    REGISTER_COUNT, SPRITE_SHEET, STACK_SIZE,
};
use crate::error::{Chip8Error, Result};

/// The FrameBuffer is indexed as [y][x]; `true` is a lit pixel.
pub type FrameBuffer = [[bool; DISPLAY_WIDTH]; DISPLAY_HEIGHT];

/// Interpreter behaviors that differ between reference implementations.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Quirks {
    /// Fx55/Fx65 leave I pointing just past the last register transferred (COSMAC VIP).
    /// When unset I is left untouched (CHIP-48 and later).
    pub load_store_increments_i: bool,
}

impl Default for Quirks {
    fn default() -> Self {
        Quirks {
            load_store_increments_i: true,
        }
    }
}

/// The complete Chip-8 machine state
///
/// ## CPU
/// Registers
/// - (v) 16 primary 8-bit registers (V0..VF)
///     - the first 15 (V0..VE) are general purpose registers
///     - the 16th (VF) is the carry/borrow/collision flag
/// - (i) a 16-bit memory address register
///
/// Counter
/// - (pc) a 16-bit program counter pointing at the next instruction to fetch
///
/// Pointer
/// - (sp) the number of return addresses currently on the stack
///
/// Timers
/// - 2 8-bit timers (delay & sound), counted down by the driver at 60Hz
///
/// ## Memory
/// - 16 entry stack of return addresses
/// - 4096 bytes of addressable memory
///     - 0x000..0x050 holds the hex digit sprite sheet
///     - programs are loaded from 0x200
/// - 64x32 frame buffer
///
/// ## Input
/// - one pressed flag per key 0..F, written by the input adapter
#[derive(Clone)]
pub struct State {
    pub v: [u8; REGISTER_COUNT],
    pub i: u16,
    pub pc: u16,
    pub sp: u16,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub stack: [u16; STACK_SIZE],
    pub memory: [u8; MEMORY_SIZE],
    pub frame_buffer: FrameBuffer,
    pub draw_flag: bool,
    pub keys: [bool; KEY_COUNT],
    pub quirks: Quirks,
}

impl State {
    pub fn new() -> Self {
        Self::with_quirks(Quirks::default())
    }

    pub fn with_quirks(quirks: Quirks) -> Self {
        let mut memory = [0; MEMORY_SIZE];
        memory[..SPRITE_SHEET.len()].copy_from_slice(&SPRITE_SHEET);

        State {
            v: [0; REGISTER_COUNT],
            i: 0,
            pc: PROGRAM_START,
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            stack: [0; STACK_SIZE],
            memory,
            frame_buffer: [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
            draw_flag: false,
            keys: [false; KEY_COUNT],
            quirks,
        }
    }

    /// Copies a program image into memory starting at `PROGRAM_START`.
    pub fn load_program(&mut self, program: &[u8]) -> Result<()> {
        if program.len() > MAX_ROM_SIZE {
            return Err(Chip8Error::RomTooLarge {
                size: program.len(),
                capacity: MAX_ROM_SIZE,
            });
        }
        let start = PROGRAM_START as usize;
        self.memory[start..start + program.len()].copy_from_slice(program);
        Ok(())
    }

    /// Gets the opcode currently pointed at by the pc.
    ///
    /// Memory is stored as bytes, but opcodes are 16 bits so we combine two subsequent bytes.
    pub fn fetch(&self) -> Result<u16> {
        let word = self.read(self.pc, 2)?;
        Ok(u16::from(word[0]) << 8 | u16::from(word[1]))
    }

    /// Borrows `len` bytes of memory starting at `addr`.
    pub fn read(&self, addr: u16, len: usize) -> Result<&[u8]> {
        let range = Self::checked_range(addr, len)?;
        Ok(&self.memory[range])
    }

    /// Mutably borrows `len` bytes of memory starting at `addr`.
    pub fn write(&mut self, addr: u16, len: usize) -> Result<&mut [u8]> {
        let range = Self::checked_range(addr, len)?;
        Ok(&mut self.memory[range])
    }

    fn checked_range(addr: u16, len: usize) -> Result<std::ops::Range<usize>> {
        let start = addr as usize;
        match start.checked_add(len) {
            Some(end) if end <= MEMORY_SIZE => Ok(start..end),
            _ => Err(Chip8Error::MemoryOutOfBounds { addr: start, len }),
        }
    }

    pub fn register(&self, index: u8) -> u8 {
        self.v[index as usize]
    }

    pub fn set_register(&mut self, index: u8, value: u8) {
        self.v[index as usize] = value;
    }

    pub fn i(&self) -> u16 {
        self.i
    }

    pub fn set_i(&mut self, value: u16) {
        self.i = value;
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn set_pc(&mut self, value: u16) {
        self.pc = value;
    }

    /// STACK.push(addr)
    /// Fails without touching the stack once all `STACK_SIZE` entries are in use.
    pub fn push(&mut self, addr: u16) -> Result<()> {
        let sp = self.sp as usize;
        if sp >= STACK_SIZE {
            return Err(Chip8Error::StackOverflow { pc: self.pc });
        }
        self.stack[sp] = addr;
        self.sp += 1;
        Ok(())
    }

    /// STACK.pop()
    pub fn pop(&mut self) -> Result<u16> {
        if self.sp == 0 {
            return Err(Chip8Error::StackUnderflow { pc: self.pc });
        }
        self.sp -= 1;
        Ok(self.stack[self.sp as usize])
    }

    pub fn key(&self, key: u8) -> bool {
        self.keys[key as usize]
    }

    pub fn set_key(&mut self, key: u8, pressed: bool) {
        self.keys[key as usize] = pressed;
    }

    /// Reads a pixel; coordinates wrap around the edges of the display.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.frame_buffer[y % DISPLAY_HEIGHT][x % DISPLAY_WIDTH]
    }

    /// Writes a pixel; coordinates wrap around the edges of the display.
    pub fn set_pixel(&mut self, x: usize, y: usize, lit: bool) {
        self.frame_buffer[y % DISPLAY_HEIGHT][x % DISPLAY_WIDTH] = lit;
    }

    pub fn clear_screen(&mut self) {
        self.frame_buffer = [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT];
        self.draw_flag = true;
    }

    /// Counts both timers down by one, stopping at zero.
    pub fn tick_timers(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_loads_sprite_sheet() {
        let state = State::new();
        assert_eq!(state.memory[0x000..0x050], SPRITE_SHEET[..]);
        assert!(state.memory[0x050..].iter().all(|&b| b == 0));
        assert_eq!(state.pc, 0x200);
        assert_eq!(state.sp, 0);
    }

    #[test]
    fn test_load_program_at_program_start() {
        let mut state = State::new();
        state.load_program(&[0x12, 0x34, 0x56]).unwrap();
        assert_eq!(state.memory[0x200..0x203], [0x12, 0x34, 0x56]);
    }

    #[test]
    fn test_load_program_fills_memory() {
        let mut state = State::new();
        state.load_program(&[0xAB; MAX_ROM_SIZE]).unwrap();
        assert_eq!(state.memory[0xFFF], 0xAB);
    }

    #[test]
    fn test_load_program_rejects_oversized_rom() {
        let mut state = State::new();
        let result = state.load_program(&[0; MAX_ROM_SIZE + 1]);
        assert!(matches!(
            result,
            Err(Chip8Error::RomTooLarge { size, capacity }) if size == 3585 && capacity == 3584
        ));
        assert_eq!(state.memory[0x200], 0);
    }

    #[test]
    fn test_fetch_combines_bytes() {
        let mut state = State::new();
        state.memory[0x200..0x202].copy_from_slice(&[0xAA, 0xBB]);
        assert_eq!(state.fetch().unwrap(), 0xAABB);
    }

    #[test]
    fn test_fetch_past_end_of_memory() {
        let mut state = State::new();
        state.pc = 0xFFF;
        assert!(matches!(
            state.fetch(),
            Err(Chip8Error::MemoryOutOfBounds { addr: 0xFFF, len: 2 })
        ));
    }

    #[test]
    fn test_stack_is_lifo() {
        let mut state = State::new();
        state.push(0x111).unwrap();
        state.push(0x222).unwrap();
        assert_eq!(state.pop().unwrap(), 0x222);
        assert_eq!(state.pop().unwrap(), 0x111);
        assert_eq!(state.sp, 0);
    }

    #[test]
    fn test_stack_overflow() {
        let mut state = State::new();
        for addr in 0..STACK_SIZE as u16 {
            state.push(addr).unwrap();
        }
        assert!(matches!(
            state.push(0xABC),
            Err(Chip8Error::StackOverflow { .. })
        ));
        assert_eq!(state.sp, 16);
        assert_eq!(state.stack[15], 15);
    }

    #[test]
    fn test_stack_underflow() {
        let mut state = State::new();
        assert!(matches!(
            state.pop(),
            Err(Chip8Error::StackUnderflow { pc: 0x200 })
        ));
        assert_eq!(state.sp, 0);
    }

    #[test]
    fn test_pixels_wrap() {
        let mut state = State::new();
        state.set_pixel(64 + 3, 32 + 1, true);
        assert!(state.frame_buffer[1][3]);
        assert!(state.pixel(3, 1));
    }

    #[test]
    fn test_clear_screen() {
        let mut state = State::new();
        state.frame_buffer[5][7] = true;
        state.clear_screen();
        assert!(state.frame_buffer.iter().flatten().all(|&p| !p));
        assert!(state.draw_flag);
    }

    #[test]
    fn test_tick_timers_stops_at_zero() {
        let mut state = State::new();
        state.delay_timer = 2;
        state.sound_timer = 0;
        state.tick_timers();
        assert_eq!((state.delay_timer, state.sound_timer), (1, 0));
        state.tick_timers();
        state.tick_timers();
        assert_eq!((state.delay_timer, state.sound_timer), (0, 0));
    }

    #[test]
    fn test_read_rejects_wrapping_range() {
        let state = State::new();
        assert!(state.read(0xFFE, 2).is_ok());
        assert!(state.read(0xFFE, 3).is_err());
        assert!(state.read(0x1000, 1).is_err());
    }
}
