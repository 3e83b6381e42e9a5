use std::io::Read;

use crate::constants::{DEFAULT_CLOCK_HZ, MAX_ROM_SIZE, TIMER_HZ};
use crate::error::{Chip8Error, Result};
use crate::instruction::Instruction;
use crate::opcode::Opcode;
use crate::state::{FrameBuffer, Quirks, State};

/// # Chip-8
/// Chip-8 is a virtual machine and corresponding interpreted language.
///
/// Tracks:
///  - current `state`
///  - how many CPU cycles remain until the timers next count down
///
/// Supplies interfaces for:
/// - loading roms
/// - pressing and releasing keys
/// - advancing the CPU
/// - advancing its timers
/// - inspecting its frame buffer for rendering by some display
pub struct Chip8 {
    state: State,
    cycles_per_timer_tick: u32,
    timer_countdown: u32,
}

impl Chip8 {
    pub fn new(quirks: Quirks) -> Self {
        Self::with_clock(quirks, DEFAULT_CLOCK_HZ)
    }

    /// Creates a Chip-8 whose CPU is stepped `clock_hz` times a second.
    ///
    /// The timers run at a fixed 60Hz, approximated as once every `clock_hz / 60` steps.
    pub fn with_clock(quirks: Quirks, clock_hz: u32) -> Self {
        let cycles_per_timer_tick = (clock_hz / TIMER_HZ).max(1);
        Chip8 {
            state: State::with_quirks(quirks),
            cycles_per_timer_tick,
            timer_countdown: cycles_per_timer_tick,
        }
    }

    /// Load a rom from a source file
    ///
    /// # Arguments
    /// * `reader` a file reader that contains a ROM
    pub fn load_rom(&mut self, reader: &mut dyn Read) -> Result<usize> {
        let rom = read_rom(reader)?;
        self.state.load_program(&rom)?;
        log::debug!("loaded {} byte ROM", rom.len());
        Ok(rom.len())
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    /// Returns the FrameBuffer if it has changed since it was last taken
    pub fn take_frame(&mut self) -> Option<FrameBuffer> {
        if self.state.draw_flag {
            self.state.draw_flag = false;
            Some(self.state.frame_buffer)
        } else {
            None
        }
    }

    /// Whether the buzzer should currently be sounding.
    pub fn sound_active(&self) -> bool {
        self.state.sound_timer > 0
    }

    /// Set the pressed status of key
    ///
    /// # Arguments
    /// * `key` the 4-bit representation of the key that was pressed
    pub fn key_press(&mut self, key: u8) {
        self.state.set_key(key & 0x0F, true);
    }

    /// Unset the pressed status of key
    ///
    /// # Arguments
    /// * `key` the 4-bit representation of the key that was released
    pub fn key_release(&mut self, key: u8) {
        self.state.set_key(key & 0x0F, false);
    }

    /// Advances the CPU by a single cycle
    /// - gets and decodes the opcode at the pc
    /// - executes it, which also moves the pc on
    ///
    /// An instruction waiting on a key press is simply executed again on the next cycle.
    pub fn step(&mut self) -> Result<Instruction> {
        let op = self.state.fetch()?;
        let instruction = op.to_instruction();
        log::trace!(
            "{:#05X}: {:04X} {:<16} v{:02X?} i{:04X} sp{}",
            self.state.pc,
            op,
            instruction.to_string(),
            self.state.v,
            self.state.i,
            self.state.sp
        );
        instruction.execute(&mut self.state)?;
        Ok(instruction)
    }

    /// Steps over the word at the pc without executing it.
    ///
    /// Lets a driver carry on past an instruction that faulted.
    pub fn skip_instruction(&mut self) {
        self.state.pc = self.state.pc.wrapping_add(2);
    }

    /// Handles timer countdown
    /// - decrements the cycle countdown
    /// - ticks both timers when it hits 0 and resets it to `cycles_per_timer_tick`
    pub fn advance_timers(&mut self) {
        self.timer_countdown -= 1;
        if self.timer_countdown == 0 {
            self.timer_countdown = self.cycles_per_timer_tick;
            self.state.tick_timers();
        }
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new(Quirks::default())
    }
}

impl From<State> for Chip8 {
    fn from(state: State) -> Self {
        let mut chip8 = Chip8::new(state.quirks);
        chip8.state = state;
        chip8
    }
}

/// Reads a whole ROM image, rejecting any that can't fit in program memory.
pub fn read_rom(reader: &mut dyn Read) -> Result<Vec<u8>> {
    let mut rom = Vec::new();
    reader.read_to_end(&mut rom)?;
    if rom.len() > MAX_ROM_SIZE {
        return Err(Chip8Error::RomTooLarge {
            size: rom.len(),
            capacity: MAX_ROM_SIZE,
        });
    }
    Ok(rom)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_program(program: &[u8]) -> Chip8 {
        let mut chip8 = Chip8::default();
        chip8.load_rom(&mut &program[..]).unwrap();
        chip8
    }

    #[test]
    fn test_loads_rom() {
        let chip8 = with_program(&[0xAA, 0xBB]);
        assert_eq!(chip8.state.memory[0x200..0x202], [0xAA, 0xBB]);
    }

    #[test]
    fn test_rejects_oversized_rom() {
        let mut chip8 = Chip8::default();
        let rom = vec![0x1; MAX_ROM_SIZE + 1];
        let result = chip8.load_rom(&mut &rom[..]);
        assert!(matches!(result, Err(Chip8Error::RomTooLarge { .. })));
    }

    #[test]
    fn test_read_rom() {
        let rom = [0x00, 0xE0];
        assert_eq!(read_rom(&mut &rom[..]).unwrap(), vec![0x00, 0xE0]);
        let rom = vec![0x0; MAX_ROM_SIZE + 1];
        assert!(read_rom(&mut &rom[..]).is_err());
    }

    #[test]
    fn test_step_executes_op() {
        let mut chip8 = with_program(&[0x00, 0xE0]);
        let starting_pc = chip8.state.pc;
        assert_eq!(chip8.step().unwrap(), Instruction::Cls);
        assert_eq!(chip8.state.pc, starting_pc + 0x2);
    }

    #[test]
    fn test_step_waits_for_key_press() {
        let mut chip8 = with_program(&[0xF3, 0x0A]);
        chip8.step().unwrap();
        chip8.step().unwrap();
        assert_eq!(chip8.state.pc, 0x200);

        chip8.key_press(0xE);
        chip8.step().unwrap();
        assert_eq!(chip8.state.v[0x3], 0xE);
        assert_eq!(chip8.state.pc, 0x202);
    }

    #[test]
    fn test_key_release() {
        let mut chip8 = Chip8::default();
        chip8.key_press(0x4);
        assert!(chip8.state.key(0x4));
        chip8.key_release(0x4);
        assert!(!chip8.state.key(0x4));
    }

    #[test]
    fn test_step_reports_faults() {
        let mut chip8 = with_program(&[0x00, 0xEE]);
        assert!(matches!(
            chip8.step(),
            Err(Chip8Error::StackUnderflow { pc: 0x200 })
        ));
        chip8.skip_instruction();
        assert_eq!(chip8.state.pc, 0x202);
    }

    #[test]
    fn test_take_frame_clears_draw_flag() {
        let mut chip8 = with_program(&[0x00, 0xE0]);
        assert!(chip8.take_frame().is_none());
        chip8.step().unwrap();
        assert!(chip8.take_frame().is_some());
        assert!(chip8.take_frame().is_none());
    }

    #[test]
    fn test_timers_tick_every_n_cycles() {
        let mut state = State::new();
        state.delay_timer = 2;
        state.sound_timer = 1;
        let mut chip8 = Chip8::from(state);
        assert!(chip8.sound_active());

        for _ in 0..(DEFAULT_CLOCK_HZ / TIMER_HZ) - 1 {
            chip8.advance_timers();
        }
        assert_eq!(chip8.state.delay_timer, 2);
        chip8.advance_timers();
        assert_eq!(chip8.state.delay_timer, 1);
        assert!(!chip8.sound_active());
    }

    #[test]
    fn test_slow_clock_ticks_timers_every_cycle() {
        let mut chip8 = Chip8::with_clock(Quirks::default(), 30);
        chip8.state.delay_timer = 5;
        chip8.advance_timers();
        chip8.advance_timers();
        assert_eq!(chip8.state.delay_timer, 3);
    }
}
