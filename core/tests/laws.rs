use emu8_core::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH, STACK_SIZE};
use emu8_core::{Instruction, State};
use proptest::prelude::*;

fn execute(op: u16, state: &mut State) {
    Instruction::decode(op).execute(state).unwrap();
}

#[test]
fn decode_is_total_and_deterministic() {
    for op in 0..=u16::MAX {
        assert_eq!(Instruction::decode(op), Instruction::decode(op));
    }
}

#[test]
fn register_round_trips() {
    let mut state = State::new();
    for x in 0..16u8 {
        for value in 0..=u8::MAX {
            execute(0x6000 | u16::from(x) << 8 | u16::from(value), &mut state);
            assert_eq!(state.register(x), value);
        }
    }
}

#[test]
fn shifts_flag_the_pre_shift_bit() {
    for value in 0..=u8::MAX {
        let mut state = State::new();
        state.v[0x3] = value;
        execute(0x8306, &mut state);
        assert_eq!(state.v[0xF], value & 0x1);
        assert_eq!(state.v[0x3], value >> 1);

        let mut state = State::new();
        state.v[0x3] = value;
        execute(0x830E, &mut state);
        assert_eq!(state.v[0xF], value >> 7);
        assert_eq!(state.v[0x3], value << 1);
    }
}

proptest! {
    #[test]
    fn add_carries(vx in any::<u8>(), vy in any::<u8>()) {
        let mut state = State::new();
        state.v[0x1] = vx;
        state.v[0x2] = vy;
        execute(0x8124, &mut state);
        let sum = u16::from(vx) + u16::from(vy);
        prop_assert_eq!(state.v[0xF] == 1, sum > 0xFF);
        prop_assert_eq!(u16::from(state.v[0x1]), sum % 0x100);
    }

    #[test]
    fn sub_borrows(vx in any::<u8>(), vy in any::<u8>()) {
        let mut state = State::new();
        state.v[0x1] = vx;
        state.v[0x2] = vy;
        execute(0x8125, &mut state);
        prop_assert_eq!(state.v[0xF] == 1, vx >= vy);
        prop_assert_eq!(state.v[0x1], vx.wrapping_sub(vy));
    }

    #[test]
    fn subn_borrows(vx in any::<u8>(), vy in any::<u8>()) {
        let mut state = State::new();
        state.v[0x1] = vx;
        state.v[0x2] = vy;
        execute(0x8127, &mut state);
        prop_assert_eq!(state.v[0xF] == 1, vy >= vx);
        prop_assert_eq!(state.v[0x1], vy.wrapping_sub(vx));
    }

    #[test]
    fn calls_and_returns_restore_pc(
        targets in proptest::collection::vec(0x200u16..0xFFE, 0..=STACK_SIZE),
    ) {
        let mut state = State::new();
        state.pc = 0x234;
        for target in &targets {
            execute(0x2000 | target, &mut state);
            prop_assert_eq!(state.pc, *target);
        }
        for _ in &targets {
            execute(0x00EE, &mut state);
        }
        let expected = if targets.is_empty() { 0x234 } else { 0x236 };
        prop_assert_eq!(state.pc, expected);
        prop_assert_eq!(state.sp, 0);
    }

    #[test]
    fn drawing_twice_restores_the_frame(
        sprite in proptest::collection::vec(any::<u8>(), 1..=15),
        x in any::<u8>(),
        y in any::<u8>(),
        lit in proptest::collection::vec((0..DISPLAY_WIDTH, 0..DISPLAY_HEIGHT), 0..64),
    ) {
        let mut state = State::new();
        for (px, py) in lit {
            state.frame_buffer[py][px] = true;
        }
        state.memory[0x300..0x300 + sprite.len()].copy_from_slice(&sprite);
        state.i = 0x300;
        state.v[0x1] = x;
        state.v[0x2] = y;
        let before = state.frame_buffer;
        let draw = 0xD120 | sprite.len() as u16;

        execute(draw, &mut state);
        let after_first = state.frame_buffer;
        execute(draw, &mut state);

        prop_assert_eq!(state.frame_buffer, before);

        // The second pass collides wherever the first pass left a sprite pixel lit
        let mut collided = false;
        for (row, byte) in sprite.iter().enumerate() {
            for bit in 0..8 {
                if byte & (0x80 >> bit) != 0 {
                    let px = (x as usize + bit) % DISPLAY_WIDTH;
                    let py = (y as usize + row) % DISPLAY_HEIGHT;
                    collided |= after_first[py][px];
                }
            }
        }
        prop_assert_eq!(state.v[0xF] == 1, collided);
    }
}
