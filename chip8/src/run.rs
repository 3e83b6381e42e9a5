use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::time::{Duration, Instant};

use sdl2::event::Event;
use sdl2::keyboard::Keycode;

use emu8_core::Chip8;
use emu8_display::Display;

use crate::keymap::keypad_index;
use crate::{Config, OnFault};

pub fn run(config: Config) -> Result<(), Box<dyn Error>> {
    let mut chip8 = Chip8::with_clock(config.quirks, config.clock_hz);

    // Load ROM
    let file = File::open(&config.rom)?;
    let size = chip8.load_rom(&mut BufReader::new(file))?;
    log::info!("loaded {} ({} bytes)", config.rom.display(), size);

    // Get SDL2 context
    let sdl = sdl2::init()?;
    let mut display = Display::new(&sdl, config.scale)?;
    let mut events = sdl.event_pump()?;

    // Set initial timing
    let cycle_time = Duration::from_secs(1) / config.clock_hz;
    let mut last_cycle = Instant::now();

    // Whether or not the clock speed should be respected
    let mut fast_forward = false;

    'event: loop {
        // Render the current frame if it has changed
        if let Some(frame) = chip8.take_frame() {
            display.render(&frame)?;
        }

        // Handle input
        for event in events.poll_iter() {
            match event {
                Event::Quit { .. } => break 'event,
                Event::KeyDown {
                    keycode: Some(key), ..
                } => {
                    if let Some(index) = keypad_index(key) {
                        chip8.key_press(index);
                    } else if key == Keycode::Space {
                        fast_forward = true;
                    } else if key == Keycode::Escape {
                        break 'event;
                    }
                }
                Event::KeyUp {
                    keycode: Some(key), ..
                } => {
                    if let Some(index) = keypad_index(key) {
                        chip8.key_release(index);
                    } else if key == Keycode::Space {
                        fast_forward = false;
                    }
                }
                _ => continue,
            };
        }

        // Update state
        if let Err(e) = chip8.step() {
            match config.on_fault {
                OnFault::Halt => return Err(e.into()),
                OnFault::Skip => {
                    log::warn!("{}; skipping instruction", e);
                    chip8.skip_instruction();
                }
            }
        }
        chip8.advance_timers();

        // Handle timing
        let current_time = Instant::now();
        let elapsed_cycle_time = current_time - last_cycle;
        if !fast_forward && cycle_time > elapsed_cycle_time {
            std::thread::sleep(cycle_time - elapsed_cycle_time);
        }
        last_cycle = Instant::now();
    }

    log::info!("exiting");
    Ok(())
}
