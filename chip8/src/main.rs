use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use emu8_core::constants::{DEFAULT_CLOCK_HZ, PROGRAM_START};
use emu8_core::{disassemble, read_rom, Quirks};

mod keymap;
mod run;

/// How FX55/FX65 treat the I register.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum LoadStore {
    /// Leave I just past the last register transferred
    Increment,
    /// Leave I untouched
    Preserve,
}

/// What to do when the program faults (stack misuse or out-of-bounds memory).
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OnFault {
    /// Stop emulation and exit with an error
    Halt,
    /// Log the fault and step over the offending instruction
    Skip,
}

/// Chip-8 emulator
#[derive(Parser, Debug)]
#[command(name = "emu8")]
#[command(about = "A Chip-8 emulator", long_about = None)]
struct Args {
    /// Path to the ROM file
    rom: PathBuf,

    /// Instructions executed per second
    #[arg(long, default_value_t = DEFAULT_CLOCK_HZ)]
    clock_hz: u32,

    /// Size of each Chip-8 pixel on screen
    #[arg(long, default_value_t = 10)]
    scale: u32,

    /// Register load/store behavior
    #[arg(long, value_enum, default_value_t = LoadStore::Increment)]
    load_store: LoadStore,

    /// Fault handling policy
    #[arg(long, value_enum, default_value_t = OnFault::Halt)]
    on_fault: OnFault,

    /// Print the ROM's disassembly and exit
    #[arg(short, long)]
    disassemble: bool,
}

pub struct Config {
    pub rom: PathBuf,
    pub clock_hz: u32,
    pub scale: u32,
    pub quirks: Quirks,
    pub on_fault: OnFault,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Config {
            rom: args.rom,
            clock_hz: args.clock_hz.max(1),
            scale: args.scale.max(1),
            quirks: Quirks {
                load_store_increments_i: args.load_store == LoadStore::Increment,
            },
            on_fault: args.on_fault,
        }
    }
}

fn print_disassembly(rom: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::open(rom)?;
    let program = read_rom(&mut BufReader::new(file))?;
    for (addr, op, instruction) in disassemble(&program, PROGRAM_START) {
        println!("{:03X}: {:04X}  {}", addr, op, instruction);
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let result = if args.disassemble {
        print_disassembly(&args.rom)
    } else {
        run::run(Config::from(args))
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
