use std::error::Error;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use chipvm::{Config, PcStep, Scheduler, SharedKeypad};
use clap::Parser;
use crossbeam::channel::{bounded, RecvTimeoutError};
use window::Screen;

mod window;

// how long the window waits for a frame before pumping events anyway
const FRAME_WAIT: Duration = Duration::from_millis(16);

#[derive(Parser, Debug)]
#[command(about = "Runs a CHIP-8 program in a window")]
struct Args {
    /// Instructions executed per second
    #[arg(long, default_value_t = chipvm::config::DEFAULT_INSTRUCTIONS_PER_SECOND)]
    hz: u32,

    /// Window scale factor
    #[arg(short, long, default_value_t = 16)]
    scale: u8,

    /// Seed for the random number opcode
    #[arg(long)]
    seed: Option<u64>,

    /// Advance PC by one byte per instruction like some early interpreters
    #[arg(long)]
    byte_step: bool,

    rom: PathBuf,
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    env_logger::builder()
        .format(|buf, record| writeln!(buf, "{}: {}", record.level(), record.args()))
        .init();

    let rom = fs::read(&args.rom)?;
    log::info!("read {} bytes from {}", rom.len(), args.rom.display());

    let mut config = Config::default().with_instructions_per_second(args.hz);
    if let Some(seed) = args.seed {
        config = config.with_rng_seed(seed);
    }
    if args.byte_step {
        config = config.with_pc_step(PcStep::Byte);
    }

    let keypad = SharedKeypad::new();
    let (frames_tx, frames_rx) = bounded(0);
    let mut scheduler = Scheduler::start(&rom, keypad.clone(), Some(frames_tx), config)?;
    let mut screen = Screen::new(args.scale)?;

    while screen.is_running() && scheduler.is_running() {
        keypad.set_state(screen.keypad_state());
        match frames_rx.recv_timeout(FRAME_WAIT) {
            Ok(frame) => screen.draw(&frame)?,
            Err(RecvTimeoutError::Timeout) => screen.refresh(),
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    scheduler.stop()?;
    Ok(())
}
