use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam::channel::{bounded, select, tick, Receiver, Sender};

use crate::{
    config::Config,
    display::{Frame, FramePublisher},
    emulator::Emulator,
    error::{EmuError, Result},
    keyboard::Keypad,
};

/// Banks wall-clock time and pays it out one fixed timestep at a time, so
/// the number of instructions run only depends on elapsed time and not on
/// how evenly the scheduler wakes.
#[derive(Debug, Clone)]
pub struct Accumulator {
    timestep: Duration,
    banked: Duration,
}

impl Accumulator {
    pub fn new(timestep: Duration) -> Self {
        Self {
            timestep: timestep.max(Duration::from_nanos(1)),
            banked: Duration::ZERO,
        }
    }

    pub fn bank(&mut self, elapsed: Duration) {
        self.banked += elapsed;
    }

    /// Takes one timestep out of the bank if there is one.
    pub fn try_consume(&mut self) -> bool {
        match self.banked.checked_sub(self.timestep) {
            Some(rest) => {
                self.banked = rest;
                true
            }
            None => false,
        }
    }

    pub fn banked(&self) -> Duration {
        self.banked
    }
}

/// The running engine: a thread that owns the [`Emulator`] and steps it in
/// batches until stopped or until the program hits a fatal error.
pub struct Scheduler {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<Result<()>>>,
    outcome: Option<Result<()>>,
}

impl Scheduler {
    /// Boots a machine with `program` loaded at 0x200 and starts running it.
    /// Changed frames are offered to `frames` after every batch.
    pub fn start(
        program: &[u8],
        keypad: impl Keypad + 'static,
        frames: Option<Sender<Frame>>,
        config: Config,
    ) -> Result<Self> {
        let mut emu = Emulator::new(&config, keypad)?;
        emu.load_rom(program)?;

        let (stop_tx, stop_rx) = bounded(0);
        let publisher = FramePublisher::new(frames);
        let handle = thread::Builder::new()
            .name("chipvm-engine".into())
            .spawn(move || run(emu, stop_rx, publisher, &config))
            .map_err(|e| EmuError::ThreadSpawn("engine", e.to_string()))?;

        log::info!("engine started with a {} byte program", program.len());
        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
            outcome: None,
        })
    }

    /// Stops the engine and waits for it, timers included, to shut down.
    /// Returns the error that ended the run early, if any. Calling it again
    /// returns the same outcome.
    pub fn stop(&mut self) -> Result<()> {
        // the engine treats a hung-up stop channel as the request
        self.stop_tx.take();
        if let Some(handle) = self.handle.take() {
            let outcome = handle.join().unwrap_or(Err(EmuError::EngineCrashed));
            log::info!("engine stopped");
            self.outcome = Some(outcome);
        }
        self.outcome.clone().unwrap_or(Ok(()))
    }

    /// False once the engine thread has exited, either through `stop` or
    /// because the program failed.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn run(
    mut emu: Emulator,
    stop_rx: Receiver<()>,
    mut publisher: FramePublisher,
    config: &Config,
) -> Result<()> {
    let ticker = tick(config.batch_interval);
    let mut accumulator = Accumulator::new(config.timestep);
    let mut last = Instant::now();

    let outcome = loop {
        select! {
            recv(stop_rx) -> _ => break Ok(()),
            recv(ticker) -> now => {
                let now = now.unwrap_or_else(|_| Instant::now());
                accumulator.bank(now.saturating_duration_since(last));
                last = now;

                if let Err(e) = run_batch(&mut emu, &mut accumulator) {
                    break Err(e);
                }
                if let Some(frame) = emu.take_frame() {
                    if !publisher.publish(frame) {
                        emu.keep_frame_pending();
                    }
                }
            },
        }
    };

    emu.shutdown();
    if let Err(e) = &outcome {
        log::error!("program halted: {e}");
    }
    outcome
}

fn run_batch(emu: &mut Emulator, accumulator: &mut Accumulator) -> Result<()> {
    let mut steps = 0u32;
    while accumulator.try_consume() {
        emu.step()?;
        steps += 1;
    }
    log::trace!("batch ran {steps} steps, pc {:03x}", emu.pc());
    Ok(())
}
