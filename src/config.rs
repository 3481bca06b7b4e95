use std::time::Duration;

// Separately:
// CPU: 700 times per second
// Display: 60 times per second
// Timer: 60 times per second
pub const DEFAULT_INSTRUCTIONS_PER_SECOND: u32 = 700;
pub const TIMER_INTERVAL: Duration = Duration::from_nanos(1_000_000_000 / 60);
pub const BATCH_INTERVAL: Duration = Duration::from_nanos(1_000_000_000 / 60);

/// How far the program counter moves past a fetched instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PcStep {
    /// Two bytes, one full instruction word.
    #[default]
    Word,
    /// One byte, so consecutive fetches overlap. Some early interpreters
    /// behaved this way; only useful for reproducing their traces.
    Byte,
}

impl PcStep {
    pub fn bytes(self) -> u16 {
        match self {
            PcStep::Word => 2,
            PcStep::Byte => 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// How often the scheduler wakes to run a batch of steps.
    pub batch_interval: Duration,
    /// Simulated time per executed instruction.
    pub timestep: Duration,
    /// Countdown period of the delay and sound timers.
    pub timer_interval: Duration,
    pub pc_step: PcStep,
    /// Fixed seed for the CXNN generator, random when `None`.
    pub rng_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch_interval: BATCH_INTERVAL,
            timestep: timestep_for(DEFAULT_INSTRUCTIONS_PER_SECOND),
            timer_interval: TIMER_INTERVAL,
            pc_step: PcStep::Word,
            rng_seed: None,
        }
    }
}

impl Config {
    pub fn with_instructions_per_second(mut self, hz: u32) -> Self {
        self.timestep = timestep_for(hz);
        self
    }

    pub fn with_batch_interval(mut self, interval: Duration) -> Self {
        self.batch_interval = interval;
        self
    }

    pub fn with_timer_interval(mut self, interval: Duration) -> Self {
        self.timer_interval = interval;
        self
    }

    pub fn with_pc_step(mut self, step: PcStep) -> Self {
        self.pc_step = step;
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }
}

fn timestep_for(hz: u32) -> Duration {
    Duration::from_secs(1) / hz.max(1)
}
