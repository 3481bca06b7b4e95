use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;

/// Source of the "keys currently down" bitmask, bit k set for key k.
/// Reads must return promptly.
pub trait Keypad: Send + Sync {
    fn pressed_keys(&self) -> u16;

    fn is_pressed(&self, key: u8) -> bool {
        self.pressed_keys() & (1 << (key & 0xF)) != 0
    }
}

/// Latest keypad state, written by the input side and read by the engine.
/// Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct SharedKeypad {
    state: Arc<AtomicU16>,
}

impl SharedKeypad {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_state(&self, mask: u16) {
        self.state.store(mask, Ordering::Release);
    }

    pub fn press(&self, key: u8) {
        self.state.fetch_or(1 << (key & 0xF), Ordering::AcqRel);
    }

    pub fn release(&self, key: u8) {
        self.state.fetch_and(!(1 << (key & 0xF)), Ordering::AcqRel);
    }

    pub fn reset(&self) {
        self.set_state(0);
    }
}

impl Keypad for SharedKeypad {
    fn pressed_keys(&self) -> u16 {
        self.state.load(Ordering::Acquire)
    }
}
