use crossbeam::channel::{Sender, TrySendError};

pub const WIDTH: usize = 64;
pub const HEIGHT: usize = 32;
pub const ROW_BYTES: usize = WIDTH / 8;

/// 32 rows of 8 bytes. The MSB of each byte is its leftmost pixel.
pub type Frame = [[u8; ROW_BYTES]; HEIGHT];

#[derive(Debug, Clone)]
pub struct FrameBuffer {
    rows: Frame,
    dirty: bool,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            rows: [[0; ROW_BYTES]; HEIGHT],
            dirty: false,
        }
    }

    pub fn clear_buffer(&mut self) {
        self.rows = [[0; ROW_BYTES]; HEIGHT];
        self.dirty = true;
    }

    /// XORs `sprite` in with its top-left corner at (x, y), wrapping on both
    /// axes. Returns true if any lit pixel was switched off.
    pub fn paint(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        let (x, y) = (x as usize % WIDTH, y as usize % HEIGHT);
        let group = x / 8;
        let shift = x % 8;
        let mut collided = 0u8;

        for (i, &bits) in sprite.iter().enumerate() {
            let row = &mut self.rows[(y + i) % HEIGHT];
            if shift == 0 {
                collided |= xor_byte(&mut row[group], bits);
            } else {
                collided |= xor_byte(&mut row[group], bits >> shift);
                collided |= xor_byte(&mut row[(group + 1) % ROW_BYTES], bits << (8 - shift));
            }
        }

        self.dirty = true;
        collided != 0
    }

    pub fn pixel(&self, col: usize, row: usize) -> bool {
        let byte = self.rows[row % HEIGHT][(col % WIDTH) / 8];
        byte & (0x80 >> (col % 8)) != 0
    }

    pub fn snapshot(&self) -> Frame {
        self.rows
    }

    pub fn is_blank(&self) -> bool {
        self.rows.iter().flatten().all(|b| *b == 0)
    }

    /// Checks and clears the changed-since-published flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }
}

// returns the pixels that were lit in both
fn xor_byte(dst: &mut u8, bits: u8) -> u8 {
    let overlap = *dst & bits;
    *dst ^= bits;
    overlap
}

/// Hands frames to a renderer without ever waiting on it. A frame nobody is
/// ready to take is dropped.
#[derive(Debug, Default)]
pub struct FramePublisher {
    sender: Option<Sender<Frame>>,
}

impl FramePublisher {
    pub fn new(sender: Option<Sender<Frame>>) -> Self {
        Self { sender }
    }

    pub fn publish(&mut self, frame: Frame) -> bool {
        let Some(sender) = &self.sender else {
            return false;
        };
        match sender.try_send(frame) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => false,
            Err(TrySendError::Disconnected(_)) => {
                log::info!("renderer went away, no longer publishing frames");
                self.sender = None;
                false
            }
        }
    }
}
