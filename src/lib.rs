// 16 8-bit data registers named V0 to VF
// I -> address register (12 bits)
//
// Stack of 16 return addresses
//
// Delay timer & Sound timer: Count down at 60 times / s until 0
//
// Display res: 64 width, 32 height, bit-packed 8 pixels to a byte
//
// 35 opcodes, each are 2 bytes (big-endian)
//      NNN: address
//      NN: 8-bit constant
//      N: 4-bit constant
//      X and Y: 4-bit register identifier

pub mod config;
pub mod decode;
pub mod display;
pub mod emulator;
pub mod error;
pub mod keyboard;
pub mod memory;
pub mod registers;
pub mod scheduler;
pub mod timer;

pub use config::{Config, PcStep};
pub use decode::{OpCodes, RawInstruction};
pub use display::{Frame, FrameBuffer, HEIGHT, WIDTH};
pub use emulator::Emulator;
pub use error::{EmuError, Result};
pub use keyboard::{Keypad, SharedKeypad};
pub use scheduler::{Accumulator, Scheduler};
pub use timer::Timer;
