use thiserror::Error;

use crate::memory::TypeAddr;

pub type Result<T> = std::result::Result<T, EmuError>;

/// Conditions that stop a running program. Carry/borrow/collision are not in
/// here: those are reported through VF.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmuError {
    #[error("unknown opcode {opcode:04X} at {addr:03X}")]
    UnknownOpcode { opcode: u16, addr: TypeAddr },
    #[error("stack overflow calling {target:03X} from {addr:03X}")]
    StackOverflow { addr: TypeAddr, target: TypeAddr },
    #[error("return with empty stack at {addr:03X}")]
    StackUnderflow { addr: TypeAddr },
    #[error("program of {len} bytes does not fit in {max} bytes of memory")]
    RomTooLarge { len: usize, max: usize },
    #[error("could not spawn {0} thread: {1}")]
    ThreadSpawn(&'static str, String),
    #[error("engine thread panicked")]
    EngineCrashed,
}
