use crate::{
    config::PcStep,
    error::{EmuError, Result},
    registers::{IndexRegister, ProgramCounter},
};

pub type TypeAddr = u16; // in reality u12
type FontBytes = [u8; GLYPH_BYTES * 16];

pub const RAM_SIZE: usize = 4096;
pub const ADDR_MASK: TypeAddr = (RAM_SIZE - 1) as TypeAddr;
pub const PROGRAM_START: TypeAddr = 0x200;
pub const FONT_START: TypeAddr = 0x050;
pub const GLYPH_BYTES: usize = 5;
pub const STACK_SIZE: usize = 16;

const DEFAULT_FONT: FontBytes = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

/// Address of the built-in sprite for the low nibble of `digit`.
pub fn glyph_addr(digit: u8) -> TypeAddr {
    FONT_START + (digit & 0xF) as TypeAddr * GLYPH_BYTES as TypeAddr
}

pub struct Memory {
    // 4k bytes
    // font data stored from 050 -> 09F (000 -> 04F is empty by convention)
    bytes: [u8; RAM_SIZE],
    pub pc: ProgramCounter,
    pub index: IndexRegister,
    pub stack: Stack,
}

impl Memory {
    pub fn new(pc_step: PcStep) -> Self {
        let mut mem = Self {
            bytes: [0; RAM_SIZE],
            pc: ProgramCounter(PROGRAM_START, pc_step),
            index: IndexRegister(0x0),
            stack: Stack::new(),
        };
        mem.load_font();
        mem
    }

    // addresses past 4K wrap back around
    pub fn set(&mut self, addr: TypeAddr, val: u8) {
        self.bytes[(addr & ADDR_MASK) as usize] = val;
    }

    pub fn get(&self, addr: TypeAddr) -> u8 {
        self.bytes[(addr & ADDR_MASK) as usize]
    }

    /// `len` bytes starting at `addr`, wrapping at the end of memory.
    pub fn read_span(&self, addr: TypeAddr, len: usize) -> Vec<u8> {
        (0..len as TypeAddr)
            .map(|offset| self.get(addr.wrapping_add(offset)))
            .collect()
    }

    pub fn increment_pc(&mut self) {
        self.pc.increment();
    }

    pub fn decrement_pc(&mut self) {
        self.pc.decrement();
    }

    /// Fetches the big-endian word at PC and moves PC past it.
    pub fn next_instruction(&mut self) -> u16 {
        let (l, r) = (self.get(self.pc.0), self.get(self.pc.0.wrapping_add(1)));
        self.increment_pc();
        ((l as u16) << 8) | r as u16
    }

    pub fn set_pc(&mut self, addr: TypeAddr) {
        self.pc.set_addr(addr);
    }

    pub fn set_index(&mut self, addr: TypeAddr) {
        self.index.set_addr(addr);
    }

    // loads program instructions starting at address 0x200
    pub fn load_rom(&mut self, bytes: &[u8]) -> Result<()> {
        let start_index = PROGRAM_START as usize;
        let max = RAM_SIZE - start_index;
        if bytes.len() > max {
            return Err(EmuError::RomTooLarge {
                len: bytes.len(),
                max,
            });
        }
        self.bytes[start_index..start_index + bytes.len()].copy_from_slice(bytes);
        self.pc.set_addr(PROGRAM_START);
        log::debug!("loaded {} byte program at {:03x}", bytes.len(), start_index);
        Ok(())
    }

    fn load_font(&mut self) {
        let start_index = FONT_START as usize;
        self.bytes[start_index..start_index + DEFAULT_FONT.len()].copy_from_slice(&DEFAULT_FONT);
    }
}

/// Return addresses for CALL/RET. Depth is fixed at 16 and misuse is an
/// error rather than a wraparound.
#[derive(Debug, Clone, Default)]
pub struct Stack {
    addresses: [TypeAddr; STACK_SIZE],
    sp: usize,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, addr: TypeAddr) -> Option<()> {
        let slot = self.addresses.get_mut(self.sp)?;
        *slot = addr;
        self.sp += 1;
        Some(())
    }

    pub fn pop(&mut self) -> Option<TypeAddr> {
        self.sp = self.sp.checked_sub(1)?;
        Some(self.addresses[self.sp])
    }

    pub fn depth(&self) -> usize {
        self.sp
    }
}
