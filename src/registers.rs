use crate::{config::PcStep, memory::TypeAddr};

pub const REG_COUNT: usize = 16;
/// Carry, borrow and collision flag. Also an ordinary register.
pub const VF: u8 = 0xF;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registers {
    registers: [u8; REG_COUNT],
}

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_register(&mut self, reg_num: u8, value: u8) {
        self.registers[reg_num as usize & 0xF] = value;
    }

    pub fn add_to_register(&mut self, reg_num: u8, value: u8) {
        let total = self.get(reg_num).wrapping_add(value);
        self.set_register(reg_num, total);
    }

    pub fn get(&self, reg_num: u8) -> u8 {
        self.registers[reg_num as usize & 0xF]
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.registers
    }
}

// Special registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgramCounter(pub TypeAddr, pub PcStep);

impl ProgramCounter {
    pub fn increment(&mut self) {
        self.0 = self.0.wrapping_add(self.1.bytes());
    }

    pub fn decrement(&mut self) {
        self.0 = self.0.wrapping_sub(self.1.bytes());
    }

    pub fn set_addr(&mut self, addr: TypeAddr) {
        self.0 = addr;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexRegister(pub TypeAddr);

impl IndexRegister {
    pub fn set_addr(&mut self, addr: TypeAddr) {
        self.0 = addr;
    }
}
