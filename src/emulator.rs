use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::{
    config::Config,
    decode::OpCodes,
    display::{Frame, FrameBuffer},
    error::{EmuError, Result},
    keyboard::Keypad,
    memory::{glyph_addr, Memory, TypeAddr},
    registers::{Registers, VF},
    timer::Timer,
};

/// Machine state plus the single-step execution engine.
///
/// Only the delay and sound values live outside this struct, in their
/// [`Timer`] threads, and they are only reached through `get`/`set`.
pub struct Emulator {
    fb: FrameBuffer,
    pub regs: Registers,
    pub mem: Memory,
    pub delay_timer: Timer,
    pub sound_timer: Timer,
    keypad: Box<dyn Keypad>,
    // keys seen down at the previous poll of a pending FX0A
    key_wait: Option<u16>,
    rng: StdRng,
}

impl Emulator {
    pub fn new(config: &Config, keypad: impl Keypad + 'static) -> Result<Self> {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            fb: FrameBuffer::new(),
            regs: Registers::new(),
            mem: Memory::new(config.pc_step),
            delay_timer: Timer::start("delay", config.timer_interval)?,
            sound_timer: Timer::start("sound", config.timer_interval)?,
            keypad: Box::new(keypad),
            key_wait: None,
            rng,
        })
    }

    pub fn load_rom(&mut self, rom: &[u8]) -> Result<()> {
        self.mem.load_rom(rom)
    }

    pub fn fetch_decode(&mut self) -> OpCodes {
        let ins = self.mem.next_instruction();
        OpCodes::decode_raw(ins)
    }

    /// Runs the instruction at PC. A `GetKey` that has not seen a key go down
    /// leaves PC where it was, so the next step waits again.
    pub fn step(&mut self) -> Result<()> {
        let addr = self.mem.pc.0;
        let operation = self.fetch_decode();
        log::trace!("{addr:03x}: {operation}");
        self.execute_ins(operation, addr)
    }

    pub fn execute_ins(&mut self, ins: OpCodes, addr: TypeAddr) -> Result<()> {
        match ins {
            OpCodes::ClearScreen => {
                self.fb.clear_buffer();
            }
            OpCodes::PopSubroutine => {
                let ret = self
                    .mem
                    .stack
                    .pop()
                    .ok_or(EmuError::StackUnderflow { addr })?;
                self.mem.set_pc(ret);
            }
            OpCodes::System(target) => {
                log::debug!("ignoring native call to {target:03x} at {addr:03x}");
            }
            OpCodes::Jump(target) => {
                self.mem.set_pc(target);
            }
            OpCodes::PushSubroutine(target) => {
                // PC already points past the CALL
                self.mem
                    .stack
                    .push(self.mem.pc.0)
                    .ok_or(EmuError::StackOverflow { addr, target })?;
                self.mem.set_pc(target);
            }
            OpCodes::SkipEqualConstant(vx, nn) => {
                if self.regs.get(vx) == nn {
                    self.mem.increment_pc();
                }
            }
            OpCodes::SkipNotEqualConstant(vx, nn) => {
                if self.regs.get(vx) != nn {
                    self.mem.increment_pc();
                }
            }
            OpCodes::SkipEqualRegister(vx, vy) => {
                if self.regs.get(vx) == self.regs.get(vy) {
                    self.mem.increment_pc();
                }
            }
            OpCodes::SkipNotEqualRegister(vx, vy) => {
                if self.regs.get(vx) != self.regs.get(vy) {
                    self.mem.increment_pc();
                }
            }
            OpCodes::SetRegister(vx, nn) => {
                self.regs.set_register(vx, nn);
            }
            OpCodes::AddToRegister(vx, nn) => {
                self.regs.add_to_register(vx, nn);
            }
            OpCodes::CopyRegister(vx, vy) => {
                self.regs.set_register(vx, self.regs.get(vy));
            }
            OpCodes::Or(vx, vy) => {
                self.regs
                    .set_register(vx, self.regs.get(vx) | self.regs.get(vy));
            }
            OpCodes::And(vx, vy) => {
                self.regs
                    .set_register(vx, self.regs.get(vx) & self.regs.get(vy));
            }
            OpCodes::XOr(vx, vy) => {
                self.regs
                    .set_register(vx, self.regs.get(vx) ^ self.regs.get(vy));
            }
            // Flag-setting ops read both operands first and write VF last,
            // so VF as a destination ends up holding the flag.
            OpCodes::Add(vx, vy) => {
                let (x, y) = (self.regs.get(vx), self.regs.get(vy));
                let (sum, carry) = x.overflowing_add(y);
                self.regs.set_register(vx, sum);
                self.regs.set_register(VF, carry as u8);
            }
            OpCodes::SubtractForward(vx, vy) => {
                let (x, y) = (self.regs.get(vx), self.regs.get(vy));
                self.regs.set_register(vx, x.wrapping_sub(y));
                self.regs.set_register(VF, (x >= y) as u8); // no borrow
            }
            OpCodes::SubtractBackward(vx, vy) => {
                let (x, y) = (self.regs.get(vx), self.regs.get(vy));
                self.regs.set_register(vx, y.wrapping_sub(x));
                self.regs.set_register(VF, (y >= x) as u8); // no borrow
            }
            OpCodes::RightShift(vx, _) => {
                let vx_value = self.regs.get(vx);
                self.regs.set_register(vx, vx_value >> 1);
                self.regs.set_register(VF, vx_value & 1);
            }
            OpCodes::LeftShift(vx, _) => {
                let vx_value = self.regs.get(vx);
                self.regs.set_register(vx, vx_value << 1);
                self.regs.set_register(VF, (vx_value >> 7) & 1);
            }
            OpCodes::SetIndexRegister(target) => self.mem.set_index(target),
            OpCodes::JumpWithOffset(target) => {
                self.mem
                    .set_pc(target.wrapping_add(self.regs.get(0) as TypeAddr));
            }
            OpCodes::Random(vx, nn) => {
                let ransuu: u8 = self.rng.gen();
                self.regs.set_register(vx, nn & ransuu);
            }
            OpCodes::Display(reg_x, reg_y, height) => {
                let (x, y) = (self.regs.get(reg_x), self.regs.get(reg_y));
                let sprite = self.mem.read_span(self.mem.index.0, height as usize);
                let collided = self.fb.paint(x, y, &sprite);
                self.regs.set_register(VF, collided as u8);
            }
            OpCodes::SkipIfPressed(vx) => {
                if self.keypad.is_pressed(self.regs.get(vx)) {
                    self.mem.increment_pc();
                }
            }
            OpCodes::SkipIfNotPressed(vx) => {
                if !self.keypad.is_pressed(self.regs.get(vx)) {
                    self.mem.increment_pc();
                }
            }
            OpCodes::CopyDelayToRegister(vx) => {
                let delay = self.delay_timer.get();
                self.regs.set_register(vx, delay);
            }
            OpCodes::GetKey(vx) => {
                let pressed = self.keypad.pressed_keys();
                // keys already down when the wait began do not count
                let previous = self.key_wait.unwrap_or(pressed);
                match pressed & !previous {
                    0 => {
                        self.key_wait = Some(pressed);
                        self.mem.decrement_pc();
                    }
                    fresh => {
                        self.key_wait = None;
                        self.regs.set_register(vx, fresh.trailing_zeros() as u8);
                    }
                }
            }
            OpCodes::CopyRegisterToDelay(vx) => self.delay_timer.set(self.regs.get(vx)),
            OpCodes::CopyRegisterToSound(vx) => self.sound_timer.set(self.regs.get(vx)),
            OpCodes::AddToIndex(vx) => {
                self.mem
                    .set_index(self.mem.index.0.wrapping_add(self.regs.get(vx) as TypeAddr));
            }
            OpCodes::PointChar(vx) => {
                self.mem.set_index(glyph_addr(self.regs.get(vx)));
            }
            OpCodes::ToDecimal(vx) => {
                let value = self.regs.get(vx);
                let i = self.mem.index.0;
                self.mem.set(i, value / 100);
                self.mem.set(i.wrapping_add(1), value / 10 % 10);
                self.mem.set(i.wrapping_add(2), value % 10);
            }
            OpCodes::StoreRegisterToMemory(vx) => {
                for reg in 0..=vx {
                    let reg_val = self.regs.get(reg);
                    self.mem
                        .set(self.mem.index.0.wrapping_add(reg as TypeAddr), reg_val);
                }
            }
            OpCodes::LoadRegisterFromMemory(vx) => {
                for reg in 0..=vx {
                    let reg_val = self.mem.get(self.mem.index.0.wrapping_add(reg as TypeAddr));
                    self.regs.set_register(reg, reg_val);
                }
            }
            OpCodes::Unknown(opcode) => {
                return Err(EmuError::UnknownOpcode { opcode, addr });
            }
        }
        Ok(())
    }

    pub fn pc(&self) -> TypeAddr {
        self.mem.pc.0
    }

    pub fn index(&self) -> TypeAddr {
        self.mem.index.0
    }

    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    pub fn stack_depth(&self) -> usize {
        self.mem.stack.depth()
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.fb
    }

    pub fn frame(&self) -> Frame {
        self.fb.snapshot()
    }

    /// Snapshot of the framebuffer if it changed since the last call.
    pub fn take_frame(&mut self) -> Option<Frame> {
        self.fb.take_dirty().then(|| self.fb.snapshot())
    }

    /// Puts back a frame that could not be handed over, so it is offered again.
    pub fn keep_frame_pending(&mut self) {
        self.fb.mark_dirty();
    }

    pub fn delay(&mut self) -> u8 {
        self.delay_timer.get()
    }

    pub fn sound(&mut self) -> u8 {
        self.sound_timer.get()
    }

    /// Stops both timer threads. Nothing ticks after this returns.
    pub fn shutdown(&mut self) {
        self.delay_timer.stop();
        self.sound_timer.stop();
    }
}

impl Drop for Emulator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::PcStep,
        keyboard::SharedKeypad,
        memory::{PROGRAM_START, STACK_SIZE},
    };
    use proptest::prelude::*;
    use std::time::Duration;

    fn config() -> Config {
        Config::default()
            .with_timer_interval(Duration::from_secs(3600))
            .with_rng_seed(0x5EED)
    }

    fn boot_with_keypad(program: &[u8], keypad: SharedKeypad) -> Emulator {
        let mut emu = Emulator::new(&config(), keypad).unwrap();
        emu.load_rom(program).unwrap();
        emu
    }

    fn boot(program: &[u8]) -> Emulator {
        boot_with_keypad(program, SharedKeypad::new())
    }

    fn run(emu: &mut Emulator, steps: usize) {
        for _ in 0..steps {
            emu.step().unwrap();
        }
    }

    #[test]
    fn op_load_then_clear() {
        let mut emu = boot(&[0x60, 0x0A, 0x00, 0xE0]);
        emu.fb.paint(0, 0, &[0xFF]);
        emu.step().unwrap();
        assert_eq!(emu.regs.get(0), 10);
        assert_eq!(emu.pc(), PROGRAM_START + 2);
        emu.step().unwrap();
        assert!(emu.frame_buffer().is_blank());
        assert_eq!(emu.pc(), PROGRAM_START + 4);
    }

    #[test]
    fn op_0nnn_is_ignored() {
        let mut emu = boot(&[0x01, 0x23]);
        emu.step().unwrap();
        assert_eq!(emu.pc(), PROGRAM_START + 2);
        assert_eq!(emu.registers(), &Registers::new());
    }

    #[test]
    fn op_1nnn() {
        let mut emu = boot(&[0x13, 0x45]);
        emu.step().unwrap();
        assert_eq!(emu.pc(), 0x345);
    }

    #[test]
    fn op_bnnn() {
        let mut emu = boot(&[0x60, 0x10, 0xB3, 0x00]);
        run(&mut emu, 2);
        assert_eq!(emu.pc(), 0x310);
    }

    #[test]
    fn op_call_and_return() {
        // 200: CALL 206
        // 202: LD V1, 1
        // 204: JP 204
        // 206: LD V0, 7
        // 208: RET
        let mut emu = boot(&[0x22, 0x06, 0x61, 0x01, 0x12, 0x04, 0x60, 0x07, 0x00, 0xEE]);
        assert_eq!(emu.stack_depth(), 0);
        emu.step().unwrap();
        assert_eq!(emu.pc(), 0x206);
        assert_eq!(emu.stack_depth(), 1);
        run(&mut emu, 2);
        assert_eq!(emu.pc(), 0x202);
        assert_eq!(emu.stack_depth(), 0);
        emu.step().unwrap();
        assert_eq!(emu.regs.get(0), 7);
        assert_eq!(emu.regs.get(1), 1);
    }

    #[test]
    fn op_return_on_empty_stack() {
        let mut emu = boot(&[0x00, 0xEE]);
        assert_eq!(emu.step(), Err(EmuError::StackUnderflow { addr: 0x200 }));
    }

    #[test]
    fn op_call_overflows_after_sixteen_frames() {
        // 200: CALL 200, recursing forever
        let mut emu = boot(&[0x22, 0x00]);
        run(&mut emu, STACK_SIZE);
        assert_eq!(emu.stack_depth(), STACK_SIZE);
        assert_eq!(
            emu.step(),
            Err(EmuError::StackOverflow {
                addr: 0x200,
                target: 0x200
            })
        );
    }

    #[test]
    fn op_skips() {
        // 3xkk taken, 4xkk not taken, 5xy0 taken, 9xy0 not taken
        let mut emu = boot(&[0x60, 0x05, 0x61, 0x05, 0x30, 0x05]);
        run(&mut emu, 3);
        assert_eq!(emu.pc(), 0x208);

        let mut emu = boot(&[0x60, 0x05, 0x40, 0x05]);
        run(&mut emu, 2);
        assert_eq!(emu.pc(), 0x204);

        let mut emu = boot(&[0x60, 0x05, 0x61, 0x05, 0x50, 0x10]);
        run(&mut emu, 3);
        assert_eq!(emu.pc(), 0x208);

        let mut emu = boot(&[0x60, 0x05, 0x61, 0x05, 0x90, 0x10]);
        run(&mut emu, 3);
        assert_eq!(emu.pc(), 0x206);
    }

    #[test]
    fn op_7xkk_wraps_without_flag() {
        let mut emu = boot(&[0x60, 0xFF, 0x70, 0x02]);
        run(&mut emu, 2);
        assert_eq!(emu.regs.get(0), 1);
        assert_eq!(emu.regs.get(VF), 0);
    }

    #[test]
    fn op_logic() {
        let mut emu = boot(&[
            0x60, 0b1100, 0x61, 0b1010, // V0, V1
            0x82, 0x00, 0x82, 0x11, // V2 = V0 | V1
            0x83, 0x00, 0x83, 0x12, // V3 = V0 & V1
            0x84, 0x00, 0x84, 0x13, // V4 = V0 ^ V1
        ]);
        run(&mut emu, 8);
        assert_eq!(emu.regs.get(2), 0b1110);
        assert_eq!(emu.regs.get(3), 0b1000);
        assert_eq!(emu.regs.get(4), 0b0110);
    }

    #[test]
    fn op_add_into_vf_keeps_flag() {
        // VF = 0xFF, V0 = 1, VF += V0
        let mut emu = boot(&[0x6F, 0xFF, 0x60, 0x01, 0x8F, 0x04]);
        run(&mut emu, 3);
        assert_eq!(emu.regs.get(VF), 1);
    }

    #[test]
    fn op_sub_equal_operands_means_no_borrow() {
        let mut emu = boot(&[0x60, 0x03, 0x61, 0x03, 0x80, 0x15]);
        run(&mut emu, 3);
        assert_eq!(emu.regs.get(0), 0);
        assert_eq!(emu.regs.get(VF), 1);

        let mut emu = boot(&[0x60, 0x03, 0x61, 0x03, 0x80, 0x17]);
        run(&mut emu, 3);
        assert_eq!(emu.regs.get(0), 0);
        assert_eq!(emu.regs.get(VF), 1);
    }

    #[test]
    fn op_alu_reads_vf_operand_before_flag() {
        // VF = 5, V0 = 9, V0 -= VF
        let mut emu = boot(&[0x6F, 0x05, 0x60, 0x09, 0x80, 0xF5]);
        run(&mut emu, 3);
        assert_eq!(emu.regs.get(0), 4);
        assert_eq!(emu.regs.get(VF), 1);

        // VF = 5, V0 = 9, V0 = VF - V0
        let mut emu = boot(&[0x6F, 0x05, 0x60, 0x09, 0x80, 0xF7]);
        run(&mut emu, 3);
        assert_eq!(emu.regs.get(0), 0xFC);
        assert_eq!(emu.regs.get(VF), 0);

        // VF = 0xFF, V0 = 2, V0 += VF
        let mut emu = boot(&[0x6F, 0xFF, 0x60, 0x02, 0x80, 0xF4]);
        run(&mut emu, 3);
        assert_eq!(emu.regs.get(0), 1);
        assert_eq!(emu.regs.get(VF), 1);
    }

    #[test]
    fn op_sub_with_borrow() {
        let mut emu = boot(&[0x60, 0x01, 0x61, 0x03, 0x80, 0x15]);
        run(&mut emu, 3);
        assert_eq!(emu.regs.get(0), 0xFE);
        assert_eq!(emu.regs.get(VF), 0);
    }

    #[test]
    fn op_shifts_move_one_bit() {
        // never two: 0b1000_0011 >> 1 is 0b0100_0001
        let mut emu = boot(&[0x60, 0b1000_0011, 0x80, 0x06]);
        run(&mut emu, 2);
        assert_eq!(emu.regs.get(0), 0b0100_0001);
        assert_eq!(emu.regs.get(VF), 1);

        let mut emu = boot(&[0x60, 0b1000_0011, 0x80, 0x0E]);
        run(&mut emu, 2);
        assert_eq!(emu.regs.get(0), 0b0000_0110);
        assert_eq!(emu.regs.get(VF), 1);
    }

    #[test]
    fn op_cxkk_uses_seeded_generator() {
        let mut emu = boot(&[0xC0, 0x0F, 0xC1, 0x00]);
        run(&mut emu, 2);
        let mut expected = StdRng::seed_from_u64(0x5EED);
        assert_eq!(emu.regs.get(0), expected.gen::<u8>() & 0x0F);
        assert_eq!(emu.regs.get(1), 0);
    }

    #[test]
    fn op_dxyn_draws_and_reports_collision() {
        // I = glyph(0), draw it at (0, 0) twice
        let mut emu = boot(&[0x60, 0x00, 0xF0, 0x29, 0xD0, 0x05, 0xD0, 0x05]);
        run(&mut emu, 3);
        assert_eq!(emu.regs.get(VF), 0);
        assert_eq!(emu.frame()[0][0], 0xF0);
        assert_eq!(emu.frame()[1][0], 0x90);
        assert_eq!(emu.take_frame().map(|f| f[4][0]), Some(0xF0));
        assert_eq!(emu.take_frame(), None);
        emu.step().unwrap();
        assert_eq!(emu.regs.get(VF), 1);
        assert!(emu.frame_buffer().is_blank());
        assert_eq!(emu.pc(), 0x208);
    }

    #[test]
    fn op_dxyn_reads_origin_from_registers() {
        let mut emu = boot(&[0x61, 62, 0x62, 30, 0xF0, 0x29, 0xD1, 0x25]);
        run(&mut emu, 4);
        let fb = emu.frame_buffer();
        assert!(fb.pixel(62, 30));
        assert!(fb.pixel(1, 30));
        assert!(fb.pixel(62, 2));
        assert!(!fb.pixel(62, 3));
    }

    #[test]
    fn op_ex9e_exa1() {
        let keypad = SharedKeypad::new();
        keypad.press(0xB);
        let mut emu = boot_with_keypad(&[0x60, 0x1B, 0xE0, 0x9E], keypad.clone());
        run(&mut emu, 2);
        assert_eq!(emu.pc(), 0x206);

        let mut emu = boot_with_keypad(&[0x60, 0x0B, 0xE0, 0xA1], keypad.clone());
        run(&mut emu, 2);
        assert_eq!(emu.pc(), 0x204);

        keypad.reset();
        let mut emu = boot_with_keypad(&[0x60, 0x0B, 0xE0, 0xA1], keypad);
        run(&mut emu, 2);
        assert_eq!(emu.pc(), 0x206);
    }

    #[test]
    fn op_fx0a_waits_for_a_key() {
        let keypad = SharedKeypad::new();
        let mut emu = boot_with_keypad(&[0xF3, 0x0A], keypad.clone());
        for _ in 0..5 {
            emu.step().unwrap();
            assert_eq!(emu.pc(), 0x200);
        }
        keypad.press(0xC);
        keypad.press(0x7);
        emu.step().unwrap();
        assert_eq!(emu.regs.get(3), 0x7);
        assert_eq!(emu.pc(), 0x202);
    }

    #[test]
    fn op_fx0a_ignores_key_held_before_wait() {
        let keypad = SharedKeypad::new();
        keypad.press(0x5);
        let mut emu = boot_with_keypad(&[0xF3, 0x0A], keypad.clone());
        for _ in 0..3 {
            emu.step().unwrap();
            assert_eq!(emu.pc(), 0x200);
        }
        // a second key going down ends the wait, the held one is ignored
        keypad.press(0x9);
        emu.step().unwrap();
        assert_eq!(emu.regs.get(3), 0x9);
        assert_eq!(emu.pc(), 0x202);
    }

    #[test]
    fn op_fx0a_needs_release_then_press() {
        // 200: LD V3, K
        // 202: LD V4, K
        let keypad = SharedKeypad::new();
        let mut emu = boot_with_keypad(&[0xF3, 0x0A, 0xF4, 0x0A], keypad.clone());
        emu.step().unwrap();
        keypad.press(0x2);
        emu.step().unwrap();
        assert_eq!(emu.regs.get(3), 0x2);
        assert_eq!(emu.pc(), 0x202);

        // still held: the next wait does not fire
        for _ in 0..3 {
            emu.step().unwrap();
            assert_eq!(emu.pc(), 0x202);
        }
        keypad.release(0x2);
        emu.step().unwrap();
        assert_eq!(emu.pc(), 0x202);
        keypad.press(0x2);
        emu.step().unwrap();
        assert_eq!(emu.regs.get(4), 0x2);
        assert_eq!(emu.pc(), 0x204);
    }

    #[test]
    fn op_fx0a_rewinds_across_wrap() {
        let mut emu = boot(&[]);
        emu.mem.set(0xFFE, 0xF3);
        emu.mem.set(0xFFF, 0x0A);
        emu.mem.set_pc(0xFFFE);
        emu.step().unwrap();
        assert_eq!(emu.pc(), 0xFFFE);
    }

    #[test]
    fn op_fx0a_waits_with_byte_steps() {
        let keypad = SharedKeypad::new();
        let mut emu =
            Emulator::new(&config().with_pc_step(PcStep::Byte), keypad.clone()).unwrap();
        emu.load_rom(&[0xF3, 0x0A]).unwrap();
        emu.step().unwrap();
        assert_eq!(emu.pc(), 0x200);
        keypad.press(0x1);
        emu.step().unwrap();
        assert_eq!(emu.pc(), 0x201);
    }

    #[test]
    fn op_timers() {
        // V0 = 200, DT = V0, ST = V0, V1 = DT
        let mut emu = boot(&[0x60, 200, 0xF0, 0x15, 0xF0, 0x18, 0xF1, 0x07]);
        run(&mut emu, 4);
        assert_eq!(emu.regs.get(1), 200);
        assert_eq!(emu.sound(), 200);
        emu.shutdown();
        assert!(!emu.delay_timer.is_running());
        assert!(!emu.sound_timer.is_running());
    }

    #[test]
    fn op_index_ops() {
        // I = 0xFFE, V0 = 3, I += V0
        let mut emu = boot(&[0xAF, 0xFE, 0x60, 0x03, 0xF0, 0x1E]);
        run(&mut emu, 3);
        assert_eq!(emu.index(), 0x1001);

        let mut emu = boot(&[0x60, 0x1A, 0xF0, 0x29]);
        run(&mut emu, 2);
        assert_eq!(emu.index(), glyph_addr(0xA));
    }

    #[test]
    fn op_fx33() {
        let mut emu = boot(&[0x60, 254, 0xA3, 0x00, 0xF0, 0x33]);
        run(&mut emu, 3);
        assert_eq!(emu.mem.read_span(0x300, 3), vec![2, 5, 4]);

        let mut emu = boot(&[0x60, 7, 0xA3, 0x00, 0xF0, 0x33]);
        run(&mut emu, 3);
        assert_eq!(emu.mem.read_span(0x300, 3), vec![0, 0, 7]);
    }

    #[test]
    fn op_fx55_fx65() {
        let mut emu = boot(&[
            0x60, 0x11, 0x61, 0x22, 0x62, 0x33, // V0..V2
            0xA3, 0x00, 0xF1, 0x55, // store V0..V1
            0x60, 0x00, 0x61, 0x00, // clobber
            0xF2, 0x65, // load V0..V2
        ]);
        run(&mut emu, 8);
        assert_eq!(emu.mem.read_span(0x300, 3), vec![0x11, 0x22, 0x00]);
        assert_eq!(emu.regs.get(0), 0x11);
        assert_eq!(emu.regs.get(1), 0x22);
        assert_eq!(emu.regs.get(2), 0x00);
        assert_eq!(emu.index(), 0x300);
    }

    #[test]
    fn op_unknown_is_fatal() {
        let mut emu = boot(&[0x60, 0x01, 0xE0, 0x00]);
        emu.step().unwrap();
        assert_eq!(
            emu.step(),
            Err(EmuError::UnknownOpcode {
                opcode: 0xE000,
                addr: 0x202
            })
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn add_sets_carry(x in 0u8..0xF, y in 0u8..0xF, a in any::<u8>(), b in any::<u8>()) {
            prop_assume!(x != y);
            let mut emu = boot(&[0x60 | x, a, 0x60 | y, b, 0x80 | x, (y << 4) | 0x4]);
            run(&mut emu, 3);
            prop_assert_eq!(emu.regs.get(x), a.wrapping_add(b));
            prop_assert_eq!(emu.regs.get(VF), (a as u16 + b as u16 > 255) as u8);
        }

        #[test]
        fn sub_flags_no_borrow(x in 0u8..0xF, y in 0u8..0xF, a in any::<u8>(), b in any::<u8>()) {
            prop_assume!(x != y);
            let mut emu = boot(&[0x60 | x, a, 0x60 | y, b, 0x80 | x, (y << 4) | 0x5]);
            run(&mut emu, 3);
            prop_assert_eq!(emu.regs.get(x), a.wrapping_sub(b));
            prop_assert_eq!(emu.regs.get(VF), (a >= b) as u8);

            let mut emu = boot(&[0x60 | x, a, 0x60 | y, b, 0x80 | x, (y << 4) | 0x7]);
            run(&mut emu, 3);
            prop_assert_eq!(emu.regs.get(x), b.wrapping_sub(a));
            prop_assert_eq!(emu.regs.get(VF), (b >= a) as u8);
        }

        #[test]
        fn shifts_flag_the_bit_shifted_out(x in 0u8..0xF, y in 0u8..0x10, a in any::<u8>(), b in any::<u8>()) {
            prop_assume!(x != y);
            let mut emu = boot(&[0x60 | x, a, 0x60 | y, b, 0x80 | x, (y << 4) | 0x6]);
            run(&mut emu, 3);
            prop_assert_eq!(emu.regs.get(x), a >> 1);
            prop_assert_eq!(emu.regs.get(VF), a & 1);

            let mut emu = boot(&[0x60 | x, a, 0x60 | y, b, 0x80 | x, (y << 4) | 0xE]);
            run(&mut emu, 3);
            prop_assert_eq!(emu.regs.get(x), a << 1);
            prop_assert_eq!(emu.regs.get(VF), a >> 7);
        }
    }
}
