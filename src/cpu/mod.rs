//! The cycle-sliced 6502 core: registers, mode machine, and the single
//! `step()` entry point a host drives once per bus cycle.

pub(crate) mod microcode;

use crate::bus::Bus;
use crate::error::CoreError;
use crate::instruction::OpcodeEntry;
use crate::status::ProcessorStatus;
use crate::{IRQ_BRK_VECTOR_ADDRESS, NMI_VECTOR_ADDRESS, RESET_VECTOR_ADDRESS};

/// Which of the four microcode sequences `step()` is currently running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Reset,
    Run,
    Nmi,
    Irq,
}

/// A snapshot of the architecturally visible registers, for tests and
/// debuggers. Scratch state (ADL/ADH/IR/mode/instruction_cycle) is
/// deliberately absent — it isn't part of the processor's contract with the
/// outside world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct CpuState {
    pub pc: u16,
    pub s: u8,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub p: u8,
}

/// The 6502/2A03 core, generic over the bus it's wired to.
///
/// `Cpu` owns no memory itself; every read and write is a call into `B`.
/// Construct one with [`Cpu::new`], then call [`Cpu::step`] once per bus
/// cycle. The CPU begins life in [`Mode::Reset`], so the first five `step()`
/// calls always run the power-on sequence before any instruction executes.
#[allow(clippy::upper_case_acronyms)]
pub struct Cpu<B: Bus> {
    bus: B,

    pc: u16,
    sp: u8,
    a: u8,
    x: u8,
    y: u8,
    status: ProcessorStatus,

    mode: Mode,
    instruction_cycle: u8,
    interrupt_cycle: u8,

    ir: u8,
    decoded: Option<OpcodeEntry>,
    adl: u8,
    adh: u8,
    op_latch: u8,
    page_crossed: bool,

    nmi_pending: bool,
    irq_pending: bool,
}

impl<B: Bus> Cpu<B> {
    /// Constructs a CPU bound to `bus`, in [`Mode::Reset`].
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            pc: 0,
            sp: 0,
            a: 0,
            x: 0,
            y: 0,
            status: ProcessorStatus::new(),
            mode: Mode::Reset,
            instruction_cycle: 0,
            interrupt_cycle: 0,
            ir: 0,
            decoded: None,
            adl: 0,
            adh: 0,
            op_latch: 0,
            page_crossed: false,
            nmi_pending: false,
            irq_pending: false,
        }
    }

    /// Re-enters the 5-cycle reset sequence. `A`/`X`/`Y` survive; everything
    /// else (status, scratch state, pending interrupts) is re-derived by the
    /// sequence itself over the next five `step()` calls.
    pub fn reset(&mut self) {
        self.mode = Mode::Reset;
        self.instruction_cycle = 0;
    }

    /// Latches a pending NMI. Serviced the next time `step()` samples
    /// interrupts (`instruction_cycle == 0` in `Mode::Run`); cannot be
    /// masked by the interrupt-disable flag.
    pub fn signal_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Latches a pending IRQ. Serviced like NMI, but only if the
    /// interrupt-disable flag is clear at the moment of sampling.
    pub fn signal_irq(&mut self) {
        self.irq_pending = true;
    }

    /// A snapshot of the architectural register file.
    pub fn state(&self) -> CpuState {
        CpuState {
            pc: self.pc,
            s: self.sp,
            a: self.a,
            x: self.x,
            y: self.y,
            p: self.status.bits(),
        }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Advances the CPU by one bus cycle.
    pub fn step(&mut self) -> Result<(), CoreError> {
        match self.mode {
            Mode::Reset => self.step_reset(),
            Mode::Run => self.step_run(),
            Mode::Nmi | Mode::Irq => microcode::step_interrupt(self),
        }
    }

    fn step_reset(&mut self) -> Result<(), CoreError> {
        match self.instruction_cycle {
            0 => {
                self.status = ProcessorStatus::new();
                self.ir = 0;
                self.decoded = None;
                self.adl = 0;
                self.adh = 0;
                self.op_latch = 0;
                self.page_crossed = false;
                self.instruction_cycle = 1;
                Ok(())
            }
            1 => {
                self.sp = 0xFD;
                self.status.set_interrupt_disable(true);
                self.status.set_unused(true);
                self.instruction_cycle = 2;
                Ok(())
            }
            2 => {
                self.bus.set_address(RESET_VECTOR_ADDRESS);
                self.adl = self.bus.read()?;
                self.instruction_cycle = 3;
                Ok(())
            }
            3 => {
                self.bus.set_address(RESET_VECTOR_ADDRESS.wrapping_add(1));
                self.adh = self.bus.read()?;
                self.instruction_cycle = 4;
                Ok(())
            }
            4 => {
                self.pc = u16::from_le_bytes([self.adl, self.adh]);
                self.mode = Mode::Run;
                self.instruction_cycle = 0;
                Ok(())
            }
            cycle => Err(CoreError::InvalidMicroCycle { opcode: 0, cycle }),
        }
    }

    fn step_run(&mut self) -> Result<(), CoreError> {
        if self.instruction_cycle != 0 {
            return microcode::step_instruction(self);
        }

        if self.nmi_pending {
            self.nmi_pending = false;
            self.mode = Mode::Nmi;
            self.interrupt_cycle = 0;
            return microcode::step_interrupt(self);
        }
        if self.irq_pending && !self.status.interrupt_disable() {
            self.irq_pending = false;
            self.mode = Mode::Irq;
            self.interrupt_cycle = 0;
            return microcode::step_interrupt(self);
        }

        self.bus.set_address(self.pc);
        let opcode = self.bus.read()?;
        self.pc = self.pc.wrapping_add(1);
        self.ir = opcode;
        self.decoded =
            Some(crate::instruction::decode(opcode).ok_or(CoreError::InvalidOpcode { opcode })?);
        self.instruction_cycle = 1;
        Ok(())
    }

    fn interrupt_vector(&self) -> u16 {
        match self.mode {
            Mode::Nmi => NMI_VECTOR_ADDRESS,
            Mode::Irq => IRQ_BRK_VECTOR_ADDRESS,
            _ => unreachable!("interrupt_vector called outside Nmi/Irq mode"),
        }
    }

    fn push(&mut self, byte: u8) -> Result<(), CoreError> {
        self.bus.set_address(0x0100 | self.sp as u16);
        self.bus.write(byte)?;
        self.sp = self.sp.wrapping_sub(1);
        Ok(())
    }

    /// Bumps SP and reads the new top of stack: the common "pull" shape used
    /// by PLA/PLP/RTS/RTI, each of which increments SP before reading.
    fn bump_and_pull(&mut self) -> Result<u8, CoreError> {
        self.sp = self.sp.wrapping_add(1);
        self.bus.set_address(0x0100 | self.sp as u16);
        self.bus.read()
    }

    /// A dummy read at the current top of stack, without moving SP. Used for
    /// the "increment S" cycle that real hardware spends peeking the stack
    /// before the first pull.
    fn peek_stack(&mut self) -> Result<u8, CoreError> {
        self.bus.set_address(0x0100 | self.sp as u16);
        self.bus.read()
    }

    /// Moves to the next microcycle of the current instruction.
    fn advance(&mut self) {
        self.instruction_cycle += 1;
    }

    /// Marks the current instruction complete; the next `step()` fetches.
    fn finish(&mut self) {
        self.instruction_cycle = 0;
    }

    fn invalid_cycle(&self, cycle: u8) -> CoreError {
        CoreError::InvalidMicroCycle {
            opcode: self.ir,
            cycle,
        }
    }

    // --- Test-hook setters ---------------------------------------------
    //
    // Direct register/scratch-state setters for unit and conformance tests.
    // Production hosts have no reason to call these; they exist to put the
    // CPU into an arbitrary architectural state without stepping it there.

    pub fn set_program_counter(&mut self, pc: u16) {
        self.pc = pc;
    }

    pub fn set_stack_pointer(&mut self, sp: u8) {
        self.sp = sp;
    }

    pub fn set_accumulator(&mut self, a: u8) {
        self.a = a;
    }

    pub fn set_x(&mut self, x: u8) {
        self.x = x;
    }

    pub fn set_y(&mut self, y: u8) {
        self.y = y;
    }

    pub fn set_status_bits(&mut self, p: u8) {
        self.status.set_bits(p);
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn set_instruction_cycle(&mut self, cycle: u8) {
        self.instruction_cycle = cycle;
    }

    /// Reads a byte directly off the stack page without disturbing SP,
    /// for asserting pushed bytes in tests.
    pub fn peek_stack_at(&mut self, sp: u8) -> Result<u8, CoreError> {
        self.bus.set_address(0x0100 | sp as u16);
        self.bus.read()
    }

    pub fn from_state(state: CpuState, bus: B) -> Self {
        let mut cpu = Self::new(bus);
        cpu.pc = state.pc;
        cpu.sp = state.s;
        cpu.a = state.a;
        cpu.x = state.x;
        cpu.y = state.y;
        cpu.status.set_bits(state.p);
        cpu.mode = Mode::Run;
        cpu.instruction_cycle = 0;
        cpu
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::RamBus;

    fn reset_cpu(mut cpu: Cpu<RamBus>) -> Cpu<RamBus> {
        for _ in 0..5 {
            cpu.step().unwrap();
        }
        cpu
    }

    #[test]
    fn reset_sequence_produces_documented_register_values() {
        let mut bus = RamBus::new();
        bus.set_address(RESET_VECTOR_ADDRESS);
        bus.write(0x00).unwrap();
        bus.set_address(RESET_VECTOR_ADDRESS.wrapping_add(1));
        bus.write(0x80).unwrap();

        let mut cpu = Cpu::new(bus);
        cpu.set_accumulator(0x11);
        cpu.set_x(0x22);
        cpu.set_y(0x33);
        let cpu = reset_cpu(cpu);

        let state = cpu.state();
        assert_eq!(state.s, 0xFD);
        assert_eq!(state.p, 0b0010_0100);
        assert_eq!(state.pc, 0x8000);
        assert_eq!(state.a, 0x11);
        assert_eq!(state.x, 0x22);
        assert_eq!(state.y, 0x33);
    }

    #[test]
    fn lda_absolute_loads_and_sets_negative() {
        let mut bus = RamBus::new();
        bus.set_address(0x0000);
        bus.write(0xAD).unwrap();
        bus.set_address(0x0001);
        bus.write(0x34).unwrap();
        bus.set_address(0x0002);
        bus.write(0x12).unwrap();
        bus.set_address(0x1234);
        bus.write(0x80).unwrap();

        let mut cpu = Cpu::new(bus);
        cpu.set_mode(Mode::Run);
        cpu.set_instruction_cycle(0);

        for _ in 0..4 {
            cpu.step().unwrap();
        }

        let state = cpu.state();
        assert_eq!(state.a, 0x80);
        assert_eq!(state.p & 0x02, 0);
        assert_eq!(state.p & 0x80, 0x80);
        assert_eq!(state.pc, 0x0003);
    }

    #[test]
    fn jsr_then_rts_restores_pc_and_stack() {
        let mut bus = RamBus::new();
        for (address, byte) in [(0x0000u16, 0x20u8), (0x0001, 0xA0), (0x0002, 0x00)] {
            bus.set_address(address);
            bus.write(byte).unwrap();
        }
        bus.set_address(0x00A0);
        bus.write(0x60).unwrap();

        let mut cpu = Cpu::new(bus);
        cpu.set_mode(Mode::Run);
        cpu.set_stack_pointer(0xFD);

        for _ in 0..12 {
            cpu.step().unwrap();
        }

        let state = cpu.state();
        assert_eq!(state.pc, 0x0003);
        assert_eq!(state.s, 0xFD);
    }

    #[test]
    fn invalid_opcode_surfaces_as_contract_error() {
        let mut bus = RamBus::new();
        bus.set_address(0x0000);
        bus.write(0x02).unwrap();

        let mut cpu = Cpu::new(bus);
        cpu.set_mode(Mode::Run);

        let err = cpu.step().unwrap_err();
        assert_eq!(err, CoreError::InvalidOpcode { opcode: 0x02 });
    }
}
