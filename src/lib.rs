//! A cycle-accurate emulated NES version of the 6502 (2A03).
//!
//! This crate reproduces the observable behavior of the MOS 6502 as embedded
//! in the NES at the granularity of single bus cycles: every read, every
//! write, and the exact cycle each lands on. A host drives the emulation by
//! constructing a [`cpu::Cpu`] over a [`bus::Bus`] implementation and calling
//! [`cpu::Cpu::step`] once per bus cycle.
//!
//! ```
//! use nes6502::bus::{Bus, RamBus};
//! use nes6502::cpu::Cpu;
//!
//! let mut bus = RamBus::new();
//! bus.set_address(0xFFFC);
//! bus.write(0x00).unwrap();
//! bus.set_address(0xFFFD);
//! bus.write(0x80).unwrap();
//!
//! let mut cpu = Cpu::new(bus);
//! for _ in 0..5 {
//!     cpu.step().unwrap();
//! }
//! assert_eq!(cpu.state().pc, 0x8000);
//! ```

pub mod bus;
pub mod cpu;
pub mod error;
mod instruction;
pub mod memory;
pub mod ppu;
pub mod status;

/// The address the NMI vector's low byte is read from; the high byte follows
/// at `NMI_VECTOR_ADDRESS + 1`.
pub const NMI_VECTOR_ADDRESS: u16 = 0xFFFA;
/// The address the reset vector's low byte is read from.
pub const RESET_VECTOR_ADDRESS: u16 = 0xFFFC;
/// The address the IRQ/BRK vector's low byte is read from.
pub const IRQ_BRK_VECTOR_ADDRESS: u16 = 0xFFFE;
