//! The contract-error taxonomy surfaced by the core.
//!
//! Every variant here corresponds to a condition the simulated hardware
//! itself never reports: an invalid opcode, an out-of-range bus address, and
//! so on. None of these are "recoverable" in the sense of retrying; a host
//! that receives one should stop calling [`crate::cpu::Cpu::step`] and treat
//! it as a bug in the program being emulated or in the host's own wiring.

use thiserror::Error;

/// A contract violation detected by the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The dispatch table has no entry for this opcode byte.
    #[error("no dispatch entry for opcode {opcode:#04x}")]
    InvalidOpcode {
        /// The opcode byte that was fetched.
        opcode: u8,
    },

    /// `instruction_cycle` advanced past the known length of the current
    /// opcode's microcode.
    #[error("microcycle {cycle} is out of range for opcode {opcode:#04x}")]
    InvalidMicroCycle {
        /// The opcode whose microcode overran.
        opcode: u8,
        /// The out-of-range cycle index.
        cycle: u8,
    },

    /// A `NESBus` access landed outside the specified RAM/PPU windows.
    #[error("address {address:#06x} is not mapped on this bus")]
    InvalidBusAddress {
        /// The address that was probed.
        address: u16,
    },

    /// A `NESBus`/`Ppu` access violated the per-register read/write
    /// direction (e.g. reading PPUCTRL, writing PPUSTATUS).
    #[error("PPU register {index} does not support this access direction")]
    InvalidPPURegisterAccess {
        /// The mirrored register index (`0..=7`) that was accessed.
        index: u8,
    },

    /// `Memory::initialize_from` was asked to place more data than the
    /// buffer has room for.
    #[error("initialize_from: offset {offset} + length {length} exceeds memory size {size}")]
    MemoryBoundsViolation {
        /// The requested starting offset.
        offset: usize,
        /// The length of the data being placed.
        length: usize,
        /// The declared size of the memory buffer.
        size: usize,
    },
}
