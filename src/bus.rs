//! The address/data bus the CPU core drives.
//!
//! Real 6502 hardware has no `read(address)` call: the CPU places a value on
//! the address pins, then the data pins settle on the next clock edge. The
//! [`Bus`] trait mirrors that two-step shape with `set_address` followed by
//! `read`/`write`, so a `Bus` implementation can model address-dependent
//! side effects (mirroring, memory-mapped registers) exactly when real
//! hardware would see them rather than whenever the CPU happens to ask.

use crate::error::CoreError;
use crate::memory::Memory;
use crate::ppu::Ppu;

/// Anything the CPU core can be wired to.
pub trait Bus {
    /// Latches `address` for the next `read`/`write`.
    fn set_address(&mut self, address: u16);

    /// Latches a 16-bit address built from separate low/high bytes, the
    /// common case once a cycle has both halves of a pointer assembled.
    fn set_address_pair(&mut self, low: u8, high: u8) {
        self.set_address(u16::from_le_bytes([low, high]));
    }

    /// Reads the byte at the latched address.
    fn read(&mut self) -> Result<u8, CoreError>;

    /// Writes `value` at the latched address.
    fn write(&mut self, value: u8) -> Result<(), CoreError>;
}

/// A flat 64KiB address space with no mirroring or memory-mapped devices.
///
/// Used for the SingleStepTests harness and other tests that want the CPU's
/// full address range to be plain RAM.
#[derive(Debug, Clone)]
pub struct RamBus {
    memory: Memory,
    address: u16,
}

impl Default for RamBus {
    fn default() -> Self {
        Self::new()
    }
}

impl RamBus {
    pub fn new() -> Self {
        Self {
            memory: Memory::new(0x10000),
            address: 0,
        }
    }

    /// Builds a `RamBus` over caller-provided memory, e.g. one preloaded
    /// from a test vector. `memory` must be exactly 64KiB.
    pub fn with_memory(memory: Memory) -> Self {
        debug_assert_eq!(memory.size(), 0x10000, "RamBus requires a 64KiB backing store");
        Self { memory, address: 0 }
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }
}

impl Bus for RamBus {
    fn set_address(&mut self, address: u16) {
        self.address = address;
    }

    fn read(&mut self) -> Result<u8, CoreError> {
        Ok(self.memory.read(self.address))
    }

    fn write(&mut self, value: u8) -> Result<(), CoreError> {
        self.memory.write(self.address, value);
        Ok(())
    }
}

const RAM_SIZE: usize = 0x0800;
const RAM_MIRROR_END: u16 = 0x1FFF;
const PPU_REGISTER_END: u16 = 0x3FFF;

/// The NES CPU memory map: 2KiB of internal RAM mirrored four times across
/// `0x0000..=0x1FFF`, and the eight PPU registers mirrored across
/// `0x2000..=0x3FFF`. Everything from `0x4000` up (APU/IO registers,
/// cartridge space) is out of scope for this core and reads back as a
/// contract error rather than silently aliasing to RAM.
#[derive(Debug, Clone)]
pub struct NesBus {
    ram: Memory,
    ppu: Ppu,
    address: u16,
}

impl Default for NesBus {
    fn default() -> Self {
        Self::new()
    }
}

impl NesBus {
    pub fn new() -> Self {
        Self {
            ram: Memory::new(RAM_SIZE),
            ppu: Ppu::new(),
            address: 0,
        }
    }

    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    pub fn ppu_mut(&mut self) -> &mut Ppu {
        &mut self.ppu
    }

    /// Advances the attached PPU by one dot. The CPU core never calls this
    /// itself; a host driving CPU and PPU clocks together is expected to
    /// call it alongside `Cpu::step`.
    pub fn step_ppu(&mut self) {
        self.ppu.step();
    }
}

impl Bus for NesBus {
    fn set_address(&mut self, address: u16) {
        self.address = address;
    }

    fn read(&mut self) -> Result<u8, CoreError> {
        match self.address {
            0x0000..=RAM_MIRROR_END => Ok(self.ram.read(self.address % RAM_SIZE as u16)),
            0x2000..=PPU_REGISTER_END => self.ppu.bus_read((self.address % 8) as u8),
            address => {
                log::warn!("read from unmapped bus address {address:#06x}");
                Err(CoreError::InvalidBusAddress { address })
            }
        }
    }

    fn write(&mut self, value: u8) -> Result<(), CoreError> {
        match self.address {
            0x0000..=RAM_MIRROR_END => {
                self.ram.write(self.address % RAM_SIZE as u16, value);
                Ok(())
            }
            0x2000..=PPU_REGISTER_END => self.ppu.bus_write((self.address % 8) as u8, value),
            address => {
                log::warn!("write to unmapped bus address {address:#06x}");
                Err(CoreError::InvalidBusAddress { address })
            }
        }
    }
}
