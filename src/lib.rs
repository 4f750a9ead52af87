#![doc = r#"
arness - a cycle-accurate 2A03/6502 CPU core, plus the narrow NES
collaborators (bus, PPU, APU, mapper, controller) it runs against.

Modules:
- apu: APU register stub and basic frame IRQ behavior
- bus: Bus facade coordinating CPU/PPU/APU/controllers and timing
- cartridge: iNES v1 loader and cartridge metadata; constructs a Mapper
- controller: NES controller abstraction
- cpu: cycle-accurate 6502/2A03 CPU core (documented + undocumented opcodes)
- mapper / mappers: Mapper trait and NROM/CNROM/MMC1/MMC3 implementations
- ppu: PPU register interface, OAM handling, timing, and rendering

In tests, shared iNES builders are available under `crate::test_utils`.
"#]

// Core emulator modules
pub mod apu;
pub mod bus;
pub mod cartridge;
pub mod controller;
pub mod cpu;
pub mod mapper;
pub mod mappers;
pub mod ppu;

// Re-export commonly used types at the crate root for convenience.
pub use bus::{Bus, Region};
pub use cartridge::{Cartridge, CartridgeError};
pub use cpu::Cpu;

// Shared test utilities (only compiled for tests)
#[cfg(test)]
pub mod test_utils;
