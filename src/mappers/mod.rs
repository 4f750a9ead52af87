/*
Module: mappers

Slimmed dispatcher module: declares mapper submodules and re-exports their
public types. Concrete implementations live in their own files for clarity.

Implemented:
- CNROM (Mapper 3)
- MMC1 (Mapper 1)
- MMC3 (Mapper 4), including scanline IRQ counter

*/

pub mod cnrom;
pub mod mmc1;
pub mod mmc3;

pub use cnrom::Cnrom;
pub use mmc1::Mmc1;
pub use mmc3::Mmc3;
