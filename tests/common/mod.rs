//! Minimal iNES (v1) builder shared by the integration test suite.
//!
//! Integration tests link against the crate's normal (non-`cfg(test)`) build,
//! so `arness::test_utils` isn't available here; this is a small, independent
//! copy of just what these tests need.

use arness::{Bus, Cartridge, Cpu};

pub fn build_nrom_with_prg(prg: &[u8], vectors: Option<(u16, u16, u16)>) -> Vec<u8> {
    assert!(prg.len() <= 16 * 1024);

    let mut rom = Vec::with_capacity(16 + 16 * 1024);
    rom.extend_from_slice(b"NES\x1A");
    rom.push(1); // 1x 16KiB PRG
    rom.push(0); // CHR RAM
    rom.push(0); // flags6
    rom.push(0); // flags7
    rom.push(1); // 8KiB PRG RAM
    rom.extend_from_slice(&[0u8; 7]);
    rom.extend(std::iter::repeat(0u8).take(16 * 1024));

    let prg_start = 16;
    rom[prg_start..prg_start + prg.len()].copy_from_slice(prg);

    let (reset, nmi, irq) = vectors.unwrap_or((0x8000, 0x8000, 0x8000));
    let base = prg_start + 0x3FFA;
    rom[base] = (nmi & 0xFF) as u8;
    rom[base + 1] = (nmi >> 8) as u8;
    rom[base + 2] = (reset & 0xFF) as u8;
    rom[base + 3] = (reset >> 8) as u8;
    rom[base + 4] = (irq & 0xFF) as u8;
    rom[base + 5] = (irq >> 8) as u8;

    rom
}

pub fn setup(prg: &[u8]) -> (Cpu, Bus) {
    setup_with_vectors(prg, None)
}

pub fn setup_with_vectors(prg: &[u8], vectors: Option<(u16, u16, u16)>) -> (Cpu, Bus) {
    let rom = build_nrom_with_prg(prg, vectors);
    let cart = Cartridge::from_ines_bytes(&rom).expect("valid iNES image");
    let mut bus = Bus::new();
    bus.attach_cartridge(cart);
    let mut cpu = Cpu::new();
    cpu.reset(&mut bus);
    (cpu, bus)
}
