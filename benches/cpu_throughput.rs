//! Throughput benchmark: emulate a mixed instruction stream for a fixed
//! cycle budget and measure wall-clock cost of `Cpu::emulate`.

use arness::{Bus, Cartridge, Cpu};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

/// A 16 KiB PRG bank exercising loads, stores, ALU ops, branches and
/// indexed addressing in a tight loop, to approximate real opcode mix
/// rather than benchmarking a single instruction in isolation.
fn build_bench_rom() -> Vec<u8> {
    let mut rom = Vec::with_capacity(16 + 16 * 1024);
    rom.extend_from_slice(b"NES\x1A");
    rom.push(1); // 16 KiB PRG
    rom.push(0); // CHR RAM
    rom.push(0); // flags6
    rom.push(0); // flags7
    rom.push(1); // 8 KiB PRG RAM
    rom.extend_from_slice(&[0u8; 7]);

    let mut prg = vec![0xEAu8; 16 * 1024];
    let loop_body: &[u8] = &[
        0xA9, 0x00, // LDA #$00
        0xA2, 0x10, // LDX #$10
        0x85, 0x10, // STA $10
        0x18, // CLC
        0x69, 0x01, // ADC #$01
        0xE8, // INX
        0xE0, 0x20, // CPX #$20
        0xD0, 0xF7, // BNE -9
        0x4C, 0x00, 0x80, // JMP $8000
    ];
    prg[0..loop_body.len()].copy_from_slice(loop_body);

    let base = 0x3FFA;
    // RESET/NMI/IRQ all point at $8000; the loop never halts, so `emulate`
    // is bounded purely by the cycle budget passed to it.
    prg[base] = 0x00;
    prg[base + 1] = 0x80; // NMI
    prg[base + 2] = 0x00;
    prg[base + 3] = 0x80; // RESET
    prg[base + 4] = 0x00;
    prg[base + 5] = 0x80; // IRQ

    rom.extend_from_slice(&prg);
    rom
}

fn cpu_emulate_benchmark(c: &mut Criterion) {
    let rom = build_bench_rom();

    c.bench_function("emulate_one_frame_budget", |b| {
        b.iter(|| {
            let cart = Cartridge::from_ines_bytes(&rom).expect("valid bench rom");
            let mut bus = Bus::new();
            bus.attach_cartridge(cart);
            let mut cpu = Cpu::new();
            cpu.reset(&mut bus);
            let spent = cpu.emulate(&mut bus, black_box(29_780));
            black_box(spent)
        });
    });
}

criterion_group!(benches, cpu_emulate_benchmark);
criterion_main!(benches);
