//! arness-cli - loads an iNES ROM, wires up `Cpu` + `Bus`, and runs it for a
//! fixed number of cycles while printing a live disassembly trace.
//!
//! This is the "config + logging + CLI" ambient surface every complete crate
//! needs; it is not part of the CPU core and exercises only the public
//! `Cpu`/`Bus`/`Cartridge` surface.

use std::env;
use std::process::ExitCode;

use arness::cpu::observers::VecCdLogger;
use arness::{Bus, Cartridge, Cpu};

const DEFAULT_BUDGET: u32 = 29_780; // roughly one NTSC video frame of CPU cycles

fn main() -> ExitCode {
    env_logger::init();

    let mut args = env::args().skip(1);
    let Some(path) = args.next() else {
        eprintln!("usage: arness-cli <rom.nes> [cycles]");
        return ExitCode::FAILURE;
    };
    let budget: u32 = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_BUDGET);

    let cart = match Cartridge::from_ines_file(&path) {
        Ok(cart) => cart,
        Err(err) => {
            log::error!("failed to load {path}: {err}");
            return ExitCode::FAILURE;
        }
    };
    log::info!(
        "loaded {path}: mapper={}, mirroring={:?}",
        cart.mapper_id(),
        cart.mirroring()
    );

    let mut bus = Bus::new();
    bus.attach_cartridge(cart);

    let mut cpu = Cpu::new();
    cpu.reset(&mut bus);

    println!("reset vector -> ${:04X}", cpu.pc());

    let mut cdlog = VecCdLogger::default();
    let mut spent = 0u32;
    while spent < budget && !cpu.is_killed() {
        let pc = cpu.pc();
        let line = cpu.disassemble(&mut bus, pc, 1);
        let cycles = cpu.step_observed(&mut bus, &mut cdlog, &mut ());
        spent += cycles;
        if let Some(line) = line.first() {
            println!(
                "{line:<24} A:{:02X} X:{:02X} Y:{:02X} SP:{:02X} P:{:02X} CYC:{}",
                cpu.a(),
                cpu.x(),
                cpu.y(),
                cpu.sp(),
                cpu.status(),
                cpu.cycles()
            );
        }
        if cpu.take_forced_break() {
            log::warn!("forced break at ${pc:04X}");
        }
    }

    if cpu.is_killed() {
        log::warn!("CPU killed (KIL/JAM) after {spent} cycles");
    }
    log::info!(
        "code/data log: {} code fetches, {} data reads recorded",
        cdlog.code.len(),
        cdlog.data.len()
    );

    ExitCode::SUCCESS
}
