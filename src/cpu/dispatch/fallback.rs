/*!
fallback.rs - opcode fetch/decode/execute dispatcher

Responsibilities:
1. Fetch the opcode and advance PC.
2. Derive baseline cycle count via `base_cycles(opcode)`.
3. Invoke the opcode family handlers in turn (load/store, logical,
   arithmetic, compare, branches, rmw, control_flow, misc, illegal);
   each may mutate `cycles` (page-cross penalties, BRK override, etc.)
   but must not tick the bus itself.
4. Any opcode no family handler claims falls through to
   `finalize::handle_trivial_or_unknown` (NOP, or halt on a true
   unknown/KIL opcode).

Finalization is delegated to `finalize::finalize_and_tick` (RMW cycle
adjustment happens there).
*/

use crate::bus::Bus;
use crate::cpu::regs::CpuRegs;
// Shared modular helpers
use crate::cpu::cycles::base_cycles;
use crate::cpu::dispatch::finalize::{finalize_and_tick, handle_trivial_or_unknown};
use crate::cpu::execute::{dex, dey, inx, iny};
use crate::cpu::observers::{Breakpoints, CdLogger};
use crate::cpu::state::Phase;
/// Finalization now delegated to `fallback_final` (no local duplicate helper).

/// Execute one instruction using the match-based fallback dispatcher (post-interrupt / DMA already handled).
/// Returns the total cycles consumed (including penalties).
pub(crate) fn step<C: CpuRegs>(cpu: &mut C, bus: &mut Bus) -> u32 {
    step_with_observers(cpu, bus, &mut (), &mut ())
}

/// Same dispatch as `step`, additionally reporting the opcode-fetch address
/// to `cdlog.mark_code` and consulting `bp.should_break` both before the
/// fetch and (unconditionally, via `finalize::handle_trivial_or_unknown`) on
/// a KIL/JAM opcode. A breakpoint hit sets `cpu`'s `forced_break` flag rather
/// than aborting the instruction in progress.
pub(crate) fn step_with_observers<C: CpuRegs, L: CdLogger, K: Breakpoints>(
    cpu: &mut C,
    bus: &mut Bus,
    cdlog: &mut L,
    bp: &mut K,
) -> u32 {
    // Fetch opcode (interrupts & DMA already handled by orchestrator)
    cpu.set_sync(true);
    cpu.set_phase(Phase::Fetch0);
    let pc = cpu.pc();
    if bp.should_break(pc) {
        cpu.set_forced_break(true);
    }
    let opcode = bus.read(pc);
    cdlog.mark_code(pc);
    cpu.advance_pc_one();
    cpu.set_sync(false);
    cpu.set_phase(Phase::Execute);

    let mut cycles = base_cycles(opcode);
    // Early dispatch: extracted families (load/store, logical, arithmetic, compare, branches, rmw, control_flow, misc)
    if super::load_store::handle(opcode, cpu, bus, &mut cycles)
        || super::logical::handle(opcode, cpu, bus, &mut cycles)
        || super::arithmetic::handle(opcode, cpu, bus, &mut cycles)
        || super::compare::handle(opcode, cpu, bus, &mut cycles)
        || super::branches::handle(opcode, cpu, bus, &mut cycles)
        || super::rmw::handle(opcode, cpu, bus, &mut cycles)
        || super::control_flow::handle(opcode, cpu, bus, &mut cycles)
        || super::misc::handle(opcode, cpu, bus, &mut cycles)
        || super::illegal::handle(opcode, cpu, bus, &mut cycles)
    {
        // Finalize via shared helper in finalize (removes local duplication)
        return finalize_and_tick(opcode, cycles, bus);
    }

    // Everything else routes through a family handler above; only bare
    // register increment/decrement and NOP/unknown remain here.
    match opcode {
        0xE8 => inx(cpu),
        0xC8 => iny(cpu),
        0xCA => dex(cpu),
        0x88 => dey(cpu),

        0xEA => return handle_trivial_or_unknown(opcode, cpu, bus, cycles, bp),

        _ => return handle_trivial_or_unknown(opcode, cpu, bus, cycles, bp),
    }

    finalize_and_tick(opcode, cycles, bus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::Cartridge;
    use crate::cpu::core::Cpu;
    use crate::test_utils::build_nrom_with_prg;

    fn setup(prg: &[u8]) -> (Cpu, Bus) {
        let rom = build_nrom_with_prg(prg, 1, 1, None);
        let cart = Cartridge::from_ines_bytes(&rom).expect("parse");
        let mut bus = Bus::new();
        bus.attach_cartridge(cart);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        (cpu, bus)
    }

    #[test]
    fn lda_abs_x_page_cross_cycles_match() {
        // Program: LDX #$01; LDA $12FF,X; BRK
        let (mut cpu, mut bus) = setup(&[0xA2, 0x01, 0xBD, 0xFF, 0x12, 0x00]);
        // LDX
        let c1 = cpu.step(&mut bus);
        assert_eq!(c1, 2);
        // LDA abs,X page cross
        let c2 = cpu.step(&mut bus);
        assert_eq!(c2, 5);
    }

    #[test]
    fn branch_taken_page_cross_cycles() {
        // Place branch near page boundary to force crossing
        let mut prg = vec![];
        prg.extend(std::iter::repeat(0xEA).take(0x00FF)); // fill to $80FF with NOP
        prg.push(0x18); // CLC
        prg.push(0x90); // BCC
        prg.push(0x01); // +1 -> crosses
        prg.push(0xEA);
        prg.push(0x00); // BRK
        let (mut cpu, mut bus) = setup(&prg);
        for _ in 0..0x00FF {
            assert_eq!(cpu.step(&mut bus), 2);
        }
        assert_eq!(cpu.step(&mut bus), 2); // CLC
        assert_eq!(cpu.step(&mut bus), 4); // BCC taken + page cross
    }
}
