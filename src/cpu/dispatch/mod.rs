/*!
dispatch.rs - Orchestrator for a single 6502 CPU step (DMA / interrupts / dispatch)

Overview
========
Coordinates a single CPU instruction step:
1. Handles OAM DMA stall (burn 1 cycle; no opcode fetch).
2. Services pending NMI or maskable IRQ (7-cycle interrupt entry).
3. Dispatches through the family-handler chain for every documented and
   undocumented opcode, falling back to `finalize::handle_trivial_or_unknown`
   for NOP and the twelve KIL/JAM opcodes.

Architecture
============
- Orchestrator: resolves pre-instruction concerns (DMA, interrupts) and
  delegates instruction execution to the fallback dispatcher.
- Dispatcher (`dispatch::fallback::step`): performs opcode fetch, runs the
  family handler chain (load/store, logical, arithmetic, compare, branches,
  rmw, control_flow, misc, illegal), and delegates finalization (RMW
  adjustment + bus tick) to `finalize::finalize_and_tick` or
  `finalize::handle_trivial_or_unknown` for NOP / KIL.

Cycle Ticking
=============
- DMA & interrupt paths tick cycles directly here.
- The dispatcher ticks once in its own finalizer (after RMW adjustment).

Design Notes
============
- Only the twelve true KIL/JAM opcodes halt; every other opcode value
  (documented or undocumented) has a family handler.
*/

#![allow(dead_code)]

use crate::bus::Bus;
pub(crate) mod arithmetic;
pub(crate) mod branches;
pub(crate) mod compare; // extracted compare (CMP/CPX/CPY) opcode family handler
pub(crate) mod control_flow;
mod fallback; // match-based opcode fetch/decode/execute dispatcher
pub(crate) mod finalize; // centralized finalization & trivial/unknown opcode handling
pub(crate) mod illegal; // undocumented opcode family handler
pub(crate) mod load_store; // extracted load/store family handler
pub(crate) mod logical;
pub(crate) mod misc;
pub(crate) mod rmw; // extracted RMW / shift / INC / DEC opcode family handler
use crate::cpu::execute::{
    push_status_with_break,
    push_word,
    set_flag, // for interrupt handling
};
use crate::cpu::observers::{Breakpoints, CdLogger};
use crate::cpu::regs::CpuRegs;
use crate::cpu::state::IRQ_DISABLE;

/// Execute one CPU step (including DMA stall / interrupts) and return cycles consumed.
///
/// IRQ recognition is polled through a two-stage shadow (`CpuRegs::irq_poll_disabled`)
/// rather than the live `IRQ_DISABLE` flag: real 6502/2A03 hardware samples the I
/// flag's value from *before* the instruction that is about to retire, which is why
/// an IRQ pending immediately after `CLI` is not taken until the instruction after
/// the one immediately following it. `advance_irq_poll` shifts that shadow forward
/// once per step, on every code path, so the one-instruction latency holds uniformly.
pub(crate) fn step<C: CpuRegs>(cpu: &mut C, bus: &mut Bus) -> u32 {
    step_with_observers(cpu, bus, &mut (), &mut ())
}

/// Same sequencing as `step`, but threads a `CdLogger`/`Breakpoints` pair
/// down into the fallback dispatcher so `cdlog.mark_code` and
/// `bp.should_break` actually observe the opcode-dispatch path (DMA stall and
/// interrupt entry are not instruction fetches, so neither hook fires for
/// them). Monomorphizes to the same code as `step` when both are `()`.
pub(crate) fn step_with_observers<C: CpuRegs, L: CdLogger, K: Breakpoints>(
    cpu: &mut C,
    bus: &mut Bus,
    cdlog: &mut L,
    bp: &mut K,
) -> u32 {
    // 1. OAM DMA stall: burn one cycle and return (no opcode consumed)
    if bus.dma_is_active() {
        bus.tick(1);
        return 1;
    }

    // 2. Non-maskable interrupt (NMI)
    if bus.nmi_pending {
        service_interrupt(cpu, bus, 0xFFFA);
        bus.nmi_pending = false;
        cpu.advance_irq_poll();
        // 7 cycles already ticked in service_interrupt
        return 7;
    }

    // 3. Maskable IRQ (line asserted & I flag clear, sampled with CLI/SEI/PLP latency)
    if bus.irq_line && !cpu.irq_poll_disabled() {
        service_interrupt(cpu, bus, 0xFFFE);
        cpu.advance_irq_poll();
        // 7 cycles already ticked
        return 7;
    }

    // 4. Opcode dispatch: fallback dispatcher owns full fetch/decode/execute
    let cycles = fallback::step_with_observers(cpu, bus, cdlog, bp);
    cpu.advance_irq_poll();
    cycles
}

/// Common interrupt entry sequence (push PC, status with Break=0; set I; load vector).
/// Ticks 7 cycles (interrupt entry timing).
fn service_interrupt<C: CpuRegs>(cpu: &mut C, bus: &mut Bus, vector_addr: u16) {
    // Push current PC
    let current_pc = cpu.pc();
    push_word(cpu, bus, current_pc);
    // Push processor status with Break flag cleared
    push_status_with_break(cpu, bus, false);
    // Set Interrupt Disable
    set_flag(cpu, IRQ_DISABLE, true);
    // Keep the CLI-latency shadow in sync with the flag we just forced on,
    // so a nested IRQ immediately after this one is correctly held off.
    cpu.sync_irq_poll();
    // Load new PC from vector
    let new_pc = bus.read_word(vector_addr);
    cpu.set_pc(new_pc);
    // Total cycles: 7 (lump-sum interrupt entry)
    bus.tick(7);
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
    fn nmi_preempts_opcode() {
        let (mut cpu, mut bus) = setup(&[0xEA, 0x00]); // NOP; BRK
        bus.nmi_pending = true;
        let cycles = crate::cpu::dispatch::step(cpu.state_mut(), &mut bus);
        assert_eq!(cycles, 7);
    }

    #[test]
    fn fallback_step_executes_nop() {
        let (mut cpu, mut bus) = setup(&[0xEA, 0x00]); // NOP; BRK
        let pc_before = cpu.pc();
        let cycles = crate::cpu::dispatch::step(cpu.state_mut(), &mut bus);
        assert!(cycles >= 2); // NOP is 2 cycles (table or fallback)
        assert!(cpu.pc() > pc_before);
    }

    #[test]
    fn irq_mask_respected() {
        let (mut cpu, mut bus) = setup(&[0xEA, 0x00]);
        // Assert IRQ line but leave I flag set from reset (IRQ ignored)
        bus.irq_line = true;
        let c1 = crate::cpu::dispatch::step(cpu.state_mut(), &mut bus); // Should just execute NOP
        assert!(c1 >= 2);
    }
}
