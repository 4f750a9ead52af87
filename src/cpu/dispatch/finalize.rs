/*!
finalize.rs - centralized instruction finalization & trivial/unknown opcode handling.

Consolidates:
  1. `finalize_and_tick`: applies the RMW tick adjustment and drives bus
     cycle ticking uniformly for every dispatch path.
  2. `handle_trivial_or_unknown`: NOP (0xEA) does nothing but finalize
     timing; the twelve true KIL/JAM opcodes set `cpu.killed = true` and
     signal a forced breakpoint (spec.md §4.4/§7) after consuming their
     baseline cycles. Every other byte value has documented or
     undocumented semantics handled by a family handler before dispatch
     reaches this fallback.

RMW opcodes internally perform extra micro-operations (read -> dummy
write -> final write). Externally the documented cycle count is still
reported, but only `cycles - 2` is ticked against the bus, since the RMW
helper itself already ticked the two dummy cycles.

Neither function computes base cycle counts, applies page-cross/branch
penalties, or mutates PC — those happen before `finalize_and_tick` is
called.
*/

use crate::bus::Bus;
use crate::cpu::cycles::is_rmw;
use crate::cpu::observers::Breakpoints;
use crate::cpu::regs::CpuRegs;

/// Apply the unified finalization policy:
/// - Adjust ticked cycles for RMW opcodes (subtract 2).
/// - Tick the bus exactly once for the instruction.
/// - Return the externally visible *original* cycle count.
///
/// Parameters:
/// - `opcode`: The opcode just executed.
/// - `cycles`: Total externally reported cycles (base + any dynamic penalties).
/// - `bus`:    System bus (ticked here).
///
/// Returns:
/// - The same `cycles` value passed in (unmodified).
pub(crate) fn finalize_and_tick(opcode: u8, cycles: u32, bus: &mut Bus) -> u32 {
    let tick_cycles = if is_rmw(opcode) {
        cycles.saturating_sub(2)
    } else {
        cycles
    };
    bus.tick(tick_cycles);
    cycles
}

/// Handle trivial (NOP) or unknown opcodes and finalize timing.
///
/// Assumptions:
/// - PC has already advanced past opcode.
/// - `cycles` is the fully computed external cycle count (base + penalties).
/// - Caller wants a single place to apply RMW adjustment + bus ticking.
///
/// Behavior:
/// - 0xEA (NOP): no state mutation.
/// - Any other opcode: mark CPU killed (unknown/unimplemented).
///
/// Returns:
/// - The externally reported cycle count (unchanged).
/// The 12 true KIL/JAM opcodes: on real hardware these lock the data/address
/// bus and the CPU never fetches another instruction. We model that as
/// `killed = true` rather than attempting to resume.
pub(crate) const KIL_OPCODES: [u8; 12] = [
    0x02, 0x12, 0x22, 0x32, 0x42, 0x52, 0x62, 0x72, 0x92, 0xB2, 0xD2, 0xF2,
];

#[inline]
pub(crate) fn is_kil(opcode: u8) -> bool {
    KIL_OPCODES.contains(&opcode)
}

/// `bp` is consulted on a KIL/JAM hit as the "signal a forced breakpoint"
/// channel spec.md §4.4/§7 requires: the call happens unconditionally (its
/// return value doesn't gate anything, since a KIL always forces the break),
/// and `forced_break` is set on `cpu` regardless so a host with a no-op
/// `Breakpoints` still observes the halt via `Cpu::forced_break`.
pub(crate) fn handle_trivial_or_unknown<C: CpuRegs, K: Breakpoints>(
    opcode: u8,
    cpu: &mut C,
    bus: &mut Bus,
    cycles: u32,
    bp: &mut K,
) -> u32 {
    if is_kil(opcode) {
        cpu.set_killed(true);
        bp.should_break(cpu.pc());
        cpu.set_forced_break(true);
    }
    finalize_and_tick(opcode, cycles, bus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::Cartridge;
    use crate::cpu::core::Cpu;
    use crate::cpu::cycles::base_cycles;
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
    fn nop_trivial_not_killed() {
        let (mut cpu, mut bus) = setup(&[0xEA, 0x00]);
        let opcode = bus.read(cpu.pc());
        assert_eq!(opcode, 0xEA);
        cpu.set_pc(cpu.pc().wrapping_add(1));
        let cycles = base_cycles(opcode);
        let mut bp = ();
        let reported =
            handle_trivial_or_unknown(opcode, cpu.state_mut(), &mut bus, cycles, &mut bp);
        assert_eq!(reported, cycles);
        assert!(!cpu.is_killed());
        assert!(!cpu.take_forced_break());
    }

    #[test]
    fn unknown_opcode_kills_and_signals_forced_break() {
        let (mut cpu, mut bus) = setup(&[0x02, 0x00]);
        let opcode = bus.read(cpu.pc());
        assert_eq!(opcode, 0x02);
        cpu.set_pc(cpu.pc().wrapping_add(1));
        let cycles = base_cycles(opcode); // default 2
        let mut bp = ();
        let reported =
            handle_trivial_or_unknown(opcode, cpu.state_mut(), &mut bus, cycles, &mut bp);
        assert_eq!(reported, cycles);
        assert!(cpu.is_killed());
        assert!(cpu.take_forced_break());
    }

    #[test]
    fn rmw_adjustment_ticks_cycles_minus_two() {
        // Use an RMW opcode (e.g., 0xE6 INC zp).
        let (mut cpu, mut bus) = setup(&[0xE6, 0x10, 0x00]);
        let opcode = bus.read(cpu.pc());
        assert_eq!(opcode, 0xE6);
        cpu.set_pc(cpu.pc().wrapping_add(1));
        let cycles = base_cycles(opcode); // 5
        // We simulate "post-execution" finalization only; no actual INC performed here.
        let before_ticks = bus.total_ticks();
        let reported = finalize_and_tick(opcode, cycles, &mut bus);
        let after_ticks = bus.total_ticks();
        assert_eq!(reported, cycles);
        assert_eq!(after_ticks - before_ticks, (cycles - 2) as u64);
    }
}
