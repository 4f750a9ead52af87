/*!
core::Cpu - public-facing 6502 CPU façade wrapping `CpuState`.

`Cpu` owns a single `CpuState` and exposes the host-facing entry points:
construction, `reset`, register/flag accessors, interrupt line control,
non-intrusive debugger memory access, and the disassembler. Instruction
execution itself (`step`/`emulate`) delegates to `cpu::dispatch::step`,
which operates generically over `CpuState` via the `CpuRegs` trait.
*/

use crate::bus::Bus;
use crate::cpu::observers::{Breakpoints, CdLogger};
use crate::cpu::state::{CpuState, NEGATIVE, ZERO};

#[derive(Debug, Clone)]
pub struct Cpu {
    state: CpuState,
}

impl Cpu {
    /// Construct a new CPU with power‑up defaults.
    pub fn new() -> Self {
        Self {
            state: CpuState::new(),
        }
    }

    /// Return immutable reference to internal state (for inspection / testing).
    pub fn state(&self) -> &CpuState {
        &self.state
    }

    /// Return mutable reference to internal state (temporary escape hatch).
    pub fn state_mut(&mut self) -> &mut CpuState {
        &mut self.state
    }

    /// Reset internal state and load PC from the reset vector.
    pub fn reset(&mut self, bus: &mut Bus) {
        self.state.reset(bus);
    }

    /// True if a KIL/JAM opcode has executed. BRK does NOT set this: it is a
    /// normal, resumable software interrupt, not a halt.
    pub fn is_killed(&self) -> bool {
        self.state.killed
    }

    /// Set or clear the killed flag.
    pub fn set_killed(&mut self, h: bool) {
        self.state.killed = h;
    }

    // ---------------------------------------------------------------------
    // Register accessors (read)
    // ---------------------------------------------------------------------
    pub fn a(&self) -> u8 {
        self.state.a
    }
    pub fn x(&self) -> u8 {
        self.state.x
    }
    pub fn y(&self) -> u8 {
        self.state.y
    }
    pub fn sp(&self) -> u8 {
        self.state.sp
    }
    pub fn pc(&self) -> u16 {
        self.state.pc
    }
    pub fn status(&self) -> u8 {
        self.state.status
    }

    // ---------------------------------------------------------------------
    // Register mutators (write)
    // ---------------------------------------------------------------------
    pub fn set_a(&mut self, v: u8) {
        self.state.a = v;
    }
    pub fn set_x(&mut self, v: u8) {
        self.state.x = v;
    }
    pub fn set_y(&mut self, v: u8) {
        self.state.y = v;
    }
    pub fn set_sp(&mut self, v: u8) {
        self.state.sp = v;
    }
    pub fn set_pc(&mut self, v: u16) {
        self.state.pc = v;
    }
    pub fn set_status(&mut self, v: u8) {
        self.state.status = v;
    }

    // ---------------------------------------------------------------------
    // Flag helpers
    // ---------------------------------------------------------------------
    pub fn set_flag(&mut self, mask: u8, on: bool) {
        if on {
            self.state.status |= mask;
        } else {
            self.state.status &= !mask;
        }
    }

    pub fn get_flag(&self, mask: u8) -> bool {
        (self.state.status & mask) != 0
    }

    pub fn update_zn(&mut self, v: u8) {
        self.set_flag(ZERO, v == 0);
        self.set_flag(NEGATIVE, (v & 0x80) != 0);
    }

    /// Execute one instruction (opcode fetch through retire) and return the
    /// number of bus cycles it consumed.
    pub fn step(&mut self, bus: &mut Bus) -> u32 {
        crate::cpu::dispatch::step(&mut self.state, bus)
    }

    /// Convenience: run up to `max_instructions` or until killed.
    pub fn run(&mut self, bus: &mut Bus, max_instructions: usize) {
        for _ in 0..max_instructions {
            if self.is_killed() {
                break;
            }
            self.step(bus);
        }
    }

    /// Execute one instruction like `step`, but thread a `CdLogger`/
    /// `Breakpoints` pair through the dispatcher: the opcode-fetch address is
    /// reported to `cdlog.mark_code`, and `bp.should_break` is consulted both
    /// before the fetch and (unconditionally) on a KIL/JAM opcode. A hit from
    /// either sets the `forced_break` flag polled via `forced_break`/
    /// `take_forced_break` rather than interrupting the instruction in
    /// progress (breakpoints are a parallel reporting channel, not an
    /// unwind).
    pub fn step_observed<L: CdLogger, K: Breakpoints>(
        &mut self,
        bus: &mut Bus,
        cdlog: &mut L,
        bp: &mut K,
    ) -> u32 {
        crate::cpu::dispatch::step_with_observers(&mut self.state, bus, cdlog, bp)
    }

    /// True if a breakpoint (or a KIL/JAM opcode) has signalled since the
    /// host last cleared it. Does not clear the flag; see `take_forced_break`.
    pub fn forced_break(&self) -> bool {
        self.state.forced_break()
    }

    /// Read and clear the forced-break flag in one step, the way a host
    /// polling between instructions would.
    pub fn take_forced_break(&mut self) -> bool {
        let hit = self.state.forced_break();
        self.state.set_forced_break(false);
        hit
    }

    /// Running count of cycles consumed since construction (wraps at u64::MAX).
    pub fn cycles(&self) -> u64 {
        self.state.cycles()
    }

    /// Execute instructions until at least `budget_cycles` have been consumed
    /// or the CPU halts (KIL/JAM). Returns the number of cycles actually run.
    ///
    /// Unlike `run`, which bounds by instruction count, `emulate` bounds by
    /// cycle budget so callers can step the CPU in lockstep with PPU/APU
    /// frame timing.
    pub fn emulate(&mut self, bus: &mut Bus, budget_cycles: u32) -> u32 {
        self.state.add_budget(budget_cycles as i64);
        let mut spent = 0u32;
        while self.state.budget() > 0 {
            if self.is_killed() {
                break;
            }
            spent += self.step(bus);
        }
        spent
    }

    /// Assert a maskable IRQ line from an external source (mapper expansion
    /// audio, a test harness, etc). Stays asserted until `release_irq`.
    pub fn assert_irq(&self, bus: &mut Bus) {
        bus.external_irq = true;
    }

    /// Release a previously asserted external IRQ source.
    pub fn release_irq(&self, bus: &mut Bus) {
        bus.external_irq = false;
    }

    /// Request an NMI. Edge-triggered: sets the pending latch once; the next
    /// `step`/`emulate` call will service it and clear the latch.
    pub fn assert_nmi(&self, bus: &mut Bus) {
        bus.nmi_pending = true;
    }

    /// Non-intrusive memory peek: reads RAM/PRG directly and returns 0 for
    /// register ranges ($2000-$4017) rather than triggering their read
    /// side effects (vblank clear, controller shift, etc).
    pub fn read_mem(&self, bus: &mut Bus, addr: u16) -> u8 {
        bus.peek(addr)
    }

    /// Write directly to bus-mapped memory (RAM/PRG-RAM), bypassing register
    /// side effects. Intended for debugger/tooling use, not instruction execution.
    pub fn write_mem(&self, bus: &mut Bus, addr: u16, data: u8) {
        bus.poke(addr, data);
    }

    /// Disassemble instructions starting at `addr` until `len` bytes have
    /// been consumed, returning one formatted line per instruction. Uses
    /// non-intrusive reads so it never disturbs PPU/APU register state.
    pub fn disassemble(&self, bus: &mut Bus, addr: u16, len: u16) -> Vec<String> {
        crate::cpu::disassembler::disassemble_range(bus, addr, len)
    }

    /// Disassemble a raw byte buffer (e.g. a dumped PRG image) using a CDL
    /// code/data mask: bytes whose mask entry is `false` were never fetched
    /// as an opcode during execution and are rendered as `.DB $xx` data
    /// regardless of how they happen to decode.
    pub fn disassemble_with_mask(
        &self,
        bytes: &[u8],
        opcode_mask: &[bool],
        base_addr: u16,
    ) -> Vec<String> {
        crate::cpu::disassembler::disassemble_with_mask(bytes, opcode_mask, base_addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::Cartridge;
    use crate::cpu::state::{IRQ_DISABLE, UNUSED};
    use crate::test_utils::build_nrom_with_prg;

    fn setup() -> (Cpu, Bus) {
        let rom = build_nrom_with_prg(&[0xEA], 1, 1, None);
        let cart = Cartridge::from_ines_bytes(&rom).expect("parse");
        let mut bus = Bus::new();
        bus.attach_cartridge(cart);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        (cpu, bus)
    }

    #[test]
    fn construction_and_reset() {
        let (cpu, _bus) = setup();
        assert_eq!(cpu.sp(), 0xFD);
        assert!(cpu.get_flag(IRQ_DISABLE));
        assert!(cpu.get_flag(UNUSED));
    }

    #[test]
    fn bridge_step_executes_nop() {
        let (mut cpu, mut bus) = setup();
        let pc_before = cpu.pc();
        let cycles = cpu.step(&mut bus);
        assert!(cycles >= 2);
        assert!(cpu.pc() > pc_before);
    }
}
