/*!
observers.rs - Optional execution observer hooks (tracing, code/data logging, breakpoints)

Overview
========
These traits let tooling (debuggers, code-data-log generators, instruction
tracers) observe CPU execution without the dispatcher paying any cost when
nobody is listening: `()` implements all three with empty bodies, and the
methods are `#[inline]` so an unused observer compiles away entirely.

`dispatch::step`/`fallback::step` remain the zero-cost default path (both
monomorphize against `()`, so an unobserved `Cpu::step` pays nothing for
these hooks). `Cpu::step_observed`/`dispatch::step_with_observers` are the
parallel entry point that actually drives `CdLogger::mark_code` at each
opcode fetch and `Breakpoints::should_break` both pre-fetch and
(unconditionally) on a KIL/JAM opcode; `CdLogger::mark_data` is not yet
threaded into addressing-mode operand reads, a narrower follow-up than full
code marking.
*/

#![allow(dead_code)]

use crate::bus::Bus;
use crate::cpu::regs::CpuRegs;

/// Per-instruction execution trace sink.
pub trait Tracer {
    /// Called once per instruction, just before dispatch, with the opcode
    /// about to execute and the PC it was fetched from.
    #[inline]
    fn on_fetch(&mut self, _pc: u16, _opcode: u8) {}

    /// Called once per instruction after execution, with cycles consumed.
    #[inline]
    fn on_retire(&mut self, _pc: u16, _opcode: u8, _cycles: u32) {}

    /// Called when an NMI or IRQ is serviced, with the vector address used.
    #[inline]
    fn on_interrupt(&mut self, _vector: u16) {}
}

/// Code/data classification sink, as used to build a code-data log (CDL) for
/// distinguishing executed bytes from data bytes in a ROM image.
pub trait CdLogger {
    /// Mark `addr` as having been fetched and executed as an opcode.
    #[inline]
    fn mark_code(&mut self, _addr: u16) {}

    /// Mark `addr` as having been read as an instruction operand or data
    /// operand (as opposed to an opcode byte).
    #[inline]
    fn mark_data(&mut self, _addr: u16) {}
}

/// Breakpoint predicate consulted before executing an instruction.
pub trait Breakpoints {
    /// Return true if execution should stop before the instruction at `pc`.
    #[inline]
    fn should_break(&mut self, _pc: u16) -> bool {
        false
    }
}

impl Tracer for () {}
impl CdLogger for () {}
impl Breakpoints for () {}

/// Convenience no-op bundle usable anywhere a `(Tracer, CdLogger, Breakpoints)`
/// triple is expected but observation is not needed.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl Tracer for NullObserver {}
impl CdLogger for NullObserver {}
impl Breakpoints for NullObserver {}

/// A simple in-memory instruction tracer, useful for tests and CLI tooling.
#[derive(Debug, Default, Clone)]
pub struct VecTracer {
    pub entries: Vec<(u16, u8, u32)>,
}

impl Tracer for VecTracer {
    fn on_retire(&mut self, pc: u16, opcode: u8, cycles: u32) {
        self.entries.push((pc, opcode, cycles));
    }
}

/// An in-memory code/data log, useful for tests and CLI tooling: every
/// address ever fetched as an opcode or read as an operand lands in the
/// corresponding `Vec`, duplicates included.
#[derive(Debug, Default, Clone)]
pub struct VecCdLogger {
    pub code: Vec<u16>,
    pub data: Vec<u16>,
}

impl CdLogger for VecCdLogger {
    fn mark_code(&mut self, addr: u16) {
        self.code.push(addr);
    }

    fn mark_data(&mut self, addr: u16) {
        self.data.push(addr);
    }
}

/// Break when the fetch address equals a fixed PC, or on any KIL/JAM opcode
/// (the unconditional forced-break signal that bypasses this predicate).
#[derive(Debug, Clone, Copy)]
pub struct BreakOnPc(pub u16);

impl Breakpoints for BreakOnPc {
    fn should_break(&mut self, pc: u16) -> bool {
        pc == self.0
    }
}

/// Step the CPU while feeding `tracer` fetch/retire events. This is the
/// suggested integration point for tools that want tracing without modifying
/// the hot dispatch path: it peeks the opcode before stepping and reports
/// cycles after, at the cost of one extra non-intrusive read per step.
pub fn step_traced<C: CpuRegs, T: Tracer>(cpu: &mut C, bus: &mut Bus, tracer: &mut T) -> u32 {
    let pc = cpu.pc();
    let opcode = bus.peek(pc);
    tracer.on_fetch(pc, opcode);
    let cycles = crate::cpu::dispatch::step(cpu, bus);
    tracer.on_retire(pc, opcode, cycles);
    cycles
}
