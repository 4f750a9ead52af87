/*!
logical.rs - Logical and bit-test opcode family handler

Overview
========
Handles the 6502 logical and bit-test instructions:

AND: 0x29, 0x25, 0x35, 0x2D, 0x3D*, 0x39*, 0x21, 0x31*
ORA: 0x09, 0x05, 0x15, 0x0D, 0x1D*, 0x19*, 0x01, 0x11*
EOR: 0x49, 0x45, 0x55, 0x4D, 0x5D*, 0x59*, 0x41, 0x51*
BIT: 0x24, 0x2C

(*) Page‑cross aware addressing helpers return (addr, crossed); this handler
    adds a +1 cycle penalty on documented read modes when page boundaries are crossed.

Responsibilities
================
- Decode and execute logical / bit-test opcodes.
- Update accumulator or flags (via execute helpers) as required.
- Apply page-cross penalties by mutating *cycles (loads only).
- Never tick the bus (the fallback dispatcher finalizes timing).
- Never perform RMW adjustments (none of these opcodes are RMW).

Caller Requirements
===================
The caller (fallback dispatcher) must:
- Fetch the opcode and advance PC before calling `handle`.
- Initialize `*cycles` with `base_cycles(opcode)`.
- Tick the bus and apply any global adjustments after a `true` return.

Return Contract
===============
`handle` returns:
- true  => opcode recognized, effects applied (and cycles possibly incremented)
- false => not a member of this family (caller continues dispatch chain)

*/

#![allow(dead_code)]

use crate::bus::Bus;
use crate::cpu::regs::CpuRegs;

use crate::cpu::addressing::{
    addr_abs, addr_abs_x_pc, addr_abs_y_pc, addr_ind_x, addr_ind_y_pc, addr_zp, addr_zp_x,
    fetch_byte,
};
use crate::cpu::execute::{and as and_exec, bit, eor, ora};

/// Attempt to execute a logical/bit-test opcode.
/// Returns true if handled, false if opcode is not in this family.
///
/// Parameters:
/// - `opcode`: already-fetched opcode
/// - `cpu`, `bus`: execution context
/// - `cycles`: base cycle count (mutated only for page-cross penalties)
///
/// Caller responsibilities:
/// - Do NOT tick the bus here.
/// - Perform final cycle adjustments (e.g. RMW subtraction—irrelevant here but
///   kept uniform) and tick *after* this returns true.
pub(super) fn handle<C: CpuRegs>(opcode: u8, cpu: &mut C, bus: &mut Bus, cycles: &mut u32) -> bool {
    match opcode {
        // ---------------- AND ----------------
        0x29 => {
            let v = fetch_byte(cpu, bus);
            and_exec(cpu, v);
        } // Immediate
        0x25 => {
            let addr = addr_zp(cpu, bus);
            let v = bus.read(addr);
            and_exec(cpu, v);
        }
        0x35 => {
            let addr = addr_zp_x(cpu, bus);
            let v = bus.read(addr);
            and_exec(cpu, v);
        }
        0x2D => {
            let addr = addr_abs(cpu, bus);
            let v = bus.read(addr);
            and_exec(cpu, v);
        }
        0x3D => {
            let (addr, crossed) = addr_abs_x_pc(cpu, bus);
            and_exec(cpu, bus.read(addr));
            add_page_cross_penalty(cycles, crossed);
        }
        0x39 => {
            let (addr, crossed) = addr_abs_y_pc(cpu, bus);
            and_exec(cpu, bus.read(addr));
            add_page_cross_penalty(cycles, crossed);
        }
        0x21 => {
            let addr = addr_ind_x(cpu, bus);
            let v = bus.read(addr);
            and_exec(cpu, v);
        }
        0x31 => {
            let (addr, crossed) = addr_ind_y_pc(cpu, bus);
            and_exec(cpu, bus.read(addr));
            add_page_cross_penalty(cycles, crossed);
        }

        // ---------------- ORA ----------------
        0x09 => {
            let v = fetch_byte(cpu, bus);
            ora(cpu, v);
        }
        0x05 => {
            let addr = addr_zp(cpu, bus);
            let v = bus.read(addr);
            ora(cpu, v);
        }
        0x15 => {
            let addr = addr_zp_x(cpu, bus);
            let v = bus.read(addr);
            ora(cpu, v);
        }
        0x0D => {
            let addr = addr_abs(cpu, bus);
            let v = bus.read(addr);
            ora(cpu, v);
        }
        0x1D => {
            let (addr, crossed) = addr_abs_x_pc(cpu, bus);
            ora(cpu, bus.read(addr));
            add_page_cross_penalty(cycles, crossed);
        }
        0x19 => {
            let (addr, crossed) = addr_abs_y_pc(cpu, bus);
            ora(cpu, bus.read(addr));
            add_page_cross_penalty(cycles, crossed);
        }
        0x01 => {
            let addr = addr_ind_x(cpu, bus);
            let v = bus.read(addr);
            ora(cpu, v);
        }
        0x11 => {
            let (addr, crossed) = addr_ind_y_pc(cpu, bus);
            ora(cpu, bus.read(addr));
            add_page_cross_penalty(cycles, crossed);
        }

        // ---------------- EOR ----------------
        0x49 => {
            let v = fetch_byte(cpu, bus);
            eor(cpu, v);
        }
        0x45 => {
            let addr = addr_zp(cpu, bus);
            let v = bus.read(addr);
            eor(cpu, v);
        }
        0x55 => {
            let addr = addr_zp_x(cpu, bus);
            let v = bus.read(addr);
            eor(cpu, v);
        }
        0x4D => {
            let addr = addr_abs(cpu, bus);
            let v = bus.read(addr);
            eor(cpu, v);
        }
        0x5D => {
            let (addr, crossed) = addr_abs_x_pc(cpu, bus);
            eor(cpu, bus.read(addr));
            add_page_cross_penalty(cycles, crossed);
        }
        0x59 => {
            let (addr, crossed) = addr_abs_y_pc(cpu, bus);
            eor(cpu, bus.read(addr));
            add_page_cross_penalty(cycles, crossed);
        }
        0x41 => {
            let addr = addr_ind_x(cpu, bus);
            let v = bus.read(addr);
            eor(cpu, v);
        }
        0x51 => {
            let (addr, crossed) = addr_ind_y_pc(cpu, bus);
            eor(cpu, bus.read(addr));
            add_page_cross_penalty(cycles, crossed);
        }

        // ---------------- BIT ----------------
        0x24 => {
            let addr = addr_zp(cpu, bus);
            let v = bus.read(addr);
            bit(cpu, v);
        }
        0x2C => {
            let addr = addr_abs(cpu, bus);
            let v = bus.read(addr);
            bit(cpu, v);
        }

        _ => return false,
    }
    true
}

#[inline]
fn add_page_cross_penalty(cycles: &mut u32, crossed: bool) {
    if crossed {
        *cycles += 1;
    }
}
