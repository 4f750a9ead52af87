/*!
illegal.rs - Undocumented ("illegal") 6502 opcode family handler

Overview
========
Implements the subset of undocumented opcodes with behavior that is stable
and well-documented across real hardware and emulators:

  SLO/RLA/SRE/RRA  - RMW shift/rotate fused with a logical or arithmetic op
  SAX              - store (A & X)
  LAX              - load both A and X from memory
  DCP              - DEC memory then CMP
  ISC (a.k.a. ISB) - INC memory then SBC
  ANC              - AND #imm, then copy the sign bit into CARRY
  ALR (a.k.a. ASR) - AND #imm, then LSR A
  ARR              - AND #imm, then ROR A (carry/overflow per the documented formula)
  AXS (a.k.a. SBX) - X = (A & X) - #imm, flags set like CMP
  LAS              - AND memory with SP, load the result into A, X, and SP
  SBC #$EB         - identical to documented SBC #imm
  NOPs             - 1/2/3-byte reads that discard the operand (cycle cost only)
  SHY/SHX/AHX/TAS  - unstable store opcodes, approximated with the "typical"
                     formula (AND the stored register(s) with high-byte-of-base+1)
                     seen in most emulators; real hardware behavior depends on
                     DRAM refresh timing and is not reproduced exactly here

XAA (0x8B) is not implemented: its result depends on analog bus capacitance
effects that differ between chip revisions, so no single digital formula is
authoritative. Any program relying on it is relying on undefined behavior.

KIL/JAM opcodes are intentionally NOT handled here; they remain the
responsibility of `finalize::handle_trivial_or_unknown`, which halts the CPU
for exactly that fixed set.

Caller Requirements
===================
Same contract as the other family handlers: opcode fetched and PC already
advanced, `*cycles` pre-seeded from `base_cycles(opcode)`, and `handle`
applies any extra page-cross cycles itself.
*/

#![allow(dead_code)]

use crate::bus::Bus;
use crate::cpu::addressing::{
    addr_abs, addr_abs_x, addr_abs_x_pc, addr_abs_y, addr_abs_y_pc, addr_ind_x, addr_ind_y,
    addr_ind_y_pc, addr_zp, addr_zp_x, addr_zp_y, fetch_byte, fetch_word, read_word_zp,
};
use crate::cpu::execute::{adc, rmw_memory, sbc, set_flag, update_zn};
use crate::cpu::regs::CpuRegs;
use crate::cpu::state::{CARRY, NEGATIVE, OVERFLOW};

#[inline]
fn slo<C: CpuRegs>(cpu: &mut C, bus: &mut Bus, addr: u16) {
    let shifted = rmw_memory(cpu, bus, addr, |c, old| {
        set_flag(c, CARRY, (old & 0x80) != 0);
        old << 1
    });
    cpu.set_a(cpu.a() | shifted);
    update_zn(cpu, cpu.a());
}

#[inline]
fn rla<C: CpuRegs>(cpu: &mut C, bus: &mut Bus, addr: u16) {
    let rotated = rmw_memory(cpu, bus, addr, |c, old| {
        let carry_in = if c.is_flag_set(CARRY) { 1 } else { 0 };
        set_flag(c, CARRY, (old & 0x80) != 0);
        (old << 1) | carry_in
    });
    cpu.set_a(cpu.a() & rotated);
    update_zn(cpu, cpu.a());
}

#[inline]
fn sre<C: CpuRegs>(cpu: &mut C, bus: &mut Bus, addr: u16) {
    let shifted = rmw_memory(cpu, bus, addr, |c, old| {
        set_flag(c, CARRY, (old & 0x01) != 0);
        old >> 1
    });
    cpu.set_a(cpu.a() ^ shifted);
    update_zn(cpu, cpu.a());
}

#[inline]
fn rra<C: CpuRegs>(cpu: &mut C, bus: &mut Bus, addr: u16) {
    let rotated = rmw_memory(cpu, bus, addr, |c, old| {
        let carry_in = if c.is_flag_set(CARRY) { 0x80 } else { 0 };
        set_flag(c, CARRY, (old & 0x01) != 0);
        (old >> 1) | carry_in
    });
    adc(cpu, rotated);
}

#[inline]
fn dcp<C: CpuRegs>(cpu: &mut C, bus: &mut Bus, addr: u16) {
    let decremented = rmw_memory(cpu, bus, addr, |_, old| old.wrapping_sub(1));
    set_flag(cpu, CARRY, cpu.a() >= decremented);
    update_zn(cpu, cpu.a().wrapping_sub(decremented));
}

#[inline]
fn isc<C: CpuRegs>(cpu: &mut C, bus: &mut Bus, addr: u16) {
    let incremented = rmw_memory(cpu, bus, addr, |_, old| old.wrapping_add(1));
    sbc(cpu, incremented);
}

#[inline]
fn sax<C: CpuRegs>(cpu: &mut C, bus: &mut Bus, addr: u16) {
    bus.write(addr, cpu.a() & cpu.x());
}

#[inline]
fn lax<C: CpuRegs>(cpu: &mut C, bus: &mut Bus, addr: u16) {
    let v = bus.read(addr);
    cpu.set_a(v);
    cpu.set_x(v);
    update_zn(cpu, v);
}

#[inline]
fn anc<C: CpuRegs>(cpu: &mut C, bus: &mut Bus) {
    let v = fetch_byte(cpu, bus);
    cpu.set_a(cpu.a() & v);
    update_zn(cpu, cpu.a());
    set_flag(cpu, CARRY, (cpu.a() & 0x80) != 0);
}

#[inline]
fn alr<C: CpuRegs>(cpu: &mut C, bus: &mut Bus) {
    let v = fetch_byte(cpu, bus);
    let anded = cpu.a() & v;
    set_flag(cpu, CARRY, (anded & 0x01) != 0);
    cpu.set_a(anded >> 1);
    update_zn(cpu, cpu.a());
}

#[inline]
fn arr<C: CpuRegs>(cpu: &mut C, bus: &mut Bus) {
    // AND #imm, then rotate right through carry; C/V are derived from the
    // post-AND value per the documented (if quirky) hardware formula.
    let v = fetch_byte(cpu, bus);
    let anded = cpu.a() & v;
    let carry_in = if cpu.is_flag_set(CARRY) { 0x80 } else { 0 };
    let result = (anded >> 1) | carry_in;
    cpu.set_a(result);
    update_zn(cpu, result);
    set_flag(cpu, CARRY, (result & 0x40) != 0);
    set_flag(cpu, OVERFLOW, ((result >> 6) ^ (result >> 5)) & 0x01 != 0);
}

#[inline]
fn axs<C: CpuRegs>(cpu: &mut C, bus: &mut Bus) {
    let v = fetch_byte(cpu, bus);
    let anded = cpu.a() & cpu.x();
    set_flag(cpu, CARRY, anded >= v);
    let result = anded.wrapping_sub(v);
    cpu.set_x(result);
    update_zn(cpu, result);
}

#[inline]
fn las<C: CpuRegs>(cpu: &mut C, bus: &mut Bus, addr: u16) {
    let v = bus.read(addr) & cpu.sp();
    cpu.set_a(v);
    cpu.set_x(v);
    cpu.set_sp(v);
    update_zn(cpu, v);
}

/// SHY ($9C, abs,X): store `Y & (high-byte-of-base + 1)`.
#[inline]
fn shy<C: CpuRegs>(cpu: &mut C, bus: &mut Bus) {
    let base = fetch_word(cpu, bus);
    let addr = base.wrapping_add(cpu.x() as u16);
    let hi = ((base >> 8) as u8).wrapping_add(1);
    bus.write(addr, cpu.y() & hi);
}

/// SHX ($9E, abs,Y): store `X & (high-byte-of-base + 1)`.
#[inline]
fn shx<C: CpuRegs>(cpu: &mut C, bus: &mut Bus) {
    let base = fetch_word(cpu, bus);
    let addr = base.wrapping_add(cpu.y() as u16);
    let hi = ((base >> 8) as u8).wrapping_add(1);
    bus.write(addr, cpu.x() & hi);
}

/// AHX/SHA ($9F abs,Y and $93 (ind),Y): store `A & X & (high-byte-of-base + 1)`.
#[inline]
fn ahx_abs_y<C: CpuRegs>(cpu: &mut C, bus: &mut Bus) {
    let base = fetch_word(cpu, bus);
    let addr = base.wrapping_add(cpu.y() as u16);
    let hi = ((base >> 8) as u8).wrapping_add(1);
    bus.write(addr, cpu.a() & cpu.x() & hi);
}

#[inline]
fn ahx_ind_y<C: CpuRegs>(cpu: &mut C, bus: &mut Bus) {
    let zp = fetch_byte(cpu, bus);
    let base = read_word_zp(bus, zp);
    let addr = base.wrapping_add(cpu.y() as u16);
    let hi = ((base >> 8) as u8).wrapping_add(1);
    bus.write(addr, cpu.a() & cpu.x() & hi);
}

/// TAS ($9B, abs,Y): `SP = A & X`, then store `SP & (high-byte-of-base + 1)`.
#[inline]
fn tas<C: CpuRegs>(cpu: &mut C, bus: &mut Bus) {
    let base = fetch_word(cpu, bus);
    let addr = base.wrapping_add(cpu.y() as u16);
    let sp = cpu.a() & cpu.x();
    cpu.set_sp(sp);
    let hi = ((base >> 8) as u8).wrapping_add(1);
    bus.write(addr, sp & hi);
}

/// Attempt to execute an undocumented opcode.
/// Returns true if handled (cycles already adjusted for any page-cross penalty).
pub(super) fn handle<C: CpuRegs>(opcode: u8, cpu: &mut C, bus: &mut Bus, cycles: &mut u32) -> bool {
    match opcode {
        // SLO
        0x07 => slo(cpu, bus, addr_zp(cpu, bus)),
        0x17 => slo(cpu, bus, addr_zp_x(cpu, bus)),
        0x0F => slo(cpu, bus, addr_abs(cpu, bus)),
        0x1F => slo(cpu, bus, addr_abs_x(cpu, bus)),
        0x1B => slo(cpu, bus, addr_abs_y(cpu, bus)),
        0x03 => slo(cpu, bus, addr_ind_x(cpu, bus)),
        0x13 => slo(cpu, bus, addr_ind_y(cpu, bus)),

        // RLA
        0x27 => rla(cpu, bus, addr_zp(cpu, bus)),
        0x37 => rla(cpu, bus, addr_zp_x(cpu, bus)),
        0x2F => rla(cpu, bus, addr_abs(cpu, bus)),
        0x3F => rla(cpu, bus, addr_abs_x(cpu, bus)),
        0x3B => rla(cpu, bus, addr_abs_y(cpu, bus)),
        0x23 => rla(cpu, bus, addr_ind_x(cpu, bus)),
        0x33 => rla(cpu, bus, addr_ind_y(cpu, bus)),

        // SRE
        0x47 => sre(cpu, bus, addr_zp(cpu, bus)),
        0x57 => sre(cpu, bus, addr_zp_x(cpu, bus)),
        0x4F => sre(cpu, bus, addr_abs(cpu, bus)),
        0x5F => sre(cpu, bus, addr_abs_x(cpu, bus)),
        0x5B => sre(cpu, bus, addr_abs_y(cpu, bus)),
        0x43 => sre(cpu, bus, addr_ind_x(cpu, bus)),
        0x53 => sre(cpu, bus, addr_ind_y(cpu, bus)),

        // RRA
        0x67 => rra(cpu, bus, addr_zp(cpu, bus)),
        0x77 => rra(cpu, bus, addr_zp_x(cpu, bus)),
        0x6F => rra(cpu, bus, addr_abs(cpu, bus)),
        0x7F => rra(cpu, bus, addr_abs_x(cpu, bus)),
        0x7B => rra(cpu, bus, addr_abs_y(cpu, bus)),
        0x63 => rra(cpu, bus, addr_ind_x(cpu, bus)),
        0x73 => rra(cpu, bus, addr_ind_y(cpu, bus)),

        // DCP
        0xC7 => dcp(cpu, bus, addr_zp(cpu, bus)),
        0xD7 => dcp(cpu, bus, addr_zp_x(cpu, bus)),
        0xCF => dcp(cpu, bus, addr_abs(cpu, bus)),
        0xDF => dcp(cpu, bus, addr_abs_x(cpu, bus)),
        0xDB => dcp(cpu, bus, addr_abs_y(cpu, bus)),
        0xC3 => dcp(cpu, bus, addr_ind_x(cpu, bus)),
        0xD3 => dcp(cpu, bus, addr_ind_y(cpu, bus)),

        // ISC
        0xE7 => isc(cpu, bus, addr_zp(cpu, bus)),
        0xF7 => isc(cpu, bus, addr_zp_x(cpu, bus)),
        0xEF => isc(cpu, bus, addr_abs(cpu, bus)),
        0xFF => isc(cpu, bus, addr_abs_x(cpu, bus)),
        0xFB => isc(cpu, bus, addr_abs_y(cpu, bus)),
        0xE3 => isc(cpu, bus, addr_ind_x(cpu, bus)),
        0xF3 => isc(cpu, bus, addr_ind_y(cpu, bus)),

        // SAX
        0x87 => sax(cpu, bus, addr_zp(cpu, bus)),
        0x97 => sax(cpu, bus, addr_zp_y(cpu, bus)),
        0x8F => sax(cpu, bus, addr_abs(cpu, bus)),
        0x83 => sax(cpu, bus, addr_ind_x(cpu, bus)),

        // LAX (page-cross aware addressing modes add +1 cycle)
        0xA7 => lax(cpu, bus, addr_zp(cpu, bus)),
        0xB7 => lax(cpu, bus, addr_zp_y(cpu, bus)),
        0xAF => lax(cpu, bus, addr_abs(cpu, bus)),
        0xBF => {
            let (addr, crossed) = addr_abs_y_pc(cpu, bus);
            lax(cpu, bus, addr);
            if crossed {
                *cycles += 1;
            }
        }
        0xA3 => lax(cpu, bus, addr_ind_x(cpu, bus)),
        0xB3 => {
            let (addr, crossed) = addr_ind_y_pc(cpu, bus);
            lax(cpu, bus, addr);
            if crossed {
                *cycles += 1;
            }
        }

        // Immediate-operand unstable opcodes
        0x0B | 0x2B => anc(cpu, bus),
        0x4B => alr(cpu, bus),
        0x6B => arr(cpu, bus),
        0xCB => axs(cpu, bus),
        0xEB => {
            let v = fetch_byte(cpu, bus);
            sbc(cpu, v);
        }

        // LAS
        0xBB => {
            let (addr, crossed) = addr_abs_y_pc(cpu, bus);
            las(cpu, bus, addr);
            if crossed {
                *cycles += 1;
            }
        }

        // Unstable store opcodes (typical-formula approximation, see module docs)
        0x9C => shy(cpu, bus),
        0x9E => shx(cpu, bus),
        0x9F => ahx_abs_y(cpu, bus),
        0x93 => ahx_ind_y(cpu, bus),
        0x9B => tas(cpu, bus),

        // Undocumented NOPs: fetch and discard the operand, no state change.
        0x1A | 0x3A | 0x5A | 0x7A | 0xDA | 0xFA => {}
        0x80 | 0x82 | 0x89 | 0xC2 | 0xE2 => {
            fetch_byte(cpu, bus);
        }
        0x04 | 0x44 | 0x64 => {
            addr_zp(cpu, bus);
        }
        0x14 | 0x34 | 0x54 | 0x74 | 0xD4 | 0xF4 => {
            addr_zp_x(cpu, bus);
        }
        0x0C => {
            addr_abs(cpu, bus);
        }
        0x1C | 0x3C | 0x5C | 0x7C | 0xDC | 0xFC => {
            let (_, crossed) = addr_abs_x_pc(cpu, bus);
            if crossed {
                *cycles += 1;
            }
        }

        _ => return false,
    }
    true
}
