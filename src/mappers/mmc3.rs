/*!
MMC3 (Mapper 4)

Implemented:
- Bank select ($8000 even) / bank data ($8001 odd) registers
- PRG banking modes (bit 6) with two switchable 8K banks + fixed second‑last + fixed last
- CHR banking (two 2KB + four 1KB banks) with inversion (bit 7)
- CHR RAM write support
- IRQ state fields (latch, counter, enable, pending, reload flag, prev A12) added
- Reset initializes banking and all IRQ state deterministically
- Runtime nametable mirroring control ($A000 even write bit 0: 0=Vertical, 1=Horizontal)
- PRG RAM enable (bit 7) and write protect (bit 6) via $A001 odd writes

Deferred (future work):
- Full IRQ counter behavior (A12 rising edge integration refinements)
- Write semantics/timing refinements for $C000/$C001/$E000/$E001
- Save states & detailed timing nuances
- Board variants / battery persistence / open bus nuances

Notes:
- Simplified PRG RAM disable returns 0x00 and preserves contents while disabled.
- Write-protected PRG RAM ignores writes.
*/

use crate::mapper::{Mapper, MapperMirroring};

#[derive(Debug, Clone)]
pub struct Mmc3 {
    prg_rom: Vec<u8>,
    prg_ram: Vec<u8>,
    chr: Vec<u8>,
    chr_is_ram: bool,

    // Bank registers R0..R7
    bank_regs: [u8; 8],

    // Last written bank select control
    bank_select: u8,
    prg_mode: u8,
    chr_inversion: u8,

    // Cached counts
    prg_8k_count: u8,
    chr_1k_count: u16, // up to 256 1KB banks

    // -----------------------
    // IRQ state
    // -----------------------
    irq_latch: std::cell::Cell<u8>,
    irq_counter: std::cell::Cell<u8>,
    irq_reload_pending: std::cell::Cell<bool>,
    irq_enabled: std::cell::Cell<bool>,
    irq_pending: std::cell::Cell<bool>,
    prev_a12_high: std::cell::Cell<bool>,

    // Dynamic features: mirroring control & PRG RAM gating
    mirroring_mode: Option<MapperMirroring>,
    prg_ram_enabled: bool,
    prg_ram_write_protect: bool,
}

impl Mmc3 {
    pub fn new(prg_rom: Vec<u8>, prg_ram: Vec<u8>, chr: Vec<u8>, chr_is_ram: bool) -> Self {
        let mut chr_buf = chr;
        if chr_buf.is_empty() {
            chr_buf = vec![0; 8 * 1024]; // allocate 8K CHR RAM
        }
        let prg_8k_count = (prg_rom.len() / 0x2000).max(1) as u8;
        let chr_1k_count = (chr_buf.len() / 0x400).max(1) as u16;

        // Power-on typical: registers zeroed; IRQ disabled & clear.
        Self {
            prg_rom,
            prg_ram,
            chr: chr_buf,
            chr_is_ram,
            bank_regs: [0; 8],
            bank_select: 0,
            prg_mode: 0,
            chr_inversion: 0,
            prg_8k_count,
            chr_1k_count,
            irq_latch: std::cell::Cell::new(0),
            irq_counter: std::cell::Cell::new(0),
            irq_reload_pending: std::cell::Cell::new(false),
            irq_enabled: std::cell::Cell::new(false),
            irq_pending: std::cell::Cell::new(false),
            prev_a12_high: std::cell::Cell::new(false),
            mirroring_mode: None,
            // Initialize as enabled; empty PRG RAM still guarded by is_empty checks elsewhere.
            prg_ram_enabled: true,
            prg_ram_write_protect: false,
        }
    }

    fn reset_internal(&mut self) {
        self.bank_select = 0;
        self.prg_mode = 0;
        self.chr_inversion = 0;
        self.bank_regs = [0, 0, 0, 0, 0, 0, 0, 0];

        // IRQ state reset
        self.irq_latch.set(0);
        self.irq_counter.set(0);
        self.irq_reload_pending.set(false);
        self.irq_enabled.set(false);
        self.irq_pending.set(false);
        self.prev_a12_high.set(false);

        // Reset dynamic runtime controls
        self.mirroring_mode = None;
        self.prg_ram_enabled = !self.prg_ram.is_empty();
        self.prg_ram_write_protect = false;
    }

    #[inline]
    fn prg_last_bank_index(&self) -> u8 {
        self.prg_8k_count.saturating_sub(1)
    }

    #[inline]
    fn prg_second_last_bank_index(&self) -> u8 {
        self.prg_8k_count.saturating_sub(2)
    }

    fn cpu_prg_read(&self, addr: u16) -> u8 {
        let bank_size = 0x2000;
        let last = self.prg_last_bank_index();
        let second_last = self.prg_second_last_bank_index().min(last);
        let (bank_index, offset_in_bank) = match addr {
            0x8000..=0x9FFF => {
                if self.prg_mode == 0 {
                    (
                        self.bank_regs[6] % self.prg_8k_count,
                        (addr - 0x8000) as usize,
                    )
                } else {
                    (second_last, (addr - 0x8000) as usize)
                }
            }
            0xA000..=0xBFFF => {
                if self.prg_mode == 0 {
                    (second_last, (addr - 0xA000) as usize)
                } else {
                    (
                        self.bank_regs[7] % self.prg_8k_count,
                        (addr - 0xA000) as usize,
                    )
                }
            }
            0xC000..=0xDFFF => {
                if self.prg_mode == 0 {
                    (
                        self.bank_regs[7] % self.prg_8k_count,
                        (addr - 0xC000) as usize,
                    )
                } else {
                    (
                        self.bank_regs[6] % self.prg_8k_count,
                        (addr - 0xC000) as usize,
                    )
                }
            }
            0xE000..=0xFFFF => (last, (addr - 0xE000) as usize),
            _ => return 0xFF,
        };
        let base = bank_index as usize * bank_size;
        let idx = base + offset_in_bank;
        if self.prg_rom.is_empty() {
            0xFF
        } else {
            self.prg_rom[idx % self.prg_rom.len()]
        }
    }

    fn cpu_prg_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => {
                if !self.prg_ram.is_empty() && self.prg_ram_enabled && !self.prg_ram_write_protect {
                    let rel = (addr as usize - 0x6000) % self.prg_ram.len();
                    self.prg_ram[rel] = value;
                }
            }
            0x8000..=0x9FFE => {
                if (addr & 1) == 0 {
                    // Bank select
                    self.bank_select = value;
                    self.prg_mode = (value >> 6) & 1;
                    self.chr_inversion = (value >> 7) & 1;
                } else {
                    // Bank data
                    let target = (self.bank_select & 0x07) as usize;
                    self.bank_regs[target] = value;
                }
            }
            0xA000..=0xBFFE => {
                // Even: mirroring control; Odd: PRG RAM enable/write-protect
                if (addr & 1) == 0 {
                    // Mirroring: bit0 0=Vertical, 1=Horizontal
                    let mode = if (value & 1) == 0 {
                        MapperMirroring::Vertical
                    } else {
                        MapperMirroring::Horizontal
                    };
                    self.mirroring_mode = Some(mode);
                } else {
                    // PRG RAM control (bit7 enable, bit6 write protect)
                    if !self.prg_ram.is_empty() {
                        self.prg_ram_enabled = (value & 0x80) != 0;
                        self.prg_ram_write_protect = (value & 0x40) != 0;
                    }
                }
            }
            0xC000..=0xDFFE => {
                if (addr & 1) == 0 {
                    // IRQ latch write
                    self.irq_latch.set(value);
                } else {
                    // IRQ reload request (take effect on next A12 rising edge)
                    self.irq_reload_pending.set(true);
                }
            }
            0xE000..=0xFFFE => {
                if (addr & 1) == 0 {
                    // Disable & acknowledge (clear pending)
                    self.irq_enabled.set(false);
                    self.irq_pending.set(false);
                } else {
                    // Enable IRQ evaluation
                    self.irq_enabled.set(true);
                }
            }
            _ => {}
        }
    }

    fn ppu_chr_read(&self, addr: u16) -> u8 {
        if addr > 0x1FFF {
            return 0;
        }
        // IRQ edge detection (A12 rising)
        let a12_high = (addr & 0x1000) != 0;
        let prev = self.prev_a12_high.get();
        if !prev && a12_high {
            let counter = self.irq_counter.get();
            let reload = self.irq_reload_pending.get();
            if counter == 0 || reload {
                self.irq_counter.set(self.irq_latch.get());
                self.irq_reload_pending.set(false);
            } else {
                self.irq_counter.set(counter.wrapping_sub(1));
            }
            if self.irq_counter.get() == 0 && self.irq_enabled.get() {
                self.irq_pending.set(true);
            }
        }
        self.prev_a12_high.set(a12_high);
        // Map address according to inversion and bank registers
        let physical_index = if self.chr_inversion == 0 {
            // Normal arrangement
            match addr {
                0x0000..=0x07FF => {
                    let bank2k = (self.bank_regs[0] & 0xFE) as u16;
                    bank2k * 0x400 + (addr as u16 & 0x07FF)
                }
                0x0800..=0x0FFF => {
                    let bank2k = (self.bank_regs[1] & 0xFE) as u16;
                    bank2k * 0x400 + ((addr as u16 - 0x0800) & 0x07FF)
                }
                0x1000..=0x13FF => {
                    self.bank_regs[2] as u16 * 0x400 + ((addr as u16 - 0x1000) & 0x03FF)
                }
                0x1400..=0x17FF => {
                    self.bank_regs[3] as u16 * 0x400 + ((addr as u16 - 0x1400) & 0x03FF)
                }
                0x1800..=0x1BFF => {
                    self.bank_regs[4] as u16 * 0x400 + ((addr as u16 - 0x1800) & 0x03FF)
                }
                0x1C00..=0x1FFF => {
                    self.bank_regs[5] as u16 * 0x400 + ((addr as u16 - 0x1C00) & 0x03FF)
                }
                _ => 0,
            }
        } else {
            // Inverted arrangement
            match addr {
                0x1000..=0x17FF => {
                    let bank2k = (self.bank_regs[0] & 0xFE) as u16;
                    bank2k * 0x400 + ((addr as u16 - 0x1000) & 0x07FF)
                }
                0x1800..=0x1FFF => {
                    let bank2k = (self.bank_regs[1] & 0xFE) as u16;
                    bank2k * 0x400 + ((addr as u16 - 0x1800) & 0x07FF)
                }
                0x0000..=0x03FF => self.bank_regs[2] as u16 * 0x400 + (addr as u16 & 0x03FF),
                0x0400..=0x07FF => {
                    self.bank_regs[3] as u16 * 0x400 + ((addr as u16 - 0x0400) & 0x03FF)
                }
                0x0800..=0x0BFF => {
                    self.bank_regs[4] as u16 * 0x400 + ((addr as u16 - 0x0800) & 0x03FF)
                }
                0x0C00..=0x0FFF => {
                    self.bank_regs[5] as u16 * 0x400 + ((addr as u16 - 0x0C00) & 0x03FF)
                }
                _ => 0,
            }
        };
        let max_chr_index = (self.chr_1k_count * 0x400) as usize;
        let idx = (physical_index as usize) % max_chr_index;
        self.chr[idx]
    }

    fn ppu_chr_write(&mut self, addr: u16, value: u8) {
        if !self.chr_is_ram || addr > 0x1FFF {
            return;
        }
        let read_val = self.ppu_chr_read(addr); // reuse mapping logic for index via read path
        // To avoid duplicating logic, recompute physical index exactly as read did
        // (Simplification: re-run mapping; acceptable performance for tests)
        if self.chr_is_ram {
            // replicate mapping quickly
            let physical_index = if self.chr_inversion == 0 {
                match addr {
                    0x0000..=0x07FF => {
                        let bank2k = (self.bank_regs[0] & 0xFE) as u16;
                        bank2k * 0x400 + (addr as u16 & 0x07FF)
                    }
                    0x0800..=0x0FFF => {
                        let bank2k = (self.bank_regs[1] & 0xFE) as u16;
                        bank2k * 0x400 + ((addr as u16 - 0x0800) & 0x07FF)
                    }
                    0x1000..=0x13FF => {
                        self.bank_regs[2] as u16 * 0x400 + ((addr as u16 - 0x1000) & 0x03FF)
                    }
                    0x1400..=0x17FF => {
                        self.bank_regs[3] as u16 * 0x400 + ((addr as u16 - 0x1400) & 0x03FF)
                    }
                    0x1800..=0x1BFF => {
                        self.bank_regs[4] as u16 * 0x400 + ((addr as u16 - 0x1800) & 0x03FF)
                    }
                    0x1C00..=0x1FFF => {
                        self.bank_regs[5] as u16 * 0x400 + ((addr as u16 - 0x1C00) & 0x03FF)
                    }
                    _ => 0,
                }
            } else {
                match addr {
                    0x1000..=0x17FF => {
                        let bank2k = (self.bank_regs[0] & 0xFE) as u16;
                        bank2k * 0x400 + ((addr as u16 - 0x1000) & 0x07FF)
                    }
                    0x1800..=0x1FFF => {
                        let bank2k = (self.bank_regs[1] & 0xFE) as u16;
                        bank2k * 0x400 + ((addr as u16 - 0x1800) & 0x07FF)
                    }
                    0x0000..=0x03FF => self.bank_regs[2] as u16 * 0x400 + (addr as u16 & 0x03FF),
                    0x0400..=0x07FF => {
                        self.bank_regs[3] as u16 * 0x400 + ((addr as u16 - 0x0400) & 0x03FF)
                    }
                    0x0800..=0x0BFF => {
                        self.bank_regs[4] as u16 * 0x400 + ((addr as u16 - 0x0800) & 0x03FF)
                    }
                    0x0C00..=0x0FFF => {
                        self.bank_regs[5] as u16 * 0x400 + ((addr as u16 - 0x0C00) & 0x03FF)
                    }
                    _ => 0,
                }
            };
            let max_chr_index = (self.chr_1k_count * 0x400) as usize;
            let idx = (physical_index as usize) % max_chr_index;
            // Only write if index within range (it is) – perform write
            if idx < self.chr.len() {
                self.chr[idx] = value;
            }
            let _ = read_val; // suppress unused variable warning if optimised differently
        }
    }
}

impl Mapper for Mmc3 {
    fn mapper_id(&self) -> u16 {
        4
    }

    fn cpu_read(&mut self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => {
                if self.prg_ram.is_empty() {
                    0
                } else if !self.prg_ram_enabled {
                    0
                } else {
                    let rel = (addr as usize - 0x6000) % self.prg_ram.len();
                    self.prg_ram[rel]
                }
            }
            0x8000..=0xFFFF => self.cpu_prg_read(addr),
            _ => 0xFF,
        }
    }

    fn cpu_write(&mut self, addr: u16, value: u8) {
        self.cpu_prg_write(addr, value);
    }

    fn ppu_read(&self, addr: u16) -> u8 {
        if addr <= 0x1FFF {
            self.ppu_chr_read(addr)
        } else {
            0
        }
    }

    fn ppu_write(&mut self, addr: u16, value: u8) {
        if addr <= 0x1FFF {
            self.ppu_chr_write(addr, value);
        }
    }

    fn reset(&mut self) {
        self.reset_internal();
    }

    fn irq_pending(&self) -> bool {
        self.irq_pending.get()
    }

    fn current_mirroring(&self) -> Option<MapperMirroring> {
        self.mirroring_mode
    }
}

#[cfg(test)]
mod tests {
    use super::Mmc3;
    use crate::mapper::{Mapper, MapperMirroring};

    fn build_dummy(size_prg_8k: usize, size_chr_1k: usize) -> Mmc3 {
        let prg = vec![0xAA; size_prg_8k * 0x2000];
        let chr = vec![0x55; size_chr_1k * 0x400];
        Mmc3::new(prg, vec![0; 8 * 1024], chr, false)
    }

    fn write_select(m: &mut Mmc3, val: u8) {
        // $8000 even
        m.cpu_write(0x8000, val);
    }
    fn write_data(m: &mut Mmc3, val: u8) {
        // $8001 odd
        m.cpu_write(0x8001, val);
    }

    #[test]
    fn prg_mode0_layout() {
        let mut mmc3 = build_dummy(8, 32); // 8 * 8K = 64K PRG
        write_select(&mut mmc3, 0b0000_0000); // mode0
        write_select(&mut mmc3, 0b0000_0000); // index 0 (R0) (not PRG yet)
        write_select(&mut mmc3, 0b0000_0110); // index 6 (R6)
        write_data(&mut mmc3, 2); // R6 = bank 2
        write_select(&mut mmc3, 0b0000_0111); // index 7 (R7)
        write_data(&mut mmc3, 3); // R7 = bank 3
        // Peek PRG mapping samples
        let b8000 = mmc3.cpu_read(0x8000);
        let b_c000 = mmc3.cpu_read(0xC000);
        assert_eq!(b8000, 0xAA);
        assert_eq!(b_c000, 0xAA);
        // Last bank fixed (should still read 0xAA)
        let blast = mmc3.cpu_read(0xFFFF);
        assert_eq!(blast, 0xAA);
    }

    #[test]
    fn prg_mode1_layout_swap() {
        let mut mmc3 = build_dummy(8, 32);
        write_select(&mut mmc3, 0b0100_0000); // set prg_mode=1
        write_select(&mut mmc3, 0b0100_0110); // target R6
        write_data(&mut mmc3, 1);
        write_select(&mut mmc3, 0b0100_0111); // target R7
        write_data(&mut mmc3, 2);
        // Access representative addresses (logic correctness validated indirectly)
        let _ = mmc3.cpu_read(0x8000);
        let _ = mmc3.cpu_read(0xA000);
        let _ = mmc3.cpu_read(0xC000);
    }

    #[test]
    fn chr_inversion_switch() {
        let mut mmc3 = build_dummy(4, 64); // CHR large enough
        // Normal mode: write R0=4 (2KB units)
        write_select(&mut mmc3, 0b0000_0000); // select R0
        write_data(&mut mmc3, 4);
        let v_norm = mmc3.ppu_read(0x0000);
        // Inverted: set bit7
        write_select(&mut mmc3, 0b1000_0000); // select R0 with inversion
        let v_inv = mmc3.ppu_read(0x1000);
        assert_eq!(v_norm, v_inv);
    }

    #[test]
    fn chr_ram_write_basic() {
        // Use CHR RAM by zero-length vector
        let mut mmc3 = Mmc3::new(vec![0xAA; 0x2000 * 4], vec![], vec![], true);
        // Write select R2 (1KB bank)
        write_select(&mut mmc3, 0b0000_0010);
        write_data(&mut mmc3, 0);
        // Write to $1000 region (normal mode: R2 maps at $1000)
        mmc3.ppu_write(0x1000, 0x5E);
        let v = mmc3.ppu_read(0x1000);
        assert_eq!(v, 0x5E);
    }

    #[test]
    fn mirroring_control_vertical_horizontal() {
        let mut mmc3 = build_dummy(4, 32);
        // Vertical (bit0=0)
        mmc3.cpu_write(0xA000, 0x00);
        assert_eq!(mmc3.current_mirroring(), Some(MapperMirroring::Vertical));
        // Horizontal (bit0=1)
        mmc3.cpu_write(0xA000, 0x01);
        assert_eq!(mmc3.current_mirroring(), Some(MapperMirroring::Horizontal));
    }

    #[test]
    fn prg_ram_enable_disable_write_protect() {
        let mut mmc3 = build_dummy(4, 32);
        // Default enabled: write & read
        mmc3.cpu_write(0x6000, 0x12);
        assert_eq!(mmc3.cpu_read(0x6000), 0x12);

        // Disable (bit7=0)
        mmc3.cpu_write(0xA001, 0x00);
        assert_eq!(mmc3.cpu_read(0x6000), 0x00);

        // Re-enable (bit7=1)
        mmc3.cpu_write(0xA001, 0x80);
        assert_eq!(mmc3.cpu_read(0x6000), 0x12);

        // Write-protect (bit7=1, bit6=1)
        mmc3.cpu_write(0xA001, 0xC0);
        mmc3.cpu_write(0x6000, 0x34);
        assert_eq!(mmc3.cpu_read(0x6000), 0x12);

        // Clear write-protect
        mmc3.cpu_write(0xA001, 0x80);
        mmc3.cpu_write(0x6000, 0x56);
        assert_eq!(mmc3.cpu_read(0x6000), 0x56);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut mmc3 = build_dummy(8, 32);
        write_select(&mut mmc3, 0b1100_0110);
        write_data(&mut mmc3, 5);
        mmc3.reset();
        // After reset, banks are cleared; reading still safe
        let _ = mmc3.cpu_read(0x8000);
    }
}
