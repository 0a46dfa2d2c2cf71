//! DMA engine: 68000-to-VDP transfers, VRAM fill and VRAM copy.
//!
//! Memory effects happen immediately when a transfer is triggered. Only
//! the timing is deferred: the engine computes the cycle at which real
//! hardware would finish and, for 68000 transfers, how long the CPU is
//! held off the bus.
//!
//! Throughput is measured in bytes per scanline and changes between active
//! display and blanking. A transfer that crosses from one to the other is
//! timed in two segments, each at its own rate.

use emu_core::WordBus;
use log::{debug, trace, warn};

use crate::Vdp;
use crate::registers::DmaMode;

/// Bytes moved per scanline for a DMA mode, resolution and blanking state.
#[must_use]
pub fn bytes_per_line(mode: DmaMode, h40: bool, blank: bool) -> u64 {
    match (mode, h40, blank) {
        (DmaMode::MemoryToVdp, true, true) => 205,
        (DmaMode::MemoryToVdp, true, false) => 18,
        (DmaMode::MemoryToVdp, false, true) => 167,
        (DmaMode::MemoryToVdp, false, false) => 16,
        (DmaMode::Fill, true, true) => 204,
        (DmaMode::Fill, true, false) => 17,
        (DmaMode::Fill, false, true) => 166,
        (DmaMode::Fill, false, false) => 15,
        (DmaMode::Copy, true, true) => 102,
        (DmaMode::Copy, true, false) => 9,
        (DmaMode::Copy, false, true) => 83,
        (DmaMode::Copy, false, false) => 8,
    }
}

/// Cycles needed to move `bytes` at `rate` bytes per line.
fn transfer_cycles(bytes: u64, rate: u64, line_cycles: u64) -> u64 {
    (bytes / rate) * line_cycles + (bytes % rate) * line_cycles / rate
}

impl Vdp {
    /// Take the CPU stall owed by the last 68000-to-VDP transfer. Returns
    /// the full value once and 0 until the next transfer.
    pub fn take_stall_cycles(&mut self) -> u64 {
        std::mem::take(&mut self.dma_stall_cycles)
    }

    /// Cycle at which the most recent DMA finishes on hardware.
    #[must_use]
    pub fn dma_end_cycle(&self) -> u64 {
        self.dma_end_cycle
    }

    /// True while a DMA would still be running at `cycle`.
    #[must_use]
    pub fn dma_busy(&self, cycle: u64) -> bool {
        cycle > 0 && cycle < self.dma_end_cycle
    }

    pub(crate) fn trigger_dma<B: WordBus + ?Sized>(&mut self, cycle: u64, bus: &B) {
        let mode = self.regs.dma_mode();
        trace!(
            "VDP DMA {mode:?} triggered at cycle {cycle}, length {:#06X}",
            self.regs.dma_length()
        );
        match mode {
            DmaMode::MemoryToVdp => self.run_memory_transfer(cycle, bus),
            DmaMode::Fill => self.dma_fill_pending = true,
            DmaMode::Copy => self.run_copy(cycle),
        }
    }

    fn in_blank_region(&self) -> bool {
        self.v_blank || !self.regs.display_enabled()
    }

    /// Cycle at which a DMA of `bytes` triggered at `trigger` finishes.
    ///
    /// The current region ends at the bottom of active display, or at the
    /// end of the frame while in vertical blanking. Bytes that do not fit
    /// before that boundary run at the next region's rate.
    pub(crate) fn dma_completion_cycle(&self, trigger: u64, bytes: u64, mode: DmaMode) -> u64 {
        let line_cycles = self.timing.total_cycles;
        if line_cycles == 0 {
            return trigger;
        }

        let h40 = self.regs.h40();
        let rate = bytes_per_line(mode, h40, self.in_blank_region());
        let frame_lines = u64::from(self.config.region().scanlines());
        let active_lines = u64::from(self.regs.active_height());
        let line = u64::from(self.line);

        let (lines_left, next_blank, next_region_lines) = if self.v_blank {
            (
                frame_lines.saturating_sub(line),
                !self.regs.display_enabled(),
                active_lines,
            )
        } else {
            (
                active_lines.saturating_sub(line),
                true,
                frame_lines - active_lines,
            )
        };

        let capacity = lines_left * rate;
        if bytes <= capacity {
            return trigger + transfer_cycles(bytes, rate, line_cycles);
        }

        let remaining = bytes - capacity;
        let next_rate = bytes_per_line(mode, h40, next_blank);
        if remaining > next_region_lines * next_rate {
            warn!(
                "VDP DMA of {bytes} bytes from line {line} crosses more than one \
                 display region; timing assumes the second region continues"
            );
        }
        trigger + lines_left * line_cycles + transfer_cycles(remaining, next_rate, line_cycles)
    }

    fn run_memory_transfer<B: WordBus + ?Sized>(&mut self, cycle: u64, bus: &B) {
        let length = self.regs.dma_length();
        let end = self.dma_completion_cycle(cycle, u64::from(length) * 2, DmaMode::MemoryToVdp);
        self.dma_end_cycle = end;
        self.dma_stall_cycles = end - cycle;

        // Spread the per-word timestamps over the line so palette and
        // scroll writes land on the right columns.
        let cycles_per_word = if self.timing.is_active() {
            let words_per_line = bytes_per_line(
                DmaMode::MemoryToVdp,
                self.regs.h40(),
                self.in_blank_region(),
            ) / 2;
            self.timing.total_cycles / words_per_line
        } else {
            0
        };

        let target = self.code & 0x0F;
        let increment = self.regs.auto_increment();
        let mut source = self.regs.dma_memory_source();
        let mut word_cycle = cycle;

        for _ in 0..length {
            let word = bus.read_word(source & 0xFF_FFFF);
            let column = self.column_at(word_cycle);
            self.store_word(target, word, column);
            self.address = self.address.wrapping_add(increment);
            // The source wraps inside its 128 KiB window.
            source = (source & 0xFE_0000) | (source.wrapping_add(2) & 0x01_FFFF);
            word_cycle += cycles_per_word;
        }

        self.regs.store_memory_source(source);
        self.regs.clear_dma_length();
        debug!(
            "VDP DMA 68K->{target:#X}: {length} words, ends at {end}, stall {}",
            self.dma_stall_cycles
        );
    }

    /// Second half of a fill: runs after the data write that supplied `word`.
    pub(crate) fn run_fill(&mut self, cycle: u64, word: u16) {
        self.dma_fill_pending = false;
        let length = self.regs.dma_length();
        self.dma_end_cycle = self.dma_completion_cycle(cycle, u64::from(length), DmaMode::Fill);

        let [fill, _] = word.to_be_bytes();
        let increment = self.regs.auto_increment();
        for _ in 0..length {
            self.mem.set_vram_byte(self.address ^ 1, fill);
            self.address = self.address.wrapping_add(increment);
        }

        self.regs.clear_dma_length();
        debug!(
            "VDP DMA fill {fill:#04X} x {length}, ends at {}",
            self.dma_end_cycle
        );
    }

    fn run_copy(&mut self, cycle: u64) {
        let length = self.regs.dma_length();
        self.dma_end_cycle = self.dma_completion_cycle(cycle, u64::from(length), DmaMode::Copy);

        let increment = self.regs.auto_increment();
        let mut source = self.regs.dma_copy_source();
        for _ in 0..length {
            let byte = self.mem.vram_byte(source);
            self.mem.set_vram_byte(self.address, byte);
            source = source.wrapping_add(1);
            self.address = self.address.wrapping_add(increment);
        }

        self.regs.store_copy_source(source);
        self.regs.clear_dma_length();
        debug!(
            "VDP DMA copy x {length}, ends at {}",
            self.dma_end_cycle
        );
    }
}
