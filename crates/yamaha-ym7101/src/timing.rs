//! Raster timing: V and H counters, blanking, interrupts and the HV latch.

use log::trace;

use crate::Vdp;
use crate::config::Region;
use crate::registers::InterlaceMode;
use crate::scanline::LinePosition;

/// Interrupts raised by entering a scanline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[must_use]
pub struct LineInterrupts {
    /// Vertical interrupt (level 6): first line of vertical blanking.
    pub vertical: bool,
    /// Horizontal interrupt (level 4): H-int counter underflow.
    pub horizontal: bool,
}

/// V-counter value for `line`. Each table jumps backwards partway through
/// vertical blanking, where the real counter rolls over.
#[must_use]
pub fn v_counter_for_line(region: Region, v30: bool, line: u16) -> u8 {
    let value = match region {
        Region::Ntsc if line <= 234 => line,
        Region::Ntsc => 0xE5 + (line - 235),
        Region::Pal if v30 && line >= 267 => 0xD2 + (line - 267),
        Region::Pal if !v30 && line >= 259 => 0xCA + (line - 259),
        Region::Pal => line,
    };
    value as u8
}

impl Vdp {
    /// Enter `line`. Updates the V counter, blanking, field parity and the
    /// H-interrupt counter, and reports which interrupts fire.
    pub fn start_scanline(&mut self, line: u16) -> LineInterrupts {
        let mut fired = LineInterrupts::default();
        self.line = line;
        self.v_counter = v_counter_for_line(self.config.region(), self.regs.v30(), line);
        let active_height = self.regs.active_height();

        if line == 0 {
            self.v_blank = false;
        }
        if line == active_height {
            self.v_blank = true;
            self.v_int_pending = true;
            self.odd_field = !self.odd_field;
            fired.vertical = self.regs.v_int_enabled();
        }

        // The counter reloads on every line outside active display and only
        // counts down inside it.
        if line == 0 || line >= active_height {
            self.h_int_counter = i16::from(self.regs.h_int_reload());
        }
        if line < active_height {
            self.h_int_counter -= 1;
            if self.h_int_counter < 0 {
                self.h_int_counter = i16::from(self.regs.h_int_reload());
                fired.horizontal = self.regs.h_int_enabled();
            }
        }

        if fired.vertical || fired.horizontal {
            trace!("VDP line {line}: interrupts {fired:?}");
        }
        fired
    }

    /// Open the cycle window for the current line. CRAM and VSRAM are
    /// snapshotted so writes made while the line is drawn can be replayed
    /// at the right columns.
    pub fn begin_scanline_timing(&mut self, start_cycle: u64, total_cycles: u64) {
        self.timing
            .begin(start_cycle, total_cycles, &self.mem.cram, &self.mem.vsram);
    }

    /// Last-known horizontal blanking state, used when no line window is open.
    pub fn set_h_blank(&mut self, h_blank: bool) {
        self.h_blank = h_blank;
    }

    /// Set the stored H counter from a position within a line.
    pub fn update_h_counter(&mut self, cycle_in_line: u64, total_cycles: u64) {
        self.h_counter = LinePosition::locate(
            cycle_in_line,
            total_cycles,
            self.config.active_display_percent(),
        )
        .h_counter(self.regs.h40());
    }

    pub(crate) fn h_blank_at(&self, cycle: u64) -> bool {
        if !self.timing.is_active() {
            return self.h_blank;
        }
        self.timing
            .position(cycle, self.config.active_display_percent())
            .is_some_and(|pos| pos.is_blank())
    }

    fn h_counter_at(&self, cycle: u64) -> u8 {
        if !self.timing.is_active() {
            return self.h_counter;
        }
        self.timing
            .position(cycle, self.config.active_display_percent())
            .map_or(0, |pos| pos.h_counter(self.regs.h40()))
    }

    /// Combine V and H into the 16-bit HV readout. In interlace the low V
    /// bit is replaced by bit 8 of the field-extended counter.
    fn format_hv(&self, h: u8) -> u16 {
        let odd = u16::from(self.odd_field);
        let v = u16::from(self.v_counter);
        let v_byte = match self.regs.interlace_mode() {
            InterlaceMode::Normal => {
                let v9 = v | odd << 8;
                (v9 & 0xFE) | ((v9 >> 8) & 1)
            }
            InterlaceMode::DoubleResolution => {
                let v9 = v << 1 | odd;
                (v9 & 0xFE) | ((v9 >> 8) & 1)
            }
            InterlaceMode::Off | InterlaceMode::Reserved => v,
        };
        v_byte << 8 | u16::from(h)
    }

    /// HV counter using the stored H value, or the latched value if held.
    #[must_use]
    pub fn read_hv_counter(&self) -> u16 {
        self.hv_latch.unwrap_or_else(|| self.format_hv(self.h_counter))
    }

    /// HV counter with H derived from `cycle` within the open line window.
    #[must_use]
    pub fn read_hv_counter_at_cycle(&self, cycle: u64) -> u16 {
        self.hv_latch
            .unwrap_or_else(|| self.format_hv(self.h_counter_at(cycle)))
    }

    /// Freeze the HV readout at `cycle`. Only effective while register 0
    /// bit 1 is set; clearing that bit releases the latch.
    pub fn latch_hv_counter(&mut self, cycle: u64) {
        if self.regs.hv_latch_enabled() {
            self.hv_latch = Some(self.format_hv(self.h_counter_at(cycle)));
        }
    }

    /// Take the interrupt level asserted outside the normal line flow (0 if
    /// none). Taking level 6 acknowledges the pending vertical interrupt.
    pub fn take_asserted_interrupt_level(&mut self) -> u8 {
        let level = std::mem::take(&mut self.asserted_level);
        if level == crate::V_INT_LEVEL {
            self.v_int_pending = false;
        }
        level
    }

    /// 68000 interrupt acknowledge for level 6.
    pub fn acknowledge_vertical_interrupt(&mut self) {
        self.v_int_pending = false;
    }
}
