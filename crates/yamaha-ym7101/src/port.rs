//! Control and data port state machine.
//!
//! Commands arrive as two control words. The first latches address bits
//! 13:0 and code bits 1:0, the second supplies address bits 15:14 and code
//! bits 5:2. A register write (`10xx_xxxx`) is recognised at any time and
//! cancels a half-written command.

use emu_core::WordBus;
use log::trace;

use crate::Vdp;
use crate::registers::InterlaceMode;

/// Code bit 0 set means the command writes through the data port.
const CODE_WRITE: u8 = 0x01;
/// Code bit 5 requests a DMA transfer.
const CODE_DMA: u8 = 0x20;

// Targets selected by code bits 3:0.
pub(crate) const VRAM_READ: u8 = 0x00;
pub(crate) const VRAM_WRITE: u8 = 0x01;
pub(crate) const CRAM_WRITE: u8 = 0x03;
pub(crate) const VSRAM_READ: u8 = 0x04;
pub(crate) const VSRAM_WRITE: u8 = 0x05;
pub(crate) const CRAM_READ: u8 = 0x08;
pub(crate) const VRAM_READ_8BIT: u8 = 0x0C;

/// Status register bits.
pub mod status {
    /// Bits 15:10 always read `011101`.
    pub const FIXED: u16 = 0x7400;
    /// No write FIFO is modelled, so it is always empty.
    pub const FIFO_EMPTY: u16 = 1 << 9;
    pub const V_INT_PENDING: u16 = 1 << 7;
    pub const SPRITE_OVERFLOW: u16 = 1 << 6;
    pub const SPRITE_COLLISION: u16 = 1 << 5;
    /// Odd interlace field. Only reported while interlace is on.
    pub const ODD_FIELD: u16 = 1 << 4;
    pub const V_BLANK: u16 = 1 << 3;
    pub const H_BLANK: u16 = 1 << 2;
    pub const DMA_BUSY: u16 = 1 << 1;
    pub const PAL: u16 = 1 << 0;
}

impl Vdp {
    /// Write a word to the control port.
    ///
    /// `bus` serves 68000-to-VDP DMA if this word completes a DMA command.
    pub fn write_control<B: WordBus + ?Sized>(&mut self, cycle: u64, word: u16, bus: &B) {
        if word & 0xC000 == 0x8000 {
            self.write_register(usize::from((word >> 8) & 0x1F), word as u8);
            self.code = (self.code & 0x3C) | ((word >> 14) as u8 & 0x03);
            self.pending = false;
            return;
        }

        if !self.pending {
            self.pending = true;
            self.code = (self.code & 0x3C) | ((word >> 14) as u8 & 0x03);
            self.address = (self.address & 0xC000) | (word & 0x3FFF);
            return;
        }

        self.pending = false;
        self.code = (self.code & 0x03) | ((word >> 2) as u8 & 0x3C);
        self.address = (self.address & 0x3FFF) | ((word & 0x03) << 14);
        trace!(
            "VDP command code={:#04X} address={:#06X}",
            self.code, self.address
        );

        if self.code & CODE_DMA != 0 && self.regs.dma_enabled() {
            self.trigger_dma(cycle, bus);
        } else if self.code & CODE_WRITE == 0 {
            self.prefetch();
        }
    }

    fn write_register(&mut self, index: usize, value: u8) {
        let Some(old) = self.regs.set(index, value) else {
            trace!("VDP write to unimplemented register {index} ignored");
            return;
        };
        trace!("VDP reg {index:02} <- {value:#04X}");

        match index {
            0 if old & 0x02 != 0 && value & 0x02 == 0 => self.hv_latch = None,
            // The interrupt line is the AND of pending and enable, so
            // enabling with an interrupt already pending asserts at once.
            1 if old & 0x20 == 0 && value & 0x20 != 0 && self.v_int_pending => {
                self.asserted_level = crate::V_INT_LEVEL;
            }
            _ => {}
        }
    }

    /// Read the status register. Clears the pending command word, the
    /// V-interrupt flag and both sprite flags.
    pub fn read_status(&mut self, cycle: u64) -> u16 {
        let flags = [
            (self.v_int_pending, status::V_INT_PENDING),
            (self.sprite_overflow, status::SPRITE_OVERFLOW),
            (self.sprite_collision, status::SPRITE_COLLISION),
            (
                self.odd_field && self.regs.interlace_mode() != InterlaceMode::Off,
                status::ODD_FIELD,
            ),
            (self.v_blank, status::V_BLANK),
            (self.h_blank || self.h_blank_at(cycle), status::H_BLANK),
            (self.dma_busy(cycle), status::DMA_BUSY),
            (self.config.region().is_pal(), status::PAL),
        ];
        let value = flags
            .iter()
            .filter(|(set, _)| *set)
            .fold(status::FIXED | status::FIFO_EMPTY, |acc, (_, bit)| acc | bit);

        self.pending = false;
        self.v_int_pending = false;
        self.sprite_overflow = false;
        self.sprite_collision = false;
        value
    }

    /// Write a word to the data port at the current address.
    ///
    /// If a fill DMA is armed, the word is stored normally first and its
    /// high byte then fills the rest of the transfer.
    pub fn write_data(&mut self, cycle: u64, word: u16) {
        self.pending = false;
        let start_fill = self.dma_fill_pending;

        let column = self.column_at(cycle);
        self.store_word(self.code & 0x0F, word, column);
        self.address = self.address.wrapping_add(self.regs.auto_increment());

        if start_fill {
            self.run_fill(cycle, word);
        }
    }

    /// Read the data port. Returns the prefetched word and fetches the next.
    pub fn read_data(&mut self) -> u16 {
        self.pending = false;
        let value = self.read_buffer;
        self.prefetch();
        value
    }

    /// Route a word to the memory selected by `target`. CRAM and VSRAM
    /// writes made while a line window is open are logged against the
    /// pixel column they became visible at.
    pub(crate) fn store_word(&mut self, target: u8, word: u16, column: u16) {
        let logging = self.timing.is_active();
        match target {
            VRAM_WRITE => self.mem.write_vram_word(self.address, word),
            CRAM_WRITE => {
                let stored = self.mem.write_cram_word(self.address, word);
                if logging {
                    self.timing.log_cram(column, stored);
                }
            }
            VSRAM_WRITE => {
                if let Some(stored) = self.mem.write_vsram_word(self.address, word)
                    && logging
                {
                    self.timing.log_vsram(column, stored);
                }
            }
            _ => {}
        }
    }

    fn prefetch(&mut self) {
        self.read_buffer = match self.code & 0x0F {
            VRAM_READ => self.mem.vram_word(self.address),
            VSRAM_READ => self.mem.vsram_word(self.address),
            CRAM_READ => self.mem.cram_word(self.address),
            VRAM_READ_8BIT => u16::from(self.mem.vram_byte(self.address ^ 1)),
            _ => 0,
        };
        self.address = self.address.wrapping_add(self.regs.auto_increment());
    }

    pub(crate) fn column_at(&self, cycle: u64) -> u16 {
        self.timing.column(
            cycle,
            self.regs.active_width(),
            self.config.active_display_percent(),
        )
    }
}

#[cfg(test)]
mod tests {
    use emu_core::OpenBus;

    use super::*;

    fn control(vdp: &mut Vdp, words: &[u16]) {
        for &word in words {
            vdp.write_control(0, word, &OpenBus);
        }
    }

    #[test]
    fn register_write_cancels_pending_command() {
        let mut vdp = Vdp::default();
        control(&mut vdp, &[0x4000]);
        assert!(vdp.pending);
        control(&mut vdp, &[0x8F02]);
        assert!(!vdp.pending, "register write must cancel the first word");
        assert_eq!(vdp.registers().get(15), 0x02);
    }

    #[test]
    fn register_write_sets_code_low_bits() {
        let mut vdp = Vdp::default();
        control(&mut vdp, &[0x8144]);
        assert_eq!(vdp.code & 0x03, 0x02);
    }

    #[test]
    fn two_word_command_latches_code_and_address() {
        let mut vdp = Vdp::default();
        control(&mut vdp, &[0xC000, 0x0000]);
        assert_eq!(vdp.code, CRAM_WRITE);
        assert_eq!(vdp.address, 0x0000);

        control(&mut vdp, &[0x7FFF, 0x0003]);
        assert_eq!(vdp.code, VRAM_WRITE);
        assert_eq!(vdp.address, 0xFFFF);
    }

    #[test]
    fn vram_write_then_read_through_ports() {
        let mut vdp = Vdp::default();
        control(&mut vdp, &[0x8F02, 0x4000, 0x0000]);
        vdp.write_data(0, 0x1234);
        vdp.write_data(0, 0x5678);

        control(&mut vdp, &[0x0000, 0x0000]);
        assert_eq!(vdp.read_data(), 0x1234);
        assert_eq!(vdp.read_data(), 0x5678);
    }

    #[test]
    fn vram_odd_address_write_swaps_bytes() {
        let mut vdp = Vdp::default();
        control(&mut vdp, &[0x8F02, 0x4001, 0x0000]);
        vdp.write_data(0, 0xAABB);
        assert_eq!(vdp.vram()[0], 0xBB);
        assert_eq!(vdp.vram()[1], 0xAA);
    }

    #[test]
    fn cram_write_masks_to_colour_bits() {
        let mut vdp = Vdp::default();
        control(&mut vdp, &[0x8F02, 0xC000, 0x0000]);
        vdp.write_data(0, 0xFFFF);
        control(&mut vdp, &[0x0000, 0x0020]);
        assert_eq!(vdp.read_data(), 0x0EEE);
    }

    #[test]
    fn vsram_write_masks_to_ten_bits() {
        let mut vdp = Vdp::default();
        control(&mut vdp, &[0x8F02, 0x4000, 0x0010]);
        vdp.write_data(0, 0xFFFF);
        control(&mut vdp, &[0x0000, 0x0010]);
        assert_eq!(vdp.read_data(), 0x03FF);
    }

    #[test]
    fn vram_byte_read_uses_swapped_address() {
        let mut vdp = Vdp::default();
        control(&mut vdp, &[0x8F01, 0x4000, 0x0000]);
        vdp.write_data(0, 0x1122);
        control(&mut vdp, &[0x0000, 0x0030]);
        assert_eq!(vdp.read_data(), 0x0022);
    }

    #[test]
    fn status_fixed_bits_and_fifo_empty() {
        let mut vdp = Vdp::default();
        assert_eq!(vdp.read_status(0), 0x7600);
    }

    #[test]
    fn status_read_clears_sticky_flags_once() {
        let mut vdp = Vdp::default();
        vdp.v_int_pending = true;
        vdp.sprite_overflow = true;
        vdp.sprite_collision = true;
        control(&mut vdp, &[0x4000]);

        let first = vdp.read_status(0);
        assert_ne!(first & status::V_INT_PENDING, 0);
        assert_ne!(first & status::SPRITE_OVERFLOW, 0);
        assert_ne!(first & status::SPRITE_COLLISION, 0);
        assert!(!vdp.pending, "status read cancels the pending word");

        let second = vdp.read_status(0);
        assert_eq!(second & status::V_INT_PENDING, 0);
        assert_eq!(second & status::SPRITE_OVERFLOW, 0);
        assert_eq!(second & status::SPRITE_COLLISION, 0);
    }

    #[test]
    fn status_reports_pal_region() {
        let mut vdp = Vdp::new(crate::VdpConfig::new(crate::Region::Pal));
        assert_ne!(vdp.read_status(0) & status::PAL, 0);
    }

    #[test]
    fn odd_field_only_reported_in_interlace() {
        let mut vdp = Vdp::default();
        vdp.odd_field = true;
        assert_eq!(vdp.read_status(0) & status::ODD_FIELD, 0);
        control(&mut vdp, &[0x8C02]);
        assert_ne!(vdp.read_status(0) & status::ODD_FIELD, 0);
    }

    #[test]
    fn h_blank_follows_cycle_position_inside_a_line() {
        let mut vdp = Vdp::default();
        vdp.begin_scanline_timing(0, 488);
        assert_eq!(vdp.read_status(100) & status::H_BLANK, 0);
        assert_ne!(vdp.read_status(400) & status::H_BLANK, 0);
    }

    #[test]
    fn h_blank_falls_back_to_driver_flag() {
        let mut vdp = Vdp::default();
        assert_eq!(vdp.read_status(100) & status::H_BLANK, 0);
        vdp.set_h_blank(true);
        assert_ne!(vdp.read_status(100) & status::H_BLANK, 0);
    }
}
