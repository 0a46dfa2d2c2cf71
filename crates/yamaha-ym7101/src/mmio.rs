//! The VDP's window in the 68000 and Z80 address maps.
//!
//! The window is 32 bytes wide and mirrored across its region. Ports are
//! 16 bits; byte and long accesses are built from word accesses here so the
//! system bus only has to forward an offset and a size.

use emu_core::WordBus;
use log::trace;

use crate::Vdp;

/// Width of one mirror of the VDP window.
const WINDOW_SIZE: u32 = 0x20;

/// Size of a CPU access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessSize {
    Byte,
    Word,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Port {
    Data,
    Control,
    HvCounter,
    /// PSG and unused offsets. Not part of the VDP proper.
    Unmapped,
}

fn decode(offset: u32) -> Port {
    match offset % WINDOW_SIZE {
        0x00..=0x03 => Port::Data,
        0x04..=0x07 => Port::Control,
        0x08..=0x0F => Port::HvCounter,
        _ => Port::Unmapped,
    }
}

impl Vdp {
    /// Read from the VDP window. `offset` is relative to the window base.
    pub fn read_port(&mut self, cycle: u64, offset: u32, size: AccessSize) -> u32 {
        match size {
            AccessSize::Byte => {
                let [hi, lo] = self.read_port_word(cycle, offset).to_be_bytes();
                u32::from(if offset & 1 == 0 { hi } else { lo })
            }
            AccessSize::Word => u32::from(self.read_port_word(cycle, offset)),
            // The HV counter answers a long read with a single word.
            AccessSize::Long if decode(offset) == Port::HvCounter => {
                u32::from(self.read_port_word(cycle, offset))
            }
            AccessSize::Long => {
                let hi = self.read_port_word(cycle, offset);
                let lo = self.read_port_word(cycle, offset.wrapping_add(2));
                u32::from(hi) << 16 | u32::from(lo)
            }
        }
    }

    /// Write to the VDP window from the 68000. A byte write reaches the
    /// port as a word with the byte in its low half.
    pub fn write_port<B: WordBus + ?Sized>(
        &mut self,
        cycle: u64,
        offset: u32,
        size: AccessSize,
        value: u32,
        bus: &B,
    ) {
        match size {
            AccessSize::Byte => {
                self.write_port_word(cycle, offset, u16::from(value as u8), bus);
            }
            AccessSize::Word => self.write_port_word(cycle, offset, value as u16, bus),
            AccessSize::Long => {
                self.write_port_word(cycle, offset, (value >> 16) as u16, bus);
                self.write_port_word(cycle, offset.wrapping_add(2), value as u16, bus);
            }
        }
    }

    /// Write a byte to the VDP window from the Z80. The Z80 bus is 8 bits
    /// wide, so the byte appears on both halves of the 16-bit port.
    pub fn write_port_z80<B: WordBus + ?Sized>(
        &mut self,
        cycle: u64,
        offset: u32,
        value: u8,
        bus: &B,
    ) {
        self.write_port_word(cycle, offset, u16::from_be_bytes([value, value]), bus);
    }

    fn read_port_word(&mut self, cycle: u64, offset: u32) -> u16 {
        match decode(offset) {
            Port::Data => self.read_data(),
            Port::Control => self.read_status(cycle),
            Port::HvCounter => self.read_hv_counter_at_cycle(cycle),
            Port::Unmapped => 0,
        }
    }

    fn write_port_word<B: WordBus + ?Sized>(&mut self, cycle: u64, offset: u32, word: u16, bus: &B) {
        match decode(offset) {
            Port::Data => self.write_data(cycle, word),
            Port::Control => self.write_control(cycle, word, bus),
            Port::HvCounter => {}
            Port::Unmapped => {
                trace!("VDP window write {word:#06X} to unmapped offset {offset:#04X}");
            }
        }
    }
}
