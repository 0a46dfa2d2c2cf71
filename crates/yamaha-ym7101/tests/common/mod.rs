//! Shared helpers for driving the VDP through its ports.

#![allow(dead_code)]

use emu_core::{OpenBus, WordBus};
use yamaha_ym7101::Vdp;

/// NTSC H40 line length in 68000 cycles.
pub const LINE_CYCLES: u64 = 488;

pub const VRAM_WRITE: u8 = 0x01;
pub const CRAM_WRITE: u8 = 0x03;
pub const VSRAM_WRITE: u8 = 0x05;
pub const VRAM_READ: u8 = 0x00;
pub const CRAM_READ: u8 = 0x08;
pub const VSRAM_READ: u8 = 0x04;
pub const DMA: u8 = 0x20;

/// Flat 68000 memory for DMA sources.
pub struct Rom {
    words: Vec<u16>,
}

impl Rom {
    pub fn new(words: Vec<u16>) -> Self {
        Self { words }
    }
}

impl WordBus for Rom {
    fn read_word(&self, address: u32) -> u16 {
        self.words
            .get((address / 2) as usize)
            .copied()
            .unwrap_or(0)
    }
}

/// The two control words selecting `code` at `address`.
pub fn command(code: u8, address: u16) -> [u16; 2] {
    [
        u16::from(code & 0x03) << 14 | (address & 0x3FFF),
        u16::from(code & 0x3C) << 2 | address >> 14,
    ]
}

pub fn set_registers(vdp: &mut Vdp, regs: &[(u8, u8)]) {
    for &(index, value) in regs {
        vdp.write_control(0, 0x8000 | u16::from(index) << 8 | u16::from(value), &OpenBus);
    }
}

pub fn select(vdp: &mut Vdp, code: u8, address: u16) {
    for word in command(code, address) {
        vdp.write_control(0, word, &OpenBus);
    }
}

pub fn write_words(vdp: &mut Vdp, code: u8, address: u16, words: &[u16]) {
    select(vdp, code, address);
    for &word in words {
        vdp.write_data(0, word);
    }
}

/// H40, display on, auto-increment 2, plane A at $C000, plane B at $E000,
/// sprites at $F000, scroll tables at $FC00.
pub fn h40_display() -> Vdp {
    let mut vdp = Vdp::default();
    set_registers(
        &mut vdp,
        &[
            (0, 0x04),
            (1, 0x44),
            (2, 0x30),
            (4, 0x07),
            (5, 0x78),
            (12, 0x81),
            (13, 0x3F),
            (15, 0x02),
        ],
    );
    vdp
}

/// RGB of framebuffer pixel (`x`, `row`).
pub fn pixel(vdp: &Vdp, x: usize, row: usize) -> [u8; 3] {
    let offset = row * vdp.framebuffer_stride() + x * 4;
    let fb = vdp.framebuffer();
    [fb[offset], fb[offset + 1], fb[offset + 2]]
}

pub const RED: u16 = 0x000E;
pub const GREEN: u16 = 0x00E0;
pub const BLUE: u16 = 0x0E00;
