//! VRAM, CRAM and VSRAM storage.
//!
//! All addressing wraps or masks into range; nothing here can fail.

pub const VRAM_SIZE: usize = 0x1_0000;
pub const CRAM_SIZE: usize = 128;
pub const VSRAM_SIZE: usize = 80;

/// Colour-significant bits of a CRAM word: `----BBB- GGG-RRR-`.
const CRAM_HI_MASK: u8 = 0x0E;
const CRAM_LO_MASK: u8 = 0xEE;
/// VSRAM holds 10-bit scroll values.
const VSRAM_HI_MASK: u8 = 0x03;

/// A word that landed in CRAM or VSRAM, after masking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StoredWord {
    /// Even byte offset the word was stored at.
    pub addr: usize,
    pub hi: u8,
    pub lo: u8,
}

pub(crate) struct VideoMemory {
    pub vram: Box<[u8]>,
    pub cram: [u8; CRAM_SIZE],
    pub vsram: [u8; VSRAM_SIZE],
}

impl VideoMemory {
    pub fn new() -> Self {
        Self {
            vram: vec![0; VRAM_SIZE].into_boxed_slice(),
            cram: [0; CRAM_SIZE],
            vsram: [0; VSRAM_SIZE],
        }
    }

    pub fn vram_byte(&self, addr: u16) -> u8 {
        self.vram[usize::from(addr)]
    }

    /// Big-endian word at `addr`, wrapping at the top of VRAM.
    pub fn vram_word(&self, addr: u16) -> u16 {
        u16::from(self.vram_byte(addr)) << 8 | u16::from(self.vram_byte(addr.wrapping_add(1)))
    }

    pub fn set_vram_byte(&mut self, addr: u16, value: u8) {
        self.vram[usize::from(addr)] = value;
    }

    /// Word write through the data port. An odd address stores the bytes
    /// swapped at the even address below it.
    pub fn write_vram_word(&mut self, addr: u16, word: u16) {
        let [hi, lo] = word.to_be_bytes();
        let even = addr & !1;
        if addr & 1 == 0 {
            self.set_vram_byte(even, hi);
            self.set_vram_byte(even.wrapping_add(1), lo);
        } else {
            self.set_vram_byte(even, lo);
            self.set_vram_byte(even.wrapping_add(1), hi);
        }
    }

    pub fn write_cram_word(&mut self, addr: u16, word: u16) -> StoredWord {
        let addr = usize::from(addr) & (CRAM_SIZE - 2);
        let [hi, lo] = word.to_be_bytes();
        let stored = StoredWord {
            addr,
            hi: hi & CRAM_HI_MASK,
            lo: lo & CRAM_LO_MASK,
        };
        self.cram[addr] = stored.hi;
        self.cram[addr + 1] = stored.lo;
        stored
    }

    /// Returns `None` for addresses past the 40 scroll entries.
    pub fn write_vsram_word(&mut self, addr: u16, word: u16) -> Option<StoredWord> {
        let addr = usize::from(addr & 0x7F) & !1;
        if addr >= VSRAM_SIZE {
            return None;
        }
        let [hi, lo] = word.to_be_bytes();
        let stored = StoredWord {
            addr,
            hi: hi & VSRAM_HI_MASK,
            lo,
        };
        self.vsram[addr] = stored.hi;
        self.vsram[addr + 1] = stored.lo;
        Some(stored)
    }

    pub fn cram_word(&self, addr: u16) -> u16 {
        let addr = usize::from(addr) & (CRAM_SIZE - 2);
        u16::from(self.cram[addr]) << 8 | u16::from(self.cram[addr + 1])
    }

    /// Scroll word at `addr`, or 0 past the end of VSRAM.
    pub fn vsram_word(&self, addr: u16) -> u16 {
        let addr = usize::from(addr & 0x7F) & !1;
        if addr >= VSRAM_SIZE {
            return 0;
        }
        u16::from(self.vsram[addr]) << 8 | u16::from(self.vsram[addr + 1])
    }
}
