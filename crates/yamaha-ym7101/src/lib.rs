//! Yamaha YM7101 VDP, the Mega Drive / Genesis video display processor.
//!
//! The VDP owns 64 KiB of VRAM, 64 words of colour RAM and 40 words of
//! vertical scroll RAM. The 68000 reaches it through a control port and a
//! data port. Two scroll planes, a fixed window and up to 80 sprites are
//! composited per scanline into a 320x480 RGBA framebuffer.
//!
//! # Standalone IC
//!
//! The VDP never owns the 68000 bus. DMA source reads go through a
//! [`WordBus`](emu_core::WordBus) passed to the port entry points, and every
//! entry point takes the current master cycle so DMA and mid-line writes can
//! be placed in time.
//!
//! # Driver contract
//!
//! Per scanline the machine calls [`Vdp::set_h_blank`] (false),
//! [`Vdp::start_scanline`], [`Vdp::begin_scanline_timing`], runs the CPU
//! (polling [`Vdp::take_stall_cycles`] and
//! [`Vdp::take_asserted_interrupt_level`]), then [`Vdp::update_h_counter`],
//! [`Vdp::set_h_blank`] (true) and finally [`Vdp::render_scanline`] for
//! lines inside the active display.

mod config;
mod dma;
mod memory;
mod mmio;
mod port;
mod registers;
mod render;
mod scanline;
mod timing;

use emu_core::{Observable, Value};

pub use config::{ConfigError, DEFAULT_ACTIVE_DISPLAY_PERCENT, Region, VdpConfig};
pub use dma::bytes_per_line;
pub use memory::{CRAM_SIZE, VRAM_SIZE, VSRAM_SIZE};
pub use mmio::AccessSize;
pub use port::status;
pub use registers::{DmaMode, HScrollMode, InterlaceMode, REGISTER_COUNT, Registers};
pub use render::{FB_MAX_HEIGHT, FB_STRIDE, FB_WIDTH};
pub use timing::{LineInterrupts, v_counter_for_line};

use memory::VideoMemory;
use render::LineLayers;
use scanline::ScanlineTiming;

/// 68000 interrupt level of the vertical interrupt.
pub const V_INT_LEVEL: u8 = 6;
/// 68000 interrupt level of the horizontal interrupt.
pub const H_INT_LEVEL: u8 = 4;

/// Yamaha YM7101 video display processor.
pub struct Vdp {
    config: VdpConfig,
    regs: Registers,
    mem: VideoMemory,

    /// First control word received, waiting for the second.
    pending: bool,
    /// Access code (6 bits: target, direction, DMA request).
    code: u8,
    /// Working address, advanced by register 15 after each access.
    address: u16,
    /// Prefetched word for data port reads.
    read_buffer: u16,

    /// Cycle at which the last DMA completes.
    dma_end_cycle: u64,
    /// CPU cycles owed for the last 68000-to-VDP transfer.
    dma_stall_cycles: u64,
    /// Fill armed, waiting for its data port write.
    dma_fill_pending: bool,

    v_int_pending: bool,
    sprite_overflow: bool,
    sprite_collision: bool,
    v_blank: bool,
    h_blank: bool,
    odd_field: bool,

    line: u16,
    v_counter: u8,
    h_counter: u8,
    /// Lines left until the next horizontal interrupt. Goes negative on
    /// underflow before it reloads.
    h_int_counter: i16,
    /// HV value frozen by the latch, returned by HV reads until released.
    hv_latch: Option<u16>,
    /// Interrupt level raised by a register write, taken by the driver.
    asserted_level: u8,

    timing: ScanlineTiming,
    layers: LineLayers,
    framebuffer: Vec<u8>,
}

impl Vdp {
    #[must_use]
    pub fn new(config: VdpConfig) -> Self {
        Self {
            config,
            regs: Registers::new(),
            mem: VideoMemory::new(),
            pending: false,
            code: 0,
            address: 0,
            read_buffer: 0,
            dma_end_cycle: 0,
            dma_stall_cycles: 0,
            dma_fill_pending: false,
            v_int_pending: false,
            sprite_overflow: false,
            sprite_collision: false,
            v_blank: false,
            h_blank: false,
            odd_field: false,
            line: 0,
            v_counter: 0,
            h_counter: 0,
            h_int_counter: 0,
            hv_latch: None,
            asserted_level: 0,
            timing: ScanlineTiming::new(),
            layers: LineLayers::new(),
            framebuffer: [0, 0, 0, 0xFF].repeat(FB_WIDTH * FB_MAX_HEIGHT),
        }
    }

    #[must_use]
    pub fn config(&self) -> &VdpConfig {
        &self.config
    }

    #[must_use]
    pub fn registers(&self) -> &Registers {
        &self.regs
    }

    #[must_use]
    pub fn vram(&self) -> &[u8] {
        &self.mem.vram
    }

    /// Colour RAM as stored: 64 big-endian words.
    #[must_use]
    pub fn cram(&self) -> &[u8; CRAM_SIZE] {
        &self.mem.cram
    }

    /// Vertical scroll RAM as stored: 40 big-endian words.
    #[must_use]
    pub fn vsram(&self) -> &[u8; VSRAM_SIZE] {
        &self.mem.vsram
    }

    /// Current scanline, as last passed to [`Vdp::start_scanline`].
    #[must_use]
    pub fn line(&self) -> u16 {
        self.line
    }

    #[must_use]
    pub fn v_blank(&self) -> bool {
        self.v_blank
    }

    #[must_use]
    pub fn odd_field(&self) -> bool {
        self.odd_field
    }

    #[must_use]
    pub fn v_int_pending(&self) -> bool {
        self.v_int_pending
    }
}

impl Default for Vdp {
    fn default() -> Self {
        Self::new(VdpConfig::default())
    }
}

impl Observable for Vdp {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("registers.") {
            let index: usize = rest.parse().ok()?;
            return (index < REGISTER_COUNT).then(|| self.regs.get(index).into());
        }
        let value = match path {
            "code" => self.code.into(),
            "address" => self.address.into(),
            "pending" => self.pending.into(),
            "v_int_pending" => self.v_int_pending.into(),
            "sprite_overflow" => self.sprite_overflow.into(),
            "sprite_collision" => self.sprite_collision.into(),
            "v_blank" => self.v_blank.into(),
            "h_blank" => self.h_blank.into(),
            "odd_field" => self.odd_field.into(),
            "line" => self.line.into(),
            "v_counter" => self.v_counter.into(),
            "h_counter" => self.h_counter.into(),
            "h_int_counter" => self.h_int_counter.into(),
            "dma.end_cycle" => self.dma_end_cycle.into(),
            "dma.stall" => self.dma_stall_cycles.into(),
            "dma.fill_pending" => self.dma_fill_pending.into(),
            "mode.h40" => self.regs.h40().into(),
            "mode.interlace" => format!("{:?}", self.regs.interlace_mode()).into(),
            "mode.shadow_highlight" => self.regs.shadow_highlight().into(),
            _ => return None,
        };
        Some(value)
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "registers.<n>",
            "code",
            "address",
            "pending",
            "v_int_pending",
            "sprite_overflow",
            "sprite_collision",
            "v_blank",
            "h_blank",
            "odd_field",
            "line",
            "v_counter",
            "h_counter",
            "h_int_counter",
            "dma.end_cycle",
            "dma.stall",
            "dma.fill_pending",
            "mode.h40",
            "mode.interlace",
            "mode.shadow_highlight",
        ]
    }
}
