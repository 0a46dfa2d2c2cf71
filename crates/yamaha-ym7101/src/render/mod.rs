//! Scanline renderer.
//!
//! Each line is drawn in two stages. Plane B, plane A (or the window) and
//! the sprites are first decoded into per-layer line buffers holding palette
//! line, colour index and priority. Compositing then resolves priority and
//! brightness per pixel and writes RGBA into the framebuffer.

mod composite;
mod plane;
mod sprite;

use crate::Vdp;
use crate::memory::CRAM_SIZE;

/// Framebuffer width. H32 lines are stretched to fill it.
pub const FB_WIDTH: usize = 320;
/// Framebuffer height: 240 lines doubled by double-resolution interlace.
pub const FB_MAX_HEIGHT: usize = 480;
/// Bytes per framebuffer row (RGBA).
pub const FB_STRIDE: usize = FB_WIDTH * 4;

/// One layer's contribution to one pixel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct LayerPixel {
    /// Colour index within the palette line. 0 is transparent.
    pub colour: u8,
    pub palette: u8,
    pub priority: bool,
}

impl LayerPixel {
    pub fn is_opaque(self) -> bool {
        self.colour != 0
    }

    /// Index of this pixel's colour among the 64 CRAM entries.
    pub fn cram_index(self) -> u8 {
        self.palette * 16 + self.colour
    }
}

/// Decoded layers for the line being rendered.
pub(crate) struct LineLayers {
    pub plane_a: [LayerPixel; FB_WIDTH],
    pub plane_b: [LayerPixel; FB_WIDTH],
    pub sprites: [LayerPixel; FB_WIDTH],
}

impl LineLayers {
    pub fn new() -> Self {
        Self {
            plane_a: [LayerPixel::default(); FB_WIDTH],
            plane_b: [LayerPixel::default(); FB_WIDTH],
            sprites: [LayerPixel::default(); FB_WIDTH],
        }
    }

    fn clear(&mut self) {
        self.plane_a.fill(LayerPixel::default());
        self.plane_b.fill(LayerPixel::default());
        self.sprites.fill(LayerPixel::default());
    }
}

/// Which line of the display is being drawn.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LineContext {
    /// Scanline within the field, as passed by the driver.
    pub line: u16,
    /// Line within the full raster. Equals `line` except in double
    /// resolution, where fields interleave: `line * 2 + odd`.
    pub raster: u16,
}

/// Expand a 3-bit colour channel to 8 bits.
fn expand_channel(c: u8) -> u8 {
    (c << 5) | (c << 2) | (c >> 1)
}

/// RGB for CRAM entry `index` (0-63). Entries are `----BBB- GGG-RRR-`.
pub(crate) fn cram_rgb(cram: &[u8; CRAM_SIZE], index: u8) -> [u8; 3] {
    let offset = usize::from(index & 0x3F) * 2;
    let hi = cram[offset];
    let lo = cram[offset + 1];
    [
        expand_channel((lo >> 1) & 0x07),
        expand_channel((lo >> 5) & 0x07),
        expand_channel((hi >> 1) & 0x07),
    ]
}

impl Vdp {
    /// Render scanline `line` into the framebuffer.
    ///
    /// In double-resolution interlace the line lands on row `line * 2 + odd`.
    /// Rows past the bottom of the framebuffer are ignored.
    pub fn render_scanline(&mut self, line: u16) {
        let row = if self.regs.double_resolution() {
            usize::from(line) * 2 + usize::from(self.odd_field)
        } else {
            usize::from(line)
        };
        if row >= FB_MAX_HEIGHT {
            return;
        }
        let raster = row as u16;

        if !self.regs.display_enabled() {
            self.fill_backdrop_row(row);
            return;
        }

        let ctx = LineContext { line, raster };
        self.layers.clear();
        self.draw_plane_b(ctx);
        self.draw_plane_a_and_window(ctx);
        self.draw_sprites(ctx);
        self.composite_line(row);
    }

    fn fill_backdrop_row(&mut self, row: usize) {
        let (palette, colour) = self.regs.backdrop();
        let [r, g, b] = cram_rgb(&self.mem.cram, palette * 16 + colour);
        let start = row * FB_STRIDE;
        for pixel in self.framebuffer[start..start + FB_STRIDE].chunks_exact_mut(4) {
            pixel.copy_from_slice(&[r, g, b, 0xFF]);
        }
    }

    /// RGBA pixels, `FB_STRIDE` bytes per row, `FB_MAX_HEIGHT` rows.
    #[must_use]
    pub fn framebuffer(&self) -> &[u8] {
        &self.framebuffer
    }

    #[must_use]
    pub fn framebuffer_stride(&self) -> usize {
        FB_STRIDE
    }

    /// Rows of the framebuffer a full frame covers in the current mode.
    #[must_use]
    pub fn render_height(&self) -> u16 {
        let height = self.regs.active_height();
        if self.regs.double_resolution() {
            height * 2
        } else {
            height
        }
    }
}

#[cfg(test)]
mod tests {
    use emu_core::OpenBus;

    use super::*;

    #[test]
    fn channels_expand_to_full_range() {
        assert_eq!(expand_channel(0), 0);
        assert_eq!(expand_channel(7), 255);
        assert_eq!(expand_channel(4), 0x92);
    }

    #[test]
    fn cram_entry_decodes_bgr() {
        let mut cram = [0; CRAM_SIZE];
        cram[2] = 0x0E;
        cram[3] = 0x02;
        assert_eq!(cram_rgb(&cram, 1), [0x24, 0, 255]);
    }

    #[test]
    fn display_off_draws_backdrop_row() {
        let mut vdp = Vdp::default();
        for word in [0x8705, 0xC00A, 0x0000] {
            vdp.write_control(0, word, &OpenBus);
        }
        vdp.write_data(0, 0x000E);
        vdp.render_scanline(3);
        let row = &vdp.framebuffer()[3 * FB_STRIDE..4 * FB_STRIDE];
        assert!(row.chunks_exact(4).all(|p| p == [255, 0, 0, 255]));
    }

    #[test]
    fn rows_outside_framebuffer_are_ignored() {
        let mut vdp = Vdp::default();
        vdp.write_control(0, 0x8C06, &OpenBus);
        vdp.odd_field = true;
        let before = vdp.framebuffer().to_vec();
        vdp.render_scanline(240);
        assert_eq!(vdp.framebuffer(), &before[..]);
    }

    #[test]
    fn huge_line_numbers_in_double_resolution_are_ignored() {
        let mut vdp = Vdp::default();
        // Red backdrop, so a wrapped row would show up.
        for word in [0x8C06, 0xC000, 0x0000] {
            vdp.write_control(0, word, &OpenBus);
        }
        vdp.write_data(0, 0x000E);
        let before = vdp.framebuffer().to_vec();
        vdp.render_scanline(40_000);
        vdp.odd_field = true;
        vdp.render_scanline(32_768);
        assert_eq!(vdp.framebuffer(), &before[..]);
    }

    #[test]
    fn render_height_doubles_in_double_resolution() {
        let mut vdp = Vdp::default();
        assert_eq!(vdp.render_height(), 224);
        vdp.write_control(0, 0x8C06, &OpenBus);
        assert_eq!(vdp.render_height(), 448);
        vdp.write_control(0, 0x8108, &OpenBus);
        assert_eq!(vdp.render_height(), 480);
    }
}
