//! Planes A and B, the window, and tile decoding shared with sprites.

use super::{LayerPixel, LineContext};
use crate::Vdp;
use crate::memory::VSRAM_SIZE;
use crate::registers::HScrollMode;

/// Decoded nametable entry. Sprite attribute words share the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct TileAttributes {
    pub priority: bool,
    pub palette: u8,
    pub v_flip: bool,
    pub h_flip: bool,
    pub tile: u16,
}

impl TileAttributes {
    pub fn from_word(word: u16) -> Self {
        Self {
            priority: word & 0x8000 != 0,
            palette: ((word >> 13) & 0x03) as u8,
            v_flip: word & 0x1000 != 0,
            h_flip: word & 0x0800 != 0,
            tile: word & 0x07FF,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Plane {
    A,
    B,
}

impl Plane {
    /// Byte offset of this plane's word within a scroll table entry.
    fn scroll_word_offset(self) -> u16 {
        match self {
            Self::A => 0,
            Self::B => 2,
        }
    }
}

/// Sign-extend the low 10 bits of a scroll word.
fn sign_extend_10(word: u16) -> i32 {
    ((i32::from(word) & 0x3FF) ^ 0x200) - 0x200
}

impl Vdp {
    /// Colour index of one pixel of a tile. `row` counts from 0 to the tile
    /// height; flips are applied before the lookup.
    pub(super) fn tile_colour(&self, tile: u16, col: u16, row: u16, h_flip: bool, v_flip: bool) -> u8 {
        let rows = self.regs.tile_rows();
        let row = if v_flip { rows - 1 - row } else { row };
        let col = if h_flip { 7 - col } else { col };
        let base = tile.wrapping_mul(self.regs.tile_bytes());
        let byte = self.mem.vram_byte(base.wrapping_add(row * 4 + col / 2));
        if col & 1 == 0 { byte >> 4 } else { byte & 0x0F }
    }

    fn entry_pixel(&self, entry: u16, col: u16, row: u16) -> LayerPixel {
        let attrs = TileAttributes::from_word(entry);
        LayerPixel {
            colour: self.tile_colour(attrs.tile, col, row, attrs.h_flip, attrs.v_flip),
            palette: attrs.palette,
            priority: attrs.priority,
        }
    }

    /// Horizontal scroll for planes A and B on `line`.
    fn h_scroll(&self, line: u16) -> (i32, i32) {
        let offset = match self.regs.h_scroll_mode() {
            HScrollMode::Full => 0,
            HScrollMode::PerCell => (line & !7) * 4,
            HScrollMode::PerLine => line * 4,
        };
        let addr = self.regs.h_scroll_base().wrapping_add(offset);
        (
            sign_extend_10(self.mem.vram_word(addr)),
            sign_extend_10(self.mem.vram_word(addr.wrapping_add(2))),
        )
    }

    /// Vertical scroll for `plane` at screen column `x`.
    ///
    /// Full-screen scroll is latched when the line starts, so writes made
    /// during the line only count in per-column mode, and only if they
    /// happened before the column's first pixel.
    fn v_scroll(&self, plane: Plane, x: u16) -> u16 {
        let per_column = self.regs.v_scroll_per_column();
        let column_offset = if per_column { (x / 16) * 4 } else { 0 };
        let addr = usize::from(column_offset + plane.scroll_word_offset());
        if addr + 1 >= VSRAM_SIZE {
            return 0;
        }
        let word = |bytes: &[u8; VSRAM_SIZE]| u16::from(bytes[addr]) << 8 | u16::from(bytes[addr + 1]);

        let writes = &self.timing.vsram_writes;
        if writes.is_empty() || !self.timing.is_active() {
            return word(&self.mem.vsram);
        }
        if !per_column {
            return word(&self.timing.vsram_snapshot);
        }

        let column_start = (x / 16) * 16;
        writes
            .iter()
            .take_while(|w| w.column <= column_start)
            .filter(|w| w.word.addr == addr)
            .last()
            .map_or_else(
                || word(&self.timing.vsram_snapshot),
                |w| u16::from(w.word.hi) << 8 | u16::from(w.word.lo),
            )
    }

    /// Pixel of a scrolling plane at screen column `x`.
    fn scrolled_pixel(&self, plane: Plane, x: u16, ctx: LineContext, h_scroll: i32) -> LayerPixel {
        let base = match plane {
            Plane::A => self.regs.plane_a_base(),
            Plane::B => self.regs.plane_b_base(),
        };
        let (width_cells, height_cells) = self.regs.plane_size();
        let rows = self.regs.tile_rows();
        let v_mask = if self.regs.double_resolution() { 0x7FF } else { 0x3FF };

        let plane_x = (i32::from(x) - h_scroll).rem_euclid(i32::from(width_cells) * 8) as u16;
        let plane_y = (i32::from(ctx.raster) + i32::from(self.v_scroll(plane, x) & v_mask))
            .rem_euclid(i32::from(height_cells) * i32::from(rows)) as u16;

        let cell = (plane_y / rows) * width_cells + plane_x / 8;
        let entry = self.mem.vram_word(base.wrapping_add(cell * 2));
        self.entry_pixel(entry, plane_x % 8, plane_y % rows)
    }

    pub(super) fn draw_plane_b(&mut self, ctx: LineContext) {
        let (_, h_scroll) = self.h_scroll(ctx.line);
        for x in 0..self.regs.active_width() {
            let pixel = self.scrolled_pixel(Plane::B, x, ctx, h_scroll);
            self.layers.plane_b[usize::from(x)] = pixel;
        }
    }

    pub(super) fn draw_plane_a_and_window(&mut self, ctx: LineContext) {
        let (h_scroll, _) = self.h_scroll(ctx.line);
        for x in 0..self.regs.active_width() {
            let pixel = if self.in_window(x, ctx.line) {
                self.window_pixel(x, ctx.raster)
            } else {
                self.scrolled_pixel(Plane::A, x, ctx, h_scroll)
            };
            self.layers.plane_a[usize::from(x)] = pixel;
        }
    }

    /// Whether screen position (`x`, `line`) shows the window instead of
    /// plane A. Each boundary register splits the screen in two; with both
    /// set the window covers either half-plane.
    pub(super) fn in_window(&self, x: u16, line: u16) -> bool {
        let (h_boundary, right) = self.regs.window_h_split();
        let (v_boundary, bottom) = self.regs.window_v_split();
        let in_h = (h_boundary != 0).then(|| if right { x >= h_boundary } else { x < h_boundary });
        let in_v = (v_boundary != 0).then(|| if bottom { line >= v_boundary } else { line < v_boundary });
        match (in_h, in_v) {
            (None, None) => false,
            (Some(h), None) => h,
            (None, Some(v)) => v,
            (Some(h), Some(v)) => h || v,
        }
    }

    /// The window does not scroll: screen cells map directly to its table.
    fn window_pixel(&self, x: u16, raster: u16) -> LayerPixel {
        let width_cells = if self.regs.h40() { 64 } else { 32 };
        let rows = self.regs.tile_rows();
        let cell = (raster / rows) * width_cells + x / 8;
        let entry = self.mem.vram_word(self.regs.window_base().wrapping_add(cell * 2));
        self.entry_pixel(entry, x % 8, raster % rows)
    }
}

#[cfg(test)]
mod tests {
    use emu_core::OpenBus;

    use super::*;
    use crate::memory::StoredWord;
    use crate::scanline::MidLineWrite;

    fn ctx(line: u16) -> LineContext {
        LineContext { line, raster: line }
    }

    fn regs(vdp: &mut Vdp, words: &[u16]) {
        for &word in words {
            vdp.write_control(0, word, &OpenBus);
        }
    }

    /// Fill tile `tile` with a solid colour (8-row tiles).
    fn solid_tile(vdp: &mut Vdp, tile: u16, colour: u8) {
        let byte = colour << 4 | colour;
        for offset in 0..32 {
            vdp.mem.set_vram_byte(tile * 32 + offset, byte);
        }
    }

    #[test]
    fn attributes_decode_every_field() {
        let attrs = TileAttributes::from_word(0xF8_01 | 0x0100);
        assert!(attrs.priority);
        assert_eq!(attrs.palette, 3);
        assert!(attrs.v_flip);
        assert!(attrs.h_flip);
        assert_eq!(attrs.tile, 0x0101);
    }

    #[test]
    fn tile_pixels_honour_flips() {
        let mut vdp = Vdp::default();
        // Tile 1, row 0: colours 1..8; row 7 byte 3: colours 9, 10.
        for (i, byte) in [0x12, 0x34, 0x56, 0x78].into_iter().enumerate() {
            vdp.mem.set_vram_byte(32 + i as u16, byte);
        }
        vdp.mem.set_vram_byte(32 + 28 + 3, 0x9A);
        assert_eq!(vdp.tile_colour(1, 0, 0, false, false), 1);
        assert_eq!(vdp.tile_colour(1, 7, 0, false, false), 8);
        assert_eq!(vdp.tile_colour(1, 0, 0, true, false), 8);
        assert_eq!(vdp.tile_colour(1, 0, 7, false, true), 1);
        assert_eq!(vdp.tile_colour(1, 0, 0, true, true), 0x0A);
    }

    #[test]
    fn h_scroll_sign_extends_ten_bits() {
        assert_eq!(sign_extend_10(0x0005), 5);
        assert_eq!(sign_extend_10(0x03FF), -1);
        assert_eq!(sign_extend_10(0xFE00), -512);
    }

    #[test]
    fn h_scroll_table_indexing_by_mode() {
        let mut vdp = Vdp::default();
        regs(&mut vdp, &[0x8D3F]);
        let base = 0xFC00;
        vdp.mem.write_vram_word(base, 1);
        vdp.mem.write_vram_word(base + 2, 2);
        vdp.mem.write_vram_word(base + 8 * 4, 3);
        vdp.mem.write_vram_word(base + 9 * 4, 4);
        assert_eq!(vdp.h_scroll(9), (1, 2));
        regs(&mut vdp, &[0x8B02]);
        assert_eq!(vdp.h_scroll(9).0, 3);
        regs(&mut vdp, &[0x8B03]);
        assert_eq!(vdp.h_scroll(9).0, 4);
    }

    #[test]
    fn plane_b_scrolls_horizontally() {
        let mut vdp = Vdp::default();
        regs(&mut vdp, &[0x8144, 0x8407, 0x8D3F]);
        solid_tile(&mut vdp, 1, 4);
        vdp.mem.write_vram_word(0xE000, 0x0001);
        vdp.mem.write_vram_word(0xFC02, 3);
        vdp.draw_plane_b(ctx(0));
        assert_eq!(vdp.layers.plane_b[2].colour, 0);
        assert_eq!(vdp.layers.plane_b[3].colour, 4);
        assert_eq!(vdp.layers.plane_b[10].colour, 4);
        assert_eq!(vdp.layers.plane_b[11].colour, 0);
    }

    #[test]
    fn plane_a_scrolls_vertically_and_wraps() {
        let mut vdp = Vdp::default();
        regs(&mut vdp, &[0x8230]);
        solid_tile(&mut vdp, 2, 9);
        // Cell (0, 31) of a 32x32 plane at 0xC000.
        vdp.mem.write_vram_word(0xC000 + 31 * 64, 0x0002);
        vdp.mem.write_vsram_word(0, 0x00F8);
        vdp.draw_plane_a_and_window(ctx(0));
        assert_eq!(vdp.layers.plane_a[0].colour, 9);
    }

    #[test]
    fn full_screen_v_scroll_ignores_mid_line_writes() {
        let mut vdp = Vdp::default();
        vdp.mem.vsram[1] = 0x10;
        vdp.begin_scanline_timing(0, 488);
        vdp.mem.vsram[1] = 0x20;
        vdp.timing.vsram_writes.push(MidLineWrite {
            column: 0,
            word: StoredWord { addr: 0, hi: 0, lo: 0x20 },
        });
        assert_eq!(vdp.v_scroll(Plane::A, 100), 0x10);
    }

    #[test]
    fn column_v_scroll_replays_writes_before_column_start() {
        let mut vdp = Vdp::default();
        regs(&mut vdp, &[0x8B04]);
        vdp.begin_scanline_timing(0, 488);
        // Column 2 (pixels 32..48) of plane A lives at VSRAM offset 8.
        for (column, lo) in [(16, 0x11), (32, 0x22), (40, 0x33)] {
            vdp.timing.vsram_writes.push(MidLineWrite {
                column,
                word: StoredWord { addr: 8, hi: 0, lo },
            });
        }
        vdp.mem.vsram[9] = 0x33;
        assert_eq!(vdp.v_scroll(Plane::A, 40), 0x22);
        assert_eq!(vdp.v_scroll(Plane::A, 20), 0x00, "column 1 never written");
    }

    #[test]
    fn window_needs_a_boundary() {
        let vdp = Vdp::default();
        assert!(!vdp.in_window(0, 0));
    }

    #[test]
    fn window_single_boundary_splits_screen() {
        let mut vdp = Vdp::default();
        regs(&mut vdp, &[0x9182]);
        assert!(!vdp.in_window(31, 100));
        assert!(vdp.in_window(32, 100));

        regs(&mut vdp, &[0x9100, 0x9202]);
        assert!(vdp.in_window(300, 15));
        assert!(!vdp.in_window(300, 16));
    }

    #[test]
    fn window_with_both_boundaries_is_a_union() {
        let mut vdp = Vdp::default();
        // Left 32 pixels, plus top 16 lines.
        regs(&mut vdp, &[0x9102, 0x9202]);
        assert!(vdp.in_window(10, 200), "inside horizontal half only");
        assert!(vdp.in_window(200, 10), "inside vertical half only");
        assert!(!vdp.in_window(200, 200));
    }

    #[test]
    fn window_replaces_plane_a_without_scrolling() {
        let mut vdp = Vdp::default();
        regs(&mut vdp, &[0x8C81, 0x8230, 0x8334, 0x9102, 0x8D3F]);
        solid_tile(&mut vdp, 3, 6);
        solid_tile(&mut vdp, 4, 2);
        // Window at 0xD000, 64 cells wide in H40: cell (1, 1).
        vdp.mem.write_vram_word(0xD000 + (64 + 1) * 2, 0x6003);
        // Plane A everywhere else shows tile 4.
        for cell in 0..(32 * 32) {
            vdp.mem.write_vram_word(0xC000 + cell * 2, 0x0004);
        }
        vdp.mem.write_vram_word(0xFC00, 100);
        vdp.draw_plane_a_and_window(ctx(8));
        let pixel = vdp.layers.plane_a[8];
        assert_eq!(pixel, LayerPixel { colour: 6, palette: 3, priority: false });
        assert_eq!(vdp.layers.plane_a[40].colour, 2);
    }
}
