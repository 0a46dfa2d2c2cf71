//! Sprite attribute table traversal.
//!
//! The table is a linked list in VRAM starting at entry 0. Each entry is
//! 8 bytes: Y (10 bits), size and link, attribute word, X (9 bits).
//! Traversal stops at link 0 or after the mode's table size, so a looping
//! chain simply truncates.

use super::plane::TileAttributes;
use super::{LayerPixel, LineContext};
use crate::Vdp;

/// Per-mode limits.
struct SpriteLimits {
    per_line: usize,
    pixels_per_line: usize,
    table_entries: usize,
}

const H40_LIMITS: SpriteLimits = SpriteLimits {
    per_line: 20,
    pixels_per_line: 320,
    table_entries: 80,
};

const H32_LIMITS: SpriteLimits = SpriteLimits {
    per_line: 16,
    pixels_per_line: 256,
    table_entries: 64,
};

#[derive(Debug, Clone, Copy)]
struct SpriteEntry {
    y: i32,
    width_cells: u16,
    height_cells: u16,
    link: u16,
    attrs: TileAttributes,
    x_raw: u16,
}

impl Vdp {
    fn sprite_entry(&self, index: u16, y_bias: i32) -> SpriteEntry {
        let addr = self.regs.sprite_table_base().wrapping_add(index * 8);
        let size = self.mem.vram_byte(addr.wrapping_add(2));
        SpriteEntry {
            y: i32::from(self.mem.vram_word(addr) & 0x3FF) - y_bias,
            width_cells: u16::from((size >> 2) & 0x03) + 1,
            height_cells: u16::from(size & 0x03) + 1,
            link: u16::from(self.mem.vram_byte(addr.wrapping_add(3)) & 0x7F),
            attrs: TileAttributes::from_word(self.mem.vram_word(addr.wrapping_add(4))),
            x_raw: self.mem.vram_word(addr.wrapping_add(6)) & 0x1FF,
        }
    }

    pub(super) fn draw_sprites(&mut self, ctx: LineContext) {
        let limits = if self.regs.h40() { &H40_LIMITS } else { &H32_LIMITS };
        let width = i32::from(self.regs.active_width());
        let rows = self.regs.tile_rows();
        // Double resolution doubles the Y coordinate space.
        let y_bias = if self.regs.double_resolution() { 256 } else { 128 };
        let raster = i32::from(ctx.raster);

        let mut on_line = 0;
        let mut pixels = 0;
        let mut nonzero_x_seen = false;
        let mut index = 0;

        for _ in 0..limits.table_entries {
            let sprite = self.sprite_entry(index, y_bias);
            let height = i32::from(sprite.height_cells * rows);

            if (sprite.y..sprite.y + height).contains(&raster) {
                on_line += 1;
                if on_line > limits.per_line {
                    self.sprite_overflow = true;
                    break;
                }

                // X = 0 masks the rest of the line, but only once a sprite
                // with a non-zero X has been found on it.
                if sprite.x_raw == 0 && nonzero_x_seen {
                    break;
                }
                nonzero_x_seen |= sprite.x_raw != 0;

                let x = i32::from(sprite.x_raw) - 128;
                let sprite_width = sprite.width_cells * 8;
                let mut row = (raster - sprite.y) as u16;
                if sprite.attrs.v_flip {
                    row = height as u16 - 1 - row;
                }

                for sx in 0..sprite_width {
                    // Off-screen pixels still use up the line's budget.
                    pixels += 1;
                    if pixels > limits.pixels_per_line {
                        break;
                    }
                    let screen_x = x + i32::from(sx);
                    if !(0..width).contains(&screen_x) {
                        continue;
                    }

                    let col = if sprite.attrs.h_flip { sprite_width - 1 - sx } else { sx };
                    // Cells are stored column by column.
                    let tile = sprite
                        .attrs
                        .tile
                        .wrapping_add((col / 8) * sprite.height_cells + row / rows);
                    let colour = self.tile_colour(tile, col % 8, row % rows, false, false);
                    if colour == 0 {
                        continue;
                    }

                    let slot = &mut self.layers.sprites[screen_x as usize];
                    if slot.is_opaque() {
                        self.sprite_collision = true;
                        continue;
                    }
                    *slot = LayerPixel {
                        colour,
                        palette: sprite.attrs.palette,
                        priority: sprite.attrs.priority,
                    };
                }

                if pixels > limits.pixels_per_line {
                    self.sprite_overflow = true;
                    break;
                }
            }

            if sprite.link == 0 {
                break;
            }
            index = sprite.link;
        }
    }
}
