//! Priority and brightness resolution.
//!
//! Both display modes pick pixels with the same priority order. Only the
//! final step differs: normal mode always shows full brightness, while
//! shadow/highlight mode derives brightness from priority and from
//! operator sprites.

use std::ops::Range;

use super::{FB_STRIDE, FB_WIDTH, LayerPixel, LineLayers, cram_rgb};
use crate::Vdp;
use crate::memory::CRAM_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Brightness {
    Shadow,
    Normal,
    Highlight,
}

impl Brightness {
    fn apply(self, [r, g, b]: [u8; 3]) -> [u8; 3] {
        match self {
            Self::Shadow => [r >> 1, g >> 1, b >> 1],
            Self::Normal => [r, g, b],
            Self::Highlight => [r.saturating_add(128), g.saturating_add(128), b.saturating_add(128)],
        }
    }
}

/// Topmost opaque pixel: high priority sprite, A, B, then low priority
/// sprite, A, B.
fn topmost(layers: [LayerPixel; 3]) -> Option<LayerPixel> {
    layers
        .iter()
        .find(|p| p.priority && p.is_opaque())
        .or_else(|| layers.iter().find(|p| p.is_opaque()))
        .copied()
}

/// Final colour selection for one pixel.
trait Compositor {
    /// CRAM index and brightness given the sprite, plane A and plane B
    /// pixels, with `backdrop` as the CRAM index behind everything.
    fn resolve(&self, layers: [LayerPixel; 3], backdrop: u8) -> (u8, Brightness);

    /// Brightness of backdrop fills outside the composited area.
    fn backdrop_brightness(&self) -> Brightness;
}

struct NormalMode;

impl Compositor for NormalMode {
    fn resolve(&self, layers: [LayerPixel; 3], backdrop: u8) -> (u8, Brightness) {
        let index = topmost(layers).map_or(backdrop, LayerPixel::cram_index);
        (index, Brightness::Normal)
    }

    fn backdrop_brightness(&self) -> Brightness {
        Brightness::Normal
    }
}

struct ShadowHighlightMode;

impl Compositor for ShadowHighlightMode {
    fn resolve(&self, layers: [LayerPixel; 3], backdrop: u8) -> (u8, Brightness) {
        let [sprite, plane_a, plane_b] = layers;
        let planes = || {
            [plane_a, plane_b]
                .into_iter()
                .find(|p| p.is_opaque())
                .map_or(backdrop, LayerPixel::cram_index)
        };

        match topmost(layers) {
            // Anything high priority is lit normally.
            Some(top) if top.priority => (top.cram_index(), Brightness::Normal),
            Some(top) if top == sprite && sprite.palette == 3 => match sprite.colour {
                // Operators: not drawn, they relight what lies beneath.
                14 => (planes(), Brightness::Highlight),
                15 => (planes(), Brightness::Shadow),
                _ => (sprite.cram_index(), Brightness::Normal),
            },
            Some(top) => (top.cram_index(), Brightness::Shadow),
            None => (backdrop, Brightness::Shadow),
        }
    }

    fn backdrop_brightness(&self) -> Brightness {
        Brightness::Shadow
    }
}

/// Everything a span of pixels needs, borrowed from the VDP.
struct Painter<'a, C> {
    compositor: &'a C,
    layers: &'a LineLayers,
    backdrop: u8,
    left_column_blank: bool,
}

impl<C: Compositor> Painter<'_, C> {
    fn paint(&self, palette: &[u8; CRAM_SIZE], row: &mut [u8], span: Range<usize>) {
        for x in span {
            let (index, brightness) = if self.left_column_blank && x < 8 {
                (self.backdrop, self.compositor.backdrop_brightness())
            } else {
                self.compositor.resolve(
                    [
                        self.layers.sprites[x],
                        self.layers.plane_a[x],
                        self.layers.plane_b[x],
                    ],
                    self.backdrop,
                )
            };
            let [r, g, b] = brightness.apply(cram_rgb(palette, index));
            row[x * 4..x * 4 + 4].copy_from_slice(&[r, g, b, 0xFF]);
        }
    }
}

impl Vdp {
    pub(super) fn composite_line(&mut self, row: usize) {
        if self.regs.shadow_highlight() {
            self.composite_with(&ShadowHighlightMode, row);
        } else {
            self.composite_with(&NormalMode, row);
        }
    }

    /// Composite the decoded layers into framebuffer row `row`.
    ///
    /// CRAM writes logged during the line are replayed in order: the line
    /// is painted in spans, each with the palette as it stood when the beam
    /// reached it.
    fn composite_with<C: Compositor>(&mut self, compositor: &C, row: usize) {
        let width = usize::from(self.regs.active_width());
        let (palette_line, colour) = self.regs.backdrop();
        let painter = Painter {
            compositor,
            layers: &self.layers,
            backdrop: palette_line * 16 + colour,
            left_column_blank: self.regs.left_column_blank(),
        };
        let pixels = &mut self.framebuffer[row * FB_STRIDE..(row + 1) * FB_STRIDE];

        if self.timing.cram_writes.is_empty() {
            painter.paint(&self.mem.cram, pixels, 0..width);
        } else {
            let mut palette = self.timing.cram_snapshot;
            let mut start = 0;
            for write in &self.timing.cram_writes {
                let column = usize::from(write.column).min(width);
                if column > start {
                    painter.paint(&palette, pixels, start..column);
                    start = column;
                }
                palette[write.word.addr] = write.word.hi;
                palette[write.word.addr + 1] = write.word.lo;
            }
            painter.paint(&palette, pixels, start..width);
        }

        if width < FB_WIDTH {
            let [r, g, b] = compositor
                .backdrop_brightness()
                .apply(cram_rgb(&self.mem.cram, painter.backdrop));
            for pixel in pixels[width * 4..].chunks_exact_mut(4) {
                pixel.copy_from_slice(&[r, g, b, 0xFF]);
            }
            stretch_to_full_width(pixels, width);
        }
    }
}

/// Nearest-neighbour stretch of the first `width` pixels across the row.
/// Runs right to left so sources are read before they are overwritten.
fn stretch_to_full_width(pixels: &mut [u8], width: usize) {
    for dx in (0..FB_WIDTH).rev() {
        let sx = dx * width / FB_WIDTH;
        pixels.copy_within(sx * 4..sx * 4 + 4, dx * 4);
    }
}
