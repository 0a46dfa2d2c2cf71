//! Joypad models.

use log::{debug, trace};

/// 68000 cycles (about 1.5 ms) without a TH edge after which a 6-button
/// pad returns to state 0. The real pad uses an RC timer, so the same
/// figure serves NTSC and PAL.
pub const SIX_BUTTON_TIMEOUT_CYCLES: u64 = 11_506;

/// Button state, `true` = pressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Buttons {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub a: bool,
    pub b: bool,
    pub c: bool,
    pub start: bool,
    pub x: bool,
    pub y: bool,
    pub z: bool,
    pub mode: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PadKind {
    ThreeButton,
    SixButton,
}

/// One pad plugged into a controller port.
#[derive(Debug, Clone)]
pub struct Pad {
    kind: PadKind,
    buttons: Buttons,
    /// 6-button protocol state (0-7).
    state: u8,
    /// TH level seen at the last edge. Pulled high at power-on.
    last_th_high: bool,
    /// Cycle of the last counted edge, 0 before the first.
    last_edge_cycle: u64,
}

/// Active-low line: bit set when the button is released.
fn line(pressed: bool, bit: u8) -> u8 {
    if pressed { 0 } else { bit }
}

impl Pad {
    #[must_use]
    pub fn new(kind: PadKind) -> Self {
        Self {
            kind,
            buttons: Buttons::default(),
            state: 0,
            last_th_high: true,
            last_edge_cycle: 0,
        }
    }

    #[must_use]
    pub fn kind(&self) -> PadKind {
        self.kind
    }

    #[must_use]
    pub fn buttons(&self) -> Buttons {
        self.buttons
    }

    pub fn set_buttons(&mut self, buttons: Buttons) {
        self.buttons = buttons;
    }

    /// Current 6-button protocol state. Always 0 on a 3-button pad.
    #[must_use]
    pub fn state(&self) -> u8 {
        self.state
    }

    fn timed_out(&self, cycle: u64) -> bool {
        cycle > 0
            && self.last_edge_cycle > 0
            && cycle.saturating_sub(self.last_edge_cycle) >= SIX_BUTTON_TIMEOUT_CYCLES
    }

    fn expire(&mut self, cycle: u64) {
        if self.timed_out(cycle) && (self.state != 0 || !self.last_th_high) {
            debug!("6-button pad idle since cycle {}, state reset", self.last_edge_cycle);
            self.state = 0;
            self.last_th_high = true;
        }
    }

    /// The console drove TH to `th_high` at `cycle`.
    pub fn drive_th(&mut self, cycle: u64, th_high: bool) {
        if self.kind != PadKind::SixButton || th_high == self.last_th_high {
            return;
        }
        // After a timeout TH counts as idle-high again, so a rising write
        // is no longer an edge.
        self.expire(cycle);
        if th_high == self.last_th_high {
            return;
        }
        self.state = (self.state + 1) & 0x07;
        self.last_th_high = th_high;
        self.last_edge_cycle = cycle;
        trace!("6-button pad TH edge -> state {}", self.state);
    }

    /// The six input lines (bits 5-0) plus the pulled-up bits 7-6.
    pub fn read(&mut self, cycle: u64, th_high: bool) -> u8 {
        let b = &self.buttons;
        let upper = line(b.c, 0x20) | line(b.b, 0x10);
        let lower = line(b.start, 0x20) | line(b.a, 0x10);
        let dpad = line(b.right, 0x08) | line(b.left, 0x04);
        let vertical = line(b.down, 0x02) | line(b.up, 0x01);

        let lines = match self.kind {
            PadKind::ThreeButton if th_high => upper | dpad | vertical,
            PadKind::ThreeButton => lower | vertical,
            PadKind::SixButton => {
                self.expire(cycle);
                let b = &self.buttons;
                match self.state {
                    1 | 3 => lower | vertical,
                    // All four low: identifies a 6-button pad.
                    5 => lower,
                    6 => {
                        upper
                            | line(b.mode, 0x08)
                            | line(b.x, 0x04)
                            | line(b.y, 0x02)
                            | line(b.z, 0x01)
                    }
                    7 => lower | 0x0F,
                    _ => upper | dpad | vertical,
                }
            }
        };
        0xC0 | lines
    }
}
