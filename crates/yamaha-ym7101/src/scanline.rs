//! Where the CPU is within the current scanline, and what it changed there.
//!
//! The active part of a line is a fixed share of its CPU cycles. One
//! position type covers both pixel columns and H-counter values so the two
//! never disagree about where blanking starts.

use crate::memory::{CRAM_SIZE, StoredWord, VSRAM_SIZE};

/// H-counter value at the end of active display in H40 / H32.
const H40_ACTIVE_END: u8 = 0xB6;
const H32_ACTIVE_END: u8 = 0x93;
/// H-counter value at the start of horizontal blanking in H40 / H32.
const H40_BLANK_START: u8 = 0xE4;
const H32_BLANK_START: u8 = 0xE9;

/// Position within one scanline, in CPU cycles since the line began.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LinePosition {
    /// `elapsed` cycles into an active period `span` cycles long.
    Active { elapsed: u64, span: u64 },
    /// `elapsed` cycles into a blanking period `span` cycles long.
    Blank { elapsed: u64, span: u64 },
}

impl LinePosition {
    pub fn locate(elapsed: u64, total: u64, active_percent: u32) -> Self {
        let boundary = total * u64::from(active_percent) / 100;
        if elapsed < boundary {
            Self::Active {
                elapsed,
                span: boundary,
            }
        } else {
            Self::Blank {
                elapsed: elapsed - boundary,
                span: total.saturating_sub(boundary),
            }
        }
    }

    pub fn is_blank(self) -> bool {
        matches!(self, Self::Blank { .. })
    }

    /// Pixel column in `0..width`. Blanking clamps to the last column.
    pub fn column(self, width: u16) -> u16 {
        match self {
            Self::Active { elapsed, span } => (elapsed * u64::from(width) / span) as u16,
            Self::Blank { .. } => width - 1,
        }
    }

    /// H-counter value. Active display spans 0 up to the mode's active end,
    /// blanking spans the blank start up to 0xFF.
    pub fn h_counter(self, h40: bool) -> u8 {
        let (active_end, blank_start) = if h40 {
            (H40_ACTIVE_END, H40_BLANK_START)
        } else {
            (H32_ACTIVE_END, H32_BLANK_START)
        };
        match self {
            Self::Active { elapsed, span } => (elapsed * u64::from(active_end) / span) as u8,
            Self::Blank { span: 0, .. } => blank_start,
            Self::Blank { elapsed, span } => {
                let range = u64::from(0xFF - blank_start);
                blank_start.wrapping_add((elapsed * range / span) as u8)
            }
        }
    }
}

/// A CRAM or VSRAM word written during the line, with the pixel column
/// from which it is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MidLineWrite {
    pub column: u16,
    pub word: StoredWord,
}

/// Per-line timing window plus the memory writes made inside it.
pub(crate) struct ScanlineTiming {
    pub start_cycle: u64,
    pub total_cycles: u64,
    /// CRAM as it was when the window opened.
    pub cram_snapshot: [u8; CRAM_SIZE],
    pub vsram_snapshot: [u8; VSRAM_SIZE],
    pub cram_writes: Vec<MidLineWrite>,
    pub vsram_writes: Vec<MidLineWrite>,
}

impl ScanlineTiming {
    pub fn new() -> Self {
        Self {
            start_cycle: 0,
            total_cycles: 0,
            cram_snapshot: [0; CRAM_SIZE],
            vsram_snapshot: [0; VSRAM_SIZE],
            cram_writes: Vec::new(),
            vsram_writes: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.total_cycles > 0
    }

    /// Open a new line window. Snapshots the memories the CPU may rewrite.
    pub fn begin(
        &mut self,
        start_cycle: u64,
        total_cycles: u64,
        cram: &[u8; CRAM_SIZE],
        vsram: &[u8; VSRAM_SIZE],
    ) {
        self.start_cycle = start_cycle;
        self.total_cycles = total_cycles;
        self.cram_snapshot = *cram;
        self.vsram_snapshot = *vsram;
        self.cram_writes.clear();
        self.vsram_writes.clear();
    }

    /// Position of `cycle` in the current line, or `None` before the line
    /// started.
    pub fn position(&self, cycle: u64, active_percent: u32) -> Option<LinePosition> {
        let elapsed = cycle.checked_sub(self.start_cycle)?;
        Some(LinePosition::locate(
            elapsed,
            self.total_cycles,
            active_percent,
        ))
    }

    /// Pixel column for a write made at `cycle`. Anything at or before the
    /// start of the line maps to column 0.
    pub fn column(&self, cycle: u64, width: u16, active_percent: u32) -> u16 {
        if cycle <= self.start_cycle {
            return 0;
        }
        self.position(cycle, active_percent)
            .map_or(0, |pos| pos.column(width))
    }

    /// Record a CRAM write made inside the open window.
    pub fn log_cram(&mut self, column: u16, word: StoredWord) {
        self.cram_writes.push(MidLineWrite { column, word });
    }

    pub fn log_vsram(&mut self, column: u16, word: StoredWord) {
        self.vsram_writes.push(MidLineWrite { column, word });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_share_maps_linearly_to_columns() {
        // 488 cycles, 73% active: boundary at cycle 356.
        assert_eq!(LinePosition::locate(0, 488, 73).column(320), 0);
        assert_eq!(LinePosition::locate(54, 488, 73).column(320), 48);
        assert_eq!(LinePosition::locate(178, 488, 73).column(320), 160);
        assert_eq!(LinePosition::locate(355, 488, 73).column(320), 319);
    }

    #[test]
    fn blanking_clamps_to_last_column() {
        let pos = LinePosition::locate(356, 488, 73);
        assert!(pos.is_blank());
        assert_eq!(pos.column(320), 319);
        assert_eq!(LinePosition::locate(400, 488, 73).column(256), 255);
    }

    #[test]
    fn h_counter_ranges_differ_by_mode() {
        assert_eq!(LinePosition::locate(0, 488, 73).h_counter(true), 0x00);
        assert_eq!(LinePosition::locate(178, 488, 73).h_counter(true), 0x5B);
        assert_eq!(LinePosition::locate(356, 488, 73).h_counter(true), 0xE4);
        assert_eq!(LinePosition::locate(356, 488, 73).h_counter(false), 0xE9);
        assert_eq!(LinePosition::locate(488, 488, 73).h_counter(true), 0xFF);
    }

    #[test]
    fn column_is_zero_before_line_start() {
        let mut timing = ScanlineTiming::new();
        timing.begin(1000, 488, &[0; CRAM_SIZE], &[0; VSRAM_SIZE]);
        assert_eq!(timing.column(900, 320, 73), 0);
        assert_eq!(timing.column(1000, 320, 73), 0);
        assert_eq!(timing.column(1178, 320, 73), 160);
    }

    #[test]
    fn without_a_window_every_write_shares_one_column() {
        let timing = ScanlineTiming::new();
        assert_eq!(timing.column(100, 320, 73), 319);
        assert_eq!(timing.column(0, 320, 73), 0);
    }

    #[test]
    fn opening_a_window_drops_the_previous_line_log() {
        let mut timing = ScanlineTiming::new();
        let mut cram = [0; CRAM_SIZE];
        timing.begin(0, 488, &cram, &[0; VSRAM_SIZE]);
        timing.log_cram(40, StoredWord { addr: 2, hi: 0, lo: 0xE0 });
        assert_eq!(timing.cram_writes.len(), 1);

        cram[2] = 0x0E;
        timing.begin(488, 488, &cram, &[0; VSRAM_SIZE]);
        assert!(timing.cram_writes.is_empty());
        assert_eq!(timing.cram_snapshot[2], 0x0E);
    }
}
