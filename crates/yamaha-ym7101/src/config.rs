//! Region timing and construction-time options.

use thiserror::Error;

/// Default share of a scanline's CPU cycles spent drawing active pixels.
pub const DEFAULT_ACTIVE_DISPLAY_PERCENT: u32 = 73;

/// Video standard. Selects line counts, clocks and V-counter tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Region {
    #[default]
    Ntsc,
    Pal,
}

impl Region {
    /// Total scanlines per frame, including blanking.
    #[must_use]
    pub const fn scanlines(self) -> u16 {
        match self {
            Self::Ntsc => 262,
            Self::Pal => 313,
        }
    }

    /// 68000 clock in Hz (master clock / 7).
    #[must_use]
    pub const fn m68k_clock_hz(self) -> u32 {
        match self {
            Self::Ntsc => 7_670_454,
            Self::Pal => 7_600_489,
        }
    }

    #[must_use]
    pub const fn frames_per_second(self) -> u32 {
        match self {
            Self::Ntsc => 60,
            Self::Pal => 50,
        }
    }

    /// Whole 68000 cycles per scanline: 487 NTSC, 485 PAL.
    #[must_use]
    pub const fn m68k_cycles_per_line(self) -> u32 {
        self.m68k_clock_hz() / self.frames_per_second() / self.scanlines() as u32
    }

    #[must_use]
    pub const fn is_pal(self) -> bool {
        matches!(self, Self::Pal)
    }
}

/// Rejected construction options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("active display share must be 1-99 percent of a scanline, got {0}")]
    ActiveDisplayPercent(u32),
}

/// Construction-time VDP options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VdpConfig {
    region: Region,
    active_display_percent: u32,
}

impl VdpConfig {
    #[must_use]
    pub const fn new(region: Region) -> Self {
        Self {
            region,
            active_display_percent: DEFAULT_ACTIVE_DISPLAY_PERCENT,
        }
    }

    /// Override the share of each scanline treated as active display when
    /// mapping CPU cycles to pixel columns and H-counter values.
    pub fn with_active_display_percent(mut self, percent: u32) -> Result<Self, ConfigError> {
        if percent == 0 || percent >= 100 {
            return Err(ConfigError::ActiveDisplayPercent(percent));
        }
        self.active_display_percent = percent;
        Ok(self)
    }

    #[must_use]
    pub const fn region(&self) -> Region {
        self.region
    }

    #[must_use]
    pub const fn active_display_percent(&self) -> u32 {
        self.active_display_percent
    }
}

impl Default for VdpConfig {
    fn default() -> Self {
        Self::new(Region::Ntsc)
    }
}
