//! The 24 write-only mode registers.
//!
//! Hardware offers no read-back path; everything here is consumed
//! internally through named accessors so the bit layout lives in one place.

/// Number of implemented registers. Writes beyond this are dropped.
pub const REGISTER_COUNT: usize = 24;

/// How plane rows pick their horizontal scroll words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HScrollMode {
    /// One pair of scroll words for the whole screen.
    Full,
    /// One pair per 8-line cell row.
    PerCell,
    /// One pair per line.
    PerLine,
}

/// Interlace setting from register 12 bits 2:1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterlaceMode {
    Off,
    /// Field toggling with normal 8-row tiles.
    Normal,
    /// Setting 2 has no defined behaviour on hardware; treated as progressive.
    Reserved,
    /// Double resolution: 16-row tiles, twice the output rows.
    DoubleResolution,
}

/// DMA operation selected by register 23 bits 7:6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaMode {
    /// 68000 bus to VRAM/CRAM/VSRAM.
    MemoryToVdp,
    /// VRAM fill armed by the command, supplied by the next data write.
    Fill,
    /// VRAM to VRAM copy.
    Copy,
}

/// Raw register bank with semantic accessors.
#[derive(Debug, Clone, Default)]
pub struct Registers {
    regs: [u8; REGISTER_COUNT],
}

impl Registers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw register value, or 0 for an unimplemented index.
    #[must_use]
    pub fn get(&self, index: usize) -> u8 {
        self.regs.get(index).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn raw(&self) -> &[u8; REGISTER_COUNT] {
        &self.regs
    }

    /// Store a value, returning the previous one. Out-of-range indices are
    /// ignored and return `None`.
    pub(crate) fn set(&mut self, index: usize, value: u8) -> Option<u8> {
        let slot = self.regs.get_mut(index)?;
        let old = *slot;
        *slot = value;
        Some(old)
    }

    // Register 0

    #[must_use]
    pub fn hv_latch_enabled(&self) -> bool {
        self.regs[0] & 0x02 != 0
    }

    #[must_use]
    pub fn h_int_enabled(&self) -> bool {
        self.regs[0] & 0x10 != 0
    }

    /// Leftmost 8 columns forced to the backdrop colour.
    #[must_use]
    pub fn left_column_blank(&self) -> bool {
        self.regs[0] & 0x20 != 0
    }

    // Register 1

    #[must_use]
    pub fn v30(&self) -> bool {
        self.regs[1] & 0x08 != 0
    }

    #[must_use]
    pub fn dma_enabled(&self) -> bool {
        self.regs[1] & 0x10 != 0
    }

    #[must_use]
    pub fn v_int_enabled(&self) -> bool {
        self.regs[1] & 0x20 != 0
    }

    #[must_use]
    pub fn display_enabled(&self) -> bool {
        self.regs[1] & 0x40 != 0
    }

    // Table base addresses

    #[must_use]
    pub fn plane_a_base(&self) -> u16 {
        u16::from(self.regs[2] & 0x38) << 10
    }

    /// Window nametable base. H40 ignores bit 1 of the register.
    #[must_use]
    pub fn window_base(&self) -> u16 {
        let mask = if self.h40() { 0x3C } else { 0x3E };
        u16::from(self.regs[3] & mask) << 10
    }

    #[must_use]
    pub fn plane_b_base(&self) -> u16 {
        u16::from(self.regs[4] & 0x07) << 13
    }

    /// Sprite attribute table base. H40 requires $400 alignment.
    #[must_use]
    pub fn sprite_table_base(&self) -> u16 {
        let mask = if self.h40() { 0x7E } else { 0x7F };
        u16::from(self.regs[5] & mask) << 9
    }

    #[must_use]
    pub fn h_scroll_base(&self) -> u16 {
        u16::from(self.regs[13] & 0x3F) << 10
    }

    /// Backdrop colour as (palette line, colour index).
    #[must_use]
    pub fn backdrop(&self) -> (u8, u8) {
        ((self.regs[7] >> 4) & 0x03, self.regs[7] & 0x0F)
    }

    #[must_use]
    pub fn h_int_reload(&self) -> u8 {
        self.regs[10]
    }

    // Register 11

    #[must_use]
    pub fn h_scroll_mode(&self) -> HScrollMode {
        match self.regs[11] & 0x03 {
            0 => HScrollMode::Full,
            3 => HScrollMode::PerLine,
            _ => HScrollMode::PerCell,
        }
    }

    /// Vertical scroll per 16-pixel column instead of full screen.
    #[must_use]
    pub fn v_scroll_per_column(&self) -> bool {
        self.regs[11] & 0x04 != 0
    }

    // Register 12

    #[must_use]
    pub fn h40(&self) -> bool {
        self.regs[12] & 0x01 != 0
    }

    #[must_use]
    pub fn interlace_mode(&self) -> InterlaceMode {
        match (self.regs[12] >> 1) & 0x03 {
            0 => InterlaceMode::Off,
            1 => InterlaceMode::Normal,
            2 => InterlaceMode::Reserved,
            _ => InterlaceMode::DoubleResolution,
        }
    }

    #[must_use]
    pub fn double_resolution(&self) -> bool {
        self.interlace_mode() == InterlaceMode::DoubleResolution
    }

    #[must_use]
    pub fn shadow_highlight(&self) -> bool {
        self.regs[12] & 0x08 != 0
    }

    #[must_use]
    pub fn auto_increment(&self) -> u16 {
        u16::from(self.regs[15])
    }

    /// Plane dimensions in cells as (width, height). Setting 2 is invalid
    /// and behaves as 32.
    #[must_use]
    pub fn plane_size(&self) -> (u16, u16) {
        let cells = |bits: u8| match bits & 0x03 {
            1 => 64,
            3 => 128,
            _ => 32,
        };
        (cells(self.regs[16]), cells(self.regs[16] >> 4))
    }

    /// Horizontal window split as (boundary in pixels, window on the right).
    #[must_use]
    pub fn window_h_split(&self) -> (u16, bool) {
        (u16::from(self.regs[17] & 0x1F) * 16, self.regs[17] & 0x80 != 0)
    }

    /// Vertical window split as (boundary in lines, window at the bottom).
    #[must_use]
    pub fn window_v_split(&self) -> (u16, bool) {
        (u16::from(self.regs[18] & 0x1F) * 8, self.regs[18] & 0x80 != 0)
    }

    // DMA

    /// Transfer length in words (bytes for fill/copy). Zero means 65536.
    #[must_use]
    pub fn dma_length(&self) -> u32 {
        match u32::from(self.regs[20]) << 8 | u32::from(self.regs[19]) {
            0 => 0x1_0000,
            n => n,
        }
    }

    /// 68000 source byte address for memory-to-VDP transfers.
    #[must_use]
    pub fn dma_memory_source(&self) -> u32 {
        u32::from(self.regs[23] & 0x7F) << 17
            | u32::from(self.regs[22]) << 9
            | u32::from(self.regs[21]) << 1
    }

    /// VRAM source address for copies.
    #[must_use]
    pub fn dma_copy_source(&self) -> u16 {
        u16::from(self.regs[22]) << 8 | u16::from(self.regs[21])
    }

    #[must_use]
    pub fn dma_mode(&self) -> DmaMode {
        match self.regs[23] >> 6 {
            2 => DmaMode::Fill,
            3 => DmaMode::Copy,
            _ => DmaMode::MemoryToVdp,
        }
    }

    /// Write a post-transfer 68000 source address back, keeping bit 7 of
    /// register 23 (the mode select).
    pub(crate) fn store_memory_source(&mut self, source: u32) {
        let words = source >> 1;
        self.regs[21] = words as u8;
        self.regs[22] = (words >> 8) as u8;
        self.regs[23] = (self.regs[23] & 0x80) | ((words >> 16) as u8 & 0x7F);
    }

    pub(crate) fn store_copy_source(&mut self, source: u16) {
        self.regs[21] = source as u8;
        self.regs[22] = (source >> 8) as u8;
    }

    pub(crate) fn clear_dma_length(&mut self) {
        self.regs[19] = 0;
        self.regs[20] = 0;
    }

    // Derived geometry

    #[must_use]
    pub fn active_width(&self) -> u16 {
        if self.h40() { 320 } else { 256 }
    }

    #[must_use]
    pub fn active_height(&self) -> u16 {
        if self.v30() { 240 } else { 224 }
    }

    /// Pixel rows per tile: 16 in double resolution, else 8.
    #[must_use]
    pub fn tile_rows(&self) -> u16 {
        if self.double_resolution() { 16 } else { 8 }
    }

    #[must_use]
    pub fn tile_bytes(&self) -> u16 {
        self.tile_rows() * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with(pairs: &[(usize, u8)]) -> Registers {
        let mut regs = Registers::new();
        for &(index, value) in pairs {
            regs.set(index, value);
        }
        regs
    }

    #[test]
    fn out_of_range_index_is_ignored() {
        let mut regs = Registers::new();
        assert_eq!(regs.set(24, 0xFF), None);
        assert_eq!(regs.set(31, 0xFF), None);
        assert_eq!(regs.get(24), 0);
        assert!(regs.raw().iter().all(|&r| r == 0));
    }

    #[test]
    fn set_returns_previous_value() {
        let mut regs = Registers::new();
        assert_eq!(regs.set(1, 0x44), Some(0));
        assert_eq!(regs.set(1, 0x64), Some(0x44));
    }

    #[test]
    fn mode_register_flags() {
        let regs = with(&[(0, 0x32), (1, 0x7C)]);
        assert!(regs.hv_latch_enabled());
        assert!(regs.h_int_enabled());
        assert!(regs.left_column_blank());
        assert!(regs.display_enabled());
        assert!(regs.v_int_enabled());
        assert!(regs.dma_enabled());
        assert!(regs.v30());
        assert_eq!(regs.active_height(), 240);
    }

    #[test]
    fn table_bases() {
        let regs = with(&[(2, 0x30), (3, 0x2E), (4, 0x07), (5, 0x7F), (13, 0x3F)]);
        assert_eq!(regs.plane_a_base(), 0xC000);
        assert_eq!(regs.plane_b_base(), 0xE000);
        assert_eq!(regs.window_base(), 0xB800, "H32 keeps bit 1");
        assert_eq!(regs.sprite_table_base(), 0xFE00);
        assert_eq!(regs.h_scroll_base(), 0xFC00);

        let h40 = with(&[(3, 0x2E), (5, 0x7F), (12, 0x81)]);
        assert_eq!(h40.window_base(), 0xB000, "H40 drops bit 1");
        assert_eq!(h40.sprite_table_base(), 0xFC00, "H40 drops bit 0");
    }

    #[test]
    fn plane_size_treats_setting_two_as_32() {
        assert_eq!(with(&[(16, 0x00)]).plane_size(), (32, 32));
        assert_eq!(with(&[(16, 0x01)]).plane_size(), (64, 32));
        assert_eq!(with(&[(16, 0x13)]).plane_size(), (128, 64));
        assert_eq!(with(&[(16, 0x22)]).plane_size(), (32, 32));
    }

    #[test]
    fn scroll_modes() {
        assert_eq!(with(&[(11, 0)]).h_scroll_mode(), HScrollMode::Full);
        assert_eq!(with(&[(11, 1)]).h_scroll_mode(), HScrollMode::PerCell);
        assert_eq!(with(&[(11, 2)]).h_scroll_mode(), HScrollMode::PerCell);
        assert_eq!(with(&[(11, 3)]).h_scroll_mode(), HScrollMode::PerLine);
        assert!(with(&[(11, 4)]).v_scroll_per_column());
    }

    #[test]
    fn interlace_double_resolution_doubles_tile_height() {
        let regs = with(&[(12, 0x06)]);
        assert_eq!(regs.interlace_mode(), InterlaceMode::DoubleResolution);
        assert_eq!(regs.tile_rows(), 16);
        assert_eq!(regs.tile_bytes(), 64);
        assert_eq!(with(&[(12, 0x02)]).tile_bytes(), 32);
    }

    #[test]
    fn dma_length_zero_means_65536() {
        assert_eq!(Registers::new().dma_length(), 0x1_0000);
        assert_eq!(with(&[(19, 0x34), (20, 0x12)]).dma_length(), 0x1234);
    }

    #[test]
    fn dma_source_round_trips_through_writeback() {
        let mut regs = with(&[(21, 0x80), (22, 0x00), (23, 0x7F)]);
        assert_eq!(regs.dma_memory_source(), 0xFE_0100);
        assert_eq!(regs.dma_mode(), DmaMode::MemoryToVdp);
        regs.store_memory_source(0xFE_0200);
        assert_eq!(regs.get(21), 0x00);
        assert_eq!(regs.get(22), 0x01);
        assert_eq!(regs.get(23), 0x7F);
    }

    #[test]
    fn dma_mode_select() {
        assert_eq!(with(&[(23, 0x40)]).dma_mode(), DmaMode::MemoryToVdp);
        assert_eq!(with(&[(23, 0x80)]).dma_mode(), DmaMode::Fill);
        assert_eq!(with(&[(23, 0xC0)]).dma_mode(), DmaMode::Copy);
    }

    #[test]
    fn window_splits() {
        let regs = with(&[(17, 0x85), (18, 0x0A)]);
        assert_eq!(regs.window_h_split(), (80, true));
        assert_eq!(regs.window_v_split(), (80, false));
    }
}
