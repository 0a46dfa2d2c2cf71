//! Bus interfaces seen by chips that master the system bus.

/// Word-wide read access to the host address space.
///
/// Video chips that perform DMA pull data from the CPU's bus through this
/// trait. Reads must not disturb the state of the chip doing the reading;
/// the bus only observes memory.
pub trait WordBus {
    /// Read a big-endian 16-bit word from a 24-bit address.
    fn read_word(&self, address: u32) -> u16;
}

impl<F> WordBus for F
where
    F: Fn(u32) -> u16,
{
    fn read_word(&self, address: u32) -> u16 {
        self(address)
    }
}

/// A bus with nothing attached. Every read returns zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenBus;

impl WordBus for OpenBus {
    fn read_word(&self, _address: u32) -> u16 {
        0
    }
}
