//! Mega Drive / Genesis I/O controller and joypads.
//!
//! The controller sits at $A10000 in the 68000 map. It holds the version
//! register and, for each controller port, a data register and a
//! direction (ctrl) register. Pins configured as outputs read back the
//! data register; input pins read whatever the pad drives.
//!
//! Pads are selected through the TH line (pin 7). A 3-button pad simply
//! multiplexes on the TH level. A 6-button pad counts TH edges and, on the
//! third low phase, reports its extra buttons. The counter falls back to
//! its idle state when TH stops toggling for about 1.5 ms.

mod io;
mod pad;

pub use io::{ConsoleRegion, IoController, Player};
pub use pad::{Buttons, Pad, PadKind, SIX_BUTTON_TIMEOUT_CYCLES};
