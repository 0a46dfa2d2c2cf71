//! The I/O controller's registers at $A10000.

use emu_core::{Observable, Value};
use log::trace;

use crate::pad::Pad;

/// TH is bit 6 of the data and ctrl registers.
const TH: u8 = 0x40;

/// Console model as reported by the version register.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConsoleRegion {
    /// Domestic NTSC machine.
    Japan,
    /// Overseas NTSC machine.
    #[default]
    Americas,
    /// Overseas PAL machine.
    Europe,
}

impl ConsoleRegion {
    fn version(self) -> u8 {
        match self {
            Self::Japan => 0x00,
            Self::Americas => 0x80,
            Self::Europe => 0xC0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Player {
    One,
    Two,
}

impl Player {
    fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct ControllerPort {
    data: u8,
    /// Direction per pin: 1 = output.
    ctrl: u8,
    pad: Option<Pad>,
}

impl ControllerPort {
    /// TH level: the data bit when TH is an output, else pulled high.
    fn th_high(&self) -> bool {
        self.ctrl & TH == 0 || self.data & TH != 0
    }

    fn read(&mut self, cycle: u64) -> u8 {
        let th_high = self.th_high();
        let inputs = match &mut self.pad {
            Some(pad) => pad.read(cycle, th_high),
            // Nothing plugged in: every input floats high.
            None => 0xFF,
        };
        (self.data & self.ctrl) | (inputs & !self.ctrl)
    }

    fn write_data(&mut self, cycle: u64, value: u8) {
        self.data = value;
        let th_high = self.th_high();
        if let Some(pad) = &mut self.pad {
            pad.drive_th(cycle, th_high);
        }
    }
}

/// Mega Drive I/O controller with two controller ports.
#[derive(Debug, Clone)]
pub struct IoController {
    region: ConsoleRegion,
    ports: [ControllerPort; 2],
}

impl IoController {
    /// A controller with both ports empty.
    #[must_use]
    pub fn new(region: ConsoleRegion) -> Self {
        Self {
            region,
            ports: [ControllerPort::default(), ControllerPort::default()],
        }
    }

    #[must_use]
    pub fn region(&self) -> ConsoleRegion {
        self.region
    }

    /// Plug `pad` into a port, replacing whatever was there.
    pub fn connect(&mut self, player: Player, pad: Pad) {
        self.ports[player.index()].pad = Some(pad);
    }

    pub fn disconnect(&mut self, player: Player) -> Option<Pad> {
        self.ports[player.index()].pad.take()
    }

    #[must_use]
    pub fn pad(&self, player: Player) -> Option<&Pad> {
        self.ports[player.index()].pad.as_ref()
    }

    pub fn pad_mut(&mut self, player: Player) -> Option<&mut Pad> {
        self.ports[player.index()].pad.as_mut()
    }

    /// Read a register. `offset` is relative to $A10000; only the odd
    /// bytes listed below are decoded and everything else reads 0.
    pub fn read_register(&mut self, cycle: u64, offset: u32) -> u8 {
        match offset & 0x1F {
            0x01 => self.region.version(),
            0x03 => self.ports[0].read(cycle),
            0x05 => self.ports[1].read(cycle),
            0x09 => self.ports[0].ctrl,
            0x0B => self.ports[1].ctrl,
            _ => 0,
        }
    }

    /// Write a register. `cycle` times TH edges for the 6-button protocol.
    pub fn write_register(&mut self, cycle: u64, offset: u32, value: u8) {
        match offset & 0x1F {
            0x03 => self.ports[0].write_data(cycle, value),
            0x05 => self.ports[1].write_data(cycle, value),
            0x09 => self.ports[0].ctrl = value,
            0x0B => self.ports[1].ctrl = value,
            other => trace!("I/O write {value:#04X} to unhandled offset {other:#04X} ignored"),
        }
    }
}

impl Default for IoController {
    fn default() -> Self {
        Self::new(ConsoleRegion::default())
    }
}

impl Observable for IoController {
    fn query(&self, path: &str) -> Option<Value> {
        if path == "version" {
            return Some(self.region.version().into());
        }
        let (port, field) = path.split_once('.')?;
        let port = match port {
            "port1" => &self.ports[0],
            "port2" => &self.ports[1],
            _ => return None,
        };
        match field {
            "data" => Some(port.data.into()),
            "ctrl" => Some(port.ctrl.into()),
            "th" => Some(port.th_high().into()),
            "state" => Some(port.pad.as_ref().map_or(0, Pad::state).into()),
            "connected" => Some(port.pad.is_some().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "version",
            "port1.data",
            "port1.ctrl",
            "port1.th",
            "port1.state",
            "port1.connected",
            "port2.data",
            "port2.ctrl",
            "port2.th",
            "port2.state",
            "port2.connected",
        ]
    }
}
