//! Hardware pin seam
//!
//! Pin setup (pull-ups, directions) belongs to the board layer. The core only
//! samples levels and drives them through [`PanelPins`].

use std::fmt;

use crate::state::PANEL_BUTTONS;

/// GPIO number on the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinId(pub u8);

impl fmt::Display for PinId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}

/// Logic level on a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

/// Button inputs, in panel order (button 1 first). Pulled up, low when pressed.
pub const BUTTON_PINS: [PinId; PANEL_BUTTONS] = [
    PinId(13),
    PinId(16),
    PinId(32),
    PinId(33),
    PinId(34),
    PinId(35),
];

/// LED lines A, B and C
pub const LED_PINS: [PinId; 3] = [PinId(3), PinId(4), PinId(5)];

/// Raw pin access used by the panel I/O loop
pub trait PanelPins: Send {
    /// Sample the current level of an input pin
    fn read_pin(&self, id: PinId) -> Level;

    /// Drive an output pin
    fn write_pin(&mut self, id: PinId, level: Level);
}
