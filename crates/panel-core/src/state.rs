//! Panel state values

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::PanelError;

/// Number of buttons (and lit states) on the panel
pub const PANEL_BUTTONS: usize = 6;

/// Which panel button is pressed or lit
///
/// `0` means none; `1..=6` is the physical button number printed on the panel.
/// Used for the raw and debounced input state as well as the LED state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PanelState(u8);

impl PanelState {
    /// No button pressed / no LED lit
    pub const NONE: PanelState = PanelState(0);

    /// Button 1
    pub const FIRST: PanelState = PanelState(1);

    /// Create from a raw value, rejecting anything above 6
    pub fn new(value: u8) -> Result<Self, PanelError> {
        if value as usize > PANEL_BUTTONS {
            return Err(PanelError::InvalidPanelState(value));
        }
        Ok(Self(value))
    }

    /// State for the button at a zero-based index (0-5)
    pub fn from_index(index: usize) -> Option<Self> {
        if index < PANEL_BUTTONS {
            Some(Self(index as u8 + 1))
        } else {
            None
        }
    }

    /// Zero-based button index, or `None` for [`PanelState::NONE`]
    pub fn index(&self) -> Option<usize> {
        match self.0 {
            0 => None,
            n => Some(n as usize - 1),
        }
    }

    /// Check for the "none" sentinel
    pub fn is_none(&self) -> bool {
        self.0 == 0
    }

    /// Raw 0-6 value
    pub fn value(&self) -> u8 {
        self.0
    }

    /// Project onto the three LED lines (A = bit 0, B = bit 1, C = bit 2)
    pub fn led_lines(&self) -> [bool; 3] {
        [self.0 & 1 != 0, self.0 & 2 != 0, self.0 & 4 != 0]
    }

    /// Decode the three LED lines back into a state
    ///
    /// Line combinations above 6 are not produced by [`PanelState::led_lines`]
    /// and decode to `None`.
    pub fn from_led_lines(lines: [bool; 3]) -> Option<Self> {
        let value = lines
            .iter()
            .enumerate()
            .fold(0u8, |acc, (bit, &on)| acc | ((on as u8) << bit));
        Self::new(value).ok()
    }
}

impl TryFrom<u8> for PanelState {
    type Error = PanelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PanelState> for u8 {
    fn from(state: PanelState) -> Self {
        state.0
    }
}

impl fmt::Display for PanelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => write!(f, "none"),
            n => write!(f, "button {}", n),
        }
    }
}
