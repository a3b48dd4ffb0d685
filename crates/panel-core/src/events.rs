//! Events carried from the panel and the transport to the dispatcher
//!
//! Button releases from the sampler and route confirmations from the switcher
//! share a single queue, so the dispatcher sees them in arrival order.

use crate::state::PANEL_BUTTONS;

/// Number of inputs/outputs addressable on the switcher
pub const SWITCHER_PORTS: u8 = 40;

/// Event queued for the routing dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuedEvent {
    /// A panel button was pressed and released
    Routing {
        /// Zero-based button index (0-5), not the printed button number
        panel_button: u8,
    },

    /// The switcher reports a route has been applied
    Confirmation {
        /// Zero-based switcher input (0-39)
        input: u8,
        /// Zero-based switcher output (0-39)
        output: u8,
    },
}

impl QueuedEvent {
    /// Short name for logging
    pub fn kind(&self) -> &'static str {
        match self {
            QueuedEvent::Routing { .. } => "routing",
            QueuedEvent::Confirmation { .. } => "confirmation",
        }
    }

    /// Check that the payload is inside the panel/switcher ranges
    pub fn is_well_formed(&self) -> bool {
        match *self {
            QueuedEvent::Routing { panel_button } => (panel_button as usize) < PANEL_BUTTONS,
            QueuedEvent::Confirmation { input, output } => {
                input < SWITCHER_PORTS && output < SWITCHER_PORTS
            }
        }
    }
}
