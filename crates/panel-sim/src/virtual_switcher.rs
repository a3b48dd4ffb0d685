//! Virtual video switcher
//!
//! Accepts route commands like a networked switcher: each accepted route is
//! applied to a crosspoint table and, when auto-confirm is on, reported back
//! as a [`QueuedEvent::Confirmation`] on the panel's event queue. Routes made
//! from elsewhere (another panel, the switcher's front panel) are injected
//! with [`VirtualSwitcher::apply_external_route`].

use std::sync::{Mutex, MutexGuard, PoisonError};

use panel_core::{EventSender, QueuedEvent, TransportError, VideoRouter, SWITCHER_PORTS};
use tracing::{debug, info, warn};

use crate::error::SimError;

const PORTS: usize = SWITCHER_PORTS as usize;

#[derive(Debug)]
struct SwitcherState {
    online: bool,
    auto_confirm: bool,
    /// Input currently routed to each output (0-based); outputs start on
    /// the input with the same number
    crosspoints: [u8; PORTS],
    /// Every accepted command, oldest first
    commands: Vec<(u8, u8)>,
}

/// Simulated switcher
pub struct VirtualSwitcher {
    id: String,
    state: Mutex<SwitcherState>,
    confirmations: Option<EventSender>,
}

impl VirtualSwitcher {
    /// Create an online switcher with no confirmation path
    pub fn new(id: impl Into<String>) -> Self {
        let mut crosspoints = [0u8; PORTS];
        for (output, input) in crosspoints.iter_mut().enumerate() {
            *input = output as u8;
        }

        Self {
            id: id.into(),
            state: Mutex::new(SwitcherState {
                online: true,
                auto_confirm: true,
                crosspoints,
                commands: Vec::new(),
            }),
            confirmations: None,
        }
    }

    /// Send confirmations into the panel's event queue
    pub fn with_confirmations(mut self, events: &EventSender) -> Self {
        self.confirmations = Some(events.with_source("switcher"));
        self
    }

    fn state(&self) -> MutexGuard<'_, SwitcherState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Identifier for logging
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Simulate the link coming up or going down
    pub fn set_online(&self, online: bool) {
        self.state().online = online;
        info!(
            "Virtual switcher {} is now {}",
            self.id,
            if online { "online" } else { "offline" }
        );
    }

    /// Check whether commands are accepted
    pub fn is_online(&self) -> bool {
        self.state().online
    }

    /// Enable or disable confirmations for accepted routes
    pub fn set_auto_confirm(&self, enabled: bool) {
        self.state().auto_confirm = enabled;
    }

    /// Check whether accepted routes are confirmed
    pub fn auto_confirm(&self) -> bool {
        self.state().auto_confirm
    }

    /// Input routed to `output` (0-based)
    pub fn crosspoint(&self, output: u8) -> Option<u8> {
        self.state().crosspoints.get(output as usize).copied()
    }

    /// Commands accepted so far (0-based input, output)
    pub fn commands(&self) -> Vec<(u8, u8)> {
        self.state().commands.clone()
    }

    /// Route made outside this panel's control
    ///
    /// Applied and announced even when auto-confirm is off, since the
    /// switcher always reports crosspoint changes.
    pub fn apply_external_route(&self, input: u8, output: u8) -> Result<(), SimError> {
        if input >= SWITCHER_PORTS || output >= SWITCHER_PORTS {
            return Err(SimError::InvalidPort { input, output });
        }

        self.state().crosspoints[output as usize] = input;
        info!(
            "Virtual switcher {}: external route {} -> {}",
            self.id,
            input + 1,
            output + 1
        );
        self.confirm(input, output);
        Ok(())
    }

    fn confirm(&self, input: u8, output: u8) {
        match &self.confirmations {
            // Queue errors are logged by the sender
            Some(events) => {
                let _ = events.push(QueuedEvent::Confirmation { input, output });
            }
            None => debug!("Virtual switcher {}: no confirmation path", self.id),
        }
    }
}

impl VideoRouter for VirtualSwitcher {
    fn send_video_route(&self, input: u8, output: u8) -> Result<(), TransportError> {
        let confirm = {
            let mut state = self.state();
            if !state.online {
                warn!("Virtual switcher {} offline, refusing route", self.id);
                return Err(TransportError::NotConnected(self.id.clone()));
            }
            if input >= SWITCHER_PORTS || output >= SWITCHER_PORTS {
                return Err(TransportError::Rejected {
                    input,
                    output,
                    reason: format!("switcher has {} ports", SWITCHER_PORTS),
                });
            }

            state.commands.push((input, output));
            state.crosspoints[output as usize] = input;
            state.auto_confirm
        };

        debug!(
            "Virtual switcher {}: routed {} -> {}",
            self.id,
            input + 1,
            output + 1
        );
        if confirm {
            self.confirm(input, output);
        }
        Ok(())
    }
}
