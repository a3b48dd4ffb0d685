//! Periodic panel I/O task
//!
//! Each cycle samples the buttons, debounces them and queues release events,
//! then pushes any pending LED change out to the hardware. Both halves take
//! their own buffer lock with a bounded wait; a timeout skips that half for
//! the cycle.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::buffers::SharedBuffers;
use crate::channel::EventSender;
use crate::debounce::{debounce, EdgeKind};
use crate::error::PanelError;
use crate::events::QueuedEvent;
use crate::hal::{Level, PanelPins, BUTTON_PINS, LED_PINS};
use crate::state::PanelState;

/// Period of the sampling loop
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(10);

/// Collapse the button levels into a single panel state
///
/// Buttons are active-low. When several are held, the highest-numbered one
/// wins and the rest are ignored for this sample.
pub fn resolve_pressed(levels: &[Level]) -> PanelState {
    levels
        .iter()
        .rposition(|&level| level == Level::Low)
        .and_then(PanelState::from_index)
        .unwrap_or(PanelState::NONE)
}

/// Owns the pins and drives both directions of panel I/O
pub struct PanelIo<P> {
    pins: P,
    buffers: Arc<SharedBuffers>,
    events: EventSender,
}

impl<P: PanelPins> PanelIo<P> {
    /// Create the I/O driver
    pub fn new(pins: P, buffers: Arc<SharedBuffers>, events: EventSender) -> Self {
        Self {
            pins,
            buffers,
            events,
        }
    }

    /// Sample, debounce and queue any release event
    ///
    /// Returns the event produced this cycle, whether or not the queue
    /// accepted it. A full queue drops the event; the buttons are sampled
    /// again next cycle anyway.
    pub async fn refresh_inputs(&mut self) -> Result<Option<QueuedEvent>, PanelError> {
        let mut input = self.buffers.input().acquire("refresh_inputs").await?;

        let levels = BUTTON_PINS.map(|pin| self.pins.read_pin(pin));
        input.raw = resolve_pressed(&levels);

        let raw = input.raw;
        let mut debounced = input.debounced;
        let mut counter = input.counter;
        let event = debounce(raw, &mut debounced, &mut counter, EdgeKind::Routing);
        input.debounced = debounced;
        input.counter = counter;

        if let Some(event) = event {
            info!("Button released, queueing {:?}", event);
            // Dropped events are logged by the sender
            let _ = self.events.push(event);
        }

        drop(input);
        Ok(event)
    }

    /// Apply a pending LED change to the hardware
    ///
    /// Returns whether the pins were written. The flag clear and the pin writes
    /// happen under the same lock so a concurrent write is never lost.
    pub async fn refresh_outputs(&mut self) -> Result<bool, PanelError> {
        let mut output = self.buffers.output().acquire("refresh_outputs").await?;

        if !output.changed {
            return Ok(false);
        }

        output.changed = false;
        let lines = output.led_panel.led_lines();
        for (pin, on) in LED_PINS.iter().zip(lines) {
            self.pins.write_pin(*pin, Level::from(on));
        }

        debug!("Output at refresh_outputs: {}", output.led_panel);
        Ok(true)
    }

    /// Run one full cycle: inputs first, then outputs
    pub async fn tick(&mut self) {
        // Timeouts are already logged; skip and retry next cycle
        let _ = self.refresh_inputs().await;
        let _ = self.refresh_outputs().await;
    }

    /// Run the loop until `shutdown_rx` fires or its sender is dropped
    ///
    /// Returns the pins so the caller can park the hardware.
    pub async fn run(mut self, mut shutdown_rx: oneshot::Receiver<()>) -> P {
        info!("Panel I/O loop starting ({:?} period)", REFRESH_INTERVAL);

        let mut ticker = interval(REFRESH_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        info!("Panel I/O loop stopped");
        self.pins
    }
}
