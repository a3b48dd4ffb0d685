//! Shared panel state buffers
//!
//! The input triple (raw, counter, debounced) and the output record each live
//! behind their own lock. Every acquisition is bounded by [`LOCK_TIMEOUT`]; a
//! caller that times out logs a warning and skips the operation for this
//! cycle. No code path holds both locks at once.

use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::error::PanelError;
use crate::state::PanelState;

/// Longest wait for a buffer lock
pub const LOCK_TIMEOUT: Duration = Duration::from_millis(10);

/// A value that can only be reached through a bounded-wait lock
#[derive(Debug)]
pub struct Guarded<T> {
    label: &'static str,
    inner: Mutex<T>,
}

impl<T> Guarded<T> {
    /// Wrap a value; `label` names the buffer in log lines
    pub fn new(label: &'static str, value: T) -> Self {
        Self {
            label,
            inner: Mutex::new(value),
        }
    }

    /// Acquire the lock, waiting at most [`LOCK_TIMEOUT`]
    ///
    /// The guard releases the lock when dropped.
    pub async fn acquire(&self, caller: &str) -> Result<MutexGuard<'_, T>, PanelError> {
        match tokio::time::timeout(LOCK_TIMEOUT, self.inner.lock()).await {
            Ok(guard) => Ok(guard),
            Err(_) => {
                warn!("{} buffer lock timeout at {}", self.label, caller);
                Err(PanelError::LockTimeout {
                    buffer: self.label,
                    timeout_ms: LOCK_TIMEOUT.as_millis() as u64,
                })
            }
        }
    }
}

/// Input side: written by the sampler every cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputBuffers {
    /// Latest sample after the tie-break
    pub raw: PanelState,
    /// Consecutive non-zero samples, saturating at the debounce threshold
    pub counter: u8,
    /// Stable value exposed to readers
    pub debounced: PanelState,
}

/// Output side: desired LED state plus the dirty flag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputBuffer {
    /// Which button's LED should be lit
    pub led_panel: PanelState,
    /// Set when `led_panel` differs from what the hardware shows
    pub changed: bool,
}

impl OutputBuffer {
    /// Write a new LED state, flagging a refresh only if it differs
    ///
    /// Returns whether the value changed.
    pub fn write(&mut self, value: PanelState) -> bool {
        if self.led_panel == value {
            return false;
        }
        self.led_panel = value;
        self.changed = true;
        true
    }
}

/// Both buffers, shared between the panel I/O loop and the dispatcher
#[derive(Debug)]
pub struct SharedBuffers {
    input: Guarded<InputBuffers>,
    output: Guarded<OutputBuffer>,
}

impl Default for SharedBuffers {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedBuffers {
    /// Create zeroed buffers (no button pressed, no LED lit, nothing pending)
    pub fn new() -> Self {
        Self {
            input: Guarded::new("input", InputBuffers::default()),
            output: Guarded::new("output", OutputBuffer::default()),
        }
    }

    /// Input triple lock
    pub fn input(&self) -> &Guarded<InputBuffers> {
        &self.input
    }

    /// Output record lock
    pub fn output(&self) -> &Guarded<OutputBuffer> {
        &self.output
    }

    /// Debounced button state
    pub async fn button_panel_state(&self) -> Result<PanelState, PanelError> {
        let input = self.input.acquire("button_panel_state").await?;
        let value = input.debounced;
        drop(input);
        debug!("Input buffer read at button_panel_state: {}", value);
        Ok(value)
    }

    /// LED state the dispatcher last asked for
    pub async fn led_panel_state(&self) -> Result<PanelState, PanelError> {
        let output = self.output.acquire("led_panel_state").await?;
        Ok(output.led_panel)
    }

    /// Set which LED is lit
    ///
    /// Returns whether the stored value changed. Writing the value already
    /// stored leaves the changed flag alone.
    pub async fn set_button_leds(&self, value: PanelState) -> Result<bool, PanelError> {
        let mut output = self.output.acquire("set_button_leds").await?;
        let changed = output.write(value);
        drop(output);
        debug!("Output buffer write at set_button_leds: {}", value);
        Ok(changed)
    }
}
