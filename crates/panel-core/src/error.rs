//! Error types for the panel core

use thiserror::Error;

/// Errors that can occur in the panel core
///
/// Everything except [`PanelError::QueueCreation`] is handled where it is
/// raised: the operation is logged and skipped for that cycle.
#[derive(Debug, Error)]
pub enum PanelError {
    /// Bounded wait on a buffer lock expired
    #[error("{buffer} buffer lock timed out after {timeout_ms}ms")]
    LockTimeout {
        /// Which buffer was being acquired
        buffer: &'static str,
        /// How long the caller waited
        timeout_ms: u64,
    },

    /// Event channel is full, the new event was dropped
    #[error("event channel full, dropped event from {source_name}")]
    ChannelFull {
        /// Producer that tried to enqueue
        source_name: &'static str,
    },

    /// Event channel receiver is gone
    #[error("event channel closed")]
    ChannelClosed,

    /// Event queue could not be created at startup
    #[error("unable to create event queue with capacity {capacity}")]
    QueueCreation {
        /// Requested capacity
        capacity: usize,
    },

    /// Value outside the 0-6 panel state domain
    #[error("invalid panel state: {0}")]
    InvalidPanelState(u8),
}
