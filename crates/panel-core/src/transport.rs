//! Seam to the switcher transport
//!
//! The network side is not part of the core. Anything that can deliver a
//! route command implements [`VideoRouter`]; confirmations come back as
//! [`QueuedEvent::Confirmation`](crate::QueuedEvent) on the shared channel.

use std::sync::Arc;

use thiserror::Error;

/// Errors reported by a transport when a command cannot be delivered
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No connection to the switcher
    #[error("not connected to switcher: {0}")]
    NotConnected(String),

    /// The switcher rejected the route
    #[error("route {input}->{output} rejected: {reason}")]
    Rejected {
        /// Zero-based input
        input: u8,
        /// Zero-based output
        output: u8,
        /// Reason given by the transport
        reason: String,
    },
}

/// Sends route commands to the switcher
///
/// Commands are fire-and-forget: `Ok` means the command was handed to the
/// transport, not that the switcher applied it.
pub trait VideoRouter: Send + Sync {
    /// Route zero-based `input` to zero-based `output`
    fn send_video_route(&self, input: u8, output: u8) -> Result<(), TransportError>;
}

impl<R: VideoRouter + ?Sized> VideoRouter for Arc<R> {
    fn send_video_route(&self, input: u8, output: u8) -> Result<(), TransportError> {
        (**self).send_video_route(input, output)
    }
}
