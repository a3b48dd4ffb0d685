//! Bounded event queue between producers and the dispatcher
//!
//! Producers (the panel sampler and the switcher transport) never block: a
//! push into a full queue drops the new event and leaves everything already
//! queued untouched. The dispatcher is the only consumer.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::PanelError;
use crate::events::QueuedEvent;

/// Default queue depth
pub const EVENT_QUEUE_CAPACITY: usize = 32;

/// Producer side of the event queue
///
/// Cheap to clone; each clone carries the name of its producer for logging.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<QueuedEvent>,
    source_name: &'static str,
}

impl EventSender {
    /// Clone this sender under a different producer name
    pub fn with_source(&self, source_name: &'static str) -> Self {
        Self {
            tx: self.tx.clone(),
            source_name,
        }
    }

    /// Producer name used in log lines
    pub fn source_name(&self) -> &'static str {
        self.source_name
    }

    /// Enqueue without waiting
    ///
    /// On a full queue the event is dropped and a warning is logged.
    pub fn push(&self, event: QueuedEvent) -> Result<(), PanelError> {
        match self.tx.try_send(event) {
            Ok(()) => {
                debug!("{} queued {:?}", self.source_name, event);
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                warn!(
                    "Event queue full, dropping {:?} from {}",
                    dropped, self.source_name
                );
                Err(PanelError::ChannelFull {
                    source_name: self.source_name,
                })
            }
            Err(mpsc::error::TrySendError::Closed(dropped)) => {
                warn!(
                    "Event queue closed, dropping {:?} from {}",
                    dropped, self.source_name
                );
                Err(PanelError::ChannelClosed)
            }
        }
    }
}

/// Consumer side of the event queue
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::Receiver<QueuedEvent>,
}

impl EventReceiver {
    /// Wait for the next event; `None` once every sender is gone
    pub async fn recv(&mut self) -> Option<QueuedEvent> {
        self.rx.recv().await
    }

    /// Take an event if one is already queued
    pub fn try_recv(&mut self) -> Option<QueuedEvent> {
        self.rx.try_recv().ok()
    }

    /// Number of events waiting
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Check whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

/// Create the event queue
///
/// Returns the sender (named `"panel"`) and the receiver. A zero capacity is
/// rejected since the queue could never hold an event.
pub fn event_channel(capacity: usize) -> Result<(EventSender, EventReceiver), PanelError> {
    if capacity == 0 {
        return Err(PanelError::QueueCreation { capacity });
    }
    let (tx, rx) = mpsc::channel(capacity);
    Ok((
        EventSender {
            tx,
            source_name: "panel",
        },
        EventReceiver { rx },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(matches!(
            event_channel(0),
            Err(PanelError::QueueCreation { capacity: 0 })
        ));
    }

    #[test]
    fn test_overflow_drops_newest() {
        let (tx, mut rx) = event_channel(2).unwrap();

        tx.push(QueuedEvent::Routing { panel_button: 0 }).unwrap();
        tx.push(QueuedEvent::Routing { panel_button: 1 }).unwrap();
        let err = tx.push(QueuedEvent::Routing { panel_button: 2 });
        assert!(matches!(
            err,
            Err(PanelError::ChannelFull {
                source_name: "panel"
            })
        ));

        assert_eq!(rx.len(), 2);
        assert_eq!(rx.try_recv(), Some(QueuedEvent::Routing { panel_button: 0 }));
        assert_eq!(rx.try_recv(), Some(QueuedEvent::Routing { panel_button: 1 }));
        assert_eq!(rx.try_recv(), None);
    }

    #[test]
    fn test_push_after_receiver_dropped() {
        let (tx, rx) = event_channel(4).unwrap();
        drop(rx);
        assert!(matches!(
            tx.push(QueuedEvent::Confirmation { input: 0, output: 4 }),
            Err(PanelError::ChannelClosed)
        ));
    }

    #[test]
    fn test_named_clone_shares_queue() {
        let (tx, mut rx) = event_channel(4).unwrap();
        let transport = tx.with_source("transport");
        assert_eq!(transport.source_name(), "transport");

        transport
            .push(QueuedEvent::Confirmation { input: 2, output: 4 })
            .unwrap();
        tx.push(QueuedEvent::Routing { panel_button: 3 }).unwrap();

        assert_eq!(
            rx.try_recv(),
            Some(QueuedEvent::Confirmation { input: 2, output: 4 })
        );
        assert_eq!(rx.try_recv(), Some(QueuedEvent::Routing { panel_button: 3 }));
    }

    #[tokio::test]
    async fn test_recv_ends_when_senders_dropped() {
        let (tx, mut rx) = event_channel(4).unwrap();
        tx.push(QueuedEvent::Routing { panel_button: 1 }).unwrap();
        drop(tx);

        assert_eq!(rx.recv().await, Some(QueuedEvent::Routing { panel_button: 1 }));
        assert_eq!(rx.recv().await, None);
    }
}
