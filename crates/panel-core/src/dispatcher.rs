//! Routing dispatcher
//!
//! Consumes the event queue. Button releases become route commands to the
//! switcher; confirmations from the switcher decide which LED is lit. A press
//! never lights an LED by itself, so the panel always shows the route the
//! switcher reports rather than the one requested.
//!
//! Settings hold 1-based port numbers and events carry the 0-based numbers
//! used on the wire; all conversion happens here.
//!
//! # Example
//!
//! ```rust,ignore
//! use panel_core::{event_channel, RoutingDispatcher, SharedBuffers, Settings};
//!
//! let (tx, rx) = event_channel(32)?;
//! let buffers = Arc::new(SharedBuffers::new());
//! let dispatcher = RoutingDispatcher::new(Settings::default(), router, buffers);
//!
//! let (shutdown_tx, shutdown_rx) = oneshot::channel();
//! tokio::spawn(dispatcher.run(rx, shutdown_rx));
//! ```

use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::buffers::SharedBuffers;
use crate::channel::EventReceiver;
use crate::events::QueuedEvent;
use crate::settings::Settings;
use crate::state::PanelState;
use crate::transport::VideoRouter;

/// What the dispatcher did with one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Route command handed to the transport (0-based numbers)
    RouteRequested { input: u8, output: u8 },
    /// Confirmation changed the lit LED
    LedsChanged(PanelState),
    /// Confirmation matched what was already lit
    LedsUnchanged(PanelState),
    /// Confirmation was for another destination
    OtherDestination { output: u8 },
    /// Payload out of range, dropped
    Discarded,
    /// Transport or buffer failure; the event is lost
    Skipped,
}

/// Turns queued events into route commands and LED state
pub struct RoutingDispatcher<R> {
    settings: Settings,
    router: R,
    buffers: Arc<SharedBuffers>,
}

impl<R: VideoRouter> RoutingDispatcher<R> {
    /// Create a dispatcher; settings are fixed for its lifetime
    pub fn new(settings: Settings, router: R, buffers: Arc<SharedBuffers>) -> Self {
        Self {
            settings,
            router,
            buffers,
        }
    }

    /// Process a single event
    pub async fn handle_event(&self, event: QueuedEvent) -> DispatchOutcome {
        debug!("Processing {} event: {:?}", event.kind(), event);

        if !event.is_well_formed() {
            warn!("Discarding malformed event: {:?}", event);
            return DispatchOutcome::Discarded;
        }

        match event {
            QueuedEvent::Routing { panel_button } => self.request_route(panel_button),
            QueuedEvent::Confirmation { input, output } => {
                self.apply_confirmation(input, output).await
            }
        }
    }

    fn request_route(&self, panel_button: u8) -> DispatchOutcome {
        let source = self.settings.routing_sources[panel_button as usize];
        let destination = self.settings.routing_destination;

        // 1-based config numbering to 0-based wire numbering
        let input = source.saturating_sub(1);
        let output = destination.saturating_sub(1);

        info!(
            "Button {} pressed: routing source {} to destination {}",
            panel_button + 1,
            source,
            destination
        );

        match self.router.send_video_route(input, output) {
            Ok(()) => DispatchOutcome::RouteRequested { input, output },
            Err(e) => {
                warn!("Failed to send route {}->{}: {}", input, output, e);
                DispatchOutcome::Skipped
            }
        }
    }

    async fn apply_confirmation(&self, input: u8, output: u8) -> DispatchOutcome {
        if output + 1 != self.settings.routing_destination {
            debug!(
                "Confirmation for output {} is not our destination {}",
                output + 1,
                self.settings.routing_destination
            );
            return DispatchOutcome::OtherDestination { output };
        }

        let lit = self.settings.button_for_source(input + 1);
        info!(
            "Route confirmed: source {} on destination {}, lighting {}",
            input + 1,
            output + 1,
            lit
        );

        match self.buffers.set_button_leds(lit).await {
            Ok(true) => DispatchOutcome::LedsChanged(lit),
            Ok(false) => DispatchOutcome::LedsUnchanged(lit),
            Err(_) => DispatchOutcome::Skipped,
        }
    }

    /// Run until the queue closes or `shutdown_rx` fires
    ///
    /// Waits on the queue without a timeout; this is the only unbounded wait
    /// in the core.
    pub async fn run(self, mut events: EventReceiver, mut shutdown_rx: oneshot::Receiver<()>) {
        info!(
            "Routing dispatcher started: sources {:?} -> destination {}",
            self.settings.routing_sources, self.settings.routing_destination
        );

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    info!("Shutdown requested for routing dispatcher");
                    break;
                }
                event = events.recv() => {
                    let Some(event) = event else {
                        debug!("Event queue closed");
                        break;
                    };
                    let outcome = self.handle_event(event).await;
                    debug!("Dispatch outcome: {:?}", outcome);
                }
            }
        }

        info!("Routing dispatcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::event_channel;
    use crate::transport::TransportError;
    use std::sync::Mutex;

    /// Router that records commands and can be switched offline
    #[derive(Default)]
    struct RecordingRouter {
        sent: Mutex<Vec<(u8, u8)>>,
        offline: bool,
    }

    impl VideoRouter for RecordingRouter {
        fn send_video_route(&self, input: u8, output: u8) -> Result<(), TransportError> {
            if self.offline {
                return Err(TransportError::NotConnected("test".to_string()));
            }
            self.sent.lock().unwrap().push((input, output));
            Ok(())
        }
    }

    fn settings() -> Settings {
        Settings {
            routing_sources: [3, 7, 12, 1, 40, 22],
            routing_destination: 9,
            ..Default::default()
        }
    }

    fn dispatcher() -> RoutingDispatcher<Arc<RecordingRouter>> {
        RoutingDispatcher::new(
            settings(),
            Arc::new(RecordingRouter::default()),
            Arc::new(SharedBuffers::new()),
        )
    }

    fn state(value: u8) -> PanelState {
        PanelState::new(value).unwrap()
    }

    #[tokio::test]
    async fn test_routing_sends_zero_based_route() {
        let d = dispatcher();

        let outcome = d.handle_event(QueuedEvent::Routing { panel_button: 4 }).await;

        assert_eq!(outcome, DispatchOutcome::RouteRequested { input: 39, output: 8 });
        assert_eq!(*d.router.sent.lock().unwrap(), vec![(39, 8)]);
        // A press alone never lights anything
        assert_eq!(d.buffers.led_panel_state().await.unwrap(), PanelState::NONE);
    }

    #[tokio::test]
    async fn test_confirmation_lights_matching_button() {
        let d = dispatcher();

        let outcome = d
            .handle_event(QueuedEvent::Confirmation { input: 11, output: 8 })
            .await;

        assert_eq!(outcome, DispatchOutcome::LedsChanged(state(3)));
        assert_eq!(d.buffers.led_panel_state().await.unwrap(), state(3));
    }

    #[tokio::test]
    async fn test_confirmation_for_unknown_source_clears_leds() {
        let d = dispatcher();
        d.buffers.set_button_leds(state(2)).await.unwrap();

        let outcome = d
            .handle_event(QueuedEvent::Confirmation { input: 4, output: 8 })
            .await;

        assert_eq!(outcome, DispatchOutcome::LedsChanged(PanelState::NONE));
        assert_eq!(d.buffers.led_panel_state().await.unwrap(), PanelState::NONE);
    }

    #[tokio::test]
    async fn test_confirmation_for_other_destination_ignored() {
        let d = dispatcher();
        d.buffers.set_button_leds(state(6)).await.unwrap();

        let outcome = d
            .handle_event(QueuedEvent::Confirmation { input: 2, output: 3 })
            .await;

        assert_eq!(outcome, DispatchOutcome::OtherDestination { output: 3 });
        assert_eq!(d.buffers.led_panel_state().await.unwrap(), state(6));
    }

    #[tokio::test]
    async fn test_repeated_confirmation_unchanged() {
        let d = dispatcher();
        let event = QueuedEvent::Confirmation { input: 0, output: 8 };

        assert_eq!(d.handle_event(event).await, DispatchOutcome::LedsChanged(state(4)));
        assert_eq!(d.handle_event(event).await, DispatchOutcome::LedsUnchanged(state(4)));
    }

    #[tokio::test]
    async fn test_malformed_events_discarded() {
        let d = dispatcher();

        assert_eq!(
            d.handle_event(QueuedEvent::Routing { panel_button: 6 }).await,
            DispatchOutcome::Discarded
        );
        assert_eq!(
            d.handle_event(QueuedEvent::Confirmation { input: 200, output: 8 }).await,
            DispatchOutcome::Discarded
        );
        assert!(d.router.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_skips() {
        let d = RoutingDispatcher::new(
            settings(),
            RecordingRouter {
                offline: true,
                ..Default::default()
            },
            Arc::new(SharedBuffers::new()),
        );

        assert_eq!(
            d.handle_event(QueuedEvent::Routing { panel_button: 0 }).await,
            DispatchOutcome::Skipped
        );
    }

    #[tokio::test]
    async fn test_output_lock_timeout_skips() {
        let d = dispatcher();
        let held = d.buffers.output().acquire("holder").await.unwrap();

        assert_eq!(
            d.handle_event(QueuedEvent::Confirmation { input: 2, output: 8 }).await,
            DispatchOutcome::Skipped
        );
        drop(held);
    }

    #[tokio::test]
    async fn test_run_processes_in_order_until_closed() {
        let router = Arc::new(RecordingRouter::default());
        let buffers = Arc::new(SharedBuffers::new());
        let d = RoutingDispatcher::new(settings(), router.clone(), buffers.clone());
        let (tx, rx) = event_channel(8).unwrap();
        let (_shutdown_tx, shutdown_rx) = oneshot::channel();

        tx.push(QueuedEvent::Routing { panel_button: 1 }).unwrap();
        tx.push(QueuedEvent::Routing { panel_button: 0 }).unwrap();
        tx.push(QueuedEvent::Confirmation { input: 2, output: 8 }).unwrap();
        drop(tx);

        d.run(rx, shutdown_rx).await;

        assert_eq!(*router.sent.lock().unwrap(), vec![(6, 8), (2, 8)]);
        assert_eq!(buffers.led_panel_state().await.unwrap(), state(1));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let d = dispatcher();
        let (_tx, rx) = event_channel(8).unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(d.run(rx, shutdown_rx));
        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }
}
