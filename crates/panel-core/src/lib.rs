//! Video Panel Control Core
//!
//! This crate holds the control logic for a six-button video routing panel.
//! Each button selects a configured source on a networked video switcher for
//! one fixed destination; three LED lines show which source the switcher
//! reports as routed.
//!
//! # Architecture
//!
//! Two tasks cooperate through shared buffers and a single event queue:
//!
//! - **Panel I/O** ([`PanelIo`]): every 10 ms samples the buttons, debounces
//!   them, queues a [`QueuedEvent::Routing`] on release, and pushes pending
//!   LED changes out to the pins.
//! - **Routing dispatcher** ([`RoutingDispatcher`]): turns routing events
//!   into switcher commands through a [`VideoRouter`], and turns
//!   [`QueuedEvent::Confirmation`] events into LED state.
//!
//! The buffers ([`SharedBuffers`]) are guarded by locks with a bounded wait;
//! a timeout skips that operation for the cycle instead of stalling the
//! panel.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use panel_core::{event_channel, load_settings_file, SharedBuffers, EVENT_QUEUE_CAPACITY};
//!
//! let settings = load_settings_file("config.txt".as_ref());
//! let (tx, rx) = event_channel(EVENT_QUEUE_CAPACITY).unwrap();
//! let buffers = Arc::new(SharedBuffers::new());
//!
//! // Hand `tx` to the pins driver and the transport, `rx` to the dispatcher
//! # let _ = (settings, tx, rx, buffers);
//! ```

pub mod buffers;
pub mod channel;
pub mod debounce;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod hal;
pub mod lamp_test;
pub mod panel_io;
pub mod settings;
pub mod state;
pub mod transport;

pub use buffers::{Guarded, InputBuffers, OutputBuffer, SharedBuffers, LOCK_TIMEOUT};
pub use channel::{event_channel, EventReceiver, EventSender, EVENT_QUEUE_CAPACITY};
pub use debounce::{debounce, EdgeKind, DEBOUNCE_THRESHOLD};
pub use dispatcher::{DispatchOutcome, RoutingDispatcher};
pub use error::PanelError;
pub use events::{QueuedEvent, SWITCHER_PORTS};
pub use hal::{Level, PanelPins, PinId, BUTTON_PINS, LED_PINS};
pub use lamp_test::{lamp_test_requested, run_lamp_test, LAMP_TEST_INTERVAL, STARTUP_SETTLE};
pub use panel_io::{resolve_pressed, PanelIo, REFRESH_INTERVAL};
pub use settings::{
    load_settings, load_settings_file, ParsedSettings, RouterEndpoint, Settings, SettingsWarning,
    CONFIG_FILE,
};
pub use state::{PanelState, PANEL_BUTTONS};
pub use transport::{TransportError, VideoRouter};
