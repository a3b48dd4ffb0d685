//! Panel Simulation Library
//!
//! This crate provides stand-ins for the hardware around the panel core so it
//! can run on a workstation:
//!
//! - **VirtualPanel**: six active-low buttons and three LED lines
//! - **VirtualSwitcher**: a 40x40 video switcher that confirms routes on the
//!   panel's event queue
//!
//! # Example
//!
//! ```rust
//! use panel_core::{event_channel, VideoRouter, QueuedEvent};
//! use panel_sim::{VirtualPanel, VirtualSwitcher};
//!
//! let (tx, mut rx) = event_channel(8).unwrap();
//! let switcher = VirtualSwitcher::new("bench").with_confirmations(&tx);
//!
//! switcher.send_video_route(2, 4).unwrap();
//! assert_eq!(rx.try_recv(), Some(QueuedEvent::Confirmation { input: 2, output: 4 }));
//!
//! let panel = VirtualPanel::new();
//! panel.press(3).unwrap();
//! assert_eq!(panel.pressed(), vec![3]);
//! ```

pub mod error;
pub mod virtual_panel;
pub mod virtual_switcher;

pub use error::SimError;
pub use virtual_panel::{VirtualPanel, DEFAULT_CLICK_HOLD};
pub use virtual_switcher::VirtualSwitcher;
