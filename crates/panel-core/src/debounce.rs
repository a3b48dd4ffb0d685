//! Button debouncing
//!
//! A press is accepted once the raw sample has been non-zero for
//! [`DEBOUNCE_THRESHOLD`] consecutive cycles. Events fire on release, so a
//! held button produces exactly one event when it is let go.

use crate::events::QueuedEvent;
use crate::state::PanelState;

/// Consecutive non-zero samples needed to latch a press
pub const DEBOUNCE_THRESHOLD: u8 = 3;

/// Which event a release edge produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Release of a routing panel button
    Routing,
}

impl EdgeKind {
    /// Build the event for the release of `released`
    fn event_for(self, released: PanelState) -> Option<QueuedEvent> {
        match self {
            EdgeKind::Routing => released.index().map(|index| QueuedEvent::Routing {
                panel_button: index as u8,
            }),
        }
    }
}

/// Feed one raw sample through the debouncer
///
/// Returns the release event, if this sample released a latched press. The
/// event carries the value that was latched before the release.
pub fn debounce(
    raw: PanelState,
    debounced: &mut PanelState,
    counter: &mut u8,
    edge: EdgeKind,
) -> Option<QueuedEvent> {
    let mut event = None;

    if raw.is_none() {
        *counter = 0;
        if !debounced.is_none() {
            event = edge.event_for(*debounced);
            *debounced = PanelState::NONE;
        }
    } else {
        *counter = counter.saturating_add(1).min(DEBOUNCE_THRESHOLD);
    }

    if *counter >= DEBOUNCE_THRESHOLD {
        *debounced = raw;
    }

    event
}
