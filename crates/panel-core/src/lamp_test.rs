//! Lamp-test mode
//!
//! Holding button 1 while the panel starts skips routing entirely: the LEDs
//! mirror whichever button is held, so every switch and lamp can be checked
//! without a switcher on the network.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::buffers::SharedBuffers;
use crate::state::PanelState;

/// How long the I/O loop runs before the startup check
pub const STARTUP_SETTLE: Duration = Duration::from_millis(100);

/// Period of the LED mirror loop
pub const LAMP_TEST_INTERVAL: Duration = Duration::from_millis(50);

/// Button that must be held at startup
const TRIGGER_BUTTON: PanelState = PanelState::FIRST;

/// Whether the debounced input currently asks for lamp-test mode
///
/// A lock timeout counts as "no".
pub async fn lamp_test_requested(buffers: &SharedBuffers) -> bool {
    match buffers.button_panel_state().await {
        Ok(state) => state == TRIGGER_BUTTON,
        Err(_) => false,
    }
}

/// Copy the debounced buttons onto the LEDs until `shutdown_rx` fires
pub async fn run_lamp_test(buffers: Arc<SharedBuffers>, mut shutdown_rx: oneshot::Receiver<()>) {
    info!("Entering lamp-test mode");

    let mut ticker = interval(LAMP_TEST_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = &mut shutdown_rx => break,
            _ = ticker.tick() => {
                let Ok(state) = buffers.button_panel_state().await else {
                    continue;
                };
                if let Ok(true) = buffers.set_button_leds(state).await {
                    debug!("Lamp test showing {}", state);
                }
            }
        }
    }

    info!("Lamp-test mode stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn latch(buffers: &SharedBuffers, state: PanelState) {
        let mut input = buffers.input().acquire("test").await.unwrap();
        input.raw = state;
        input.debounced = state;
    }

    #[tokio::test]
    async fn test_requested_only_for_button_one() {
        let buffers = SharedBuffers::new();
        assert!(!lamp_test_requested(&buffers).await);

        latch(&buffers, PanelState::new(2).unwrap()).await;
        assert!(!lamp_test_requested(&buffers).await);

        latch(&buffers, PanelState::new(1).unwrap()).await;
        assert!(lamp_test_requested(&buffers).await);
    }

    #[tokio::test]
    async fn test_not_requested_when_input_locked() {
        let buffers = SharedBuffers::new();
        latch(&buffers, PanelState::new(1).unwrap()).await;

        let held = buffers.input().acquire("holder").await.unwrap();
        assert!(!lamp_test_requested(&buffers).await);
        drop(held);
    }

    #[tokio::test]
    async fn test_mirrors_buttons_onto_leds() {
        let buffers = Arc::new(SharedBuffers::new());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(run_lamp_test(buffers.clone(), shutdown_rx));

        latch(&buffers, PanelState::new(4).unwrap()).await;
        tokio::time::sleep(LAMP_TEST_INTERVAL * 3).await;
        assert_eq!(
            buffers.led_panel_state().await.unwrap(),
            PanelState::new(4).unwrap()
        );

        latch(&buffers, PanelState::NONE).await;
        tokio::time::sleep(LAMP_TEST_INTERVAL * 3).await;
        assert_eq!(buffers.led_panel_state().await.unwrap(), PanelState::NONE);

        shutdown_tx.send(()).unwrap();
        handle.await.unwrap();
    }
}
