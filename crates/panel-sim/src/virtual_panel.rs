//! Virtual panel hardware
//!
//! Stands in for the six buttons and three LED lines. Handles are cheap
//! clones over shared atomic lines, so one clone can be moved into the panel
//! I/O task while another presses buttons and watches the LEDs.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use panel_core::{Level, PanelPins, PanelState, PinId, BUTTON_PINS, LED_PINS, PANEL_BUTTONS};
use tracing::{debug, warn};

use crate::error::SimError;

/// Hold time used by [`VirtualPanel::click`] when a caller has no preference
pub const DEFAULT_CLICK_HOLD: Duration = Duration::from_millis(80);

#[derive(Debug, Default)]
struct PanelLines {
    /// `true` while the button is held
    pressed: [AtomicBool; PANEL_BUTTONS],
    /// `true` while the LED line is driven high
    leds: [AtomicBool; 3],
    led_writes: AtomicUsize,
}

/// Simulated buttons and LEDs
#[derive(Debug, Clone, Default)]
pub struct VirtualPanel {
    lines: Arc<PanelLines>,
}

impl VirtualPanel {
    /// Create a panel with nothing pressed and every LED dark
    pub fn new() -> Self {
        Self::default()
    }

    fn line(&self, button: usize) -> Result<&AtomicBool, SimError> {
        button
            .checked_sub(1)
            .and_then(|index| self.lines.pressed.get(index))
            .ok_or(SimError::InvalidButton(button))
    }

    /// Hold a button down (1-6)
    pub fn press(&self, button: usize) -> Result<(), SimError> {
        self.line(button)?.store(true, Ordering::SeqCst);
        debug!("Virtual panel: button {} down", button);
        Ok(())
    }

    /// Let a button go (1-6)
    pub fn release(&self, button: usize) -> Result<(), SimError> {
        self.line(button)?.store(false, Ordering::SeqCst);
        debug!("Virtual panel: button {} up", button);
        Ok(())
    }

    /// Let every button go
    pub fn release_all(&self) {
        for line in &self.lines.pressed {
            line.store(false, Ordering::SeqCst);
        }
    }

    /// Press, hold for `hold`, release
    ///
    /// The hold has to outlast the debounce window for the press to count.
    pub async fn click(&self, button: usize, hold: Duration) -> Result<(), SimError> {
        self.press(button)?;
        tokio::time::sleep(hold).await;
        self.release(button)
    }

    /// Buttons currently held, in panel order
    pub fn pressed(&self) -> Vec<usize> {
        self.lines
            .pressed
            .iter()
            .enumerate()
            .filter(|(_, line)| line.load(Ordering::SeqCst))
            .map(|(index, _)| index + 1)
            .collect()
    }

    /// Current levels of LED lines A, B and C
    pub fn led_lines(&self) -> [bool; 3] {
        [0, 1, 2].map(|i| self.lines.leds[i].load(Ordering::SeqCst))
    }

    /// Button whose LED the lines currently select
    pub fn lit_button(&self) -> PanelState {
        PanelState::from_led_lines(self.led_lines()).unwrap_or(PanelState::NONE)
    }

    /// Number of LED pin writes seen so far
    pub fn led_writes(&self) -> usize {
        self.lines.led_writes.load(Ordering::SeqCst)
    }
}

impl PanelPins for VirtualPanel {
    fn read_pin(&self, id: PinId) -> Level {
        match BUTTON_PINS.iter().position(|&pin| pin == id) {
            // Pulled up: a held button reads low
            Some(index) => Level::from(!self.lines.pressed[index].load(Ordering::SeqCst)),
            None => {
                warn!("Virtual panel: read of unmapped pin {}", id);
                Level::High
            }
        }
    }

    fn write_pin(&mut self, id: PinId, level: Level) {
        match LED_PINS.iter().position(|&pin| pin == id) {
            Some(index) => {
                self.lines.leds[index].store(level == Level::High, Ordering::SeqCst);
                self.lines.led_writes.fetch_add(1, Ordering::SeqCst);
            }
            None => warn!("Virtual panel: write to unmapped pin {}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use panel_core::resolve_pressed;
    use proptest::prelude::*;

    #[test]
    fn test_buttons_read_active_low() {
        let panel = VirtualPanel::new();
        assert!(BUTTON_PINS.iter().all(|&pin| panel.read_pin(pin) == Level::High));

        panel.press(2).unwrap();
        assert_eq!(panel.read_pin(BUTTON_PINS[1]), Level::Low);
        assert_eq!(panel.pressed(), vec![2]);

        panel.release(2).unwrap();
        assert_eq!(panel.read_pin(BUTTON_PINS[1]), Level::High);
    }

    #[test]
    fn test_invalid_buttons_rejected() {
        let panel = VirtualPanel::new();
        assert_eq!(panel.press(0), Err(SimError::InvalidButton(0)));
        assert_eq!(panel.release(7), Err(SimError::InvalidButton(7)));
    }

    #[test]
    fn test_clones_share_lines() {
        let panel = VirtualPanel::new();
        let mut driver = panel.clone();

        panel.press(5).unwrap();
        assert_eq!(driver.read_pin(BUTTON_PINS[4]), Level::Low);

        for (pin, on) in LED_PINS.iter().zip(PanelState::new(6).unwrap().led_lines()) {
            driver.write_pin(*pin, Level::from(on));
        }
        assert_eq!(panel.lit_button(), PanelState::new(6).unwrap());
        assert_eq!(panel.led_writes(), 3);
    }

    #[test]
    fn test_unmapped_pins_ignored() {
        let mut panel = VirtualPanel::new();
        assert_eq!(panel.read_pin(PinId(2)), Level::High);
        panel.write_pin(PinId(13), Level::High);
        assert_eq!(panel.led_writes(), 0);
    }

    #[tokio::test]
    async fn test_click_releases() {
        let panel = VirtualPanel::new();
        panel.click(3, Duration::from_millis(5)).await.unwrap();
        assert!(panel.pressed().is_empty());
    }

    proptest! {
        #[test]
        fn held_set_resolves_to_highest(held in prop::collection::btree_set(1usize..=6, 0..6)) {
            let panel = VirtualPanel::new();
            for &button in &held {
                panel.press(button).unwrap();
            }

            let levels = BUTTON_PINS.map(|pin| panel.read_pin(pin));
            let expected = held.iter().max().map_or(PanelState::NONE, |&b| PanelState::new(b as u8).unwrap());
            prop_assert_eq!(resolve_pressed(&levels), expected);
        }
    }
}
