//! # Button Bindings
//!
//! Turns held buttons into discrete [`ControlEvent`]s.
//!
//! An event fires on the poll where its button goes from released to pressed.
//! Holding a button does not repeat the event.

use super::device::InputDevice;
use crate::config::InputConfig;

/// Discrete operator request fed into the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// Engage the emergency stop.
    EmergencyStop,
    /// Release the emergency stop.
    Release,
    /// End the session.
    Quit,
}

/// Maps configured buttons to control events with rising-edge detection.
#[derive(Debug, Clone)]
pub struct ButtonBindings {
    stop_button: usize,
    release_button: usize,
    quit_button: Option<usize>,
    stop_held: bool,
    release_held: bool,
    quit_held: bool,
}

impl ButtonBindings {
    #[must_use]
    pub fn new(stop_button: usize, release_button: usize, quit_button: Option<usize>) -> Self {
        Self {
            stop_button,
            release_button,
            quit_button,
            stop_held: false,
            release_held: false,
            quit_held: false,
        }
    }

    #[must_use]
    pub fn from_config(config: &InputConfig) -> Self {
        Self::new(config.stop_button, config.release_button, config.quit_button)
    }

    /// Reads the bound buttons and appends any newly pressed events to `events`.
    pub fn collect<D: InputDevice + ?Sized>(&mut self, device: &D, events: &mut Vec<ControlEvent>) {
        let stop = device.button_pressed(self.stop_button);
        let release = device.button_pressed(self.release_button);
        let quit = self
            .quit_button
            .map(|button| device.button_pressed(button))
            .unwrap_or(false);

        if stop && !self.stop_held {
            events.push(ControlEvent::EmergencyStop);
        }
        if release && !self.release_held {
            events.push(ControlEvent::Release);
        }
        if quit && !self.quit_held {
            events.push(ControlEvent::Quit);
        }

        self.stop_held = stop;
        self.release_held = release;
        self.quit_held = quit;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::device::MockInputDevice;
    use std::sync::{Arc, Mutex};

    /// Mock whose pressed-button set can be changed between polls.
    fn device_with(pressed: Arc<Mutex<Vec<usize>>>) -> MockInputDevice {
        let mut device = MockInputDevice::new();
        device
            .expect_button_pressed()
            .returning(move |button| pressed.lock().unwrap().contains(&button));
        device
    }

    #[test]
    fn test_no_buttons_no_events() {
        let pressed = Arc::new(Mutex::new(vec![]));
        let device = device_with(pressed);
        let mut bindings = ButtonBindings::new(1, 0, Some(7));

        let mut events = Vec::new();
        bindings.collect(&device, &mut events);
        assert!(events.is_empty());
    }

    #[test]
    fn test_press_fires_once_while_held() {
        let pressed = Arc::new(Mutex::new(vec![1]));
        let device = device_with(pressed.clone());
        let mut bindings = ButtonBindings::new(1, 0, Some(7));

        let mut events = Vec::new();
        bindings.collect(&device, &mut events);
        assert_eq!(events, vec![ControlEvent::EmergencyStop]);

        events.clear();
        bindings.collect(&device, &mut events);
        assert!(events.is_empty(), "held button must not repeat");

        // Release then press again
        pressed.lock().unwrap().clear();
        bindings.collect(&device, &mut events);
        pressed.lock().unwrap().push(1);
        bindings.collect(&device, &mut events);
        assert_eq!(events, vec![ControlEvent::EmergencyStop]);
    }

    #[test]
    fn test_stop_and_release_same_poll() {
        let pressed = Arc::new(Mutex::new(vec![0, 1]));
        let device = device_with(pressed);
        let mut bindings = ButtonBindings::new(1, 0, None);

        let mut events = Vec::new();
        bindings.collect(&device, &mut events);
        assert_eq!(events, vec![ControlEvent::EmergencyStop, ControlEvent::Release]);
    }

    #[test]
    fn test_quit_button() {
        let pressed = Arc::new(Mutex::new(vec![7]));
        let device = device_with(pressed);
        let mut bindings = ButtonBindings::new(1, 0, Some(7));

        let mut events = Vec::new();
        bindings.collect(&device, &mut events);
        assert_eq!(events, vec![ControlEvent::Quit]);
    }

    #[test]
    fn test_unbound_quit_ignored() {
        let pressed = Arc::new(Mutex::new(vec![7]));
        let device = device_with(pressed);
        let mut bindings = ButtonBindings::new(1, 0, None);

        let mut events = Vec::new();
        bindings.collect(&device, &mut events);
        assert!(events.is_empty());
    }
}
