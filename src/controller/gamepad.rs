//! # Gamepad Module
//!
//! Joystick detection and polling through the Linux evdev interface.
//!
//! ## Controller Detection
//!
//! Any event device that reports both `ABS_X` and `ABS_Y` and at least one
//! gamepad or joystick button is accepted. Devices are scanned in sorted
//! path order so the choice is stable when several are plugged in.
//!
//! ## Indices
//!
//! Axis indices follow the order of the device's supported absolute axes and
//! button indices the order of its supported keys, both ascending by evdev
//! code. On an Xbox-style pad this yields the usual layout: axis 0/1 is the
//! left stick, button 0 is A and button 1 is B.

use evdev::{AbsoluteAxisType, Device, Key};
use std::path::Path;
use tracing::{debug, info};

use super::device::InputDevice;
use crate::error::{JoydriveError, Result};

/// Buttons that mark an event device as a game controller.
const CONTROLLER_BUTTONS: &[Key] = &[Key::BTN_SOUTH, Key::BTN_TRIGGER];

/// Kernel-reported range of one absolute axis.
#[derive(Debug, Clone, Copy)]
struct AxisChannel {
    axis: AbsoluteAxisType,
    minimum: i32,
    maximum: i32,
}

/// Joystick handle
///
/// Represents an open evdev joystick. [`InputDevice::poll`] snapshots the
/// full axis and button state; reads between polls are served from that
/// snapshot.
pub struct Gamepad {
    device: Device,
    device_path: String,
    name: String,
    axes: Vec<AxisChannel>,
    buttons: Vec<Key>,
    axis_values: Vec<f32>,
    button_states: Vec<bool>,
}

impl std::fmt::Debug for Gamepad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gamepad")
            .field("device_path", &self.device_path)
            .field("name", &self.name)
            .field("axes", &self.axes.len())
            .field("buttons", &self.buttons.len())
            .finish_non_exhaustive()
    }
}

impl Gamepad {
    /// Open a joystick
    ///
    /// Opens `device_path` when it is non-empty, otherwise scans
    /// `/dev/input/event*` for the first joystick.
    ///
    /// # Errors
    ///
    /// - `ControllerNotFound`: No joystick found on the system
    /// - `Controller`: The configured device could not be opened or queried
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use joydrive::controller::gamepad::Gamepad;
    ///
    /// let gamepad = Gamepad::open("")?;
    /// println!("Connected to joystick at: {}", gamepad.device_path());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn open(device_path: &str) -> Result<Self> {
        if !device_path.is_empty() {
            let device = Device::open(device_path).map_err(|e| {
                JoydriveError::Controller(format!("Failed to open {}: {}", device_path, e))
            })?;
            return Self::from_device(device, device_path.to_string());
        }

        Self::scan()
    }

    fn scan() -> Result<Self> {
        let input_dir = Path::new("/dev/input");

        if !input_dir.exists() {
            return Err(JoydriveError::ControllerNotFound);
        }

        let mut entries: Vec<_> = std::fs::read_dir(input_dir)
            .map_err(|e| JoydriveError::Controller(format!("Failed to read /dev/input: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| JoydriveError::Controller(format!("Failed to read directory entry: {}", e)))?;

        entries.sort_by_key(|entry| entry.path());

        for entry in entries {
            let path = entry.path();

            let is_event_node = path
                .file_name()
                .map(|name| name.to_string_lossy().starts_with("event"))
                .unwrap_or(false);
            if !is_event_node {
                continue;
            }

            match Device::open(&path) {
                Ok(device) => {
                    debug!(
                        "Found input device: {} ({})",
                        path.display(),
                        device.name().unwrap_or("unnamed")
                    );

                    if is_joystick(&device) {
                        let device_path = path.to_string_lossy().to_string();
                        info!("Found joystick at: {}", device_path);
                        return Self::from_device(device, device_path);
                    }
                }
                Err(e) => {
                    // Permission denied or other errors - skip device
                    debug!("Could not open {}: {}", path.display(), e);
                }
            }
        }

        Err(JoydriveError::ControllerNotFound)
    }

    fn from_device(device: Device, device_path: String) -> Result<Self> {
        let abs_state = device
            .get_abs_state()
            .map_err(|e| JoydriveError::Controller(format!("Failed to read axis ranges: {}", e)))?;

        let axes: Vec<AxisChannel> = device
            .supported_absolute_axes()
            .map(|set| {
                set.iter()
                    .map(|axis| {
                        let info = abs_state[axis.0 as usize];
                        AxisChannel {
                            axis,
                            minimum: info.minimum,
                            maximum: info.maximum,
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let buttons: Vec<Key> = device
            .supported_keys()
            .map(|set| set.iter().collect())
            .unwrap_or_default();

        let name = device.name().unwrap_or("Unknown joystick").to_string();

        Ok(Self {
            axis_values: vec![0.0; axes.len()],
            button_states: vec![false; buttons.len()],
            device,
            device_path,
            name,
            axes,
            buttons,
        })
    }

    /// Get the device path of this joystick
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

impl InputDevice for Gamepad {
    fn poll(&mut self) -> Result<()> {
        let abs_state = self
            .device
            .get_abs_state()
            .map_err(|e| JoydriveError::Controller(format!("Failed to read axes: {}", e)))?;

        for (value, channel) in self.axis_values.iter_mut().zip(&self.axes) {
            let raw = abs_state[channel.axis.0 as usize].value;
            *value = normalize_axis(raw, channel.minimum, channel.maximum);
        }

        let key_state = self
            .device
            .get_key_state()
            .map_err(|e| JoydriveError::Controller(format!("Failed to read buttons: {}", e)))?;

        for (pressed, key) in self.button_states.iter_mut().zip(&self.buttons) {
            *pressed = key_state.contains(*key);
        }

        Ok(())
    }

    fn axis_value(&self, axis: usize) -> f32 {
        self.axis_values.get(axis).copied().unwrap_or(0.0)
    }

    fn button_pressed(&self, button: usize) -> bool {
        self.button_states.get(button).copied().unwrap_or(false)
    }

    fn device_name(&self) -> String {
        self.name.clone()
    }

    fn axis_count(&self) -> usize {
        self.axes.len()
    }

    fn button_count(&self) -> usize {
        self.buttons.len()
    }
}

/// Returns true if the device looks like a stick with buttons.
fn is_joystick(device: &Device) -> bool {
    let has_stick = device
        .supported_absolute_axes()
        .map(|axes| axes.contains(AbsoluteAxisType::ABS_X) && axes.contains(AbsoluteAxisType::ABS_Y))
        .unwrap_or(false);

    let has_buttons = device
        .supported_keys()
        .map(|keys| CONTROLLER_BUTTONS.iter().any(|key| keys.contains(*key)))
        .unwrap_or(false);

    has_stick && has_buttons
}

/// Maps a raw axis reading in `minimum..=maximum` onto -1.0..=1.0.
///
/// A degenerate range reads as centered.
pub fn normalize_axis(value: i32, minimum: i32, maximum: i32) -> f32 {
    if maximum <= minimum {
        return 0.0;
    }

    let span = f64::from(maximum) - f64::from(minimum);
    let offset = f64::from(value) - f64::from(minimum);
    ((2.0 * offset / span - 1.0) as f32).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_signed_range() {
        // Xbox pads report -32768..=32767
        assert_eq!(normalize_axis(-32768, -32768, 32767), -1.0);
        assert_eq!(normalize_axis(32767, -32768, 32767), 1.0);
        assert!(normalize_axis(0, -32768, 32767).abs() < 1e-4);
    }

    #[test]
    fn test_normalize_unsigned_range() {
        // DualSense-style pads report 0..=255
        assert_eq!(normalize_axis(0, 0, 255), -1.0);
        assert_eq!(normalize_axis(255, 0, 255), 1.0);
        assert!(normalize_axis(128, 0, 255).abs() < 0.01);
    }

    #[test]
    fn test_normalize_clamps_out_of_range() {
        assert_eq!(normalize_axis(300, 0, 255), 1.0);
        assert_eq!(normalize_axis(-10, 0, 255), -1.0);
    }

    #[test]
    fn test_normalize_degenerate_range() {
        assert_eq!(normalize_axis(5, 10, 10), 0.0);
        assert_eq!(normalize_axis(5, 10, 0), 0.0);
    }

    #[test]
    fn test_controller_buttons() {
        assert!(CONTROLLER_BUTTONS.contains(&Key::BTN_SOUTH));
        assert!(CONTROLLER_BUTTONS.contains(&Key::BTN_TRIGGER));
        assert_eq!(CONTROLLER_BUTTONS.len(), 2);
    }

    // Integration test - only runs with real hardware
    #[test]
    #[ignore]
    fn test_open_with_real_hardware() {
        let result = Gamepad::open("");
        assert!(result.is_ok(), "Should detect a connected joystick");

        let gamepad = result.unwrap();
        assert!(gamepad.device_path().starts_with("/dev/input/event"));
        assert!(gamepad.axis_count() >= 2);
        assert!(gamepad.button_count() >= 1);
    }

    // Integration test - only runs with real hardware
    #[test]
    #[ignore]
    fn test_poll_with_real_hardware() {
        let mut gamepad = Gamepad::open("").expect("Joystick not found");

        println!("Move the left stick within 5 seconds...");

        for _ in 0..100 {
            gamepad.poll().expect("poll failed");
            let x = gamepad.axis_value(0);
            let y = gamepad.axis_value(1);
            if x.abs() > 0.5 || y.abs() > 0.5 {
                return;
            }
            std::thread::sleep(std::time::Duration::from_millis(50));
        }

        panic!("No stick movement observed");
    }
}
