//! Input device abstraction, so the control loop can run against real
//! hardware or a test double.

use crate::error::Result;

/// Polled joystick.
///
/// Axis values are normalized to -1.0..=1.0. Indices that the device does not
/// have read as centered / released.
#[cfg_attr(test, mockall::automock)]
pub trait InputDevice {
    /// Refresh the cached axis and button state from the device.
    fn poll(&mut self) -> Result<()>;

    /// Normalized value of an axis.
    fn axis_value(&self, axis: usize) -> f32;

    /// Whether a button is currently held.
    fn button_pressed(&self, button: usize) -> bool;

    /// Human-readable device name.
    fn device_name(&self) -> String;

    fn axis_count(&self) -> usize;

    fn button_count(&self) -> usize;
}
