//! # Controller Module
//!
//! Joystick input handling.
//!
//! This module handles:
//! - Joystick detection and polling via evdev
//! - Normalizing raw axes and applying the per-axis deadzone
//! - Turning bound buttons into emergency-stop / release / quit events

pub mod bindings;
pub mod device;
pub mod gamepad;
pub mod sampler;

pub use bindings::{ButtonBindings, ControlEvent};
pub use device::InputDevice;
pub use sampler::{InputSampler, StickSample};
