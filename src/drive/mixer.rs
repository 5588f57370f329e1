//! # Drive Mixer
//!
//! Converts a [`StickSample`] into left/right duty cycles for a differential
//! drive.
//!
//! ```text
//! speed = y * sensitivity
//! turn  = x * sensitivity * turn_multiplier
//! left  = clamp(speed + turn, -1, 1) * max_speed
//! right = clamp(speed - turn, -1, 1) * max_speed
//! ```
//!
//! Each side is clamped on its own, so a hard diagonal saturates one side
//! while the other keeps its value. There is no renormalization.
//!
//! `turn_multiplier` carries the turn direction convention of a deployment:
//! wiring and motor orientation differ between robots, so a negative value
//! is a calibration choice, not a correction.
//!
//! ## Usage
//!
//! ```
//! use joydrive::controller::sampler::InputSampler;
//! use joydrive::drive::mixer::DriveMixer;
//!
//! let sample = InputSampler::new(0.1).sample(0.5, 0.5);
//! let command = DriveMixer::new(0.8, 1.0, 1.0).mix(&sample);
//!
//! assert!((command.left - 0.8).abs() < 1e-6);
//! assert!(command.right.abs() < 1e-6);
//! ```

use crate::config::DriveConfig;
use crate::controller::sampler::StickSample;

/// Duty cycle pair for the two drive motors.
///
/// Values are in `-max_speed..=max_speed`; the sign is the direction.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DriveCommand {
    pub left: f32,
    pub right: f32,
}

impl DriveCommand {
    /// Both motors stopped.
    pub const STOP: DriveCommand = DriveCommand { left: 0.0, right: 0.0 };

    #[must_use]
    pub fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    #[must_use]
    pub fn is_stop(&self) -> bool {
        self.left == 0.0 && self.right == 0.0
    }
}

/// Differential steering mixer.
///
/// Stateless: the same sample always produces the same command.
#[derive(Debug, Clone, Copy)]
pub struct DriveMixer {
    max_speed: f32,
    sensitivity: f32,
    turn_multiplier: f32,
}

impl Default for DriveMixer {
    fn default() -> Self {
        Self::new(0.8, 1.0, 1.0)
    }
}

impl DriveMixer {
    /// Creates a mixer.
    ///
    /// # Arguments
    ///
    /// * `max_speed` - Duty cycle ceiling (clamped to 0.0..=1.0)
    /// * `sensitivity` - Stick scaling applied to both axes
    /// * `turn_multiplier` - Signed scaling of the turn component
    #[must_use]
    pub fn new(max_speed: f32, sensitivity: f32, turn_multiplier: f32) -> Self {
        Self {
            max_speed: max_speed.clamp(0.0, 1.0),
            sensitivity,
            turn_multiplier,
        }
    }

    #[must_use]
    pub fn from_config(config: &DriveConfig) -> Self {
        Self::new(config.max_speed, config.sensitivity, config.turn_multiplier)
    }

    #[must_use]
    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    /// Mixes a stick sample into a drive command.
    #[must_use]
    pub fn mix(&self, sample: &StickSample) -> DriveCommand {
        let speed = sample.y * self.sensitivity;
        let turn = sample.x * self.sensitivity * self.turn_multiplier;

        let left = (speed + turn).clamp(-1.0, 1.0);
        let right = (speed - turn).clamp(-1.0, 1.0);

        DriveCommand {
            left: left * self.max_speed,
            right: right * self.max_speed,
        }
    }
}
