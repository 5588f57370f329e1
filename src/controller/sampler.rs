//! # Input Sampler
//!
//! Turns raw stick axis readings into a [`StickSample`].
//!
//! ## Deadzone
//!
//! The deadzone is applied per axis *before* magnitude and angle are computed.
//! A raw value whose absolute value is below the threshold snaps to exactly
//! `0.0`; values at or above the threshold pass through unscaled. Filtering
//! each axis on its own means a mostly-horizontal push keeps its horizontal
//! component even when its vertical component sits in the deadzone.
//!
//! ## Usage
//!
//! ```
//! use joydrive::controller::sampler::InputSampler;
//!
//! let sampler = InputSampler::new(0.1);
//!
//! // Stick drift is discarded
//! let rest = sampler.sample(0.05, -0.08);
//! assert_eq!(rest.magnitude, 0.0);
//! assert_eq!(rest.angle, 0.0);
//!
//! // Diagonals outside the unit circle are clamped
//! let corner = sampler.sample(1.0, 1.0);
//! assert_eq!(corner.magnitude, 1.0);
//! ```

use super::device::InputDevice;
use crate::config::InputConfig;

/// Normalized stick position for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StickSample {
    /// Horizontal axis after deadzone, -1.0 (left) to 1.0 (right).
    pub x: f32,
    /// Vertical axis after deadzone, -1.0 (back) to 1.0 (forward).
    pub y: f32,
    /// Distance from center, clamped to 1.0.
    pub magnitude: f32,
    /// `atan2(y, x)` in radians, or 0.0 when the stick is at rest.
    pub angle: f32,
}

impl StickSample {
    /// Returns true when both axes are inside the deadzone.
    #[must_use]
    pub fn is_at_rest(&self) -> bool {
        self.magnitude == 0.0
    }
}

/// Reads the drive stick from an input device and normalizes it.
#[derive(Debug, Clone)]
pub struct InputSampler {
    deadzone: f32,
    axis_x: usize,
    axis_y: usize,
    invert_y: bool,
}

impl InputSampler {
    /// Creates a sampler on axes 0/1 with the given deadzone and no axis inversion.
    #[must_use]
    pub fn new(deadzone: f32) -> Self {
        Self {
            deadzone: deadzone.clamp(0.0, 1.0),
            axis_x: 0,
            axis_y: 1,
            invert_y: false,
        }
    }

    /// Creates a sampler from the `[input]` configuration section.
    #[must_use]
    pub fn from_config(config: &InputConfig) -> Self {
        Self {
            deadzone: config.deadzone.clamp(0.0, 1.0),
            axis_x: config.axis_x,
            axis_y: config.axis_y,
            invert_y: config.invert_y,
        }
    }

    /// Returns the configured deadzone threshold.
    #[must_use]
    pub fn deadzone(&self) -> f32 {
        self.deadzone
    }

    /// Reads the configured axes from `device` and produces a sample.
    pub fn read<D: InputDevice + ?Sized>(&self, device: &D) -> StickSample {
        let raw_x = device.axis_value(self.axis_x);
        let mut raw_y = device.axis_value(self.axis_y);

        // evdev reports stick-up as negative
        if self.invert_y {
            raw_y = -raw_y;
        }

        self.sample(raw_x, raw_y)
    }

    /// Produces a sample from raw axis values in the range -1.0 to 1.0.
    ///
    /// Non-finite readings are treated as centered.
    #[must_use]
    pub fn sample(&self, raw_x: f32, raw_y: f32) -> StickSample {
        let x = self.filter_axis(raw_x);
        let y = self.filter_axis(raw_y);

        let magnitude = (x * x + y * y).sqrt().min(1.0);
        let angle = if magnitude > 0.0 { y.atan2(x) } else { 0.0 };

        StickSample { x, y, magnitude, angle }
    }

    #[inline]
    fn filter_axis(&self, raw: f32) -> f32 {
        if !raw.is_finite() {
            return 0.0;
        }

        let value = raw.clamp(-1.0, 1.0);
        if value.abs() < self.deadzone {
            0.0
        } else {
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::device::MockInputDevice;
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    const EPSILON: f32 = 1e-6;

    #[test]
    fn test_both_axes_inside_deadzone() {
        let sampler = InputSampler::new(0.1);

        for &(x, y) in &[(0.0, 0.0), (0.09, 0.09), (-0.099, 0.05), (0.05, -0.0999)] {
            let sample = sampler.sample(x, y);
            assert_eq!(sample.magnitude, 0.0, "({}, {}) should be at rest", x, y);
            assert_eq!(sample.angle, 0.0);
            assert_eq!(sample.x, 0.0);
            assert_eq!(sample.y, 0.0);
            assert!(sample.is_at_rest());
        }
    }

    #[test]
    fn test_deadzone_is_per_axis() {
        let sampler = InputSampler::new(0.1);

        // Y is drift, X is a real push
        let sample = sampler.sample(0.6, 0.05);
        assert_eq!(sample.x, 0.6);
        assert_eq!(sample.y, 0.0);
        assert!((sample.magnitude - 0.6).abs() < EPSILON);
        assert_eq!(sample.angle, 0.0);
    }

    #[test]
    fn test_threshold_value_passes_through() {
        let sampler = InputSampler::new(0.1);
        let sample = sampler.sample(0.1, 0.0);
        assert_eq!(sample.x, 0.1);
    }

    #[test]
    fn test_values_are_not_rescaled() {
        let sampler = InputSampler::new(0.15);
        let sample = sampler.sample(0.5, -0.3);
        assert_eq!(sample.x, 0.5);
        assert_eq!(sample.y, -0.3);
    }

    #[test]
    fn test_magnitude_clamped_outside_unit_circle() {
        let sampler = InputSampler::new(0.1);

        for &(x, y) in &[(1.0, 1.0), (-0.8, 0.8), (0.9, -0.5), (-1.0, -1.0)] {
            let sample = sampler.sample(x, y);
            assert_eq!(sample.magnitude, 1.0, "({}, {}) should clamp to 1.0", x, y);
        }
    }

    #[test]
    fn test_magnitude_inside_unit_circle() {
        let sampler = InputSampler::new(0.1);
        let sample = sampler.sample(0.3, 0.4);
        assert!((sample.magnitude - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_angle_quadrants() {
        let sampler = InputSampler::new(0.1);

        assert!((sampler.sample(1.0, 0.0).angle - 0.0).abs() < EPSILON);
        assert!((sampler.sample(0.0, 1.0).angle - FRAC_PI_2).abs() < EPSILON);
        assert!((sampler.sample(-1.0, 0.0).angle - PI).abs() < EPSILON);
        assert!((sampler.sample(0.0, -1.0).angle + FRAC_PI_2).abs() < EPSILON);
        assert!((sampler.sample(0.5, 0.5).angle - FRAC_PI_4).abs() < EPSILON);
    }

    #[test]
    fn test_out_of_range_raw_values_clamped() {
        let sampler = InputSampler::new(0.1);
        let sample = sampler.sample(1.7, -3.0);
        assert_eq!(sample.x, 1.0);
        assert_eq!(sample.y, -1.0);
    }

    #[test]
    fn test_non_finite_values_centered() {
        let sampler = InputSampler::new(0.1);
        let sample = sampler.sample(f32::NAN, f32::INFINITY);
        assert_eq!(sample, StickSample::default());
    }

    #[test]
    fn test_zero_deadzone_keeps_small_values() {
        let sampler = InputSampler::new(0.0);
        let sample = sampler.sample(0.01, 0.0);
        assert_eq!(sample.x, 0.01);
        assert!(!sample.is_at_rest());
    }

    #[test]
    fn test_read_inverts_y_from_device() {
        let config = InputConfig {
            axis_x: 0,
            axis_y: 1,
            invert_y: true,
            ..InputConfig::default()
        };
        let sampler = InputSampler::from_config(&config);

        let mut device = MockInputDevice::new();
        device
            .expect_axis_value()
            .returning(|axis| if axis == 0 { 0.25 } else { -0.75 });

        let sample = sampler.read(&device);
        assert_eq!(sample.x, 0.25);
        assert_eq!(sample.y, 0.75);
    }

    #[test]
    fn test_read_uses_configured_axes() {
        let config = InputConfig {
            axis_x: 3,
            axis_y: 4,
            invert_y: false,
            ..InputConfig::default()
        };
        let sampler = InputSampler::from_config(&config);

        let mut device = MockInputDevice::new();
        device.expect_axis_value().returning(|axis| match axis {
            3 => -0.5,
            4 => 0.5,
            _ => 0.0,
        });

        let sample = sampler.read(&device);
        assert_eq!(sample.x, -0.5);
        assert_eq!(sample.y, 0.5);
    }
}
