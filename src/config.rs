//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every section and every field is optional; missing values fall back to the
//! defaults below, so an empty file is a valid configuration.

use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{JoydriveError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub drive: DriveConfig,
    #[serde(default)]
    pub link: LinkConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub control: ControlConfig,
}

/// Joystick input configuration
#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    /// evdev device path; empty means auto-detect
    #[serde(default)]
    pub device_path: String,

    #[serde(default = "default_axis_x")]
    pub axis_x: usize,

    #[serde(default = "default_axis_y")]
    pub axis_y: usize,

    /// Negate the Y axis so that pushing the stick away from the user is positive
    #[serde(default = "default_invert_y")]
    pub invert_y: bool,

    #[serde(default = "default_deadzone")]
    pub deadzone: f32,

    #[serde(default = "default_stop_button")]
    pub stop_button: usize,

    #[serde(default = "default_release_button")]
    pub release_button: usize,

    #[serde(default = "default_quit_button")]
    pub quit_button: Option<usize>,
}

/// Differential drive mixing configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DriveConfig {
    /// Safety ceiling applied to both duty cycles
    #[serde(default = "default_max_speed")]
    pub max_speed: f32,

    #[serde(default = "default_sensitivity")]
    pub sensitivity: f32,

    /// Signed turn multiplier; negative values swap the turn direction
    #[serde(default = "default_turn_multiplier")]
    pub turn_multiplier: f32,
}

/// How drive commands reach the motor controllers
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Send inline on the control loop
    Direct,
    /// Hand off to a background worker through a bounded queue
    Queued,
}

/// Motor link configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LinkConfig {
    #[serde(default = "default_link_enabled")]
    pub enabled: bool,

    #[serde(default = "default_left_port")]
    pub left_port: String,

    #[serde(default = "default_right_port")]
    pub right_port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_delivery")]
    pub delivery: DeliveryMode,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default = "default_worker_rate_hz")]
    pub worker_rate_hz: u32,

    #[serde(default = "default_send_timeout_ms")]
    pub send_timeout_ms: u64,

    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,

    #[serde(default = "default_join_timeout_ms")]
    pub join_timeout_ms: u64,

    #[serde(default = "default_failure_warn_threshold")]
    pub failure_warn_threshold: u32,
}

/// Latency telemetry configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    #[serde(default = "default_report_interval_ms")]
    pub report_interval_ms: u64,

    #[serde(default = "default_slow_send_ms")]
    pub slow_send_ms: u64,

    #[serde(default = "default_critical_send_ms")]
    pub critical_send_ms: u64,
}

/// Control loop configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControlConfig {
    #[serde(default = "default_loop_rate_hz")]
    pub loop_rate_hz: u32,
}

// Default value functions
fn default_axis_x() -> usize { 0 }
fn default_axis_y() -> usize { 1 }
fn default_invert_y() -> bool { true }
fn default_deadzone() -> f32 { 0.1 }
fn default_stop_button() -> usize { 1 }
fn default_release_button() -> usize { 0 }
fn default_quit_button() -> Option<usize> { Some(7) }

fn default_max_speed() -> f32 { 0.8 }
fn default_sensitivity() -> f32 { 1.0 }
fn default_turn_multiplier() -> f32 { 1.0 }

fn default_link_enabled() -> bool { true }
fn default_left_port() -> String { "/dev/ttyACM0".to_string() }
fn default_right_port() -> String { "/dev/ttyACM1".to_string() }
fn default_baud_rate() -> u32 { 115200 }
fn default_delivery() -> DeliveryMode { DeliveryMode::Direct }
fn default_queue_capacity() -> usize { 4 }
fn default_worker_rate_hz() -> u32 { 50 }
fn default_send_timeout_ms() -> u64 { 100 }
fn default_shutdown_grace_ms() -> u64 { 100 }
fn default_join_timeout_ms() -> u64 { 500 }
fn default_failure_warn_threshold() -> u32 { 3 }

fn default_history_capacity() -> usize { 100 }
fn default_report_interval_ms() -> u64 { 1000 }
fn default_slow_send_ms() -> u64 { 50 }
fn default_critical_send_ms() -> u64 { 100 }

fn default_loop_rate_hz() -> u32 { 60 }

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            device_path: String::new(),
            axis_x: default_axis_x(),
            axis_y: default_axis_y(),
            invert_y: default_invert_y(),
            deadzone: default_deadzone(),
            stop_button: default_stop_button(),
            release_button: default_release_button(),
            quit_button: default_quit_button(),
        }
    }
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            max_speed: default_max_speed(),
            sensitivity: default_sensitivity(),
            turn_multiplier: default_turn_multiplier(),
        }
    }
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            enabled: default_link_enabled(),
            left_port: default_left_port(),
            right_port: default_right_port(),
            baud_rate: default_baud_rate(),
            delivery: default_delivery(),
            queue_capacity: default_queue_capacity(),
            worker_rate_hz: default_worker_rate_hz(),
            send_timeout_ms: default_send_timeout_ms(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
            join_timeout_ms: default_join_timeout_ms(),
            failure_warn_threshold: default_failure_warn_threshold(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            history_capacity: default_history_capacity(),
            report_interval_ms: default_report_interval_ms(),
            slow_send_ms: default_slow_send_ms(),
            critical_send_ms: default_critical_send_ms(),
        }
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            loop_rate_hz: default_loop_rate_hz(),
        }
    }
}

impl LinkConfig {
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }

    /// Period between queued worker sends
    pub fn worker_period(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.worker_rate_hz))
    }
}

impl ControlConfig {
    /// Period between control loop ticks
    pub fn tick_period(&self) -> Duration {
        Duration::from_micros(1_000_000 / u64::from(self.loop_rate_hz))
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use joydrive::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        // Input
        if !(0.0..=0.5).contains(&self.input.deadzone) {
            return Err(invalid("deadzone must be between 0.0 and 0.5"));
        }

        if self.input.axis_x == self.input.axis_y {
            return Err(invalid("axis_x and axis_y must be different axes"));
        }

        if self.input.stop_button == self.input.release_button {
            return Err(invalid("stop_button and release_button must be different buttons"));
        }

        if let Some(quit) = self.input.quit_button {
            if quit == self.input.stop_button || quit == self.input.release_button {
                return Err(invalid("quit_button must not share a stop or release binding"));
            }
        }

        // Drive
        if !(self.drive.max_speed > 0.0 && self.drive.max_speed <= 1.0) {
            return Err(invalid("max_speed must be greater than 0.0 and at most 1.0"));
        }

        if !(self.drive.sensitivity > 0.0 && self.drive.sensitivity <= 2.0) {
            return Err(invalid("sensitivity must be greater than 0.0 and at most 2.0"));
        }

        let turn = self.drive.turn_multiplier.abs();
        if !(turn > 0.0 && turn <= 2.0) {
            return Err(invalid("turn_multiplier magnitude must be greater than 0.0 and at most 2.0"));
        }

        // Link
        if self.link.enabled {
            if self.link.left_port.is_empty() || self.link.right_port.is_empty() {
                return Err(invalid("left_port and right_port cannot be empty when the link is enabled"));
            }

            if self.link.left_port == self.link.right_port {
                return Err(invalid("left_port and right_port must be different devices"));
            }
        }

        if ![9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600].contains(&self.link.baud_rate) {
            return Err(invalid(
                "baud_rate must be one of: 9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600",
            ));
        }

        if self.link.queue_capacity == 0 || self.link.queue_capacity > 8 {
            return Err(invalid("queue_capacity must be between 1 and 8"));
        }

        if self.link.worker_rate_hz == 0 || self.link.worker_rate_hz > 500 {
            return Err(invalid("worker_rate_hz must be between 1 and 500"));
        }

        if self.link.send_timeout_ms == 0 || self.link.send_timeout_ms > 10000 {
            return Err(invalid("send_timeout_ms must be between 1 and 10000"));
        }

        if self.link.shutdown_grace_ms > 5000 {
            return Err(invalid("shutdown_grace_ms must be at most 5000"));
        }

        if self.link.join_timeout_ms == 0 || self.link.join_timeout_ms > 10000 {
            return Err(invalid("join_timeout_ms must be between 1 and 10000"));
        }

        if self.link.failure_warn_threshold == 0 {
            return Err(invalid("failure_warn_threshold must be greater than 0"));
        }

        // Telemetry
        if self.telemetry.history_capacity == 0 || self.telemetry.history_capacity > 100_000 {
            return Err(invalid("history_capacity must be between 1 and 100000"));
        }

        if self.telemetry.report_interval_ms == 0 || self.telemetry.report_interval_ms > 60000 {
            return Err(invalid("report_interval_ms must be between 1 and 60000"));
        }

        if self.telemetry.slow_send_ms == 0 {
            return Err(invalid("slow_send_ms must be greater than 0"));
        }

        if self.telemetry.critical_send_ms <= self.telemetry.slow_send_ms {
            return Err(invalid("critical_send_ms must be greater than slow_send_ms"));
        }

        // Control
        if self.control.loop_rate_hz == 0 || self.control.loop_rate_hz > 500 {
            return Err(invalid("loop_rate_hz must be between 1 and 500"));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> JoydriveError {
    JoydriveError::InvalidConfig(message.to_string())
}
