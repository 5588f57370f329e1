//! # Motor Endpoints
//!
//! One endpoint per drive side. Each endpoint is an independent motor
//! controller on its own serial device; nothing is shared between them.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

use super::port::{FramePort, SerialFramePort};
use super::protocol::encode_set_duty_frame;
use crate::config::LinkConfig;
use crate::drive::mixer::DriveCommand;
use crate::error::{JoydriveError, Result};

/// Logical position of a motor controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorRole {
    Left,
    Right,
}

impl std::fmt::Display for MotorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MotorRole::Left => write!(f, "left"),
            MotorRole::Right => write!(f, "right"),
        }
    }
}

/// A connected motor controller that accepts duty-cycle commands.
#[async_trait]
pub trait MotorEndpoint: Send {
    /// Identifier used in log messages (device path or test label).
    fn id(&self) -> &str;

    /// Set the motor duty cycle (-1.0..=1.0).
    async fn set_duty_cycle(&mut self, duty: f32) -> Result<()>;

    /// Release the endpoint.
    async fn close(&mut self) -> Result<()>;
}

/// VESC-compatible motor controller behind a serial port.
pub struct VescEndpoint<P: FramePort> {
    port: P,
    id: String,
}

impl<P: FramePort> std::fmt::Debug for VescEndpoint<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VescEndpoint")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl VescEndpoint<SerialFramePort> {
    /// Open a motor controller serial port
    ///
    /// # Errors
    ///
    /// Returns `Serial` if the device cannot be opened
    pub fn connect(path: &str, baud_rate: u32) -> Result<Self> {
        let port = SerialFramePort::open(path, baud_rate)?;
        info!("Opened motor controller at {}", path);
        Ok(Self::with_port(port, path))
    }
}

impl<P: FramePort> VescEndpoint<P> {
    /// Wrap an already open port
    pub fn with_port(port: P, id: impl Into<String>) -> Self {
        Self { port, id: id.into() }
    }
}

#[async_trait]
impl<P: FramePort> MotorEndpoint for VescEndpoint<P> {
    fn id(&self) -> &str {
        &self.id
    }

    async fn set_duty_cycle(&mut self, duty: f32) -> Result<()> {
        let frame = encode_set_duty_frame(duty);

        self.port
            .send_frame(&frame)
            .await
            .map_err(|e| JoydriveError::Serial(format!("Failed to write to {}: {}", self.id, e)))?;

        debug!("Sent duty {:.3} to {}", duty, self.id);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.port
            .drain()
            .await
            .map_err(|e| JoydriveError::Serial(format!("Failed to drain {}: {}", self.id, e)))?;

        debug!("Closed motor controller {}", self.id);
        Ok(())
    }
}

/// The left and right motor endpoints of a differential drive.
pub struct MotorPair {
    left: Box<dyn MotorEndpoint>,
    right: Box<dyn MotorEndpoint>,
    send_timeout: Duration,
}

impl std::fmt::Debug for MotorPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotorPair")
            .field("left", &self.left.id())
            .field("right", &self.right.id())
            .field("send_timeout", &self.send_timeout)
            .finish()
    }
}

impl MotorPair {
    pub fn new(
        left: Box<dyn MotorEndpoint>,
        right: Box<dyn MotorEndpoint>,
        send_timeout: Duration,
    ) -> Self {
        Self {
            left,
            right,
            send_timeout,
        }
    }

    /// Open both motor controllers named in the link configuration
    ///
    /// # Errors
    ///
    /// Returns the first endpoint's error if either side cannot be opened
    pub fn connect(config: &LinkConfig) -> Result<Self> {
        let left = VescEndpoint::connect(&config.left_port, config.baud_rate)?;
        let right = VescEndpoint::connect(&config.right_port, config.baud_rate)?;

        Ok(Self::new(Box::new(left), Box::new(right), config.send_timeout()))
    }

    /// Send a command to both sides
    ///
    /// Both sides are always attempted, each bounded by the send timeout.
    /// The first error (left before right) is returned.
    pub async fn send(&mut self, command: DriveCommand) -> Result<()> {
        let timeout = self.send_timeout;
        let left = send_bounded(self.left.as_mut(), command.left, timeout).await;
        let right = send_bounded(self.right.as_mut(), command.right, timeout).await;
        left.and(right)
    }

    /// Close both sides, each bounded by the send timeout
    pub async fn close(&mut self) -> Result<()> {
        let timeout = self.send_timeout;
        let left = close_bounded(self.left.as_mut(), timeout).await;
        let right = close_bounded(self.right.as_mut(), timeout).await;
        left.and(right)
    }

    pub fn endpoint_id(&self, role: MotorRole) -> &str {
        match role {
            MotorRole::Left => self.left.id(),
            MotorRole::Right => self.right.id(),
        }
    }
}

async fn send_bounded(endpoint: &mut dyn MotorEndpoint, duty: f32, timeout: Duration) -> Result<()> {
    let outcome = tokio::time::timeout(timeout, endpoint.set_duty_cycle(duty)).await;
    outcome.unwrap_or_else(|_| Err(timed_out(endpoint, timeout)))
}

async fn close_bounded(endpoint: &mut dyn MotorEndpoint, timeout: Duration) -> Result<()> {
    let outcome = tokio::time::timeout(timeout, endpoint.close()).await;
    outcome.unwrap_or_else(|_| Err(timed_out(endpoint, timeout)))
}

fn timed_out(endpoint: &dyn MotorEndpoint, timeout: Duration) -> JoydriveError {
    JoydriveError::LinkTimeout {
        endpoint: endpoint.id().to_string(),
        timeout_ms: timeout.as_millis() as u64,
    }
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use crate::motor::port::mocks::MockFramePort;

    /// Two mock-backed VESC endpoints plus handles to inspect them.
    pub struct MockPair {
        pub left: MockFramePort,
        pub right: MockFramePort,
    }

    impl MockPair {
        pub fn new() -> Self {
            Self {
                left: MockFramePort::new(),
                right: MockFramePort::new(),
            }
        }

        pub fn motor_pair(&self, send_timeout: Duration) -> MotorPair {
            MotorPair::new(
                Box::new(VescEndpoint::with_port(self.left.clone(), "mock-left")),
                Box::new(VescEndpoint::with_port(self.right.clone(), "mock-right")),
                send_timeout,
            )
        }

        /// Frames written to (left, right), in order.
        pub fn frames(&self) -> (Vec<Vec<u8>>, Vec<Vec<u8>>) {
            (self.left.frames(), self.right.frames())
        }

        /// The last command seen by both sides, if any.
        pub fn last_frames(&self) -> Option<(Vec<u8>, Vec<u8>)> {
            let (left, right) = self.frames();
            Some((left.last()?.clone(), right.last()?.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::MockPair;
    use super::*;
    use std::io;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_role_display() {
        assert_eq!(MotorRole::Left.to_string(), "left");
        assert_eq!(MotorRole::Right.to_string(), "right");
    }

    #[test]
    fn test_connect_with_invalid_path_returns_error() {
        let result = VescEndpoint::connect("/dev/nonexistent_motor_device_12345", 115200);

        match result {
            Err(JoydriveError::Serial(msg)) => {
                assert!(msg.contains("/dev/nonexistent_motor_device_12345"));
                assert!(msg.contains("Failed to open"));
            }
            other => panic!("Expected Serial error, got: {:?}", other),
        }
    }

    #[test]
    fn test_pair_connect_fails_without_hardware() {
        let config = LinkConfig {
            left_port: "/dev/nonexistent_left".to_string(),
            right_port: "/dev/nonexistent_right".to_string(),
            ..LinkConfig::default()
        };
        assert_err!(MotorPair::connect(&config));
    }

    #[tokio::test]
    async fn test_send_writes_one_frame_per_side() {
        let mocks = MockPair::new();
        let mut pair = mocks.motor_pair(Duration::from_millis(100));

        assert_ok!(pair.send(DriveCommand::new(0.8, -0.5)).await);

        let (left, right) = mocks.frames();
        assert_eq!(left, vec![encode_set_duty_frame(0.8)]);
        assert_eq!(right, vec![encode_set_duty_frame(-0.5)]);
    }

    #[tokio::test]
    async fn test_failed_side_does_not_block_other_side() {
        let mocks = MockPair::new();
        mocks.left.fail_with(Some(io::ErrorKind::BrokenPipe));
        let mut pair = mocks.motor_pair(Duration::from_millis(100));

        let result = pair.send(DriveCommand::new(0.3, 0.3)).await;
        assert!(matches!(result, Err(JoydriveError::Serial(_))));

        let (left, right) = mocks.frames();
        assert!(left.is_empty());
        assert_eq!(right.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_endpoint_times_out() {
        let mocks = MockPair::new();
        mocks.right.delay_by(Some(Duration::from_secs(5)));
        let mut pair = mocks.motor_pair(Duration::from_millis(100));

        let result = pair.send(DriveCommand::new(0.1, 0.1)).await;
        match result {
            Err(JoydriveError::LinkTimeout { endpoint, timeout_ms }) => {
                assert_eq!(endpoint, "mock-right");
                assert_eq!(timeout_ms, 100);
            }
            other => panic!("Expected LinkTimeout, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_close_drains_both_sides() {
        let mocks = MockPair::new();
        let mut pair = mocks.motor_pair(Duration::from_millis(100));
        assert_ok!(pair.close().await);
        assert_eq!(mocks.left.drain_count(), 1);
        assert_eq!(mocks.right.drain_count(), 1);
        assert_eq!(pair.endpoint_id(MotorRole::Left), "mock-left");
        assert_eq!(pair.endpoint_id(MotorRole::Right), "mock-right");
    }
}
