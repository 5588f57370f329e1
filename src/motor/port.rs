//! Serial transport for motor controller frames.
//!
//! [`FramePort`] is the seam between endpoints and the OS serial device so the
//! link can be exercised against in-memory ports.

use async_trait::async_trait;
use std::io;
use tokio::io::AsyncWriteExt;
use tokio_serial::{SerialPortBuilderExt, SerialStream};

use crate::error::{JoydriveError, Result};

/// Byte sink that accepts whole motor frames.
#[async_trait]
pub trait FramePort: Send {
    /// Write one complete frame and push it to the device.
    async fn send_frame(&mut self, frame: &[u8]) -> io::Result<()>;

    /// Wait for buffered output to drain.
    async fn drain(&mut self) -> io::Result<()>;
}

/// A motor controller's serial device, opened 8N1 without flow control.
pub struct SerialFramePort {
    stream: SerialStream,
}

impl SerialFramePort {
    /// # Errors
    ///
    /// Returns `Serial` if the device cannot be opened
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let stream = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| JoydriveError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(Self { stream })
    }
}

#[async_trait]
impl FramePort for SerialFramePort {
    async fn send_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        self.stream.write_all(frame).await?;
        self.stream.flush().await
    }

    async fn drain(&mut self) -> io::Result<()> {
        self.stream.flush().await
    }
}
