//! # Motor Link Module
//!
//! Delivers drive commands to the left and right motor controllers.
//!
//! This module handles:
//! - VESC packet framing and CRC16 checksums
//! - Serial motor endpoints with timeout-bounded writes
//! - Direct and queued delivery, failure tracking, and shutdown

pub mod adapter;
pub mod crc;
pub mod endpoint;
pub mod health;
pub mod port;
pub mod protocol;
pub mod queue;
pub mod worker;

pub use adapter::{LinkState, MotorLinkAdapter, SubmitOutcome};
pub use endpoint::{MotorEndpoint, MotorPair, MotorRole, VescEndpoint};
pub use worker::WorkerSummary;
