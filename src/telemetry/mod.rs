//! # Telemetry Module
//!
//! Control loop latency instrumentation.
//!
//! This module handles:
//! - Rolling windows of stage durations
//! - Slow / critical send classification and counters
//! - Periodic structured reports

pub mod latency;
pub mod window;

pub use latency::{
    LatencyReport, LatencySummary, LatencyTelemetry, LinkCounters, SendClass, SendThresholds, Stage,
};
pub use window::LatencyWindow;
