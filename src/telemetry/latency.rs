//! # Latency Telemetry
//!
//! Per-stage rolling latency windows, send classification, and periodic
//! reports.
//!
//! ## Stages
//!
//! | Stage | Measured span |
//! |-------|---------------|
//! | Sample read | Polling the input device and sampling the stick |
//! | Command send | Delivering one command to both motor controllers |
//! | Enqueue | Handing one command to the link worker (queued delivery) |
//! | Loop total | One full control tick |
//!
//! In queued delivery the control loop only fills the enqueue window; the
//! link worker keeps its own [`LatencyTelemetry`] for real send durations and
//! emits its own periodic reports.
//!
//! ## Send Thresholds
//!
//! A send at or above the slow threshold counts as slow and logs a warning.
//! At or above the critical threshold it also counts as a timeout and logs
//! an error. Failed sends that hit the link timeout count as timeouts too.
//!
//! ## Reports
//!
//! [`LatencyTelemetry::poll_report`] returns a [`LatencyReport`] once per
//! report interval. Producing a report does not reset the windows or the
//! counters: windows stay rolling, counters stay cumulative.

use serde::Serialize;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn};

use super::window::LatencyWindow;
use crate::config::TelemetryConfig;

/// Timed stage of the control loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SampleRead,
    CommandSend,
    Enqueue,
    LoopTotal,
}

/// How a send duration compares with the configured thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendClass {
    Normal,
    Slow,
    Critical,
}

/// Slow / critical limits for a single send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendThresholds {
    pub slow: Duration,
    pub critical: Duration,
}

impl Default for SendThresholds {
    fn default() -> Self {
        Self {
            slow: Duration::from_millis(50),
            critical: Duration::from_millis(100),
        }
    }
}

impl SendThresholds {
    #[must_use]
    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self {
            slow: Duration::from_millis(config.slow_send_ms),
            critical: Duration::from_millis(config.critical_send_ms),
        }
    }

    #[must_use]
    pub fn classify(&self, duration: Duration) -> SendClass {
        if duration >= self.critical {
            SendClass::Critical
        } else if duration >= self.slow {
            SendClass::Slow
        } else {
            SendClass::Normal
        }
    }
}

/// Mean and max of one stage window, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StageSummary {
    pub mean_ms: f64,
    pub max_ms: f64,
    pub samples: usize,
}

impl StageSummary {
    fn from_window(window: &LatencyWindow) -> Self {
        Self {
            mean_ms: as_millis(window.mean()),
            max_ms: as_millis(window.max()),
            samples: window.len(),
        }
    }
}

/// Rolling statistics for every stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LatencySummary {
    pub sample_read: StageSummary,
    pub command_send: StageSummary,
    pub enqueue: StageSummary,
    pub loop_total: StageSummary,
}

/// Cumulative session counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkCounters {
    pub ticks: u64,
    pub sends: u64,
    pub send_failures: u64,
    pub slow_sends: u64,
    pub timeouts: u64,
    pub dropped_commands: u64,
}

/// Periodic telemetry report.
#[derive(Debug, Clone, Serialize)]
pub struct LatencyReport {
    /// RFC 3339 wall-clock time the report was produced.
    pub timestamp: String,
    pub counters: LinkCounters,
    pub latency: LatencySummary,
}

impl LatencyReport {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
    }

    /// Emit the report as an info-level event tagged with its `source`.
    pub fn log(&self, source: &str) {
        info!(
            source,
            ticks = self.counters.ticks,
            sends = self.counters.sends,
            failures = self.counters.send_failures,
            slow = self.counters.slow_sends,
            timeouts = self.counters.timeouts,
            dropped = self.counters.dropped_commands,
            send_avg_ms = self.latency.command_send.mean_ms,
            send_max_ms = self.latency.command_send.max_ms,
            enqueue_avg_ms = self.latency.enqueue.mean_ms,
            loop_avg_ms = self.latency.loop_total.mean_ms,
            loop_max_ms = self.latency.loop_total.max_ms,
            "Latency report: {}",
            self.to_json()
        );
    }
}

/// Owns the stage windows and counters for one session.
#[derive(Debug)]
pub struct LatencyTelemetry {
    sample_read: LatencyWindow,
    command_send: LatencyWindow,
    enqueue: LatencyWindow,
    loop_total: LatencyWindow,
    thresholds: SendThresholds,
    counters: LinkCounters,
    report_interval: Duration,
    last_report: Instant,
}

impl LatencyTelemetry {
    #[must_use]
    pub fn new(capacity: usize, thresholds: SendThresholds, report_interval: Duration) -> Self {
        Self {
            sample_read: LatencyWindow::new(capacity),
            command_send: LatencyWindow::new(capacity),
            enqueue: LatencyWindow::new(capacity),
            loop_total: LatencyWindow::new(capacity),
            thresholds,
            counters: LinkCounters::default(),
            report_interval,
            last_report: Instant::now(),
        }
    }

    #[must_use]
    pub fn from_config(config: &TelemetryConfig) -> Self {
        Self::new(
            config.history_capacity,
            SendThresholds::from_config(config),
            Duration::from_millis(config.report_interval_ms),
        )
    }

    #[must_use]
    pub fn thresholds(&self) -> SendThresholds {
        self.thresholds
    }

    #[must_use]
    pub fn counters(&self) -> LinkCounters {
        self.counters
    }

    #[must_use]
    pub fn window(&self, stage: Stage) -> &LatencyWindow {
        match stage {
            Stage::SampleRead => &self.sample_read,
            Stage::CommandSend => &self.command_send,
            Stage::Enqueue => &self.enqueue,
            Stage::LoopTotal => &self.loop_total,
        }
    }

    /// Record a stage duration without classification.
    pub fn record(&mut self, stage: Stage, duration: Duration) {
        match stage {
            Stage::SampleRead => self.sample_read.push(duration),
            Stage::CommandSend => self.command_send.push(duration),
            Stage::Enqueue => self.enqueue.push(duration),
            Stage::LoopTotal => self.loop_total.push(duration),
        }
    }

    /// Record a completed tick and its total duration.
    pub fn record_tick(&mut self, duration: Duration) {
        self.counters.ticks += 1;
        self.loop_total.push(duration);
    }

    /// Record a successful send and classify it against the thresholds.
    pub fn record_send(&mut self, duration: Duration) -> SendClass {
        self.counters.sends += 1;
        self.command_send.push(duration);

        let class = self.thresholds.classify(duration);
        match class {
            SendClass::Normal => {}
            SendClass::Slow => {
                self.counters.slow_sends += 1;
                warn!("Slow motor command: {:.1} ms", as_millis(duration));
            }
            SendClass::Critical => {
                self.counters.slow_sends += 1;
                self.counters.timeouts += 1;
                error!("Critical motor command latency: {:.1} ms", as_millis(duration));
            }
        }
        class
    }

    /// Record a failed send. `timed_out` marks failures caused by the link timeout.
    pub fn record_send_failure(&mut self, timed_out: bool) {
        self.counters.send_failures += 1;
        if timed_out {
            self.counters.timeouts += 1;
        }
    }

    /// Record a command the delivery queue had no room for.
    pub fn record_dropped(&mut self) {
        self.counters.dropped_commands += 1;
    }

    #[must_use]
    pub fn summary(&self) -> LatencySummary {
        LatencySummary {
            sample_read: StageSummary::from_window(&self.sample_read),
            command_send: StageSummary::from_window(&self.command_send),
            enqueue: StageSummary::from_window(&self.enqueue),
            loop_total: StageSummary::from_window(&self.loop_total),
        }
    }

    /// Build a report now, regardless of the interval.
    #[must_use]
    pub fn report(&self) -> LatencyReport {
        LatencyReport {
            timestamp: chrono::Utc::now().to_rfc3339(),
            counters: self.counters,
            latency: self.summary(),
        }
    }

    /// Returns a report if a full interval has passed since the last one.
    pub fn poll_report(&mut self, now: Instant) -> Option<LatencyReport> {
        if now.saturating_duration_since(self.last_report) < self.report_interval {
            return None;
        }

        self.last_report = now;
        Some(self.report())
    }
}

fn as_millis(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
