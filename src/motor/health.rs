//! Consecutive send-failure tracking.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::error::{JoydriveError, Result};
use crate::telemetry::{LatencyTelemetry, Stage};

/// Counts consecutive failed sends and raises the shared degraded flag once
/// the count reaches the warning threshold.
#[derive(Debug)]
pub struct LinkHealth {
    consecutive_failures: u32,
    threshold: u32,
    degraded: Arc<AtomicBool>,
}

impl LinkHealth {
    pub fn new(threshold: u32, degraded: Arc<AtomicBool>) -> Self {
        Self {
            consecutive_failures: 0,
            threshold: threshold.max(1),
            degraded,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    pub fn record_success(&mut self) {
        if self.degraded.swap(false, Ordering::Relaxed) {
            info!(
                "Motor link recovered after {} failed sends",
                self.consecutive_failures
            );
        }
        self.consecutive_failures = 0;
    }

    /// Record a finished send of both sides in `telemetry` and in the failure run.
    ///
    /// Successful sends are classified against the send thresholds. Failures
    /// land in the send window and the failure counters, with link timeouts
    /// also counted as timeouts.
    pub fn observe_send(
        &mut self,
        result: &Result<()>,
        elapsed: Duration,
        telemetry: &mut LatencyTelemetry,
    ) {
        match result {
            Ok(()) => {
                telemetry.record_send(elapsed);
                self.record_success();
            }
            Err(e) => {
                let timed_out = matches!(e, JoydriveError::LinkTimeout { .. });
                telemetry.record(Stage::CommandSend, elapsed);
                telemetry.record_send_failure(timed_out);
                warn!("Motor command failed: {}", e);
                self.record_failure();
            }
        }
    }

    /// Returns `true` on the failure that crosses the threshold.
    pub fn record_failure(&mut self) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if self.consecutive_failures != self.threshold {
            return false;
        }

        self.degraded.store(true, Ordering::Relaxed);
        warn!(
            "Motor link degraded: {} consecutive send failures",
            self.consecutive_failures
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TelemetryConfig;

    fn health(threshold: u32) -> LinkHealth {
        LinkHealth::new(threshold, Arc::new(AtomicBool::new(false)))
    }

    #[test]
    fn test_escalates_once_at_threshold() {
        let mut health = health(3);
        assert!(!health.record_failure());
        assert!(!health.record_failure());
        assert!(!health.is_degraded());

        assert!(health.record_failure());
        assert!(health.is_degraded());

        assert!(!health.record_failure());
        assert!(health.is_degraded());
        assert_eq!(health.consecutive_failures(), 4);
    }

    #[test]
    fn test_success_clears_degraded() {
        let mut health = health(2);
        health.record_failure();
        health.record_failure();
        assert!(health.is_degraded());

        health.record_success();
        assert!(!health.is_degraded());
        assert_eq!(health.consecutive_failures(), 0);
    }

    #[test]
    fn test_interrupted_run_does_not_escalate() {
        let mut health = health(3);
        health.record_failure();
        health.record_failure();
        health.record_success();
        health.record_failure();
        assert!(!health.is_degraded());
    }

    #[test]
    fn test_observe_send_feeds_telemetry() {
        let mut health = health(2);
        let mut telemetry = LatencyTelemetry::from_config(&TelemetryConfig::default());

        health.observe_send(&Ok(()), Duration::from_millis(120), &mut telemetry);
        health.observe_send(
            &Err(JoydriveError::LinkTimeout {
                endpoint: "left".to_string(),
                timeout_ms: 100,
            }),
            Duration::from_millis(100),
            &mut telemetry,
        );
        health.observe_send(
            &Err(JoydriveError::Serial("broken pipe".to_string())),
            Duration::from_millis(1),
            &mut telemetry,
        );

        let counters = telemetry.counters();
        assert_eq!(counters.sends, 1);
        assert_eq!(counters.slow_sends, 1);
        assert_eq!(counters.send_failures, 2);
        assert_eq!(counters.timeouts, 2);
        assert_eq!(telemetry.window(Stage::CommandSend).len(), 3);
        assert!(health.is_degraded());
    }

    #[test]
    fn test_flag_is_shared() {
        let flag = Arc::new(AtomicBool::new(false));
        let mut health = LinkHealth::new(1, flag.clone());
        health.record_failure();
        assert!(flag.load(Ordering::Relaxed));
    }
}
