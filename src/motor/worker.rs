//! # Link Worker
//!
//! Background task for queued delivery. Runs on its own interval, drains the
//! command channel each tick, and sends only the newest command to the motor
//! pair. The control loop never waits on it.
//!
//! Real send durations and send failures are measured here, in the worker's
//! own [`LatencyTelemetry`], which emits a report every report interval just
//! like the control loop does.
//!
//! The worker owns the [`MotorPair`] while it runs and hands it back when it
//! stops, so the final zero command is always sent from the shutdown path.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

use super::endpoint::MotorPair;
use super::health::LinkHealth;
use super::queue::CommandReceiver;
use crate::config::{LinkConfig, TelemetryConfig};
use crate::telemetry::latency::StageSummary;
use crate::telemetry::{LatencyTelemetry, LinkCounters, SendThresholds};

/// What the worker measured over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WorkerSummary {
    pub counters: LinkCounters,
    /// Rolling send window at the time the worker stopped.
    pub send: StageSummary,
    /// Longest send seen, not limited to the rolling window.
    pub max_send: Duration,
    /// Commands replaced by a newer one before they were sent.
    pub superseded: u64,
    /// Periodic reports emitted.
    pub reports: u64,
    /// Counters carried by the most recent periodic report.
    pub last_reported: Option<LinkCounters>,
}

impl WorkerSummary {
    pub fn log(&self) {
        info!(
            sends = self.counters.sends,
            failures = self.counters.send_failures,
            slow = self.counters.slow_sends,
            timeouts = self.counters.timeouts,
            superseded = self.superseded,
            reports = self.reports,
            send_avg_ms = self.send.mean_ms,
            max_send_ms = self.max_send.as_secs_f64() * 1000.0,
            "Link worker stopped"
        );
    }
}

/// Worker settings copied out of the configuration.
#[derive(Debug, Clone, Copy)]
pub struct WorkerSettings {
    pub period: Duration,
    pub thresholds: SendThresholds,
    pub history_capacity: usize,
    pub report_interval: Duration,
    pub failure_warn_threshold: u32,
}

impl WorkerSettings {
    pub fn from_config(link: &LinkConfig, telemetry: &TelemetryConfig) -> Self {
        Self {
            period: link.worker_period(),
            thresholds: SendThresholds::from_config(telemetry),
            history_capacity: telemetry.history_capacity,
            report_interval: Duration::from_millis(telemetry.report_interval_ms),
            failure_warn_threshold: link.failure_warn_threshold,
        }
    }
}

/// Handle to a running worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    join: JoinHandle<(MotorPair, WorkerSummary)>,
}

/// Spawn the worker on the current runtime.
pub fn spawn_worker(
    pair: MotorPair,
    commands: CommandReceiver,
    settings: WorkerSettings,
    degraded: Arc<AtomicBool>,
) -> WorkerHandle {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let health = LinkHealth::new(settings.failure_warn_threshold, degraded);
    let join = tokio::spawn(run_worker(pair, commands, settings, health, shutdown_rx));

    WorkerHandle {
        shutdown: Some(shutdown_tx),
        join,
    }
}

impl WorkerHandle {
    /// Signal the worker and wait up to `timeout` for it to hand back the pair.
    ///
    /// Returns `None` if the worker panicked or did not stop in time; in the
    /// latter case the task is aborted.
    pub async fn stop(mut self, timeout: Duration) -> Option<(MotorPair, WorkerSummary)> {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }

        match tokio::time::timeout(timeout, &mut self.join).await {
            Ok(Ok(result)) => Some(result),
            Ok(Err(e)) => {
                error!("Link worker failed: {}", e);
                None
            }
            Err(_) => {
                error!("Link worker did not stop within {} ms", timeout.as_millis());
                self.join.abort();
                None
            }
        }
    }
}

async fn run_worker(
    mut pair: MotorPair,
    mut commands: CommandReceiver,
    settings: WorkerSettings,
    mut health: LinkHealth,
    mut shutdown: oneshot::Receiver<()>,
) -> (MotorPair, WorkerSummary) {
    let mut ticker = interval(settings.period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut telemetry = LatencyTelemetry::new(
        settings.history_capacity,
        settings.thresholds,
        settings.report_interval,
    );
    let mut summary = WorkerSummary::default();

    debug!("Link worker started ({:?} period)", settings.period);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                let drain = commands.drain_latest();
                summary.superseded += drain.superseded;

                if let Some(command) = drain.latest {
                    let start = Instant::now();
                    let result = pair.send(command).await;
                    let elapsed = start.elapsed();

                    summary.max_send = summary.max_send.max(elapsed);
                    health.observe_send(&result, elapsed, &mut telemetry);
                }

                if let Some(report) = telemetry.poll_report(Instant::now()) {
                    report.log("link worker");
                    summary.reports += 1;
                    summary.last_reported = Some(report.counters);
                }

                if drain.closed {
                    debug!("Command channel closed");
                    break;
                }
            }
        }
    }

    summary.counters = telemetry.counters();
    summary.send = telemetry.summary().command_send;
    (pair, summary)
}
