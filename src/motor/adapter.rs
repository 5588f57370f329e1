//! # Motor Link Adapter
//!
//! Single entry point the control loop uses to deliver drive commands.
//!
//! ## Delivery
//!
//! | Mode | Behavior |
//! |------|----------|
//! | Offline | Link never connected; every submit is skipped |
//! | Direct | Command is sent inline; send time feeds the command-send stage |
//! | Queued | Command is offered to the worker channel; offer time feeds the enqueue stage |
//!
//! In queued mode the real send durations, send failures and timeouts are
//! measured by the worker, which logs its own periodic reports.
//!
//! Link errors never leave this module. They are logged, counted in
//! [`LatencyTelemetry`], and tracked for consecutive-failure escalation.
//!
//! ## Shutdown
//!
//! [`MotorLinkAdapter::shutdown`] stops the worker (bounded join), sends a
//! final zero command to both sides, waits the grace period, and closes the
//! endpoints. Every step is bounded by a timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{error, info, warn};

use super::endpoint::MotorPair;
use super::health::LinkHealth;
use super::queue::{command_channel, CommandSender, Offer};
use super::worker::{spawn_worker, WorkerHandle, WorkerSettings, WorkerSummary};
use crate::config::{DeliveryMode, LinkConfig, TelemetryConfig};
use crate::drive::mixer::DriveCommand;
use crate::telemetry::{LatencyTelemetry, Stage};

/// Connection state decided once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connected,
    Disconnected,
}

impl std::fmt::Display for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkState::Connected => write!(f, "CONNECTED"),
            LinkState::Disconnected => write!(f, "DISCONNECTED"),
        }
    }
}

/// What happened to one submitted command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Link is disconnected; nothing was attempted.
    Skipped,
    Sent,
    Failed,
    Queued,
    /// Queue was full; the command was discarded.
    Dropped,
}

enum Delivery {
    Offline,
    Direct {
        pair: MotorPair,
        health: LinkHealth,
    },
    Queued {
        sender: CommandSender,
        worker: WorkerHandle,
    },
}

pub struct MotorLinkAdapter {
    delivery: Delivery,
    degraded: Arc<AtomicBool>,
    shutdown_grace: Duration,
    join_timeout: Duration,
}

impl std::fmt::Debug for MotorLinkAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mode = match self.delivery {
            Delivery::Offline => "offline",
            Delivery::Direct { .. } => "direct",
            Delivery::Queued { .. } => "queued",
        };
        f.debug_struct("MotorLinkAdapter")
            .field("mode", &mode)
            .field("degraded", &self.is_degraded())
            .finish_non_exhaustive()
    }
}

impl MotorLinkAdapter {
    /// Adapter for visualization-only sessions.
    pub fn disconnected() -> Self {
        Self {
            delivery: Delivery::Offline,
            degraded: Arc::new(AtomicBool::new(false)),
            shutdown_grace: Duration::ZERO,
            join_timeout: Duration::ZERO,
        }
    }

    /// Wrap a connected pair using the configured delivery mode.
    ///
    /// Queued delivery spawns the worker, so this must run inside a Tokio runtime.
    pub fn start(pair: MotorPair, config: &LinkConfig, telemetry: &TelemetryConfig) -> Self {
        let degraded = Arc::new(AtomicBool::new(false));

        let delivery = match config.delivery {
            DeliveryMode::Direct => Delivery::Direct {
                pair,
                health: LinkHealth::new(config.failure_warn_threshold, degraded.clone()),
            },
            DeliveryMode::Queued => {
                let (sender, receiver) = command_channel(config.queue_capacity);
                let settings = WorkerSettings::from_config(config, telemetry);
                let worker = spawn_worker(pair, receiver, settings, degraded.clone());
                Delivery::Queued { sender, worker }
            }
        };

        info!("Motor link connected ({:?} delivery)", config.delivery);

        Self {
            delivery,
            degraded,
            shutdown_grace: config.shutdown_grace(),
            join_timeout: config.join_timeout(),
        }
    }

    /// Open both motor controllers, falling back to visualization-only mode
    /// when the link is disabled or cannot be opened.
    pub fn connect(config: &LinkConfig, telemetry: &TelemetryConfig) -> Self {
        if !config.enabled {
            info!("Motor link disabled, running visualization-only");
            return Self::disconnected();
        }

        match MotorPair::connect(config) {
            Ok(pair) => Self::start(pair, config, telemetry),
            Err(e) => {
                warn!("Motor link unavailable, running visualization-only: {}", e);
                Self::disconnected()
            }
        }
    }

    pub fn state(&self) -> LinkState {
        match self.delivery {
            Delivery::Offline => LinkState::Disconnected,
            Delivery::Direct { .. } | Delivery::Queued { .. } => LinkState::Connected,
        }
    }

    /// Set while consecutive send failures are at or above the warning threshold.
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    /// Deliver one command and record its timing.
    pub async fn submit(
        &mut self,
        command: DriveCommand,
        telemetry: &mut LatencyTelemetry,
    ) -> SubmitOutcome {
        match &mut self.delivery {
            Delivery::Offline => SubmitOutcome::Skipped,
            Delivery::Direct { pair, health } => {
                let start = Instant::now();
                let result = pair.send(command).await;
                let elapsed = start.elapsed();

                health.observe_send(&result, elapsed, telemetry);
                if result.is_ok() {
                    SubmitOutcome::Sent
                } else {
                    SubmitOutcome::Failed
                }
            }
            Delivery::Queued { sender, .. } => {
                let start = Instant::now();
                let offer = sender.offer(command);
                telemetry.record(Stage::Enqueue, start.elapsed());

                match offer {
                    Offer::Accepted => SubmitOutcome::Queued,
                    Offer::Dropped => {
                        telemetry.record_dropped();
                        warn!("Command queue full, dropped {:?}", command);
                        SubmitOutcome::Dropped
                    }
                    Offer::Closed => {
                        telemetry.record_send_failure(false);
                        error!("Link worker is gone, command not delivered");
                        SubmitOutcome::Failed
                    }
                }
            }
        }
    }

    /// Stop delivery and leave both motors at zero duty.
    ///
    /// Returns the worker's counters when queued delivery was in use.
    pub async fn shutdown(self) -> Option<WorkerSummary> {
        let grace = self.shutdown_grace;

        match self.delivery {
            Delivery::Offline => None,
            Delivery::Direct { pair, .. } => {
                finish(pair, grace).await;
                None
            }
            Delivery::Queued { sender, worker } => {
                drop(sender);
                match worker.stop(self.join_timeout).await {
                    Some((pair, summary)) => {
                        summary.log();
                        finish(pair, grace).await;
                        Some(summary)
                    }
                    None => {
                        error!("Final zero command not sent: motor pair was lost with the worker");
                        None
                    }
                }
            }
        }
    }
}

async fn finish(mut pair: MotorPair, grace: Duration) {
    match pair.send(DriveCommand::STOP).await {
        Ok(()) => info!("Sent final zero command"),
        Err(e) => warn!("Final zero command failed: {}", e),
    }

    tokio::time::sleep(grace).await;

    if let Err(e) = pair.close().await {
        warn!("Failed to close motor link: {}", e);
    }
}
