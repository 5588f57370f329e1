//! # Control Session
//!
//! Owns every stage of the control pipeline and runs it at a fixed rate.
//!
//! ## Tick
//!
//! 1. Poll the input device and sample the stick
//! 2. Collect button events plus events relayed by the presenter
//! 3. Update the interlock (stop takes effect in this same tick)
//! 4. Mix, gate through the interlock, submit to the motor link
//! 5. Record loop latency and emit a report when one is due
//!
//! ## Termination
//!
//! A quit event, loss of the input device, or the interrupt future ends the
//! loop. All three go through [`Session::shutdown`], which stops the link
//! worker, sends the final zero command, and logs a [`SessionSummary`].

pub mod presenter;
pub mod snapshot;

use std::future::Future;
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{error, info};

use crate::config::Config;
use crate::controller::{ButtonBindings, ControlEvent, InputDevice, InputSampler, StickSample};
use crate::drive::{DriveMixer, InterlockState, SafetyInterlock};
use crate::motor::{MotorLinkAdapter, WorkerSummary};
use crate::telemetry::{LatencySummary, LatencyTelemetry, LinkCounters, Stage};

pub use presenter::{LogPresenter, Presenter};
pub use snapshot::Snapshot;

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    Quit,
    Interrupted,
    DeviceLost,
}

impl std::fmt::Display for ExitReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExitReason::Quit => write!(f, "quit requested"),
            ExitReason::Interrupted => write!(f, "interrupted"),
            ExitReason::DeviceLost => write!(f, "input device lost"),
        }
    }
}

/// Result of a single control tick.
#[derive(Debug, Clone, Copy)]
pub struct Tick {
    pub snapshot: Snapshot,
    pub exit: Option<ExitReason>,
}

/// Totals logged when a session ends.
#[derive(Debug, Clone, Copy)]
pub struct SessionSummary {
    pub reason: ExitReason,
    pub final_interlock: InterlockState,
    pub counters: LinkCounters,
    pub latency: LatencySummary,
    pub worker: Option<WorkerSummary>,
}

impl SessionSummary {
    pub fn log(&self) {
        info!(
            reason = %self.reason,
            interlock = %self.final_interlock,
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
            "Session ended"
        );
    }
}

pub struct Session<D: InputDevice> {
    device: D,
    sampler: InputSampler,
    bindings: ButtonBindings,
    mixer: DriveMixer,
    interlock: SafetyInterlock,
    link: MotorLinkAdapter,
    telemetry: LatencyTelemetry,
    tick_period: Duration,
    events: Vec<ControlEvent>,
}

impl<D: InputDevice> Session<D> {
    pub fn new(device: D, config: &Config, link: MotorLinkAdapter) -> Self {
        Self {
            device,
            sampler: InputSampler::from_config(&config.input),
            bindings: ButtonBindings::from_config(&config.input),
            mixer: DriveMixer::from_config(&config.drive),
            interlock: SafetyInterlock::new(),
            link,
            telemetry: LatencyTelemetry::from_config(&config.telemetry),
            tick_period: config.control.tick_period(),
            events: Vec::with_capacity(4),
        }
    }

    pub fn interlock_state(&self) -> InterlockState {
        self.interlock.state()
    }

    pub fn telemetry(&self) -> &LatencyTelemetry {
        &self.telemetry
    }

    /// Run one pass of the pipeline.
    ///
    /// `relayed` carries events from outside the input device, such as a
    /// keyboard stop from the presenter.
    pub async fn tick(&mut self, relayed: &[ControlEvent]) -> Tick {
        let tick_start = Instant::now();
        self.events.clear();

        let read_start = Instant::now();
        let device_ok = match self.device.poll() {
            Ok(()) => true,
            Err(e) => {
                error!("Input device lost: {}", e);
                false
            }
        };
        let stick = if device_ok {
            self.bindings.collect(&self.device, &mut self.events);
            self.sampler.read(&self.device)
        } else {
            StickSample::default()
        };
        self.telemetry.record(Stage::SampleRead, read_start.elapsed());

        self.events.extend_from_slice(relayed);
        self.interlock.handle_events(&self.events);
        if !device_ok {
            self.interlock.engage();
        }

        let intended = self.mixer.mix(&stick);
        let applied = self.interlock.apply(intended);
        self.link.submit(applied, &mut self.telemetry).await;

        self.telemetry.record_tick(tick_start.elapsed());
        if let Some(report) = self.telemetry.poll_report(Instant::now()) {
            report.log("control");
        }

        let exit = if !device_ok {
            Some(ExitReason::DeviceLost)
        } else if self.events.contains(&ControlEvent::Quit) {
            Some(ExitReason::Quit)
        } else {
            None
        };

        Tick {
            snapshot: Snapshot {
                stick,
                intended,
                applied,
                interlock: self.interlock.state(),
                link: self.link.state(),
                link_degraded: self.link.is_degraded(),
                latency: self.telemetry.summary(),
            },
            exit,
        }
    }

    /// Tick at the configured rate until quit, device loss, or `interrupt`
    /// completes, then shut down.
    pub async fn run<P, F>(mut self, presenter: &mut P, interrupt: F) -> SessionSummary
    where
        P: Presenter + ?Sized,
        F: Future<Output = ()>,
    {
        let mut ticker = interval(self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(interrupt);

        info!(
            "Control loop running at {:.0} Hz",
            1.0 / self.tick_period.as_secs_f64()
        );

        let reason = loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let relayed = presenter.take_events();
                    let tick = self.tick(&relayed).await;
                    presenter.present(&tick.snapshot);

                    if let Some(reason) = tick.exit {
                        break reason;
                    }
                }
                _ = &mut interrupt => {
                    info!("Received interrupt, shutting down...");
                    break ExitReason::Interrupted;
                }
            }
        };

        self.shutdown(reason).await
    }

    /// Engage the interlock, stop the motor link, and log the session totals.
    pub async fn shutdown(mut self, reason: ExitReason) -> SessionSummary {
        info!("Shutting down: {}", reason);
        self.interlock.engage();

        let worker = self.link.shutdown().await;
        let summary = SessionSummary {
            reason,
            final_interlock: self.interlock.state(),
            counters: self.telemetry.counters(),
            latency: self.telemetry.summary(),
            worker,
        };
        summary.log();
        summary
    }
}
