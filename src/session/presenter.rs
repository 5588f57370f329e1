//! Consumers of tick snapshots.

use tracing::debug;

use super::snapshot::Snapshot;
use crate::controller::bindings::ControlEvent;

/// Receives a snapshot every tick and may relay operator events back.
pub trait Presenter {
    fn present(&mut self, snapshot: &Snapshot);

    /// Events raised since the last tick (keyboard stop, window close, ...).
    fn take_events(&mut self) -> Vec<ControlEvent> {
        Vec::new()
    }
}

/// Writes every snapshot to the debug log.
#[derive(Debug, Default)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn present(&mut self, snapshot: &Snapshot) {
        debug!(
            x = snapshot.stick.x,
            y = snapshot.stick.y,
            magnitude = snapshot.stick.magnitude,
            angle_deg = snapshot.stick.angle.to_degrees(),
            left = snapshot.applied.left,
            right = snapshot.applied.right,
            interlock = %snapshot.interlock,
            link = %snapshot.link,
            degraded = snapshot.link_degraded,
            send_avg_ms = snapshot.latency.command_send.mean_ms,
            loop_avg_ms = snapshot.latency.loop_total.mean_ms,
            "tick"
        );
    }
}
