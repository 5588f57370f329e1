//! Per-tick view of the control pipeline.

use crate::controller::sampler::StickSample;
use crate::drive::interlock::InterlockState;
use crate::drive::mixer::DriveCommand;
use crate::motor::adapter::LinkState;
use crate::telemetry::LatencySummary;

/// Read-only state handed to the presenter after every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapshot {
    pub stick: StickSample,
    /// Mixer output before the interlock.
    pub intended: DriveCommand,
    /// Command handed to the motor link.
    pub applied: DriveCommand,
    pub interlock: InterlockState,
    pub link: LinkState,
    pub link_degraded: bool,
    pub latency: LatencySummary,
}

impl Snapshot {
    /// True when the applied command differs from the mixer output, which
    /// only happens while the interlock holds a non-zero command at zero.
    pub fn is_overridden(&self) -> bool {
        self.intended != self.applied
    }
}
