//! # Safety Interlock
//!
//! Emergency-stop state machine.
//!
//! ```text
//!            EmergencyStop
//!   Armed ------------------> Stopped --+
//!     ^                         |  ^    | EmergencyStop (no-op)
//!     |        Release          |  +----+
//!     +-------------------------+
//! ```
//!
//! The interlock starts armed. Only an explicit release event leaves the
//! stopped state; there is no timeout. While stopped, [`SafetyInterlock::apply`]
//! replaces whatever the mixer produced with [`DriveCommand::STOP`].

use tracing::{info, warn};

use super::mixer::DriveCommand;
use crate::controller::bindings::ControlEvent;

/// Emergency-stop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterlockState {
    /// Mixer output passes through.
    #[default]
    Armed,
    /// Output forced to zero until released.
    Stopped,
}

impl std::fmt::Display for InterlockState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InterlockState::Armed => write!(f, "ARMED"),
            InterlockState::Stopped => write!(f, "STOPPED"),
        }
    }
}

/// Owns the [`InterlockState`] and gates drive commands with it.
#[derive(Debug, Default)]
pub struct SafetyInterlock {
    state: InterlockState,
}

impl SafetyInterlock {
    /// Creates an armed interlock.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> InterlockState {
        self.state
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.state == InterlockState::Stopped
    }

    /// Engages the emergency stop. Returns true if the state changed.
    pub fn engage(&mut self) -> bool {
        if self.state == InterlockState::Stopped {
            return false;
        }

        self.state = InterlockState::Stopped;
        warn!("Emergency stop engaged");
        true
    }

    /// Releases the emergency stop. Returns true if the state changed.
    pub fn release(&mut self) -> bool {
        if self.state == InterlockState::Armed {
            return false;
        }

        self.state = InterlockState::Armed;
        info!("Emergency stop released");
        true
    }

    /// Applies one tick's worth of control events.
    ///
    /// A stop anywhere in `events` wins over a release in the same tick.
    /// Returns the resulting state.
    pub fn handle_events(&mut self, events: &[ControlEvent]) -> InterlockState {
        if events.contains(&ControlEvent::EmergencyStop) {
            self.engage();
        } else if events.contains(&ControlEvent::Release) {
            self.release();
        }

        self.state
    }

    /// Gates a mixer command: passes it through when armed, zero when stopped.
    #[must_use]
    pub fn apply(&self, intended: DriveCommand) -> DriveCommand {
        match self.state {
            InterlockState::Armed => intended,
            InterlockState::Stopped => DriveCommand::STOP,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_armed() {
        let interlock = SafetyInterlock::new();
        assert_eq!(interlock.state(), InterlockState::Armed);
        assert!(!interlock.is_stopped());
    }

    #[test]
    fn test_armed_passes_command_through() {
        let interlock = SafetyInterlock::new();
        let command = DriveCommand::new(0.5, -0.3);
        assert_eq!(interlock.apply(command), command);
    }

    #[test]
    fn test_engage_forces_zero() {
        let mut interlock = SafetyInterlock::new();
        assert!(interlock.engage());
        assert_eq!(interlock.apply(DriveCommand::new(0.8, 0.8)), DriveCommand::STOP);
    }

    #[test]
    fn test_engage_is_idempotent() {
        let mut once = SafetyInterlock::new();
        once.engage();

        let mut twice = SafetyInterlock::new();
        assert!(twice.engage());
        assert!(!twice.engage());

        assert_eq!(once.state(), twice.state());
        let command = DriveCommand::new(-0.4, 0.7);
        assert_eq!(once.apply(command), twice.apply(command));
        assert_eq!(twice.apply(command), DriveCommand::STOP);
    }

    #[test]
    fn test_release_rearms() {
        let mut interlock = SafetyInterlock::new();
        interlock.engage();
        assert!(interlock.release());
        assert_eq!(interlock.state(), InterlockState::Armed);

        let command = DriveCommand::new(0.2, 0.2);
        assert_eq!(interlock.apply(command), command);
    }

    #[test]
    fn test_release_while_armed_is_noop() {
        let mut interlock = SafetyInterlock::new();
        assert!(!interlock.release());
        assert_eq!(interlock.state(), InterlockState::Armed);
    }

    #[test]
    fn test_stopped_for_any_input() {
        let mut interlock = SafetyInterlock::new();
        interlock.engage();

        for &(l, r) in &[(0.8, 0.8), (-0.8, 0.8), (0.0, 0.1), (-0.8, -0.8)] {
            assert_eq!(interlock.apply(DriveCommand::new(l, r)), DriveCommand::STOP);
        }
    }

    #[test]
    fn test_handle_events_stop_wins() {
        let mut interlock = SafetyInterlock::new();
        let state = interlock.handle_events(&[ControlEvent::Release, ControlEvent::EmergencyStop]);
        assert_eq!(state, InterlockState::Stopped);

        let state = interlock.handle_events(&[ControlEvent::EmergencyStop, ControlEvent::Release]);
        assert_eq!(state, InterlockState::Stopped);
    }

    #[test]
    fn test_handle_events_release() {
        let mut interlock = SafetyInterlock::new();
        interlock.engage();
        let state = interlock.handle_events(&[ControlEvent::Release]);
        assert_eq!(state, InterlockState::Armed);
    }

    #[test]
    fn test_handle_events_ignores_quit() {
        let mut interlock = SafetyInterlock::new();
        interlock.engage();
        let state = interlock.handle_events(&[ControlEvent::Quit]);
        assert_eq!(state, InterlockState::Stopped);
    }

    #[test]
    fn test_display() {
        assert_eq!(InterlockState::Armed.to_string(), "ARMED");
        assert_eq!(InterlockState::Stopped.to_string(), "STOPPED");
    }
}
