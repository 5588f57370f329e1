//! # Drive Module
//!
//! Differential drive command generation.
//!
//! This module handles:
//! - Mixing the stick into left/right duty cycles
//! - Clamping to the configured speed ceiling
//! - The emergency-stop interlock that overrides the mixer

pub mod interlock;
pub mod mixer;

pub use interlock::{InterlockState, SafetyInterlock};
pub use mixer::{DriveCommand, DriveMixer};
