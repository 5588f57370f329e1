//! # Joydrive Library
//!
//! Drive a differential-drive robot from a gamepad stick.
//!
//! This library provides the control pipeline that turns joystick input into
//! left/right duty cycles, gates them through an emergency-stop interlock, and
//! delivers them to two serial motor controllers while tracking latency.

pub mod config;
pub mod controller;
pub mod drive;
pub mod error;
pub mod motor;
pub mod session;
pub mod telemetry;
