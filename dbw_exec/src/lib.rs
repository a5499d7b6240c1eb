//! # Drive-by-wire library.
//!
//! This library allows other crates in the workspace to access items defined inside the
//! drive-by-wire crate.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Executable parameters
pub mod params;

/// Cycle script replay - supplies recorded inputs to the control loop
pub mod replay;

/// Twist control module - converts target velocity and cross-track error into throttle, brake
/// and steering demands
pub mod twist_ctrl;
