//! # Twist control module
//!
//! Twist control is the last stage of the drive-by-wire stack. Each cycle it
//! takes the target velocity from the waypoint follower, the measured velocity
//! of the vehicle and the cross-track error (CTE) to the planned path, and
//! produces throttle, brake and steering demands for the actuators.
//!
//! The longitudinal demands come from a torque estimate. The acceleration
//! required to reach the target velocity over one nominal cycle is limited to
//! the vehicle's capabilities and converted into a wheel torque, which is then
//! either normalised into a throttle demand or issued directly as a brake
//! torque. Small accelerations inside the brake deadband produce no demand.
//!
//! The lateral demand comes from a PID controller on the CTE, rescaled to the
//! vehicle's steer ratio, attenuated with speed and smoothed by a low-pass
//! filter.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod channel;
mod controller;
mod lowpass;
mod params;
mod pid;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use channel::*;
pub use controller::*;
pub use lowpass::*;
pub use params::*;
pub use pid::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Nominal period of one control cycle, used for the longitudinal
/// acceleration estimate regardless of the measured cycle time.
///
/// Units: seconds
pub const NOMINAL_CYCLE_PERIOD_S: f64 = 0.5;

/// Acceleration corresponding to full (1.0) throttle.
///
/// Units: meters/second^2
pub const FULL_THROTTLE_ACCEL_MSS: f64 = 1.5;

/// Steer ratio of the reference vehicle the steering gains were tuned on.
pub const REF_STEER_RATIO: f64 = 14.8;

/// Conversion factor from meters/second to miles/hour.
pub const MS_TO_MPH: f64 = 3.6 / 1.6093;

/// CTE magnitude removed before the error reaches the steering controller.
///
/// Units: meters
pub const CTE_DEADBAND_M: f64 = 0.1;

/// Above this CTE magnitude the speed factor decays.
pub const SPEED_FACTOR_DECAY_CTE_M: f64 = 0.75;

/// Below this CTE magnitude the speed factor recovers.
pub const SPEED_FACTOR_RECOVER_CTE_M: f64 = 0.4;

/// Multiplier applied to the speed factor on each decaying cycle.
pub const SPEED_FACTOR_DECAY_RATE: f64 = 0.99;

/// Divisor applied to the speed factor on each recovering cycle.
pub const SPEED_FACTOR_RECOVER_RATE: f64 = 0.95;

/// Lower bound of the speed factor.
pub const MIN_SPEED_FACTOR: f64 = 0.4;

/// Upper bound of the speed factor.
pub const MAX_SPEED_FACTOR: f64 = 1.0;

/// Targets above this (and below `MIN_APPROACH_SPEED`) are raised to
/// `MIN_APPROACH_SPEED`.
pub const APPROACH_SPEED_THRESHOLD: f64 = 0.1;

/// Lowest non-zero target velocity, giving a faster approach to stop lines.
pub const MIN_APPROACH_SPEED: f64 = 2.0;

/// Added to the velocity before dividing the steering demand by it.
pub const STEER_VELOCITY_EPSILON: f64 = 0.01;

/// Gain applied to the smoothed steering demand.
pub const STEER_OUTPUT_GAIN: f64 = 10.0;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during TwistCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum TwistCtrlError {
    #[error("Could not load parameters: {0}")]
    ParamLoadError(#[from] util::params::LoadError),

    #[error("Could not initialise the archives: {0}")]
    ArchiveInitError(#[from] util::archive::ArchiveError),

    #[error("Could not create the archive directory: {0}")]
    ArchiveDirError(std::io::Error),
}
