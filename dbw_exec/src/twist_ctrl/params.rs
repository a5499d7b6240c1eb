//! Parameters structure for TwistCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::FULL_THROTTLE_ACCEL_MSS;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Vehicle parameters for twist control.
///
/// Any field missing from the parameter file takes its default value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    // ---- MASS ----
    /// Mass of the vehicle.
    ///
    /// Units: kilograms
    pub vehicle_mass_kg: f64,

    /// Fuel tank capacity.
    ///
    /// Units: gallons
    pub fuel_capacity_gal: f64,

    // ---- LONGITUDINAL ----
    /// Acceleration magnitude at or below which no throttle or brake is
    /// demanded.
    ///
    /// Units: meters/second^2
    pub brake_deadband_mss: f64,

    /// Deceleration limit, negative.
    ///
    /// Units: meters/second^2
    pub decel_limit_mss: f64,

    /// Acceleration limit.
    ///
    /// Units: meters/second^2
    pub accel_limit_mss: f64,

    // ---- GEOMETRY ----
    /// Radius of the wheels.
    ///
    /// Units: meters
    pub wheel_radius_m: f64,

    /// Distance between the front and rear axles.
    ///
    /// Units: meters
    pub wheel_base_m: f64,

    /// Ratio of steering wheel angle to road wheel angle.
    pub steer_ratio: f64,

    // ---- LATERAL ----
    /// Maximum lateral acceleration.
    ///
    /// Units: meters/second^2
    pub max_lat_accel_mss: f64,

    /// Maximum steering wheel angle.
    ///
    /// Units: radians
    pub max_steer_angle_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Params {
    fn default() -> Self {
        Self {
            vehicle_mass_kg: 1736.35,
            fuel_capacity_gal: 13.5,
            brake_deadband_mss: 0.1,
            decel_limit_mss: -5.0,
            accel_limit_mss: 1.0,
            wheel_radius_m: 0.2413,
            wheel_base_m: 2.8498,
            steer_ratio: 14.8,
            max_lat_accel_mss: 3.0,
            max_steer_angle_rad: 8.0,
        }
    }
}

impl Params {
    /// Wheel torque corresponding to full throttle.
    ///
    /// Units: newton meters
    pub fn max_acc_torque_nm(&self) -> f64 {
        self.vehicle_mass_kg * FULL_THROTTLE_ACCEL_MSS * self.wheel_radius_m
    }

    /// Wheel torque corresponding to the deceleration limit.
    ///
    /// Units: newton meters
    pub fn max_brake_torque_nm(&self) -> f64 {
        self.vehicle_mass_kg * self.decel_limit_mss.abs() * self.wheel_radius_m
    }
}
