//! # PID controller
//!
//! A PID controller with a saturated output, used for each twist control
//! channel.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A PID controller with output clamping.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PidController {
    /// Gains and output limits
    tuning: PidTuning,

    /// Previous error, zero before the first step
    prev_error: f64,

    /// The integral accumulation
    integral: f64,
}

/// Gains and output limits of a PID controller.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct PidTuning {
    /// Proportional gain
    pub k_p: f64,

    /// Integral gain
    pub k_i: f64,

    /// Derivative gain
    pub k_d: f64,

    /// Minimum output
    pub min: f64,

    /// Maximum output
    pub max: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PidController {
    /// Create a new controller with the given tuning.
    pub fn new(tuning: PidTuning) -> Self {
        Self {
            tuning,
            prev_error: 0f64,
            integral: 0f64,
        }
    }

    /// Get the value of the controller for the given error after `dt` seconds.
    ///
    /// The output is clamped to the tuning's `[min, max]`. If `dt` is not
    /// positive the derivative term is zero.
    pub fn step(&mut self, error: f64, dt: f64) -> f64 {
        self.integral += error * dt;

        let deriv = if dt > 0f64 {
            (error - self.prev_error) / dt
        } else {
            0f64
        };

        let out = self.tuning.k_p * error + self.tuning.k_i * self.integral + self.tuning.k_d * deriv;

        self.prev_error = error;

        out.max(self.tuning.min).min(self.tuning.max)
    }

    /// Clear the integral and the previous error, keeping the tuning.
    pub fn reset(&mut self) {
        self.integral = 0f64;
        self.prev_error = 0f64;
    }

    /// The controller's tuning.
    pub fn tuning(&self) -> &PidTuning {
        &self.tuning
    }

    /// The current integral accumulation.
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// The error passed to the last step.
    pub fn prev_error(&self) -> f64 {
        self.prev_error
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn tuning(k_p: f64, k_i: f64, k_d: f64) -> PidTuning {
        PidTuning {
            k_p,
            k_i,
            k_d,
            min: -10.0,
            max: 10.0,
        }
    }

    #[test]
    fn test_proportional() {
        let mut pid = PidController::new(tuning(2.0, 0.0, 0.0));
        assert!((pid.step(0.5, 0.1) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_integral_accumulates() {
        let mut pid = PidController::new(tuning(0.0, 1.0, 0.0));
        pid.step(1.0, 0.1);
        let out = pid.step(1.0, 0.1);
        assert!((out - 0.2).abs() < 1e-12);
        assert!((pid.integral() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_derivative() {
        let mut pid = PidController::new(tuning(0.0, 0.0, 1.0));

        // First step differentiates against a zero previous error
        assert!((pid.step(1.0, 0.5) - 2.0).abs() < 1e-12);
        assert!(pid.step(1.0, 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_dt() {
        let mut pid = PidController::new(tuning(1.0, 1.0, 1.0));

        let out = pid.step(1.0, 0.0);
        assert!(out.is_finite());
        assert!((out - 1.0).abs() < 1e-12);

        let out = pid.step(2.0, -0.5);
        assert!(out.is_finite());
        // P = 2, I = 0 + (2 * -0.5) = -1, D = 0
        assert!((out - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_output_clamped() {
        let mut pid = PidController::new(PidTuning {
            k_p: 0.4,
            k_i: 0.0,
            k_d: 0.7,
            min: -2.5,
            max: 2.5,
        });

        assert_eq!(pid.step(100.0, 1.0), 2.5);
        assert_eq!(pid.step(-100.0, 1.0), -2.5);
    }

    #[test]
    fn test_reset() {
        let t = tuning(1.0, 1.0, 1.0);
        let mut pid = PidController::new(t);
        pid.step(3.0, 0.2);
        pid.step(4.0, 0.2);

        pid.reset();

        assert_eq!(pid.integral(), 0.0);
        assert_eq!(pid.prev_error(), 0.0);
        assert_eq!(*pid.tuning(), t);
        assert_eq!(pid, PidController::new(t));
    }
}
