//! # Twist controller
//!
//! The per-cycle drive-by-wire control algorithm.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use serde::Serialize;

// Internal
use super::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The drive-by-wire twist controller.
///
/// Owns one channel per actuator and the state carried between cycles. The
/// caller must invoke `control` once per cycle and `reset` whenever DBW
/// authority is disengaged.
#[derive(Debug, Clone)]
pub struct Controller {
    params: Params,

    /// Full throttle torque, from `params`
    max_acc_torque_nm: f64,

    /// Torque at the deceleration limit, from `params`
    max_brake_torque_nm: f64,

    steer: Channel,
    throttle: Channel,
    brake: Channel,

    /// Timestamp of the last reset or control cycle.
    ///
    /// Units: seconds
    last_update_s: f64,

    /// Attenuation factor driven by the CTE, in `[MIN_SPEED_FACTOR,
    /// MAX_SPEED_FACTOR]`.
    ///
    /// This is tracked every cycle but is not applied to the target velocity
    /// or to any demand.
    speed_factor: f64,

    /// Diagnostics of the last control cycle
    last_cycle: CycleReport,
}

/// Actuator demands produced by one control cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ActuatorCmd {
    /// Normalised throttle demand, in `[0, 1]`.
    pub throttle: f64,

    /// Brake torque demand, in `[0, max_brake_torque]`.
    ///
    /// Units: newton meters
    pub brake: f64,

    /// Normalised steering demand.
    pub steer: f64,
}

/// Intermediate quantities of a control cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CycleReport {
    /// Time since the previous update, used by the steering channel.
    ///
    /// Units: seconds
    pub t_delta_s: f64,

    /// CTE after the deadband shrink.
    ///
    /// Units: meters
    pub cte_m: f64,

    /// Limited acceleration demand.
    ///
    /// Units: meters/second^2
    pub acceleration_mss: f64,

    /// Wheel torque estimate, zero inside the brake deadband.
    ///
    /// Units: newton meters
    pub torque_nm: f64,

    /// `true` if the acceleration demand was inside the brake deadband
    pub in_deadband: bool,

    /// Speed factor after this cycle's update
    pub speed_factor: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Controller {
    /// Create a controller for the given vehicle with the default channel
    /// tunings.
    pub fn new(params: Params) -> Self {
        Self::with_tunings(params, &Tunings::default())
    }

    /// Create a controller for the given vehicle and channel tunings.
    pub fn with_tunings(params: Params, tunings: &Tunings) -> Self {
        Self {
            max_acc_torque_nm: params.max_acc_torque_nm(),
            max_brake_torque_nm: params.max_brake_torque_nm(),
            params,
            steer: Channel::new(&tunings.steer),
            throttle: Channel::new(&tunings.throttle),
            brake: Channel::new(&tunings.brake),
            last_update_s: 0f64,
            speed_factor: MAX_SPEED_FACTOR,
            last_cycle: CycleReport::default(),
        }
    }

    /// Reset all channels and set the last update time to `time_s`.
    ///
    /// `_cte_m` is accepted so callers can pass the current CTE, it has no
    /// effect. The speed factor is not reset.
    pub fn reset(&mut self, time_s: f64, _cte_m: f64) {
        self.last_update_s = time_s;
        self.steer.reset();
        self.throttle.reset();
        self.brake.reset();

        debug!("TwistCtrl controller reset at {:.3} s", time_s);
    }

    /// Run one control cycle.
    ///
    /// # Inputs
    /// - `timestamp_s`: time of this cycle in seconds.
    /// - `target_velocity`: target velocity, used as given (miles/hour).
    /// - `current_velocity_ms`: measured velocity in meters/second, converted
    ///   to miles/hour before use.
    /// - `cte_m`: signed cross-track error in meters.
    pub fn control(
        &mut self,
        timestamp_s: f64,
        target_velocity: f64,
        current_velocity_ms: f64,
        cte_m: f64,
    ) -> ActuatorCmd {
        let t_delta_s = timestamp_s - self.last_update_s;

        let cte_m = shrink_cte(cte_m);
        self.update_speed_factor(cte_m);

        let mut cmd = ActuatorCmd::default();

        // ---- LONGITUDINAL ----

        let current_velocity_mph = current_velocity_ms * MS_TO_MPH;

        let target_velocity =
            if target_velocity > APPROACH_SPEED_THRESHOLD && target_velocity < MIN_APPROACH_SPEED {
                MIN_APPROACH_SPEED
            } else {
                target_velocity
            };

        let mut acceleration_mss = (target_velocity - current_velocity_mph) / NOMINAL_CYCLE_PERIOD_S;
        if acceleration_mss > 0f64 {
            acceleration_mss = acceleration_mss.min(self.params.accel_limit_mss);
        } else {
            acceleration_mss = acceleration_mss.max(self.params.decel_limit_mss);
        }

        let in_deadband = acceleration_mss.abs() <= self.params.brake_deadband_mss;
        let mut torque_nm = 0f64;

        if !in_deadband {
            // 1:1 gear ratio
            torque_nm = self.params.wheel_radius_m * acceleration_mss * self.params.vehicle_mass_kg;

            if torque_nm >= 0f64 {
                cmd.throttle = (torque_nm / self.max_acc_torque_nm).min(1f64);
            } else {
                cmd.brake = self.max_brake_torque_nm.min(torque_nm.abs());
            }
        }

        // ---- LATERAL ----

        if self.steer.is_active() {
            cmd.steer =
                self.steer.step(cte_m, t_delta_s) * self.params.steer_ratio / REF_STEER_RATIO;
        }

        self.last_update_s = timestamp_s;

        // ---- SMOOTHING ----

        if self.throttle.is_active() {
            cmd.throttle = self.throttle.filt(cmd.throttle, t_delta_s);
        }
        if self.brake.is_active() {
            cmd.brake = self.brake.filt(cmd.brake, t_delta_s);
        }

        // Steering magnitude reduces as velocity increases
        if self.steer.is_active() {
            cmd.steer = self.steer.filt(
                cmd.steer / (current_velocity_mph + STEER_VELOCITY_EPSILON),
                t_delta_s,
            ) * STEER_OUTPUT_GAIN;
        }

        self.last_cycle = CycleReport {
            t_delta_s,
            cte_m,
            acceleration_mss,
            torque_nm,
            in_deadband,
            speed_factor: self.speed_factor,
        };

        trace!(
            "TwistCtrl output: thr {:.3} brake {:.3} steer {:.3}",
            cmd.throttle,
            cmd.brake,
            cmd.steer
        );

        cmd
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn max_acc_torque_nm(&self) -> f64 {
        self.max_acc_torque_nm
    }

    pub fn max_brake_torque_nm(&self) -> f64 {
        self.max_brake_torque_nm
    }

    pub fn speed_factor(&self) -> f64 {
        self.speed_factor
    }

    pub fn last_update_s(&self) -> f64 {
        self.last_update_s
    }

    pub fn last_cycle(&self) -> &CycleReport {
        &self.last_cycle
    }

    pub fn steer_channel(&self) -> &Channel {
        &self.steer
    }

    pub fn throttle_channel(&self) -> &Channel {
        &self.throttle
    }

    pub fn brake_channel(&self) -> &Channel {
        &self.brake
    }

    /// Decay the speed factor under a large CTE and recover it under a small
    /// one.
    fn update_speed_factor(&mut self, cte_m: f64) {
        if cte_m.abs() > SPEED_FACTOR_DECAY_CTE_M {
            self.speed_factor = MIN_SPEED_FACTOR.max(self.speed_factor * SPEED_FACTOR_DECAY_RATE);
        } else if cte_m.abs() < SPEED_FACTOR_RECOVER_CTE_M {
            self.speed_factor =
                MAX_SPEED_FACTOR.min(self.speed_factor / SPEED_FACTOR_RECOVER_RATE);
        }
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Move the CTE towards zero by `CTE_DEADBAND_M` without crossing zero.
fn shrink_cte(cte_m: f64) -> f64 {
    if cte_m > 0f64 {
        0f64.max(cte_m - CTE_DEADBAND_M)
    } else if cte_m < 0f64 {
        0f64.min(cte_m + CTE_DEADBAND_M)
    } else {
        cte_m
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Meters/second for the given miles/hour, so that the controller sees
    /// exactly `v_mph` after its conversion (within rounding).
    fn ms(v_mph: f64) -> f64 {
        v_mph / MS_TO_MPH
    }

    fn assert_close(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() < tol, "{} is not within {} of {}", a, tol, b);
    }

    fn controller() -> Controller {
        let mut c = Controller::new(Params::default());
        c.reset(0.0, 0.0);
        c
    }

    #[test]
    fn test_shrink_cte() {
        assert_close(shrink_cte(0.5), 0.4, 1e-12);
        assert_close(shrink_cte(-0.5), -0.4, 1e-12);
        assert_eq!(shrink_cte(0.05), 0.0);
        assert_eq!(shrink_cte(-0.05), 0.0);
        assert_eq!(shrink_cte(0.0), 0.0);
    }

    #[test]
    fn test_accelerate_from_standstill() {
        let mut c = controller();

        let cmd = c.control(0.5, 5.0, 0.0, 0.0);

        // Acceleration of 10 is limited to 1
        assert_close(c.last_cycle().acceleration_mss, 1.0, 1e-12);
        assert_close(c.last_cycle().torque_nm, 418.981255, 1e-6);
        assert_close(c.max_acc_torque_nm(), 628.4718825, 1e-6);
        assert_close(cmd.throttle, 2.0 / 3.0, 1e-9);
        assert_eq!(cmd.brake, 0.0);
        assert_eq!(cmd.steer, 0.0);
    }

    #[test]
    fn test_brake_to_stop() {
        let mut c = controller();

        let cmd = c.control(0.5, 0.0, ms(10.0), 0.0);

        assert_close(c.last_cycle().acceleration_mss, -5.0, 1e-12);
        assert!(c.last_cycle().torque_nm < 0.0);
        assert_eq!(cmd.throttle, 0.0);
        assert_close(cmd.brake, c.max_brake_torque_nm(), 1e-6);
        assert!(cmd.brake <= c.max_brake_torque_nm());
    }

    #[test]
    fn test_matching_speed_no_demand() {
        let mut c = controller();

        // Settle a steering transient first
        c.control(0.5, 20.0, ms(20.0), 0.5);
        c.control(1.0, 20.0, ms(20.0), 0.5);

        let mut cmd = ActuatorCmd::default();
        for i in 0..10 {
            cmd = c.control(1.5 + 0.5 * i as f64, 20.0, ms(20.0), 0.0);
            assert_eq!(cmd.throttle, 0.0);
            assert_eq!(cmd.brake, 0.0);
            assert!(c.last_cycle().in_deadband);
        }
        assert!(cmd.steer.abs() < 1e-9);
    }

    #[test]
    fn test_deadband() {
        let mut c = controller();

        // Acceleration of +0.08
        let cmd = c.control(0.5, 0.04, 0.0, 0.0);
        assert_eq!(cmd.throttle, 0.0);
        assert_eq!(cmd.brake, 0.0);
        assert!(c.last_cycle().in_deadband);
        assert_eq!(c.last_cycle().torque_nm, 0.0);

        // Acceleration of -0.08
        let cmd = c.control(1.0, 0.0, ms(0.04), 0.0);
        assert_eq!(cmd.throttle, 0.0);
        assert_eq!(cmd.brake, 0.0);
        assert!(c.last_cycle().in_deadband);
    }

    #[test]
    fn test_throttle_brake_exclusive() {
        let mut c = controller();
        let mut t = 0.0;

        for target in 0..40 {
            for current in 0..40 {
                t += 0.5;
                let cmd = c.control(t, target as f64 * 0.75, ms(current as f64 * 0.75), 0.0);

                assert!(!(cmd.throttle > 0.0 && cmd.brake > 0.0));
                assert!(cmd.throttle >= 0.0 && cmd.throttle <= 1.0);
                assert!(cmd.brake >= 0.0 && cmd.brake <= c.max_brake_torque_nm());

                let torque = c.last_cycle().torque_nm;
                if !c.last_cycle().in_deadband {
                    if torque >= 0.0 {
                        assert_close(
                            cmd.throttle,
                            (torque / c.max_acc_torque_nm()).min(1.0),
                            1e-12,
                        );
                        assert_eq!(cmd.brake, 0.0);
                    } else {
                        assert_close(cmd.brake, c.max_brake_torque_nm().min(torque.abs()), 1e-9);
                        assert_eq!(cmd.throttle, 0.0);
                    }
                }
            }
        }
    }

    #[test]
    fn test_approach_speed_floor() {
        let mut c = controller();

        // A target of 1.0 is raised to 2.0, so at 1.9 the vehicle still
        // accelerates gently instead of braking.
        let cmd = c.control(0.5, 1.0, ms(1.9), 0.0);

        assert_close(c.last_cycle().acceleration_mss, 0.2, 1e-9);
        assert_close(cmd.throttle, 0.2 / FULL_THROTTLE_ACCEL_MSS, 1e-9);
        assert_eq!(cmd.brake, 0.0);
    }

    #[test]
    fn test_zero_wheel_radius_saturates_throttle() {
        let mut c = Controller::new(Params {
            wheel_radius_m: 0.0,
            ..Default::default()
        });
        c.reset(0.0, 0.0);

        let cmd = c.control(0.5, 5.0, 0.0, 0.0);

        assert_eq!(c.max_acc_torque_nm(), 0.0);
        assert_eq!(cmd.throttle, 1.0);
        assert_eq!(cmd.brake, 0.0);
    }

    #[test]
    fn test_steer_converges() {
        let mut c = controller();
        let v_ms = ms(20.0);

        let mut prev = c.control(0.5, 20.0, v_ms, 0.5).steer;
        let mut last_diff = f64::INFINITY;

        for i in 2..30 {
            let steer = c.control(0.5 * i as f64, 20.0, v_ms, 0.5).steer;
            let diff = (steer - prev).abs();
            if i > 3 {
                assert!(diff <= last_diff + 1e-15);
            }
            last_diff = diff;
            prev = steer;
        }

        // Only the proportional term remains once the error is constant
        assert!(last_diff < 1e-12);
        assert_close(prev, 0.4 * 0.4 / (20.0 + STEER_VELOCITY_EPSILON) * STEER_OUTPUT_GAIN, 1e-6);
    }

    #[test]
    fn test_steer_ratio_scaling() {
        let mut reference = controller();
        let mut scaled = Controller::new(Params {
            steer_ratio: 2.0 * REF_STEER_RATIO,
            ..Default::default()
        });
        scaled.reset(0.0, 0.0);

        let a = reference.control(0.5, 10.0, ms(10.0), -0.6).steer;
        let b = scaled.control(0.5, 10.0, ms(10.0), -0.6).steer;

        assert!(a < 0.0);
        assert_close(b, 2.0 * a, 1e-12);
    }

    #[test]
    fn test_separate_time_bases() {
        let mut fast = controller();
        let mut slow = controller();

        let a = fast.control(0.1, 10.0, ms(5.0), 0.5);
        let b = slow.control(2.0, 10.0, ms(5.0), 0.5);

        // Longitudinal demands use the nominal period, steering the measured one
        assert_eq!(a.throttle, b.throttle);
        assert_eq!(a.brake, b.brake);
        assert!((a.steer - b.steer).abs() > 1e-3);
        assert_close(fast.last_cycle().t_delta_s, 0.1, 1e-12);
        assert_close(slow.last_cycle().t_delta_s, 2.0, 1e-12);
    }

    #[test]
    fn test_reset_clears_history() {
        let mut used = controller();
        for i in 1..10 {
            used.control(0.5 * i as f64, 15.0, ms(12.0), 1.2);
        }

        used.reset(5.0, 1.2);
        assert_eq!(used.last_update_s(), 5.0);
        assert_eq!(used.steer_channel().pid().integral(), 0.0);
        assert_eq!(used.steer_channel().pid().prev_error(), 0.0);
        assert!(!used.steer_channel().lowpass().is_initialised());

        let mut fresh = Controller::new(Params::default());
        fresh.reset(5.0, 1.2);

        assert_eq!(
            used.control(5.5, 15.0, ms(12.0), 1.2),
            fresh.control(5.5, 15.0, ms(12.0), 1.2)
        );
    }

    #[test]
    fn test_speed_factor_evolution() {
        let mut c = controller();
        assert_eq!(c.speed_factor(), 1.0);

        c.control(0.5, 10.0, ms(10.0), 2.0);
        assert_close(c.speed_factor(), 0.99, 1e-12);

        // Between the thresholds the factor holds
        c.control(1.0, 10.0, ms(10.0), 0.6);
        assert_close(c.speed_factor(), 0.99, 1e-12);

        for i in 0..200 {
            c.control(1.5 + 0.5 * i as f64, 10.0, ms(10.0), -2.0);
        }
        assert_eq!(c.speed_factor(), MIN_SPEED_FACTOR);

        for i in 0..50 {
            c.control(200.0 + 0.5 * i as f64, 10.0, ms(10.0), 0.1);
        }
        assert_eq!(c.speed_factor(), MAX_SPEED_FACTOR);
    }

    #[test]
    fn test_speed_factor_has_no_effect() {
        let mut large_cte = controller();
        let mut small_cte = controller();

        for i in 1..=20 {
            large_cte.control(0.5 * i as f64, 10.0, ms(9.0), 2.0);
            small_cte.control(0.5 * i as f64, 10.0, ms(9.0), 0.0);
        }

        assert!(large_cte.speed_factor() < small_cte.speed_factor());

        large_cte.reset(10.0, 0.0);
        small_cte.reset(10.0, 0.0);

        assert_eq!(
            large_cte.control(10.5, 15.0, ms(9.0), 0.3),
            small_cte.control(10.5, 15.0, ms(9.0), 0.3)
        );
    }

    #[test]
    fn test_longitudinal_smoothing_disabled_by_default() {
        let mut default = controller();
        let mut smoothed = Controller::with_tunings(
            Params::default(),
            &Tunings {
                throttle: ChannelTuning {
                    mode: ChannelMode::Active,
                    ..THROTTLE_TUNING
                },
                ..Default::default()
            },
        );
        smoothed.reset(0.0, 0.0);

        assert!(!default.throttle_channel().is_active());
        assert!(!default.brake_channel().is_active());

        // The first value passes through the filter unchanged
        assert_eq!(
            default.control(0.5, 5.0, 0.0, 0.0),
            smoothed.control(0.5, 5.0, 0.0, 0.0)
        );

        // The smoothed throttle lags the step back to zero
        let a = default.control(1.0, 5.0, ms(5.0), 0.0);
        let b = smoothed.control(1.0, 5.0, ms(5.0), 0.0);
        assert_eq!(a.throttle, 0.0);
        assert!(b.throttle > 0.0);
    }

    #[test]
    fn test_zero_velocity_steer_finite() {
        let mut c = controller();

        let cmd = c.control(0.5, 0.0, 0.0, 3.0);

        assert!(cmd.steer.is_finite());
        assert!(cmd.steer > 0.0);
    }
}
