//! # Control channels
//!
//! Each actuator (steering, throttle, brake) has a channel made of a PID
//! controller and a low-pass filter. Only the steering channel is active by
//! default. The throttle and brake channels are kept with their tuning so that
//! they can be switched back on, but smoothing the longitudinal demands makes
//! the vehicle move unnaturally at low speeds.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use super::{LowPassFilter, PidController, PidTuning};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Steering channel tuning.
pub const STEER_TUNING: ChannelTuning = ChannelTuning {
    pid: PidTuning {
        k_p: 0.4,
        k_i: 0.0,
        k_d: 0.7,
        min: -2.5,
        max: 2.5,
    },
    lowpass_tau_s: 1e-4,
    mode: ChannelMode::Active,
};

/// Throttle channel tuning.
pub const THROTTLE_TUNING: ChannelTuning = ChannelTuning {
    pid: PidTuning {
        k_p: 1.0,
        k_i: 0.0,
        k_d: 0.5,
        min: 0.0,
        max: 1.0,
    },
    lowpass_tau_s: 5e-2,
    mode: ChannelMode::Disabled,
};

/// Brake channel tuning.
pub const BRAKE_TUNING: ChannelTuning = ChannelTuning {
    pid: PidTuning {
        k_p: 1.0,
        k_i: 0.0,
        k_d: 1.0,
        min: 0.0,
        max: 1.0,
    },
    lowpass_tau_s: 5e-2,
    mode: ChannelMode::Disabled,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Tuning of a single channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelTuning {
    /// PID gains and limits
    pub pid: PidTuning,

    /// Time constant of the channel's low-pass filter.
    ///
    /// Units: seconds
    pub lowpass_tau_s: f64,

    /// Whether the channel takes part in producing its demand
    pub mode: ChannelMode,
}

/// Tuning of all three channels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tunings {
    pub steer: ChannelTuning,
    pub throttle: ChannelTuning,
    pub brake: ChannelTuning,
}

/// A PID controller and low-pass filter pair.
#[derive(Debug, Clone, Serialize)]
pub struct Channel {
    pid: PidController,
    lowpass: LowPassFilter,
    mode: ChannelMode,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Whether a channel is used in the output path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelMode {
    /// The channel processes its demand every cycle.
    Active,

    /// The channel is skipped and its demand passes through unchanged. The
    /// channel's state is still reset with the controller.
    Disabled,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for Tunings {
    fn default() -> Self {
        Self {
            steer: STEER_TUNING,
            throttle: THROTTLE_TUNING,
            brake: BRAKE_TUNING,
        }
    }
}

impl Channel {
    /// Create a new channel from its tuning.
    pub fn new(tuning: &ChannelTuning) -> Self {
        Self {
            pid: PidController::new(tuning.pid),
            lowpass: LowPassFilter::new(tuning.lowpass_tau_s),
            mode: tuning.mode,
        }
    }

    /// Returns `true` if the channel is used in the output path.
    pub fn is_active(&self) -> bool {
        self.mode == ChannelMode::Active
    }

    /// The channel's mode.
    pub fn mode(&self) -> ChannelMode {
        self.mode
    }

    /// Step the channel's PID controller.
    pub fn step(&mut self, error: f64, dt: f64) -> f64 {
        self.pid.step(error, dt)
    }

    /// Pass a value through the channel's low-pass filter.
    pub fn filt(&mut self, value: f64, dt: f64) -> f64 {
        self.lowpass.filt(value, dt)
    }

    /// Reset both the PID controller and the low-pass filter.
    pub fn reset(&mut self) {
        self.pid.reset();
        self.lowpass.reset();
    }

    pub fn pid(&self) -> &PidController {
        &self.pid
    }

    pub fn lowpass(&self) -> &LowPassFilter {
        &self.lowpass
    }
}
