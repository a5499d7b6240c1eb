//! # Low-pass filter
//!
//! First-order exponential smoothing, parameterised by a time constant.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A first-order low-pass filter.
///
/// The first value after construction or a reset passes straight through and
/// seeds the filter state.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct LowPassFilter {
    /// Time constant of the filter.
    ///
    /// Units: seconds
    tau_s: f64,

    /// Current smoothed value
    value: f64,

    /// `false` until the first value is filtered
    initialised: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LowPassFilter {
    /// Create a new filter with the given time constant, which must be
    /// positive.
    pub fn new(tau_s: f64) -> Self {
        Self {
            tau_s,
            value: 0f64,
            initialised: false,
        }
    }

    /// Filter `value`, which was sampled `dt` seconds after the previous one.
    pub fn filt(&mut self, value: f64, dt: f64) -> f64 {
        if self.initialised {
            let a = dt / (self.tau_s + dt);
            self.value = a * value + (1f64 - a) * self.value;
        } else {
            self.value = value;
            self.initialised = true;
        }

        self.value
    }

    /// Make the next call to `filt` pass its value straight through.
    pub fn reset(&mut self) {
        self.initialised = false;
    }

    /// The filter's time constant.
    pub fn tau_s(&self) -> f64 {
        self.tau_s
    }

    /// The last filtered value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Returns `true` once a value has been filtered since the last reset.
    pub fn is_initialised(&self) -> bool {
        self.initialised
    }
}
