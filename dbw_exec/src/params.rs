//! # DBW Executable Parameters
//!
//! This module provide parameters for the drive-by-wire executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Parameters for the executable. Missing fields take their default value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecParams {
    /// Target period of one cycle. Should match the nominal period twist
    /// control assumes.
    ///
    /// Units: seconds
    pub cycle_period_s: f64,

    /// If true each replayed cycle waits out the rest of `cycle_period_s`,
    /// otherwise cycles run back to back.
    pub pace_realtime: bool,
}

impl Default for ExecParams {
    fn default() -> Self {
        Self {
            cycle_period_s: crate::twist_ctrl::NOMINAL_CYCLE_PERIOD_S,
            pace_realtime: false,
        }
    }
}
