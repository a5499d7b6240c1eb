//! # Cycle script replay
//!
//! A cycle script is a CSV file with one row per control cycle, giving the
//! inputs the driving stack would supply on that cycle:
//!
//! ```text
//! timestamp_s,target_velocity,current_velocity_ms,cte_m,dbw_enabled
//! 0.0,0.0,0.0,0.0,false
//! 0.5,10.0,0.0,0.2,true
//! ```
//!
//! Timestamps must not decrease from one row to the next.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::io::Read;
use std::path::Path;
use thiserror::Error;

// Internal
use crate::twist_ctrl::InputData;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A loaded cycle script.
#[derive(Debug, Clone)]
pub struct CycleScript {
    cycles: Vec<InputData>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("Could not find the script at {0}")]
    ScriptNotFound(String),

    #[error("Could not load the script: {0}")]
    ScriptLoadError(#[from] csv::Error),

    #[error("The script contains no cycles")]
    ScriptEmpty,

    #[error("Cycle {index} goes back in time ({time_s} s after {prev_s} s)")]
    NonMonotonicTimestamp {
        index: usize,
        prev_s: f64,
        time_s: f64,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl CycleScript {
    /// Load a script from the given path.
    pub fn load<P: AsRef<Path>>(script_path: P) -> Result<Self, ReplayError> {
        let path = script_path.as_ref();

        if !path.exists() {
            return Err(ReplayError::ScriptNotFound(path.display().to_string()));
        }

        Self::from_csv(csv::Reader::from_path(path)?)
    }

    /// Load a script from a reader over the CSV text.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ReplayError> {
        Self::from_csv(csv::Reader::from_reader(reader))
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, ReplayError> {
        let mut cycles: Vec<InputData> = Vec::new();

        for (index, record) in reader.deserialize().enumerate() {
            let cycle: InputData = record?;

            if let Some(prev) = cycles.last() {
                if cycle.timestamp_s < prev.timestamp_s {
                    return Err(ReplayError::NonMonotonicTimestamp {
                        index,
                        prev_s: prev.timestamp_s,
                        time_s: cycle.timestamp_s,
                    });
                }
            }

            cycles.push(cycle);
        }

        if cycles.is_empty() {
            return Err(ReplayError::ScriptEmpty);
        }

        Ok(Self { cycles })
    }

    /// Duration covered by the script.
    ///
    /// Units: seconds
    pub fn get_duration(&self) -> f64 {
        match (self.cycles.first(), self.cycles.last()) {
            (Some(first), Some(last)) => last.timestamp_s - first.timestamp_s,
            _ => 0f64,
        }
    }

    pub fn get_num_cycles(&self) -> usize {
        self.cycles.len()
    }

    pub fn cycles(&self) -> &[InputData] {
        &self.cycles
    }
}
