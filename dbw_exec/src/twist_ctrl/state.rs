//! Implementations for the TwistCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info};
use serde::{Deserialize, Serialize};

// Internal
use super::{ActuatorCmd, Controller, Params, TwistCtrlError};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    module::State,
    params,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Twist control module state
pub struct TwistCtrl {
    controller: Controller,

    /// DBW state on the previous cycle, `None` before the first cycle
    dbw_enabled: Option<bool>,

    input: Option<InputData>,
    arch_input: Archiver,

    output: Option<ActuatorCmd>,
    arch_output: Archiver,

    report: StatusReport,
    arch_report: Archiver,
}

/// Input data to Twist Control, supplied once per cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputData {
    /// Time of this cycle.
    ///
    /// Units: seconds
    pub timestamp_s: f64,

    /// Target velocity from the waypoint follower.
    ///
    /// Units: miles/hour
    pub target_velocity: f64,

    /// Measured velocity of the vehicle.
    ///
    /// Units: meters/second
    pub current_velocity_ms: f64,

    /// Signed cross-track error to the planned path.
    ///
    /// Units: meters
    pub cte_m: f64,

    /// `true` while the drive-by-wire system has authority over the vehicle
    pub dbw_enabled: bool,
}

/// Status report for TwistCtrl processing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StatusReport {
    pub dbw_enabled: bool,
    pub t_delta_s: f64,
    pub acceleration_mss: f64,
    pub torque_nm: f64,
    pub in_deadband: bool,
    pub speed_factor: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for TwistCtrl {
    fn default() -> Self {
        Self::from_params(Params::default())
    }
}

impl TwistCtrl {
    /// Create the module from parameters, without any archives.
    pub fn from_params(params: Params) -> Self {
        Self {
            controller: Controller::new(params),
            dbw_enabled: None,
            input: None,
            arch_input: Archiver::default(),
            output: None,
            arch_output: Archiver::default(),
            report: StatusReport::default(),
            arch_report: Archiver::default(),
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }
}

impl State for TwistCtrl {
    type InitData = &'static str;
    type InitError = TwistCtrlError;

    type InputData = InputData;
    type OutputData = ActuatorCmd;
    type StatusReport = StatusReport;
    type ProcError = TwistCtrlError;

    /// Initialise the TwistCtrl module.
    ///
    /// Expected init data is the path to the parameter file
    fn init(&mut self, init_data: Self::InitData, session: &Session) -> Result<(), Self::InitError> {
        let params: Params = params::load(init_data)?;

        info!(
            "TwistCtrl vehicle: {} kg, wheel radius {} m, steer ratio {}",
            params.vehicle_mass_kg, params.wheel_radius_m, params.steer_ratio
        );

        *self = Self::from_params(params);

        std::fs::create_dir_all(session.arch_root.join("twist_ctrl"))
            .map_err(TwistCtrlError::ArchiveDirError)?;

        self.arch_input = Archiver::from_path(session, "twist_ctrl/input.csv")?;
        self.arch_output = Archiver::from_path(session, "twist_ctrl/output.csv")?;
        self.arch_report = Archiver::from_path(session, "twist_ctrl/status_report.csv")?;

        Ok(())
    }

    /// Perform cyclic processing of Twist Control.
    ///
    /// While DBW is disengaged the controller is reset every cycle and zero
    /// demands are returned.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let i = *input_data;

        if self.dbw_enabled != Some(i.dbw_enabled) {
            debug!(
                "DBW {} at {:.3} s",
                if i.dbw_enabled { "engaged" } else { "disengaged" },
                i.timestamp_s
            );
            self.dbw_enabled = Some(i.dbw_enabled);
        }

        let output = if i.dbw_enabled {
            let cmd = self.controller.control(
                i.timestamp_s,
                i.target_velocity,
                i.current_velocity_ms,
                i.cte_m,
            );

            let cycle = self.controller.last_cycle();
            self.report = StatusReport {
                dbw_enabled: true,
                t_delta_s: cycle.t_delta_s,
                acceleration_mss: cycle.acceleration_mss,
                torque_nm: cycle.torque_nm,
                in_deadband: cycle.in_deadband,
                speed_factor: cycle.speed_factor,
            };

            cmd
        } else {
            self.controller.reset(i.timestamp_s, i.cte_m);

            self.report = StatusReport {
                dbw_enabled: false,
                speed_factor: self.controller.speed_factor(),
                ..Default::default()
            };

            ActuatorCmd::default()
        };

        self.input = Some(i);
        self.output = Some(output);

        Ok((output, self.report))
    }
}

impl Archived for TwistCtrl {
    fn write(&mut self) -> Result<(), ArchiveError> {
        if let Some(i) = self.input {
            self.arch_input.serialise(i)?;
        }
        if let Some(o) = self.output {
            self.arch_output.serialise(o)?;
        }
        self.arch_report.serialise(self.report)?;

        Ok(())
    }
}
