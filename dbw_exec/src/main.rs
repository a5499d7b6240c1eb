//! Drive-by-wire executable entry point.
//!
//! # Architecture
//!
//! The executable replays a cycle script through twist control:
//!
//!     - Initialise session, logging and parameters
//!     - Initialise TwistCtrl
//!     - Main loop, once per scripted cycle:
//!         - Twist control processing
//!         - Archiving
//!         - Cycle pacing (optional)
//!
//! Usage: `dbw_exec <cycle_script.csv>`. Parameters are read from
//! `$DBW_SW_ROOT/params`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{
    eyre::{eyre, WrapErr},
    Report,
};
use log::{debug, info, trace, warn};
use std::env;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use dbw_lib::{params::ExecParams, replay::CycleScript, twist_ctrl::TwistCtrl};
use util::{
    archive::Archived,
    logger::{logger_init, LevelFilter},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    // ---- EARLY INITIALISATION ----

    let session = Session::new("dbw_exec", "sessions").wrap_err("Failed to create the session")?;

    logger_init(LevelFilter::Debug, &session).wrap_err("Failed to initialise logging")?;

    info!("Drive-by-wire Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: ExecParams =
        util::params::load("dbw_exec.toml").wrap_err("Could not load exec params")?;

    if !(exec_params.cycle_period_s > 0.0 && exec_params.cycle_period_s.is_finite()) {
        return Err(eyre!(
            "The cycle period must be positive, found {}",
            exec_params.cycle_period_s
        ));
    }

    info!("Exec parameters loaded");

    // ---- LOAD SCRIPT ----

    let args: Vec<String> = env::args().collect();

    debug!("CLI arguments: {:?}", args);

    if args.len() != 2 {
        return Err(eyre!(
            "Expected one argument (the cycle script path), found {}",
            args.len() - 1
        ));
    }

    info!("Loading cycle script from \"{}\"", &args[1]);

    let script = CycleScript::load(&args[1]).wrap_err("Failed to load cycle script")?;

    info!(
        "Loaded script lasts {:.02} s and contains {} cycles\n",
        script.get_duration(),
        script.get_num_cycles()
    );

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut twist_ctrl = TwistCtrl::default();
    twist_ctrl
        .init("twist_ctrl.toml", &session)
        .wrap_err("Failed to initialise TwistCtrl")?;
    info!("TwistCtrl init complete");

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let cycle_period = Duration::from_secs_f64(exec_params.cycle_period_s);
    let mut num_engaged_cycles = 0usize;
    let mut num_overruns = 0usize;

    for input in script.cycles() {
        let cycle_start_instant = Instant::now();

        let (output, report) = twist_ctrl
            .proc(input)
            .wrap_err("Error during TwistCtrl processing")?;

        if report.dbw_enabled {
            num_engaged_cycles += 1;
        }

        trace!("TwistCtrl status: {:?}", report);

        if let Err(e) = twist_ctrl.write() {
            warn!("Could not archive TwistCtrl data: {}", e);
        }

        debug!(
            "[{:8.3} s] thr {:.3} brake {:.1} steer {:.3}",
            input.timestamp_s, output.throttle, output.brake, output.steer
        );

        // ---- CYCLE PACING ----

        if exec_params.pace_realtime {
            let cycle_dur = Instant::now() - cycle_start_instant;

            match cycle_period.checked_sub(cycle_dur) {
                Some(d) => thread::sleep(d),
                None => {
                    num_overruns += 1;
                    warn!(
                        "Cycle overran by {:.06} s",
                        (cycle_dur - cycle_period).as_secs_f64()
                    );
                }
            }
        }
    }

    info!("End of cycle script reached");
    info!(
        "    {} cycles, {} with DBW engaged, {} overruns",
        script.get_num_cycles(),
        num_engaged_cycles,
        num_overruns
    );
    info!(
        "    Final speed factor: {:.3}",
        twist_ctrl.controller().speed_factor()
    );

    Ok(())
}
