//! Host platform utility functions

use std::path::PathBuf;

/// Name of the environment variable pointing at the software root.
pub const SW_ROOT_ENV_VAR: &str = "DBW_SW_ROOT";

/// Get the software root directory from the `DBW_SW_ROOT` environment
/// variable.
///
/// Parameter files live in `<root>/params` and sessions are created under
/// the root.
pub fn get_dbw_sw_root() -> Result<PathBuf, std::env::VarError> {
    std::env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
