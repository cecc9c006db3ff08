//! Subcommand handlers.

pub mod check;
pub mod render;
pub mod run;

use aptag_config::Config;

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Load and validate the config file named by `--config`.
fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(aptag_config::load_config(&global.config)?)
}
