//! Command line front end of the script engine.

mod cli;
mod commands;
mod error;

pub use self::cli::run;
pub use self::error::{Error, Result};

pub(crate) const LOG_TARGET: &str = "mass_script_cli";
