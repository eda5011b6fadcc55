//! Command-line interface
//!
//! Argument parsing and command dispatch. `main.rs` delegates here and
//! only handles the exit code.

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use errors::{CliError, CliResult};

/// Parse arguments and run the selected command.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    commands::dispatch(cli.command)
}
