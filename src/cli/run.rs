//! CLI entry point and dispatch logic
//!
//! `run()` parses arguments, initialises logging, discovers configuration,
//! dispatches to the command and handles all error output.

use clap::Parser;

use super::args::{Cli, Commands};
use super::commands;
use crate::{Config, ExitCode, TaskrunError, logging};

/// Main CLI execution function.
///
/// Prints everything, including errors. On failure returns the exit code
/// for `main` to pass to `std::process::exit`.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    // Logging is best effort; a failure here must not stop the task
    if let Err(e) = logging::init_tracing(cli.verbose) {
        eprintln!("⚠ Failed to initialise logging: {e}");
    }

    let config = match Config::discover(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => return Err(report(&TaskrunError::from(err))),
    };

    let result = match cli.command {
        Commands::Run(args) => commands::execute_run_command(args, &config),
        Commands::Doctor { json } => commands::execute_doctor_command(json, &config),
        Commands::Config => commands::execute_config_command(&config),
    };

    match result {
        Ok(code) if code.is_success() => Ok(()),
        Ok(code) => Err(code),
        Err(err) => match err.downcast_ref::<TaskrunError>() {
            Some(err) => Err(report(err)),
            None => {
                eprintln!("Error: {err:#}");
                Err(ExitCode::INTERNAL)
            }
        },
    }
}

fn report(err: &TaskrunError) -> ExitCode {
    eprint!("{}", err.display_for_user());
    err.to_exit_code()
}
