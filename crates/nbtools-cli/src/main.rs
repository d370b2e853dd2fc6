//! `nbvalidate` entry point.
//!
//! Re-executes a notebook, compares it with its stored outputs and writes
//! `report.html` in the current directory.

use clap::Parser;
use nbtools_cli::cli_contract::{exit_for_parse_error, AppExit, ValidateCli};
use nbtools_cli::cli_failure::validate_failure;
use nbtools_cli::init_tracing;
use nbtools_validate::{run_validation, ValidateConfig};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = match ValidateCli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return exit_for_parse_error(&err).code(),
    };
    init_tracing();

    let config = ValidateConfig::new(&cli.notebook);
    match run_validation(&config) {
        Ok(outcome) => {
            println!("{}", outcome.report_path.display());
            AppExit::Success.code()
        }
        Err(err) => {
            let (exit, message) = validate_failure(&cli.notebook, &err);
            eprintln!("{message}");
            exit.code()
        }
    }
}
