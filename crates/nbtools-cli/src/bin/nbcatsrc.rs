//! `nbcatsrc`: print the cell sources of a notebook with a header per cell.

use clap::Parser;
use nbtools_cli::cli_contract::{exit_for_parse_error, AppExit, CatSrcCli};
use nbtools_cli::cli_failure::io_failure;
use nbtools_cli::init_tracing;
use nbtools_core::notebook::read_notebook;
use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = match CatSrcCli::try_parse() {
        Ok(cli) => cli,
        Err(err) => return exit_for_parse_error(&err).code(),
    };
    init_tracing();

    let notebook = match read_notebook(&cli.notebook) {
        Ok(notebook) => notebook,
        Err(err) => {
            let what = format!("cannot read notebook {}", cli.notebook.display());
            let (exit, message) = io_failure(&what, &err);
            eprintln!("{message}");
            return exit.code();
        }
    };

    let mut stdout = io::stdout().lock();
    // A closed pipe (`nbcatsrc nb.ipynb | head`) is not a failure.
    let _ = stdout.write_all(notebook.diffable_source().as_bytes());
    let _ = stdout.flush();
    AppExit::Success.code()
}
