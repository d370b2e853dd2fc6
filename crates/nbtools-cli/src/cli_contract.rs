use clap::error::ErrorKind;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

/// Re-execute a notebook and report how its outputs differ from the stored ones.
#[derive(Debug, Parser)]
#[command(name = "nbvalidate")]
#[command(version, about, long_about = None)]
pub struct ValidateCli {
    /// Notebook to validate (.ipynb).
    pub notebook: PathBuf,
}

/// Print the cell sources of a notebook in a diffable form.
#[derive(Debug, Parser)]
#[command(name = "nbcatsrc")]
#[command(version, about, long_about = None)]
pub struct CatSrcCli {
    /// Notebook to print (.ipynb).
    pub notebook: PathBuf,
}

/// Mirror two directory trees with notebooks replaced by their diffable sources.
#[derive(Debug, Parser)]
#[command(name = "nbmirror")]
#[command(version, about, long_about = None)]
pub struct MirrorCli {
    /// Left directory tree.
    pub left: PathBuf,

    /// Right directory tree.
    pub right: PathBuf,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AppExit {
    Success = 0,
    NotFound = 1,
    InvalidArgs = 2,
    RenderFailed = 3,
    RuntimeError = 4,
}

impl AppExit {
    pub fn code(self) -> ExitCode {
        ExitCode::from(self as u8)
    }
}

/// Print a clap parse error and pick the matching exit code.
///
/// `--help` and `--version` are reported through clap errors too; they
/// exit successfully.
pub fn exit_for_parse_error(err: &clap::Error) -> AppExit {
    let _ = err.print();
    parse_error_exit(err.kind())
}

pub(crate) fn parse_error_exit(kind: ErrorKind) -> AppExit {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => AppExit::Success,
        _ => AppExit::InvalidArgs,
    }
}
