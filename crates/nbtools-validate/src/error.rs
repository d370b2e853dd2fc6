//! Error taxonomy of a validation run.
//!
//! Only [`ValidateError`] escapes [`crate::run_validation`]. Per-image
//! [`crate::compare::ComparisonFailure`]s are recovered by the reconciler
//! and end up as data in the report.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

/// Fatal failure of a validation run.
#[derive(Debug, thiserror::Error)]
pub enum ValidateError {
    #[error("notebook not found: {}", path.display())]
    NotebookNotFound { path: PathBuf },

    #[error("failed to prepare working directory")]
    Workspace(#[source] io::Error),

    #[error("render failed")]
    Render(#[from] RenderError),

    #[error(
        "actual and expected renders come from different notebooks: {} vs {}",
        actual.display(),
        expected.display()
    )]
    NotebookMismatch { actual: PathBuf, expected: PathBuf },

    #[error("failed to write report {}", path.display())]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The external converter did not produce a usable render.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("output directory already exists: {}", path.display())]
    OutputDirExists { path: PathBuf },

    #[error("failed to create output directory {}", path.display())]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to launch converter `{program}`")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("converter `{program}` exited with {status}: {stderr_tail}")]
    ConverterFailed {
        program: String,
        status: ExitStatus,
        stderr_tail: String,
    },

    #[error("converter did not produce text output {}", path.display())]
    MissingText { path: PathBuf },

    #[error("converter did not produce image directory {}", path.display())]
    MissingImageDir { path: PathBuf },

    #[error("failed to read rendered output {}", path.display())]
    ReadOutput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
