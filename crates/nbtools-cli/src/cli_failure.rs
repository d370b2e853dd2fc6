use crate::cli_contract::AppExit;
use nbtools_validate::{RenderError, ValidateError};
use std::error::Error;
use std::fmt::Write as _;
use std::io;
use std::path::Path;

pub fn format_cli_failure(
    what_failed: &str,
    likely_cause: &str,
    next_commands: &[String],
    evidence: &[String],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Error: {what_failed}");
    let _ = writeln!(out, "Likely cause: {likely_cause}");

    if !next_commands.is_empty() {
        let _ = writeln!(out, "Next command(s):");
        for (i, cmd) in next_commands.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, cmd);
        }
    }

    if !evidence.is_empty() {
        let _ = writeln!(out, "Evidence:");
        for line in evidence {
            let _ = writeln!(out, "  - {line}");
        }
    }

    out.trim_end().to_string()
}

/// Messages of the errors underneath `err`, outermost first.
pub fn source_chain(err: &(dyn Error + 'static)) -> Vec<String> {
    let mut chain = Vec::new();
    let mut current = err.source();
    while let Some(cause) = current {
        chain.push(cause.to_string());
        current = cause.source();
    }
    chain
}

/// Exit code and diagnostic for a failed `nbvalidate` run.
pub fn validate_failure(notebook: &Path, err: &ValidateError) -> (AppExit, String) {
    let nb = notebook.display();
    let (exit, cause, next): (AppExit, &str, Vec<String>) = match err {
        ValidateError::NotebookNotFound { .. } => (
            AppExit::NotFound,
            "The notebook path does not exist or is not a regular file.",
            vec!["nbvalidate <path/to/notebook.ipynb>".to_string()],
        ),
        ValidateError::Render(RenderError::Launch { .. }) => (
            AppExit::RenderFailed,
            "The notebook converter could not be started; `jupyter nbconvert` must be on PATH.",
            vec!["jupyter nbconvert --version".to_string()],
        ),
        ValidateError::Render(RenderError::ConverterFailed { .. }) => (
            AppExit::RenderFailed,
            "The notebook failed to execute or convert.",
            vec![format!("jupyter nbconvert --execute --to rst {nb}")],
        ),
        ValidateError::Render(_) => (
            AppExit::RenderFailed,
            "The converter did not produce the expected text document and image directory.",
            vec![format!("jupyter nbconvert --to rst {nb}")],
        ),
        ValidateError::ReportWrite { .. } => (
            AppExit::RuntimeError,
            "The report location is not writable.",
            Vec::new(),
        ),
        ValidateError::Workspace(_) => (
            AppExit::RuntimeError,
            "The temporary working directory could not be created.",
            Vec::new(),
        ),
        ValidateError::NotebookMismatch { .. } => (
            AppExit::RuntimeError,
            "Internal error: renders were paired from different notebooks.",
            Vec::new(),
        ),
    };
    let message = format_cli_failure(&err.to_string(), cause, &next, &source_chain(err));
    (exit, message)
}

/// Exit code and diagnostic for a failed filesystem tool (`nbcatsrc`, `nbmirror`).
pub fn io_failure(what_failed: &str, err: &io::Error) -> (AppExit, String) {
    let (exit, cause) = match err.kind() {
        io::ErrorKind::NotFound => (AppExit::NotFound, "The path does not exist."),
        io::ErrorKind::AlreadyExists => (
            AppExit::RuntimeError,
            "A mirror already exists; remove it before mirroring again.",
        ),
        io::ErrorKind::InvalidData => (AppExit::RuntimeError, "The notebook is not valid JSON."),
        _ => (AppExit::RuntimeError, "The filesystem operation failed."),
    };
    let mut evidence = vec![err.to_string()];
    evidence.extend(source_chain(err));
    (exit, format_cli_failure(what_failed, cause, &[], &evidence))
}
