//! Notebook execution validation.
//!
//! # Overview
//!
//! Re-executes a notebook and compares the result with the output stored
//! in it. Both renders go through the same external converter, so any
//! difference comes from execution, not from rendering.
//!
//! # Pipeline
//!
//! ```text
//! notebook ─┬─ render (--execute) → actual   ─┐
//!           └─ render (stored)    → expected ─┴─ pair
//! pair.text   → normalize → diff ─────────────┐
//! pair.images → reconcile (compare per image) ┴─ report → report.html
//! ```
//!
//! 1. **Render**: two converter runs into a temporary working directory.
//! 2. **Text**: strip memory addresses, diff line by line.
//! 3. **Images**: set difference plus RMS comparison of shared images.
//! 4. **Report**: one self-contained HTML file.
//!
//! # Failure policy
//!
//! Render and report-write failures abort the run ([`ValidateError`]).
//! Per-image comparison failures never do; they are reported as
//! uncomparable images. The working directory is removed on every exit
//! path.

mod artifact;
pub mod compare;
mod error;
pub mod reconcile;
pub mod render;
pub mod report;

pub use artifact::{ArtifactPair, RenderedArtifact};
pub use error::{RenderError, ValidateError};
pub use report::{ValidationReport, ValidationSummary};

use compare::{ImageComparator, RmsComparator, IMAGE_TOLERANCE};
use nbtools_core::normalize::{count_addresses, normalize_text};
use nbtools_core::textdiff::diff_text;
use reconcile::reconcile_images;
use render::{render_notebook, ConverterCommand, RenderMode};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default report file name, resolved against the current directory.
pub const DEFAULT_REPORT_FILE: &str = "report.html";

/// Validation run configuration.
#[derive(Debug, Clone)]
pub struct ValidateConfig {
    /// Notebook to validate.
    pub notebook: PathBuf,
    /// Where the HTML report is written.
    pub report_path: PathBuf,
    /// External converter.
    pub converter: ConverterCommand,
    /// RMS tolerance for image comparison.
    pub tolerance: f64,
    /// Parent of the temporary working directory (system temp dir if unset).
    pub work_root: Option<PathBuf>,
}

impl ValidateConfig {
    /// Create a configuration with default report path, converter and
    /// tolerance.
    pub fn new(notebook: impl Into<PathBuf>) -> Self {
        ValidateConfig {
            notebook: notebook.into(),
            report_path: PathBuf::from(DEFAULT_REPORT_FILE),
            converter: ConverterCommand::default(),
            tolerance: IMAGE_TOLERANCE,
            work_root: None,
        }
    }

    /// Set the report path.
    pub fn with_report_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = path.into();
        self
    }

    /// Set the converter command.
    pub fn with_converter(mut self, converter: ConverterCommand) -> Self {
        self.converter = converter;
        self
    }

    /// Create the working directory under `dir`.
    pub fn with_work_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_root = Some(dir.into());
        self
    }
}

/// Result of a completed validation run.
#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    /// Absolute path of the written report.
    pub report_path: PathBuf,
    pub summary: ValidationSummary,
}

/// Validate a notebook with the default RMS image comparator.
pub fn run_validation(config: &ValidateConfig) -> Result<ValidationOutcome, ValidateError> {
    run_validation_with(config, &RmsComparator)
}

/// Validate a notebook with a caller-provided image comparator.
pub fn run_validation_with(
    config: &ValidateConfig,
    comparator: &dyn ImageComparator,
) -> Result<ValidationOutcome, ValidateError> {
    if !config.notebook.is_file() {
        return Err(ValidateError::NotebookNotFound {
            path: config.notebook.clone(),
        });
    }
    let notebook = std::path::absolute(&config.notebook).map_err(ValidateError::Workspace)?;
    let report_path = std::path::absolute(&config.report_path).map_err(ValidateError::Workspace)?;

    // Dropping the TempDir removes everything below it, on every return path.
    let workdir = match &config.work_root {
        Some(root) => tempfile::tempdir_in(root),
        None => tempfile::tempdir(),
    }
    .map_err(ValidateError::Workspace)?;
    debug!(workdir = %workdir.path().display(), "created working directory");

    let pair = render_pair(&config.converter, &notebook, workdir.path())?;

    let actual_text = normalize_text(pair.actual().text());
    let expected_text = normalize_text(pair.expected().text());
    debug!(
        actual = count_addresses(pair.actual().text()),
        expected = count_addresses(pair.expected().text()),
        "normalized addresses"
    );
    let text_diff = diff_text(&actual_text, &expected_text);

    let images = reconcile_images(&pair, comparator, config.tolerance);

    let report = ValidationReport::new(
        config.notebook.display().to_string(),
        text_diff,
        images,
    );
    report
        .write_to(&report_path)
        .map_err(|source| ValidateError::ReportWrite {
            path: report_path.clone(),
            source,
        })?;

    let summary = report.summary();
    info!(
        report = %report_path.display(),
        text_hunks = summary.text_hunks,
        different = summary.different,
        uncomparable = summary.uncomparable,
        "validation report written"
    );

    Ok(ValidationOutcome {
        report_path,
        summary,
    })
}

/// Render `notebook` twice under `workdir`: executed, then stored.
fn render_pair(
    converter: &ConverterCommand,
    notebook: &Path,
    workdir: &Path,
) -> Result<ArtifactPair, ValidateError> {
    let actual = render_notebook(
        converter,
        notebook,
        &workdir.join("actual"),
        RenderMode::Execute,
    )?;
    let expected = render_notebook(
        converter,
        notebook,
        &workdir.join("expected"),
        RenderMode::Stored,
    )?;
    ArtifactPair::new(actual, expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = ValidateConfig::new("nb.ipynb");
        assert_eq!(config.notebook, PathBuf::from("nb.ipynb"));
        assert_eq!(config.report_path, PathBuf::from("report.html"));
        assert_eq!(config.converter, ConverterCommand::default());
        assert_eq!(config.tolerance, 0.001);
        assert!(config.work_root.is_none());
    }

    #[test]
    fn config_builders() {
        let config = ValidateConfig::new("nb.ipynb")
            .with_report_path("out/r.html")
            .with_converter(ConverterCommand::new("sh", &["conv.sh"]))
            .with_work_root("/scratch");
        assert_eq!(config.report_path, PathBuf::from("out/r.html"));
        assert_eq!(config.converter.program, "sh");
        assert_eq!(config.work_root, Some(PathBuf::from("/scratch")));
    }

    #[test]
    fn missing_notebook_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let config = ValidateConfig::new(dir.path().join("absent.ipynb"));
        let err = run_validation(&config).unwrap_err();
        assert!(matches!(err, ValidateError::NotebookNotFound { .. }));
    }
}
