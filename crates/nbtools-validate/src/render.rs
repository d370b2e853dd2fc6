//! Adapter around the external notebook converter.
//!
//! # Convention
//!
//! Converting `name.ipynb` inside `outdir` must produce:
//!
//! ```text
//! outdir/
//!   name.rst         text document
//!   name_files/      images referenced by the document
//! ```
//!
//! The converter is invoked with an explicit argument list, never through a
//! shell:
//!
//! ```text
//! <program> <base args...> [--execute] --to <format> <notebook>
//! ```

use crate::artifact::RenderedArtifact;
use crate::error::RenderError;
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

/// Lines of converter stderr kept in a [`RenderError::ConverterFailed`].
const STDERR_TAIL_LINES: usize = 20;

/// Suffix of the image directory next to the text document.
pub const IMAGE_DIR_SUFFIX: &str = "_files";

/// How the converter obtains cell outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Re-execute every cell before rendering.
    Execute,
    /// Render the outputs stored in the notebook.
    Stored,
}

/// External converter invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterCommand {
    /// Executable to launch.
    pub program: String,
    /// Arguments placed before the render options.
    pub base_args: Vec<String>,
    /// Target format; also the extension of the text document.
    pub format: String,
}

impl Default for ConverterCommand {
    fn default() -> Self {
        ConverterCommand {
            program: "jupyter".to_string(),
            base_args: vec!["nbconvert".to_string()],
            format: "rst".to_string(),
        }
    }
}

impl ConverterCommand {
    /// Converter launched as `program base_args...`.
    pub fn new(program: impl Into<String>, base_args: &[&str]) -> Self {
        ConverterCommand {
            program: program.into(),
            base_args: base_args.iter().map(|a| a.to_string()).collect(),
            ..ConverterCommand::default()
        }
    }

    /// Full argument list for rendering `notebook` in `mode`.
    pub fn args(&self, notebook: &Path, mode: RenderMode) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.base_args.iter().map(OsString::from).collect();
        if mode == RenderMode::Execute {
            args.push("--execute".into());
        }
        args.push("--to".into());
        args.push(self.format.clone().into());
        args.push(notebook.as_os_str().to_owned());
        args
    }
}

/// Expected outputs of converting `notebook` into `output_dir`.
pub fn output_paths(notebook: &Path, output_dir: &Path, format: &str) -> (PathBuf, PathBuf) {
    let rootname = notebook
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let text_path = output_dir.join(format!("{rootname}.{format}"));
    let image_dir = output_dir.join(format!("{rootname}{IMAGE_DIR_SUFFIX}"));
    (text_path, image_dir)
}

/// Render `notebook` into the fresh directory `output_dir`.
///
/// `notebook` should be absolute: the converter runs with `output_dir` as
/// its working directory.
pub fn render_notebook(
    converter: &ConverterCommand,
    notebook: &Path,
    output_dir: &Path,
    mode: RenderMode,
) -> Result<RenderedArtifact, RenderError> {
    if output_dir.exists() {
        return Err(RenderError::OutputDirExists {
            path: output_dir.to_path_buf(),
        });
    }
    fs::create_dir(output_dir).map_err(|source| RenderError::CreateOutputDir {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let args = converter.args(notebook, mode);
    info!(
        program = %converter.program,
        ?mode,
        notebook = %notebook.display(),
        "rendering notebook"
    );
    let output = Command::new(&converter.program)
        .args(&args)
        .current_dir(output_dir)
        .output()
        .map_err(|source| RenderError::Launch {
            program: converter.program.clone(),
            source,
        })?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    debug!(
        stdout = %String::from_utf8_lossy(&output.stdout),
        stderr = %stderr,
        "converter finished"
    );
    if !output.status.success() {
        return Err(RenderError::ConverterFailed {
            program: converter.program.clone(),
            status: output.status,
            stderr_tail: tail_lines(&stderr, STDERR_TAIL_LINES),
        });
    }

    let (text_path, image_dir) = output_paths(notebook, output_dir, &converter.format);
    if !text_path.is_file() {
        return Err(RenderError::MissingText { path: text_path });
    }
    if !image_dir.is_dir() {
        return Err(RenderError::MissingImageDir { path: image_dir });
    }

    let text = fs::read_to_string(&text_path).map_err(|source| RenderError::ReadOutput {
        path: text_path.clone(),
        source,
    })?;
    let image_filenames = list_files(&image_dir)?;
    debug!(
        images = image_filenames.len(),
        dir = %image_dir.display(),
        "listed rendered images"
    );

    Ok(RenderedArtifact::new(
        notebook,
        text_path,
        text,
        image_dir,
        image_filenames,
    ))
}

/// Names of the files directly inside `dir`, symlinks to files included.
fn list_files(dir: &Path) -> Result<BTreeSet<String>, RenderError> {
    let read_err = |source: io::Error| RenderError::ReadOutput {
        path: dir.to_path_buf(),
        source,
    };
    let mut names = BTreeSet::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let file_type = entry.file_type().map_err(read_err)?;
        let is_file = if file_type.is_symlink() {
            // Dangling links are listed too; the comparator reports them.
            fs::metadata(entry.path()).map_or(true, |meta| meta.is_file())
        } else {
            file_type.is_file()
        };
        if is_file {
            names.insert(entry.file_name().to_string_lossy().into_owned());
        }
    }
    Ok(names)
}

fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}
