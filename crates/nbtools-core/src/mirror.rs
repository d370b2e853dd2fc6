//! Directory mirror with diffable notebooks.
//!
//! # Overview
//!
//! A visual directory diff of two notebook trees is mostly noise: outputs,
//! execution counts and embedded images change on every run. The mirror
//! recreates a tree under `<root>/mirror` where:
//!
//! - each `name.ipynb` becomes `name_diffable.ipynb` holding only the cell
//!   sources (see [`crate::notebook`]),
//! - every other file is hard-linked, so edits made to it through the
//!   mirror land in the original tree.
//!
//! Notebook edits made in the mirror are never written back. Symlinks to
//! files are mirrored as links to their target; symlinked directories are
//! not descended into. A mirror that fails half-way is removed again.
//!
//! # Layout
//!
//! ```text
//! root/
//!   analysis.ipynb          → mirror/analysis_diffable.ipynb
//!   data/input.csv          → mirror/data/input.csv (hard link)
//!   mirror/                 (skipped while walking)
//! ```

use crate::notebook::read_notebook;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name of the mirror directory created inside the mirrored root.
pub const MIRROR_DIR_NAME: &str = "mirror";

/// Suffix appended to a notebook's root name in the mirror.
pub const DIFFABLE_SUFFIX: &str = "_diffable";

/// Result of mirroring one directory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorSummary {
    /// Root of the created mirror.
    pub mirror_root: PathBuf,
    /// Notebooks written as diffable sources.
    pub notebooks: usize,
    /// Other files hard-linked into the mirror.
    pub linked: usize,
}

/// Path of the mirror for `root`.
pub fn mirror_path(root: &Path) -> PathBuf {
    root.join(MIRROR_DIR_NAME)
}

/// Mirror file name for `file_name` (`a.ipynb` → `a_diffable.ipynb`).
///
/// Returns `None` for files that are not notebooks. A name made only of
/// dots before the extension (`.ipynb`) is a hidden file, not a notebook.
pub fn diffable_file_name(file_name: &str) -> Option<String> {
    let stem = file_name.strip_suffix(".ipynb")?;
    if stem.chars().all(|c| c == '.') {
        return None;
    }
    Some(format!("{stem}{DIFFABLE_SUFFIX}.ipynb"))
}

/// Create the mirror of `root`.
///
/// Fails with `AlreadyExists` when `root/mirror` is already present.
/// Entries are processed in sorted order. On any later failure the partial
/// mirror is removed, so the call can simply be retried.
pub fn create_mirror(root: &Path) -> io::Result<MirrorSummary> {
    if !root.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("not a directory: {}", root.display()),
        ));
    }
    let mirror_root = mirror_path(root);
    if mirror_root.exists() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("mirror already exists: {}", mirror_root.display()),
        ));
    }

    let mut files = Vec::new();
    collect_files(root, root, &mut files)?;
    files.sort();

    fs::create_dir(&mirror_root)?;
    match populate_mirror(root, &mirror_root, files) {
        Ok(summary) => Ok(summary),
        Err(err) => {
            if let Err(cleanup) = fs::remove_dir_all(&mirror_root) {
                warn!(mirror = %mirror_root.display(), %cleanup, "failed to remove partial mirror");
            }
            Err(err)
        }
    }
}

/// Remove the mirror of `root` if present.
pub fn remove_mirror(root: &Path) -> io::Result<()> {
    let mirror_root = mirror_path(root);
    if mirror_root.exists() {
        fs::remove_dir_all(&mirror_root)?;
    }
    Ok(())
}

fn populate_mirror(
    root: &Path,
    mirror_root: &Path,
    files: Vec<PathBuf>,
) -> io::Result<MirrorSummary> {
    let mut summary = MirrorSummary {
        mirror_root: mirror_root.to_path_buf(),
        notebooks: 0,
        linked: 0,
    };

    for relative in files {
        let src = root.join(&relative);
        let dst_dir = match relative.parent() {
            Some(parent) => mirror_root.join(parent),
            None => mirror_root.to_path_buf(),
        };
        fs::create_dir_all(&dst_dir)?;

        let file_name = relative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match diffable_file_name(&file_name) {
            Some(diffable) => {
                let notebook = read_notebook(&src)?;
                let dst = dst_dir.join(diffable);
                fs::write(&dst, notebook.diffable_source())?;
                debug!(src = %src.display(), dst = %dst.display(), "wrote diffable notebook");
                summary.notebooks += 1;
            }
            None => {
                let dst = dst_dir.join(&file_name);
                // `hard_link` would link the symlink itself; link its target.
                let target = if fs::symlink_metadata(&src)?.file_type().is_symlink() {
                    fs::canonicalize(&src)?
                } else {
                    src.clone()
                };
                fs::hard_link(&target, &dst)?;
                debug!(src = %src.display(), dst = %dst.display(), "hard-linked file");
                summary.linked += 1;
            }
        }
    }

    Ok(summary)
}

/// Collect files under `dir`, relative to `root`.
///
/// Symlinks count as files when they resolve to one; dangling links and
/// links to directories are skipped.
fn collect_files(root: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            if dir == root && entry.file_name() == MIRROR_DIR_NAME {
                continue;
            }
            collect_files(root, &path, out)?;
        } else if file_type.is_file() || (file_type.is_symlink() && resolves_to_file(&path)) {
            let relative = path
                .strip_prefix(root)
                .map_err(|e| io::Error::other(format!("strip prefix: {e}")))?;
            out.push(relative.to_path_buf());
        }
    }
    Ok(())
}

fn resolves_to_file(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) => meta.is_file(),
        Err(err) => {
            debug!(path = %path.display(), %err, "skipping dangling symlink");
            false
        }
    }
}
