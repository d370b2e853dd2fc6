use crate::error::ValidateError;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Text document and image directory produced by one converter run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    notebook: PathBuf,
    text_path: PathBuf,
    text: String,
    image_dir: PathBuf,
    image_filenames: BTreeSet<String>,
}

impl RenderedArtifact {
    pub fn new(
        notebook: impl Into<PathBuf>,
        text_path: impl Into<PathBuf>,
        text: String,
        image_dir: impl Into<PathBuf>,
        image_filenames: BTreeSet<String>,
    ) -> Self {
        RenderedArtifact {
            notebook: notebook.into(),
            text_path: text_path.into(),
            text,
            image_dir: image_dir.into(),
            image_filenames,
        }
    }

    /// Notebook this artifact was rendered from.
    pub fn notebook(&self) -> &Path {
        &self.notebook
    }

    pub fn text_path(&self) -> &Path {
        &self.text_path
    }

    /// Rendered text as written by the converter (not normalized).
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    /// Image file names, sorted.
    pub fn image_filenames(&self) -> &BTreeSet<String> {
        &self.image_filenames
    }

    pub fn image_path(&self, filename: &str) -> PathBuf {
        self.image_dir.join(filename)
    }
}

/// Actual (freshly executed) and expected (stored output) renders of one
/// notebook.
#[derive(Debug, Clone)]
pub struct ArtifactPair {
    actual: RenderedArtifact,
    expected: RenderedArtifact,
}

impl ArtifactPair {
    /// Pair two renders. Both must come from the same notebook.
    pub fn new(
        actual: RenderedArtifact,
        expected: RenderedArtifact,
    ) -> Result<Self, ValidateError> {
        if actual.notebook() != expected.notebook() {
            return Err(ValidateError::NotebookMismatch {
                actual: actual.notebook().to_path_buf(),
                expected: expected.notebook().to_path_buf(),
            });
        }
        Ok(ArtifactPair { actual, expected })
    }

    pub fn actual(&self) -> &RenderedArtifact {
        &self.actual
    }

    pub fn expected(&self) -> &RenderedArtifact {
        &self.expected
    }

    pub fn notebook(&self) -> &Path {
        self.actual.notebook()
    }
}
