//! Reconciliation of the actual and expected image sets.
//!
//! # Algorithm
//!
//! ```text
//! only_in_actual   = actual − expected
//! only_in_expected = expected − actual
//! for name in actual ∩ expected (sorted):
//!     compare(actual/name, expected/name, tolerance)
//!         Identical        → identical
//!         Different(..)    → different (+ expected/<root>-failed-diff<ext>)
//!         Err(failure)     → uncomparable (+ failure detail)
//! ```
//!
//! # Invariants
//!
//! - Every filename lands in exactly one of only_in_actual,
//!   only_in_expected, identical, different, uncomparable.
//! - A failing comparison never stops the remaining ones: failures are
//!   recorded as data, never returned.

use crate::artifact::ArtifactPair;
use crate::compare::{diff_image_path, ComparisonOutcome, FailureKind, ImageComparator};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

/// Raw image bytes with their BLAKE3 digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBytes {
    bytes: Vec<u8>,
    digest: String,
}

impl ImageBytes {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let digest = blake3::hash(&bytes).to_hex().to_string();
        ImageBytes { bytes, digest }
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        Ok(ImageBytes::from_bytes(fs::read(path)?))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Lowercase hex BLAKE3 digest (64 chars).
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn short_digest(&self) -> &str {
        &self.digest[..12]
    }
}

/// Shared image for which no verdict could be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UncomparableImage {
    pub filename: String,
    /// `None` when the file itself could not be read.
    pub actual_image: Option<ImageBytes>,
    pub expected_image: Option<ImageBytes>,
    pub kind: FailureKind,
    /// Failure message and its cause chain.
    pub detail: String,
}

/// Shared image whose RMS difference exceeds the tolerance.
#[derive(Debug, Clone, PartialEq)]
pub struct DifferentImage {
    pub filename: String,
    pub actual_image: ImageBytes,
    pub expected_image: ImageBytes,
    pub diff_image: ImageBytes,
    pub rms: f64,
    pub summary: String,
}

/// Classified result of comparing two image directories.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageReconciliation {
    only_in_actual: BTreeSet<String>,
    only_in_expected: BTreeSet<String>,
    uncomparable: Vec<UncomparableImage>,
    different: Vec<DifferentImage>,
    identical: BTreeSet<String>,
}

impl ImageReconciliation {
    pub fn only_in_actual(&self) -> &BTreeSet<String> {
        &self.only_in_actual
    }

    pub fn only_in_expected(&self) -> &BTreeSet<String> {
        &self.only_in_expected
    }

    /// Uncomparable images, in filename order.
    pub fn uncomparable(&self) -> &[UncomparableImage] {
        &self.uncomparable
    }

    /// Different images, in filename order.
    pub fn different(&self) -> &[DifferentImage] {
        &self.different
    }

    pub fn identical(&self) -> &BTreeSet<String> {
        &self.identical
    }

    /// Number of filenames present on both sides.
    pub fn shared_count(&self) -> usize {
        self.identical.len() + self.different.len() + self.uncomparable.len()
    }

    /// True when both sides hold the same, pixel-identical images.
    pub fn is_clean(&self) -> bool {
        self.only_in_actual.is_empty()
            && self.only_in_expected.is_empty()
            && self.uncomparable.is_empty()
            && self.different.is_empty()
    }
}

/// Compare the image sets of `pair`.
pub fn reconcile_images(
    pair: &ArtifactPair,
    comparator: &dyn ImageComparator,
    tolerance: f64,
) -> ImageReconciliation {
    let actual = pair.actual();
    let expected = pair.expected();
    let actual_names = actual.image_filenames();
    let expected_names = expected.image_filenames();

    let mut result = ImageReconciliation {
        only_in_actual: actual_names.difference(expected_names).cloned().collect(),
        only_in_expected: expected_names.difference(actual_names).cloned().collect(),
        ..ImageReconciliation::default()
    };

    for filename in actual_names.intersection(expected_names) {
        let actual_path = actual.image_path(filename);
        let expected_path = expected.image_path(filename);

        match comparator.compare(&actual_path, &expected_path, tolerance) {
            Ok(ComparisonOutcome::Identical) => {
                debug!(%filename, "image identical");
                result.identical.insert(filename.clone());
            }
            Ok(ComparisonOutcome::Different(discrepancy)) => {
                let diff_path = diff_image_path(&expected_path);
                let loaded = ImageBytes::load(&actual_path).and_then(|a| {
                    let e = ImageBytes::load(&expected_path)?;
                    let d = ImageBytes::load(&diff_path)?;
                    Ok((a, e, d))
                });
                match loaded {
                    Ok((actual_image, expected_image, diff_image)) => {
                        debug!(%filename, rms = discrepancy.rms, "image different");
                        result.different.push(DifferentImage {
                            filename: filename.clone(),
                            actual_image,
                            expected_image,
                            diff_image,
                            rms: discrepancy.rms,
                            summary: discrepancy.summary,
                        });
                    }
                    Err(err) => {
                        let detail = format!(
                            "{}\n  but the compared files could not be read back: {err}",
                            discrepancy.summary
                        );
                        warn!(%filename, %err, "different image unreadable, marking uncomparable");
                        result.uncomparable.push(uncomparable(
                            filename,
                            &actual_path,
                            &expected_path,
                            FailureKind::Io,
                            detail,
                        ));
                    }
                }
            }
            Err(failure) => {
                warn!(%filename, error = %failure, "image uncomparable");
                result.uncomparable.push(uncomparable(
                    filename,
                    &actual_path,
                    &expected_path,
                    failure.kind(),
                    failure.detail(),
                ));
            }
        }
    }

    debug_assert_eq!(
        result.shared_count(),
        actual_names.intersection(expected_names).count()
    );
    info!(
        only_in_actual = result.only_in_actual.len(),
        only_in_expected = result.only_in_expected.len(),
        identical = result.identical.len(),
        different = result.different.len(),
        uncomparable = result.uncomparable.len(),
        "reconciled images"
    );
    result
}

fn uncomparable(
    filename: &str,
    actual_path: &Path,
    expected_path: &Path,
    kind: FailureKind,
    detail: String,
) -> UncomparableImage {
    UncomparableImage {
        filename: filename.to_string(),
        actual_image: ImageBytes::load(actual_path).ok(),
        expected_image: ImageBytes::load(expected_path).ok(),
        kind,
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_blake3_hex() {
        let img = ImageBytes::from_bytes(b"png bytes".to_vec());
        assert_eq!(img.digest().len(), 64);
        assert_eq!(img.digest(), blake3::hash(b"png bytes").to_hex().as_str());
        assert_eq!(img.short_digest().len(), 12);
        assert!(img.digest().starts_with(img.short_digest()));
    }

    #[test]
    fn empty_reconciliation_is_clean() {
        let r = ImageReconciliation::default();
        assert!(r.is_clean());
        assert_eq!(r.shared_count(), 0);
    }
}
