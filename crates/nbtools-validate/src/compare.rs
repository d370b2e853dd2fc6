//! Pixel comparison of two rendered images.
//!
//! # Overview
//!
//! [`ImageComparator`] is the seam between the reconciler and the pixel
//! comparison primitive. A comparison has two outcomes:
//!
//! - `Ok(ComparisonOutcome::Identical)`: RMS difference within tolerance.
//! - `Ok(ComparisonOutcome::Different(..))`: a numeric verdict above
//!   tolerance, with a visual diff image written next to the expected file.
//!
//! When no verdict can be produced at all (undecodable file, dimension
//! mismatch, I/O error) the comparator returns `Err(ComparisonFailure)`.
//! The reconciler turns that into an "uncomparable" entry.
//!
//! # RMS
//!
//! Both images are converted to 8-bit RGB. With `n` channel values,
//! `rms = sqrt(sum((a_i - e_i)^2) / n)`. The visual diff stores
//! `min(|a_i - e_i| * 10, 255)` per channel.

use image::{Rgb, RgbImage};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Tolerance used by the validation pipeline.
pub const IMAGE_TOLERANCE: f64 = 0.001;

/// Marker inserted between an image's root name and its extension to name
/// the visual diff.
pub const DIFF_MARKER: &str = "-failed-diff";

const DIFF_AMPLIFICATION: u16 = 10;

/// Visual diff file name for `filename` (`foo.png` → `foo-failed-diff.png`).
pub fn diff_image_name(filename: &str) -> String {
    let path = Path::new(filename);
    let rootname = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match path.extension() {
        Some(ext) => format!("{rootname}{DIFF_MARKER}.{}", ext.to_string_lossy()),
        None => format!("{rootname}{DIFF_MARKER}"),
    }
}

/// Visual diff path for the image at `image`, in the same directory.
pub fn diff_image_path(image: &Path) -> PathBuf {
    let name = image
        .file_name()
        .map(|n| diff_image_name(&n.to_string_lossy()))
        .unwrap_or_else(|| diff_image_name(""));
    image.with_file_name(name)
}

/// Verdict of a completed comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum ComparisonOutcome {
    Identical,
    Different(Discrepancy),
}

/// Quantified difference between two images of equal size.
#[derive(Debug, Clone, PartialEq)]
pub struct Discrepancy {
    /// Root-mean-square difference over all channel values.
    pub rms: f64,
    pub tolerance: f64,
    /// Visual diff written by the comparator.
    pub diff_image: PathBuf,
    /// One-line human readable verdict.
    pub summary: String,
}

/// Coarse category of a [`ComparisonFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The images themselves cannot be compared (size, format).
    Incompatible,
    /// Reading or writing image files failed.
    Io,
}

impl FailureKind {
    pub fn label(self) -> &'static str {
        match self {
            FailureKind::Incompatible => "incompatible images",
            FailureKind::Io => "i/o error",
        }
    }
}

/// The comparison could not produce a verdict.
#[derive(Debug, thiserror::Error)]
pub enum ComparisonFailure {
    #[error("cannot read image {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot decode image {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error(
        "image sizes do not match: actual {}x{}, expected {}x{}",
        actual.0, actual.1, expected.0, expected.1
    )]
    SizeMismatch {
        actual: (u32, u32),
        expected: (u32, u32),
    },

    #[error("cannot write diff image {}", path.display())]
    WriteDiff {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

impl ComparisonFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            ComparisonFailure::Decode { .. } | ComparisonFailure::SizeMismatch { .. } => {
                FailureKind::Incompatible
            }
            ComparisonFailure::Read { .. } | ComparisonFailure::WriteDiff { .. } => {
                FailureKind::Io
            }
        }
    }

    /// Error message followed by every underlying cause, one per line.
    pub fn detail(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            out.push_str("\n  caused by: ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }
}

/// Compares two image files.
pub trait ImageComparator {
    fn compare(
        &self,
        actual: &Path,
        expected: &Path,
        tolerance: f64,
    ) -> Result<ComparisonOutcome, ComparisonFailure>;
}

/// RMS pixel comparator backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct RmsComparator;

impl ImageComparator for RmsComparator {
    fn compare(
        &self,
        actual: &Path,
        expected: &Path,
        tolerance: f64,
    ) -> Result<ComparisonOutcome, ComparisonFailure> {
        let actual_img = load_rgb(actual)?;
        let expected_img = load_rgb(expected)?;

        if actual_img.dimensions() != expected_img.dimensions() {
            return Err(ComparisonFailure::SizeMismatch {
                actual: actual_img.dimensions(),
                expected: expected_img.dimensions(),
            });
        }

        let rms = rms_difference(&actual_img, &expected_img);
        debug!(actual = %actual.display(), rms, tolerance, "compared images");
        if rms <= tolerance {
            return Ok(ComparisonOutcome::Identical);
        }

        let diff_path = diff_image_path(expected);
        visual_diff(&actual_img, &expected_img)
            .save(&diff_path)
            .map_err(|source| ComparisonFailure::WriteDiff {
                path: diff_path.clone(),
                source,
            })?;

        Ok(ComparisonOutcome::Different(Discrepancy {
            rms,
            tolerance,
            diff_image: diff_path,
            summary: format!("images differ: RMS {rms:.4} exceeds tolerance {tolerance}"),
        }))
    }
}

fn load_rgb(path: &Path) -> Result<RgbImage, ComparisonFailure> {
    let bytes = fs::read(path).map_err(|source| ComparisonFailure::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = image::load_from_memory(&bytes).map_err(|source| ComparisonFailure::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decoded.to_rgb8())
}

/// RMS difference of two images with equal dimensions.
pub fn rms_difference(a: &RgbImage, b: &RgbImage) -> f64 {
    let a = a.as_raw();
    let b = b.as_raw();
    if a.is_empty() {
        return 0.0;
    }
    let sum: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = f64::from(x) - f64::from(y);
            d * d
        })
        .sum();
    (sum / a.len() as f64).sqrt()
}

fn visual_diff(a: &RgbImage, b: &RgbImage) -> RgbImage {
    RgbImage::from_fn(a.width(), a.height(), |x, y| {
        let pa = a.get_pixel(x, y);
        let pb = b.get_pixel(x, y);
        let mut out = [0u8; 3];
        for (c, slot) in out.iter_mut().enumerate() {
            let delta = u16::from(pa[c].abs_diff(pb[c])) * DIFF_AMPLIFICATION;
            *slot = delta.min(255) as u8;
        }
        Rgb(out)
    })
}
