use image::{Rgb, RgbImage};
use nbtools_validate::compare::{
    diff_image_path, ComparisonFailure, ComparisonOutcome, Discrepancy, FailureKind,
    ImageComparator, RmsComparator, IMAGE_TOLERANCE,
};
use nbtools_validate::reconcile::reconcile_images;
use nbtools_validate::{ArtifactPair, RenderedArtifact};
use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

struct Sides {
    _dir: TempDir,
    actual: PathBuf,
    expected: PathBuf,
}

fn sides() -> Sides {
    let dir = tempdir().unwrap();
    let actual = dir.path().join("actual/nb_files");
    let expected = dir.path().join("expected/nb_files");
    fs::create_dir_all(&actual).unwrap();
    fs::create_dir_all(&expected).unwrap();
    Sides {
        _dir: dir,
        actual,
        expected,
    }
}

fn png(dir: &Path, name: &str, w: u32, h: u32, rgb: [u8; 3]) {
    RgbImage::from_pixel(w, h, Rgb(rgb))
        .save(dir.join(name))
        .unwrap();
}

fn artifact(image_dir: &Path) -> RenderedArtifact {
    let names: BTreeSet<String> = fs::read_dir(image_dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    RenderedArtifact::new(
        "/notebooks/nb.ipynb",
        image_dir.with_file_name("nb.rst"),
        String::new(),
        image_dir,
        names,
    )
}

fn pair(sides: &Sides) -> ArtifactPair {
    ArtifactPair::new(artifact(&sides.actual), artifact(&sides.expected)).unwrap()
}

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn one_sided_images_are_set_differences() {
    let s = sides();
    png(&s.actual, "a.png", 2, 2, [0, 0, 0]);
    png(&s.actual, "b.png", 2, 2, [0, 0, 0]);
    png(&s.expected, "b.png", 2, 2, [0, 0, 0]);
    png(&s.expected, "c.png", 2, 2, [0, 0, 0]);

    let result = reconcile_images(&pair(&s), &RmsComparator, IMAGE_TOLERANCE);
    assert_eq!(result.only_in_actual(), &set(&["a.png"]));
    assert_eq!(result.only_in_expected(), &set(&["c.png"]));
    assert_eq!(result.shared_count(), 1);
}

#[test]
fn identical_image_is_omitted_from_buckets() {
    let s = sides();
    png(&s.actual, "b.png", 3, 3, [40, 50, 60]);
    png(&s.expected, "b.png", 3, 3, [40, 50, 60]);

    let result = reconcile_images(&pair(&s), &RmsComparator, IMAGE_TOLERANCE);
    assert!(result.different().is_empty());
    assert!(result.uncomparable().is_empty());
    assert_eq!(result.identical(), &set(&["b.png"]));
    assert!(result.is_clean());
}

#[test]
fn different_image_carries_diff_from_expected_dir() {
    let s = sides();
    png(&s.actual, "b.png", 3, 3, [0, 0, 0]);
    png(&s.expected, "b.png", 3, 3, [0, 0, 90]);

    let result = reconcile_images(&pair(&s), &RmsComparator, IMAGE_TOLERANCE);
    assert_eq!(result.different().len(), 1);
    let different = &result.different()[0];
    assert_eq!(different.filename, "b.png");
    assert!(different.rms > IMAGE_TOLERANCE);

    let diff_path = s.expected.join("b-failed-diff.png");
    assert!(diff_path.is_file());
    assert_eq!(different.diff_image.bytes(), fs::read(&diff_path).unwrap());
    assert_eq!(
        different.actual_image.bytes(),
        fs::read(s.actual.join("b.png")).unwrap()
    );
    assert!(!result.is_clean());
}

#[test]
fn size_mismatch_is_uncomparable_and_run_continues() {
    let s = sides();
    png(&s.actual, "b.png", 3, 3, [0, 0, 0]);
    png(&s.expected, "b.png", 4, 3, [0, 0, 0]);
    png(&s.actual, "e.png", 2, 2, [9, 9, 9]);
    png(&s.expected, "e.png", 2, 2, [9, 9, 9]);

    let result = reconcile_images(&pair(&s), &RmsComparator, IMAGE_TOLERANCE);
    assert_eq!(result.uncomparable().len(), 1);
    let failed = &result.uncomparable()[0];
    assert_eq!(failed.filename, "b.png");
    assert_eq!(failed.kind, FailureKind::Incompatible);
    assert!(failed.detail.contains("do not match"));
    assert!(failed.actual_image.is_some());
    assert!(failed.expected_image.is_some());
    assert_eq!(result.identical(), &set(&["e.png"]));
}

#[derive(Clone, Copy)]
enum Verdict {
    Same,
    Differ,
    DifferWithoutDiffFile,
    Fail,
}

/// Comparator returning preset verdicts and recording call order.
struct Scripted {
    verdicts: HashMap<String, Verdict>,
    calls: RefCell<Vec<String>>,
}

impl Scripted {
    fn new(verdicts: &[(&str, Verdict)]) -> Self {
        Scripted {
            verdicts: verdicts
                .iter()
                .map(|(name, v)| (name.to_string(), *v))
                .collect(),
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl ImageComparator for Scripted {
    fn compare(
        &self,
        actual: &Path,
        expected: &Path,
        tolerance: f64,
    ) -> Result<ComparisonOutcome, ComparisonFailure> {
        assert_eq!(tolerance, IMAGE_TOLERANCE);
        let name = actual.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(expected.file_name().unwrap().to_string_lossy(), name);
        self.calls.borrow_mut().push(name.clone());

        let discrepancy = |diff_image: PathBuf| Discrepancy {
            rms: 12.5,
            tolerance,
            diff_image,
            summary: "scripted difference".to_string(),
        };
        match self.verdicts[&name] {
            Verdict::Same => Ok(ComparisonOutcome::Identical),
            Verdict::Differ => {
                let diff = diff_image_path(expected);
                fs::write(&diff, b"diff-bytes").unwrap();
                Ok(ComparisonOutcome::Different(discrepancy(diff)))
            }
            Verdict::DifferWithoutDiffFile => Ok(ComparisonOutcome::Different(discrepancy(
                diff_image_path(expected),
            ))),
            Verdict::Fail => Err(ComparisonFailure::SizeMismatch {
                actual: (1, 1),
                expected: (2, 2),
            }),
        }
    }
}

fn touch(dir: &Path, names: &[&str]) {
    for name in names {
        fs::write(dir.join(name), name.as_bytes()).unwrap();
    }
}

#[test]
fn failure_in_one_pair_does_not_stop_others() {
    let s = sides();
    let shared = ["a.png", "b.png", "c.png", "d.png"];
    touch(&s.actual, &shared);
    touch(&s.expected, &shared);

    let comparator = Scripted::new(&[
        ("a.png", Verdict::Fail),
        ("b.png", Verdict::Differ),
        ("c.png", Verdict::Same),
        ("d.png", Verdict::Fail),
    ]);
    let result = reconcile_images(&pair(&s), &comparator, IMAGE_TOLERANCE);

    assert_eq!(*comparator.calls.borrow(), vec!["a.png", "b.png", "c.png", "d.png"]);
    let uncomparable: Vec<&str> = result
        .uncomparable()
        .iter()
        .map(|u| u.filename.as_str())
        .collect();
    assert_eq!(uncomparable, vec!["a.png", "d.png"]);
    assert_eq!(result.different().len(), 1);
    assert_eq!(result.different()[0].filename, "b.png");
    assert_eq!(result.different()[0].diff_image.bytes(), b"diff-bytes");
    assert_eq!(result.different()[0].rms, 12.5);
    assert_eq!(result.identical(), &set(&["c.png"]));
}

#[test]
fn missing_diff_file_downgrades_to_uncomparable() {
    let s = sides();
    touch(&s.actual, &["b.png"]);
    touch(&s.expected, &["b.png"]);

    let comparator = Scripted::new(&[("b.png", Verdict::DifferWithoutDiffFile)]);
    let result = reconcile_images(&pair(&s), &comparator, IMAGE_TOLERANCE);

    assert!(result.different().is_empty());
    assert_eq!(result.uncomparable().len(), 1);
    let failed = &result.uncomparable()[0];
    assert_eq!(failed.kind, FailureKind::Io);
    assert!(failed.detail.contains("scripted difference"));
}

#[test]
fn filenames_partition_across_all_buckets() {
    let s = sides();
    touch(&s.actual, &["a1.png", "s1.png", "s2.png", "s3.png"]);
    touch(&s.expected, &["e1.png", "e2.png", "s1.png", "s2.png", "s3.png"]);

    let comparator = Scripted::new(&[
        ("s1.png", Verdict::Same),
        ("s2.png", Verdict::Differ),
        ("s3.png", Verdict::Fail),
    ]);
    let result = reconcile_images(&pair(&s), &comparator, IMAGE_TOLERANCE);

    let mut seen: Vec<String> = Vec::new();
    seen.extend(result.only_in_actual().iter().cloned());
    seen.extend(result.only_in_expected().iter().cloned());
    seen.extend(result.identical().iter().cloned());
    seen.extend(result.different().iter().map(|d| d.filename.clone()));
    seen.extend(result.uncomparable().iter().map(|u| u.filename.clone()));

    let unique: BTreeSet<String> = seen.iter().cloned().collect();
    assert_eq!(unique.len(), seen.len(), "buckets must be disjoint");
    assert_eq!(
        unique,
        set(&["a1.png", "e1.png", "e2.png", "s1.png", "s2.png", "s3.png"])
    );
    assert_eq!(result.shared_count(), 3);
}
