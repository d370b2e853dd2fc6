//! Line diff between the actual and expected rendered text.
//!
//! The diff algorithm itself is `similar`'s; this module only shapes its
//! output into hunks the report can render. Lines are tagged from the point
//! of view of the validation run: present only in the freshly executed
//! render ([`LineTag::ActualOnly`]), only in the stored render
//! ([`LineTag::ExpectedOnly`]), or in both ([`LineTag::Unchanged`]).

use similar::{ChangeTag, TextDiff as SimilarDiff};

/// Unchanged lines kept around each change.
pub const CONTEXT_LINES: usize = 3;

/// Which side(s) of the comparison a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTag {
    Unchanged,
    ActualOnly,
    ExpectedOnly,
}

/// One line of a hunk, without its line terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    pub tag: LineTag,
    pub content: String,
}

/// A contiguous group of changes with surrounding context.
///
/// Line numbers are 1-based; a zero-length range keeps the start of the
/// position it would occupy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffHunk {
    pub actual_start: usize,
    pub actual_len: usize,
    pub expected_start: usize,
    pub expected_len: usize,
    pub lines: Vec<DiffLine>,
}

impl DiffHunk {
    /// Unified-diff style range header, e.g. `@@ -3,7 +3,6 @@`.
    pub fn header(&self) -> String {
        format!(
            "@@ -{},{} +{},{} @@",
            self.actual_start, self.actual_len, self.expected_start, self.expected_len
        )
    }
}

/// Structured diff between two texts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextDiff {
    hunks: Vec<DiffHunk>,
}

impl TextDiff {
    pub fn hunks(&self) -> &[DiffHunk] {
        &self.hunks
    }

    /// True when both texts are line-for-line identical.
    pub fn is_unchanged(&self) -> bool {
        self.hunks.is_empty()
    }

    /// Count of lines present on one side only.
    pub fn changed_line_count(&self) -> usize {
        self.hunks
            .iter()
            .flat_map(|h| h.lines.iter())
            .filter(|l| l.tag != LineTag::Unchanged)
            .count()
    }
}

/// Diff `actual` against `expected`, line by line.
pub fn diff_text(actual: &str, expected: &str) -> TextDiff {
    let diff = SimilarDiff::from_lines(actual, expected);
    let mut hunks = Vec::new();

    for group in diff.grouped_ops(CONTEXT_LINES) {
        let (Some(first), Some(last)) = (group.first(), group.last()) else {
            continue;
        };
        let actual_range = first.old_range().start..last.old_range().end;
        let expected_range = first.new_range().start..last.new_range().end;

        let mut lines = Vec::new();
        for op in &group {
            for change in diff.iter_changes(op) {
                let tag = match change.tag() {
                    ChangeTag::Equal => LineTag::Unchanged,
                    ChangeTag::Delete => LineTag::ActualOnly,
                    ChangeTag::Insert => LineTag::ExpectedOnly,
                };
                lines.push(DiffLine {
                    tag,
                    content: change
                        .value()
                        .trim_end_matches(|c| c == '\n' || c == '\r')
                        .to_string(),
                });
            }
        }

        hunks.push(DiffHunk {
            actual_start: actual_range.start + 1,
            actual_len: actual_range.len(),
            expected_start: expected_range.start + 1,
            expected_len: expected_range.len(),
            lines,
        });
    }

    TextDiff { hunks }
}
