//! Self-contained HTML validation report.
//!
//! # Sections
//!
//! | Section | Content |
//! |---|---|
//! | Text | Hunks of the normalized text diff |
//! | Images only in actual / expected | File name lists |
//! | Different images | Actual, expected and visual diff, RMS verdict |
//! | Uncomparable images | Actual and expected, failure detail |
//!
//! Images are embedded as base64 data URIs so the file can be moved or
//! attached anywhere. Identical images are not shown.

use crate::reconcile::{ImageBytes, ImageReconciliation};
use base64::Engine as _;
use nbtools_core::textdiff::{LineTag, TextDiff};
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::Path;

const STYLE: &str = "\
body { font-family: sans-serif; margin: 2em; color: #222; }
h2 { border-bottom: 1px solid #ccc; padding-bottom: 0.2em; }
table.diff { border-collapse: collapse; font-family: monospace; width: 100%; }
table.diff td { padding: 0 0.5em; vertical-align: top; }
table.diff pre { margin: 0; white-space: pre-wrap; }
tr.hunk td { background: #eef; color: #558; }
tr.actual-only { background: #fdd; }
tr.expected-only { background: #dfd; }
td.sign { width: 1em; color: #888; }
table.images td { padding: 0.5em; text-align: center; vertical-align: top; }
table.images img { max-width: 480px; border: 1px solid #ccc; }
p.ok { color: #262; }
pre.failure { background: #f6f6f6; padding: 0.5em; overflow-x: auto; }
code.digest { color: #888; font-size: 0.8em; }";

/// Counts describing a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ValidationSummary {
    pub text_hunks: usize,
    pub text_changed_lines: usize,
    pub only_in_actual: usize,
    pub only_in_expected: usize,
    pub different: usize,
    pub uncomparable: usize,
    pub identical: usize,
}

impl ValidationSummary {
    /// True when anything at all differs between the two renders.
    pub fn has_differences(&self) -> bool {
        self.text_hunks > 0
            || self.only_in_actual > 0
            || self.only_in_expected > 0
            || self.different > 0
            || self.uncomparable > 0
    }
}

/// Text diff and image reconciliation of one notebook.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    notebook: String,
    text_diff: TextDiff,
    images: ImageReconciliation,
}

impl ValidationReport {
    pub fn new(
        notebook: impl Into<String>,
        text_diff: TextDiff,
        images: ImageReconciliation,
    ) -> Self {
        ValidationReport {
            notebook: notebook.into(),
            text_diff,
            images,
        }
    }

    pub fn notebook(&self) -> &str {
        &self.notebook
    }

    pub fn text_diff(&self) -> &TextDiff {
        &self.text_diff
    }

    pub fn images(&self) -> &ImageReconciliation {
        &self.images
    }

    pub fn summary(&self) -> ValidationSummary {
        ValidationSummary {
            text_hunks: self.text_diff.hunks().len(),
            text_changed_lines: self.text_diff.changed_line_count(),
            only_in_actual: self.images.only_in_actual().len(),
            only_in_expected: self.images.only_in_expected().len(),
            different: self.images.different().len(),
            uncomparable: self.images.uncomparable().len(),
            identical: self.images.identical().len(),
        }
    }

    /// Write the rendered HTML to `path`.
    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        fs::write(path, self.render_html())
    }

    /// Render the full HTML document.
    pub fn render_html(&self) -> String {
        let mut buf = String::new();
        let name = escape_html(&self.notebook);

        let _ = writeln!(buf, "<!DOCTYPE html>");
        let _ = writeln!(buf, "<html>");
        let _ = writeln!(buf, "<head>");
        let _ = writeln!(buf, "<meta charset=\"utf-8\">");
        let _ = writeln!(buf, "<title>Validation report: {name}</title>");
        let _ = writeln!(buf, "<style>\n{STYLE}\n</style>");
        let _ = writeln!(buf, "</head>");
        let _ = writeln!(buf, "<body>");
        let _ = writeln!(buf, "<h1>Validation report: {name}</h1>");

        self.render_text_section(&mut buf);
        render_name_list(&mut buf, "Images only in actual", self.images.only_in_actual());
        render_name_list(
            &mut buf,
            "Images only in expected",
            self.images.only_in_expected(),
        );
        self.render_different_section(&mut buf);
        self.render_uncomparable_section(&mut buf);

        let _ = writeln!(buf, "</body>");
        let _ = writeln!(buf, "</html>");
        buf
    }

    fn render_text_section(&self, buf: &mut String) {
        let _ = writeln!(buf, "<h2>Text</h2>");
        if self.text_diff.is_unchanged() {
            let _ = writeln!(buf, "<p class=\"ok\">No differences in rendered text.</p>");
            return;
        }
        let _ = writeln!(
            buf,
            "<p>Lines marked <code>-</code> appear only in the executed notebook, \
             lines marked <code>+</code> only in the stored output.</p>"
        );
        let _ = writeln!(buf, "<table class=\"diff\">");
        for hunk in self.text_diff.hunks() {
            let _ = writeln!(
                buf,
                "<tr class=\"hunk\"><td colspan=\"2\">{}</td></tr>",
                hunk.header()
            );
            for line in &hunk.lines {
                let (class, sign) = match line.tag {
                    LineTag::Unchanged => ("unchanged", " "),
                    LineTag::ActualOnly => ("actual-only", "-"),
                    LineTag::ExpectedOnly => ("expected-only", "+"),
                };
                let _ = writeln!(
                    buf,
                    "<tr class=\"{class}\"><td class=\"sign\">{sign}</td><td><pre>{}</pre></td></tr>",
                    escape_html(&line.content)
                );
            }
        }
        let _ = writeln!(buf, "</table>");
    }

    fn render_different_section(&self, buf: &mut String) {
        let _ = writeln!(buf, "<h2>Different images</h2>");
        if self.images.different().is_empty() {
            let _ = writeln!(buf, "<p class=\"ok\">None.</p>");
            return;
        }
        for image in self.images.different() {
            let _ = writeln!(buf, "<h3>{}</h3>", escape_html(&image.filename));
            let _ = writeln!(buf, "<p>{}</p>", escape_html(&image.summary));
            let _ = writeln!(buf, "<table class=\"images\">");
            let _ = writeln!(
                buf,
                "<tr><th>Actual</th><th>Expected</th><th>Difference</th></tr>"
            );
            let _ = write!(buf, "<tr>");
            render_image_cell(buf, &image.filename, Some(&image.actual_image));
            render_image_cell(buf, &image.filename, Some(&image.expected_image));
            render_image_cell(buf, &image.filename, Some(&image.diff_image));
            let _ = writeln!(buf, "</tr>");
            let _ = writeln!(buf, "</table>");
        }
    }

    fn render_uncomparable_section(&self, buf: &mut String) {
        let _ = writeln!(buf, "<h2>Uncomparable images</h2>");
        if self.images.uncomparable().is_empty() {
            let _ = writeln!(buf, "<p class=\"ok\">None.</p>");
            return;
        }
        for image in self.images.uncomparable() {
            let _ = writeln!(buf, "<h3>{}</h3>", escape_html(&image.filename));
            let _ = writeln!(buf, "<p>Comparison failed ({}).</p>", image.kind.label());
            let _ = writeln!(buf, "<table class=\"images\">");
            let _ = writeln!(buf, "<tr><th>Actual</th><th>Expected</th></tr>");
            let _ = write!(buf, "<tr>");
            render_image_cell(buf, &image.filename, image.actual_image.as_ref());
            render_image_cell(buf, &image.filename, image.expected_image.as_ref());
            let _ = writeln!(buf, "</tr>");
            let _ = writeln!(buf, "</table>");
            let _ = writeln!(
                buf,
                "<pre class=\"failure\">{}</pre>",
                escape_html(&image.detail)
            );
        }
    }
}

fn render_name_list<'a>(
    buf: &mut String,
    title: &str,
    names: impl IntoIterator<Item = &'a String>,
) {
    let _ = writeln!(buf, "<h2>{title}</h2>");
    let mut names = names.into_iter().peekable();
    if names.peek().is_none() {
        let _ = writeln!(buf, "<p class=\"ok\">None.</p>");
        return;
    }
    let _ = writeln!(buf, "<ul>");
    for name in names {
        let _ = writeln!(buf, "<li>{}</li>", escape_html(name));
    }
    let _ = writeln!(buf, "</ul>");
}

fn render_image_cell(buf: &mut String, filename: &str, image: Option<&ImageBytes>) {
    match image {
        Some(image) => {
            let _ = write!(
                buf,
                "<td><img src=\"{}\" alt=\"{}\"><br><code class=\"digest\">{}</code></td>",
                data_uri(filename, image.bytes()),
                escape_html(filename),
                image.short_digest()
            );
        }
        None => {
            let _ = write!(buf, "<td><em>unreadable</em></td>");
        }
    }
}

/// `data:` URI embedding `bytes`, typed from the extension of `filename`.
pub fn data_uri(filename: &str, bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{};base64,{encoded}", mime_type(filename))
}

/// MIME type guessed from the file extension.
pub fn mime_type(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "svg" => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

/// Escape text for inclusion in HTML element content or attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
