//! Notebook documents and their diffable cell-source representation.
//!
//! Only the parts of the notebook format needed to extract sources are
//! modelled: the ordered `cells` list, each cell's `cell_type` and `source`.
//! Outputs, metadata and execution counts are ignored on read.
//!
//! # Diffable representation
//!
//! ```text
//! --- markdown -----------------------------------------------------------------
//! # Title
//! --- code ---------------------------------------------------------------------
//! print(1)
//! ```
//!
//! Every cell gets a header line padded with `-` to [`HEADER_WIDTH`]
//! characters followed by its source and a newline. Cells that are not
//! markdown use the code header.

use serde::Deserialize;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Width of the per-cell header line in the diffable representation.
pub const HEADER_WIDTH: usize = 78;

/// A notebook document, reduced to its cells.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Notebook {
    pub cells: Vec<Cell>,
}

/// A single notebook cell.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Cell {
    pub cell_type: CellType,
    #[serde(default)]
    pub source: CellSource,
}

/// Kind of a notebook cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    Markdown,
    Code,
    Raw,
    #[serde(other)]
    Other,
}

/// Cell source text.
///
/// The notebook format stores sources either as one string or as a list of
/// line fragments that concatenate to the full text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CellSource {
    Text(String),
    Lines(Vec<String>),
}

impl Default for CellSource {
    fn default() -> Self {
        CellSource::Text(String::new())
    }
}

impl CellSource {
    /// Full source text of the cell.
    pub fn text(&self) -> String {
        match self {
            CellSource::Text(text) => text.clone(),
            CellSource::Lines(lines) => lines.concat(),
        }
    }
}

impl Cell {
    /// Header line introducing this cell in the diffable representation.
    pub fn header(&self) -> String {
        let label = match self.cell_type {
            CellType::Markdown => "--- markdown ",
            _ => "--- code ",
        };
        let mut header = String::with_capacity(HEADER_WIDTH);
        header.push_str(label);
        while header.len() < HEADER_WIDTH {
            header.push('-');
        }
        header
    }
}

impl Notebook {
    /// Parse a notebook from any reader yielding its JSON document.
    pub fn from_reader(reader: impl Read) -> io::Result<Self> {
        serde_json::from_reader(reader).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid notebook JSON: {e}"),
            )
        })
    }

    /// Diffable representation: cell headers and sources, outputs dropped.
    pub fn diffable_source(&self) -> String {
        let mut out = String::new();
        for cell in &self.cells {
            let _ = writeln!(out, "{}", cell.header());
            let _ = writeln!(out, "{}", cell.source.text());
        }
        out
    }
}

/// Read and parse the notebook at `path`.
pub fn read_notebook(path: &Path) -> io::Result<Notebook> {
    let file = fs::File::open(path)?;
    Notebook::from_reader(io::BufReader::new(file)).map_err(|e| {
        io::Error::new(e.kind(), format!("{}: {e}", path.display()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const NOTEBOOK: &str = r##"{
        "cells": [
            {"cell_type": "markdown", "metadata": {}, "source": ["# Title\n", "Some text"]},
            {"cell_type": "code", "execution_count": 1, "metadata": {},
             "outputs": [{"output_type": "stream", "name": "stdout", "text": ["1\n"]}],
             "source": "print(1)"},
            {"cell_type": "raw", "metadata": {}, "source": []}
        ],
        "metadata": {},
        "nbformat": 4,
        "nbformat_minor": 0
    }"##;

    fn parse(json: &str) -> Notebook {
        Notebook::from_reader(Cursor::new(json)).unwrap()
    }

    #[test]
    fn parses_string_and_list_sources() {
        let nb = parse(NOTEBOOK);
        assert_eq!(nb.cells.len(), 3);
        assert_eq!(nb.cells[0].cell_type, CellType::Markdown);
        assert_eq!(nb.cells[0].source.text(), "# Title\nSome text");
        assert_eq!(nb.cells[1].source.text(), "print(1)");
        assert_eq!(nb.cells[2].source.text(), "");
    }

    #[test]
    fn unknown_cell_type_is_tolerated() {
        let nb = parse(r#"{"cells": [{"cell_type": "heading", "source": "x"}]}"#);
        assert_eq!(nb.cells[0].cell_type, CellType::Other);
    }

    #[test]
    fn missing_source_defaults_to_empty() {
        let nb = parse(r#"{"cells": [{"cell_type": "code"}]}"#);
        assert_eq!(nb.cells[0].source.text(), "");
    }

    #[test]
    fn headers_are_padded_to_fixed_width() {
        let nb = parse(NOTEBOOK);
        for cell in &nb.cells {
            assert_eq!(cell.header().len(), HEADER_WIDTH);
        }
        assert!(nb.cells[0].header().starts_with("--- markdown ---"));
        assert!(nb.cells[1].header().starts_with("--- code ---"));
    }

    #[test]
    fn raw_cells_use_code_header() {
        let nb = parse(NOTEBOOK);
        assert!(nb.cells[2].header().starts_with("--- code "));
    }

    #[test]
    fn diffable_source_drops_outputs() {
        let text = parse(NOTEBOOK).diffable_source();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].starts_with("--- markdown "));
        assert_eq!(lines[1], "# Title");
        assert_eq!(lines[2], "Some text");
        assert!(lines[3].starts_with("--- code "));
        assert_eq!(lines[4], "print(1)");
        assert!(!text.contains("stdout"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn invalid_json_is_invalid_data() {
        let err = Notebook::from_reader(Cursor::new("{not json")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("invalid notebook JSON"));
    }

    #[test]
    fn missing_cells_is_rejected() {
        assert!(Notebook::from_reader(Cursor::new(r#"{"metadata": {}}"#)).is_err());
    }
}
