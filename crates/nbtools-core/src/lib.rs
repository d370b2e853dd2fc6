//! Core building blocks for the nbtools utilities.
//!
//! # Overview
//!
//! Everything here is pure data handling with no subprocesses:
//!
//! - [`notebook`]: read notebook JSON and render the diffable cell-source
//!   representation used by `nbcatsrc` and the directory mirror.
//! - [`normalize`]: strip non-deterministic substrings (memory addresses)
//!   from rendered text.
//! - [`textdiff`]: line-level diff between two normalized documents.
//! - [`mirror`]: mirror a directory tree with notebooks replaced by their
//!   diffable representation.
//!
//! The validation pipeline in `nbtools-validate` composes [`normalize`] and
//! [`textdiff`] with the render and image comparison adapters.

pub mod mirror;
pub mod normalize;
pub mod notebook;
pub mod textdiff;
