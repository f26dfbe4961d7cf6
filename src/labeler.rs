//! Sequence labeler boundary.
//!
//! The labeler itself is an external program. This module owns everything on
//! our side of the pipe:
//!
//! ```text
//!  rows ─▶ TableWriter ─▶ table file ─▶ Labeler::label ─▶ output file
//!                                                            │
//!  CandidatePool per document ◀─── read_labeled ◀────────────┘
//! ```
//!
//! Several documents can share one table: each starts with a file marker row,
//! and [`read_labeled`] splits the output back on those markers.

#[path = "labeler/output.rs"]
mod output;
#[path = "labeler/table.rs"]
mod table;
#[path = "labeler/templates.rs"]
mod templates;
#[path = "labeler/wapiti.rs"]
mod wapiti;

pub use output::{LabeledDocument, read_labeled};
pub use table::TableWriter;
pub use templates::render_templates;
pub use wapiti::WapitiLabeler;

use crate::error::Result;
use std::path::Path;

/// A CRF sequence labeler working on feature table files.
pub trait Labeler: Send + Sync {
    /// Label the table at `input`, writing one labeled line per input line to
    /// `output`.
    fn label(&self, input: &Path, output: &Path) -> Result<()>;

    /// Train a model from a training and a development table.
    fn train(&self, train: &Path, dev: &Path, templates: &Path, model: &Path) -> Result<()>;
}
