//! Error types for dctfinder.
//!
//! Malformed markup and unparseable dates never surface here: the tokenizer
//! recovers locally and the date parser answers `None`. What remains are the
//! fatal cases (bad rule resources, a failing labeler, I/O), all carried by a
//! single [`Error`] type.

use thiserror::Error;

/// Result type for dctfinder operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for dctfinder operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Missing or malformed rule resource, invalid configuration file.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File-system failure.
    #[error("IO error ({context}): {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// The external sequence labeler could not be run or reported failure.
    #[error("Labeler error: {0}")]
    Labeler(String),

    /// Labeler output that does not follow the feature table format.
    #[error("Format error: {0}")]
    Format(String),

    /// Failure while building the records of one document. The document is
    /// abandoned; no partial page info is produced.
    #[error("Extraction of {document} failed: {source}")]
    Extraction {
        document: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create an I/O error with a short description of what was attempted.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io { context: context.into(), source }
    }

    /// Create a labeler error.
    pub fn labeler(msg: impl Into<String>) -> Self {
        Error::Labeler(msg.into())
    }

    /// Create a format error.
    pub fn format(msg: impl Into<String>) -> Self {
        Error::Format(msg.into())
    }

    /// Wrap `self` as the cause of a failed document extraction.
    pub fn in_document(self, document: impl Into<String>) -> Self {
        match self {
            already @ Error::Extraction { .. } => already,
            other => Error::Extraction { document: document.into(), source: Box::new(other) },
        }
    }
}
