//! Per-document metrics.
//!
//! Every [`Extractor::analyze`](crate::Extractor::analyze) call fills a
//! [`DocumentMetrics`]. The counters are plain integers bumped on the hot path;
//! the CLI debug report is their only consumer.

use std::time::Duration;

// --- Metrics -----------------------------------------------------------------

#[derive(Debug, Default, Clone)]
pub struct DocumentMetrics {
    /// Total elapsed time for one analysis.
    pub total: Duration,
    pub extraction: ExtractionMetrics,
    pub filter: FilterMetrics,
}

/// Tokenizer and state machine pass.
#[derive(Debug, Default, Clone)]
pub struct ExtractionMetrics {
    pub duration: Duration,
    /// Bytes consumed, at most the configured read limit.
    pub bytes_read: usize,
    /// Charset in use when the document ended.
    pub encoding: &'static str,
    /// Lexical events seen, including those that emit no record.
    pub events: usize,
    pub words: usize,
    /// Records emitted before filtering, repeats of full dates included.
    pub records: usize,
    pub title_candidates: usize,
}

/// Windowing pass.
#[derive(Debug, Default, Clone)]
pub struct FilterMetrics {
    pub duration: Duration,
    pub kept: usize,
    /// Records that went into the trailing queue and never came out.
    pub pruned: usize,
    /// Records over the tag-length limit, dropped outright.
    pub dropped_long: usize,
    pub separators: usize,
}
