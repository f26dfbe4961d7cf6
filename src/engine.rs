//! Document analysis engine.
//!
//! Everything between the raw bytes of a page and the feature table the
//! labeler sees, plus the final step that turns labeled spans into a date.
//! The submodules live under `src/engine/` and are wired together by
//! [`crate::Extractor`] and [`crate::DctFinder`].
//!
//! ## How the parts work together
//!
//! ```text
//! bytes ── Tokenizer (tokenizer.rs, entities.rs)
//!            │  LexEvent: Text / OpenTag / CloseTag
//!            v
//!          ParseState (extractor.rs)
//!            - vocabulary class per word        (vocabulary.rs)
//!            - title candidates per level       (title.rs)
//!            - one FeatureRecord per word/tag   (record.rs)
//!            │  rows + DocumentTotals
//!            v
//!          filter (window.rs)
//!            - document-level features
//!            - keep W records around each date token
//!            │
//!            v
//!      feature table ── external labeler ── CandidatePool
//!                                                │
//!                                                v
//!                                     resolve (resolve.rs)
//!                                       - Age or Score strategy
//!                                       - DateParser (dates.rs)
//! ```
//!
//! Extraction is single-pass and sequential per document. A [`ParseState`](extractor::ParseState) is
//! owned by one document; the only shared inputs are the rule tables, which
//! are read-only.
//!
//! ## Responsibilities by module
//!
//! - `tokenizer.rs`: byte stream to lexical events, charset switching, byte
//!   cap, recovery from malformed markup.
//! - `entities.rs`: named and numeric character references.
//! - `vocabulary.rs`: first matching vocabulary category of a word.
//! - `record.rs`: feature schema, feature groups, records, discretizers.
//! - `title.rs`: title candidate table and its resolution.
//! - `extractor.rs`: the per-document state machine.
//! - `window.rs`: late features and pruning.
//! - `resolve.rs`: candidate pools and date resolution strategies.
//! - `metrics.rs`: per-document timings and counters.
//!
//! ## Debugging
//!
//! Set `DCTFINDER_LOG=dctfinder=debug` to trace extraction and labeler runs.

#[path = "engine/entities.rs"]
pub(crate) mod entities;
#[path = "engine/extractor.rs"]
pub(crate) mod extractor;
#[path = "engine/metrics.rs"]
pub(crate) mod metrics;
#[path = "engine/record.rs"]
pub(crate) mod record;
#[path = "engine/resolve.rs"]
pub(crate) mod resolve;
#[path = "engine/title.rs"]
pub(crate) mod title;
#[path = "engine/tokenizer.rs"]
pub(crate) mod tokenizer;
#[path = "engine/vocabulary.rs"]
pub(crate) mod vocabulary;
#[path = "engine/window.rs"]
pub(crate) mod window;

pub use extractor::{Extraction, Mode, Reference, extract};
pub use metrics::{DocumentMetrics, ExtractionMetrics, FilterMetrics};
pub use record::{Feature, FeatureGroups, FeatureRecord, FeatureValue, Label, RecordKind, Row, Schema};
pub use resolve::{CandidatePool, DateResolution, resolve};
pub use title::{TextPosition, TitleTable};
pub use tokenizer::{Attributes, LexEvent, Tokenizer};
pub use window::filter;
