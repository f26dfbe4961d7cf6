//! Title and document-creation date of web pages.
//!
//! A page goes through a single-pass tokenizer and a feature-extraction state
//! machine, a windowing pass keeps the records around date tokens, an external
//! CRF labeler marks date spans, and one span is resolved to a calendar date.
//!
//! ```no_run
//! use dctfinder::{Config, Context, DctFinder, Options, Page};
//!
//! let finder = DctFinder::new(Config::load("dctfinder.yaml")?);
//! let html = std::fs::read("page.html")?;
//! let page = Page::new("page.html", &html).with_context(Context::default());
//! let info = finder.page_info(&page, &Options::default())?;
//! println!("{info}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#[macro_use]
mod macros;
mod api;
mod config;
mod dates;
mod engine;
mod error;
mod labeler;
mod locale;
mod rules;

pub use api::{Analysis, Context, DctFinder, Extractor, Options, Page, PageInfo};
pub use config::{Config, LabelerConfig, Strategy};
pub use dates::{DateFieldSet, DateParser};
pub use engine::{
    Attributes, CandidatePool, DateResolution, DocumentMetrics, ExtractionMetrics, Feature, FeatureGroups,
    FeatureRecord, FeatureValue, FilterMetrics, Label, LexEvent, Mode, RecordKind, Reference, Row, Schema,
    TextPosition, TitleTable, Tokenizer,
};
pub use error::{Error, Result};
pub use labeler::{LabeledDocument, Labeler, TableWriter, WapitiLabeler, read_labeled, render_templates};
pub use locale::Locale;
pub use rules::{DatePattern, FieldSpec, Role, RuleSet, RuleSetBuilder, load_rule_set};
