//! Feature extraction state machine.
//!
//! One [`ParseState`] consumes the [`LexEvent`]s of one document and emits a
//! [`FeatureRecord`] per word and per visible tag:
//!
//! ```text
//! LexEvent ─▶ ParseState::feed ─┬─ Text     classify, date counters, trigger markers
//!                               ├─ OpenTag  title candidate, time-related flag
//!                               └─ CloseTag title registration, long tags, date-only tag
//!                                        │
//!                                        ▼
//!                                  ParseState::push
//!                     (shared counters, label, backfill of the open run)
//!                                        │
//!                     ParseState::finish ─▶ title, rows + separator, totals
//! ```
//!
//! Text records emitted since the last tag record form the *open run*. Some of
//! their features (words in the tag, lengths of the tags before, date-only
//! content) are only known at the next tag record, which patches the run and
//! closes it.

use crate::Config;
use crate::engine::metrics::ExtractionMetrics;
use crate::engine::record::{FeatureRecord, Label, PLAIN_TEXT, RecordKind, Row};
use crate::engine::title::{ATTRIBUTE_LEVEL, TITLE_LEVELS, TextPosition, TitleTable};
use crate::engine::tokenizer::{Attributes, LexEvent, Tokenizer};
use crate::engine::vocabulary::{VocabularyKind, classify};
use crate::error::{Error, Result};
use crate::rules::{DATE_CATEGORY, RuleSet};
use chrono::NaiveDate;
use std::collections::VecDeque;
use std::io::Read;
use std::time::Instant;
use tracing::debug;

/// Tags with more words than this are long tags.
pub const LONG_TAG_WORDS: i64 = 20;
/// Closed tags averaged into the "tag length before" features.
const TAG_HISTORY: usize = 3;
const COUNTER_CAP: i64 = 3;
/// A title candidate needs more non-date words than this.
const TITLE_MIN_PLAIN_WORDS: i64 = 2;
/// Extra copies of a full-date record.
const FULL_DATE_REPEATS: usize = 2;

const ANNOTATION_START: &str = "wa_start";
const ANNOTATION_END: &str = "wa_end";
const TITLE_TAG: &str = "title";

/// What the records are extracted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Unannotated page, to be labeled.
    #[default]
    Label,
    /// Annotated page feeding a training table: no document marker, no
    /// pruning of long-tag records.
    Train,
    /// Annotated page whose reference title and date are collected.
    Eval,
}

impl Mode {
    pub fn is_train(self) -> bool {
        self == Mode::Train
    }
}

/// Reference values read from `WA_Start`/`WA_End` annotations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reference {
    pub title: String,
    pub date: Option<NaiveDate>,
    /// Text of the annotated date region.
    pub date_text: String,
}

/// Document-wide values the windowing pass needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentTotals {
    pub words: i64,
    /// Tags closed on a run of at least two date tokens.
    pub date_contents: i64,
    /// Word number of every date token.
    pub date_positions: Vec<i64>,
    pub first_long_tag: i64,
    pub last_long_tag: i64,
}

/// Unfiltered output of one document.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub title: TextPosition,
    pub titles: TitleTable,
    pub rows: Vec<Row>,
    pub totals: DocumentTotals,
    pub reference: Option<Reference>,
    pub metrics: ExtractionMetrics,
}

/// Tokenize and extract one document.
pub fn extract<R: Read>(rules: &RuleSet, config: &Config, reader: R, document: &str, mode: Mode) -> Result<Extraction> {
    let started = Instant::now();
    let mut tokenizer = Tokenizer::new(reader, config.max_read_bytes);
    let mut state = ParseState::new(rules, config.min_title_size, mode);
    if !mode.is_train() {
        state.rows.push(Row::Document(document.to_string()));
    }

    let mut events = 0;
    for event in tokenizer.by_ref() {
        events += 1;
        state.feed(event)?;
    }
    if let Some(e) = tokenizer.take_io_error() {
        return Err(Error::io(format!("reading {document}"), e));
    }

    let records = state.records;
    let mut extraction = state.finish();
    debug!(document, title = %extraction.title.text, position = extraction.title.position, records, "document extracted");

    extraction.metrics = ExtractionMetrics {
        duration: started.elapsed(),
        bytes_read: tokenizer.bytes_read(),
        encoding: tokenizer.encoding().name(),
        events,
        words: usize::try_from(extraction.totals.words).unwrap_or_default(),
        records,
        title_candidates: extraction.titles.candidates().count(),
    };
    Ok(extraction)
}

// --- State ---------------------------------------------------------------------

/// Heading or title-like container whose close may register a title.
#[derive(Debug, Clone)]
struct TitleCandidate {
    level: usize,
    tag: String,
    /// Discriminator in the title table.
    key: String,
}

/// Running state of one document. Never reused across documents.
pub struct ParseState<'r> {
    rules: &'r RuleSet,
    min_title_size: usize,
    mode: Mode,

    word_number: i64,
    word_number_in_tag: i64,
    /// Word counts of tag runs, most recent first.
    tag_history: VecDeque<i64>,
    first_long_tag: i64,
    last_long_tag: i64,

    running_text: String,
    doc_title: String,
    titles: TitleTable,
    title_candidate: Option<TitleCandidate>,

    date_content_in_tag: i64,
    no_date_content_in_tag: i64,
    consecutive_dates: i64,
    best_consecutive_dates: i64,
    date_contents: i64,
    full_dates: i64,
    date_positions: Vec<i64>,
    last_trigger: Option<i64>,
    last_anti_trigger: Option<i64>,

    in_date_region: bool,
    region_records: usize,
    in_title_region: bool,
    reference: Option<Reference>,

    rows: Vec<Row>,
    /// Indices in `rows` of the open run.
    open_run: Vec<usize>,
    records: usize,
}

impl<'r> ParseState<'r> {
    pub fn new(rules: &'r RuleSet, min_title_size: usize, mode: Mode) -> Self {
        Self {
            rules,
            min_title_size,
            mode,
            word_number: 0,
            word_number_in_tag: 0,
            tag_history: VecDeque::with_capacity(TAG_HISTORY + 1),
            first_long_tag: 0,
            last_long_tag: 0,
            running_text: String::new(),
            doc_title: String::new(),
            titles: TitleTable::new(),
            title_candidate: None,
            date_content_in_tag: 0,
            no_date_content_in_tag: 0,
            consecutive_dates: 0,
            best_consecutive_dates: 0,
            date_contents: 0,
            full_dates: 0,
            date_positions: Vec::new(),
            last_trigger: None,
            last_anti_trigger: None,
            in_date_region: false,
            region_records: 0,
            in_title_region: false,
            reference: (mode == Mode::Eval).then(Reference::default),
            rows: Vec::new(),
            open_run: Vec::new(),
            records: 0,
        }
    }

    pub fn feed(&mut self, event: LexEvent) -> Result<()> {
        let record = match event {
            LexEvent::Text { content, spaced } => Some(self.text(content, spaced)),
            LexEvent::OpenTag { name, attributes } => self.open_tag(&name, &attributes)?,
            LexEvent::CloseTag { name } => self.close_tag(&name),
        };
        if let Some(record) = record {
            self.push(record);
        }
        Ok(())
    }

    /// Resolve the title and terminate the row sequence.
    pub fn finish(mut self) -> Extraction {
        let title = self.titles.resolve(self.min_title_size, &self.doc_title);
        self.rows.push(Row::Separator);
        let totals = DocumentTotals {
            words: self.word_number,
            date_contents: self.date_contents,
            date_positions: self.date_positions,
            first_long_tag: self.first_long_tag,
            last_long_tag: self.last_long_tag,
        };
        Extraction {
            title,
            titles: self.titles,
            rows: self.rows,
            totals,
            reference: self.reference,
            metrics: ExtractionMetrics::default(),
        }
    }

    // --- Events ------------------------------------------------------------------

    fn text(&mut self, content: String, spaced: bool) -> FeatureRecord {
        let text = if spaced { format!("{content} ") } else { content.clone() };
        if let Some(reference) = self.reference.as_mut() {
            if self.in_date_region {
                reference.date_text.push_str(&text);
            } else if self.in_title_region {
                reference.title.push_str(&text);
            }
        }

        let category = classify(&content, &self.rules.vocabulary);
        let kind = category.map_or(VocabularyKind::Other, VocabularyKind::of);
        match kind {
            VocabularyKind::AntiTrigger => self.last_anti_trigger = Some(self.word_number),
            VocabularyKind::Trigger => self.last_trigger = Some(self.word_number),
            _ => {}
        }
        self.running_text.push_str(&text);
        self.word_number += 1;
        self.word_number_in_tag += 1;

        let mut record = FeatureRecord { text: content, kind: RecordKind::Text, ..FeatureRecord::default() };
        if kind.is_date() {
            record.vocabulary = Some(DATE_CATEGORY.to_string());
            record.detailed_vocabulary = category.map(str::to_string);
            record.date_vocabulary = true;
            // A full date counts twice.
            if kind == VocabularyKind::FullDate {
                record.full_date = true;
                self.consecutive_dates += 1;
                self.date_content_in_tag += 1;
                self.full_dates += 1;
            }
            self.date_content_in_tag += 1;
            self.consecutive_dates += 1;
            self.best_consecutive_dates = self.best_consecutive_dates.max(self.consecutive_dates);
            self.date_positions.push(self.word_number);
        } else {
            let category = category.unwrap_or(PLAIN_TEXT);
            record.vocabulary = Some(category.to_string());
            record.detailed_vocabulary = Some(category.to_string());
            self.no_date_content_in_tag += 1;
            self.consecutive_dates = 0;
        }
        record.word_number_in_tag_so_far = self.word_number_in_tag;
        record
    }

    fn open_tag(&mut self, name: &str, attributes: &Attributes) -> Result<Option<FeatureRecord>> {
        match name {
            ANNOTATION_START => {
                self.start_annotation(attributes)?;
                return Ok(None);
            }
            ANNOTATION_END => {
                self.in_date_region = false;
                self.region_records = 0;
                self.in_title_region = false;
                return Ok(None);
            }
            _ => {}
        }

        self.offer_running_text_as_title();
        let time_related = self.is_time_related(name, attributes);
        if !time_related {
            self.consider_title_candidate(name, attributes);
        }

        self.running_text.clear();
        self.no_date_content_in_tag = 0;
        self.date_content_in_tag = 0;
        self.consecutive_dates = 0;
        self.remember_tag_length();

        Ok(Some(FeatureRecord {
            text: format!("<{name}>"),
            kind: RecordKind::OpenTag,
            time_related_tag: time_related,
            ..FeatureRecord::default()
        }))
    }

    fn close_tag(&mut self, name: &str) -> Option<FeatureRecord> {
        if name == ANNOTATION_START || name == ANNOTATION_END {
            return None;
        }

        let mut contains_title = false;
        if name == TITLE_TAG {
            self.doc_title.push_str(&self.running_text);
            self.running_text.clear();
        } else {
            contains_title = self.offer_running_text_as_title();
        }

        let date_free = self.no_date_content_in_tag > TITLE_MIN_PLAIN_WORDS;
        if let Some(candidate) = self.title_candidate.take_if(|c| c.tag == name && date_free) {
            // Headings that do not echo the document title lose a level.
            let level = if !contains_title && candidate.level < ATTRIBUTE_LEVEL {
                candidate.level + 1
            } else {
                candidate.level
            };
            debug!(level, key = %candidate.key, text = %self.running_text, "title candidate");
            self.titles.register(level, &candidate.key, TextPosition::new(self.running_text.clone(), self.word_number));
        }

        let mut record = FeatureRecord { text: format!("</{name}>"), kind: RecordKind::CloseTag, ..FeatureRecord::default() };
        if self.remember_tag_length() && self.word_number_in_tag > LONG_TAG_WORDS {
            if self.first_long_tag == 0 {
                self.first_long_tag = self.word_number - self.word_number_in_tag + 1;
            } else {
                self.last_long_tag = self.word_number + 1;
            }
        }
        if self.best_consecutive_dates >= 2 {
            self.date_contents += 1;
        }
        self.best_consecutive_dates = 0;
        if self.date_content_in_tag > self.no_date_content_in_tag + 1 {
            record.date_content_only_in_tag = true;
            self.no_date_content_in_tag = 0;
            self.date_content_in_tag = 0;
        }
        Some(record)
    }

    // --- Emission ------------------------------------------------------------------

    fn push(&mut self, mut record: FeatureRecord) {
        record.distance_from_trigger = self.last_trigger.map_or(-1, |p| self.word_number - p);
        record.distance_from_anti_trigger = self.last_anti_trigger.map_or(-1, |p| self.word_number - p);
        record.dates_so_far = self.date_contents.min(COUNTER_CAP);
        record.full_dates_so_far = self.full_dates.min(COUNTER_CAP);
        record.position = self.word_number;
        if self.in_date_region {
            record.label = if self.region_records == 0 { Label::Begin } else { Label::Inside };
            self.region_records += 1;
        }

        if !record.is_text() {
            self.close_run(record.date_content_only_in_tag);
        }

        let repeats = record.full_date.then(|| {
            let mut repeat = record.clone();
            if repeat.label == Label::Begin {
                repeat.label = Label::Inside;
            }
            repeat
        });
        self.emit(record);
        if let Some(repeat) = repeats {
            for _ in 0..FULL_DATE_REPEATS {
                self.emit(repeat.clone());
            }
        }
    }

    fn emit(&mut self, record: FeatureRecord) {
        if record.is_text() {
            self.open_run.push(self.rows.len());
        }
        self.rows.push(Row::Record(record));
        self.records += 1;
    }

    /// Patch the open run with what the tag record just revealed.
    fn close_run(&mut self, date_content_only: bool) {
        let (max_before, avg_before) = self.previous_tag_lengths();
        for index in self.open_run.drain(..) {
            if let Some(Row::Record(r)) = self.rows.get_mut(index) {
                r.date_content_only_in_tag = date_content_only;
                r.word_number_in_tag = self.word_number_in_tag;
                if avg_before > 0.0 {
                    r.max_tag_length_before = max_before;
                    r.avg_tag_length_before = avg_before;
                }
            }
        }
        self.word_number_in_tag = 0;
    }

    // --- Helpers -------------------------------------------------------------------

    /// Push the current tag's word count, if any. Returns whether it did.
    fn remember_tag_length(&mut self) -> bool {
        if self.word_number_in_tag == 0 {
            return false;
        }
        self.tag_history.push_front(self.word_number_in_tag);
        self.tag_history.truncate(TAG_HISTORY + 1);
        true
    }

    /// Max and mean word counts of the tags before the most recent one.
    fn previous_tag_lengths(&self) -> (i64, f64) {
        let before: Vec<i64> = self.tag_history.iter().skip(1).take(TAG_HISTORY).copied().collect();
        let Some(max) = before.iter().copied().max() else {
            return (0, 0.0);
        };
        // Mean over the tags seen so far, not over a full history window.
        (max, before.iter().sum::<i64>() as f64 / before.len() as f64)
    }

    /// Offer the running text as a `<title>` excerpt. Returns whether it is one.
    fn offer_running_text_as_title(&mut self) -> bool {
        if self.running_text.chars().count() < self.min_title_size || !self.doc_title.contains(&self.running_text) {
            return false;
        }
        self.titles.offer_doc_title_excerpt(&self.running_text, self.word_number);
        true
    }

    fn is_time_related(&self, name: &str, attributes: &Attributes) -> bool {
        self.rules.time_related.iter().any(|re| re.is_match(name) || attributes.values().any(|v| re.is_match(v)))
    }

    fn consider_title_candidate(&mut self, name: &str, attributes: &Attributes) {
        let current = self.title_candidate.as_ref().map_or(TITLE_LEVELS, |c| c.level);
        if let Some(level) = heading_level(name) {
            if level < current {
                self.title_candidate = Some(TitleCandidate { level, tag: name.to_string(), key: name.to_string() });
            }
        } else if let Some(key) = self.title_like(attributes) {
            if current == TITLE_LEVELS {
                self.title_candidate = Some(TitleCandidate { level: ATTRIBUTE_LEVEL, tag: name.to_string(), key });
            }
        }
    }

    /// The `id` or `class` value marking a title container, unless an
    /// anti-pattern vetoes it.
    fn title_like(&self, attributes: &Attributes) -> Option<String> {
        let values: Vec<&str> = ["id", "class"].into_iter().filter_map(|k| attributes.get(k)).collect();
        if self.rules.title_anti.iter().any(|re| values.iter().any(|v| re.is_match(v))) {
            return None;
        }
        self.rules.title.iter().find_map(|re| values.iter().find(|v| re.is_match(v))).map(|v| v.to_string())
    }

    fn start_annotation(&mut self, attributes: &Attributes) -> Result<()> {
        // Unannotated pages are labeled by the labeler, never by their markup.
        if self.mode == Mode::Label {
            return Ok(());
        }
        let kind = attributes.get("type").unwrap_or_default();
        if kind.starts_with(DATE_CATEGORY) {
            self.in_date_region = true;
            if kind == DATE_CATEGORY {
                if let Some(reference) = self.reference.as_mut() {
                    reference.date = Some(parse_annotated_date(attributes.get("subtypes").unwrap_or_default())?);
                }
            }
        } else if kind == TITLE_TAG {
            if let Some(reference) = self.reference.as_mut() {
                self.in_title_region = true;
                reference.title.clear();
            }
        }
        Ok(())
    }
}

/// Title level of a heading tag: `h1` is the best, `h2`..`h4` follow their
/// number, deeper headings are not candidates.
fn heading_level(name: &str) -> Option<usize> {
    let caps = regex!(r"^h(\d+)$").captures(name)?;
    match caps[1].parse::<usize>().ok()? {
        1 => Some(0),
        n @ 2..=4 => Some(n),
        _ => None,
    }
}

fn parse_annotated_date(subtypes: &str) -> Result<NaiveDate> {
    let caps = regex!(r"^value:(\d{4}-\d\d-\d\d);$")
        .captures(subtypes)
        .ok_or_else(|| Error::format(format!("{subtypes} is not recognized")))?;
    NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").map_err(|e| Error::format(format!("{subtypes}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> RuleSet {
        RuleSet::builder("en_US")
            .category("date", "(\\d{4})-(\\d\\d)-(\\d\\d)\tYMD")
            .unwrap()
            .category("date-month", "(march|mar)\tM3")
            .unwrap()
            .category("anti-trigger", "updated")
            .unwrap()
            .category("trigger", "posted")
            .unwrap()
            .time_related("time\n.*date.*")
            .unwrap()
            .title(".*title.*")
            .unwrap()
            .title_anti(".*sidebar.*")
            .unwrap()
            .build()
    }

    fn run(html: &str, mode: Mode) -> Extraction {
        extract(&rules(), &Config::default(), html.as_bytes(), "page.html", mode).unwrap()
    }

    fn records(extraction: &Extraction) -> Vec<&FeatureRecord> {
        extraction.rows.iter().filter_map(Row::record).collect()
    }

    fn texts(extraction: &Extraction) -> Vec<&str> {
        records(extraction).into_iter().map(|r| r.text.as_str()).collect()
    }

    #[test]
    fn emits_marker_records_and_separator() {
        let out = run("<p>Posted 2012-03-04 here</p>", Mode::Label);
        assert_eq!(out.rows.first(), Some(&Row::Document("page.html".to_string())));
        assert_eq!(out.rows.last(), Some(&Row::Separator));
        assert_eq!(texts(&out), ["<p>", "Posted", "2012-03-04", "2012-03-04", "2012-03-04", "here", "</p>"]);

        let train = run("<p>Posted 2012-03-04 here</p>", Mode::Train);
        assert!(matches!(train.rows.first(), Some(Row::Record(_))));
    }

    #[test]
    fn text_records_carry_vocabulary_and_counters() {
        let out = run("<p>Posted 2012-03-04 here</p>", Mode::Label);
        let recs = records(&out);

        let posted = recs[1];
        assert_eq!(posted.vocabulary.as_deref(), Some("trigger"));
        assert_eq!(posted.distance_from_trigger, 1);
        assert_eq!(posted.distance_from_anti_trigger, -1);

        let date = recs[2];
        assert_eq!(date.vocabulary.as_deref(), Some("date"));
        assert_eq!(date.detailed_vocabulary.as_deref(), Some("date"));
        assert!(date.full_date && date.date_vocabulary);
        assert_eq!(date.distance_from_trigger, 2);
        assert_eq!(date.word_number_in_tag_so_far, 2);

        let here = recs[5];
        assert_eq!(here.vocabulary.as_deref(), Some(PLAIN_TEXT));
        assert!(!here.date_vocabulary);

        // Every text record of the tag learns its word count at the close.
        assert!(recs[1..6].iter().all(|r| r.word_number_in_tag == 3));

        let close = recs[6];
        assert_eq!(close.kind, RecordKind::CloseTag);
        assert_eq!(close.vocabulary, None);
        assert_eq!(close.dates_so_far, 1);
        assert_eq!(out.totals.date_contents, 1);
        assert_eq!(out.totals.date_positions, [2]);
        assert_eq!(out.totals.words, 3);
    }

    #[test]
    fn date_only_tag_is_flagged_on_its_records() {
        let out = run("<span>2012-03-04</span><p>plain words here</p>", Mode::Label);
        let recs = records(&out);
        assert!(recs[1..4].iter().all(|r| r.date_content_only_in_tag));
        assert!(recs[4].date_content_only_in_tag);
        assert!(recs.iter().filter(|r| r.text == "plain").all(|r| !r.date_content_only_in_tag));
    }

    #[test]
    fn tag_lengths_before_cover_previous_tags() {
        let out = run("<p>a b c</p><p>d e</p><p>f</p>", Mode::Label);
        let recs = records(&out);
        let d = recs.iter().find(|r| r.text == "d").unwrap();
        assert_eq!((d.max_tag_length_before, d.avg_tag_length_before), (3, 3.0));
        let f = recs.iter().find(|r| r.text == "f").unwrap();
        assert_eq!((f.max_tag_length_before, f.avg_tag_length_before), (3, 2.5));
        let a = recs.iter().find(|r| r.text == "a").unwrap();
        assert_eq!((a.max_tag_length_before, a.avg_tag_length_before), (0, 0.0));
    }

    #[test]
    fn long_tags_set_positions() {
        let words = vec!["word"; 21].join(" ");
        let out = run(&format!("<p>{words}</p><p>{words}</p>"), Mode::Label);
        assert_eq!(out.totals.first_long_tag, 1);
        assert_eq!(out.totals.last_long_tag, 43);
    }

    #[test]
    fn heading_echoing_the_title_wins() {
        let html = "<title>My Great Article Title</title><h1>My Great Article Title</h1><p>body text</p>";
        let out = run(html, Mode::Label);
        assert_eq!(out.title, TextPosition::new("My Great Article Title", 8));
    }

    #[test]
    fn heading_not_in_title_is_demoted() {
        let out = run("<title>Site</title><h1>Completely different heading here</h1>", Mode::Label);
        let candidates: Vec<_> = out.titles.candidates().map(|(level, key, _)| (level, key)).collect();
        assert_eq!(candidates, [(1, "h1")]);
        assert_eq!(out.title.text, "Completely different heading here");
    }

    #[test]
    fn title_container_and_anti_pattern() {
        let out = run("<div class=\"post-title\">Some long title words</div>", Mode::Label);
        assert_eq!(out.title.text, "Some long title words");

        let vetoed = run("<div class=\"sidebar-title\">Some long title words</div>", Mode::Label);
        assert_eq!(vetoed.title, TextPosition::new("", 0));
    }

    #[test]
    fn dated_heading_is_not_a_title() {
        let out = run("<title>T</title><h2>Posted March 2012-03-04 today</h2>", Mode::Label);
        assert_eq!(out.title, TextPosition::new("T", 0));
    }

    #[test]
    fn time_related_tags_are_flagged() {
        let out = run("<time>x</time><div class=\"pub-date\">y</div><p>z</p>", Mode::Label);
        let flagged: Vec<_> = records(&out).into_iter().filter(|r| r.time_related_tag).map(|r| r.text.as_str()).collect();
        assert_eq!(flagged, ["<time>", "<div>"]);
    }

    #[test]
    fn annotated_region_is_labeled_and_read_back() {
        let html = "<title>Page</title><WA_Start type=\"date\" subtypes=\"value:2012-03-04;\"/>Posted 2012-03-04<WA_End/> after";
        let out = run(html, Mode::Eval);
        let labels: Vec<_> = records(&out).iter().map(|r| (r.text.as_str(), r.label)).collect();
        assert_eq!(
            labels,
            [
                ("<title>", Label::Out),
                ("Page", Label::Out),
                ("</title>", Label::Out),
                ("Posted", Label::Begin),
                ("2012-03-04", Label::Inside),
                ("2012-03-04", Label::Inside),
                ("2012-03-04", Label::Inside),
                ("after", Label::Out),
            ]
        );
        let reference = out.reference.unwrap();
        assert_eq!(reference.date, NaiveDate::from_ymd_opt(2012, 3, 4));
        assert_eq!(reference.date_text, "Posted 2012-03-04");
    }

    #[test]
    fn annotations_are_ignored_when_labeling() {
        let out = run("<WA_Start type=\"date\"/> Posted March 3, 2012 <WA_End/>", Mode::Label);
        assert!(records(&out).iter().all(|r| r.label == Label::Out));
        assert!(out.reference.is_none());
        assert_eq!(texts(&out), ["Posted", "March", "3", "2012"]);
    }

    #[test]
    fn full_date_opening_a_region_repeats_as_inside() {
        let out = run("<WA_Start type=\"date\"/>2012-03-04<WA_End/>", Mode::Train);
        let labels: Vec<_> = records(&out).iter().map(|r| r.label).collect();
        assert_eq!(labels, [Label::Begin, Label::Inside, Label::Inside]);
        assert!(out.reference.is_none());
    }

    #[test]
    fn malformed_reference_date_is_an_error() {
        let err = extract(
            &rules(),
            &Config::default(),
            &b"<WA_Start type=\"date\" subtypes=\"value:yesterday;\"/>"[..],
            "page.html",
            Mode::Eval,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }
}
