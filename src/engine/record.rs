//! Feature records.
//!
//! One [`FeatureRecord`] is emitted per text token and per visible tag. The
//! schema is fixed: every [`Feature`] has a typed field (or is derived from
//! one), and a freshly built record already carries the default of every
//! feature, so nothing downstream ever sees a missing value.
//!
//! Features are grouped ([`FeatureGroups`]) so that a feature table can be
//! restricted to a subset of columns.

use std::fmt;

/// Text of the marker row opening each document in a feature table.
pub const FILE_MARKER: &str = "DCTFINDER_FILE";

/// Category of text tokens no vocabulary pattern matched.
pub const PLAIN_TEXT: &str = "TEXT";

bitflags::bitflags! {
    /// Feature groups, usable as a column mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FeatureGroups: u8 {
        const TEXT              = 1 << 0;
        const STRUCTURE         = 1 << 1;
        const VOCABULARY        = 1 << 2;
        const STRUCTURE_CONTEXT = 1 << 3;
        const POSITION          = 1 << 4;
    }
}

impl Default for FeatureGroups {
    fn default() -> Self {
        FeatureGroups::all()
    }
}

// --- Schema -------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Text,
    Type,
    TimeRelatedTag,
    WordNumberInTag,
    WordNumberInTagDisc,
    WordNumberInTagSoFar,
    WordNumberInTagSoFarDisc,
    MaxTagLengthBefore,
    MaxTagLengthBeforeDisc,
    AvgTagLengthBefore,
    AvgTagLengthBeforeDisc,
    DistanceFromFirstLongTag,
    DistanceFromFirstLongTagDisc,
    DistanceFromLastLongTag,
    DistanceFromLastLongTagDisc,
    FirstLongTagPosition,
    LastLongTagPosition,
    Vocabulary,
    DetailedVocabulary,
    DateVocabulary,
    FullDate,
    DateContentOnlyInTag,
    DatesSoFar,
    FullDatesSoFar,
    DatesInAll,
    DatesInAllDisc,
    DateElementsAround,
    DateElementsAroundDisc,
    DistanceFromTrigger,
    DistanceFromTriggerDisc,
    DistanceFromAntiTrigger,
    DistanceFromAntiTriggerDisc,
    DistanceFromTitle,
    DistanceFromTitleDisc,
    Position,
    PositionRate,
    PositionDisc,
}

impl Feature {
    /// Every feature, in column order.
    pub const ALL: [Feature; 37] = [
        Feature::Text,
        Feature::Type,
        Feature::TimeRelatedTag,
        Feature::WordNumberInTag,
        Feature::WordNumberInTagDisc,
        Feature::WordNumberInTagSoFar,
        Feature::WordNumberInTagSoFarDisc,
        Feature::MaxTagLengthBefore,
        Feature::MaxTagLengthBeforeDisc,
        Feature::AvgTagLengthBefore,
        Feature::AvgTagLengthBeforeDisc,
        Feature::DistanceFromFirstLongTag,
        Feature::DistanceFromFirstLongTagDisc,
        Feature::DistanceFromLastLongTag,
        Feature::DistanceFromLastLongTagDisc,
        Feature::FirstLongTagPosition,
        Feature::LastLongTagPosition,
        Feature::Vocabulary,
        Feature::DetailedVocabulary,
        Feature::DateVocabulary,
        Feature::FullDate,
        Feature::DateContentOnlyInTag,
        Feature::DatesSoFar,
        Feature::FullDatesSoFar,
        Feature::DatesInAll,
        Feature::DatesInAllDisc,
        Feature::DateElementsAround,
        Feature::DateElementsAroundDisc,
        Feature::DistanceFromTrigger,
        Feature::DistanceFromTriggerDisc,
        Feature::DistanceFromAntiTrigger,
        Feature::DistanceFromAntiTriggerDisc,
        Feature::DistanceFromTitle,
        Feature::DistanceFromTitleDisc,
        Feature::Position,
        Feature::PositionRate,
        Feature::PositionDisc,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::Text => "TEXT",
            Feature::Type => "TYPE",
            Feature::TimeRelatedTag => "TIME_RELATED_TAG",
            Feature::WordNumberInTag => "WORD_NUMBER_IN_TAG",
            Feature::WordNumberInTagDisc => "WORD_NUMBER_IN_TAG_DISC",
            Feature::WordNumberInTagSoFar => "WORD_NUMBER_IN_TAG_SO_FAR",
            Feature::WordNumberInTagSoFarDisc => "WORD_NUMBER_IN_TAG_SO_FAR_DISC",
            Feature::MaxTagLengthBefore => "MAX_TAG_LENGTH_BEFORE",
            Feature::MaxTagLengthBeforeDisc => "MAX_TAG_LENGTH_BEFORE_DISC",
            Feature::AvgTagLengthBefore => "AVG_TAG_LENGTH_BEFORE",
            Feature::AvgTagLengthBeforeDisc => "AVG_TAG_LENGTH_BEFORE_DISC",
            Feature::DistanceFromFirstLongTag => "DISTANCE_FROM_FIRST_LONG_TAG",
            Feature::DistanceFromFirstLongTagDisc => "DISTANCE_FROM_FIRST_LONG_TAG_DISC",
            Feature::DistanceFromLastLongTag => "DISTANCE_FROM_LAST_LONG_TAG",
            Feature::DistanceFromLastLongTagDisc => "DISTANCE_FROM_LAST_LONG_TAG_DISC",
            Feature::FirstLongTagPosition => "FIRST_LONG_TAG_POSITION",
            Feature::LastLongTagPosition => "LAST_LONG_TAG_POSITION",
            Feature::Vocabulary => "VOCABULARY",
            Feature::DetailedVocabulary => "DETAILED_VOCABULARY",
            Feature::DateVocabulary => "DATE_VOCABULARY",
            Feature::FullDate => "FULL_DATE",
            Feature::DateContentOnlyInTag => "DATE_CONTENT_ONLY_IN_TAG",
            Feature::DatesSoFar => "DATES_SO_FAR",
            Feature::FullDatesSoFar => "FULL_DATES_SO_FAR",
            Feature::DatesInAll => "DATES_IN_ALL",
            Feature::DatesInAllDisc => "DATES_IN_ALL_DISC",
            Feature::DateElementsAround => "DATE_ELEMENTS_AROUND",
            Feature::DateElementsAroundDisc => "DATE_ELEMENTS_AROUND_DISC",
            Feature::DistanceFromTrigger => "DISTANCE_FROM_TRIGGER",
            Feature::DistanceFromTriggerDisc => "DISTANCE_FROM_TRIGGER_DISC",
            Feature::DistanceFromAntiTrigger => "DISTANCE_FROM_ANTI_TRIGGER",
            Feature::DistanceFromAntiTriggerDisc => "DISTANCE_FROM_ANTI_TRIGGER_DISC",
            Feature::DistanceFromTitle => "DISTANCE_FROM_TITLE",
            Feature::DistanceFromTitleDisc => "DISTANCE_FROM_TITLE_DISC",
            Feature::Position => "POSITION",
            Feature::PositionRate => "POSITION_RATE",
            Feature::PositionDisc => "POSITION_DISC",
        }
    }

    pub fn group(self) -> FeatureGroups {
        use Feature::*;
        match self {
            Text => FeatureGroups::TEXT,
            Type
            | TimeRelatedTag
            | WordNumberInTag
            | WordNumberInTagDisc
            | WordNumberInTagSoFar
            | WordNumberInTagSoFarDisc
            | MaxTagLengthBefore
            | MaxTagLengthBeforeDisc
            | AvgTagLengthBefore
            | AvgTagLengthBeforeDisc
            | DistanceFromFirstLongTag
            | DistanceFromFirstLongTagDisc
            | DistanceFromLastLongTag
            | DistanceFromLastLongTagDisc
            | FirstLongTagPosition
            | LastLongTagPosition => FeatureGroups::STRUCTURE,
            Vocabulary
            | DetailedVocabulary
            | DateVocabulary
            | FullDate
            | DateContentOnlyInTag
            | DatesSoFar
            | FullDatesSoFar
            | DatesInAll
            | DatesInAllDisc
            | DateElementsAround
            | DateElementsAroundDisc
            | DistanceFromTrigger
            | DistanceFromTriggerDisc
            | DistanceFromAntiTrigger
            | DistanceFromAntiTriggerDisc => FeatureGroups::VOCABULARY,
            DistanceFromTitle | DistanceFromTitleDisc => FeatureGroups::STRUCTURE_CONTEXT,
            Position | PositionRate | PositionDisc => FeatureGroups::POSITION,
        }
    }
}

/// The columns written for a group mask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Schema {
    pub groups: FeatureGroups,
}

impl Schema {
    pub fn new(groups: FeatureGroups) -> Self {
        Self { groups }
    }

    pub fn features(&self) -> impl Iterator<Item = Feature> + '_ {
        Feature::ALL.into_iter().filter(|f| self.groups.contains(f.group()))
    }

    /// Column index of `feature`, if it is written.
    pub fn column(&self, feature: Feature) -> Option<usize> {
        self.features().position(|f| f == feature)
    }
}

// --- Values -------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordKind {
    #[default]
    Text,
    OpenTag,
    CloseTag,
}

impl RecordKind {
    fn code(self) -> i64 {
        match self {
            RecordKind::Text => 1,
            RecordKind::OpenTag => 2,
            RecordKind::CloseTag => 3,
        }
    }
}

/// Sequence label: begin, inside or outside a date span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Label {
    Begin,
    Inside,
    #[default]
    Out,
}

impl Label {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "B" => Some(Label::Begin),
            "I" => Some(Label::Inside),
            "O" => Some(Label::Out),
            _ => None,
        }
    }

    pub fn is_date(self) -> bool {
        matches!(self, Label::Begin | Label::Inside)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Label::Begin => "B",
            Label::Inside => "I",
            Label::Out => "O",
        })
    }
}

/// A single feature value, as written to a table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FeatureValue<'a> {
    Text(&'a str),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for FeatureValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Text(s) => f.write_str(s),
            FeatureValue::Int(n) => write!(f, "{n}"),
            FeatureValue::Float(x) => write!(f, "{x:.4}"),
            FeatureValue::Bool(b) => f.write_str(if *b { "1" } else { "0" }),
        }
    }
}

// --- Records ------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    pub text: String,
    pub kind: RecordKind,
    pub time_related_tag: bool,
    /// Words in the enclosing tag, known once the tag is left.
    pub word_number_in_tag: i64,
    pub word_number_in_tag_so_far: i64,
    pub max_tag_length_before: i64,
    pub avg_tag_length_before: f64,
    pub distance_from_first_long_tag: i64,
    pub distance_from_last_long_tag: i64,
    pub first_long_tag_position: i64,
    pub last_long_tag_position: i64,
    /// Vocabulary category; every date subtype reads `date` here.
    pub vocabulary: Option<String>,
    pub detailed_vocabulary: Option<String>,
    pub date_vocabulary: bool,
    pub full_date: bool,
    pub date_content_only_in_tag: bool,
    /// Capped at 3.
    pub dates_so_far: i64,
    /// Capped at 3.
    pub full_dates_so_far: i64,
    pub dates_in_all: i64,
    pub date_elements_around: i64,
    /// Words since the last trigger, -1 when none was seen.
    pub distance_from_trigger: i64,
    pub distance_from_anti_trigger: i64,
    pub distance_from_title: i64,
    pub distance_from_title_disc: i64,
    /// Word number at emission time.
    pub position: i64,
    pub position_rate: f64,
    pub label: Label,
}

impl Default for FeatureRecord {
    fn default() -> Self {
        Self {
            text: String::new(),
            kind: RecordKind::Text,
            time_related_tag: false,
            word_number_in_tag: 0,
            word_number_in_tag_so_far: 0,
            max_tag_length_before: 0,
            avg_tag_length_before: 0.0,
            distance_from_first_long_tag: -3,
            distance_from_last_long_tag: -3,
            first_long_tag_position: 0,
            last_long_tag_position: 0,
            vocabulary: None,
            detailed_vocabulary: None,
            date_vocabulary: false,
            full_date: false,
            date_content_only_in_tag: false,
            dates_so_far: 0,
            full_dates_so_far: 0,
            dates_in_all: 0,
            date_elements_around: 0,
            distance_from_trigger: -1,
            distance_from_anti_trigger: -1,
            distance_from_title: i64::from(i32::MIN),
            distance_from_title_disc: BEFORE_HIGH,
            position: 0,
            position_rate: 0.0,
            label: Label::Out,
        }
    }
}

impl FeatureRecord {
    /// Marker row naming the document whose rows follow.
    pub fn file_marker(document: &str) -> Self {
        let name: String = document.chars().map(|c| if c.is_whitespace() { '_' } else { c }).collect();
        Self { text: format!("{FILE_MARKER} {name}"), ..Self::default() }
    }

    pub fn is_file_marker(&self) -> bool {
        self.text.starts_with(FILE_MARKER)
    }

    pub fn is_text(&self) -> bool {
        self.kind == RecordKind::Text
    }

    pub fn value(&self, feature: Feature) -> FeatureValue<'_> {
        use FeatureValue::{Bool, Float, Int, Text};
        match feature {
            Feature::Text => Text(&self.text),
            Feature::Type => Int(self.kind.code()),
            Feature::TimeRelatedTag => Bool(self.time_related_tag),
            Feature::WordNumberInTag => Int(self.word_number_in_tag),
            Feature::WordNumberInTagDisc => Int(disc_word_number_in_tag(self.word_number_in_tag)),
            Feature::WordNumberInTagSoFar => Int(self.word_number_in_tag_so_far),
            Feature::WordNumberInTagSoFarDisc => Int(disc_word_number_in_tag(self.word_number_in_tag_so_far)),
            Feature::MaxTagLengthBefore => Int(self.max_tag_length_before),
            Feature::MaxTagLengthBeforeDisc => Int(disc_max_tag_length(self.max_tag_length_before)),
            Feature::AvgTagLengthBefore => Float(self.avg_tag_length_before),
            Feature::AvgTagLengthBeforeDisc => Int(disc_avg_tag_length(self.avg_tag_length_before)),
            Feature::DistanceFromFirstLongTag => Int(self.distance_from_first_long_tag),
            Feature::DistanceFromFirstLongTagDisc => Int(disc_positive_distance(self.distance_from_first_long_tag)),
            Feature::DistanceFromLastLongTag => Int(self.distance_from_last_long_tag),
            Feature::DistanceFromLastLongTagDisc => Int(disc_positive_distance(self.distance_from_last_long_tag)),
            Feature::FirstLongTagPosition => Int(self.first_long_tag_position),
            Feature::LastLongTagPosition => Int(self.last_long_tag_position),
            Feature::Vocabulary => Text(self.vocabulary.as_deref().unwrap_or("null")),
            Feature::DetailedVocabulary => Text(self.detailed_vocabulary.as_deref().unwrap_or("null")),
            Feature::DateVocabulary => Bool(self.date_vocabulary),
            Feature::FullDate => Bool(self.full_date),
            Feature::DateContentOnlyInTag => Bool(self.date_content_only_in_tag),
            Feature::DatesSoFar => Int(self.dates_so_far),
            Feature::FullDatesSoFar => Int(self.full_dates_so_far),
            Feature::DatesInAll => Int(self.dates_in_all),
            Feature::DatesInAllDisc => Int(disc_small_number(self.dates_in_all)),
            Feature::DateElementsAround => Int(self.date_elements_around),
            Feature::DateElementsAroundDisc => Int(disc_date_elements_around(self.date_elements_around)),
            Feature::DistanceFromTrigger => Int(self.distance_from_trigger),
            Feature::DistanceFromTriggerDisc => Int(disc_distance(self.distance_from_trigger)),
            Feature::DistanceFromAntiTrigger => Int(self.distance_from_anti_trigger),
            Feature::DistanceFromAntiTriggerDisc => Int(disc_distance(self.distance_from_anti_trigger)),
            Feature::DistanceFromTitle => Int(self.distance_from_title),
            Feature::DistanceFromTitleDisc => Int(self.distance_from_title_disc),
            Feature::Position => Int(self.position),
            Feature::PositionRate => Float(self.position_rate),
            Feature::PositionDisc => Int(disc_position(self.position_rate)),
        }
    }
}

/// One row of a feature table.
#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    /// Start of a document's rows.
    Document(String),
    Record(FeatureRecord),
    /// Sequence break: a pruned run, or the end of a document.
    Separator,
}

impl Row {
    pub fn record(&self) -> Option<&FeatureRecord> {
        match self {
            Row::Record(r) => Some(r),
            _ => None,
        }
    }
}

// --- Discretization -----------------------------------------------------------

pub const BEFORE_HIGH: i64 = -3;
pub const BEFORE_MEDIUM: i64 = -2;
pub const BEFORE_LOW: i64 = -1;
pub const INSIDE: i64 = 0;
pub const AFTER_LOW: i64 = 1;
pub const AFTER_MEDIUM: i64 = 2;
pub const AFTER_HIGH: i64 = 3;

pub fn disc_word_number_in_tag(n: i64) -> i64 {
    match n {
        ..=12 => 0,
        13..=29 => 1,
        30..=99 => 2,
        _ => 3,
    }
}

pub fn disc_max_tag_length(n: i64) -> i64 {
    match n {
        ..=9 => 0,
        10..=39 => 1,
        40..=79 => 2,
        _ => 3,
    }
}

pub fn disc_avg_tag_length(x: f64) -> i64 {
    if x < 8.0 {
        0
    } else if x < 20.0 {
        1
    } else if x < 30.0 {
        2
    } else {
        3
    }
}

/// Quartile (1 to 4) of a position ratio.
pub fn disc_position(ratio: f64) -> i64 {
    if ratio < 0.25 {
        1
    } else if ratio < 0.5 {
        2
    } else if ratio < 0.75 {
        3
    } else {
        4
    }
}

pub fn disc_small_number(n: i64) -> i64 {
    n.clamp(0, 3)
}

/// Distances to long tags: how far after, or simply "before".
pub fn disc_positive_distance(d: i64) -> i64 {
    if d > 60 {
        AFTER_HIGH
    } else if d > 15 {
        AFTER_MEDIUM
    } else if d > 0 {
        AFTER_LOW
    } else {
        BEFORE_HIGH
    }
}

pub fn disc_date_elements_around(n: i64) -> i64 {
    if n > 40 {
        3
    } else if n > 26 {
        2
    } else if n > 16 {
        1
    } else {
        0
    }
}

/// Distances to triggers; a negative distance means none was seen.
pub fn disc_distance(d: i64) -> i64 {
    match d {
        ..=-1 => 3,
        0..=14 => 0,
        15..=39 => 1,
        40..=79 => 2,
        _ => 3,
    }
}

/// Signed distance to the title, with the title's own words as [`INSIDE`].
pub fn disc_title_distance(d: i64, title_words: i64) -> i64 {
    if d > 60 {
        AFTER_HIGH
    } else if d > 15 {
        AFTER_MEDIUM
    } else if d > 0 {
        AFTER_LOW
    } else if d > -title_words {
        INSIDE
    } else if d > -title_words - 15 {
        BEFORE_LOW
    } else if d > -title_words - 40 {
        BEFORE_MEDIUM
    } else {
        BEFORE_HIGH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_follows_group_mask() {
        let all = Schema::default();
        assert_eq!(all.features().count(), Feature::ALL.len());
        assert_eq!(all.column(Feature::Text), Some(0));
        assert_eq!(all.column(Feature::PositionDisc), Some(Feature::ALL.len() - 1));

        let text_and_position = Schema::new(FeatureGroups::TEXT | FeatureGroups::POSITION);
        let names: Vec<_> = text_and_position.features().map(Feature::name).collect();
        assert_eq!(names, ["TEXT", "POSITION", "POSITION_RATE", "POSITION_DISC"]);
        assert_eq!(text_and_position.column(Feature::Vocabulary), None);
    }

    #[test]
    fn defaults_are_consistent_with_their_discretization() {
        let r = FeatureRecord::default();
        assert_eq!(r.value(Feature::DistanceFromFirstLongTagDisc), FeatureValue::Int(BEFORE_HIGH));
        assert_eq!(r.value(Feature::DistanceFromTriggerDisc), FeatureValue::Int(3));
        assert_eq!(r.value(Feature::PositionDisc), FeatureValue::Int(1));
        assert_eq!(r.value(Feature::Vocabulary).to_string(), "null");
        assert_eq!(r.value(Feature::FullDate).to_string(), "0");
    }

    #[test]
    fn discretizers() {
        assert_eq!(disc_word_number_in_tag(12), 0);
        assert_eq!(disc_word_number_in_tag(13), 1);
        assert_eq!(disc_word_number_in_tag(100), 3);
        assert_eq!(disc_distance(-1), 3);
        assert_eq!(disc_distance(14), 0);
        assert_eq!(disc_distance(79), 2);
        assert_eq!(disc_small_number(7), 3);
        assert_eq!(disc_title_distance(0, 4), INSIDE);
        assert_eq!(disc_title_distance(-3, 4), INSIDE);
        assert_eq!(disc_title_distance(-4, 4), BEFORE_LOW);
        assert_eq!(disc_title_distance(-60, 4), BEFORE_HIGH);
        assert_eq!(disc_title_distance(16, 4), AFTER_MEDIUM);
    }

    #[test]
    fn file_marker_has_no_whitespace_in_name() {
        let r = FeatureRecord::file_marker("my page.html");
        assert_eq!(r.text, "DCTFINDER_FILE my_page.html");
        assert!(r.is_file_marker());
    }
}
