//! Date phrases.
//!
//! A [`DateParser`] turns a short span of text ("Posted March 3, 2012") into a
//! calendar date using a table of [`DatePattern`]s. Each token of the span is
//! matched against the table; the first pattern that matches the whole token
//! fills the fields its field spec names, and the fields of all tokens are
//! merged into one [`DateFieldSet`].
//!
//! ```text
//! "March 3, 2012" ─ split ─▶ ["March", "3", "2012"]
//!                              │       │      │
//!                     analyze_token (first matching pattern per token)
//!                              │       │      │
//!                           {M=3}   {D=3}  {Y=2012}
//!                              └───────┴──────┘
//!                                  merge ─▶ 2012-03-03 ─ reference check ─▶ date
//! ```
//!
//! Months are 1-based throughout.

use crate::rules::{DatePattern, Role};
use chrono::{Datelike, NaiveDate};

/// Spans with more tokens than this are not dates.
pub const MAX_DATE_TOKENS: usize = 20;

/// Month names re-parsed as tokens may themselves need a sub-pattern; this
/// bounds that recursion.
const MAX_DEPTH: usize = 4;

/// Calendar fields found in one token or one span.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateFieldSet {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub day: Option<u32>,
    pub am_pm: Option<u32>,
}

impl DateFieldSet {
    /// Number of fields present.
    pub fn len(&self) -> usize {
        [self.year.is_some(), self.month.is_some(), self.day.is_some(), self.am_pm.is_some()]
            .into_iter()
            .filter(|present| *present)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy every field present in `other`, overwriting.
    fn overwrite_with(&mut self, other: DateFieldSet) {
        self.year = other.year.or(self.year);
        self.month = other.month.or(self.month);
        self.day = other.day.or(self.day);
        self.am_pm = other.am_pm.or(self.am_pm);
    }

    /// Merge the fields of one token into the span's fields: empty slots are
    /// filled, and a token that filled more than one field at once also wins
    /// conflicts.
    fn merge_token(&mut self, token: DateFieldSet) {
        let wins = token.len() > 1;
        merge_field(&mut self.year, token.year, wins);
        merge_field(&mut self.month, token.month, wins);
        merge_field(&mut self.day, token.day, wins);
        merge_field(&mut self.am_pm, token.am_pm, wins);
    }
}

fn merge_field<T>(slot: &mut Option<T>, value: Option<T>, wins: bool) {
    if let Some(value) = value {
        if slot.is_none() || wins {
            *slot = Some(value);
        }
    }
}

/// Parses date phrases against one pattern table.
#[derive(Debug, Clone, Copy)]
pub struct DateParser<'a> {
    patterns: &'a [DatePattern],
}

impl<'a> DateParser<'a> {
    pub fn new(patterns: &'a [DatePattern]) -> Self {
        Self { patterns }
    }

    /// Parse free text. The text is split on spaces, commas and parentheses.
    pub fn parse(&self, text: &str, reference: Option<NaiveDate>) -> Option<NaiveDate> {
        let tokens: Vec<&str> = text.split([' ', ',', '(', ')']).filter(|t| !t.is_empty()).collect();
        self.parse_tokens(&tokens, reference)
    }

    /// Parse an already tokenized span.
    ///
    /// Without a year, the reference year is borrowed. A date that lands after
    /// `reference` is repaired once: a borrowed year moves back by one, and a
    /// day that could be a month is swapped with the month. If the repair does
    /// not bring it to or before the reference, there is no date.
    pub fn parse_tokens(&self, tokens: &[&str], reference: Option<NaiveDate>) -> Option<NaiveDate> {
        if tokens.len() > MAX_DATE_TOKENS {
            return None;
        }
        let fields = self.collect(tokens);

        let (year, borrowed) = match (fields.year, reference) {
            (Some(year), _) => (year, false),
            (None, Some(reference)) => (reference.year(), true),
            (None, None) => return None,
        };
        let (mut month, mut day) = (fields.month?, fields.day?);
        if month > 12 {
            (month, day) = (day, month);
        }
        if day > 31 || month > 12 {
            return None;
        }
        let year = if year < 100 { year + 2000 } else { year };
        let date = NaiveDate::from_ymd_opt(year, month, day)?;

        let Some(reference) = reference else {
            return Some(date);
        };
        if date <= reference {
            return Some(date);
        }
        if borrowed {
            return NaiveDate::from_ymd_opt(year - 1, month, day);
        }
        if day <= 12 {
            let swapped = NaiveDate::from_ymd_opt(year, day, month)?;
            return (swapped <= reference).then_some(swapped);
        }
        None
    }

    /// Merged fields of every token of a span.
    pub fn collect(&self, tokens: &[&str]) -> DateFieldSet {
        let mut fields = DateFieldSet::default();
        for token in tokens {
            fields.merge_token(self.analyze_token(token, 0));
        }
        fields
    }

    /// Fields of a single token, from the first pattern matching it whole.
    pub fn analyze_token(&self, token: &str, depth: usize) -> DateFieldSet {
        let mut fields = DateFieldSet::default();
        let Some((pattern, caps)) = self.patterns.iter().find_map(|p| p.regex.captures(token).map(|c| (p, c))) else {
            return fields;
        };

        let (mut month_found, mut day_found) = (false, false);
        for (i, role) in pattern.spec.roles().iter().enumerate() {
            let Some(group) = caps.get(i + 1).map(|m| m.as_str()) else {
                continue;
            };
            match *role {
                Role::Year => match group.parse() {
                    Ok(year) => fields.year = Some(year),
                    Err(_) => return DateFieldSet::default(),
                },
                Role::Month { fixed } => {
                    month_found = true;
                    if let Ok(month) = group.parse() {
                        fields.month = Some(month);
                    } else if let Some(month) = fixed {
                        fields.month = Some(month);
                    } else if depth < MAX_DEPTH {
                        fields.overwrite_with(self.analyze_token(group, depth + 1));
                    }
                }
                Role::Day => match group.parse() {
                    Ok(day) => {
                        day_found = true;
                        fields.day = Some(day);
                    }
                    Err(_) => return DateFieldSet::default(),
                },
                Role::AmPm { fixed } => {
                    fields.am_pm = Some(group.parse().unwrap_or(fixed.unwrap_or(0)));
                }
            }
        }

        if month_found && day_found {
            if let (Some(month), Some(day)) = (fields.month, fields.day) {
                if month > 12 {
                    if day <= 12 {
                        fields.month = Some(day);
                        fields.day = Some(month);
                    } else {
                        return DateFieldSet::default();
                    }
                }
                if day > 31 {
                    return DateFieldSet::default();
                }
            }
        }
        fields
    }
}
