//! Candidate resolution.
//!
//! The labeler output of a document boils down to a [`CandidatePool`]: spans
//! it labeled as dates (first chance, each with the labeler's score) and spans
//! it was unsure about (second chance). Resolution turns the pool into at most
//! one date.
//!
//! ```text
//! CandidatePool ──┬─ Strategy::Age   ─▶ oldest parseable, not after reference
//!                 │                      (second-chance pool if none)
//!                 └─ Strategy::Score ─▶ highest-scored parseable
//!                                        (Age when scores are unusable)
//! ```
//!
//! Both strategies parse through [`DateParser`]; a span that does not parse is
//! simply not a candidate.

use crate::config::Strategy;
use crate::dates::DateParser;
use chrono::NaiveDate;
use tracing::warn;

/// Date spans recovered from the labeler output of one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidatePool {
    /// Spans labeled as dates, in document order.
    pub first: Vec<String>,
    /// Labeler score of each first-chance span.
    pub scores: Vec<f64>,
    /// Uncertain spans, used only when no first-chance span parses.
    pub second: Vec<String>,
}

impl CandidatePool {
    pub fn is_empty(&self) -> bool {
        self.first.is_empty() && self.second.is_empty()
    }
}

/// The chosen date and the text it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateResolution {
    pub date: NaiveDate,
    pub text: String,
}

pub fn resolve(
    strategy: Strategy,
    parser: &DateParser<'_>,
    pool: &CandidatePool,
    reference: Option<NaiveDate>,
) -> Option<DateResolution> {
    match strategy {
        Strategy::Age => resolve_by_age(parser, pool, reference),
        Strategy::Score => resolve_by_score(parser, pool, reference),
    }
}

/// Oldest first-chance span that parses and is not after `reference`; the
/// second-chance spans get one turn if none does.
pub fn resolve_by_age(parser: &DateParser<'_>, pool: &CandidatePool, reference: Option<NaiveDate>) -> Option<DateResolution> {
    let (first, second) = if pool.first.is_empty() {
        (pool.second.as_slice(), &[][..])
    } else {
        (pool.first.as_slice(), pool.second.as_slice())
    };
    oldest(parser, first, reference).or_else(|| oldest(parser, second, reference))
}

fn oldest(parser: &DateParser<'_>, candidates: &[String], reference: Option<NaiveDate>) -> Option<DateResolution> {
    let mut best: Option<DateResolution> = None;
    for text in candidates {
        let Some(date) = parser.parse(text, reference) else {
            continue;
        };
        if reference.is_some_and(|r| date > r) {
            continue;
        }
        if best.as_ref().is_none_or(|b| date < b.date) {
            best = Some(DateResolution { date, text: text.clone() });
        }
    }
    best
}

/// The parseable first-chance span with the strictly highest score. Falls
/// back to [`resolve_by_age`] when the scores do not line up with the spans.
pub fn resolve_by_score(
    parser: &DateParser<'_>,
    pool: &CandidatePool,
    reference: Option<NaiveDate>,
) -> Option<DateResolution> {
    if pool.scores.is_empty() || pool.scores.len() != pool.first.len() {
        warn!(
            candidates = pool.first.len(),
            scores = pool.scores.len(),
            "candidate scores unusable, resolving by age"
        );
        return resolve_by_age(parser, pool, reference);
    }

    let mut highest = 0.0;
    let mut best = None;
    for (text, &score) in pool.first.iter().zip(&pool.scores) {
        if score <= highest {
            continue;
        }
        if let Some(date) = parser.parse(text, reference) {
            highest = score;
            best = Some(DateResolution { date, text: text.clone() });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleSet;

    const TABLE: &str = "\
(mar|march)\tM3
([0123]?\\d)(?:st|nd|rd|th)?\tD
([12]\\d{3})\tY
";

    fn rules() -> RuleSet {
        RuleSet::builder("en_US").category("date", TABLE).unwrap().build()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn pool(first: &[&str], scores: &[f64], second: &[&str]) -> CandidatePool {
        CandidatePool {
            first: first.iter().map(|s| s.to_string()).collect(),
            scores: scores.to_vec(),
            second: second.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn age_picks_oldest_not_after_reference() {
        let rules = rules();
        let parser = DateParser::new(&rules.date_patterns);
        let candidates = pool(&["March 10 2012", "March 3 2012"], &[1.0, 1.0], &[]);
        let got = resolve_by_age(&parser, &candidates, Some(ymd(2012, 3, 9))).unwrap();
        assert_eq!(got, DateResolution { date: ymd(2012, 3, 3), text: "March 3 2012".into() });
    }

    #[test]
    fn age_falls_back_to_second_chance_pool() {
        let rules = rules();
        let parser = DateParser::new(&rules.date_patterns);
        let reference = Some(ymd(2012, 3, 9));

        let lone = pool(&["March 10 2012"], &[1.0], &[]);
        assert_eq!(resolve_by_age(&parser, &lone, reference), None);

        let with_fallback = pool(&["March 10 2012"], &[1.0], &["nothing here", "March 1st 2012"]);
        let got = resolve_by_age(&parser, &with_fallback, reference).unwrap();
        assert_eq!(got.date, ymd(2012, 3, 1));

        let only_second = pool(&[], &[], &["March 2 2012"]);
        assert_eq!(resolve_by_age(&parser, &only_second, reference).unwrap().text, "March 2 2012");
    }

    #[test]
    fn score_picks_highest_parseable() {
        let rules = rules();
        let parser = DateParser::new(&rules.date_patterns);
        let candidates = pool(&["March 3 2012", "no date", "March 5 2012"], &[0.6, 0.99, 0.7], &[]);
        let got = resolve_by_score(&parser, &candidates, None).unwrap();
        assert_eq!(got.text, "March 5 2012");
    }

    #[test]
    fn score_without_usable_scores_resolves_by_age() {
        let rules = rules();
        let parser = DateParser::new(&rules.date_patterns);
        let candidates = pool(&["March 5 2012", "March 3 2012"], &[0.9], &[]);
        let got = resolve(Strategy::Score, &parser, &candidates, None).unwrap();
        assert_eq!(got.date, ymd(2012, 3, 3));
    }
}
