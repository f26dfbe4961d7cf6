//! Vocabulary matching.
//!
//! A token is classified by the first category (in rule-file order) owning a
//! pattern that matches the whole token. The category name then tells what
//! the match means for the extractor:
//!
//! ```text
//! "date"            full date token      (counts as a date, and a full one)
//! "date<suffix>"    partial date token   (counts as a date)
//! "anti-trigger"    anti-trigger         (moves the anti-trigger marker)
//! "*trigger"        trigger              (moves the trigger marker)
//! anything else     plain category
//! ```

use crate::rules::{Category, DATE_CATEGORY};

const TRIGGER: &str = "trigger";
const ANTI_TRIGGER: &str = "anti-trigger";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VocabularyKind {
    FullDate,
    PartialDate,
    Trigger,
    AntiTrigger,
    Other,
}

impl VocabularyKind {
    pub fn of(category: &str) -> Self {
        if category == DATE_CATEGORY {
            VocabularyKind::FullDate
        } else if category.starts_with(DATE_CATEGORY) {
            VocabularyKind::PartialDate
        } else if category == ANTI_TRIGGER {
            VocabularyKind::AntiTrigger
        } else if category.ends_with(TRIGGER) {
            VocabularyKind::Trigger
        } else {
            VocabularyKind::Other
        }
    }

    pub fn is_date(self) -> bool {
        matches!(self, VocabularyKind::FullDate | VocabularyKind::PartialDate)
    }
}

/// Name of the first category matching `token`, if any.
pub fn classify<'a>(token: &str, categories: &'a [Category]) -> Option<&'a str> {
    categories.iter().find(|c| c.patterns.iter().any(|p| p.is_match(token))).map(|c| c.name.as_str())
}
