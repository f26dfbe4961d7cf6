//! Rule tables.
//!
//! A [`RuleSet`] bundles every pattern table one locale needs: the ordered
//! vocabulary categories, the date patterns (with their field specs), the URL
//! date patterns and the tag-level pattern lists for time-related and
//! title-like markup. It is built once, then only read, and is shared between
//! threads behind an `Arc`.
//!
//! All patterns must match the whole token. Vocabulary, date and tag patterns
//! are case-insensitive; URL patterns are not.

#[path = "rules/field_spec.rs"]
mod field_spec;
#[path = "rules/loader.rs"]
mod loader;

pub use field_spec::{FieldSpec, Role};
pub use loader::{load_rule_set, parse_pattern_list};

use crate::Locale;
use crate::error::{Error, Result};
use regex::{Regex, RegexBuilder};

/// Categories whose name starts with this carry dates.
pub const DATE_CATEGORY: &str = "date";

/// A vocabulary category: its name and the patterns that select it.
#[derive(Debug, Clone)]
pub struct Category {
    pub name: String,
    pub patterns: Vec<Regex>,
}

/// A date pattern and the meaning of its capture groups.
#[derive(Debug, Clone)]
pub struct DatePattern {
    pub regex: Regex,
    pub spec: FieldSpec,
}

#[derive(Debug, Clone)]
pub struct RuleSet {
    pub locale: Locale,
    /// Vocabulary categories in matching order.
    pub vocabulary: Vec<Category>,
    /// Date patterns from every `date*` category, in load order.
    pub date_patterns: Vec<DatePattern>,
    /// Patterns applied to URL paths.
    pub url_patterns: Vec<DatePattern>,
    pub time_related: Vec<Regex>,
    pub title: Vec<Regex>,
    pub title_anti: Vec<Regex>,
}

impl RuleSet {
    pub fn builder(locale: impl Into<Locale>) -> RuleSetBuilder {
        RuleSetBuilder { rules: RuleSet::empty(locale.into()) }
    }

    fn empty(locale: Locale) -> Self {
        Self {
            locale,
            vocabulary: Vec::new(),
            date_patterns: Vec::new(),
            url_patterns: Vec::new(),
            time_related: Vec::new(),
            title: Vec::new(),
            title_anti: Vec::new(),
        }
    }
}

/// Assembles a [`RuleSet`] from rule file contents.
#[derive(Debug)]
pub struct RuleSetBuilder {
    rules: RuleSet,
}

impl RuleSetBuilder {
    /// Add a vocabulary category from the text of its rule file. Categories
    /// named `date*` hold `regex<TAB>fieldSpec` lines and also feed the date
    /// pattern table; the others hold one regex per line.
    pub fn category(mut self, name: &str, text: &str) -> Result<Self> {
        let mut patterns = Vec::new();
        if name.starts_with(DATE_CATEGORY) {
            for pattern in parse_date_lines(name, text, true)? {
                patterns.push(pattern.regex.clone());
                self.rules.date_patterns.push(pattern);
            }
        } else {
            for line in rule_lines(text) {
                patterns.push(compile(line, true).map_err(|e| in_file(name, e))?);
            }
        }
        self.rules.vocabulary.push(Category { name: name.to_string(), patterns });
        Ok(self)
    }

    pub fn url_patterns(mut self, text: &str) -> Result<Self> {
        self.rules.url_patterns.extend(parse_date_lines("url patterns", text, false)?);
        Ok(self)
    }

    pub fn time_related(mut self, text: &str) -> Result<Self> {
        self.rules.time_related.extend(parse_pattern_list("time-related patterns", text)?);
        Ok(self)
    }

    pub fn title(mut self, text: &str) -> Result<Self> {
        self.rules.title.extend(parse_pattern_list("title patterns", text)?);
        Ok(self)
    }

    pub fn title_anti(mut self, text: &str) -> Result<Self> {
        self.rules.title_anti.extend(parse_pattern_list("title anti-patterns", text)?);
        Ok(self)
    }

    pub fn build(self) -> RuleSet {
        self.rules
    }
}

// --- Line parsing -------------------------------------------------------------

/// Non-blank, non-comment lines of a rule file.
fn rule_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(|l| l.trim_end_matches('\r')).filter(|l| !l.trim().is_empty() && !l.starts_with('#'))
}

fn parse_date_lines(file: &str, text: &str, case_insensitive: bool) -> Result<Vec<DatePattern>> {
    let mut patterns = Vec::new();
    for line in rule_lines(text) {
        let fields: Vec<&str> = line.split('\t').collect();
        let [pattern, spec] = fields[..] else {
            return Err(Error::config(format!("bad format in {file}: {line}")));
        };
        let pattern = if pattern.contains('(') { pattern.to_string() } else { format!("({pattern})") };
        let regex = compile(&pattern, case_insensitive).map_err(|e| in_file(file, e))?;
        let spec = FieldSpec::parse(spec).map_err(|e| in_file(file, e))?;
        let groups = regex.captures_len() - 1;
        if spec.roles().len() > groups {
            return Err(Error::config(format!(
                "{file}: field spec '{spec}' names {} groups but '{pattern}' has {groups}",
                spec.roles().len()
            )));
        }
        patterns.push(DatePattern { regex, spec });
    }
    Ok(patterns)
}

/// Compile a whole-token pattern.
pub(crate) fn compile(pattern: &str, case_insensitive: bool) -> Result<Regex> {
    RegexBuilder::new(&format!(r"\A(?:{pattern})\z"))
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| Error::config(format!("invalid pattern '{pattern}': {e}")))
}

fn in_file(file: &str, err: Error) -> Error {
    match err {
        Error::Config(msg) => Error::config(format!("{file}: {msg}")),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_ordered_vocabulary_and_date_table() {
        let rules = RuleSet::builder("en_US")
            .category("date", "(\\d{4})-(\\d\\d)-(\\d\\d)\tYMD\n# comment\n\n")
            .unwrap()
            .category("date-month", "(jan(?:uary)?)\tM1\n(feb(?:ruary)?)\tM2")
            .unwrap()
            .category("trigger", "posted\npublished")
            .unwrap()
            .build();
        let names: Vec<_> = rules.vocabulary.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["date", "date-month", "trigger"]);
        assert_eq!(rules.date_patterns.len(), 3);
        assert!(rules.date_patterns[0].regex.is_match("2013-04-01"));
        assert!(!rules.date_patterns[0].regex.is_match("x2013-04-01"));
        assert!(rules.vocabulary[2].patterns[0].is_match("POSTED"));
    }

    #[test]
    fn bare_pattern_gets_a_group() {
        let rules = RuleSet::builder("en_US").category("date-year", "\\d{4}\tY").unwrap().build();
        let caps = rules.date_patterns[0].regex.captures("2012").unwrap();
        assert_eq!(&caps[1], "2012");
    }

    #[test]
    fn malformed_date_line_is_a_config_error() {
        let err = RuleSet::builder("en_US").category("date", "no-tab-here").unwrap_err();
        assert!(err.to_string().contains("bad format"));
        let err = RuleSet::builder("en_US").category("date", "(\\d+)\tYMD").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn url_patterns_are_case_sensitive() {
        let rules = RuleSet::builder("en_US").url_patterns("/archive/(\\d{4})/(\\d\\d)/(\\d\\d)/.*\tYMD").unwrap().build();
        assert!(rules.url_patterns[0].regex.is_match("/archive/2012/03/04/story"));
        assert!(!rules.url_patterns[0].regex.is_match("/ARCHIVE/2012/03/04/story"));
    }
}
