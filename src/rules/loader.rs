//! Loading rule tables from the data directory.
//!
//! ```text
//! <data_dir>/<locale>/
//!   vocabulary.lst          file names, one per line, in matching order
//!   vocabulary/<name>.txt   one category per file
//!   url_patterns.txt        regex<TAB>fieldSpec, matched against URL paths
//!   time_related.txt        tag name / attribute value patterns
//!   title.txt               id/class patterns of title containers
//!   title_anti.txt          id/class patterns that veto a title container
//! ```

use super::{RuleSet, compile, in_file, rule_lines};
use crate::error::{Error, Result};
use crate::{Config, Locale};
use regex::Regex;
use std::path::Path;
use tracing::debug;

/// Load every rule table of `locale` as laid out by `config`.
pub fn load_rule_set(config: &Config, locale: &Locale) -> Result<RuleSet> {
    let dir = config.locale_dir(locale);
    let list_path = dir.join(&config.vocabulary_list);
    let list = read_resource(&list_path)?;

    let mut builder = RuleSet::builder(locale.clone());
    for file_name in rule_lines(&list).map(str::trim) {
        let path = dir.join(&config.vocabulary_dir).join(file_name);
        let text = read_resource(&path)?;
        let category = file_name.strip_suffix(".txt").unwrap_or(file_name);
        builder = builder.category(category, &text)?;
    }

    let rules = builder
        .url_patterns(&read_resource(&dir.join(&config.url_patterns))?)?
        .time_related(&read_resource(&dir.join(&config.time_related_patterns))?)?
        .title(&read_resource(&dir.join(&config.title_patterns))?)?
        .title_anti(&read_resource(&dir.join(&config.title_anti_patterns))?)?
        .build();

    debug!(
        locale = %locale,
        categories = rules.vocabulary.len(),
        date_patterns = rules.date_patterns.len(),
        url_patterns = rules.url_patterns.len(),
        "rule set loaded"
    );
    Ok(rules)
}

/// One case-insensitive, whole-token regex per line.
pub fn parse_pattern_list(file: &str, text: &str) -> Result<Vec<Regex>> {
    rule_lines(text).map(|line| compile(line, true).map_err(|e| in_file(file, e))).collect()
}

fn read_resource(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::config(format!("could not read resource {}: {e}", path.display())))
}
