//! Runtime configuration.
//!
//! Everything has a default, so `Config::default()` works against the bundled
//! `data/` directory and a YAML file only needs to list what it overrides:
//!
//! ```yaml
//! data_dir: /opt/dctfinder/data
//! strategy: score
//! labeler:
//!   binary: /usr/local/bin/wapiti
//!   model: /opt/dctfinder/model.bin
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How the final date is picked among the labeled candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Oldest candidate that is not after the reference date.
    #[default]
    Age,
    /// Highest-scored candidate that parses.
    Score,
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "age" => Ok(Strategy::Age),
            "score" => Ok(Strategy::Score),
            other => Err(format!("unknown strategy '{other}' (expected age or score)")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the per-locale rule directories.
    pub data_dir: PathBuf,
    /// Directory (inside a locale directory) holding the vocabulary files.
    pub vocabulary_dir: String,
    /// File listing the vocabulary files, in matching order.
    pub vocabulary_list: String,
    pub url_patterns: String,
    pub time_related_patterns: String,
    pub title_patterns: String,
    pub title_anti_patterns: String,

    /// A title candidate must be strictly longer than this (in characters).
    pub min_title_size: usize,
    /// Context kept on each side of a date-bearing record.
    pub window_size: usize,
    /// Below this labeler confidence, unlabeled text joins the fallback pool.
    pub score_threshold: f64,
    pub strategy: Strategy,
    /// Reading stops after this many bytes of a page.
    pub max_read_bytes: usize,
    /// Read reference annotations (`WA_Start`/`WA_End`) from the pages.
    pub eval_mode: bool,

    pub labeler: LabelerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelerConfig {
    pub binary: PathBuf,
    pub model: Option<PathBuf>,
    /// Worker threads for training; `None` uses all cores but one.
    pub threads: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            vocabulary_dir: "vocabulary".to_string(),
            vocabulary_list: "vocabulary.lst".to_string(),
            url_patterns: "url_patterns.txt".to_string(),
            time_related_patterns: "time_related.txt".to_string(),
            title_patterns: "title.txt".to_string(),
            title_anti_patterns: "title_anti.txt".to_string(),
            min_title_size: 10,
            window_size: 2,
            score_threshold: 0.90,
            strategy: Strategy::Age,
            max_read_bytes: 100_000,
            eval_mode: false,
            labeler: LabelerConfig::default(),
        }
    }
}

impl Default for LabelerConfig {
    fn default() -> Self {
        Self { binary: PathBuf::from("wapiti"), model: None, threads: None }
    }
}

impl Config {
    /// Load a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| Error::io(format!("reading {}", path.display()), e))?;
        Self::from_yaml_str(&text).map_err(|e| match e {
            Error::Config(msg) => Error::config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(text).map_err(|e| Error::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.score_threshold) {
            return Err(Error::config(format!("score_threshold must be within 0..=1, got {}", self.score_threshold)));
        }
        if self.max_read_bytes == 0 {
            return Err(Error::config("max_read_bytes must be positive"));
        }
        Ok(())
    }

    /// Directory holding the rule files of one locale.
    pub fn locale_dir(&self, locale: &crate::Locale) -> PathBuf {
        self.data_dir.join(locale.as_str())
    }
}
