//! Title candidates.
//!
//! Candidates are kept in a fixed array of priority levels, 0 being the best.
//! Each level is an ordered map from a discriminator (the heading tag name,
//! the `id`/`class` value of a title-like container, or `-` for body text
//! found inside the `<title>` element) to the text and word position of the
//! candidate. A discriminator seen twice at the same level is blanked: the
//! markup it names is repeated and so not a page title.

/// Number of priority levels.
pub const TITLE_LEVELS: usize = 10;
/// Level of body text that also appears in `<title>`.
pub const DOC_TITLE_LEVEL: usize = 1;
/// Level of `id`/`class`-matched containers.
pub const ATTRIBUTE_LEVEL: usize = TITLE_LEVELS - 1;

const DOC_TITLE_KEY: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextPosition {
    pub text: String,
    /// Word number where the text ends, -1 for a blanked candidate.
    pub position: i64,
}

impl TextPosition {
    pub fn new(text: impl Into<String>, position: i64) -> Self {
        Self { text: text.into(), position }
    }

    /// Number of words, at least 1.
    pub fn word_count(&self) -> i64 {
        let n = self.text.split_whitespace().count();
        i64::try_from(n).unwrap_or(i64::MAX).max(1)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TitleTable {
    levels: [Vec<(String, TextPosition)>; TITLE_LEVELS],
    /// Length of the longest `<title>` excerpt registered so far.
    doc_title_len: Option<usize>,
}

impl TitleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a candidate, or blank it if `key` is already at `level`.
    pub fn register(&mut self, level: usize, key: &str, candidate: TextPosition) {
        let Some(slot) = self.levels.get_mut(level) else {
            return;
        };
        match slot.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = TextPosition::new("", -1),
            None => slot.push((key.to_string(), candidate)),
        }
    }

    /// Offer body text that is part of the `<title>` element; only the
    /// longest one is kept.
    pub fn offer_doc_title_excerpt(&mut self, text: &str, position: i64) {
        let len = text.chars().count();
        if self.doc_title_len.is_some_and(|best| best >= len) {
            return;
        }
        self.doc_title_len = Some(len);
        let slot = &mut self.levels[DOC_TITLE_LEVEL];
        slot.retain(|(k, _)| k != DOC_TITLE_KEY);
        slot.push((DOC_TITLE_KEY.to_string(), TextPosition::new(text, position)));
    }

    /// Best candidate longer than `min_len` characters: levels are scanned
    /// best first, candidates in registration order. Falls back to
    /// `doc_title` at position 0.
    pub fn resolve(&self, min_len: usize, doc_title: &str) -> TextPosition {
        self.levels
            .iter()
            .flatten()
            .map(|(_, candidate)| candidate)
            .find(|candidate| candidate.text.chars().count() > min_len)
            .cloned()
            .unwrap_or_else(|| TextPosition::new(doc_title, 0))
    }

    pub fn candidates(&self) -> impl Iterator<Item = (usize, &str, &TextPosition)> {
        self.levels
            .iter()
            .enumerate()
            .flat_map(|(level, slot)| slot.iter().map(move |(k, c)| (level, k.as_str(), c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_beats_length() {
        let mut table = TitleTable::new();
        table.register(5, "h5ish", TextPosition::new("a much longer candidate title text here", 40));
        table.register(2, "h2", TextPosition::new("fifteen chars!!", 12));
        let title = table.resolve(10, "fallback");
        assert_eq!(title.text, "fifteen chars!!");
        assert_eq!(title.position, 12);
    }

    #[test]
    fn short_candidates_fall_through_to_next_level() {
        let mut table = TitleTable::new();
        table.register(0, "h1", TextPosition::new("Home", 3));
        table.register(3, "h3", TextPosition::new("The real headline", 20));
        assert_eq!(table.resolve(10, "").text, "The real headline");
    }

    #[test]
    fn repeated_key_is_blanked() {
        let mut table = TitleTable::new();
        table.register(ATTRIBUTE_LEVEL, "post-title", TextPosition::new("First post title", 10));
        table.register(ATTRIBUTE_LEVEL, "post-title", TextPosition::new("Second post title", 30));
        assert_eq!(table.resolve(10, "Site name | Page"), TextPosition::new("Site name | Page", 0));
    }

    #[test]
    fn longest_doc_title_excerpt_wins() {
        let mut table = TitleTable::new();
        table.offer_doc_title_excerpt("Breaking news ", 5);
        table.offer_doc_title_excerpt("Short one ", 9);
        table.offer_doc_title_excerpt("Breaking news today ", 12);
        let all: Vec<_> = table.candidates().collect();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].2.text, "Breaking news today ");
    }
}
