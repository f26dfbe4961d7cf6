//! Single-pass HTML tokenizer.
//!
//! This is not an HTML parser: it walks the byte stream once,
//! decoding characters with the current charset, and produces flat
//! [`LexEvent`]s. Malformed markup is skipped or resynchronised, never
//! reported.
//!
//! ```text
//! bytes ─▶ (cap) ─▶ encoding_rs decoder ─▶ char state machine ─▶ LexEvent queue
//!                        ▲                        │
//!                        └──── <meta charset> ────┘
//! ```
//!
//! Rules, most specific first:
//!
//! - `<!-- ... -->` is dropped entirely.
//! - `&name;` is decoded; an entity cut short by whitespace, `<`, `&` or `=`
//!   stays literal text, and so does an unknown name.
//! - `script`, `noscript`, `style` and `option` hide their content; only the
//!   matching close tag is looked for.
//! - `a`, `br` and `img` tags are invisible but their text is kept.
//! - `()[]` are dropped; `:,.|-;` are dropped only when whitespace follows.
//! - A `<` inside an unfinished tag throws the partial tag away.

use crate::engine::entities::{MAX_ENTITY_LEN, decode_entity};
use encoding_rs::{CoderResult, Decoder, Encoding, UTF_8};
use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, Read, Take};
use tracing::{debug, warn};

/// Capacity of the text/tag buffer before it is truncated.
pub const MAX_ENTRY_LEN: usize = 1000;
const ENTRY_TRUNCATED_LEN: usize = 100;
/// Capacity of the held-punctuation buffer before it is truncated.
const MAX_HELD_LEN: usize = 10;
const HELD_TRUNCATED_LEN: usize = 1;

const SKIP_CONTENT: &[&str] = &["script", "noscript", "style", "option"];
const SKIP_TAG: &[&str] = &["a", "br", "img"];
const HELD_PUNCTUATION: &[char] = &[':', ',', '.', '|', '-', ';'];
const DROPPED_PUNCTUATION: &[char] = &['(', ')', '[', ']'];

// --- Events ------------------------------------------------------------------

/// Attribute list of an opening tag. Insertion order is kept, lookups are by
/// (lower-cased) name; a repeated name overwrites the earlier value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::default();
        for (k, v) in iter {
            attrs.insert(k, v);
        }
        attrs
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexEvent {
    /// A word. `spaced` is true when whitespace ended it (as opposed to the
    /// start of a tag or the end of input).
    Text { content: String, spaced: bool },
    /// Opening tag, name lower-cased.
    OpenTag { name: String, attributes: Attributes },
    /// Closing tag, name lower-cased.
    CloseTag { name: String },
}

// --- Tokenizer ----------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttValue {
    None,
    Unquoted,
    Quoted(char),
}

/// Looking for `</name` (then `>`) inside a skip-content element.
#[derive(Debug)]
struct SkipContent {
    needle: Vec<char>,
    matched: usize,
    closing: bool,
}

impl SkipContent {
    fn new(name: &str) -> Self {
        Self { needle: format!("</{name}").chars().collect(), matched: 0, closing: false }
    }

    /// Returns true once the close tag has been consumed.
    fn feed(&mut self, c: char) -> bool {
        if self.closing {
            return c == '>';
        }
        if self.matched == self.needle.len() {
            if c == '>' {
                return true;
            }
            if c.is_whitespace() {
                self.closing = true;
            } else {
                self.matched = 0;
            }
            return false;
        }
        if c.to_ascii_lowercase() == self.needle[self.matched] {
            self.matched += 1;
        } else {
            self.matched = usize::from(c == '<');
        }
        false
    }
}

/// Lazy stream of [`LexEvent`]s over one document.
///
/// A tokenizer is single-use: build a new one for every document.
pub struct Tokenizer<R: Read> {
    reader: BufReader<Take<R>>,
    encoding: &'static Encoding,
    decoder: Decoder,
    decoded: VecDeque<char>,
    scratch: String,
    eof: bool,
    finished: bool,
    io_error: Option<io::Error>,
    bytes_read: usize,
    events: VecDeque<LexEvent>,

    entry: String,
    held: String,
    entity: Option<String>,
    in_tag: bool,
    closing_tag: bool,
    self_closing: bool,
    tag_name: Option<String>,
    attributes: Attributes,
    att_name: Option<String>,
    att_value: AttValue,
    in_comment: bool,
    comment_dashes: u8,
    skip: Option<SkipContent>,
}

impl<R: Read> Tokenizer<R> {
    /// Tokenize at most `max_bytes` bytes of `reader`, starting in UTF-8.
    pub fn new(reader: R, max_bytes: usize) -> Self {
        let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
        Self {
            reader: BufReader::new(reader.take(limit)),
            encoding: UTF_8,
            decoder: UTF_8.new_decoder(),
            decoded: VecDeque::new(),
            scratch: String::with_capacity(32),
            eof: false,
            finished: false,
            io_error: None,
            bytes_read: 0,
            events: VecDeque::new(),
            entry: String::new(),
            held: String::new(),
            entity: None,
            in_tag: false,
            closing_tag: false,
            self_closing: false,
            tag_name: None,
            attributes: Attributes::default(),
            att_name: None,
            att_value: AttValue::None,
            in_comment: false,
            comment_dashes: 0,
            skip: None,
        }
    }

    /// Charset currently used to decode bytes.
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    pub fn bytes_read(&self) -> usize {
        self.bytes_read
    }

    /// Read error that ended the stream early, if any.
    pub fn take_io_error(&mut self) -> Option<io::Error> {
        self.io_error.take()
    }

    // --- Decoding -------------------------------------------------------------

    fn next_char(&mut self) -> Option<char> {
        loop {
            if let Some(c) = self.decoded.pop_front() {
                return Some(c);
            }
            if self.eof {
                return None;
            }
            let next = match self.reader.fill_buf() {
                Ok(buf) => buf.first().copied(),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.io_error = Some(e);
                    None
                }
            };
            match next {
                Some(byte) => {
                    self.reader.consume(1);
                    self.bytes_read += 1;
                    self.decode(&[byte], false);
                }
                None => {
                    self.eof = true;
                    self.decode(&[], true);
                }
            }
        }
    }

    fn decode(&mut self, mut bytes: &[u8], last: bool) {
        self.scratch.clear();
        self.scratch.reserve(32);
        loop {
            let (result, read, _) = self.decoder.decode_to_string(bytes, &mut self.scratch, last);
            bytes = &bytes[read..];
            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => {
                    let needed = self.decoder.max_utf8_buffer_length(bytes.len()).unwrap_or(32);
                    self.scratch.reserve(needed.max(4));
                }
            }
        }
        self.decoded.extend(self.scratch.chars());
    }

    fn switch_charset(&mut self, label: &str) {
        let encoding = match Encoding::for_label(label.trim().as_bytes()) {
            Some(encoding) => encoding,
            None => {
                warn!(charset = label, "unknown charset, falling back to UTF-8");
                UTF_8
            }
        };
        if encoding != self.encoding {
            debug!(charset = encoding.name(), "charset switch");
            self.encoding = encoding;
            self.decoder = encoding.new_decoder_without_bom_handling();
        }
    }

    fn detect_charset(&mut self, attributes: &Attributes) {
        let label = attributes.get("charset").map(str::to_string).or_else(|| {
            let content = attributes.get("content")?;
            let caps = regex!(r#"(?i)charset=([^"\s;]+)"#).captures(content)?;
            Some(caps[1].to_string())
        });
        if let Some(label) = label {
            self.switch_charset(&label);
        }
    }

    // --- Character state machine ----------------------------------------------

    fn feed(&mut self, c: char, from_entity: bool) {
        if let Some(skip) = self.skip.as_mut() {
            if skip.feed(c) {
                self.skip = None;
            }
            return;
        }

        // Third character of `<!--`.
        if c == '-' && self.in_tag && self.entry == "!" && self.held == "-" {
            self.in_comment = true;
            self.reset_tag();
            return;
        }
        if self.in_comment {
            match c {
                '-' => self.comment_dashes = (self.comment_dashes + 1).min(2),
                '>' if self.comment_dashes == 2 => {
                    self.in_comment = false;
                    self.comment_dashes = 0;
                }
                _ => self.comment_dashes = 0,
            }
            return;
        }

        if !from_entity {
            if let Some(mut body) = self.entity.take() {
                match c {
                    ';' => {
                        match decode_entity(&body) {
                            Some(decoded) => self.feed(decoded, true),
                            None => self.push_literal(&format!("&{body};")),
                        }
                        return;
                    }
                    '=' | '&' | '<' => self.push_literal(&format!("&{body}")),
                    c if c.is_whitespace() || body.len() >= MAX_ENTITY_LEN => self.push_literal(&format!("&{body}")),
                    c => {
                        body.push(c);
                        self.entity = Some(body);
                        return;
                    }
                }
            }
            if c == '&' {
                self.entity = Some(String::new());
                return;
            }
        }

        if self.in_tag {
            if let AttValue::Quoted(quote) = self.att_value {
                if c == quote && !from_entity {
                    self.finish_attribute();
                } else {
                    self.push_entry(c);
                }
                return;
            }
        }

        if c.is_whitespace() {
            if self.in_tag {
                match self.att_value {
                    // Value not started yet: `name= "value"`.
                    AttValue::Unquoted if self.entry.is_empty() => {}
                    AttValue::Unquoted => self.finish_attribute(),
                    _ if self.entry.is_empty() => {}
                    _ if self.tag_name.is_none() => self.tag_name = Some(std::mem::take(&mut self.entry)),
                    // Name not followed by `=` yet: `name ="value"`.
                    _ => self.att_name = Some(std::mem::take(&mut self.entry).to_ascii_lowercase()),
                }
                self.entry.clear();
            } else if !self.entry.is_empty() {
                let content = std::mem::take(&mut self.entry);
                self.events.push_back(LexEvent::Text { content, spaced: true });
            }
            self.held.clear();
            return;
        }

        if !self.held.is_empty() {
            let held = std::mem::take(&mut self.held);
            self.entry.push_str(&held);
        }

        match c {
            '<' if !from_entity => {
                if self.in_tag {
                    debug!(partial = %self.entry, "unclosed tag discarded");
                    self.reset_tag();
                } else if !self.entry.is_empty() {
                    let content = std::mem::take(&mut self.entry);
                    self.events.push_back(LexEvent::Text { content, spaced: false });
                }
                self.in_tag = true;
            }
            '>' if !from_entity => {
                if self.in_tag {
                    self.finish_tag();
                }
            }
            '=' if self.in_tag && self.att_value == AttValue::None => {
                let name = std::mem::take(&mut self.entry);
                if self.tag_name.is_none() {
                    self.tag_name = Some(name);
                } else {
                    if !name.is_empty() {
                        self.att_name = Some(name.to_ascii_lowercase());
                    }
                    if self.att_name.is_some() {
                        self.att_value = AttValue::Unquoted;
                    }
                }
            }
            '"' | '\'' if self.in_tag && self.att_value == AttValue::Unquoted && self.entry.is_empty() => {
                self.att_value = AttValue::Quoted(c);
            }
            '/' if self.in_tag && self.att_value != AttValue::Unquoted => {
                if self.tag_name.is_none() && self.entry.is_empty() && self.attributes.is_empty() {
                    self.closing_tag = true;
                } else {
                    if self.tag_name.is_none() && !self.entry.is_empty() {
                        self.tag_name = Some(std::mem::take(&mut self.entry));
                    }
                    self.self_closing = true;
                }
            }
            c if HELD_PUNCTUATION.contains(&c) => {
                self.held.push(c);
                if self.held.len() > MAX_HELD_LEN {
                    debug!("held punctuation buffer overflow, truncated");
                    self.held.truncate(HELD_TRUNCATED_LEN);
                }
            }
            c if DROPPED_PUNCTUATION.contains(&c) => {}
            c => self.push_entry(c),
        }
    }

    fn push_entry(&mut self, c: char) {
        self.entry.push(c);
        if self.entry.len() > MAX_ENTRY_LEN {
            debug!("entry buffer overflow, truncated");
            let mut cut = ENTRY_TRUNCATED_LEN;
            while !self.entry.is_char_boundary(cut) {
                cut -= 1;
            }
            self.entry.truncate(cut);
        }
    }

    fn push_literal(&mut self, text: &str) {
        if !self.held.is_empty() {
            let held = std::mem::take(&mut self.held);
            self.entry.push_str(&held);
        }
        for c in text.chars() {
            self.push_entry(c);
        }
    }

    fn finish_attribute(&mut self) {
        if let Some(name) = self.att_name.take() {
            let value = std::mem::take(&mut self.entry);
            self.attributes.insert(name, value);
        }
        self.entry.clear();
        self.att_value = AttValue::None;
    }

    fn finish_tag(&mut self) {
        let tail = std::mem::take(&mut self.entry);
        if self.closing_tag {
            let name = self.tag_name.take().unwrap_or(tail);
            if !name.is_empty() {
                self.close_tag(name.to_ascii_lowercase());
            }
        } else {
            if self.att_value == AttValue::Unquoted && self.att_name.is_some() {
                self.entry = tail;
                self.finish_attribute();
            } else if self.tag_name.is_none() && !tail.is_empty() {
                self.tag_name = Some(tail);
            }
            if let Some(name) = self.tag_name.take() {
                let name = name.to_ascii_lowercase();
                let attributes = std::mem::take(&mut self.attributes);
                let self_closing = self.self_closing;
                self.open_tag(name.clone(), attributes, self_closing);
                if self_closing {
                    self.close_tag(name);
                }
            }
        }
        self.reset_tag();
    }

    fn open_tag(&mut self, name: String, attributes: Attributes, self_closing: bool) {
        if name == "meta" {
            self.detect_charset(&attributes);
        }
        if SKIP_TAG.contains(&name.as_str()) {
            return;
        }
        if SKIP_CONTENT.contains(&name.as_str()) {
            if !self_closing {
                self.skip = Some(SkipContent::new(&name));
            }
            return;
        }
        self.events.push_back(LexEvent::OpenTag { name, attributes });
    }

    fn close_tag(&mut self, name: String) {
        if SKIP_TAG.contains(&name.as_str()) || SKIP_CONTENT.contains(&name.as_str()) {
            return;
        }
        self.events.push_back(LexEvent::CloseTag { name });
    }

    fn reset_tag(&mut self) {
        self.in_tag = false;
        self.closing_tag = false;
        self.self_closing = false;
        self.tag_name = None;
        self.attributes = Attributes::default();
        self.att_name = None;
        self.att_value = AttValue::None;
        self.entry.clear();
        self.held.clear();
    }

    fn finish(&mut self) {
        if let Some(body) = self.entity.take() {
            self.push_literal(&format!("&{body}"));
        }
        if !self.in_tag && !self.in_comment && self.skip.is_none() && !self.entry.is_empty() {
            let content = std::mem::take(&mut self.entry);
            self.events.push_back(LexEvent::Text { content, spaced: false });
        }
    }
}

impl<R: Read> Iterator for Tokenizer<R> {
    type Item = LexEvent;

    fn next(&mut self) -> Option<LexEvent> {
        loop {
            if let Some(event) = self.events.pop_front() {
                return Some(event);
            }
            if self.finished {
                return None;
            }
            match self.next_char() {
                Some(c) => self.feed(c, false),
                None => {
                    self.finish();
                    self.finished = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(html: &[u8]) -> Vec<LexEvent> {
        Tokenizer::new(html, 100_000).collect()
    }

    fn text(content: &str, spaced: bool) -> LexEvent {
        LexEvent::Text { content: content.to_string(), spaced }
    }

    fn open(name: &str, attrs: &[(&str, &str)]) -> LexEvent {
        LexEvent::OpenTag { name: name.to_string(), attributes: attrs.iter().copied().collect() }
    }

    fn close(name: &str) -> LexEvent {
        LexEvent::CloseTag { name: name.to_string() }
    }

    #[test]
    fn words_and_tags() {
        let events = lex(b"<P class=\"headline big\" id=top>Hello world</p>");
        assert_eq!(
            events,
            vec![
                open("p", &[("class", "headline big"), ("id", "top")]),
                text("Hello", true),
                text("world", false),
                close("p"),
            ]
        );
    }

    #[test]
    fn spaces_around_attribute_equals() {
        let events = lex(b"<div class = \"post-title\" id= top hidden lang =en>x</div>");
        assert_eq!(events[0], open("div", &[("class", "post-title"), ("id", "top"), ("lang", "en")]));
    }

    #[test]
    fn truncated_sequence_at_end_is_replaced() {
        let events = lex(b"ab\xE2\x82");
        assert_eq!(events, vec![text("ab\u{FFFD}", false)]);
    }

    #[test]
    fn comments_are_dropped() {
        let events = lex(b"a <!-- <p>hidden</p> -- still --> b");
        assert_eq!(events, vec![text("a", true), text("b", false)]);
    }

    #[test]
    fn entities_decode_without_opening_tags() {
        let events = lex(b"caf&eacute; &lt;b&gt; AT&T x&#233;");
        assert_eq!(events, vec![text("café", true), text("<b>", true), text("AT&T", true), text("xé", false)]);
    }

    #[test]
    fn nbsp_entity_separates_words() {
        let events = lex(b"12&nbsp;March");
        assert_eq!(events, vec![text("12", true), text("March", false)]);
    }

    #[test]
    fn skip_content_elements_hide_everything() {
        let events = lex(b"<script>if (a<b) { s = \"</p>\"; }</script><p>ok</p><STYLE>p{}</Style >");
        assert_eq!(events, vec![open("p", &[]), text("ok", false), close("p")]);
    }

    #[test]
    fn skip_tags_keep_their_text() {
        let events = lex(b"<a href=\"/x\">link</a> text<br/>more <img src=x.png>");
        assert_eq!(events, vec![text("link", false), text("text", false), text("more", true)]);
    }

    #[test]
    fn punctuation_rules() {
        let events = lex(b"Posted: 12-25-2012. (today) [x]");
        assert_eq!(events, vec![text("Posted", true), text("12-25-2012", true), text("today", true), text("x", false)]);
    }

    #[test]
    fn unclosed_tag_is_discarded() {
        let events = lex(b"<div class=\"x\" <p>text</p>");
        assert_eq!(events, vec![open("p", &[]), text("text", false), close("p")]);
    }

    #[test]
    fn self_closing_tag_opens_and_closes() {
        let events = lex(b"<span/>");
        assert_eq!(events, vec![open("span", &[]), close("span")]);
    }

    #[test]
    fn meta_charset_switches_decoding() {
        let events = lex(b"<meta http-equiv=\"Content-Type\" content=\"text/html; charset=iso-8859-1\">caf\xE9");
        assert_eq!(events, vec![open("meta", &[("http-equiv", "Content-Type"), ("content", "text/html; charset=iso-8859-1")]), text("café", false)]);
    }

    #[test]
    fn unknown_charset_falls_back_to_utf8() {
        let mut tokenizer = Tokenizer::new(&b"<meta charset=\"x-klingon\">caf\xC3\xA9"[..], 1000);
        let events: Vec<_> = tokenizer.by_ref().collect();
        assert_eq!(events.last(), Some(&text("café", false)));
        assert_eq!(tokenizer.encoding(), UTF_8);
    }

    #[test]
    fn byte_cap_stops_reading() {
        let input = "word ".repeat(100);
        let mut tokenizer = Tokenizer::new(input.as_bytes(), 12);
        let words: Vec<_> = tokenizer.by_ref().collect();
        assert_eq!(words, vec![text("word", true), text("word", true), text("wo", false)]);
        assert_eq!(tokenizer.bytes_read(), 12);
    }

    #[test]
    fn oversized_entry_is_truncated() {
        let input = "x".repeat(MAX_ENTRY_LEN + 5);
        let events = lex(input.as_bytes());
        match &events[..] {
            [LexEvent::Text { content, .. }] => assert!(content.len() < MAX_ENTRY_LEN),
            other => panic!("unexpected {other:?}"),
        }
    }
}
