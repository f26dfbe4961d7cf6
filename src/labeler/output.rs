//! Labeler output reader.
//!
//! The output repeats every input line with the predicted label appended,
//! optionally as `label/score`. Date spans are rebuilt from runs of `B`/`I`
//! labels; with a positive threshold, low-confidence `O` tokens right after
//! such a run are collected as an uncertain (second chance) span instead.

use crate::engine::record::{FILE_MARKER, Label};
use crate::engine::resolve::CandidatePool;
use crate::error::{Error, Result};
use std::io::BufRead;

/// Candidate spans of one document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LabeledDocument {
    /// Name from the file marker, empty for lines before any marker.
    pub name: String,
    pub pool: CandidatePool,
}

#[derive(Default)]
struct SpanState {
    text: String,
    /// The open span started on a date label.
    first_chance: bool,
    previous: Option<String>,
    score: f64,
}

impl SpanState {
    fn append(&mut self, text: &str) {
        if self.previous.as_deref() != Some(text) {
            self.text.push_str(text);
            self.text.push(' ');
        }
        self.previous = Some(text.to_string());
    }

    fn close(&mut self, pool: &mut CandidatePool) {
        if !self.text.is_empty() {
            let span = self.text.trim().to_string();
            if self.first_chance {
                pool.first.push(span);
                pool.scores.push(self.score);
            } else {
                pool.second.push(span);
            }
            self.text.clear();
            self.first_chance = false;
        }
        self.previous = None;
    }
}

/// Split labeler output into per-document candidate pools, in input order.
///
/// `text_column` is the index of the TEXT feature in the table schema.
pub fn read_labeled<R: BufRead>(reader: R, text_column: usize, threshold: f64) -> Result<Vec<LabeledDocument>> {
    let marker = regex!(r"^DCTFINDER_FILE (\S*)(?:\t|$)");
    let mut documents = Vec::new();
    let mut current: Option<LabeledDocument> = None;
    let mut span = SpanState::default();

    for (n, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| Error::io("reading labeler output", e))?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with(FILE_MARKER) {
            let name = marker
                .captures(line)
                .and_then(|c| c.get(1))
                .ok_or_else(|| Error::format(format!("line {}: malformed file marker", n + 1)))?;
            if let Some(mut done) = current.take() {
                span.close(&mut done.pool);
                documents.push(done);
            }
            span = SpanState::default();
            current = Some(LabeledDocument { name: name.as_str().to_string(), pool: CandidatePool::default() });
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        let (Some(last), Some(text)) = (fields.last(), fields.get(text_column)) else {
            return Err(Error::format(format!("line {}: missing text column {text_column}", n + 1)));
        };
        if fields.len() < 2 {
            return Err(Error::format(format!("line {}: no label", n + 1)));
        }
        let (label, score) = parse_label(last).map_err(|msg| Error::format(format!("line {}: {msg}", n + 1)))?;

        let document = current.get_or_insert_with(LabeledDocument::default);
        if label.is_date() {
            span.append(text);
            span.first_chance = true;
            span.score = score;
        } else if threshold > 0.0 && score < threshold && !span.first_chance {
            span.append(text);
        } else {
            span.close(&mut document.pool);
        }
    }

    if let Some(mut done) = current {
        span.close(&mut done.pool);
        documents.push(done);
    }
    Ok(documents)
}

fn parse_label(field: &str) -> std::result::Result<(Label, f64), String> {
    let (label, score) = match field.split_once('/') {
        Some((label, score)) => {
            let score = score.trim().parse::<f64>().map_err(|_| format!("bad score '{score}'"))?;
            (label, score)
        }
        None => (field, 1.0),
    };
    let label = Label::parse(label.trim()).ok_or_else(|| format!("unknown label '{label}'"))?;
    Ok((label, score))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(text: &str, threshold: f64) -> Vec<LabeledDocument> {
        read_labeled(text.as_bytes(), 0, threshold).unwrap()
    }

    #[test]
    fn spans_from_begin_inside_runs() {
        let out = "\
DCTFINDER_FILE page.html\t3\tO/0.99
# 0.87
March\t1\tB/0.95
3\t1\tI/0.91
3\t1\tI/0.91
2012\t1\tI/0.90
posted\t1\tO/0.99

Jan\t1\tB
";
        let docs = read(out, 0.0);
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].name, "page.html");
        assert_eq!(docs[0].pool.first, ["March 3 2012", "Jan"]);
        assert_eq!(docs[0].pool.scores, [0.90, 1.0]);
        assert!(docs[0].pool.second.is_empty());
    }

    #[test]
    fn uncertain_tokens_form_second_chance_spans() {
        let out = "\
DCTFINDER_FILE a
by\t1\tO/0.99
12\t1\tO/0.55
May\t1\tO/0.60
said\t1\tO/0.97
";
        let docs = read(out, 0.9);
        assert_eq!(docs[0].pool.second, ["12 May"]);
        assert!(docs[0].pool.first.is_empty());

        let docs = read(out, 0.0);
        assert!(docs[0].pool.is_empty());
    }

    #[test]
    fn pending_span_closes_on_document_switch() {
        let out = "\
DCTFINDER_FILE a
2011\t1\tB/0.8
DCTFINDER_FILE b
2012\t1\tB/0.7
";
        let docs = read(out, 0.0);
        assert_eq!(docs.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(docs[0].pool.first, ["2011"]);
        assert_eq!(docs[0].pool.scores, [0.8]);
        assert_eq!(docs[1].pool.first, ["2012"]);
        assert_eq!(docs[1].pool.scores, [0.7]);
    }

    #[test]
    fn lines_before_any_marker_form_an_unnamed_document() {
        let docs = read("2012\tB\n", 0.0);
        assert_eq!(docs, [LabeledDocument {
            name: String::new(),
            pool: CandidatePool { first: vec!["2012".into()], scores: vec![1.0], second: vec![] },
        }]);
    }

    #[test]
    fn unnamed_pages_round_trip_through_the_table() {
        use crate::engine::record::{FeatureGroups, FeatureRecord, Row, Schema};
        use crate::labeler::TableWriter;

        let record = FeatureRecord { text: "2012".into(), label: Label::Begin, ..FeatureRecord::default() };
        let rows = [Row::Document(String::new()), Row::Record(record), Row::Separator];
        let mut writer = TableWriter::new(Vec::new(), Schema::new(FeatureGroups::TEXT));
        writer.write_rows(&rows).unwrap();
        let table = writer.finish().unwrap();

        let docs = read_labeled(&table[..], 0, 0.0).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].name, "");
        assert_eq!(docs[0].pool.first, ["2012"]);
    }

    #[test]
    fn malformed_lines_are_format_errors() {
        assert!(matches!(read_labeled("x\tB/high\n".as_bytes(), 0, 0.0), Err(Error::Format(_))));
        assert!(matches!(read_labeled("x\tQ\n".as_bytes(), 0, 0.0), Err(Error::Format(_))));
        assert!(matches!(read_labeled("x\tB\n".as_bytes(), 4, 0.0), Err(Error::Format(_))));
        assert!(matches!(read_labeled("DCTFINDER_FILE\tO\n".as_bytes(), 0, 0.0), Err(Error::Format(_))));
    }
}
