//! Windowing pass.
//!
//! Runs once the whole document is extracted: fills the features that depend
//! on the title and on document totals, then keeps only what surrounds date
//! tokens.
//!
//! ```text
//!  ... t t t t [D] t t t t t ...        W = 2
//!          ───  ▲  ───
//!    queued  flushed   countdown
//!  ──────────▶ Sep t t D t t Sep
//! ```
//!
//! A date record flushes the trailing queue (the last W pruned records) and
//! restarts a countdown of W text records kept after it. Everything else is
//! pruned; each pruned run leaves one separator row.

use crate::engine::extractor::{DocumentTotals, LONG_TAG_WORDS};
use crate::engine::metrics::FilterMetrics;
use crate::engine::record::{FeatureRecord, Row, disc_title_distance};
use crate::engine::title::TextPosition;
use std::collections::VecDeque;
use std::time::Instant;

/// Date tokens closer than this many words count as "around".
const AROUND_WORDS: i64 = 100;

/// Fill the document-level features and prune far-from-date records.
///
/// Outside training, records of tags longer than the long-tag limit are
/// dropped without leaving a separator.
pub fn filter(
    rows: Vec<Row>,
    title: &TextPosition,
    totals: &DocumentTotals,
    window: usize,
    drop_long_tags: bool,
) -> (Vec<Row>, FilterMetrics) {
    let started = Instant::now();
    let mut metrics = FilterMetrics::default();
    let title_words = title.word_count();

    let mut kept = Vec::with_capacity(rows.len());
    let mut queue: VecDeque<FeatureRecord> = VecDeque::with_capacity(window + 1);
    let mut remaining = 0;
    let mut last_is_separator = false;

    for row in rows {
        let mut record = match row {
            Row::Record(record) => record,
            other => {
                if other == Row::Separator {
                    metrics.separators += 1;
                }
                kept.push(other);
                continue;
            }
        };
        if drop_long_tags && record.word_number_in_tag > LONG_TAG_WORDS {
            metrics.dropped_long += 1;
            continue;
        }
        update(&mut record, title, title_words, totals);

        if record.date_vocabulary {
            let position = record.position;
            record.date_elements_around =
                totals.date_positions.iter().filter(|&&p| (p - position).abs() < AROUND_WORDS).count() as i64;
            metrics.kept += queue.len() + 1;
            kept.extend(queue.drain(..).map(Row::Record));
            kept.push(Row::Record(record));
            remaining = window;
            last_is_separator = false;
        } else if remaining > 0 {
            if record.is_text() {
                remaining -= 1;
            }
            metrics.kept += 1;
            kept.push(Row::Record(record));
            last_is_separator = false;
        } else {
            if !last_is_separator {
                kept.push(Row::Separator);
                metrics.separators += 1;
                last_is_separator = true;
            }
            queue.push_back(record);
            if queue.len() > window {
                queue.pop_front();
                metrics.pruned += 1;
            }
        }
    }
    metrics.pruned += queue.len();
    metrics.duration = started.elapsed();
    (kept, metrics)
}

fn update(record: &mut FeatureRecord, title: &TextPosition, title_words: i64, totals: &DocumentTotals) {
    let distance = record.position - title.position;
    record.distance_from_title = distance;
    record.distance_from_title_disc = disc_title_distance(distance, title_words);
    record.dates_in_all = totals.date_contents;
    record.position_rate = if totals.words == 0 { 0.0 } else { record.position as f64 / totals.words as f64 };
    record.first_long_tag_position = totals.first_long_tag;
    record.last_long_tag_position = totals.last_long_tag;
    record.distance_from_first_long_tag = totals.first_long_tag - record.position;
    record.distance_from_last_long_tag = record.position - totals.last_long_tag;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::record::{AFTER_LOW, BEFORE_LOW, INSIDE, RecordKind};

    fn word(text: &str, position: i64) -> Row {
        Row::Record(FeatureRecord { text: text.to_string(), position, ..FeatureRecord::default() })
    }

    fn date(position: i64) -> Row {
        Row::Record(FeatureRecord {
            text: "2012-03-04".to_string(),
            position,
            date_vocabulary: true,
            full_date: true,
            ..FeatureRecord::default()
        })
    }

    fn shape(rows: &[Row]) -> Vec<String> {
        rows.iter()
            .map(|r| match r {
                Row::Document(_) => "doc".to_string(),
                Row::Record(r) => r.text.clone(),
                Row::Separator => "|".to_string(),
            })
            .collect()
    }

    fn totals(words: i64, date_positions: Vec<i64>) -> DocumentTotals {
        DocumentTotals { words, date_positions, ..DocumentTotals::default() }
    }

    #[test]
    fn keeps_window_on_each_side_of_a_lone_date() {
        let mut rows = vec![Row::Document("page".into())];
        rows.extend((1..=10).map(|i| word(&format!("a{i}"), i)));
        rows.push(date(11));
        rows.extend((1..=10).map(|i| word(&format!("b{i}"), 11 + i)));
        rows.push(Row::Separator);

        let (kept, metrics) = filter(rows, &TextPosition::default(), &totals(21, vec![11]), 2, true);
        assert_eq!(shape(&kept), ["doc", "|", "a9", "a10", "2012-03-04", "b1", "b2", "|", "|"]);
        assert_eq!(metrics.kept, 5);
        assert_eq!(metrics.pruned, 16);
    }

    #[test]
    fn tag_records_do_not_use_up_the_countdown() {
        let close = Row::Record(FeatureRecord { text: "</p>".into(), kind: RecordKind::CloseTag, position: 2, ..FeatureRecord::default() });
        let rows = vec![date(1), close, word("x", 2), word("y", 3), word("z", 4)];
        let (kept, _) = filter(rows, &TextPosition::default(), &totals(4, vec![1]), 2, true);
        assert_eq!(shape(&kept), ["2012-03-04", "</p>", "x", "y", "|"]);
    }

    #[test]
    fn long_tag_records_are_dropped_outside_training() {
        let long = Row::Record(FeatureRecord { text: "long".into(), word_number_in_tag: 21, ..FeatureRecord::default() });
        let (kept, metrics) = filter(vec![date(1), long.clone()], &TextPosition::default(), &totals(2, vec![1]), 2, true);
        assert_eq!(shape(&kept), ["2012-03-04"]);
        assert_eq!(metrics.dropped_long, 1);

        let (kept, _) = filter(vec![date(1), long], &TextPosition::default(), &totals(2, vec![1]), 2, false);
        assert_eq!(shape(&kept), ["2012-03-04", "long"]);
    }

    #[test]
    fn fills_document_level_features() {
        let title = TextPosition::new("A Short Title", 10);
        let totals = DocumentTotals {
            words: 40,
            date_contents: 2,
            date_positions: vec![9, 12, 150],
            first_long_tag: 30,
            last_long_tag: 5,
        };
        let (kept, _) = filter(vec![date(9), date(12), word("w", 20)], &title, &totals, 2, true);
        let recs: Vec<_> = kept.iter().filter_map(Row::record).collect();

        assert_eq!(recs[0].distance_from_title, -1);
        assert_eq!(recs[0].distance_from_title_disc, INSIDE);
        assert_eq!(recs[0].date_elements_around, 2);
        assert_eq!(recs[0].dates_in_all, 2);
        assert_eq!(recs[0].distance_from_first_long_tag, 21);
        assert_eq!(recs[0].distance_from_last_long_tag, 4);
        assert!((recs[0].position_rate - 0.225).abs() < 1e-9);
        assert_eq!(recs[1].distance_from_title_disc, AFTER_LOW);
        assert_eq!(recs[2].date_elements_around, 0);

        let before = Row::Record(FeatureRecord { date_vocabulary: true, position: 2, ..FeatureRecord::default() });
        let (kept, _) = filter(vec![before], &title, &totals, 2, true);
        assert_eq!(kept[0].record().unwrap().distance_from_title_disc, BEFORE_LOW);
    }
}
