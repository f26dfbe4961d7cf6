//! Feature table writer.

use crate::engine::record::{FeatureRecord, Row, Schema};
use crate::error::{Error, Result};
use std::io::Write;

/// Writes rows as labeler input: one tab-separated line per record, the label
/// last, a blank line per separator.
pub struct TableWriter<W: Write> {
    out: W,
    schema: Schema,
    lines: usize,
}

impl<W: Write> TableWriter<W> {
    pub fn new(out: W, schema: Schema) -> Self {
        Self { out, schema, lines: 0 }
    }

    pub fn write_rows<'a>(&mut self, rows: impl IntoIterator<Item = &'a Row>) -> Result<()> {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    pub fn write_row(&mut self, row: &Row) -> Result<()> {
        match row {
            Row::Document(name) => self.write_record(&FeatureRecord::file_marker(name)),
            Row::Record(record) => self.write_record(record),
            Row::Separator => self.line(format_args!("")),
        }
    }

    fn write_record(&mut self, record: &FeatureRecord) -> Result<()> {
        let mut line = String::with_capacity(128);
        for feature in self.schema.features() {
            line.push_str(&record.value(feature).to_string());
            line.push('\t');
        }
        self.line(format_args!("{line}{}", record.label))
    }

    fn line(&mut self, args: std::fmt::Arguments<'_>) -> Result<()> {
        self.lines += 1;
        writeln!(self.out, "{args}").map_err(|e| Error::io("writing feature table", e))
    }

    /// Lines written so far.
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Flush and hand back the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.out.flush().map_err(|e| Error::io("writing feature table", e))?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::record::{FeatureGroups, Label};

    fn write(rows: &[Row], groups: FeatureGroups) -> String {
        let mut writer = TableWriter::new(Vec::new(), Schema::new(groups));
        writer.write_rows(rows).unwrap();
        String::from_utf8(writer.finish().unwrap()).unwrap()
    }

    #[test]
    fn text_only_schema() {
        let record = FeatureRecord { text: "March".into(), label: Label::Begin, ..FeatureRecord::default() };
        let rows = [Row::Document("a b.html".into()), Row::Record(record), Row::Separator];
        assert_eq!(write(&rows, FeatureGroups::TEXT), "DCTFINDER_FILE a_b.html\tO\nMarch\tB\n\n");
    }

    #[test]
    fn every_value_is_tab_terminated() {
        let record = FeatureRecord { text: "x".into(), date_vocabulary: true, ..FeatureRecord::default() };
        let out = write(&[Row::Record(record)], FeatureGroups::all());
        let line = out.trim_end_matches('\n');
        assert_eq!(line.split('\t').count(), Schema::default().features().count() + 1);
        assert!(line.ends_with("\tO"));
        let date_vocabulary = Schema::default().column(crate::engine::record::Feature::DateVocabulary).unwrap();
        assert_eq!(line.split('\t').nth(date_vocabulary), Some("1"));
    }
}
