//! Labeler feature templates.
//!
//! A template combines feature columns at relative offsets (`%x[offset,column]`)
//! into one observation. `u` templates produce unigram observations only, `*`
//! templates add the label-bigram variant. Templates naming a column the
//! schema does not write are trimmed to what is left, and dropped when
//! nothing is.

use crate::engine::record::{Feature, Schema};
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Unigram,
    UnigramBigram,
}

struct Template {
    kind: Kind,
    comment: &'static str,
    items: &'static [(Feature, i32)],
}

use Feature::*;

const TEMPLATES: &[Template] = &[
    Template {
        kind: Kind::Unigram,
        comment: "vocabulary window",
        items: &[(Vocabulary, -2), (Vocabulary, -1), (Vocabulary, 0), (Vocabulary, 1)],
    },
    Template {
        kind: Kind::UnigramBigram,
        comment: "preceding vocabulary and full date",
        items: &[(Vocabulary, -1), (Vocabulary, -2), (FullDate, 0)],
    },
    Template {
        kind: Kind::UnigramBigram,
        comment: "tag length",
        items: &[(WordNumberInTagDisc, 0), (Vocabulary, 0), (Vocabulary, -1)],
    },
    Template {
        kind: Kind::UnigramBigram,
        comment: "position in page",
        items: &[(PositionDisc, 0), (Vocabulary, 0), (Vocabulary, -1)],
    },
    Template {
        kind: Kind::Unigram,
        comment: "date density",
        items: &[(DateElementsAroundDisc, 0), (Vocabulary, 0), (Vocabulary, -1), (Vocabulary, -2)],
    },
    Template {
        kind: Kind::UnigramBigram,
        comment: "distance from first long tag",
        items: &[(DistanceFromFirstLongTagDisc, 0), (Vocabulary, 0), (Vocabulary, -1)],
    },
    Template {
        kind: Kind::UnigramBigram,
        comment: "dates so far",
        items: &[(DatesSoFar, 0), (Vocabulary, 0), (Vocabulary, -1)],
    },
    Template {
        kind: Kind::UnigramBigram,
        comment: "full dates so far",
        items: &[(FullDatesSoFar, 0), (Vocabulary, 0), (Vocabulary, -1)],
    },
    Template {
        kind: Kind::UnigramBigram,
        comment: "dates so far by position",
        items: &[(DatesSoFar, 0), (PositionDisc, 0)],
    },
    Template {
        kind: Kind::UnigramBigram,
        comment: "dates in page, full date",
        items: &[(DatesInAllDisc, 0), (FullDate, 0)],
    },
    Template {
        kind: Kind::UnigramBigram,
        comment: "dates in page, vocabulary",
        items: &[(DatesInAllDisc, 0), (Vocabulary, -1), (Vocabulary, 0)],
    },
    Template {
        kind: Kind::Unigram,
        comment: "distance from trigger",
        items: &[(DistanceFromTriggerDisc, 0), (Vocabulary, 0), (Vocabulary, -1), (DatesSoFar, 0)],
    },
    Template {
        kind: Kind::Unigram,
        comment: "distance from anti-trigger",
        items: &[(DistanceFromAntiTriggerDisc, 0), (Vocabulary, 0), (Vocabulary, -1), (DatesSoFar, 0)],
    },
    Template {
        kind: Kind::Unigram,
        comment: "distance from title",
        items: &[(DistanceFromTitleDisc, 0), (Vocabulary, 0), (Vocabulary, -1)],
    },
    Template {
        kind: Kind::Unigram,
        comment: "distance from title, full date",
        items: &[(DistanceFromTitleDisc, 0), (FullDate, 0)],
    },
    Template { kind: Kind::UnigramBigram, comment: "output label bigram", items: &[] },
];

/// Render the template file for `schema`.
pub fn render_templates(schema: &Schema) -> String {
    let mut out = String::new();
    let mut index = 0;
    for template in TEMPLATES {
        let items: Vec<String> = template
            .items
            .iter()
            .filter_map(|&(feature, offset)| schema.column(feature).map(|col| format!("%x[{offset},{col}]")))
            .collect();
        if items.is_empty() && !template.items.is_empty() {
            continue;
        }
        index += 1;
        let prefix = match template.kind {
            Kind::Unigram => 'u',
            Kind::UnigramBigram => '*',
        };
        let _ = writeln!(out, "# {}", template.comment);
        if items.is_empty() {
            let _ = writeln!(out, "{prefix}{index}");
        } else {
            let _ = writeln!(out, "{prefix}{index}:{}", items.join("/"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::record::FeatureGroups;

    #[test]
    fn full_schema_renders_every_template() {
        let schema = Schema::default();
        let voc = schema.column(Vocabulary).unwrap();
        let rendered = render_templates(&schema);
        let lines: Vec<&str> = rendered.lines().filter(|l| !l.starts_with('#')).collect();
        assert_eq!(lines.len(), 16);
        assert_eq!(lines[0], format!("u1:%x[-2,{voc}]/%x[-1,{voc}]/%x[0,{voc}]/%x[1,{voc}]"));
        assert_eq!(lines[15], "*16");
    }

    #[test]
    fn missing_columns_are_trimmed() {
        let rendered = render_templates(&Schema::new(FeatureGroups::TEXT | FeatureGroups::POSITION));
        let lines: Vec<&str> = rendered.lines().filter(|l| !l.starts_with('#')).collect();
        let position = Schema::new(FeatureGroups::TEXT | FeatureGroups::POSITION).column(PositionDisc).unwrap();
        assert_eq!(lines, [format!("*1:%x[0,{position}]"), format!("*2:%x[0,{position}]"), "*3".to_string()]);
    }
}
