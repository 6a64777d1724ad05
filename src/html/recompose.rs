//! Attribute reattachment
//!
//! Walks the tags of translated markup and the original attribute records in
//! lockstep. A record is consumed only when the next translated tag has the
//! same name and opening/closing role; any other tag is treated as drift from
//! the translation engine and emitted unchanged, without attributes, and
//! without moving the cursor.
//!
//! This is best effort by construction. Two sibling tags of the same name that
//! the engine swapped will receive each other's attributes; a renamed tag loses
//! them. Exact restoration is only guaranteed when tag identity and order
//! survive translation.

use super::decompose::AttributeRecord;
use super::tokenizer::{Token, tokenize};

/// What happened to the records during one recompose run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecomposeReport {
    /// Records reattached to a matching tag
    pub restored: usize,
    /// Translated tags that matched no record and were emitted as-is
    pub drifted: usize,
    /// Records left over after the last translated tag
    pub unconsumed: usize,
}

impl RecomposeReport {
    /// True when every record found its tag and no foreign tag appeared
    pub fn is_exact(&self) -> bool {
        self.drifted == 0 && self.unconsumed == 0
    }
}

/// Reinsert original attributes into translated markup
///
/// Never fails; see the module docs for the matching rule.
pub fn recompose(translated: &str, records: &[AttributeRecord]) -> String {
    recompose_with_report(translated, records).0
}

/// [`recompose`], also reporting how well the tags lined up
pub fn recompose_with_report(
    translated: &str,
    records: &[AttributeRecord],
) -> (String, RecomposeReport) {
    let mut output = String::with_capacity(translated.len() + translated.len() / 2);
    let mut report = RecomposeReport::default();
    let mut idx = 0;

    for token in tokenize(translated) {
        match token {
            Token::Text(text) => output.push_str(text),
            Token::Tag(tag) => match records.get(idx) {
                Some(record) if record.matches(&tag) => {
                    output.push_str(&record.source);
                    report.restored += 1;
                    idx += 1;
                }
                _ => {
                    output.push_str(tag.literal);
                    report.drifted += 1;
                }
            },
        }
    }

    report.unconsumed = records.len() - idx;
    (output, report)
}
