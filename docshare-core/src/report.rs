// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Human-readable statistics and comparison reports.
//!
//! The wording of these reports is consumed verbatim by callers.

use crate::record::DocumentRecord;
use std::cmp::Ordering;

/// Multi-line usage report for one document.
pub fn usage_statistics(doc: &DocumentRecord) -> String {
    let chain = doc.owner_chain();
    let mut lines = vec![
        format!("This document belongs to the following network: {}", doc.network_id()),
        format!("The creator of this document is: {}", chain.creator()),
        format!("The word count is: {}", doc.word_count()),
        format!("There are {} able to see the document.", chain.count()),
        "The users with access are:".to_string(),
    ];
    lines.extend(chain.members().map(str::to_string));
    lines.push(format!(
        "There is/are {} previous versions on record",
        doc.previous_version_count()
    ));
    lines.join("\n")
}

/// One comparison line. `plural` is used for non-zero differences,
/// `singular` in the "same ... count" form.
fn compare_line(a: &str, b: &str, diff: i64, plural: &str, singular: &str) -> String {
    match diff.cmp(&0) {
        Ordering::Greater => format!("{} has {} more {} than {}", a, diff, plural, b),
        Ordering::Less => format!("{} has {} less {} than {}", a, diff.unsigned_abs(), plural, b),
        Ordering::Equal => format!("{} has the same {} count {}", a, singular, b),
    }
}

/// Three-line comparison of word, user and version counts, from `a`'s
/// point of view.
pub fn compare(a: &DocumentRecord, b: &DocumentRecord) -> String {
    let word_diff = a.word_count() as i64 - b.word_count() as i64;
    let user_diff = a.owner_chain().count() as i64 - b.owner_chain().count() as i64;
    let version_diff = a.previous_version_count() as i64 - b.previous_version_count() as i64;

    [
        compare_line(a.title(), b.title(), word_diff, "words", "word"),
        compare_line(a.title(), b.title(), user_diff, "users", "user"),
        compare_line(a.title(), b.title(), version_diff, "versions", "version"),
    ]
    .join("\n")
}
