//! Tag co-occurrence: how often two tag values label the same entry.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::store::EntryTable;
use crate::types::TagDimension;

/// An unordered tag pair, stored with `first < second`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PairCount {
    pub first: String,
    pub second: String,
    pub count: usize,
}

/// Count unordered pairs of distinct values appearing together in a row.
///
/// Each row is de-duplicated before pairing, so a repeated value never
/// pairs with itself or counts twice. Pairs are canonicalised so `(A, B)`
/// and `(B, A)` share a bucket. Sorted by count descending, then by pair.
pub fn count_pairs<I, R, S>(rows: I) -> Vec<PairCount>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts: HashMap<(String, String), usize> = HashMap::new();
    for row in rows {
        let values: BTreeSet<String> = row.into_iter().map(|s| s.as_ref().to_string()).collect();
        let values: Vec<&String> = values.iter().collect();
        for (i, first) in values.iter().enumerate() {
            for second in &values[i + 1..] {
                *counts
                    .entry(((*first).clone(), (*second).clone()))
                    .or_default() += 1;
            }
        }
    }

    let mut out: Vec<PairCount> = counts
        .into_iter()
        .map(|((first, second), count)| PairCount {
            first,
            second,
            count,
        })
        .collect();
    out.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.first.cmp(&b.first))
            .then_with(|| a.second.cmp(&b.second))
    });
    out
}

/// Co-occurrence counts of tag values along `dimension`, within entries.
pub fn co_occurrence(entries: &EntryTable, dimension: TagDimension) -> Vec<PairCount> {
    count_pairs(entries.iter().map(|e| e.tags.get(dimension)))
}
