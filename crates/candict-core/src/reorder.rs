//! Frequency-descending reorder that tolerates near-ties.
//!
//! Two counts within `threshold` of each other compare equal, and equal
//! items keep their previous relative order. A settled entry therefore
//! does not churn when counts drift by one or two.

use std::cmp::Ordering;

use crate::item::Entry;
use crate::settings::settings;

/// Ordering of two counts: the larger sorts first only when it leads by
/// more than `threshold`.
pub fn compare(a: u64, b: u64, threshold: u64) -> Ordering {
    if b.saturating_sub(a) > threshold {
        Ordering::Greater
    } else if a.saturating_sub(b) > threshold {
        Ordering::Less
    } else {
        Ordering::Equal
    }
}

/// Stable in-place sort driven by `cmp`.
///
/// The tie band is not transitive (10 ~ 11 ~ 12 but 12 < 10), so `slice::sort_by`
/// may panic or scramble on it. Each item only moves left past neighbours it
/// strictly precedes, which leaves no adjacent inversion: a second pass is a no-op.
pub fn stable_sort_by<T>(items: &mut [T], mut cmp: impl FnMut(&T, &T) -> Ordering) {
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && cmp(&items[j], &items[j - 1]) == Ordering::Less {
            items.swap(j, j - 1);
            j -= 1;
        }
    }
}

/// Reorder using the configured `reorder.threshold`.
pub fn reorder(entry: &Entry) -> Entry {
    reorder_with(entry, settings().reorder.threshold)
}

pub fn reorder_with(entry: &Entry, threshold: u64) -> Entry {
    let mut pairs: Vec<(String, u64)> = entry
        .words
        .iter()
        .cloned()
        .zip(entry.counts.iter().copied())
        .collect();
    stable_sort_by(&mut pairs, |a, b| compare(a.1, b.1, threshold));

    let (words, counts) = pairs.into_iter().unzip();
    Entry {
        code: entry.code.clone(),
        words,
        counts,
    }
}
