//! Date-list merge rules shared by the importer and the dedupper.

use std::collections::HashSet;

use jiff::civil::Date;

use crate::models::{MergePolicy, ShowTime};

impl MergePolicy {
    /// Combines stored and incoming show times. Stored entries come first,
    /// in their original order, followed by new entries in incoming order.
    pub fn merge(self, existing: &[ShowTime], incoming: &[ShowTime]) -> Vec<ShowTime> {
        match self {
            MergePolicy::Accumulate => accumulate(existing, incoming),
            MergePolicy::OverwriteSameDay => overwrite_same_day(existing, incoming),
        }
    }
}

/// Appends every incoming entry whose exact `(date, time)` is not present yet.
pub fn accumulate(existing: &[ShowTime], incoming: &[ShowTime]) -> Vec<ShowTime> {
    let mut merged = existing.to_vec();
    for show_time in incoming {
        if !merged.contains(show_time) {
            merged.push(show_time.clone());
        }
    }
    merged
}

/// Drops stored entries on any date the import mentions, then accumulates.
pub fn overwrite_same_day(existing: &[ShowTime], incoming: &[ShowTime]) -> Vec<ShowTime> {
    let replaced: HashSet<Date> = incoming.iter().map(|s| s.date).collect();
    let kept: Vec<ShowTime> =
        existing.iter().filter(|s| !replaced.contains(&s.date)).cloned().collect();
    accumulate(&kept, incoming)
}

/// Row-level changes that turn the stored date list into a merged one.
#[derive(Debug, Default, PartialEq)]
pub struct DateChanges {
    pub remove: Vec<i32>,
    pub add: Vec<ShowTime>,
}

impl DateChanges {
    pub fn is_empty(&self) -> bool {
        self.remove.is_empty() && self.add.is_empty()
    }
}

/// Multiset difference between stored rows and the merged list, so rows
/// that survive the merge keep their ids.
pub fn changes(existing: &[(i32, ShowTime)], merged: &[ShowTime]) -> DateChanges {
    let mut remaining = merged.to_vec();
    let mut remove = Vec::new();
    for (id, show_time) in existing {
        match remaining.iter().position(|m| m == show_time) {
            Some(pos) => {
                remaining.remove(pos);
            },
            None => remove.push(*id),
        }
    }
    DateChanges { remove, add: remaining }
}
