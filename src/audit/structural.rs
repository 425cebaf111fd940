use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::keys::{FullKey, TrackKey};
use super::timeline::Timeline;
use crate::models::ListenRecord;

/// Duplicate and collision counts for one collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructuralReport {
    pub total: usize,
    pub exact_duplicates: usize,
    pub unique_count: usize,
    pub collision_group_count: usize,
    pub largest_collision_size: usize,
    /// Only computed when a near-duplicate window was supplied.
    pub near_duplicate_count: Option<usize>,
}

/// Records sharing one exact `listened_at` value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollisionGroup {
    pub listened_at: i64,
    pub size: usize,
}

pub fn analyze(
    records: &[ListenRecord],
    timeline: &Timeline<'_>,
    near_window: Option<u64>,
) -> StructuralReport {
    let total = records.len();
    let exact_duplicates = count_exact_duplicates(records);
    let groups = collision_groups(records);
    let near_duplicate_count = match near_window {
        Some(window) if window > 0 => Some(count_near_duplicates(timeline, window)),
        _ => None,
    };

    log::debug!(
        "Structural: {} total, {} exact duplicates, {} collision groups",
        total,
        exact_duplicates,
        groups.len()
    );

    StructuralReport {
        total,
        exact_duplicates,
        unique_count: total - exact_duplicates,
        collision_group_count: groups.len(),
        largest_collision_size: groups.first().map(|g| g.size).unwrap_or(0),
        near_duplicate_count,
    }
}

/// Count records whose full key already appeared earlier in export order.
/// The first occurrence of each key is never counted.
pub fn count_exact_duplicates(records: &[ListenRecord]) -> usize {
    let mut seen: HashSet<FullKey> = HashSet::with_capacity(records.len());
    records
        .iter()
        .filter(|r| !seen.insert(FullKey::from_record(r)))
        .count()
}

/// Timestamps shared by two or more records, largest group first
/// (ties by ascending timestamp).
pub fn collision_groups(records: &[ListenRecord]) -> Vec<CollisionGroup> {
    let mut by_ts: HashMap<i64, usize> = HashMap::new();
    for ts in records.iter().filter_map(|r| r.listened_at) {
        *by_ts.entry(ts).or_insert(0) += 1;
    }

    let mut groups: Vec<CollisionGroup> = by_ts
        .into_iter()
        .filter(|&(_, size)| size > 1)
        .map(|(listened_at, size)| CollisionGroup { listened_at, size })
        .collect();
    groups.sort_by(|a, b| b.size.cmp(&a.size).then(a.listened_at.cmp(&b.listened_at)));
    groups
}

/// Count chronologically adjacent pairs within `window_secs` of each other
/// that share a track key.
///
/// Only neighbours are compared: a run of k matching plays inside one window
/// counts k-1, not every pair in the run.
pub fn count_near_duplicates(timeline: &Timeline<'_>, window_secs: u64) -> usize {
    timeline
        .adjacent()
        .filter(|&(prev, curr, gap)| {
            gap <= window_secs && TrackKey::from_record(prev) == TrackKey::from_record(curr)
        })
        .count()
}
