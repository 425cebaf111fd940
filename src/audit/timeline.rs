use crate::models::ListenRecord;

/// Records with a timestamp, in ascending time order.
///
/// Built once per audit and shared by the near-duplicate and temporal passes.
/// The sort is stable, so records with equal timestamps keep their export
/// order. Records without `listened_at` are left out.
pub struct Timeline<'a> {
    entries: Vec<(i64, &'a ListenRecord)>,
}

impl<'a> Timeline<'a> {
    pub fn build(records: &'a [ListenRecord]) -> Self {
        let mut entries: Vec<(i64, &ListenRecord)> = records
            .iter()
            .filter_map(|r| r.listened_at.map(|ts| (ts, r)))
            .collect();
        entries.sort_by_key(|&(ts, _)| ts);
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn timestamps(&self) -> impl Iterator<Item = i64> + '_ {
        self.entries.iter().map(|&(ts, _)| ts)
    }

    /// Chronological neighbours as `(previous, current, gap_secs)`.
    pub fn adjacent(&self) -> impl Iterator<Item = (&'a ListenRecord, &'a ListenRecord, u64)> + '_ {
        self.entries
            .windows(2)
            .map(|w| (w[0].1, w[1].1, w[1].0.abs_diff(w[0].0)))
    }
}
