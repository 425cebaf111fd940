//! Track-length profile: how many listens are of very short tracks.
//!
//! Only records with a non-zero `duration_ms` take part. Durations are
//! compared in fractional seconds, so 5.5s is not a ≤5s skip.

use serde::Serialize;

use crate::models::ListenRecord;

/// Cumulative "skip" thresholds in seconds.
pub const SKIP_THRESHOLDS_SECS: [u32; 6] = [5, 10, 15, 30, 60, 90];

/// Upper bounds (inclusive, seconds) and labels of the histogram buckets.
/// Anything longer falls into the last, open-ended bucket.
const BUCKETS: [(f64, &str); 4] = [
    (30.0, "≤30s"),
    (60.0, "31–60s"),
    (120.0, "61–120s"),
    (240.0, "121–240s"),
];
const OVERFLOW_BUCKET: &str = ">240s";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThresholdCount {
    pub threshold_secs: u32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketCount {
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DurationProfile {
    /// Records that contributed a duration.
    pub with_duration: usize,
    pub skip_counts: Vec<ThresholdCount>,
    /// Fixed order, shortest first; empty buckets are kept with a zero count.
    pub buckets: Vec<BucketCount>,
}

pub fn analyze(records: &[ListenRecord]) -> DurationProfile {
    let seconds: Vec<f64> = records
        .iter()
        .filter(|r| r.has_duration())
        .filter_map(|r| r.duration_ms)
        .map(|ms| ms as f64 / 1000.0)
        .collect();

    let skip_counts = SKIP_THRESHOLDS_SECS
        .iter()
        .map(|&t| ThresholdCount {
            threshold_secs: t,
            count: seconds.iter().filter(|&&s| s <= f64::from(t)).count(),
        })
        .collect();

    let mut counts = [0usize; BUCKETS.len() + 1];
    for &s in &seconds {
        counts[bucket_index(s)] += 1;
    }
    let buckets = BUCKETS
        .iter()
        .map(|&(_, label)| label)
        .chain(std::iter::once(OVERFLOW_BUCKET))
        .zip(counts)
        .map(|(label, count)| BucketCount { label, count })
        .collect();

    DurationProfile {
        with_duration: seconds.len(),
        skip_counts,
        buckets,
    }
}

fn bucket_index(secs: f64) -> usize {
    BUCKETS
        .iter()
        .position(|&(upper, _)| secs <= upper)
        .unwrap_or(BUCKETS.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_ms(ms: Option<u64>) -> ListenRecord {
        ListenRecord {
            listened_at: Some(1),
            duration_ms: ms,
            ..Default::default()
        }
    }

    fn counts(p: &DurationProfile) -> Vec<usize> {
        p.buckets.iter().map(|b| b.count).collect()
    }

    #[test]
    fn test_skip_thresholds_cumulative() {
        let records: Vec<ListenRecord> = [4_000, 5_000, 5_500, 29_999, 61_000, 90_000, 300_000]
            .into_iter()
            .map(|ms| with_ms(Some(ms)))
            .collect();
        let p = analyze(&records);
        let skips: Vec<(u32, usize)> = p
            .skip_counts
            .iter()
            .map(|t| (t.threshold_secs, t.count))
            .collect();
        assert_eq!(
            skips,
            vec![(5, 2), (10, 3), (15, 3), (30, 4), (60, 4), (90, 6)]
        );
        assert_eq!(p.with_duration, 7);
    }

    #[test]
    fn test_buckets_upper_bound_inclusive() {
        let records: Vec<ListenRecord> = [30_000, 30_001, 60_000, 120_000, 240_000, 240_001]
            .into_iter()
            .map(|ms| with_ms(Some(ms)))
            .collect();
        let p = analyze(&records);
        assert_eq!(counts(&p), vec![1, 2, 1, 1, 1]);
        let labels: Vec<&str> = p.buckets.iter().map(|b| b.label).collect();
        assert_eq!(labels, vec!["≤30s", "31–60s", "61–120s", "121–240s", ">240s"]);
    }

    #[test]
    fn test_zero_and_missing_durations_ignored() {
        let records = vec![with_ms(None), with_ms(Some(0)), with_ms(Some(1_000))];
        let p = analyze(&records);
        assert_eq!(p.with_duration, 1);
        assert_eq!(counts(&p), vec![1, 0, 0, 0, 0]);
    }

    #[test]
    fn test_empty_collection() {
        let p = analyze(&[]);
        assert_eq!(p.with_duration, 0);
        assert!(p.skip_counts.iter().all(|t| t.count == 0));
        assert_eq!(p.skip_counts.len(), SKIP_THRESHOLDS_SECS.len());
        assert_eq!(counts(&p), vec![0; 5]);
    }
}
