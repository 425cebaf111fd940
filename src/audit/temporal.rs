use serde::Serialize;

use super::keys::TrackKey;
use super::timeline::Timeline;

/// Gaps at or under these many seconds count as rapid bursts.
pub const BURST_SHORT_SECS: u64 = 5;
pub const BURST_LONG_SECS: u64 = 10;

/// Same-track repeats at or under these many seconds.
pub const REPEAT_SHORT_SECS: u64 = 15;
pub const REPEAT_LONG_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalReport {
    pub rapid_burst_5s: usize,
    pub rapid_burst_10s: usize,
    /// None when fewer than two timestamped records exist.
    pub min_gap: Option<u64>,
    pub median_gap: Option<u64>,
    pub same_track_repeats_15s: usize,
    pub same_track_repeats_60s: usize,
}

pub fn analyze(timeline: &Timeline<'_>) -> TemporalReport {
    let gaps = gaps(timeline);
    let rapid_burst_5s = gaps.iter().filter(|&&g| g <= BURST_SHORT_SECS).count();
    let rapid_burst_10s = gaps.iter().filter(|&&g| g <= BURST_LONG_SECS).count();

    let mut same_track_repeats_15s = 0;
    let mut same_track_repeats_60s = 0;
    for (prev, curr, gap) in timeline.adjacent() {
        if TrackKey::from_record(prev) != TrackKey::from_record(curr) {
            continue;
        }
        // Buckets overlap: a 10s repeat counts in both.
        if gap <= REPEAT_SHORT_SECS {
            same_track_repeats_15s += 1;
        }
        if gap <= REPEAT_LONG_SECS {
            same_track_repeats_60s += 1;
        }
    }

    log::debug!(
        "Temporal: {} gaps, {} ≤{}s, {} same-track ≤{}s",
        gaps.len(),
        rapid_burst_5s,
        BURST_SHORT_SECS,
        same_track_repeats_60s,
        REPEAT_LONG_SECS
    );

    TemporalReport {
        rapid_burst_5s,
        rapid_burst_10s,
        min_gap: gaps.iter().copied().min(),
        median_gap: median(&gaps),
        same_track_repeats_15s,
        same_track_repeats_60s,
    }
}

/// Seconds between consecutive timestamps in ascending order.
pub fn gaps(timeline: &Timeline<'_>) -> Vec<u64> {
    timeline.adjacent().map(|(_, _, gap)| gap).collect()
}

/// Statistical median, truncated to whole seconds.
/// An even count averages the two middle values.
pub fn median(values: &[u64]) -> Option<u64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let n = sorted.len();
    if n % 2 == 1 {
        Some(sorted[n / 2])
    } else {
        let (lo, hi) = (sorted[n / 2 - 1], sorted[n / 2]);
        Some(lo + (hi - lo) / 2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ListenRecord;

    fn at(ts: i64) -> ListenRecord {
        ListenRecord {
            listened_at: Some(ts),
            artist_name: Some(format!("artist-{ts}")),
            track_name: Some(format!("track-{ts}")),
            ..Default::default()
        }
    }

    fn play(track: &str, ts: i64) -> ListenRecord {
        ListenRecord {
            listened_at: Some(ts),
            artist_name: Some("Stereolab".to_string()),
            track_name: Some(track.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_gap_scenario() {
        let records = vec![at(20), at(0), at(3)];
        let tl = Timeline::build(&records);
        assert_eq!(gaps(&tl), vec![3, 17]);

        let r = analyze(&tl);
        assert_eq!(r.rapid_burst_5s, 1);
        assert_eq!(r.rapid_burst_10s, 1);
        assert_eq!(r.min_gap, Some(3));
        assert_eq!(r.median_gap, Some(10));
    }

    #[test]
    fn test_burst_thresholds_inclusive() {
        let records = vec![at(0), at(5), at(15), at(16), at(100)];
        let r = analyze(&Timeline::build(&records));
        // gaps: 5, 10, 1, 84
        assert_eq!(r.rapid_burst_5s, 2);
        assert_eq!(r.rapid_burst_10s, 3);
        assert_eq!(r.min_gap, Some(1));
        assert_eq!(r.median_gap, Some(7));
    }

    #[test]
    fn test_median_truncates() {
        assert_eq!(median(&[]), None);
        assert_eq!(median(&[9]), Some(9));
        assert_eq!(median(&[3, 4]), Some(3));
        assert_eq!(median(&[1, 100, 7]), Some(7));
        assert_eq!(median(&[0, 0, 5, 6]), Some(2));
    }

    #[test]
    fn test_same_track_repeats_buckets_overlap() {
        let records = vec![
            play("Cybele's Reverie", 0),
            play("Cybele's Reverie", 10), // 10s: both buckets
            play("Cybele's Reverie", 40), // 30s: 60s bucket only
            play("Cybele's Reverie", 200), // 160s: neither
            play("French Disko", 205),
        ];
        let r = analyze(&Timeline::build(&records));
        assert_eq!(r.same_track_repeats_15s, 1);
        assert_eq!(r.same_track_repeats_60s, 2);
    }

    #[test]
    fn test_missing_timestamps_excluded() {
        let records = vec![
            at(0),
            ListenRecord::default(),
            at(4),
            ListenRecord::default(),
        ];
        let r = analyze(&Timeline::build(&records));
        assert_eq!(r.rapid_burst_5s, 1);
        assert_eq!(r.min_gap, Some(4));
    }

    #[test]
    fn test_empty_and_single_record() {
        let r = analyze(&Timeline::build(&[]));
        assert_eq!(r.rapid_burst_5s, 0);
        assert_eq!(r.min_gap, None);
        assert_eq!(r.median_gap, None);

        let one = vec![at(42)];
        let r = analyze(&Timeline::build(&one));
        assert_eq!(r.min_gap, None);
        assert_eq!(r.same_track_repeats_60s, 0);
    }
}
