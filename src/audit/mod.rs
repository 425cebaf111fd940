//! Forensic audit over an in-memory listen collection.
//!
//! Each analyzer is a pure function returning its own report. The runner
//! builds one time-sorted view, runs the analyzers side by side on rayon,
//! then scores the result from the structural and temporal summaries.

pub mod distribution;
pub mod diversity;
pub mod durations;
pub mod keys;
pub mod metadata;
pub mod score;
pub mod structural;
pub mod temporal;
pub mod timeline;

use serde::Serialize;

use crate::models::ListenRecord;
use diversity::{DiversityReport, YearCount, YearEntropy};
use durations::DurationProfile;
use metadata::{Coverage, MetadataReport, RankedCount};
use score::{IntegrityScore, RiskTier, ScoreInputs};
use structural::StructuralReport;
use temporal::TemporalReport;
use timeline::Timeline;

/// Default number of artists listed in the top-artists table.
pub const DEFAULT_TOP_ARTISTS: usize = 20;

/// Caller-supplied knobs for one audit run.
#[derive(Debug, Clone)]
pub struct AuditOptions {
    /// Near-duplicate window in seconds. `None` or 0 skips that check.
    pub near_window: Option<u64>,
    pub top_artists: usize,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            near_window: None,
            top_artists: DEFAULT_TOP_ARTISTS,
        }
    }
}

/// Everything one audit run produces, flattened for rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditReport {
    // Structural
    pub total: usize,
    pub exact_duplicates: usize,
    pub unique_count: usize,
    pub collision_group_count: usize,
    pub largest_collision_size: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub near_duplicate_window: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub near_duplicate_count: Option<usize>,

    // Temporal
    pub rapid_burst_5s: usize,
    pub rapid_burst_10s: usize,
    pub min_gap: Option<u64>,
    pub median_gap: Option<u64>,
    pub same_track_repeats_15s: usize,
    pub same_track_repeats_60s: usize,

    // Metadata
    pub mbid_coverage: Coverage,
    pub duration_coverage: Coverage,
    pub client_distribution: Vec<RankedCount>,

    // Diversity
    pub unique_artist_count: usize,
    pub global_entropy: f64,
    pub yearly_counts: Vec<YearCount>,
    pub yearly_entropy: Vec<YearEntropy>,
    pub top_artists: Vec<RankedCount>,

    pub duration_profile: DurationProfile,

    pub integrity_score: u8,
    pub risk_tier: RiskTier,
}

/// Run every analyzer over `records` and fold the results into one report.
pub fn run_audit(records: &[ListenRecord], options: &AuditOptions) -> AuditReport {
    log::info!("Auditing {} listens", records.len());

    let near_window = options.near_window.filter(|&w| w > 0);
    let timeline = Timeline::build(records);

    let ((structural, temporal), (metadata, (diversity, durations))) = rayon::join(
        || {
            rayon::join(
                || structural::analyze(records, &timeline, near_window),
                || temporal::analyze(&timeline),
            )
        },
        || {
            rayon::join(
                || metadata::analyze(records),
                || {
                    rayon::join(
                        || diversity::analyze(records, options.top_artists),
                        || durations::analyze(records),
                    )
                },
            )
        },
    );

    let score = score::compute(&ScoreInputs {
        total: structural.total,
        exact_duplicates: structural.exact_duplicates,
        rapid_burst_5s: temporal.rapid_burst_5s,
        collision_group_count: structural.collision_group_count,
    });

    log::info!("Integrity score {} ({})", score.score, score.tier);

    AuditReport::assemble(near_window, structural, temporal, metadata, diversity, durations, score)
}

impl AuditReport {
    fn assemble(
        near_window: Option<u64>,
        structural: StructuralReport,
        temporal: TemporalReport,
        metadata: MetadataReport,
        diversity: DiversityReport,
        duration_profile: DurationProfile,
        score: IntegrityScore,
    ) -> Self {
        Self {
            total: structural.total,
            exact_duplicates: structural.exact_duplicates,
            unique_count: structural.unique_count,
            collision_group_count: structural.collision_group_count,
            largest_collision_size: structural.largest_collision_size,
            near_duplicate_window: near_window,
            near_duplicate_count: structural.near_duplicate_count,

            rapid_burst_5s: temporal.rapid_burst_5s,
            rapid_burst_10s: temporal.rapid_burst_10s,
            min_gap: temporal.min_gap,
            median_gap: temporal.median_gap,
            same_track_repeats_15s: temporal.same_track_repeats_15s,
            same_track_repeats_60s: temporal.same_track_repeats_60s,

            mbid_coverage: metadata.mbid_coverage,
            duration_coverage: metadata.duration_coverage,
            client_distribution: metadata.client_distribution,

            unique_artist_count: diversity.unique_artist_count,
            global_entropy: diversity.global_entropy,
            yearly_counts: diversity.yearly_counts,
            yearly_entropy: diversity.yearly_entropy,
            top_artists: diversity.top_artists,

            duration_profile,

            integrity_score: score.score,
            risk_tier: score.tier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listen(artist: &str, track: &str, ts: i64) -> ListenRecord {
        ListenRecord {
            listened_at: Some(ts),
            artist_name: Some(artist.to_string()),
            track_name: Some(track.to_string()),
            recording_mbid: Some(format!("mbid-{track}")),
            duration_ms: Some(200_000),
            submission_client: Some("Navidrome".to_string()),
            episode_name: None,
        }
    }

    #[test]
    fn test_duplicate_pair_report() {
        let records = vec![listen("A", "X", 100), listen("A", "X", 100)];
        let r = run_audit(&records, &AuditOptions::default());
        assert_eq!(r.total, 2);
        assert_eq!(r.exact_duplicates, 1);
        assert_eq!(r.unique_count, 1);
        assert_eq!(r.collision_group_count, 1);
        assert_eq!(r.largest_collision_size, 2);
        assert_eq!(r.near_duplicate_count, None);
        // One 0s gap out of two listens is a 50% burst rate
        assert_eq!(r.rapid_burst_5s, 1);
        assert_eq!(r.integrity_score, 90);
        assert_eq!(r.risk_tier, RiskTier::Low);
    }

    #[test]
    fn test_near_window_enables_count() {
        let records = vec![listen("A", "X", 100), listen("A", "X", 150), listen("B", "Y", 1_000)];
        let opts = AuditOptions {
            near_window: Some(60),
            ..Default::default()
        };
        let r = run_audit(&records, &opts);
        assert_eq!(r.near_duplicate_window, Some(60));
        assert_eq!(r.near_duplicate_count, Some(1));
        assert_eq!(r.same_track_repeats_60s, 1);
        assert_eq!(r.same_track_repeats_15s, 0);
    }

    #[test]
    fn test_zero_window_same_as_none() {
        let records = vec![listen("A", "X", 100), listen("A", "X", 101)];
        let opts = AuditOptions {
            near_window: Some(0),
            ..Default::default()
        };
        let r = run_audit(&records, &opts);
        assert_eq!(r.near_duplicate_window, None);
        assert_eq!(r.near_duplicate_count, None);
    }

    #[test]
    fn test_empty_collection() {
        let r = run_audit(&[], &AuditOptions::default());
        assert_eq!(r.total, 0);
        assert_eq!(r.exact_duplicates, 0);
        assert_eq!(r.min_gap, None);
        assert_eq!(r.median_gap, None);
        assert_eq!(r.global_entropy, 0.0);
        assert_eq!(r.mbid_coverage.total, 0);
        assert_eq!(r.integrity_score, 100);
        assert_eq!(r.risk_tier, RiskTier::Low);
    }

    #[test]
    fn test_collision_heavy_collection() {
        // Twelve timestamps each shared by two different tracks.
        let mut records = Vec::new();
        for i in 0..12 {
            let ts = 1_700_000_000 + i * 3_600;
            records.push(listen("A", &format!("x{i}"), ts));
            records.push(listen("B", &format!("y{i}"), ts));
        }
        let r = run_audit(&records, &AuditOptions::default());
        assert_eq!(r.exact_duplicates, 0);
        assert_eq!(r.collision_group_count, 12);
        assert_eq!(r.rapid_burst_5s, 12);
        // Collision penalty plus burst penalty (12 > 24 * 0.05)
        assert_eq!(r.integrity_score, 80);
        assert_eq!(r.risk_tier, RiskTier::Moderate);
    }

    #[test]
    fn test_reordering_keeps_aggregates() {
        let records = vec![
            listen("A", "X", 10),
            listen("A", "X", 10),
            listen("B", "Y", 10),
            listen("C", "Z", 500),
            listen("A", "X", 900),
            listen("B", "Y", 901),
        ];
        let mut reversed = records.clone();
        reversed.reverse();
        let a = run_audit(&records, &AuditOptions::default());
        let b = run_audit(&reversed, &AuditOptions::default());
        assert_eq!(a.exact_duplicates, b.exact_duplicates);
        assert_eq!(a.collision_group_count, b.collision_group_count);
        assert_eq!(a.unique_artist_count, b.unique_artist_count);
        assert_eq!(a.global_entropy, b.global_entropy);
        assert_eq!(a.yearly_entropy, b.yearly_entropy);
    }

    #[test]
    fn test_json_omits_near_duplicates_without_window() {
        let r = run_audit(&[listen("A", "X", 1)], &AuditOptions::default());
        let json = serde_json::to_value(&r).unwrap();
        assert!(json.get("near_duplicate_count").is_none());
        assert_eq!(json["risk_tier"], "LOW");
        assert_eq!(json["mbid_coverage"]["present"], 1);
    }
}
