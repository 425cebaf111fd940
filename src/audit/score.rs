use std::fmt;

use serde::Serialize;

/// One point is lost per this many exact duplicates (truncating division).
const DUPLICATES_PER_POINT: usize = 50;
const MAX_DUPLICATE_PENALTY: usize = 20;
/// Bursts (≤5s gaps) above this share of all listens cost `BURST_PENALTY`.
const BURST_RATE_LIMIT: f64 = 0.05;
const BURST_PENALTY: u8 = 10;
/// More collision groups than this cost `COLLISION_PENALTY`.
const COLLISION_GROUP_LIMIT: usize = 10;
const COLLISION_PENALTY: u8 = 10;

const LOW_RISK_MIN: u8 = 90;
const MODERATE_RISK_MIN: u8 = 75;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
}

impl RiskTier {
    pub fn from_score(score: u8) -> Self {
        if score >= LOW_RISK_MIN {
            Self::Low
        } else if score >= MODERATE_RISK_MIN {
            Self::Moderate
        } else {
            Self::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Moderate => "MODERATE",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The summary figures the score is computed from.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreInputs {
    pub total: usize,
    pub exact_duplicates: usize,
    pub rapid_burst_5s: usize,
    pub collision_group_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IntegrityScore {
    pub score: u8,
    pub tier: RiskTier,
}

/// Heuristic 0-100 integrity score.
///
/// Three penalties, at most 40 points in total, so the result never drops
/// below 60:
/// - 1 point per 50 exact duplicates, capped at 20
/// - 10 points when ≤5s bursts exceed 5% of all listens
/// - 10 points when there are more than 10 timestamp collision groups
pub fn compute(inputs: &ScoreInputs) -> IntegrityScore {
    let mut score: u8 = 100;

    // Capped at 20, fits in u8
    let duplicate_penalty = (inputs.exact_duplicates / DUPLICATES_PER_POINT).min(MAX_DUPLICATE_PENALTY);
    score -= duplicate_penalty as u8;

    if inputs.rapid_burst_5s as f64 > inputs.total as f64 * BURST_RATE_LIMIT {
        score -= BURST_PENALTY;
    }

    if inputs.collision_group_count > COLLISION_GROUP_LIMIT {
        score -= COLLISION_PENALTY;
    }

    IntegrityScore {
        score,
        tier: RiskTier::from_score(score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(total: usize, dupes: usize, rapid5: usize, collisions: usize) -> ScoreInputs {
        ScoreInputs {
            total,
            exact_duplicates: dupes,
            rapid_burst_5s: rapid5,
            collision_group_count: collisions,
        }
    }

    #[test]
    fn test_clean_collection_scores_100() {
        let s = compute(&inputs(10_000, 0, 0, 0));
        assert_eq!(s.score, 100);
        assert_eq!(s.tier, RiskTier::Low);
    }

    #[test]
    fn test_duplicate_penalty_truncates() {
        assert_eq!(compute(&inputs(10_000, 49, 0, 0)).score, 100);
        assert_eq!(compute(&inputs(10_000, 50, 0, 0)).score, 99);
        assert_eq!(compute(&inputs(10_000, 99, 0, 0)).score, 99);
        assert_eq!(compute(&inputs(10_000, 149, 0, 0)).score, 98);
        assert_eq!(compute(&inputs(10_000, 999, 0, 0)).score, 81);
    }

    #[test]
    fn test_duplicate_penalty_capped() {
        assert_eq!(compute(&inputs(10_000, 1_000, 0, 0)).score, 80);
        assert_eq!(compute(&inputs(10_000, 1_000_000, 0, 0)).score, 80);
    }

    #[test]
    fn test_burst_penalty_strictly_above_five_percent() {
        assert_eq!(compute(&inputs(1_000, 0, 50, 0)).score, 100);
        assert_eq!(compute(&inputs(1_000, 0, 51, 0)).score, 90);
        // Empty collection: 0 > 0.0 is false
        assert_eq!(compute(&inputs(0, 0, 0, 0)).score, 100);
    }

    #[test]
    fn test_collision_penalty_above_ten_groups() {
        assert_eq!(compute(&inputs(1_000, 0, 0, 10)).score, 100);
        assert_eq!(compute(&inputs(1_000, 0, 0, 11)).score, 90);
    }

    #[test]
    fn test_worst_case_floor() {
        let s = compute(&inputs(100, 5_000, 100, 50));
        assert_eq!(s.score, 60);
        assert_eq!(s.tier, RiskTier::High);
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(RiskTier::from_score(100), RiskTier::Low);
        assert_eq!(RiskTier::from_score(90), RiskTier::Low);
        assert_eq!(RiskTier::from_score(89), RiskTier::Moderate);
        assert_eq!(RiskTier::from_score(75), RiskTier::Moderate);
        assert_eq!(RiskTier::from_score(74), RiskTier::High);
        assert_eq!(RiskTier::from_score(60), RiskTier::High);
    }

    #[test]
    fn test_score_bounded_and_monotonic() {
        let mut prev_by_dupes = 100;
        for dupes in (0..2_000).step_by(25) {
            let s = compute(&inputs(1_000, dupes, 0, 0)).score;
            assert!((60..=100).contains(&s));
            assert!(s <= prev_by_dupes);
            prev_by_dupes = s;
        }

        let mut prev_by_rapid = 100;
        for rapid in 0..200 {
            let s = compute(&inputs(1_000, 500, rapid, 3)).score;
            assert!((60..=100).contains(&s));
            assert!(s <= prev_by_rapid);
            prev_by_rapid = s;
        }

        let mut prev_by_collisions = 100;
        for groups in 0..40 {
            let s = compute(&inputs(1_000, 0, 80, groups)).score;
            assert!((60..=100).contains(&s));
            assert!(s <= prev_by_collisions);
            prev_by_collisions = s;
        }
    }

    #[test]
    fn test_tier_display() {
        assert_eq!(RiskTier::Moderate.to_string(), "MODERATE");
        assert_eq!(serde_json::to_string(&RiskTier::High).unwrap(), "\"HIGH\"");
    }
}
