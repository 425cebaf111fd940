use serde::Serialize;

use super::distribution::Distribution;
use crate::models::ListenRecord;

/// Category used for listens without a submission client.
pub const NO_CLIENT: &str = "None";

/// How many records carry an optional field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Coverage {
    pub present: usize,
    pub total: usize,
}

impl Coverage {
    /// Fraction in [0, 1]; 0 for an empty collection.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.present as f64 / self.total as f64
        }
    }
}

/// A category with its occurrence count, as reported in ranked tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedCount {
    pub name: String,
    pub count: usize,
}

impl From<(String, usize)> for RankedCount {
    fn from((name, count): (String, usize)) -> Self {
        Self { name, count }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataReport {
    pub mbid_coverage: Coverage,
    pub duration_coverage: Coverage,
    /// Descending by count.
    pub client_distribution: Vec<RankedCount>,
}

pub fn analyze(records: &[ListenRecord]) -> MetadataReport {
    let total = records.len();
    let mut mbid_count = 0;
    let mut duration_count = 0;
    let mut clients: Distribution<String> = Distribution::new();

    for record in records {
        if record.has_mbid() {
            mbid_count += 1;
        }
        if record.has_duration() {
            duration_count += 1;
        }
        let client = match record.submission_client.as_deref() {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => NO_CLIENT.to_string(),
        };
        clients.add(client);
    }

    MetadataReport {
        mbid_coverage: Coverage { present: mbid_count, total },
        duration_coverage: Coverage { present: duration_count, total },
        client_distribution: clients.ranked().into_iter().map(RankedCount::from).collect(),
    }
}
