use std::collections::BTreeMap;

use chrono::{DateTime, Datelike};
use serde::Serialize;

use super::distribution::Distribution;
use super::metadata::RankedCount;
use crate::models::ListenRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub year: i32,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearEntropy {
    pub year: i32,
    pub entropy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiversityReport {
    pub unique_artist_count: usize,
    pub global_entropy: f64,
    /// Ascending by year.
    pub yearly_counts: Vec<YearCount>,
    /// Ascending by year; only years with at least one artist-tagged listen.
    pub yearly_entropy: Vec<YearEntropy>,
    pub top_artists: Vec<RankedCount>,
}

/// Artist and year tallies for one collection.
#[derive(Debug, Default)]
pub struct ListeningDistributions {
    pub artists: Distribution<String>,
    pub years: Distribution<i32>,
    pub artists_by_year: BTreeMap<i32, Distribution<String>>,
}

impl ListeningDistributions {
    /// Artists are counted by their raw name; only non-empty names count.
    /// Years come from the UTC calendar year of `listened_at`.
    pub fn build(records: &[ListenRecord]) -> Self {
        let mut out = Self::default();

        for record in records {
            let artist = record.artist_name.as_deref().filter(|a| !a.is_empty());
            if let Some(a) = artist {
                out.artists.add(a.to_string());
            }

            let Some(ts) = record.listened_at else {
                continue;
            };
            let Some(year) = utc_year(ts) else {
                log::debug!("Timestamp {ts} is outside the calendar range, skipping year");
                continue;
            };
            out.years.add(year);
            if let Some(a) = artist {
                out.artists_by_year.entry(year).or_default().add(a.to_string());
            }
        }

        out
    }
}

pub fn analyze(records: &[ListenRecord], top_n: usize) -> DiversityReport {
    let dists = ListeningDistributions::build(records);

    let yearly_counts = dists
        .years
        .ascending()
        .into_iter()
        .map(|(year, count)| YearCount { year, count })
        .collect();

    let yearly_entropy = dists
        .artists_by_year
        .iter()
        .map(|(&year, artists)| YearEntropy {
            year,
            entropy: artists.entropy(),
        })
        .collect();

    let mut top_artists: Vec<RankedCount> =
        dists.artists.ranked().into_iter().map(RankedCount::from).collect();
    top_artists.truncate(top_n);

    DiversityReport {
        unique_artist_count: dists.artists.len(),
        global_entropy: dists.artists.entropy(),
        yearly_counts,
        yearly_entropy,
        top_artists,
    }
}

/// Calendar year of a UNIX timestamp in UTC, independent of local time zone.
pub fn utc_year(ts: i64) -> Option<i32> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.year())
}
