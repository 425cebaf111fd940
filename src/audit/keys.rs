use crate::models::ListenRecord;

/// Identity of a track regardless of when it was played.
///
/// Artist and track are lower-cased and trimmed. Missing fields become empty
/// strings, so two records with no artist and no track compare equal. Empty
/// metadata records therefore count as repeats of each other; duplicate
/// counts depend on this staying stable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackKey {
    pub artist: String,
    pub track: String,
}

impl TrackKey {
    pub fn from_record(record: &ListenRecord) -> Self {
        Self {
            artist: normalize_field(record.artist_name.as_deref()),
            track: normalize_field(record.track_name.as_deref()),
        }
    }
}

/// Identity of a single play: track key plus the raw timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FullKey {
    pub track: TrackKey,
    pub listened_at: Option<i64>,
}

impl FullKey {
    pub fn from_record(record: &ListenRecord) -> Self {
        Self {
            track: TrackKey::from_record(record),
            listened_at: record.listened_at,
        }
    }
}

fn normalize_field(value: Option<&str>) -> String {
    value.map(|v| v.trim().to_lowercase()).unwrap_or_default()
}
