use serde::{Deserialize, Serialize};

/// One logged play event, already normalized by the loader.
///
/// The audit engine never mutates these; every field except `listened_at`
/// is purely informational and may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListenRecord {
    /// UNIX timestamp (seconds, UTC).
    pub listened_at: Option<i64>,
    pub artist_name: Option<String>,
    pub track_name: Option<String>,
    /// MusicBrainz recording id, present when the listen was linked.
    pub recording_mbid: Option<String>,
    pub duration_ms: Option<u64>,
    /// Tool that submitted the listen (e.g. "Pano Scrobbler").
    pub submission_client: Option<String>,
    /// Set for podcast episodes rather than music.
    pub episode_name: Option<String>,
}

impl ListenRecord {
    /// True when the record carries a non-empty MBID.
    pub fn has_mbid(&self) -> bool {
        self.recording_mbid.as_deref().is_some_and(|m| !m.is_empty())
    }

    /// True when the record carries a non-zero track duration.
    pub fn has_duration(&self) -> bool {
        self.duration_ms.is_some_and(|d| d > 0)
    }

    pub fn is_podcast(&self) -> bool {
        self.episode_name.is_some()
    }
}
