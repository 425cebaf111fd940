//! ListenBrainz listen JSON, as written by the user export, the API, and
//! our own `export` command.

use chrono::DateTime;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::models::ListenRecord;

/// Top-level layout of a `.json` export file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ExportFile {
    /// Plain array of listens.
    Listens(Vec<RawListen>),
    /// API response body: `{"payload": {"listens": [...]}}`.
    Payload { payload: Payload },
}

#[derive(Debug, Deserialize)]
pub struct Payload {
    #[serde(default)]
    pub listens: Vec<RawListen>,
}

impl ExportFile {
    pub fn into_listens(self) -> Vec<RawListen> {
        match self {
            Self::Listens(listens) => listens,
            Self::Payload { payload } => payload.listens,
        }
    }
}

/// A single listen as serialized by ListenBrainz (partial: only the fields
/// the audit reads).
#[derive(Debug, Default, Deserialize)]
pub struct RawListen {
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub listened_at: Option<i64>,
    #[serde(default)]
    pub track_metadata: Option<RawTrackMetadata>,
    /// Some converted Spotify histories carry this at the top level.
    #[serde(default)]
    pub episode_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawTrackMetadata {
    #[serde(default)]
    pub artist_name: Option<String>,
    #[serde(default)]
    pub track_name: Option<String>,
    #[serde(default)]
    pub additional_info: Option<RawAdditionalInfo>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawAdditionalInfo {
    #[serde(default)]
    pub recording_mbid: Option<String>,
    #[serde(default, deserialize_with = "lenient_duration")]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub submission_client: Option<String>,
    #[serde(default)]
    pub episode_name: Option<String>,
}

impl From<RawListen> for ListenRecord {
    fn from(raw: RawListen) -> Self {
        let meta = raw.track_metadata.unwrap_or_default();
        let info = meta.additional_info.unwrap_or_default();
        ListenRecord {
            listened_at: raw.listened_at,
            artist_name: meta.artist_name,
            track_name: meta.track_name,
            recording_mbid: info.recording_mbid,
            duration_ms: info.duration_ms,
            submission_client: info.submission_client,
            episode_name: raw.episode_name.or(info.episode_name),
        }
    }
}

/// Accepts integer or float seconds, a numeric string, or an RFC 3339
/// string. Anything else reads as a missing timestamp.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_timestamp))
}

pub fn parse_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.timestamp()))
        }
        _ => None,
    }
}

/// Accepts integer, float, or numeric-string milliseconds. Negative or
/// non-numeric values read as missing.
fn lenient_duration<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_duration_ms))
}

pub fn parse_duration_ms(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}
