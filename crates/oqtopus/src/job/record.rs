//! Wire representation of a job as returned by `GET /jobs/{job_id}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{JobStatus, JobType};

/// Server-side record of one submitted execution.
///
/// The record is replaced wholesale on every refresh; it is never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Job id.
    pub job_id: String,
    /// Job name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Job description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Job type.
    pub job_type: JobType,
    /// Current status.
    pub status: JobStatus,
    /// Device the job runs on.
    #[serde(default)]
    pub device_id: String,
    /// Requested shots.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shots: Option<u32>,
    /// Job details: embedded (`program`, `result`, ...) or presigned URLs.
    #[serde(default)]
    pub job_info: serde_json::Value,
    /// Transpiler settings.
    #[serde(default)]
    pub transpiler_info: serde_json::Value,
    /// Simulator settings.
    #[serde(default)]
    pub simulator_info: serde_json::Value,
    /// Error-mitigation settings; the service may send these JSON-encoded.
    #[serde(default)]
    pub mitigation_info: serde_json::Value,
    /// Execution time in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<f64>,
    /// Submission time.
    #[serde(default, with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
    /// Time the job became ready for execution.
    #[serde(default, with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub ready_at: Option<DateTime<Utc>>,
    /// Time execution started.
    #[serde(default, with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub running_at: Option<DateTime<Utc>>,
    /// Time the job reached a terminal status.
    #[serde(default, with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

/// Read a settings value as a map.
///
/// Objects are returned as-is, JSON-encoded objects are decoded, anything
/// else (null, empty string, malformed) yields an empty map.
pub(crate) fn settings_map(value: &serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    match value {
        serde_json::Value::Object(map) => map.clone(),
        serde_json::Value::String(s) => match serde_json::from_str(s) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        },
        _ => serde_json::Map::new(),
    }
}

/// Serde adapter for optional timestamps.
///
/// Accepts RFC 3339 as well as naive `YYYY-MM-DD HH:MM:SS[.f]` values, which
/// are read as UTC.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => parse(s)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {s}"))),
        }
    }

    pub(crate) fn parse(s: &str) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
            return Some(ts.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .map(|naive| naive.and_utc())
    }
}
