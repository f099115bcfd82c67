//! Resolved job details.
//!
//! The service returns `job_info` either with the documents embedded or as a
//! set of presigned download URLs. [`JobInfo::resolve`] turns both shapes into
//! the same structure. [`JobInfo::without_documents`] reads it without touching
//! storage, for jobs that are still in progress.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{BackendError, OqtopusResult};
use crate::operator::OperatorItem;
use crate::storage::{JsonObject, ObjectStore};

/// Fields that may hold a presigned URL to a stored document.
const DOCUMENT_FIELDS: [&str; 4] = ["input", "combined_program", "result", "transpile_result"];

/// Job details: programs, operator, result and transpilation output.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobInfo {
    /// Submitted OpenQASM programs.
    #[serde(default)]
    pub program: Vec<String>,
    /// Observable (estimation jobs).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<Vec<OperatorItem>>,
    /// Result payload once the job has succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Transpiler output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transpile_result: Option<Value>,
    /// Service message, typically set on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Anything else the service sent.
    #[serde(flatten)]
    pub extra: JsonObject,
}

impl JobInfo {
    /// Resolve a raw `job_info` value, downloading referenced documents.
    pub async fn resolve(
        raw: &Value,
        store: &dyn ObjectStore,
        timeout: Duration,
    ) -> OqtopusResult<Self> {
        let Some(fields) = info_fields(raw)? else {
            return Ok(Self::default());
        };

        if !has_document_urls(&fields) {
            return Ok(serde_json::from_value(Value::Object(fields))?);
        }

        let mut merged = JsonObject::new();
        for (key, value) in fields {
            match value {
                Value::Null => {}
                Value::String(url) if DOCUMENT_FIELDS.contains(&key.as_str()) && is_url(&url) => {
                    debug!("Resolving job_info.{key} from storage");
                    merged.extend(store.download(&url, timeout).await?);
                }
                value => {
                    merged.insert(key, value);
                }
            }
        }
        Ok(serde_json::from_value(Value::Object(merged))?)
    }

    /// Read a raw `job_info` value without touching storage.
    ///
    /// Document URLs are left out; embedded fields are kept as they are.
    pub fn without_documents(raw: &Value) -> OqtopusResult<Self> {
        let Some(mut fields) = info_fields(raw)? else {
            return Ok(Self::default());
        };
        fields.retain(|key, value| {
            !(value.is_null()
                || (DOCUMENT_FIELDS.contains(&key.as_str()) && value.as_str().is_some_and(is_url)))
        });
        Ok(serde_json::from_value(Value::Object(fields))?)
    }

    /// Sampling section of the result payload, if present.
    pub fn sampling_result(&self) -> Option<&Value> {
        self.result.as_ref()?.get("sampling")
    }

    /// Estimation section of the result payload, if present.
    pub fn estimation_result(&self) -> Option<&Value> {
        self.result.as_ref()?.get("estimation")
    }
}

fn info_fields(raw: &Value) -> OqtopusResult<Option<JsonObject>> {
    match raw {
        Value::Null => Ok(None),
        Value::Object(fields) => Ok(Some(fields.clone())),
        Value::String(s) => match serde_json::from_str(s) {
            Ok(Value::Object(fields)) => Ok(Some(fields)),
            _ => Err(BackendError::InvalidResponse(format!(
                "job_info is not a JSON object: {s}"
            ))
            .into()),
        },
        other => Err(BackendError::InvalidResponse(format!(
            "job_info must be an object, got {other}"
        ))
        .into()),
    }
}

fn has_document_urls(fields: &JsonObject) -> bool {
    DOCUMENT_FIELDS
        .iter()
        .filter_map(|key| fields.get(*key)?.as_str())
        .any(is_url)
}

fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}
