//! Error types for the OQTOPUS client.

use std::time::Duration;

use thiserror::Error;

use crate::job::JobStatus;

/// Result type for OQTOPUS operations.
pub type OqtopusResult<T> = Result<T, OqtopusError>;

/// Top-level error returned by every public operation.
#[derive(Debug, Error)]
pub enum OqtopusError {
    /// Missing or malformed configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller input or a result payload failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Remote job service failure.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Presigned storage failure.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl OqtopusError {
    /// Wrap this error with a description of the remote call that failed.
    pub fn during(self, operation: impl Into<String>) -> Self {
        OqtopusError::Backend(BackendError::Call {
            operation: operation.into(),
            source: Box::new(self),
        })
    }

    /// Whether this error (or the error it wraps) is a poll timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            OqtopusError::Backend(BackendError::Timeout { .. }) => true,
            OqtopusError::Backend(BackendError::Call { source, .. }) => source.is_timeout(),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for OqtopusError {
    fn from(e: reqwest::Error) -> Self {
        OqtopusError::Backend(BackendError::Http(e))
    }
}

impl From<serde_json::Error> for OqtopusError {
    fn from(e: serde_json::Error) -> Self {
        OqtopusError::Backend(BackendError::Json(e))
    }
}

/// Errors raised while talking to the OQTOPUS job service.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Authentication failed (401/403).
    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    /// Job or device not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// API error response.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The service answered with something that is not a job definition.
    #[error("Invalid response from OQTOPUS Cloud: {0}")]
    InvalidResponse(String),

    /// The job type cannot be handled by this client.
    #[error("Unsupported job type: {0}")]
    UnsupportedJobType(String),

    /// The job reached a terminal status other than `succeeded`.
    #[error("Job {job_id} ended with status {status}.")]
    JobFailed { job_id: String, status: JobStatus },

    /// Polling deadline expired before the job reached a terminal status.
    #[error("Timeout occurred after {} seconds.", .timeout.as_secs_f64())]
    Timeout { job_id: String, timeout: Duration },

    /// A compound remote call failed.
    #[error("{operation}: {source}")]
    Call {
        operation: String,
        #[source]
        source: Box<OqtopusError>,
    },
}

/// Errors raised by the presigned-URL storage helper.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Payload is not a readable zip archive.
    #[error("Invalid ZIP file: {0}")]
    InvalidZip(String),

    /// Archive does not hold exactly one entry.
    #[error("Invalid ZIP file: expected exactly one entry, found {0}")]
    EntryCount(usize),

    /// Archive entry is not valid JSON.
    #[error("Invalid JSON in ZIP file: {0}")]
    InvalidJson(#[source] serde_json::Error),

    /// JSON root is not an object.
    #[error("Expected JSON root to be an object (dict) but got {0}.")]
    UnexpectedShape(&'static str),

    /// Transport failure during a transfer.
    #[error("Network error during {operation}: {source}")]
    Network {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx response during a transfer.
    #[error("Network error during {operation}: HTTP {status}")]
    Status { operation: &'static str, status: u16 },

    /// In-memory archive I/O failed.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}
