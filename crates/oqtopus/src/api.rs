//! OQTOPUS Cloud REST API client.
//!
//! Implements the user-facing job and device endpoints:
//!
//! | Call | Endpoint |
//! |------|----------|
//! | submit job | `POST /jobs` |
//! | get job | `GET /jobs/{job_id}` |
//! | cancel job | `POST /jobs/{job_id}/cancel` |
//! | list devices | `GET /devices` |
//! | get device | `GET /devices/{device_id}` |
//!
//! Every request carries the API token in the `q-api-token` header.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::config::OqtopusConfig;
use crate::error::{BackendError, OqtopusResult};
use crate::job::record::timestamp;
use crate::job::{JobRecord, JobType};
use crate::operator::OperatorItem;

/// Header carrying the API token.
pub const TOKEN_HEADER: &str = "q-api-token";

/// User agent string for SDK requests.
const USER_AGENT: &str = concat!("oqtopus-rs/", env!("CARGO_PKG_VERSION"));

/// Job endpoints of the remote service.
#[async_trait]
pub trait JobApi: Send + Sync {
    /// Submit a job; returns the id assigned by the service.
    async fn submit_job(&self, request: &SubmitJobRequest) -> OqtopusResult<SubmitJobResponse>;

    /// Fetch the current record of a job.
    async fn get_job(&self, job_id: &str) -> OqtopusResult<JobRecord>;

    /// Ask the service to cancel a job.
    async fn cancel_job(&self, job_id: &str) -> OqtopusResult<()>;
}

/// Device endpoints of the remote service.
#[async_trait]
pub trait DeviceApi: Send + Sync {
    /// List every device visible to the account.
    async fn list_devices(&self) -> OqtopusResult<Vec<Device>>;

    /// Fetch one device.
    async fn get_device(&self, device_id: &str) -> OqtopusResult<Device>;
}

/// Authenticated OQTOPUS Cloud client.
#[derive(Clone)]
pub struct OqtopusClient {
    /// HTTP client.
    client: Client,
    /// API base URL.
    base_url: String,
    /// API token (sent as `q-api-token`).
    api_token: String,
}

impl std::fmt::Debug for OqtopusClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OqtopusClient")
            .field("base_url", &self.base_url)
            .field("api_token", &"[REDACTED]")
            .finish()
    }
}

impl OqtopusClient {
    /// Build a client from a configuration.
    pub fn new(config: &OqtopusConfig) -> OqtopusResult<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT);

        if let Some(proxy) = config.proxy() {
            builder = builder.proxy(reqwest::Proxy::all(proxy).map_err(BackendError::Http)?);
        }

        let client = builder.build().map_err(BackendError::Http)?;

        Ok(Self {
            client,
            base_url: config.url().trim_end_matches('/').to_string(),
            api_token: config.api_token().to_string(),
        })
    }

    /// API base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Handle HTTP response, extracting JSON or returning an error.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> OqtopusResult<T> {
        let response = self.check_status(response).await?;
        let body = response.text().await.map_err(BackendError::Http)?;
        serde_json::from_str(&body)
            .map_err(|e| BackendError::InvalidResponse(format!("{e}: {body}")).into())
    }

    async fn check_status(&self, response: reqwest::Response) -> OqtopusResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        let err = match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => BackendError::AuthFailed(message),
            StatusCode::NOT_FOUND => BackendError::NotFound(message),
            _ => BackendError::Api {
                status: status.as_u16(),
                message,
            },
        };
        Err(err.into())
    }
}

#[async_trait]
impl JobApi for OqtopusClient {
    #[instrument(skip(self, request), fields(device_id = %request.device_id))]
    async fn submit_job(&self, request: &SubmitJobRequest) -> OqtopusResult<SubmitJobResponse> {
        let url = self.url("/jobs");
        debug!("Submitting {} job to {}", request.job_type, url);

        let response = self
            .client
            .post(&url)
            .header(TOKEN_HEADER, &self.api_token)
            .json(request)
            .send()
            .await
            .map_err(BackendError::Http)?;

        self.handle_response(response).await
    }

    #[instrument(skip(self))]
    async fn get_job(&self, job_id: &str) -> OqtopusResult<JobRecord> {
        let url = self.url(&format!("/jobs/{job_id}"));
        debug!("Getting job from {}", url);

        let response = self
            .client
            .get(&url)
            .header(TOKEN_HEADER, &self.api_token)
            .send()
            .await
            .map_err(BackendError::Http)?;

        self.handle_response(response).await
    }

    #[instrument(skip(self))]
    async fn cancel_job(&self, job_id: &str) -> OqtopusResult<()> {
        let url = self.url(&format!("/jobs/{job_id}/cancel"));
        debug!("Cancelling job at {}", url);

        let response = self
            .client
            .post(&url)
            .header(TOKEN_HEADER, &self.api_token)
            .send()
            .await
            .map_err(BackendError::Http)?;

        self.check_status(response).await.map(|_| ())
    }
}

#[async_trait]
impl DeviceApi for OqtopusClient {
    #[instrument(skip(self))]
    async fn list_devices(&self) -> OqtopusResult<Vec<Device>> {
        let url = self.url("/devices");
        debug!("Listing devices from {}", url);

        let response = self
            .client
            .get(&url)
            .header(TOKEN_HEADER, &self.api_token)
            .send()
            .await
            .map_err(BackendError::Http)?;

        self.handle_response(response).await
    }

    #[instrument(skip(self))]
    async fn get_device(&self, device_id: &str) -> OqtopusResult<Device> {
        let url = self.url(&format!("/devices/{device_id}"));
        debug!("Getting device from {}", url);

        let response = self
            .client
            .get(&url)
            .header(TOKEN_HEADER, &self.api_token)
            .send()
            .await
            .map_err(BackendError::Http)?;

        self.handle_response(response).await
    }
}

// ─── Request types ──────────────────────────────────────────────────

/// Program (and operator, for estimation) carried by a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitJobInfo {
    /// OpenQASM 3 programs.
    pub program: Vec<String>,
    /// Observable terms (estimation only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<Vec<OperatorItem>>,
}

/// Request body for `POST /jobs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitJobRequest {
    /// Job name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Job description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Target device.
    pub device_id: String,
    /// Job type.
    pub job_type: JobType,
    /// Program payload.
    pub job_info: SubmitJobInfo,
    /// Transpiler tuning (`{}` when unset).
    pub transpiler_info: serde_json::Map<String, serde_json::Value>,
    /// Simulator tuning (`{}` when unset).
    pub simulator_info: serde_json::Map<String, serde_json::Value>,
    /// Error-mitigation tuning (`{}` when unset).
    pub mitigation_info: serde_json::Map<String, serde_json::Value>,
    /// Shots per program.
    pub shots: u32,
}

// ─── Response types ─────────────────────────────────────────────────

/// Response to `POST /jobs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitJobResponse {
    /// Id of the created job.
    pub job_id: String,
}

/// A device registered in OQTOPUS Cloud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Device id (the `device_id` of submissions).
    pub device_id: String,
    /// `QPU` or `simulator`.
    #[serde(default)]
    pub device_type: String,
    /// `available` or `unavailable`.
    #[serde(default)]
    pub status: String,
    /// When an unavailable device is expected back.
    #[serde(default, with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub available_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Jobs waiting on this device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_pending_jobs: Option<u32>,
    /// Qubit count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_qubits: Option<u32>,
    /// Native gate names.
    #[serde(default)]
    pub basis_gates: Vec<String>,
    /// Supported non-gate instructions (measure, barrier, ...).
    #[serde(default)]
    pub supported_instructions: Vec<String>,
    /// Calibration data, as published by the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_info: Option<serde_json::Value>,
    /// Time of the last calibration.
    #[serde(default, with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub calibrated_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Device {
    /// Check if the device currently accepts jobs.
    pub fn is_available(&self) -> bool {
        self.status.eq_ignore_ascii_case("available")
    }

    /// Calibration data as a JSON value, decoding it when published as a string.
    pub fn device_info_json(&self) -> Option<serde_json::Value> {
        match self.device_info.as_ref()? {
            serde_json::Value::String(s) => serde_json::from_str(s).ok(),
            other => Some(other.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_request_serialization() {
        let request = SubmitJobRequest {
            name: None,
            description: Some("bell".into()),
            device_id: "SC".into(),
            job_type: JobType::Sampling,
            job_info: SubmitJobInfo {
                program: vec!["OPENQASM 3;".into()],
                operator: None,
            },
            transpiler_info: serde_json::Map::new(),
            simulator_info: serde_json::Map::new(),
            mitigation_info: serde_json::Map::new(),
            shots: 1000,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["job_type"], "sampling");
        assert_eq!(json["shots"], 1000);
        assert_eq!(json["job_info"]["program"][0], "OPENQASM 3;");
        assert!(json.get("name").is_none());
        assert!(json["job_info"].get("operator").is_none());
        assert_eq!(json["transpiler_info"], serde_json::json!({}));
    }

    #[test]
    fn test_device_deserialization() {
        let json = serde_json::json!({
            "device_id": "SC",
            "device_type": "QPU",
            "status": "available",
            "n_pending_jobs": 3,
            "n_qubits": 64,
            "basis_gates": ["sx", "rz", "cx"],
            "supported_instructions": ["measure", "barrier"],
            "device_info": "{\"qubits\": []}",
            "calibrated_at": "2024-03-01T09:00:00Z",
            "description": "superconducting"
        });

        let device: Device = serde_json::from_value(json).unwrap();
        assert!(device.is_available());
        assert_eq!(device.n_pending_jobs, Some(3));
        assert_eq!(device.basis_gates.len(), 3);
        assert_eq!(
            device.device_info_json(),
            Some(serde_json::json!({"qubits": []}))
        );
        assert!(device.calibrated_at.is_some());
        assert!(device.available_at.is_none());
    }

    #[test]
    fn test_client_trims_base_url() {
        let config = OqtopusConfig::new("https://api.example/v1/", "token", None);
        let client = OqtopusClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "https://api.example/v1");
        assert_eq!(client.url("/jobs"), "https://api.example/v1/jobs");
    }

    #[test]
    fn test_client_debug_redacts_token() {
        let config = OqtopusConfig::new("https://api.example", "top-secret", None);
        let client = OqtopusClient::new(&config).unwrap();
        assert!(!format!("{client:?}").contains("top-secret"));
    }
}
