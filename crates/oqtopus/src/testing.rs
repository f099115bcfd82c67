//! In-memory services and fixtures for unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::api::{JobApi, SubmitJobInfo, SubmitJobRequest, SubmitJobResponse};
use crate::error::{BackendError, OqtopusResult, StorageError};
use crate::job::{JobContext, JobRecord, JobStatus, JobType};
use crate::storage::{JsonObject, ObjectStore, PresignedUpload};

pub(crate) const DUMMY_JOB_ID: &str = "dummy_job_id";

pub(crate) const BELL_WITH_MEASURE: &str = "OPENQASM 3;\ninclude \"stdgates.inc\";\nqubit[2] q;\nbit[2] c;\n\nh q[0];\ncx q[0], q[1];\nc = measure q;";

/// Job service returning scripted records.
///
/// `get_job` walks through the script and then keeps returning its last
/// entry.
#[derive(Default)]
pub(crate) struct MockJobApi {
    script: Vec<JobRecord>,
    get_calls: AtomicUsize,
    submitted: Mutex<Vec<SubmitJobRequest>>,
    cancelled: Mutex<Vec<String>>,
    fail_get: AtomicBool,
    fail_submit: AtomicBool,
    fail_cancel: AtomicBool,
}

impl MockJobApi {
    pub(crate) fn new(script: Vec<JobRecord>) -> Arc<Self> {
        Arc::new(Self {
            script,
            ..Default::default()
        })
    }

    pub(crate) fn fail_get(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_submit(&self, fail: bool) {
        self.fail_submit.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_cancel(&self, fail: bool) {
        self.fail_cancel.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn submitted(&self) -> Vec<SubmitJobRequest> {
        self.submitted.lock().unwrap().clone()
    }

    pub(crate) fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().unwrap().clone()
    }
}

#[async_trait]
impl JobApi for MockJobApi {
    async fn submit_job(&self, request: &SubmitJobRequest) -> OqtopusResult<SubmitJobResponse> {
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(BackendError::Api {
                status: 500,
                message: "submit rejected".into(),
            }
            .into());
        }
        self.submitted.lock().unwrap().push(request.clone());
        Ok(SubmitJobResponse {
            job_id: DUMMY_JOB_ID.into(),
        })
    }

    async fn get_job(&self, job_id: &str) -> OqtopusResult<JobRecord> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(BackendError::NotFound(job_id.to_string()).into());
        }
        let call = self.get_calls.fetch_add(1, Ordering::SeqCst);
        let last = self.script.len().checked_sub(1);
        last.map(|last| self.script[call.min(last)].clone())
            .ok_or_else(|| BackendError::NotFound(job_id.to_string()).into())
    }

    async fn cancel_job(&self, job_id: &str) -> OqtopusResult<()> {
        if self.fail_cancel.load(Ordering::SeqCst) {
            return Err(BackendError::Api {
                status: 400,
                message: "job already ended".into(),
            }
            .into());
        }
        self.cancelled.lock().unwrap().push(job_id.to_string());
        Ok(())
    }
}

/// Document store backed by a map of URL to object.
#[derive(Default)]
pub(crate) struct MockStore {
    documents: HashMap<String, JsonObject>,
    requested: Mutex<Vec<String>>,
}

impl MockStore {
    /// Serve the documents an embedded job info would be split into.
    pub(crate) fn with_documents_for(embedded: &Value) -> Self {
        let mut documents = HashMap::new();
        let mut input = JsonObject::new();
        for key in ["program", "operator"] {
            if let Some(value) = embedded.get(key) {
                input.insert(key.into(), value.clone());
            }
        }
        documents.insert(document_url("input"), input);
        for key in ["result", "transpile_result"] {
            if let Some(value) = embedded.get(key) {
                let mut doc = JsonObject::new();
                doc.insert(key.into(), value.clone());
                documents.insert(document_url(key), doc);
            }
        }
        Self {
            documents,
            ..Default::default()
        }
    }

    pub(crate) fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    async fn download(&self, url: &str, _timeout: Duration) -> OqtopusResult<JsonObject> {
        self.requested.lock().unwrap().push(url.to_string());
        self.documents.get(url).cloned().ok_or_else(|| {
            StorageError::Status {
                operation: "download",
                status: 404,
            }
            .into()
        })
    }

    async fn upload(
        &self,
        _target: &PresignedUpload,
        _data: &JsonObject,
        _timeout: Duration,
    ) -> OqtopusResult<()> {
        Ok(())
    }
}

/// Presigned URL of a stored job document.
pub(crate) fn document_url(name: &str) -> String {
    format!("http://host:port/storage_base/{DUMMY_JOB_ID}/{name}.zip?params")
}

/// Embedded job info of a Bell-state sampling job.
pub(crate) fn dummy_job_info(succeeded: bool) -> Value {
    let mut info = json!({ "program": [BELL_WITH_MEASURE] });
    if succeeded {
        info["result"] = json!({
            "sampling": {"counts": {"00": 490, "01": 10, "10": 20, "11": 480}}
        });
        info["transpile_result"] = json!({
            "transpiled_program": "OPENQASM 3; include \"stdgates.inc\"; qubit[2] q; bit[2] c; rz(1.5707963267948932) q[0]; sx q[0]; rz(1.5707963267948966) q[0]; cx q[0], q[1]; c = measure q;",
            "stats": "{\"before\": {\"n_qubits\": 2, \"n_gates\": 4, \"depth\": 4}, \"after\": {\"n_qubits\": 6, \"n_gates\": 4, \"depth\": 4}}",
            "virtual_physical_mapping": "{\"0\": 0, \"1\": 1}"
        });
    }
    info
}

/// Job info of the same job as presigned URLs.
pub(crate) fn dummy_job_info_urls(succeeded: bool) -> Value {
    let mut info = json!({
        "input": document_url("input"),
        "combined_program": null,
        "result": null,
        "transpile_result": null,
        "sse_log": null,
        "message": null
    });
    if succeeded {
        info["result"] = Value::from(document_url("result"));
        info["transpile_result"] = Value::from(document_url("transpile_result"));
    }
    info
}

/// Embedded job info of a combined three-program job.
pub(crate) fn dummy_multi_manual_job_info() -> Value {
    json!({
        "program": [BELL_WITH_MEASURE, BELL_WITH_MEASURE, BELL_WITH_MEASURE],
        "result": {
            "sampling": {
                "counts": {"0000": 490, "0001": 10, "0110": 20, "1111": 480},
                "divided_counts": {
                    "0": {"00": 490, "01": 10, "10": 20, "11": 480},
                    "1": {"00": 500, "01": 20, "11": 480}
                }
            }
        }
    })
}

/// Sampling job record in the given status.
pub(crate) fn dummy_record(status: JobStatus) -> JobRecord {
    serde_json::from_value(json!({
        "job_id": DUMMY_JOB_ID,
        "name": "dummy_name",
        "description": "dummy_description",
        "job_type": "sampling",
        "status": status,
        "device_id": "dummy_device_id",
        "shots": 1000,
        "job_info": dummy_job_info(status == JobStatus::Succeeded),
        "transpiler_info": {
            "transpiler_lib": "qiskit",
            "transpiler_options": {"optimization_level": 2}
        },
        "simulator_info": {},
        "mitigation_info": {},
        "execution_time": 5.123,
        "submitted_at": "2000-01-02 03:04:01",
        "ready_at": "2000-01-02 03:04:02",
        "running_at": "2000-01-02 03:04:03",
        "ended_at": "2000-01-02 03:04:04"
    }))
    .unwrap()
}

pub(crate) fn job_context(api: Arc<MockJobApi>) -> JobContext {
    JobContext::new(api, Arc::new(MockStore::default()))
}

pub(crate) fn submit_request(job_type: JobType) -> SubmitJobRequest {
    SubmitJobRequest {
        name: Some("dummy_name".into()),
        description: Some("dummy_description".into()),
        device_id: "dummy_device_id".into(),
        job_type,
        job_info: SubmitJobInfo {
            program: vec![BELL_WITH_MEASURE.into()],
            operator: None,
        },
        transpiler_info: serde_json::Map::new(),
        simulator_info: serde_json::Map::new(),
        mitigation_info: serde_json::Map::new(),
        shots: 1000,
    }
}
