//! Job submission and retrieval against OQTOPUS Cloud.
//!
//! [`JobBackend`] holds the connections shared by every kind of job: the
//! REST client, the document store and the [`JobExecutor`] that turns a
//! submission request into a job. [`SamplingBackend`] and
//! [`EstimationBackend`] build requests on top of it; [`DeviceBackend`] lists
//! devices.

pub mod device;
pub mod estimation;
pub mod sampling;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{debug, instrument};

use crate::api::{JobApi, OqtopusClient, SubmitJobRequest};
use crate::config::OqtopusConfig;
use crate::error::{BackendError, OqtopusError, OqtopusResult};
use crate::executor::{JobExecutor, NetworkExecutor};
use crate::job::{AnyJob, EstimationJob, Job, JobContext, JobType, SamplingJob};
use crate::storage::{DEFAULT_TRANSFER_TIMEOUT, ObjectStore, OqtopusStorage};

pub use device::DeviceBackend;
pub use estimation::EstimationBackend;
pub use sampling::SamplingBackend;

/// Optional settings of a submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobOptions {
    /// Job name.
    pub name: Option<String>,
    /// Job description.
    pub description: Option<String>,
    /// Transpiler settings, e.g. `{"transpiler_lib": "qiskit"}`.
    pub transpiler_info: Map<String, Value>,
    /// Simulator settings.
    pub simulator_info: Map<String, Value>,
    /// Error-mitigation settings.
    pub mitigation_info: Map<String, Value>,
    /// Job type override for sampling submissions.
    pub job_type: Option<JobType>,
}

impl JobOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_transpiler_info(mut self, info: Map<String, Value>) -> Self {
        self.transpiler_info = info;
        self
    }

    pub fn with_simulator_info(mut self, info: Map<String, Value>) -> Self {
        self.simulator_info = info;
        self
    }

    pub fn with_mitigation_info(mut self, info: Map<String, Value>) -> Self {
        self.mitigation_info = info;
        self
    }

    /// Force the submitted job type.
    pub fn with_job_type(mut self, job_type: JobType) -> Self {
        self.job_type = Some(job_type);
        self
    }
}

/// Reject non-positive shot counts.
pub fn validate_shots(shots: u32) -> OqtopusResult<()> {
    if shots == 0 {
        return Err(OqtopusError::Validation(format!(
            "shots should be a positive integer.: {shots}"
        )));
    }
    Ok(())
}

/// Connections shared by all job backends.
#[derive(Clone)]
pub struct JobBackend {
    api: Arc<dyn JobApi>,
    store: Arc<dyn ObjectStore>,
    executor: Arc<dyn JobExecutor>,
    storage_timeout: Duration,
}

impl fmt::Debug for JobBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobBackend")
            .field("storage_timeout", &self.storage_timeout)
            .finish_non_exhaustive()
    }
}

impl JobBackend {
    /// Connect to OQTOPUS Cloud with the given configuration.
    pub fn new(config: &OqtopusConfig) -> OqtopusResult<Self> {
        let api = Arc::new(OqtopusClient::new(config)?);
        let store = Arc::new(OqtopusStorage::from_config(config)?);
        Ok(Self::with_api(api, store))
    }

    /// Connect using the environment or `~/.oqtopus`.
    pub fn from_default_config(section: Option<&str>) -> OqtopusResult<Self> {
        Self::new(&OqtopusConfig::load(section)?)
    }

    /// Build a backend over existing services, submitting through `api`.
    pub fn with_api(api: Arc<dyn JobApi>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            executor: Arc::new(NetworkExecutor::new(Arc::clone(&api))),
            api,
            store,
            storage_timeout: DEFAULT_TRANSFER_TIMEOUT,
        }
    }

    /// Replace the execution strategy.
    pub fn with_executor(mut self, executor: Arc<dyn JobExecutor>) -> Self {
        self.executor = executor;
        self
    }

    /// Set the timeout for document downloads.
    pub fn with_storage_timeout(mut self, timeout: Duration) -> Self {
        self.storage_timeout = timeout;
        self
    }

    /// Context handed to the jobs this backend creates.
    pub fn context(&self) -> JobContext {
        JobContext::new(Arc::clone(&self.api), Arc::clone(&self.store))
            .with_storage_timeout(self.storage_timeout)
    }

    /// Look up an existing job by id.
    #[instrument(skip(self))]
    pub async fn retrieve_job(&self, job_id: &str) -> OqtopusResult<AnyJob> {
        let job = async {
            let record = self.api.get_job(job_id).await?;
            Job::load(record, self.context()).await
        }
        .await
        .map_err(|e| e.during("To retrieve_job from OQTOPUS Cloud is failed."))?;

        debug!("Retrieved {} job {}", job.job_type(), job.job_id());
        match job.job_type() {
            JobType::Sampling | JobType::MultiManual => Ok(AnyJob::Sampling(SamplingJob::new(job))),
            JobType::Estimation => Ok(AnyJob::Estimation(EstimationJob::new(job))),
            JobType::Sse => Err(BackendError::UnsupportedJobType(
                "SSE job is not supported in this backend.".into(),
            )
            .into()),
            JobType::Unknown => {
                Err(BackendError::UnsupportedJobType("Unknown job_type".into()).into())
            }
        }
    }

    /// Run a request through the executor and wrap the created job.
    pub(crate) async fn execute(
        &self,
        request: SubmitJobRequest,
        operation: &str,
    ) -> OqtopusResult<Job> {
        async {
            let record = self.executor.execute(&request).await?;
            Job::load(record, self.context()).await
        }
        .await
        .map_err(|e| e.during(operation))
    }
}
