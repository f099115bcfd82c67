//! Job lifecycle types.
//!
//! The job state machine as reported by OQTOPUS Cloud:
//!
//! ```text
//!   submit ──→ Submitted ──→ Ready ──→ Running ──→ Succeeded
//!                  │           │          │
//!                  │           │          ├──→ Failed
//!                  │           │          │
//!                  └───────────┴──────────┴──→ Cancelled
//! ```
//!
//! **Invariants:**
//! - Terminal states (`Succeeded`, `Failed`, `Cancelled`) are permanent.
//! - A [`Job`] changes only through [`Job::refresh`] and [`Job::cancel`], and
//!   its record is replaced wholesale, never merged.
//! - A failed refresh leaves the previous record in place.
//! - Results are only decoded for `Succeeded` jobs.

pub mod estimation;
pub mod info;
pub mod record;
pub mod sampling;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, instrument, warn};

use crate::api::JobApi;
use crate::error::{BackendError, OqtopusResult};
use crate::storage::{DEFAULT_TRANSFER_TIMEOUT, JsonObject, ObjectStore};

pub use estimation::EstimationJob;
pub use info::JobInfo;
pub use record::JobRecord;
pub use sampling::SamplingJob;

/// Default interval between status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted by the service.
    Submitted,
    /// Transpiled and queued for a device.
    Ready,
    /// Executing.
    Running,
    /// Finished with a result.
    Succeeded,
    /// Finished without a result.
    Failed,
    /// Cancelled by the user.
    Cancelled,
    /// A status this client does not know; treated as still in progress.
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Succeeded | JobStatus::Failed | JobStatus::Cancelled
        )
    }

    /// Check if the job completed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Succeeded)
    }

    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Submitted => "submitted",
            JobStatus::Ready => "ready",
            JobStatus::Running => "running",
            JobStatus::Succeeded => "succeeded",
            JobStatus::Failed => "failed",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of execution a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// Measurement counts of one program.
    Sampling,
    /// Expectation value of an observable.
    Estimation,
    /// Server-side execution of a user script.
    Sse,
    /// Measurement counts of several programs combined into one run.
    MultiManual,
    #[serde(other)]
    Unknown,
}

impl JobType {
    /// Wire name of the job type.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Sampling => "sampling",
            JobType::Estimation => "estimation",
            JobType::Sse => "sse",
            JobType::MultiManual => "multi_manual",
            JobType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`Job::wait_for_completion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The job reached this terminal status.
    Finished(JobStatus),
    /// The deadline passed first.
    TimedOut,
}

/// Services a job talks to after creation.
#[derive(Clone)]
pub struct JobContext {
    pub(crate) api: Arc<dyn JobApi>,
    pub(crate) store: Arc<dyn ObjectStore>,
    pub(crate) storage_timeout: Duration,
}

impl JobContext {
    /// Create a context from a job API and a document store.
    pub fn new(api: Arc<dyn JobApi>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            api,
            store,
            storage_timeout: DEFAULT_TRANSFER_TIMEOUT,
        }
    }

    /// Set the timeout for document downloads.
    pub fn with_storage_timeout(mut self, timeout: Duration) -> Self {
        self.storage_timeout = timeout;
        self
    }

    /// Stored documents are only downloaded once the job is terminal.
    async fn resolve_info(&self, record: &JobRecord) -> OqtopusResult<JobInfo> {
        if !record.status.is_terminal() {
            return JobInfo::without_documents(&record.job_info);
        }
        JobInfo::resolve(&record.job_info, self.store.as_ref(), self.storage_timeout).await
    }
}

impl fmt::Debug for JobContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobContext")
            .field("storage_timeout", &self.storage_timeout)
            .finish_non_exhaustive()
    }
}

/// A job known to OQTOPUS Cloud.
#[derive(Debug, Clone)]
pub struct Job {
    record: JobRecord,
    info: JobInfo,
    ctx: JobContext,
}

impl Job {
    /// Wrap a record, resolving its job info.
    pub async fn load(record: JobRecord, ctx: JobContext) -> OqtopusResult<Self> {
        let info = ctx.resolve_info(&record).await?;
        Ok(Self { record, info, ctx })
    }

    /// Wrap a record whose job info is already resolved.
    pub fn from_parts(record: JobRecord, info: JobInfo, ctx: JobContext) -> Self {
        Self { record, info, ctx }
    }

    /// Current record.
    pub fn record(&self) -> &JobRecord {
        &self.record
    }

    /// Job id.
    pub fn job_id(&self) -> &str {
        &self.record.job_id
    }

    /// Job name.
    pub fn name(&self) -> Option<&str> {
        self.record.name.as_deref()
    }

    /// Job description.
    pub fn description(&self) -> Option<&str> {
        self.record.description.as_deref()
    }

    /// Job type.
    pub fn job_type(&self) -> JobType {
        self.record.job_type
    }

    /// Status as of the last refresh.
    pub fn status(&self) -> JobStatus {
        self.record.status
    }

    /// Device the job runs on.
    pub fn device_id(&self) -> &str {
        &self.record.device_id
    }

    /// Requested shots.
    pub fn shots(&self) -> Option<u32> {
        self.record.shots
    }

    /// Resolved job details.
    pub fn job_info(&self) -> &JobInfo {
        &self.info
    }

    pub fn transpiler_info(&self) -> JsonObject {
        record::settings_map(&self.record.transpiler_info)
    }

    pub fn simulator_info(&self) -> JsonObject {
        record::settings_map(&self.record.simulator_info)
    }

    /// Mitigation settings; decoded when the service sends them as a string.
    pub fn mitigation_info(&self) -> JsonObject {
        record::settings_map(&self.record.mitigation_info)
    }

    /// Execution time in seconds.
    pub fn execution_time(&self) -> Option<f64> {
        self.record.execution_time
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.record.submitted_at
    }

    pub fn ready_at(&self) -> Option<DateTime<Utc>> {
        self.record.ready_at
    }

    pub fn running_at(&self) -> Option<DateTime<Utc>> {
        self.record.running_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.record.ended_at
    }

    /// Fetch the latest record from OQTOPUS Cloud.
    ///
    /// The record and job info are replaced together; on error both are left
    /// as they were.
    #[instrument(skip(self), fields(job_id = %self.record.job_id))]
    pub async fn refresh(&mut self) -> OqtopusResult<()> {
        let (record, info) = self
            .fetch()
            .await
            .map_err(|e| e.during("To refresh job is failed."))?;
        self.record = record;
        self.info = info;
        Ok(())
    }

    async fn fetch(&self) -> OqtopusResult<(JobRecord, JobInfo)> {
        let record = self.ctx.api.get_job(&self.record.job_id).await?;
        let info = self.ctx.resolve_info(&record).await?;
        Ok((record, info))
    }

    /// Poll until the job reaches a terminal status.
    ///
    /// Refreshes immediately, then every `interval` until the status is
    /// terminal or, when `timeout` is set, until `timeout` has elapsed.
    pub async fn wait_for_completion(
        &mut self,
        timeout: Option<Duration>,
        interval: Duration,
    ) -> OqtopusResult<WaitOutcome> {
        let start = Instant::now();
        self.refresh().await?;

        while !self.status().is_terminal() {
            if let Some(timeout) = timeout {
                if start.elapsed() >= timeout {
                    warn!(
                        "Job {} still {} after {:.1}s",
                        self.job_id(),
                        self.status(),
                        start.elapsed().as_secs_f64()
                    );
                    return Ok(WaitOutcome::TimedOut);
                }
            }

            debug!(
                "Job {} status: {}, waiting {}s",
                self.job_id(),
                self.status(),
                interval.as_secs_f64()
            );
            sleep(interval).await;
            self.refresh().await?;
        }

        Ok(WaitOutcome::Finished(self.status()))
    }

    /// Wait if needed, then ensure the job succeeded.
    pub(crate) async fn settle(
        &mut self,
        timeout: Option<Duration>,
        interval: Duration,
    ) -> OqtopusResult<()> {
        if !self.status().is_terminal()
            && self.wait_for_completion(timeout, interval).await? == WaitOutcome::TimedOut
        {
            return Err(BackendError::Timeout {
                job_id: self.record.job_id.clone(),
                timeout: timeout.unwrap_or_default(),
            }
            .into());
        }

        match self.status() {
            JobStatus::Failed | JobStatus::Cancelled => Err(BackendError::JobFailed {
                job_id: self.record.job_id.clone(),
                status: self.status(),
            }
            .into()),
            _ => Ok(()),
        }
    }

    /// Cancel the job and refresh its record.
    ///
    /// The service rejects cancellation of jobs that already ended.
    #[instrument(skip(self), fields(job_id = %self.record.job_id))]
    pub async fn cancel(&mut self) -> OqtopusResult<()> {
        let result = async {
            self.ctx.api.cancel_job(&self.record.job_id).await?;
            self.fetch().await
        }
        .await;

        let (record, info) = result.map_err(|e| e.during("To cancel job is failed."))?;
        info!("Cancelled job {}", record.job_id);
        self.record = record;
        self.info = info;
        Ok(())
    }

    /// JSON representation of the record.
    pub fn to_json(&self) -> OqtopusResult<String> {
        Ok(serde_json::to_string(&self.record)?)
    }
}

/// Common interface of typed jobs.
#[async_trait]
pub trait JobHandle: Send {
    /// Decoded result type.
    type Output: Send;

    /// Underlying job.
    fn job(&self) -> &Job;

    /// Underlying job, mutably.
    fn job_mut(&mut self) -> &mut Job;

    /// Decode the result payload of a succeeded job.
    fn decode(info: &JobInfo) -> OqtopusResult<Self::Output>;

    /// Wait for the job to end and decode its result.
    ///
    /// Fails with a timeout if `timeout` elapses first, and with
    /// [`BackendError::JobFailed`] if the job failed or was cancelled.
    async fn result(
        &mut self,
        timeout: Option<Duration>,
        interval: Duration,
    ) -> OqtopusResult<Self::Output> {
        let job = self.job_mut();
        job.settle(timeout, interval).await?;
        Self::decode(job.job_info())
    }
}

/// A job of either supported kind, as returned by retrieval.
#[derive(Debug, Clone)]
pub enum AnyJob {
    Sampling(SamplingJob),
    Estimation(EstimationJob),
}

impl AnyJob {
    /// Underlying job.
    pub fn job(&self) -> &Job {
        match self {
            AnyJob::Sampling(job) => job.job(),
            AnyJob::Estimation(job) => job.job(),
        }
    }

    /// Underlying job, mutably.
    pub fn job_mut(&mut self) -> &mut Job {
        match self {
            AnyJob::Sampling(job) => job.job_mut(),
            AnyJob::Estimation(job) => job.job_mut(),
        }
    }

    pub fn into_sampling(self) -> Option<SamplingJob> {
        match self {
            AnyJob::Sampling(job) => Some(job),
            AnyJob::Estimation(_) => None,
        }
    }

    pub fn into_estimation(self) -> Option<EstimationJob> {
        match self {
            AnyJob::Estimation(job) => Some(job),
            AnyJob::Sampling(_) => None,
        }
    }
}
