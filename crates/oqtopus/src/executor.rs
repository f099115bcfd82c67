//! Job execution strategies.
//!
//! Backends hand finished submission requests to a [`JobExecutor`]. The
//! default [`NetworkExecutor`] submits to OQTOPUS Cloud; an
//! [`InProcessExecutor`] runs the request through a local function instead,
//! for environments where the job service is reached some other way.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::api::{JobApi, SubmitJobRequest};
use crate::error::OqtopusResult;
use crate::job::JobRecord;

/// Turns a submission request into the record of the created job.
#[async_trait]
pub trait JobExecutor: Send + Sync {
    async fn execute(&self, request: &SubmitJobRequest) -> OqtopusResult<JobRecord>;
}

/// Submits through the REST API, then fetches the created job.
#[derive(Clone)]
pub struct NetworkExecutor {
    api: Arc<dyn JobApi>,
}

impl NetworkExecutor {
    pub fn new(api: Arc<dyn JobApi>) -> Self {
        Self { api }
    }
}

impl fmt::Debug for NetworkExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkExecutor").finish_non_exhaustive()
    }
}

#[async_trait]
impl JobExecutor for NetworkExecutor {
    async fn execute(&self, request: &SubmitJobRequest) -> OqtopusResult<JobRecord> {
        let response = self.api.submit_job(request).await?;
        info!(
            "Submitted {} job {} to {}",
            request.job_type, response.job_id, request.device_id
        );
        self.api.get_job(&response.job_id).await
    }
}

type ExecuteFn = dyn Fn(&SubmitJobRequest) -> OqtopusResult<JobRecord> + Send + Sync;

/// Runs requests through a caller-supplied function without touching the network.
pub struct InProcessExecutor {
    run: Box<ExecuteFn>,
}

impl InProcessExecutor {
    pub fn new<F>(run: F) -> Self
    where
        F: Fn(&SubmitJobRequest) -> OqtopusResult<JobRecord> + Send + Sync + 'static,
    {
        Self { run: Box::new(run) }
    }
}

impl fmt::Debug for InProcessExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InProcessExecutor").finish_non_exhaustive()
    }
}

#[async_trait]
impl JobExecutor for InProcessExecutor {
    async fn execute(&self, request: &SubmitJobRequest) -> OqtopusResult<JobRecord> {
        debug!("Executing {} job in process", request.job_type);
        (self.run)(request)
    }
}
