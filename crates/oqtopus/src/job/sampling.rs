//! Sampling jobs.

use async_trait::async_trait;

use super::{Job, JobHandle, JobInfo};
use crate::error::OqtopusResult;
use crate::result::{SamplingResult, decode_sampling};

/// A `sampling` or `multi_manual` job.
#[derive(Debug, Clone)]
pub struct SamplingJob {
    job: Job,
}

impl SamplingJob {
    pub fn new(job: Job) -> Self {
        Self { job }
    }

    pub fn into_inner(self) -> Job {
        self.job
    }
}

#[async_trait]
impl JobHandle for SamplingJob {
    type Output = SamplingResult;

    fn job(&self) -> &Job {
        &self.job
    }

    fn job_mut(&mut self) -> &mut Job {
        &mut self.job
    }

    fn decode(info: &JobInfo) -> OqtopusResult<SamplingResult> {
        decode_sampling(info)
    }
}
