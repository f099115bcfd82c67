//! Estimation jobs.

use async_trait::async_trait;

use super::{Job, JobHandle, JobInfo};
use crate::error::OqtopusResult;
use crate::result::{EstimationResult, decode_estimation};

/// An `estimation` job.
#[derive(Debug, Clone)]
pub struct EstimationJob {
    job: Job,
}

impl EstimationJob {
    pub fn new(job: Job) -> Self {
        Self { job }
    }

    pub fn into_inner(self) -> Job {
        self.job
    }
}

#[async_trait]
impl JobHandle for EstimationJob {
    type Output = EstimationResult;

    fn job(&self) -> &Job {
        &self.job
    }

    fn job_mut(&mut self) -> &mut Job {
        &mut self.job
    }

    fn decode(info: &JobInfo) -> OqtopusResult<EstimationResult> {
        decode_estimation(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobStatus, JobType};
    use crate::testing::{MockJobApi, dummy_record, job_context};
    use serde_json::json;
    use std::time::Duration;

    fn estimation_record(status: JobStatus) -> crate::job::JobRecord {
        let mut record = dummy_record(status);
        record.job_type = JobType::Estimation;
        record.job_info = json!({
            "program": ["OPENQASM 3;"],
            "operator": [{"pauli": "X0 X1", "coeff": 1.0}],
            "result": {"estimation": {"exp_value": 2.0, "stds": 1.1}}
        });
        record
    }

    #[tokio::test]
    async fn test_estimation_result() {
        let job = Job::load(
            estimation_record(JobStatus::Succeeded),
            job_context(MockJobApi::new(vec![])),
        )
        .await
        .unwrap();
        assert_eq!(job.job_info().operator.as_ref().unwrap()[0].pauli, "X0 X1");

        let result = EstimationJob::new(job)
            .result(None, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(result.exp_value, Some(2.0));
        assert_eq!(result.stds, Some(1.1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_estimation_result_after_failure() {
        let api = MockJobApi::new(vec![estimation_record(JobStatus::Failed)]);
        let job = Job::load(estimation_record(JobStatus::Running), job_context(api))
            .await
            .unwrap();

        let err = EstimationJob::new(job)
            .result(None, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("ended with status failed"));
    }
}
