//! Estimation submissions.

use std::sync::Arc;

use tracing::instrument;

use super::{JobBackend, JobOptions, validate_shots};
use crate::api::{SubmitJobInfo, SubmitJobRequest};
use crate::config::OqtopusConfig;
use crate::error::OqtopusResult;
use crate::executor::JobExecutor;
use crate::job::{EstimationJob, JobType};
use crate::operator::Operator;
use crate::qasm::QasmProgram;

const ESTIMATION_FAILED: &str = "To execute estimation on OQTOPUS Cloud is failed.";

/// Submits expectation-value estimation jobs.
#[derive(Debug, Clone)]
pub struct EstimationBackend {
    backend: JobBackend,
}

impl EstimationBackend {
    /// Connect to OQTOPUS Cloud with the given configuration.
    pub fn new(config: &OqtopusConfig) -> OqtopusResult<Self> {
        Ok(Self::from_backend(JobBackend::new(config)?))
    }

    pub fn from_backend(backend: JobBackend) -> Self {
        Self { backend }
    }

    /// Replace the execution strategy.
    pub fn with_executor(self, executor: Arc<dyn JobExecutor>) -> Self {
        Self::from_backend(self.backend.with_executor(executor))
    }

    pub fn backend(&self) -> &JobBackend {
        &self.backend
    }

    /// Estimate `operator` on the state prepared by `circuit`.
    pub async fn estimate<C>(
        &self,
        circuit: &C,
        operator: &Operator,
        device_id: &str,
        shots: u32,
        options: &JobOptions,
    ) -> OqtopusResult<EstimationJob>
    where
        C: QasmProgram + ?Sized,
    {
        let qasm = circuit.to_qasm();
        self.estimate_qasm(&qasm, operator, device_id, shots, options)
            .await
    }

    /// Estimate `operator` on an OpenQASM 3 program.
    ///
    /// Every operator coefficient must be real. The job type is always
    /// `estimation`; `options.job_type` is ignored.
    #[instrument(skip(self, program, operator, options))]
    pub async fn estimate_qasm(
        &self,
        program: &str,
        operator: &Operator,
        device_id: &str,
        shots: u32,
        options: &JobOptions,
    ) -> OqtopusResult<EstimationJob> {
        validate_shots(shots)?;
        let operator = operator.encode()?;

        let request = SubmitJobRequest {
            name: options.name.clone(),
            description: options.description.clone(),
            device_id: device_id.to_string(),
            job_type: JobType::Estimation,
            job_info: SubmitJobInfo {
                program: vec![program.to_string()],
                operator: Some(operator),
            },
            transpiler_info: options.transpiler_info.clone(),
            simulator_info: options.simulator_info.clone(),
            mitigation_info: options.mitigation_info.clone(),
            shots,
        };

        let job = self.backend.execute(request, ESTIMATION_FAILED).await?;
        Ok(EstimationJob::new(job))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OqtopusError;
    use crate::job::{JobHandle, JobStatus};
    use crate::qasm::QasmSource;
    use crate::testing::{MockJobApi, MockStore, dummy_record};
    use num_complex::Complex64;

    const BELL: &str = "OPENQASM 3;\ninclude \"stdgates.inc\";\nqubit[2] q;\n\nh q[0];\ncx q[0], q[1];";

    fn backend(api: Arc<MockJobApi>) -> EstimationBackend {
        EstimationBackend::from_backend(JobBackend::with_api(api, Arc::new(MockStore::default())))
    }

    fn estimation_record() -> crate::job::JobRecord {
        let mut record = dummy_record(JobStatus::Submitted);
        record.job_type = JobType::Estimation;
        record
    }

    #[tokio::test]
    async fn test_estimate_qasm_request() {
        let api = MockJobApi::new(vec![estimation_record()]);
        let operator = Operator::new().with_term("X0 X1", 1.0).with_term("Z0 Z1", 0.5);

        let job = backend(api.clone())
            .estimate_qasm(BELL, &operator, "dummy_device_id", 1000, &JobOptions::default())
            .await
            .unwrap();
        assert_eq!(job.job().job_type(), JobType::Estimation);

        let submitted = api.submitted();
        assert_eq!(submitted[0].job_type, JobType::Estimation);
        assert_eq!(submitted[0].job_info.program, vec![BELL.to_string()]);
        let items = submitted[0].job_info.operator.as_ref().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].pauli, "Z0 Z1");
        assert_eq!(items[1].coeff, 0.5);
    }

    #[tokio::test]
    async fn test_estimate_circuit_keeps_program() {
        let api = MockJobApi::new(vec![estimation_record()]);
        let operator = Operator::new().with_term("Z0", 1.0);
        backend(api.clone())
            .estimate(&QasmSource::new(BELL), &operator, "d", 10, &JobOptions::default())
            .await
            .unwrap();
        assert!(!api.submitted()[0].job_info.program[0].contains("measure"));
    }

    #[tokio::test]
    async fn test_complex_coefficient_rejected() {
        let api = MockJobApi::new(vec![]);
        let mut operator = Operator::new();
        operator.add_term("X0", Complex64::new(1.0, 2.0));

        let err = backend(api.clone())
            .estimate_qasm(BELL, &operator, "d", 10, &JobOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OqtopusError::Validation(ref m) if m.contains("Complex numbers")));
        assert!(api.submitted().is_empty());
    }

    #[tokio::test]
    async fn test_zero_shots_rejected() {
        let api = MockJobApi::new(vec![]);
        let err = backend(api)
            .estimate_qasm(BELL, &Operator::new(), "d", 0, &JobOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, OqtopusError::Validation(_)));
    }

    #[tokio::test]
    async fn test_submission_failure_is_wrapped() {
        let api = MockJobApi::new(vec![]);
        api.fail_submit(true);
        let err = backend(api)
            .estimate_qasm(BELL, &Operator::new().with_term("Z0", 1.0), "d", 10, &JobOptions::default())
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with(ESTIMATION_FAILED));
    }
}
