//! Sampling submissions.

use std::sync::Arc;

use tracing::instrument;

use super::{JobBackend, JobOptions, validate_shots};
use crate::api::{SubmitJobInfo, SubmitJobRequest};
use crate::config::OqtopusConfig;
use crate::error::OqtopusResult;
use crate::executor::JobExecutor;
use crate::job::{JobType, SamplingJob};
use crate::qasm::{QasmInput, QasmProgram, with_measurement};

const SAMPLING_FAILED: &str = "To execute sampling on OQTOPUS Cloud is failed.";

/// Submits sampling jobs.
///
/// # Example
///
/// ```ignore
/// use oqtopus::{JobHandle, JobOptions, OqtopusConfig, SamplingBackend};
///
/// let backend = SamplingBackend::new(&OqtopusConfig::load(None)?)?;
/// let mut job = backend
///     .sample_qasm(BELL_QASM, "Kawasaki", 1000, &JobOptions::default())
///     .await?;
/// let result = job.result(None, oqtopus::DEFAULT_POLL_INTERVAL).await?;
/// println!("{}", result.counts);
/// ```
#[derive(Debug, Clone)]
pub struct SamplingBackend {
    backend: JobBackend,
}

impl SamplingBackend {
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

    /// Shared connections.
    pub fn backend(&self) -> &JobBackend {
        &self.backend
    }

    /// Sample one circuit.
    ///
    /// A measurement of every qubit is added if the program has none.
    pub async fn sample<C>(
        &self,
        circuit: &C,
        device_id: &str,
        shots: u32,
        options: &JobOptions,
    ) -> OqtopusResult<SamplingJob>
    where
        C: QasmProgram + ?Sized,
    {
        let qasm = with_measurement(&circuit.to_qasm(), circuit.qubit_count());
        self.sample_qasm(qasm, device_id, shots, options).await
    }

    /// Sample several circuits as one combined job.
    pub async fn sample_batch<C>(
        &self,
        circuits: &[C],
        device_id: &str,
        shots: u32,
        options: &JobOptions,
    ) -> OqtopusResult<SamplingJob>
    where
        C: QasmProgram,
    {
        let programs: Vec<String> = circuits
            .iter()
            .map(|c| with_measurement(&c.to_qasm(), c.qubit_count()))
            .collect();
        self.sample_qasm(programs, device_id, shots, options).await
    }

    /// Sample OpenQASM 3 program text as given.
    ///
    /// A single program is submitted as `sampling`, a batch as `multi_manual`,
    /// unless `options.job_type` says otherwise.
    #[instrument(skip(self, program, options))]
    pub async fn sample_qasm(
        &self,
        program: impl Into<QasmInput> + Send,
        device_id: &str,
        shots: u32,
        options: &JobOptions,
    ) -> OqtopusResult<SamplingJob> {
        validate_shots(shots)?;

        let program = program.into();
        let job_type = options.job_type.unwrap_or(match program {
            QasmInput::Single(_) => JobType::Sampling,
            QasmInput::Batch(_) => JobType::MultiManual,
        });

        let request = SubmitJobRequest {
            name: options.name.clone(),
            description: options.description.clone(),
            device_id: device_id.to_string(),
            job_type,
            job_info: SubmitJobInfo {
                program: program.into_programs(),
                operator: None,
            },
            transpiler_info: options.transpiler_info.clone(),
            simulator_info: options.simulator_info.clone(),
            mitigation_info: options.mitigation_info.clone(),
            shots,
        };

        let job = self.backend.execute(request, SAMPLING_FAILED).await?;
        Ok(SamplingJob::new(job))
    }
}
