//! OQTOPUS Cloud client SDK
//!
//! This crate submits OpenQASM 3 programs to OQTOPUS Cloud for sampling or
//! expectation-value estimation, polls the jobs until they end, and decodes
//! their results.
//!
//! # Overview
//!
//! - [`OqtopusConfig`] resolves the endpoint, token and proxy from the
//!   environment or `~/.oqtopus`
//! - [`SamplingBackend`] and [`EstimationBackend`] submit jobs
//! - [`JobHandle::result`] waits for a job and decodes a [`SamplingResult`] or
//!   [`EstimationResult`]
//! - [`DeviceBackend`] lists devices
//! - [`OqtopusStorage`] moves zipped JSON documents through presigned URLs
//!
//! # Configuration
//!
//! | Source | Keys |
//! |--------|------|
//! | Environment | `OQTOPUS_URL`, `OQTOPUS_API_TOKEN`, `OQTOPUS_PROXY` |
//! | `~/.oqtopus` section | `url`, `api_token`, `proxy` |
//!
//! # Example: Sampling a Bell State
//!
//! ```ignore
//! use oqtopus::{JobHandle, JobOptions, OqtopusConfig, SamplingBackend, DEFAULT_POLL_INTERVAL};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = OqtopusConfig::load(None)?;
//!     let backend = SamplingBackend::new(&config)?;
//!
//!     let qasm = r#"OPENQASM 3;
//! include "stdgates.inc";
//! qubit[2] q;
//! bit[2] c;
//! h q[0];
//! cx q[0], q[1];
//! c = measure q;"#;
//!
//!     let mut job = backend
//!         .sample_qasm(qasm, "Kawasaki", 1000, &JobOptions::default())
//!         .await?;
//!     println!("Job submitted: {}", job.job().job_id());
//!
//!     let result = job.result(None, DEFAULT_POLL_INTERVAL).await?;
//!     println!("Counts: {}", result.counts);
//!     Ok(())
//! }
//! ```
//!
//! # Example: Estimation
//!
//! ```ignore
//! use oqtopus::{EstimationBackend, JobHandle, JobOptions, Operator};
//!
//! let backend = EstimationBackend::new(&config)?;
//! let operator = Operator::new().with_term("X0 X1", 1.0).with_term("Z0 Z1", 0.5);
//! let mut job = backend
//!     .estimate_qasm(qasm, &operator, "Kawasaki", 10000, &JobOptions::default())
//!     .await?;
//! let result = job.result(Some(Duration::from_secs(600)), DEFAULT_POLL_INTERVAL).await?;
//! println!("<O> = {:?} ± {:?}", result.exp_value, result.stds);
//! ```

pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod executor;
pub mod job;
pub mod operator;
pub mod qasm;
pub mod result;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{
    DeviceApi, Device, JobApi, OqtopusClient, SubmitJobInfo, SubmitJobRequest, SubmitJobResponse,
};
pub use backend::{
    DeviceBackend, EstimationBackend, JobBackend, JobOptions, SamplingBackend, validate_shots,
};
pub use config::OqtopusConfig;
pub use error::{BackendError, OqtopusError, OqtopusResult, StorageError};
pub use executor::{InProcessExecutor, JobExecutor, NetworkExecutor};
pub use job::{
    AnyJob, DEFAULT_POLL_INTERVAL, EstimationJob, Job, JobContext, JobHandle, JobInfo, JobRecord,
    JobStatus, JobType, SamplingJob, WaitOutcome,
};
pub use operator::{Operator, OperatorItem};
pub use qasm::{QasmInput, QasmProgram, QasmSource, with_measurement};
pub use result::{Counts, EstimationResult, SamplingResult, decode_bits};
pub use storage::{
    JsonObject, ObjectStore, OqtopusStorage, PresignedFields, PresignedUpload, extract_json_zip,
    pack_json_zip,
};
