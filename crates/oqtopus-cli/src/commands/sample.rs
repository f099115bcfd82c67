//! Sample command implementation.
//!
//! Submit one or more OpenQASM 3 programs as a sampling job.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use console::style;

use oqtopus::{AnyJob, JobHandle, QasmInput, SamplingBackend};

use super::common::{Connection, job_options, print_job_result, read_qasm, wait_with_spinner};
use crate::Format;

/// Execute the sample command.
#[allow(clippy::too_many_arguments)]
pub async fn execute(
    conn: &Connection,
    inputs: &[PathBuf],
    device: &str,
    shots: u32,
    name: Option<String>,
    description: Option<String>,
    wait: bool,
    timeout: Option<u64>,
) -> Result<()> {
    let programs = inputs
        .iter()
        .map(|path| read_qasm(path))
        .collect::<Result<Vec<_>>>()?;
    let program = match <[String; 1]>::try_from(programs) {
        Ok([single]) => QasmInput::Single(single),
        Err(batch) => QasmInput::Batch(batch),
    };

    let backend = SamplingBackend::new(&conn.load_config()?)?;
    let mut job = backend
        .sample_qasm(program, device, shots, &job_options(name, description))
        .await?;

    println!(
        "{} Submitted job {} to {} ({} shots)",
        style("✓").green().bold(),
        style(job.job().job_id()).bold(),
        device,
        shots
    );

    if !wait {
        println!(
            "  Use 'oqtopus wait {}' to follow it.",
            job.job().job_id()
        );
        return Ok(());
    }

    let timeout = timeout.map(Duration::from_secs);
    wait_with_spinner(job.job_mut(), timeout, oqtopus::DEFAULT_POLL_INTERVAL).await?;
    if !job.job().status().is_terminal() {
        anyhow::bail!(
            "Job {} is still {}. Use 'oqtopus wait {}' to check later.",
            job.job().job_id(),
            job.job().status(),
            job.job().job_id()
        );
    }
    print_job_result(&mut AnyJob::Sampling(job), Format::Table).await
}
