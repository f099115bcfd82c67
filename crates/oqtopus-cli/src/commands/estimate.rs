//! Estimate command implementation.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use console::style;

use oqtopus::{AnyJob, EstimationBackend, JobHandle};

use super::common::{
    Connection, job_options, parse_operator, print_job_result, read_qasm, wait_with_spinner,
};
use crate::Format;

/// Execute the estimate command.
#[allow(clippy::too_many_arguments)]
pub async fn execute(
    conn: &Connection,
    input: &Path,
    terms: &[String],
    device: &str,
    shots: u32,
    name: Option<String>,
    description: Option<String>,
    wait: bool,
    timeout: Option<u64>,
) -> Result<()> {
    let program = read_qasm(input)?;
    let operator = parse_operator(terms)?;

    let backend = EstimationBackend::new(&conn.load_config()?)?;
    let mut job = backend
        .estimate_qasm(
            &program,
            &operator,
            device,
            shots,
            &job_options(name, description),
        )
        .await?;

    println!(
        "{} Submitted estimation job {} to {} ({} terms, {} shots)",
        style("✓").green().bold(),
        style(job.job().job_id()).bold(),
        device,
        operator.len(),
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
    print_job_result(&mut AnyJob::Estimation(job), Format::Table).await
}
