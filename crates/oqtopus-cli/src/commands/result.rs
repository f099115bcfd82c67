//! Result command implementation.
//!
//! Retrieve and display results for a finished job.

use anyhow::Result;
use console::style;

use super::common::{Connection, print_job_result};
use crate::Format;

/// Execute the result command.
pub async fn execute(conn: &Connection, job_id: &str, format: Format) -> Result<()> {
    let mut job = conn.job_backend()?.retrieve_job(job_id).await?;

    let status = job.job().status();
    if !status.is_terminal() {
        anyhow::bail!("Job {job_id} is still {status}. Use 'oqtopus wait {job_id}' to wait for it.");
    }

    if format == Format::Table {
        println!(
            "{} Fetching results for job {}",
            style("→").cyan().bold(),
            style(job_id).dim()
        );
    }
    print_job_result(&mut job, format).await
}
