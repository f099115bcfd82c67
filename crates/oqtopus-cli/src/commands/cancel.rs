//! Cancel command implementation.

use anyhow::Result;
use console::style;

use super::common::Connection;

/// Execute the cancel command.
pub async fn execute(conn: &Connection, job_id: &str) -> Result<()> {
    let mut job = conn.job_backend()?.retrieve_job(job_id).await?;
    job.job_mut().cancel().await?;

    println!(
        "{} Cancellation requested for job {} (status: {})",
        style("✓").green().bold(),
        style(job_id).bold(),
        job.job().status()
    );
    Ok(())
}
