//! Status command implementation.

use anyhow::Result;

use super::common::{Connection, print_job};

/// Execute the status command.
pub async fn execute(conn: &Connection, job_id: &str) -> Result<()> {
    let job = conn.job_backend()?.retrieve_job(job_id).await?;
    print_job(job.job());
    Ok(())
}
