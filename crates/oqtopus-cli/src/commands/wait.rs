//! Wait command implementation.
//!
//! Poll a job until it reaches a terminal state, then print results.

use std::time::Duration;

use anyhow::Result;
use console::style;

use oqtopus::WaitOutcome;

use super::common::{Connection, print_job_result, wait_with_spinner};
use crate::Format;

/// Execute the wait command.
pub async fn execute(
    conn: &Connection,
    job_id: &str,
    timeout: Option<u64>,
    interval: u64,
) -> Result<()> {
    let mut job = conn.job_backend()?.retrieve_job(job_id).await?;

    println!(
        "{} Waiting for job {}{}",
        style("→").cyan().bold(),
        style(job_id).dim(),
        timeout.map_or_else(String::new, |t| format!(" (timeout: {t}s)"))
    );

    let outcome = wait_with_spinner(
        job.job_mut(),
        timeout.map(Duration::from_secs),
        Duration::from_secs(interval),
    )
    .await?;

    match outcome {
        WaitOutcome::TimedOut => anyhow::bail!(
            "Timeout after {}s. Job {} is still {}. Use 'oqtopus status {}' to check later.",
            timeout.unwrap_or_default(),
            job_id,
            job.job().status(),
            job_id
        ),
        WaitOutcome::Finished(status) if status.is_success() => {
            print_job_result(&mut job, Format::Table).await
        }
        WaitOutcome::Finished(status) => {
            println!(
                "{} Job finished with status: {}",
                style("✗").red().bold(),
                style(status).red()
            );
            if let Some(message) = &job.job().job_info().message {
                println!("  {message}");
            }
            Ok(())
        }
    }
}
