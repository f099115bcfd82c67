//! Shared helpers for CLI commands.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use oqtopus::{
    AnyJob, Counts, EstimationResult, Job, JobBackend, JobHandle, JobInfo, JobOptions, Operator,
    OqtopusConfig, SamplingResult, WaitOutcome,
};
use serde_json::Value;

use crate::Format;

/// Where to find the connection settings.
#[derive(Debug, Clone, Default)]
pub struct Connection {
    config: Option<PathBuf>,
    profile: Option<String>,
}

impl Connection {
    pub fn new(config: Option<PathBuf>, profile: Option<String>) -> Self {
        Self { config, profile }
    }

    /// Resolve the configuration: an explicit file, else environment, else `~/.oqtopus`.
    pub fn load_config(&self) -> Result<OqtopusConfig> {
        let profile = self.profile.as_deref();
        match &self.config {
            Some(path) => OqtopusConfig::from_file(path, profile)
                .with_context(|| format!("Failed to load configuration from {}", path.display())),
            None => OqtopusConfig::load(profile).context(
                "No OQTOPUS configuration found. Set OQTOPUS_URL and OQTOPUS_API_TOKEN or create ~/.oqtopus",
            ),
        }
    }

    pub fn job_backend(&self) -> Result<JobBackend> {
        Ok(JobBackend::new(&self.load_config()?)?)
    }
}

/// Read an OpenQASM 3 program from a file.
pub fn read_qasm(path: &Path) -> Result<String> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))
}

/// Parse one operator term written as `PAULI=COEFF`.
pub fn parse_operator_term(term: &str) -> Result<(String, f64)> {
    let (pauli, coeff) = term
        .rsplit_once('=')
        .ok_or_else(|| anyhow::anyhow!("Invalid operator term '{term}': expected PAULI=COEFF"))?;

    let pauli = pauli.trim();
    if pauli.is_empty() {
        anyhow::bail!("Invalid operator term '{term}': empty Pauli string");
    }
    let coeff: f64 = coeff
        .trim()
        .parse()
        .with_context(|| format!("Invalid coefficient in operator term '{term}'"))?;
    Ok((pauli.to_string(), coeff))
}

pub fn parse_operator(terms: &[String]) -> Result<Operator> {
    terms.iter().map(|t| parse_operator_term(t)).collect()
}

pub fn job_options(name: Option<String>, description: Option<String>) -> JobOptions {
    let mut options = JobOptions::new();
    if let Some(name) = name {
        options = options.with_name(name);
    }
    if let Some(description) = description {
        options = options.with_description(description);
    }
    options
}

pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(template);
    }
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Poll a job behind a spinner.
pub async fn wait_with_spinner(
    job: &mut Job,
    timeout: Option<Duration>,
    interval: Duration,
) -> Result<WaitOutcome> {
    let spinner = spinner(format!("Waiting for job {} to complete...", job.job_id()));
    let outcome = job.wait_for_completion(timeout, interval).await;
    spinner.finish_and_clear();
    Ok(outcome?)
}

/// Decode and print the result of a finished job.
pub async fn print_job_result(job: &mut AnyJob, format: Format) -> Result<()> {
    match job {
        AnyJob::Sampling(job) => {
            let result = job.result(None, oqtopus::DEFAULT_POLL_INTERVAL).await?;
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
                Format::Table => print_sampling(&result, job.job().job_info()),
            }
        }
        AnyJob::Estimation(job) => {
            let result = job.result(None, oqtopus::DEFAULT_POLL_INTERVAL).await?;
            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&result)?),
                Format::Table => print_estimation(&result),
            }
        }
    }
    Ok(())
}

/// Bit string of an outcome over a register of `width` bits.
pub fn format_outcome(value: u64, width: usize) -> String {
    format!("{value:0width$b}")
}

/// Register width as reported by the service: the length of its bit-string keys.
pub fn register_width(raw_counts: Option<&Value>) -> Option<usize> {
    let parsed;
    let counts = match raw_counts? {
        Value::String(s) => {
            parsed = serde_json::from_str::<Value>(s).ok()?;
            &parsed
        }
        other => other,
    };
    counts.as_object()?.keys().map(|key| key.trim().len()).max()
}

/// Fallback width: enough bits for the largest outcome.
fn value_width(counts: &Counts) -> usize {
    counts
        .iter()
        .map(|(v, _)| (u64::BITS - v.leading_zeros()).max(1) as usize)
        .max()
        .unwrap_or(1)
}

pub fn print_counts(counts: &Counts, width: usize) {
    let total = counts.total_shots() as f64;
    let mut sorted: Vec<(u64, u64)> = counts.iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    for (value, count) in sorted.iter().take(16) {
        let prob = *count as f64 / total * 100.0;
        let bar: String = "█".repeat((prob / 2.0).round() as usize);
        println!(
            "  {}: {:>6} ({:>5.2}%) {}",
            style(format_outcome(*value, width)).cyan(),
            count,
            prob,
            style(bar).green()
        );
    }

    if sorted.len() > 16 {
        println!("  ... and {} more outcomes", sorted.len() - 16);
    }
}

pub fn print_sampling(result: &SamplingResult, info: &JobInfo) {
    let raw = info.sampling_result();
    println!(
        "\n{} Results ({} shots):",
        style("✓").green().bold(),
        result.counts.total_shots()
    );
    let width = register_width(raw.and_then(|s| s.get("counts")))
        .unwrap_or_else(|| value_width(&result.counts));
    print_counts(&result.counts, width);

    if let Some(divided) = &result.divided_counts {
        let raw_divided = raw.and_then(|s| s.get("divided_counts")).map(|d| match d {
            Value::String(s) => serde_json::from_str(s).unwrap_or(Value::Null),
            other => other.clone(),
        });
        for (index, counts) in divided {
            let width = register_width(raw_divided.as_ref().and_then(|d| d.get(index.to_string())))
                .unwrap_or_else(|| value_width(counts));
            println!("\n  Program {}:", style(index).bold());
            print_counts(counts, width);
        }
    }
}

pub fn print_estimation(result: &EstimationResult) {
    let show = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{v:.6}"));
    println!("\n{} Estimation result:", style("✓").green().bold());
    println!("  Expectation value: {}", style(show(result.exp_value)).yellow());
    println!("  Standard deviation: {}", show(result.stds));
}

pub fn print_job(job: &Job) {
    let status = if job.status().is_success() {
        style(job.status().as_str()).green()
    } else if job.status().is_terminal() {
        style(job.status().as_str()).red()
    } else {
        style(job.status().as_str()).yellow()
    };

    println!("  {:<14} {}", "Job ID:", style(job.job_id()).bold());
    if let Some(name) = job.name() {
        println!("  {:<14} {}", "Name:", name);
    }
    println!("  {:<14} {}", "Type:", job.job_type());
    println!("  {:<14} {}", "Status:", status);
    println!("  {:<14} {}", "Device:", job.device_id());
    if let Some(shots) = job.shots() {
        println!("  {:<14} {}", "Shots:", shots);
    }
    if let Some(at) = job.submitted_at() {
        println!("  {:<14} {}", "Submitted:", at.to_rfc3339());
    }
    if let Some(at) = job.ended_at() {
        println!("  {:<14} {}", "Ended:", at.to_rfc3339());
    }
    if let Some(secs) = job.execution_time() {
        println!("  {:<14} {:.3}s", "Execution:", secs);
    }
    if let Some(message) = &job.job_info().message {
        println!("  {:<14} {}", "Message:", message);
    }
}
