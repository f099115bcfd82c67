//! OQTOPUS Command-Line Interface
//!
//! Submit OpenQASM 3 programs to OQTOPUS Cloud, follow their jobs and fetch
//! the results.
//!
//! ```text
//! oqtopus devices
//! oqtopus sample -i bell.qasm -d Kawasaki -s 1000 --wait
//! oqtopus estimate -i ansatz.qasm -o "X0 X1=1.0" -o "Z0 Z1=0.5" -d Kawasaki
//! oqtopus result <job_id>
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::common::Connection;
use commands::{cancel, devices, estimate, result, sample, status, wait};

/// OQTOPUS - submit quantum jobs to OQTOPUS Cloud
#[derive(Parser, Debug)]
#[command(name = "oqtopus")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (defaults to ~/.oqtopus)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Configuration file section
    #[arg(long, global = true, env = "OQTOPUS_PROFILE")]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Table,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List devices
    Devices,

    /// Show one device
    Device {
        /// Device ID
        device_id: String,
    },

    /// Submit a sampling job
    Sample {
        /// OpenQASM 3 file; repeat to submit several programs as one job
        #[arg(short, long, required = true)]
        input: Vec<PathBuf>,

        /// Target device
        #[arg(short, long)]
        device: String,

        /// Number of shots
        #[arg(short, long, default_value = "1000")]
        shots: u32,

        /// Job name
        #[arg(long)]
        name: Option<String>,

        /// Job description
        #[arg(long)]
        description: Option<String>,

        /// Wait for the job and print its result
        #[arg(short, long)]
        wait: bool,

        /// Timeout in seconds when waiting
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Submit an estimation job
    Estimate {
        /// OpenQASM 3 file preparing the state
        #[arg(short, long)]
        input: PathBuf,

        /// Operator term as PAULI=COEFF, e.g. "X0 X1=0.5"
        #[arg(short, long = "operator", required = true)]
        operator: Vec<String>,

        /// Target device
        #[arg(short, long)]
        device: String,

        /// Number of shots
        #[arg(short, long, default_value = "1000")]
        shots: u32,

        /// Job name
        #[arg(long)]
        name: Option<String>,

        /// Job description
        #[arg(long)]
        description: Option<String>,

        /// Wait for the job and print its result
        #[arg(short, long)]
        wait: bool,

        /// Timeout in seconds when waiting
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Query job status
    Status {
        /// Job ID
        job_id: String,
    },

    /// Wait for a job to complete
    Wait {
        /// Job ID
        job_id: String,

        /// Timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Polling interval in seconds
        #[arg(long, default_value = "10")]
        interval: u64,
    },

    /// Retrieve the result of a finished job
    Result {
        /// Job ID
        job_id: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,
    },

    /// Cancel a job
    Cancel {
        /// Job ID
        job_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let conn = Connection::new(cli.config, cli.profile);

    let result = match cli.command {
        Commands::Devices => devices::execute_list(&conn).await,

        Commands::Device { device_id } => devices::execute_show(&conn, &device_id).await,

        Commands::Sample {
            input,
            device,
            shots,
            name,
            description,
            wait: do_wait,
            timeout,
        } => {
            sample::execute(
                &conn,
                &input,
                &device,
                shots,
                name,
                description,
                do_wait,
                timeout,
            )
            .await
        }

        Commands::Estimate {
            input,
            operator,
            device,
            shots,
            name,
            description,
            wait: do_wait,
            timeout,
        } => {
            estimate::execute(
                &conn,
                &input,
                &operator,
                &device,
                shots,
                name,
                description,
                do_wait,
                timeout,
            )
            .await
        }

        Commands::Status { job_id } => status::execute(&conn, &job_id).await,

        Commands::Wait {
            job_id,
            timeout,
            interval,
        } => wait::execute(&conn, &job_id, timeout, interval).await,

        Commands::Result { job_id, format } => result::execute(&conn, &job_id, format).await,

        Commands::Cancel { job_id } => cancel::execute(&conn, &job_id).await,
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }

    Ok(())
}
