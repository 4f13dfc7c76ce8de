use anyhow::Result;
use clap::{Parser, Subcommand};
use jobwarden::commands::{job, reconcile, report, supervise};
use jobwarden::config::{resolve_state_dir, Config};
use jobwarden::fs::StateDir;
use jobwarden::logging;
use jobwarden::models::{JobStatus, Severity};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "jobwarden")]
#[command(about = "Supervise batch compute jobs and recover orphaned ones", long_about = None)]
#[command(version)]
struct Cli {
    /// State directory shared by workers and supervisors (default: ~/.jobwarden)
    #[arg(long, global = true, env = "JOBWARDEN_STATE_DIR")]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch one job until it finishes, fails or crashes
    Supervise {
        /// Pid of the worker process
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        pid: u32,

        #[arg(long)]
        job_id: u64,

        /// Seconds to wait for a log message before polling the worker
        #[arg(long)]
        timeout: Option<f64>,

        /// Append diagnostics to this file instead of stderr
        #[arg(long)]
        log_file: Option<PathBuf>,
    },

    /// Start supervisors for running jobs whose supervisor has died
    Reconcile {
        /// Keep scanning until interrupted
        #[arg(short, long)]
        watch: bool,

        /// Seconds between scans in watch mode (default from config: 30)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Create and inspect job records
    Job {
        #[command(subcommand)]
        command: JobCommands,
    },

    /// Report worker-side events for a job
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
}

#[derive(Subcommand)]
enum JobCommands {
    /// Register a worker process as a new pending job
    Create {
        #[arg(long)]
        job_id: u64,

        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        pid: u32,

        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        supervisor_pid: Option<u32>,

        /// Seconds without progress before failed nodes abort the job
        #[arg(long)]
        progress_timeout: Option<u64>,
    },

    /// Show a job record
    Show { job_id: u64 },

    /// List all job records
    List,

    /// Change a job's status (pending → running → succeeded/failed)
    SetStatus { job_id: u64, status: JobStatus },
}

#[derive(Subcommand)]
enum ReportCommands {
    /// Append a log message to the job's stream
    Log {
        #[arg(long)]
        job_id: u64,

        /// Logger name inside the job namespace, e.g. job.42.worker
        #[arg(long)]
        logger: String,

        /// trace, debug, info, warning, error or critical
        #[arg(long, default_value = "info")]
        severity: Severity,

        #[arg(long)]
        message: String,
    },

    /// Count one failure event (counted as <area>/<name>:failed)
    Failure {
        #[arg(long)]
        job_id: u64,

        #[arg(long)]
        area: String,

        #[arg(long)]
        name: String,
    },

    /// Mark that the job made progress now
    Progress {
        #[arg(long)]
        job_id: u64,
    },

    /// Set the number of failed compute nodes
    FailedNodes {
        #[arg(long)]
        job_id: u64,

        #[arg(long)]
        count: u32,
    },

    /// Store a job-scoped cache entry
    Cache {
        #[arg(long)]
        job_id: u64,

        #[arg(long)]
        key: String,

        #[arg(long)]
        value: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_file = match &cli.command {
        Commands::Supervise { log_file, .. } => log_file.clone(),
        _ => None,
    };
    logging::init(log_file.as_deref())?;

    let state = StateDir::new(resolve_state_dir(cli.state_dir)?);
    let config = Config::load(state.root())?;

    match cli.command {
        Commands::Supervise {
            pid,
            job_id,
            timeout,
            log_file: _,
        } => supervise::execute(&state, &config, job_id, pid, timeout).map(|_| ()),
        Commands::Reconcile { watch, interval } => {
            reconcile::execute(&state, &config, watch, interval)
        }
        Commands::Job { command } => match command {
            JobCommands::Create {
                job_id,
                pid,
                supervisor_pid,
                progress_timeout,
            } => job::create(&state, &config, job_id, pid, supervisor_pid, progress_timeout),
            JobCommands::Show { job_id } => job::show(&state, job_id),
            JobCommands::List => job::list(&state),
            JobCommands::SetStatus { job_id, status } => job::set_status(&state, job_id, status),
        },
        Commands::Report { command } => match command {
            ReportCommands::Log {
                job_id,
                logger,
                severity,
                message,
            } => report::log(&state, job_id, &logger, severity, &message),
            ReportCommands::Failure { job_id, area, name } => {
                report::failure(&state, &config, job_id, &area, &name)
            }
            ReportCommands::Progress { job_id } => report::progress(&state, &config, job_id),
            ReportCommands::FailedNodes { job_id, count } => {
                report::failed_nodes(&state, &config, job_id, count)
            }
            ReportCommands::Cache { job_id, key, value } => {
                report::cache(&state, job_id, &key, &value)
            }
        },
    }
}
