//! `cache-gc`: inspect and clear job-scoped cache entries by hand.

use anyhow::Result;
use clap::{CommandFactory, Parser};
use jobwarden::commands::cache;
use jobwarden::config::resolve_state_dir;
use jobwarden::fs::StateDir;
use jobwarden::logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cache-gc")]
#[command(about = "List or clear job cache data", long_about = None)]
#[command(version)]
struct Cli {
    /// State directory shared by workers and supervisors (default: ~/.jobwarden)
    #[arg(long, env = "JOBWARDEN_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// List the ids of all jobs holding cache data
    #[arg(short, long, conflicts_with = "job")]
    list: bool,

    /// Clear all cache data of the given job
    #[arg(short, long, value_name = "JOB_ID")]
    job: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(None)?;

    let state = StateDir::new(resolve_state_dir(cli.state_dir)?);

    if cli.list {
        return cache::list(&state);
    }
    if let Some(job) = cli.job {
        return cache::clear(&state, &job);
    }

    Cli::command().print_help()?;
    println!();
    Ok(())
}
