use std::path::PathBuf;
use std::process::{ExitCode, ExitStatus};

use clap::Parser;
use matrix_mul::launch::COORDINATOR_ADDR_VAR;
use matrix_mul::{Error, LaunchEnv, cli, telemetry};
use tokio::net::TcpListener;
use tokio::process::Command;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Starts one process per rank of a hybrid program and waits for all of them.
///
/// Each process gets its rank, the rank count and the coordinator address in
/// its environment. If one process fails, the others are killed.
#[derive(Parser)]
#[command(name = "matmul-launch")]
struct Args {
    /// Number of processes (ranks) to start.
    #[arg(short = 'n', long = "np", value_parser = cli::parse_worker_count)]
    workers: usize,

    /// Address rank 0 listens on; a free local port when unset.
    #[arg(long, env = COORDINATOR_ADDR_VAR)]
    addr: Option<String>,

    /// Program to start.
    program: PathBuf,

    /// Arguments passed to every process.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => return cli::usage_exit(e, true),
    };
    telemetry::init();

    match run(args).await {
        Ok(status) if status.success() => ExitCode::SUCCESS,
        Ok(status) => ExitCode::from(status.code().and_then(|c| u8::try_from(c).ok()).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Returns the first failing status, or success once every rank succeeded.
async fn run(args: Args) -> Result<ExitStatus, Error> {
    let addr = match args.addr {
        Some(addr) => addr,
        None => free_local_addr().await?,
    };

    let mut ranks = JoinSet::new();
    for rank in 0..args.workers {
        let env = LaunchEnv {
            rank,
            world_size: args.workers,
            coordinator_addr: addr.clone(),
        };
        let mut child = Command::new(&args.program)
            .args(&args.args)
            .envs(env.vars())
            .kill_on_drop(true)
            .spawn()?;
        debug!(rank, pid = ?child.id(), "rank started");
        ranks.spawn(async move { (rank, child.wait().await) });
    }

    let mut outcome = None;
    while let Some(joined) = ranks.join_next().await {
        let (rank, status) = joined?;
        let status = status?;
        if !status.success() {
            warn!(rank, %status, "rank failed, stopping the others");
            outcome = Some(status);
            break;
        }
        outcome.get_or_insert(status);
    }
    // Dropping the remaining waits kills their children.
    ranks.shutdown().await;

    Ok(outcome.unwrap_or_default())
}

async fn free_local_addr() -> Result<String, Error> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    Ok(listener.local_addr()?.to_string())
}
