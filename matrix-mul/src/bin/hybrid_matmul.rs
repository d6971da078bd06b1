use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use collective::tcp;
use matrix_mul::record::{self, Record};
use matrix_mul::{Error, HybridConfig, LaunchEnv, Schedule, SchedulePolicy, cli, hybrid, telemetry};
use tracing::{Instrument, info_span};

/// Times an N×N matrix multiply split by row blocks across processes, each
/// multiplying its block on a pool of threads.
///
/// Start one process per rank with `matmul-launch -n <P> hybrid-matmul ...`.
#[derive(Parser)]
#[command(name = "hybrid-matmul")]
struct Args {
    /// Matrix size (N x N).
    #[arg(value_parser = cli::parse_dimension)]
    n: usize,

    /// Loop schedule within each process: static, dynamic or guided.
    schedule_type: SchedulePolicy,

    /// Threads per process.
    #[arg(value_parser = cli::parse_thread_count)]
    num_threads: usize,

    /// Iterations per batch (minimum batch size for guided).
    #[arg(default_value = "1", value_parser = cli::parse_chunk_size)]
    chunk_size: usize,

    /// Append the timings to this experiment record file (rank 0 only).
    #[arg(long)]
    record: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let env = match LaunchEnv::from_env() {
        Ok(env) => env,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => return cli::usage_exit(e, env.is_coordinator()),
    };
    telemetry::init();

    let span = info_span!("rank", rank = env.rank);
    let rank = env.rank;
    match run(env, args).instrument(span).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error on rank {rank}: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(env: LaunchEnv, args: Args) -> Result<(), Error> {
    let config = HybridConfig {
        n: args.n,
        schedule: Schedule::new(args.schedule_type, args.chunk_size)?,
        threads: args.num_threads,
    };

    let mut group = tcp::join(env.coordinator_addr.as_str(), env.rank, env.world_size).await?;
    let report = hybrid::run(&mut group, &config, None).await?;
    if !group.is_coordinator() {
        return Ok(());
    }

    println!("{}", report.summary_line(&config));
    if let Some(path) = &args.record {
        let record = Record::Hybrid {
            n: config.n,
            workers: report.workers,
            threads: config.threads,
            schedule: args.schedule_type,
            timings: report.timings,
        };
        record::append(path, &record)?;
    }
    Ok(())
}
