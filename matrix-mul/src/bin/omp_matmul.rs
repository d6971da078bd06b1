use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use matrix_mul::launch::NUM_THREADS_VAR;
use matrix_mul::record::{self, Record};
use matrix_mul::{Error, Schedule, SchedulePolicy, WorkerPool, cli, shared, telemetry, timer};

/// Times an N×N matrix multiply on a pool of threads.
#[derive(Parser)]
#[command(name = "omp-matmul")]
struct Args {
    /// Matrix size (N x N).
    #[arg(value_parser = cli::parse_dimension)]
    n: usize,

    /// Loop schedule: static, dynamic or guided.
    schedule_type: SchedulePolicy,

    /// Iterations per batch (minimum batch size for guided).
    #[arg(default_value = "1", value_parser = cli::parse_chunk_size)]
    chunk_size: usize,

    /// Worker threads; defaults to the available parallelism.
    #[arg(long, env = NUM_THREADS_VAR, value_parser = cli::parse_thread_count)]
    threads: Option<usize>,

    /// Append the timing to this experiment record file.
    #[arg(long)]
    record: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => return cli::usage_exit(e, true),
    };
    telemetry::init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let threads = args.threads.unwrap_or_else(cli::available_threads);
    let schedule = Schedule::new(args.schedule_type, args.chunk_size)?;
    let pool = WorkerPool::new(threads, schedule)?;

    let product = shared::run(args.n, &pool)?;
    println!(
        "OpenMP {} time: {}",
        args.schedule_type,
        timer::secs(product.elapsed)
    );

    if let Some(path) = &args.record {
        let record = Record::Shared {
            n: args.n,
            threads,
            schedule: args.schedule_type,
            total: product.elapsed,
        };
        record::append(path, &record)?;
    }
    Ok(())
}
