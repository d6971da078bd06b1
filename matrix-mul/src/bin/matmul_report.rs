use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use matrix_mul::record::{ExperimentLog, Program};
use matrix_mul::{Error, cli};

/// Summarizes an experiment record file: shared-memory and hybrid times,
/// the hybrid compute/communication split, speedup over the sequential run
/// and efficiency per core.
#[derive(Parser)]
#[command(name = "matmul-report")]
struct Args {
    /// Record file written with `--record`.
    file: PathBuf,

    /// Only show runs with this many threads per process.
    #[arg(long, value_parser = cli::parse_thread_count)]
    threads: Option<usize>,
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => return cli::usage_exit(e, true),
    };

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let log = ExperimentLog::load(&args.file)?;
    let rows: Vec<_> = log
        .speedups()
        .into_iter()
        .filter(|row| args.threads.is_none_or(|t| row.threads == t))
        .collect();

    if rows.is_empty() {
        println!("No parallel runs in {}", args.file.display());
        return Ok(());
    }

    let mut current_n = None;
    for row in &rows {
        if current_n != Some(row.n) {
            current_n = Some(row.n);
            match row.sequential {
                Some(seq) => println!("\nN={} sequential={:.6}", row.n, seq),
                None => println!("\nN={} sequential=-", row.n),
            }
            println!(
                "{:<7} {:>4} {:>4} {:<8} {:>12} {:>12} {:>12} {:>9} {:>10}",
                "program", "P", "T", "schedule", "total", "compute", "comm", "speedup", "efficiency"
            );
        }
        let workers = match row.program {
            Program::Shared => "-".to_string(),
            Program::Hybrid => row.workers.to_string(),
        };
        println!(
            "{:<7} {:>4} {:>4} {:<8} {:>12.6} {:>12} {:>12} {:>9} {:>10}",
            row.program,
            workers,
            row.threads,
            row.schedule,
            row.total,
            fmt_secs(row.compute),
            fmt_secs(row.comm),
            fmt_ratio(row.speedup()),
            fmt_ratio(row.efficiency()),
        );
    }
    Ok(())
}

fn fmt_secs(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.6}"))
}

fn fmt_ratio(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}
