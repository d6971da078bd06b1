use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use matrix_mul::record::{self, Record};
use matrix_mul::{Error, cli, sequential, telemetry, timer};

/// Times a single-threaded N×N matrix multiply.
#[derive(Parser)]
#[command(name = "seq-matmul")]
struct Args {
    /// Matrix size (N x N).
    #[arg(value_parser = cli::parse_dimension)]
    n: usize,

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
    let product = sequential::run(args.n)?;
    println!("Sequential time: {}", timer::secs(product.elapsed));

    if let Some(path) = &args.record {
        let record = Record::Sequential {
            n: args.n,
            total: product.elapsed,
        };
        record::append(path, &record)?;
    }
    Ok(())
}
